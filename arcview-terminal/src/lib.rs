/// Terminal host for the arcview scene: crossterm mouse input, ASCII output
use arcview_core::{InputEvent, Mesh, Mode, Target, Viewer, ViewerConfig, Viewport};
use crossterm::{
    cursor,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{self, Print, ResetColor, SetForegroundColor},
    terminal,
};
use nalgebra::{Matrix4, Vector3};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod input;
pub mod renderer;

pub use input::ClickTracker;
pub use renderer::AsciiRenderer;

/// Tessellation of the pivot sphere
const PIVOT_SEGMENTS: usize = 24;
const PIVOT_RINGS: usize = 16;

/// Main application struct for the terminal viewer
pub struct TerminalApp {
    viewer: Viewer,
    renderer: AsciiRenderer,
    clicks: ClickTracker,
    pivot_mesh: Mesh,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: ViewerConfig, seed: u64) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;
        let (width, height) = input::surface_size(columns, rows);
        let viewer = Viewer::new(config, Viewport::new(width, height), seed);
        let pivot_mesh = Mesh::uv_sphere(
            viewer.scene().pivot.base_radius,
            PIVOT_SEGMENTS,
            PIVOT_RINGS,
            viewer.scene().pivot_color,
        );

        Ok(Self {
            viewer,
            renderer: AsciiRenderer::new(columns as usize, rows as usize),
            clicks: ClickTracker::new(),
            pivot_mesh,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        log::info!("Starting terminal viewer");
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Drain everything queued since the last frame
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code: KeyCode::Char('q') | KeyCode::Esc,
                ..
            }) => {
                log::debug!("Quit requested");
                self.running = false;
            }
            Event::Mouse(mouse) => {
                for input in input::map_mouse(mouse, &mut self.clicks, Instant::now()) {
                    self.viewer.handle(input);
                }
            }
            Event::Resize(columns, rows) => {
                let (width, height) = input::surface_size(columns, rows);
                self.renderer.resize(columns as usize, rows as usize);
                self.viewer.handle(InputEvent::Resized { width, height });
            }
            _ => {}
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let scene = self.viewer.scene();
        let camera = self.viewer.camera();

        self.renderer.clear();
        for object in &scene.objects {
            self.renderer
                .render_mesh(&object.mesh, &object.transform.model_matrix(), camera);
        }

        if scene.pivot.visible {
            let model = Matrix4::new_translation(&scene.pivot.center.coords)
                * Matrix4::new_nonuniform_scaling(&Vector3::repeat(scene.pivot.scale));
            self.renderer.render_translucent(
                &self.pivot_mesh,
                &model,
                camera,
                scene.pivot_color,
                scene.pivot_opacity,
            );
        }

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout, scene.background)?;

        // Status line
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(style::Color::Yellow),
            Print(self.status_line()),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }

    fn status_line(&self) -> String {
        let mode = match self.viewer.mode() {
            Mode::Drag => "drag",
            Mode::Rotate => "rotate",
        };
        let selection = match self.viewer.interaction().selected {
            Some(Target::World) => "world".to_string(),
            Some(Target::Single(id)) => format!("box {}", id.0),
            None => "none".to_string(),
        };
        format!(
            "arcview | FPS: {:.1} | mode: {mode} | selected: {selection} | zoom: {:.2} | double-click=select wheel=zoom Q=quit",
            self.fps,
            self.viewer.camera().zoom
        )
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }
}
