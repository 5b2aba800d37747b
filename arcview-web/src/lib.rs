//! Browser host for the arcview scene.
//!
//! `start("canvas-id")` builds a viewer on a WebGL2 canvas, wires the DOM mouse
//! events into it and keeps a `requestAnimationFrame` loop running. The
//! returned [`WebViewer`] owns the listeners, so keep it alive on the JS side.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use arcview_core::{InputEvent, Mesh, Mode, Viewer, ViewerConfig, Viewport};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, HtmlCanvasElement, MouseEvent, WebGl2RenderingContext, WheelEvent};

pub mod gl;

use gl::GlRenderer;

/// Tessellation of the pivot sphere
const PIVOT_SEGMENTS: usize = 32;
const PIVOT_RINGS: usize = 24;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    // A second init (e.g. hot reload) keeps the first logger
    let _ = console_log::init_with_level(log::Level::Info);
}

struct App {
    viewer: Viewer,
    renderer: GlRenderer,
    canvas: HtmlCanvasElement,
}

impl App {
    fn handle(&mut self, event: InputEvent) {
        self.viewer.handle(event);
    }

    /// Match the drawing buffer to the canvas' CSS size
    fn fit_canvas(&mut self) {
        let width = self.canvas.client_width().max(1) as u32;
        let height = self.canvas.client_height().max(1) as u32;
        if width != self.canvas.width() || height != self.canvas.height() {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            self.handle(InputEvent::Resized { width, height });
        }
    }

    fn render(&self) {
        self.renderer.render(
            self.viewer.scene(),
            self.viewer.camera(),
            self.canvas.width() as i32,
            self.canvas.height() as i32,
        );
    }

    /// Pointer position relative to the canvas' top-left corner
    fn local(&self, event: &MouseEvent) -> (f32, f32) {
        let rect = self.canvas.get_bounding_client_rect();
        (
            (f64::from(event.client_x()) - rect.left()) as f32,
            (f64::from(event.client_y()) - rect.top()) as f32,
        )
    }
}

type Listener = Closure<dyn FnMut(Event)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Canvas,
    Window,
}

/// Moves and releases are tracked on the window so a gesture that leaves
/// the canvas still ends with its pointer-up
fn surface_for(kind: &str) -> Surface {
    match kind {
        "mousemove" | "mouseup" | "resize" => Surface::Window,
        _ => Surface::Canvas,
    }
}

struct Surfaces {
    window: EventTarget,
    canvas: EventTarget,
}

impl Surfaces {
    fn target(&self, kind: &str) -> &EventTarget {
        match surface_for(kind) {
            Surface::Window => &self.window,
            Surface::Canvas => &self.canvas,
        }
    }
}

#[wasm_bindgen]
pub struct WebViewer {
    app: Rc<RefCell<App>>,
    listeners: Vec<(EventTarget, &'static str, Listener)>,
}

#[wasm_bindgen]
impl WebViewer {
    /// Build a viewer on `canvas_id` without attaching any DOM listeners
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebViewer, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str("Canvas not found"))?
            .dyn_into()?;
        let gl = canvas
            .get_context("webgl2")?
            .ok_or_else(|| JsValue::from_str("WebGL2 not supported"))?
            .dyn_into::<WebGl2RenderingContext>()?;

        canvas.set_width(canvas.client_width().max(1) as u32);
        canvas.set_height(canvas.client_height().max(1) as u32);
        let viewport = Viewport::new(canvas.width(), canvas.height());

        let seed = (js_sys::Date::now() as u64) ^ (js_sys::Math::random() * u32::MAX as f64) as u64;
        let viewer = Viewer::new(ViewerConfig::default(), viewport, seed);
        let pivot_mesh = Mesh::uv_sphere(
            viewer.scene().pivot.base_radius,
            PIVOT_SEGMENTS,
            PIVOT_RINGS,
            viewer.scene().pivot_color,
        );
        let renderer = GlRenderer::new(gl, viewer.scene(), &pivot_mesh)?;
        log::info!("WebGL viewer on #{canvas_id} ({}x{})", canvas.width(), canvas.height());

        Ok(WebViewer {
            app: Rc::new(RefCell::new(App {
                viewer,
                renderer,
                canvas,
            })),
            listeners: Vec::new(),
        })
    }

    pub fn pointer_move(&self, x: f32, y: f32) {
        self.app.borrow_mut().handle(InputEvent::PointerMoved { x, y });
    }

    pub fn pointer_down(&self, x: f32, y: f32) {
        self.app.borrow_mut().handle(InputEvent::PointerDown { x, y });
    }

    pub fn pointer_up(&self) {
        self.app.borrow_mut().handle(InputEvent::PointerUp);
    }

    pub fn double_click(&self, x: f32, y: f32) {
        self.app.borrow_mut().handle(InputEvent::DoubleClick { x, y });
    }

    pub fn wheel(&self, delta_y: f32) {
        self.app.borrow_mut().handle(InputEvent::Wheel { delta_y });
    }

    pub fn resize(&self, width: u32, height: u32) {
        let mut app = self.app.borrow_mut();
        app.canvas.set_width(width.max(1));
        app.canvas.set_height(height.max(1));
        app.handle(InputEvent::Resized { width, height });
    }

    pub fn render(&self) {
        self.app.borrow().render();
    }

    /// Current interaction mode, `"drag"` or `"rotate"`
    pub fn mode(&self) -> String {
        match self.app.borrow().viewer.mode() {
            Mode::Drag => "drag".to_string(),
            Mode::Rotate => "rotate".to_string(),
        }
    }
}

impl WebViewer {
    fn listen<F>(&mut self, surfaces: &Surfaces, kind: &'static str, mut handler: F) -> Result<(), JsValue>
    where
        F: FnMut(&mut App, Event) + 'static,
    {
        let target = surfaces.target(kind);
        let app = Rc::downgrade(&self.app);
        let closure = Closure::wrap(Box::new(move |event: Event| {
            if let Some(app) = app.upgrade() {
                handler(&mut app.borrow_mut(), event);
            }
        }) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        self.listeners.push((target.clone(), kind, closure));
        Ok(())
    }

    fn attach(&mut self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let surfaces = Surfaces {
            window: window.into(),
            canvas: self.app.borrow().canvas.clone().into(),
        };

        self.listen(&surfaces, "mousemove", |app, event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                let (x, y) = app.local(mouse);
                app.handle(InputEvent::PointerMoved { x, y });
            }
        })?;
        self.listen(&surfaces, "mousedown", |app, event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                if mouse.button() == 0 {
                    let (x, y) = app.local(mouse);
                    app.handle(InputEvent::PointerDown { x, y });
                }
            }
        })?;
        self.listen(&surfaces, "mouseup", |app, _| app.handle(InputEvent::PointerUp))?;
        self.listen(&surfaces, "dblclick", |app, event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                let (x, y) = app.local(mouse);
                app.handle(InputEvent::DoubleClick { x, y });
            }
        })?;
        self.listen(&surfaces, "wheel", |app, event| {
            if let Some(wheel) = event.dyn_ref::<WheelEvent>() {
                wheel.prevent_default();
                app.handle(InputEvent::Wheel {
                    delta_y: wheel.delta_y() as f32,
                });
            }
        })?;
        self.listen(&surfaces, "resize", |app, _| app.fit_canvas())?;
        Ok(())
    }
}

impl Drop for WebViewer {
    fn drop(&mut self) {
        for (target, kind, listener) in &self.listeners {
            let _ = target.remove_event_listener_with_callback(kind, listener.as_ref().unchecked_ref());
        }
    }
}

/// Build a viewer on `canvas_id`, attach mouse and resize listeners and start rendering
#[wasm_bindgen]
pub fn start(canvas_id: &str) -> Result<WebViewer, JsValue> {
    let mut viewer = WebViewer::new(canvas_id).inspect_err(|e| {
        log::error!("Viewer setup failed: {e:?}");
    })?;
    viewer.attach()?;
    run_frame_loop(Rc::downgrade(&viewer.app))?;
    Ok(viewer)
}

/// Redraw every animation frame until the app is dropped
fn run_frame_loop(app: Weak<RefCell<App>>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let holder: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let holder_for_cb = Rc::clone(&holder);
    let window_for_cb = window.clone();

    *holder.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
        let Some(app) = app.upgrade() else {
            log::debug!("Viewer dropped, stopping frame loop");
            return;
        };
        app.borrow().render();
        if let Some(cb) = holder_for_cb.borrow().as_ref() {
            if let Err(e) = window_for_cb.request_animation_frame(cb.as_ref().unchecked_ref()) {
                log::error!("requestAnimationFrame failed: {e:?}");
            }
        }
    }) as Box<dyn FnMut(f64)>));

    let first = holder.borrow();
    if let Some(cb) = first.as_ref() {
        window.request_animation_frame(cb.as_ref().unchecked_ref())?;
    }
    Ok(())
}
