//! The viewer: scene, camera and interaction state behind one event entry point.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ViewerConfig;
use crate::input::InputEvent;
use crate::interaction::{apply_wheel_zoom, InteractionContext, Mode};
use crate::projection::{Camera, Viewport};
use crate::scene::Scene;

pub struct Viewer {
    config: ViewerConfig,
    scene: Scene,
    camera: Camera,
    viewport: Viewport,
    interaction: InteractionContext,
}

impl Viewer {
    /// Generate a scene from `config`. `fallback_seed` is used when the config has none.
    pub fn new(config: ViewerConfig, viewport: Viewport, fallback_seed: u64) -> Self {
        let seed = config.scene.seed.unwrap_or(fallback_seed);
        let scene = Scene::generate(&config.scene, &mut StdRng::seed_from_u64(seed));
        log::info!(
            "Viewer ready: {} objects, seed {seed}, viewport {}x{}",
            scene.objects.len(),
            viewport.width,
            viewport.height
        );
        Self::with_scene(config, scene, viewport)
    }

    pub fn with_scene(config: ViewerConfig, scene: Scene, viewport: Viewport) -> Self {
        let camera = Camera::from_config(&config.camera, viewport);
        Self {
            config,
            scene,
            camera,
            viewport,
            interaction: InteractionContext::new(),
        }
    }

    /// Apply one input event to the scene and camera
    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMoved { x, y } => {
                let ndc = self.viewport.to_ndc(x, y);
                self.interaction
                    .pointer_move(&mut self.scene, &self.camera, &ndc);
            }
            InputEvent::PointerDown { x, y } => {
                let ndc = self.viewport.to_ndc(x, y);
                self.interaction
                    .pointer_down(&mut self.scene, &self.camera, &ndc);
            }
            InputEvent::PointerUp => self.interaction.pointer_up(),
            InputEvent::DoubleClick { x, y } => {
                let ndc = self.viewport.to_ndc(x, y);
                self.interaction
                    .double_click(&mut self.scene, &self.camera, &ndc);
            }
            InputEvent::Wheel { delta_y } => {
                apply_wheel_zoom(&mut self.camera, delta_y, &self.config.camera);
            }
            InputEvent::Resized { width, height } => {
                self.viewport = Viewport::new(width, height);
                self.camera.set_viewport(self.viewport);
                log::debug!("Resized to {width}x{height}");
            }
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn interaction(&self) -> &InteractionContext {
        &self.interaction
    }

    pub fn mode(&self) -> Mode {
        self.interaction.mode(&self.scene)
    }
}
