//! Viewer configuration with TOML support.
//!
//! Every section uses `#[serde(default)]` so a partial file (for example only
//! a `[camera]` table) keeps the defaults for everything it leaves out.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ArcviewError;
use crate::geometry::Color;
use crate::projection::ProjectionMode;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub scene: SceneConfig,
    pub camera: CameraConfig,
}

/// Box generation and pivot appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub object_count: usize,
    /// Edge length of the generated boxes before scaling
    pub box_size: f32,
    /// Boxes are placed in `[-spread, spread]` on X and Y
    pub spread: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Fixed RNG seed; a fresh seed is drawn by the host when unset
    pub seed: Option<u64>,
    pub background_color: Color,
    pub pivot_color: Color,
    pub pivot_opacity: f32,
    /// Pivot sphere radius relative to the box geometry's bounding sphere
    pub pivot_radius_factor: f32,
    /// Target bounding radius is divided by this to get the pivot scale
    pub pivot_scale_divisor: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            object_count: 5,
            box_size: 40.0,
            spread: 250.0,
            min_scale: 1.0,
            max_scale: 6.0,
            seed: None,
            background_color: Color::from_hex(0x000000),
            pivot_color: Color::from_hex(0x808080),
            pivot_opacity: 0.25,
            pivot_radius_factor: 1.66,
            pivot_scale_divisor: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Distance from the origin along +Z
    pub distance: f32,
    pub projection: ProjectionMode,
    /// Zoom change per 100 units of wheel delta
    pub zoom_step: f32,
    /// Zooming out stops at this factor
    pub zoom_floor: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 10.0,
            near: 100.0,
            far: 100_000.0,
            distance: 10_000.0,
            projection: ProjectionMode::Perspective,
            zoom_step: 0.019,
            zoom_floor: 0.1,
        }
    }
}

impl ViewerConfig {
    /// Load a config from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, ArcviewError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded viewer config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ArcviewError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ArcviewError> {
        let scene = &self.scene;
        let camera = &self.camera;

        if scene.box_size <= 0.0 {
            return Err(invalid("scene.box_size must be positive"));
        }
        if scene.min_scale <= 0.0 || scene.max_scale < scene.min_scale {
            return Err(invalid("scene scale range must be positive and ordered"));
        }
        if scene.spread < 0.0 {
            return Err(invalid("scene.spread must not be negative"));
        }
        if scene.pivot_scale_divisor <= 0.0 || scene.pivot_radius_factor <= 0.0 {
            return Err(invalid("pivot sizing factors must be positive"));
        }
        if !(0.0..=1.0).contains(&scene.pivot_opacity) {
            return Err(invalid("scene.pivot_opacity must be within [0, 1]"));
        }
        if !(0.0 < camera.fov_degrees && camera.fov_degrees < 180.0) {
            return Err(invalid("camera.fov_degrees must be within (0, 180)"));
        }
        if camera.near <= 0.0 || camera.far <= camera.near {
            return Err(invalid("camera clipping planes must satisfy 0 < near < far"));
        }
        if camera.distance <= 0.0 {
            return Err(invalid("camera.distance must be positive"));
        }
        if camera.zoom_floor <= 0.0 || camera.zoom_step <= 0.0 {
            return Err(invalid("camera zoom step and floor must be positive"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ArcviewError {
    ArcviewError::InvalidConfig(message.to_owned())
}
