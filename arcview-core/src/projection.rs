/// Camera, projection and screen/world conversions
use nalgebra::{Matrix4, Point2, Point3, Unit, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;
use crate::ray::Ray;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Size of the render surface in pixels (or terminal cells)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Pixel coordinates (origin top-left) to normalized device coordinates
    pub fn to_ndc(&self, x: f32, y: f32) -> Point2<f32> {
        Point2::new(2.0 * x / self.width - 1.0, 1.0 - 2.0 * y / self.height)
    }
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians, before zoom
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub zoom: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_config(&CameraConfig::default(), Viewport::new(width, height))
    }

    /// Camera on the +Z axis at `config.distance`, looking at the origin
    pub fn from_config(config: &CameraConfig, viewport: Viewport) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, config.distance),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: config.fov_degrees.to_radians(),
            aspect: viewport.aspect(),
            near: config.near,
            far: config.far,
            zoom: 1.0,
            mode: config.projection,
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
    }

    pub fn forward(&self) -> Unit<Vector3<f32>> {
        Unit::new_normalize(self.target - self.position)
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Field of view after applying zoom
    pub fn effective_fov(&self) -> f32 {
        2.0 * ((self.fov / 2.0).tan() / self.zoom).atan()
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.effective_fov(), self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = (self.position - self.target).norm() / self.zoom;
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Orthonormal camera basis: (right, up)
    fn basis(&self) -> (Vector3<f32>, Vector3<f32>) {
        let forward = self.forward().into_inner();
        let right = forward.cross(&self.up).normalize();
        let up = right.cross(&forward);
        (right, up)
    }

    /// Half extents of the view at unit distance (perspective) or in world units (orthographic)
    fn half_extents(&self) -> (f32, f32) {
        let half_h = match self.mode {
            ProjectionMode::Perspective => (self.effective_fov() / 2.0).tan(),
            ProjectionMode::Orthographic => (self.position - self.target).norm() / self.zoom / 2.0,
        };
        (half_h * self.aspect, half_h)
    }

    /// World-space ray through an NDC position on the screen
    pub fn pick_ray(&self, ndc: &Point2<f32>) -> Option<Ray> {
        let (right, up) = self.basis();
        let (half_w, half_h) = self.half_extents();
        let offset = right * (ndc.x * half_w) + up * (ndc.y * half_h);

        match self.mode {
            ProjectionMode::Perspective => {
                Ray::try_new(self.position, self.forward().into_inner() + offset)
            }
            ProjectionMode::Orthographic => Some(Ray::new(self.position + offset, self.forward())),
        }
    }

    /// Project a 3D point to 2D screen space
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let mvp = self.view_projection() * model_matrix;
        let clip = mvp * point.to_homogeneous();

        // Behind the camera or degenerate
        if clip.w.abs() < 1e-6 || clip.w < 0.0 {
            return None;
        }

        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        let depth = clip.z / clip.w;

        if !(-1.0..=1.0).contains(&depth) {
            return None;
        }

        let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

        Some((screen_x, screen_y, depth))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
