/// ASCII rasterizer for terminal rendering
use arcview_core::{normal_matrix, Camera, Color, Mesh, Triangle};
use crossterm::{
    style::{self, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Glyph used for translucent overlay cells with nothing behind them
const OVERLAY_CHAR: char = '·';

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    character: char,
    color: Color,
}

const EMPTY: Cell = Cell {
    character: ' ',
    color: Color::WHITE,
};

/// ASCII renderer that converts 3D meshes to coloured terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![EMPTY; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(EMPTY);
    }

    /// Depth-tested render of every triangle, shaded by its face colour
    pub fn render_mesh(&mut self, mesh: &Mesh, model_matrix: &Matrix4<f32>, camera: &Camera) {
        let light_dir = -camera.forward().into_inner();
        let normals = normal_matrix(model_matrix);
        for triangle in &mesh.triangles {
            let Some(coords) = self.project(triangle, model_matrix, camera) else {
                continue;
            };
            let normal = (normals * triangle.calculate_normal())
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vector3::z);
            // Headlight: lit from the camera
            let brightness = normal.dot(&light_dir).max(0.0);
            let index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
            let cell = Cell {
                character: LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)],
                color: triangle.color.shaded(0.35 + 0.65 * brightness),
            };
            self.rasterize_triangle(&coords, cell);
        }
    }

    /// Blend a translucent mesh over what is already drawn, without writing depth.
    ///
    /// Empty cells get a faint glyph in `color`; covered cells in front of the
    /// stored depth keep their glyph and mix `opacity` of `color` into it.
    pub fn render_translucent(
        &mut self,
        mesh: &Mesh,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        color: Color,
        opacity: f32,
    ) {
        let mut covered = vec![false; self.cells.len()];
        for triangle in &mesh.triangles {
            let Some(coords) = self.project(triangle, model_matrix, camera) else {
                continue;
            };
            self.visit_triangle(&coords, |idx, depth| {
                if depth < self.depth_buffer[idx] {
                    covered[idx] = true;
                }
            });
        }

        for (idx, cell) in self.cells.iter_mut().enumerate() {
            if !covered[idx] {
                continue;
            }
            *cell = if cell.character == ' ' {
                Cell {
                    character: OVERLAY_CHAR,
                    color,
                }
            } else {
                Cell {
                    character: cell.character,
                    color: blend(cell.color, color, opacity),
                }
            };
        }
    }

    fn project(
        &self,
        triangle: &Triangle,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
    ) -> Option<[(f32, f32, f32); 3]> {
        let mut coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in coords.iter_mut().zip(&triangle.vertices) {
            // Any vertex behind the camera clips the whole triangle
            *slot = camera.project_to_screen(
                &vertex.position,
                model_matrix,
                self.width as u32,
                self.height as u32,
            )?;
        }
        Some(coords)
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], cell: Cell) {
        let mut fragments = Vec::new();
        self.visit_triangle(coords, |idx, depth| fragments.push((idx, depth)));
        for (idx, depth) in fragments {
            if depth < self.depth_buffer[idx] {
                self.depth_buffer[idx] = depth;
                self.cells[idx] = cell;
            }
        }
    }

    /// Call `visit(index, depth)` for every cell centre inside the triangle
    fn visit_triangle<F: FnMut(usize, f32)>(&self, coords: &[(f32, f32, f32); 3], mut visit: F) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);
        if self.width == 0 || self.height == 0 {
            return;
        }

        // Bounding box, clipped to screen bounds
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), p)
                else {
                    continue;
                };
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                    visit(y as usize * self.width + x as usize, depth);
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W, background: Color) -> std::io::Result<()> {
        writer.queue(SetBackgroundColor(to_terminal(background)))?;
        for (y, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            if y > 0 {
                writer.queue(Print("\r\n"))?;
            }
            for cell in row {
                writer.queue(SetForegroundColor(to_terminal(cell.color)))?;
                writer.queue(Print(cell.character))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    #[cfg(test)]
    fn char_at(&self, x: usize, y: usize) -> char {
        self.cells[y * self.width + x].character
    }
}

fn to_terminal(color: Color) -> style::Color {
    style::Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

fn blend(base: Color, over: Color, opacity: f32) -> Color {
    let opacity = opacity.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (f32::from(a) * (1.0 - opacity) + f32::from(b) * opacity).round() as u8;
    Color {
        r: mix(base.r, over.r),
        g: mix(base.g, over.g),
        b: mix(base.b, over.b),
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcview_core::{CameraConfig, Viewport};

    fn camera(width: u32, height: u32) -> Camera {
        Camera::from_config(&CameraConfig::default(), Viewport::new(width, height))
    }

    #[test]
    fn test_cube_covers_screen_centre() {
        let mut renderer = AsciiRenderer::new(40, 20);
        let camera = camera(40, 40);
        renderer.render_mesh(&Mesh::cube(400.0), &Matrix4::identity(), &camera);

        assert_ne!(renderer.char_at(20, 10), ' ');
        assert_eq!(renderer.char_at(0, 0), ' ');
    }

    #[test]
    fn test_translucent_overlay_fills_blank_cells_only() {
        let mut renderer = AsciiRenderer::new(40, 20);
        let camera = camera(40, 40);
        let pivot = Mesh::uv_sphere(600.0, 12, 8, Color::WHITE);
        renderer.render_translucent(
            &pivot,
            &Matrix4::identity(),
            &camera,
            Color::from_hex(0x808080),
            0.25,
        );
        assert_eq!(renderer.char_at(20, 10), OVERLAY_CHAR);

        renderer.clear();
        let red = Mesh::colored_cube(200.0, [Color::from_hex(0xff0000); 6]);
        renderer.render_mesh(&red, &Matrix4::identity(), &camera);
        let before = renderer.cells[10 * 40 + 20];
        renderer.render_translucent(
            &pivot,
            &Matrix4::identity(),
            &camera,
            Color::from_hex(0x0000ff),
            0.25,
        );
        let after = renderer.cells[10 * 40 + 20];
        assert_eq!(after.character, before.character);
        assert!(after.color.b > before.color.b);
    }

    #[test]
    fn test_blend_weights_overlay_by_opacity() {
        let mixed = blend(Color::from_hex(0x000000), Color::from_hex(0xffffff), 0.25);
        assert_eq!(mixed, Color::from_hex(0x404040));
    }

    #[test]
    fn test_resize_resets_buffers() {
        let mut renderer = AsciiRenderer::new(4, 2);
        renderer.resize(10, 5);
        assert_eq!(renderer.cells.len(), 50);
        assert_eq!(renderer.depth_buffer.len(), 50);
    }
}
