/// Geometry primitives: meshes, face colours and bounding volumes
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// 24-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::from_hex(0xffffff);

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    pub fn to_hex(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    /// Channels normalized to `[0, 1]`
    pub fn to_linear(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    /// Multiply every channel by `factor` (clamped to `[0, 1]`)
    pub fn shaded(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (f32::from(c) * factor).round() as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
        }
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A coloured triangle face
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
    pub color: Color,
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
            color: Color::WHITE,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Face normal from the winding of the vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let [a, b, c] = self.positions();
        (b - a).cross(&(c - a)).normalize()
    }

    pub fn positions(&self) -> [Point3<f32>; 3] {
        [
            self.vertices[0].position,
            self.vertices[1].position,
            self.vertices[2].position,
        ]
    }
}

/// Face layout of a box: outward normal plus the two in-plane axes (`u × v = normal`)
const BOX_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
];

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Axis-aligned cube centred on the origin, white on every face
    pub fn cube(size: f32) -> Self {
        Self::colored_cube(size, [Color::WHITE; 6])
    }

    /// Axis-aligned cube where both triangles of face `i` share `face_colors[i]`.
    ///
    /// Face order: +Z, -Z, +Y, -Y, +X, -X.
    pub fn colored_cube(size: f32, face_colors: [Color; 6]) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::with_capacity(12);

        for ((normal, u, v), color) in BOX_FACES.iter().zip(face_colors) {
            let normal = Vector3::from(*normal);
            let u = Vector3::from(*u) * half;
            let v = Vector3::from(*v) * half;
            let center = Point3::from(normal * half);

            let corner = |su: f32, sv: f32| Vertex::new(center + u * su + v * sv, normal);
            let (c0, c1, c2, c3) = (
                corner(-1.0, -1.0),
                corner(1.0, -1.0),
                corner(1.0, 1.0),
                corner(-1.0, 1.0),
            );

            mesh.add_triangle(Triangle::new(c0, c1, c2).with_color(color));
            mesh.add_triangle(Triangle::new(c0, c2, c3).with_color(color));
        }

        mesh
    }

    /// Latitude/longitude sphere centred on the origin
    pub fn uv_sphere(radius: f32, segments: usize, rings: usize, color: Color) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let point = |ring: usize, segment: usize| {
            let theta = std::f32::consts::PI * ring as f32 / rings as f32;
            let phi = std::f32::consts::TAU * segment as f32 / segments as f32;
            let normal = Vector3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            Vertex::new(Point3::from(normal * radius), normal)
        };

        let mut mesh = Self::with_capacity(segments * rings * 2);
        for ring in 0..rings {
            for segment in 0..segments {
                let a = point(ring, segment);
                let b = point(ring + 1, segment);
                let c = point(ring + 1, segment + 1);
                let d = point(ring, segment + 1);
                if ring != 0 {
                    mesh.add_triangle(Triangle::new(a, d, c).with_color(color));
                }
                if ring + 1 != rings {
                    mesh.add_triangle(Triangle::new(a, c, b).with_color(color));
                }
            }
        }
        mesh
    }

    pub fn vertex_positions(&self) -> impl Iterator<Item = Point3<f32>> + '_ {
        self.triangles.iter().flat_map(|t| t.positions())
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.vertex_positions())
    }

    /// Sphere around the bounding-box centre enclosing every vertex
    pub fn bounding_sphere(&self) -> BoundingSphere {
        let center = self.bounding_box().center();
        let radius = self
            .vertex_positions()
            .map(|p| (p - center).norm())
            .fold(0.0_f32, f32::max);
        BoundingSphere { center, radius }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Axis-aligned bounding box. An empty box has `min > max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.expand_to(&point);
        }
        aabb
    }

    /// Bounds of `mesh` after transforming every vertex by `model`
    pub fn from_transformed_mesh(mesh: &Mesh, model: &Matrix4<f32>) -> Self {
        Self::from_points(mesh.vertex_positions().map(|p| model.transform_point(&p)))
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand_to(&mut self, point: &Point3<f32>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn center(&self) -> Point3<f32> {
        if self.is_empty() {
            return Point3::origin();
        }
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    /// Sphere through the box corners
    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere {
            center: self.center(),
            radius: self.size().norm() / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3<f32>,
    pub radius: f32,
}
