/// Rays, planes and the intersection tests the picking code is built on
use nalgebra::{Point3, Unit, Vector3};

const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Unit<Vector3<f32>>) -> Self {
        Self { origin, direction }
    }

    /// `None` when `direction` has no length
    pub fn try_new(origin: Point3<f32>, direction: Vector3<f32>) -> Option<Self> {
        Unit::try_new(direction, EPSILON).map(|direction| Self::new(origin, direction))
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction.into_inner() * t
    }

    /// Distance along the ray to the plane, if it is hit in front of the origin
    pub fn intersect_plane(&self, plane: &Plane) -> Option<f32> {
        let denom = plane.normal.dot(&self.direction.into_inner());
        if denom.abs() < EPSILON {
            return None;
        }
        let t = plane.normal.dot(&(plane.point - self.origin)) / denom;
        (t >= 0.0).then_some(t)
    }

    /// Nearest non-negative hit with a sphere; the exit point when the origin is inside
    pub fn intersect_sphere(&self, center: &Point3<f32>, radius: f32) -> Option<f32> {
        let to_origin = self.origin - center;
        let b = to_origin.dot(&self.direction.into_inner());
        let c = to_origin.norm_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }

    /// Möller–Trumbore, hits both faces
    pub fn intersect_triangle(&self, [a, b, c]: [Point3<f32>; 3]) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(&edge2);
        let det = edge1.dot(&p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = self.origin - a;
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = self.direction.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(&q) * inv_det;
        (t >= 0.0).then_some(t)
    }
}

/// Infinite plane through `point`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Point3<f32>,
    pub normal: Unit<Vector3<f32>>,
}

impl Plane {
    pub fn new(point: Point3<f32>, normal: Unit<Vector3<f32>>) -> Self {
        Self { point, normal }
    }

    /// The plane through the origin facing +Z
    pub fn ground() -> Self {
        Self::new(Point3::origin(), Vector3::z_axis())
    }

    /// Move the plane to `point` and turn it to face `eye`.
    /// The normal is left untouched when `eye` lies on `point`.
    pub fn face_towards(&mut self, point: Point3<f32>, eye: &Point3<f32>) {
        self.point = point;
        if let Some(normal) = Unit::try_new(eye - point, EPSILON) {
            self.normal = normal;
        }
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::ground()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_z(x: f32, y: f32) -> Ray {
        Ray::new(Point3::new(x, y, 100.0), -Vector3::z_axis())
    }

    #[test]
    fn test_plane_hit() {
        let ray = down_z(3.0, 4.0);
        let t = ray.intersect_plane(&Plane::ground()).unwrap();
        assert!((t - 100.0).abs() < 1e-4);
        assert!((ray.at(t) - Point3::new(3.0, 4.0, 0.0)).norm() < 1e-4);
    }

    #[test]
    fn test_plane_behind_or_parallel_misses() {
        let away = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::z_axis());
        assert!(away.intersect_plane(&Plane::ground()).is_none());
        let parallel = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::x_axis());
        assert!(parallel.intersect_plane(&Plane::ground()).is_none());
    }

    #[test]
    fn test_sphere_front_and_inside() {
        let ray = down_z(0.0, 0.0);
        let t = ray.intersect_sphere(&Point3::origin(), 10.0).unwrap();
        assert!((t - 90.0).abs() < 1e-4);

        let inside = Ray::new(Point3::origin(), Vector3::x_axis());
        let t = inside.intersect_sphere(&Point3::origin(), 10.0).unwrap();
        assert!((t - 10.0).abs() < 1e-4);

        assert!(down_z(20.0, 0.0).intersect_sphere(&Point3::origin(), 10.0).is_none());
    }

    #[test]
    fn test_triangle_both_faces() {
        let triangle = [
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert!(down_z(0.0, 0.0).intersect_triangle(triangle).is_some());
        let reversed = [triangle[0], triangle[2], triangle[1]];
        assert!(down_z(0.0, 0.0).intersect_triangle(reversed).is_some());
        assert!(down_z(2.0, 0.0).intersect_triangle(triangle).is_none());
    }

    #[test]
    fn test_plane_faces_eye() {
        let mut plane = Plane::ground();
        plane.face_towards(Point3::new(5.0, 0.0, 0.0), &Point3::new(5.0, 10.0, 0.0));
        assert_eq!(plane.point, Point3::new(5.0, 0.0, 0.0));
        assert!((plane.normal.into_inner() - Vector3::y()).norm() < 1e-6);
    }
}
