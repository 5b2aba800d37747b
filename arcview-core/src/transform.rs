/// Object transforms and world-axis rotation
use nalgebra::{Matrix3, Matrix4, Point3, Translation3, Unit, UnitQuaternion, Vector3};

/// Euler angles in radians, applied in X, Y, Z order
#[derive(Debug, Clone, Copy)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Orientation equivalent to rotating about X, then Y, then Z in the object's own frame
    pub fn to_quaternion(&self) -> UnitQuaternion<f32> {
        let rx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), self.x);
        let ry = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.y);
        let rz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.z);
        rx * ry * rz
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Position, orientation and non-uniform scale of a scene object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Point3<f32>,
    pub orientation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            orientation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at(position: Point3<f32>) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Model matrix: scale, then rotate, then translate
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Translation3::from(self.position.coords).to_homogeneous()
            * self.orientation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// Rotate the object's orientation about a world-space axis through its own origin
    pub fn rotate_on_world_axis(&mut self, axis: &Unit<Vector3<f32>>, angle: f32) {
        let rotation = UnitQuaternion::from_axis_angle(axis, angle);
        self.orientation = rotation * self.orientation;
    }

    /// Move the object's position around `center` by `angle` about `axis`
    pub fn orbit(&mut self, center: &Point3<f32>, axis: &Unit<Vector3<f32>>, angle: f32) {
        let rotation = UnitQuaternion::from_axis_angle(axis, angle);
        self.position = center + rotation * (self.position - center);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Inverse-transpose of the model's linear part, so non-uniform scale keeps normals perpendicular.
///
/// Falls back to identity for singular matrices.
pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix3<f32> {
    model
        .fixed_view::<3, 3>(0, 0)
        .clone_owned()
        .try_inverse()
        .map(|m| m.transpose())
        .unwrap_or_else(Matrix3::identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity_model_matrix() {
        let transform = Transform::identity();
        assert!((transform.model_matrix() - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_euler_order() {
        // X then Y in the object's frame: the local Z axis ends up along world X
        let rotation = RotationState::new(FRAC_PI_2, FRAC_PI_2, 0.0).to_quaternion();
        let z = rotation * Vector3::z();
        assert!((z - Vector3::x()).norm() < 1e-5);
    }

    #[test]
    fn test_model_matrix_applies_scale_before_translation() {
        let mut transform = Transform::at(Point3::new(10.0, 0.0, 0.0));
        transform.scale = Vector3::new(2.0, 3.0, 4.0);
        let p = transform.model_matrix().transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert!((p - Point3::new(12.0, 3.0, 4.0)).norm() < 1e-5);
    }

    #[test]
    fn test_world_axis_rotation_composes_on_the_left() {
        let mut transform = Transform::identity();
        transform.orientation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        transform.rotate_on_world_axis(&Vector3::z_axis(), FRAC_PI_2);
        // Local Y went to world Z after the X rotation; a world Z rotation leaves it there
        let y = transform.orientation * Vector3::y();
        assert!((y - Vector3::z()).norm() < 1e-5);
        assert_eq!(transform.position, Point3::origin());
    }

    #[test]
    fn test_orbit_keeps_distance_to_center() {
        let center = Point3::new(5.0, 5.0, 0.0);
        let mut transform = Transform::at(Point3::new(15.0, 5.0, 0.0));
        transform.orbit(&center, &Vector3::z_axis(), FRAC_PI_2);
        assert!((transform.position - Point3::new(5.0, 15.0, 0.0)).norm() < 1e-4);
        assert!(((transform.position - center).norm() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_normal_matrix_keeps_normals_perpendicular() {
        let mut transform = Transform::identity();
        transform.orientation = RotationState::new(0.3, -0.8, 1.2).to_quaternion();
        transform.scale = Vector3::new(1.0, 5.0, 2.0);
        let model = transform.model_matrix();

        // A slanted face: normal (1, 1, 0) with in-plane tangent (1, -1, 0)
        let normal = normal_matrix(&model) * Vector3::new(1.0, 1.0, 0.0);
        let tangent = model.transform_vector(&Vector3::new(1.0, -1.0, 0.0));
        assert!(normal.dot(&tangent).abs() < 1e-4);

        let singular = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 0.0, 1.0));
        assert_eq!(normal_matrix(&singular), Matrix3::identity());
    }
}
