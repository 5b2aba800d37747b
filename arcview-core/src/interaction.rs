//! Arcball interaction model.
//!
//! Two modes, switched by double-click:
//!
//! * **drag** (pivot hidden): pressing on a box grabs it, moving the pointer
//!   slides it across the drag plane keeping the grab offset.
//! * **rotate** (pivot visible): pressing anchors a point on the pivot sphere
//!   (or the drag plane behind it); every move rotates the selection by the
//!   angle between the previous and the new anchor, about their common normal.
//!
//! All state lives in [`InteractionContext`]; handlers take the scene and
//! camera by reference so they can be driven by any host, or by tests.

use nalgebra::{Point2, Point3, Unit, Vector3};

use crate::config::CameraConfig;
use crate::projection::Camera;
use crate::ray::Ray;
use crate::scene::{HitKind, ObjectId, Scene};

const DEGENERATE_EPSILON: f32 = 1e-6;

/// The current selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Single(ObjectId),
    /// Every object in the scene, rotated around a shared pivot
    World,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Drag,
    Rotate,
}

/// Transient drag/rotate state plus the selection
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionContext {
    pub draggable: Option<ObjectId>,
    pub offset: Vector3<f32>,
    pub first_click_point: Point3<f32>,
    pub rotation_mode: bool,
    pub selected: Option<Target>,
}

impl Default for InteractionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionContext {
    pub fn new() -> Self {
        Self {
            draggable: None,
            offset: Vector3::zeros(),
            first_click_point: Point3::origin(),
            rotation_mode: false,
            selected: None,
        }
    }

    pub fn mode(&self, scene: &Scene) -> Mode {
        if scene.pivot.visible {
            Mode::Rotate
        } else {
            Mode::Drag
        }
    }

    pub fn pointer_move(&mut self, scene: &mut Scene, camera: &Camera, ndc: &Point2<f32>) {
        let Some(ray) = camera.pick_ray(ndc) else {
            return;
        };

        match self.mode(scene) {
            Mode::Drag => self.drag_move(scene, camera, &ray),
            Mode::Rotate => self.rotate_move(scene, &ray),
        }
    }

    pub fn pointer_down(&mut self, scene: &mut Scene, camera: &Camera, ndc: &Point2<f32>) {
        let Some(ray) = camera.pick_ray(ndc) else {
            return;
        };

        match self.mode(scene) {
            Mode::Drag => self.begin_drag(scene, camera, &ray),
            Mode::Rotate => {
                if let Some(point) = resolve_click_point(scene, &ray) {
                    self.first_click_point = point;
                    self.rotation_mode = true;
                }
            }
        }
    }

    /// Ends whichever gesture is in progress
    pub fn pointer_up(&mut self) {
        if let Some(id) = self.draggable.take() {
            log::debug!("Released object {}", id.0);
        }
        self.rotation_mode = false;
    }

    /// Select or deselect the target under the pointer
    pub fn double_click(&mut self, scene: &mut Scene, camera: &Camera, ndc: &Point2<f32>) {
        let Some(ray) = camera.pick_ray(ndc) else {
            return;
        };

        match scene.pick(&ray).map(|hit| hit.kind) {
            Some(HitKind::Pivot) => self.deselect(scene),
            Some(HitKind::Object(id)) if self.selected == Some(Target::Single(id)) => {
                self.deselect(scene)
            }
            Some(HitKind::Object(id)) => self.select(scene, Target::Single(id)),
            None if self.selected == Some(Target::World) && scene.pivot.visible => {
                self.deselect(scene)
            }
            None => self.select(scene, Target::World),
        }
    }

    /// Fit the pivot around `target` and switch to rotate mode
    pub fn select(&mut self, scene: &mut Scene, target: Target) {
        let bounds = match target {
            Target::Single(id) => match scene.object(id) {
                Some(object) => object.world_bounds(),
                None => return,
            },
            Target::World => scene.world_bounds(),
        };

        scene.fit_pivot(&bounds);
        scene.pivot.visible = true;
        self.selected = Some(target);
        self.draggable = None;
        log::debug!(
            "Selected {:?}, pivot at {:?} scale {:.3}",
            target,
            scene.pivot.center,
            scene.pivot.scale
        );
    }

    /// Hide the pivot and return to drag mode
    pub fn deselect(&mut self, scene: &mut Scene) {
        scene.pivot.visible = false;
        self.selected = None;
        self.rotation_mode = false;
        log::debug!("Selection cleared");
    }

    fn begin_drag(&mut self, scene: &mut Scene, camera: &Camera, ray: &Ray) {
        let Some(hit) = scene.intersect_objects(ray).into_iter().next() else {
            return;
        };
        let HitKind::Object(id) = hit.kind else {
            return;
        };
        let Some(position) = scene.object(id).map(|object| object.transform.position) else {
            return;
        };

        scene.plane.face_towards(position, &camera.position);
        let Some(point) = scene.intersect_plane(ray) else {
            return;
        };

        self.offset = point - position;
        self.draggable = Some(id);
        self.rotation_mode = false;
        log::debug!("Grabbed object {} with offset {:?}", id.0, self.offset);
    }

    fn drag_move(&mut self, scene: &mut Scene, camera: &Camera, ray: &Ray) {
        match self.draggable {
            Some(id) => {
                let Some(point) = scene.intersect_plane(ray) else {
                    return;
                };
                let offset = self.offset;
                if let Some(object) = scene.object_mut(id) {
                    object.transform.position = point - offset;
                }
            }
            None => {
                // Hovering: aim the drag plane through the box under the pointer
                let hovered = scene
                    .intersect_objects(ray)
                    .first()
                    .and_then(|hit| match hit.kind {
                        HitKind::Object(id) => scene.object(id),
                        HitKind::Pivot => None,
                    })
                    .map(|object| object.transform.position);
                if let Some(position) = hovered {
                    scene.plane.face_towards(position, &camera.position);
                }
            }
        }
    }

    fn rotate_move(&mut self, scene: &mut Scene, ray: &Ray) {
        let Some(target) = self.selected else {
            return;
        };
        let Some(last_click_point) = resolve_click_point(scene, ray) else {
            return;
        };

        if self.rotation_mode {
            let center = scene.pivot.center;
            if let Some((axis, angle)) =
                rotation_between(&self.first_click_point, &last_click_point, &center)
            {
                apply_rotation(scene, target, &center, &axis, angle);
            }
        }
        self.first_click_point = last_click_point;
    }
}

/// Where the ray meets the pivot sphere, or the drag plane when it misses the pivot
pub fn resolve_click_point(scene: &Scene, ray: &Ray) -> Option<Point3<f32>> {
    scene
        .pivot
        .intersect(ray)
        .map(|t| ray.at(t))
        .or_else(|| scene.intersect_plane(ray))
}

/// Axis and angle turning `first` into `last` as seen from `center`.
///
/// `None` when either point sits on the centre or both lie on one line through it.
pub fn rotation_between(
    first: &Point3<f32>,
    last: &Point3<f32>,
    center: &Point3<f32>,
) -> Option<(Unit<Vector3<f32>>, f32)> {
    let from = first - center;
    let to = last - center;
    if from.norm() < DEGENERATE_EPSILON || to.norm() < DEGENERATE_EPSILON {
        return None;
    }
    let axis = Unit::try_new(from.cross(&to), DEGENERATE_EPSILON)?;
    Some((axis, from.angle(&to)))
}

/// Rotate `target` by `angle` about the world-space `axis`.
///
/// A single object only turns in place; the world also orbits every object
/// around `center`.
pub fn apply_rotation(
    scene: &mut Scene,
    target: Target,
    center: &Point3<f32>,
    axis: &Unit<Vector3<f32>>,
    angle: f32,
) {
    match target {
        Target::Single(id) => {
            if let Some(object) = scene.object_mut(id) {
                object.transform.rotate_on_world_axis(axis, angle);
            }
        }
        Target::World => {
            for object in &mut scene.objects {
                object.transform.orbit(center, axis, angle);
                object.transform.rotate_on_world_axis(axis, angle);
            }
        }
    }
}

/// Wheel zoom: positive `delta_y` zooms out, never below `config.zoom_floor`
pub fn apply_wheel_zoom(camera: &mut Camera, delta_y: f32, config: &CameraConfig) {
    let interval = delta_y / 100.0;
    let zooming_in = interval < 0.0;
    if !zooming_in && camera.zoom <= config.zoom_floor {
        return;
    }

    let zoom = camera.zoom - config.zoom_step * interval;
    camera.zoom = if zooming_in {
        zoom
    } else {
        zoom.max(config.zoom_floor)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::geometry::Mesh;
    use crate::projection::Viewport;
    use crate::scene::SceneObject;
    use crate::transform::Transform;
    use nalgebra::UnitQuaternion;
    use std::f32::consts::FRAC_PI_2;

    fn scene_with(positions: &[Point3<f32>]) -> Scene {
        let objects = positions
            .iter()
            .map(|&position| SceneObject {
                id: ObjectId(0),
                mesh: Mesh::cube(40.0),
                transform: Transform::at(position),
            })
            .collect();
        Scene::from_objects(objects, &SceneConfig::default())
    }

    fn camera() -> Camera {
        Camera::from_config(&CameraConfig::default(), Viewport::new(800, 800))
    }

    /// NDC of a world point as seen by `camera`
    fn ndc_of(camera: &Camera, point: Point3<f32>) -> Point2<f32> {
        let (x, y, _) = camera
            .project_to_screen(&point, &nalgebra::Matrix4::identity(), 800, 800)
            .unwrap();
        Viewport::new(800, 800).to_ndc(x, y)
    }

    fn plane_hit(scene: &Scene, camera: &Camera, ndc: &Point2<f32>) -> Point3<f32> {
        scene.intersect_plane(&camera.pick_ray(ndc).unwrap()).unwrap()
    }

    #[test]
    fn test_initial_state_is_drag_mode() {
        let scene = scene_with(&[Point3::origin()]);
        let ctx = InteractionContext::new();
        assert_eq!(ctx.mode(&scene), Mode::Drag);
        assert!(ctx.selected.is_none() && ctx.draggable.is_none() && !ctx.rotation_mode);
    }

    #[test]
    fn test_pointer_down_records_grab_offset() {
        let mut scene = scene_with(&[Point3::new(50.0, -30.0, 0.0)]);
        let camera = camera();
        let mut ctx = InteractionContext::new();

        let ndc = ndc_of(&camera, Point3::new(58.0, -22.0, 20.0));
        ctx.pointer_down(&mut scene, &camera, &ndc);

        assert_eq!(ctx.draggable, Some(ObjectId(0)));
        let expected = plane_hit(&scene, &camera, &ndc) - scene.objects[0].transform.position;
        assert!((ctx.offset - expected).norm() < 1e-3);
        assert!(ctx.offset.norm() > 1.0);
    }

    #[test]
    fn test_drag_keeps_offset() {
        let mut scene = scene_with(&[Point3::new(50.0, -30.0, 0.0)]);
        let camera = camera();
        let mut ctx = InteractionContext::new();

        ctx.pointer_down(&mut scene, &camera, &ndc_of(&camera, Point3::new(55.0, -25.0, 20.0)));
        let target = ndc_of(&camera, Point3::new(-120.0, 90.0, 0.0));
        ctx.pointer_move(&mut scene, &camera, &target);

        let expected = plane_hit(&scene, &camera, &target) - ctx.offset;
        assert!((scene.objects[0].transform.position - expected).norm() < 1e-3);

        // Same input, same result
        ctx.pointer_move(&mut scene, &camera, &target);
        assert!((scene.objects[0].transform.position - expected).norm() < 1e-3);

        ctx.pointer_up();
        assert!(ctx.draggable.is_none());
        let resting = scene.objects[0].transform.position;
        ctx.pointer_move(&mut scene, &camera, &Point2::new(0.9, 0.9));
        assert_eq!(scene.objects[0].transform.position, resting);
    }

    #[test]
    fn test_pointer_down_on_empty_space_grabs_nothing() {
        let mut scene = scene_with(&[Point3::new(200.0, 200.0, 0.0)]);
        let camera = camera();
        let mut ctx = InteractionContext::new();
        ctx.pointer_down(&mut scene, &camera, &Point2::origin());
        assert!(ctx.draggable.is_none());
    }

    #[test]
    fn test_hover_aims_plane_at_object() {
        let mut scene = scene_with(&[Point3::new(100.0, 0.0, 0.0)]);
        let camera = camera();
        let mut ctx = InteractionContext::new();
        ctx.pointer_move(&mut scene, &camera, &ndc_of(&camera, Point3::new(100.0, 0.0, 20.0)));
        assert_eq!(scene.plane.point, Point3::new(100.0, 0.0, 0.0));
        let to_eye = (camera.position - scene.plane.point).normalize();
        assert!((scene.plane.normal.into_inner() - to_eye).norm() < 1e-5);
    }

    #[test]
    fn test_double_click_toggles_in_pairs() {
        let mut scene = scene_with(&[Point3::new(100.0, 0.0, 0.0), Point3::new(-100.0, 0.0, 0.0)]);
        let camera = camera();
        let mut ctx = InteractionContext::new();
        let before = (ctx.clone(), scene.pivot.visible);

        let ndc = ndc_of(&camera, Point3::new(100.0, 0.0, 20.0));
        ctx.double_click(&mut scene, &camera, &ndc);
        assert_eq!(ctx.selected, Some(Target::Single(ObjectId(0))));
        assert_eq!(ctx.mode(&scene), Mode::Rotate);

        ctx.double_click(&mut scene, &camera, &ndc);
        assert_eq!((ctx.clone(), scene.pivot.visible), before);
    }

    #[test]
    fn test_double_click_other_object_switches_selection() {
        let mut scene = scene_with(&[Point3::new(200.0, 0.0, 0.0), Point3::new(-200.0, 0.0, 0.0)]);
        let camera = camera();
        let mut ctx = InteractionContext::new();

        ctx.double_click(&mut scene, &camera, &ndc_of(&camera, Point3::new(200.0, 0.0, 20.0)));
        ctx.double_click(&mut scene, &camera, &ndc_of(&camera, Point3::new(-200.0, 0.0, 20.0)));
        assert_eq!(ctx.selected, Some(Target::Single(ObjectId(1))));
        assert!(scene.pivot.visible);
        assert!((scene.pivot.center - Point3::new(-200.0, 0.0, 0.0)).norm() < 1e-3);
    }

    #[test]
    fn test_double_click_on_empty_space_selects_world() {
        let mut scene = scene_with(&[Point3::origin()]);
        let camera = camera();
        let mut ctx = InteractionContext::new();

        ctx.double_click(&mut scene, &camera, &Point2::new(0.8, 0.8));
        assert_eq!(ctx.selected, Some(Target::World));
        assert!(scene.pivot.visible);

        let sphere = scene.world_bounds().bounding_sphere();
        assert!((scene.pivot.center - sphere.center).norm() < 1e-4);
        assert!((scene.pivot.scale - sphere.radius / 50.0).abs() < 1e-4);

        // Missing again toggles the world selection off
        ctx.double_click(&mut scene, &camera, &Point2::new(0.8, 0.8));
        assert!(ctx.selected.is_none());
        assert!(!scene.pivot.visible);
    }

    #[test]
    fn test_double_click_box_while_world_selected() {
        let mut scene = scene_with(&[Point3::new(-150.0, 0.0, 0.0), Point3::new(150.0, 0.0, 0.0)]);
        let camera = camera();
        let mut ctx = InteractionContext::new();

        ctx.double_click(&mut scene, &camera, &Point2::new(0.9, 0.9));
        assert_eq!(ctx.selected, Some(Target::World));
        // The world pivot encloses both boxes
        assert!(scene.pivot.radius() > 170.0);

        ctx.double_click(&mut scene, &camera, &ndc_of(&camera, Point3::new(150.0, 0.0, 20.0)));
        assert_eq!(ctx.selected, Some(Target::Single(ObjectId(1))));
        assert!(scene.pivot.visible);
        assert!((scene.pivot.center - Point3::new(150.0, 0.0, 0.0)).norm() < 1e-3);
    }

    #[test]
    fn test_double_click_on_pivot_deselects() {
        let mut scene = scene_with(&[Point3::new(100.0, 0.0, 0.0)]);
        let camera = camera();
        let mut ctx = InteractionContext::new();
        ctx.select(&mut scene, Target::Single(ObjectId(0)));

        // Inside the pivot sphere but off the box
        let edge = scene.pivot.center + Vector3::new(0.0, scene.pivot.radius() * 0.9, 0.0);
        ctx.double_click(&mut scene, &camera, &ndc_of(&camera, edge));
        assert!(ctx.selected.is_none());
        assert_eq!(ctx.mode(&scene), Mode::Drag);
    }

    #[test]
    fn test_rotation_mode_excludes_drag() {
        let mut scene = scene_with(&[Point3::origin()]);
        let camera = camera();
        let mut ctx = InteractionContext::new();
        ctx.select(&mut scene, Target::Single(ObjectId(0)));

        ctx.pointer_down(&mut scene, &camera, &Point2::origin());
        assert!(ctx.rotation_mode);
        assert!(ctx.draggable.is_none());

        ctx.pointer_up();
        assert!(!ctx.rotation_mode);
    }

    #[test]
    fn test_single_object_rotates_in_place() {
        let mut scene = scene_with(&[Point3::new(30.0, 0.0, 0.0)]);
        let center = Point3::origin();
        apply_rotation(&mut scene, Target::Single(ObjectId(0)), &center, &Vector3::z_axis(), FRAC_PI_2);

        let transform = scene.objects[0].transform;
        assert_eq!(transform.position, Point3::new(30.0, 0.0, 0.0));
        assert!((transform.orientation * Vector3::x() - Vector3::y()).norm() < 1e-5);
    }

    #[test]
    fn test_world_rotation_preserves_distances() {
        let positions = [
            Point3::new(100.0, 20.0, 0.0),
            Point3::new(-80.0, 60.0, 0.0),
            Point3::new(10.0, -150.0, 0.0),
        ];
        let mut scene = scene_with(&positions);
        let center = Point3::new(5.0, -5.0, 0.0);
        let axis = Unit::new_normalize(Vector3::new(1.0, 2.0, 0.5));

        let distances = |scene: &Scene| {
            let p: Vec<_> = scene.objects.iter().map(|o| o.transform.position).collect();
            [(p[0] - p[1]).norm(), (p[1] - p[2]).norm(), (p[0] - center).norm()]
        };
        let before = distances(&scene);
        apply_rotation(&mut scene, Target::World, &center, &axis, 0.7);
        let after = distances(&scene);

        for (b, a) in before.iter().zip(after) {
            assert!((b - a).abs() < 1e-3);
        }
        let expected = UnitQuaternion::from_axis_angle(&axis, 0.7);
        assert!(scene.objects[0].transform.orientation.angle_to(&expected) < 1e-4);
    }

    #[test]
    fn test_rotation_is_angle_additive() {
        let center = Point3::new(1.0, 1.0, 0.0);
        let a = Point3::new(11.0, 1.0, 0.0);
        let b = Point3::new(1.0, 11.0, 0.0);
        let c = Point3::new(1.0 - 7.071_068, 1.0 + 7.071_068, 0.0);

        let mut stepwise = scene_with(&[Point3::new(4.0, 2.0, 0.0)]);
        for (from, to) in [(a, b), (b, c)] {
            let (axis, angle) = rotation_between(&from, &to, &center).unwrap();
            apply_rotation(&mut stepwise, Target::World, &center, &axis, angle);
        }

        let mut direct = scene_with(&[Point3::new(4.0, 2.0, 0.0)]);
        let (axis, angle) = rotation_between(&a, &c, &center).unwrap();
        apply_rotation(&mut direct, Target::World, &center, &axis, angle);

        let s = stepwise.objects[0].transform;
        let d = direct.objects[0].transform;
        assert!((s.position - d.position).norm() < 1e-2);
        assert!(s.orientation.angle_to(&d.orientation) < 1e-3);
    }

    #[test]
    fn test_degenerate_rotation_is_skipped() {
        let center = Point3::origin();
        let p = Point3::new(1.0, 0.0, 0.0);
        assert!(rotation_between(&p, &Point3::new(3.0, 0.0, 0.0), &center).is_none());
        assert!(rotation_between(&center, &p, &center).is_none());
        assert!(rotation_between(&p, &p, &center).is_none());
    }

    #[test]
    fn test_rotate_move_advances_anchor() {
        let mut scene = scene_with(&[Point3::origin()]);
        let camera = camera();
        let mut ctx = InteractionContext::new();
        ctx.select(&mut scene, Target::Single(ObjectId(0)));

        let start = Point2::new(0.001, 0.001);
        ctx.pointer_down(&mut scene, &camera, &start);
        let anchored = ctx.first_click_point;

        let next = Point2::new(0.004, -0.002);
        ctx.pointer_move(&mut scene, &camera, &next);
        let ray = camera.pick_ray(&next).unwrap();
        let expected = resolve_click_point(&scene, &ray).unwrap();
        assert!((ctx.first_click_point - expected).norm() < 1e-3);
        assert!((ctx.first_click_point - anchored).norm() > 1e-3);
        assert!(scene.objects[0].transform.orientation.angle() > 0.0);
        assert_eq!(scene.objects[0].transform.position, Point3::origin());
    }

    #[test]
    fn test_click_point_falls_back_to_plane() {
        let mut scene = scene_with(&[Point3::origin()]);
        scene.pivot.scale = 0.01;
        let ray = Ray::new(Point3::new(300.0, 0.0, 1000.0), -Vector3::z_axis());
        let point = resolve_click_point(&scene, &ray).unwrap();
        assert!((point - Point3::new(300.0, 0.0, 0.0)).norm() < 1e-3);

        let away = Ray::new(Point3::new(300.0, 0.0, 1000.0), Vector3::z_axis());
        assert!(resolve_click_point(&scene, &away).is_none());
    }

    #[test]
    fn test_zoom_never_below_floor() {
        let config = CameraConfig::default();
        let mut camera = camera();
        for _ in 0..500 {
            apply_wheel_zoom(&mut camera, 5000.0, &config);
            assert!(camera.zoom >= config.zoom_floor);
        }
        assert_eq!(camera.zoom, config.zoom_floor);

        apply_wheel_zoom(&mut camera, -100.0, &config);
        assert!((camera.zoom - (config.zoom_floor + config.zoom_step)).abs() < 1e-6);
    }
}
