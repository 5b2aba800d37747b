//! Scene graph: the generated boxes, the pivot sphere and the drag plane.
//!
//! The scene owns every object. Selection and drag state refer to objects by
//! [`ObjectId`] only; see [`crate::interaction`].

use std::f32::consts::TAU;

use nalgebra::{Point3, Vector3};
use rand::Rng;

use crate::config::SceneConfig;
use crate::geometry::{Aabb, Color, Mesh};
use crate::ray::{Plane, Ray};
use crate::transform::{RotationState, Transform};

/// Index of an object in its [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

/// A box in the scene: local geometry plus its world transform
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub mesh: Mesh,
    pub transform: Transform,
}

impl SceneObject {
    /// World-space bounds of the transformed geometry
    pub fn world_bounds(&self) -> Aabb {
        Aabb::from_transformed_mesh(&self.mesh, &self.transform.model_matrix())
    }

    /// Nearest hit of `ray` with the transformed triangles
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let model = self.transform.model_matrix();
        self.mesh
            .triangles
            .iter()
            .filter_map(|triangle| {
                let [a, b, c] = triangle.positions();
                ray.intersect_triangle([
                    model.transform_point(&a),
                    model.transform_point(&b),
                    model.transform_point(&c),
                ])
            })
            .min_by(f32::total_cmp)
    }
}

/// The arcball: a translucent sphere fitted around the current selection
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot {
    pub center: Point3<f32>,
    /// Radius of the sphere geometry before scaling
    pub base_radius: f32,
    pub scale: f32,
    pub visible: bool,
}

impl Pivot {
    pub fn new(base_radius: f32) -> Self {
        Self {
            center: Point3::origin(),
            base_radius,
            scale: 1.0,
            visible: false,
        }
    }

    /// World-space radius
    pub fn radius(&self) -> f32 {
        self.base_radius * self.scale
    }

    /// Centre on `bounds` and scale to its bounding sphere radius / `divisor`
    pub fn fit_to(&mut self, bounds: &Aabb, divisor: f32) {
        let sphere = bounds.bounding_sphere();
        self.center = sphere.center;
        self.scale = sphere.radius / divisor;
    }

    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        ray.intersect_sphere(&self.center, self.radius())
    }
}

/// What a pick ray hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Object(ObjectId),
    Pivot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub kind: HitKind,
    pub distance: f32,
    pub point: Point3<f32>,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub pivot: Pivot,
    /// Surface that turns pointer positions into world points while dragging
    pub plane: Plane,
    pub background: Color,
    pub pivot_color: Color,
    pub pivot_opacity: f32,
    pivot_scale_divisor: f32,
}

impl Scene {
    /// Scene holding `objects`, with a pivot sized from the first object's geometry
    pub fn from_objects(objects: Vec<SceneObject>, config: &SceneConfig) -> Self {
        let base_radius = objects
            .first()
            .map_or(config.box_size * 3.0_f32.sqrt() / 2.0, |o| o.mesh.bounding_sphere().radius)
            * config.pivot_radius_factor;

        let objects = objects
            .into_iter()
            .enumerate()
            .map(|(index, object)| SceneObject {
                id: ObjectId(index),
                ..object
            })
            .collect();

        Self {
            objects,
            pivot: Pivot::new(base_radius),
            plane: Plane::ground(),
            background: config.background_color,
            pivot_color: config.pivot_color,
            pivot_opacity: config.pivot_opacity,
            pivot_scale_divisor: config.pivot_scale_divisor,
        }
    }

    /// Randomly placed, oriented, scaled and coloured boxes
    pub fn generate<R: Rng>(config: &SceneConfig, rng: &mut R) -> Self {
        let objects = (0..config.object_count)
            .map(|index| {
                let face_colors = [(); 6].map(|_| Color::from_hex(rng.random_range(0..=0xffffff)));
                let mesh = Mesh::colored_cube(config.box_size, face_colors);

                let mut transform = Transform::at(Point3::new(
                    rng.random_range(-1.0..=1.0) * config.spread,
                    rng.random_range(-1.0..=1.0) * config.spread,
                    0.0,
                ));
                transform.orientation = RotationState::new(
                    rng.random_range(0.0..TAU),
                    rng.random_range(0.0..TAU),
                    rng.random_range(0.0..TAU),
                )
                .to_quaternion();
                transform.scale = Vector3::from_fn(|_, _| random_scale(rng, config));

                SceneObject {
                    id: ObjectId(index),
                    mesh,
                    transform,
                }
            })
            .collect();

        let scene = Self::from_objects(objects, config);
        log::debug!(
            "Generated {} objects, pivot base radius {:.2}",
            scene.objects.len(),
            scene.pivot.base_radius
        );
        scene
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id.0)
    }

    /// Bounds of every object; empty for an empty scene
    pub fn world_bounds(&self) -> Aabb {
        self.objects
            .iter()
            .fold(Aabb::empty(), |acc, object| acc.union(&object.world_bounds()))
    }

    pub fn fit_pivot(&mut self, bounds: &Aabb) {
        self.pivot.fit_to(bounds, self.pivot_scale_divisor);
    }

    /// Object hits ordered nearest first
    pub fn intersect_objects(&self, ray: &Ray) -> Vec<Hit> {
        let mut hits: Vec<Hit> = self
            .objects
            .iter()
            .filter_map(|object| {
                object.intersect(ray).map(|distance| Hit {
                    kind: HitKind::Object(object.id),
                    distance,
                    point: ray.at(distance),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Nearest object under the ray, or the visible pivot when no object is hit.
    ///
    /// The pivot encloses its target, so boxes take precedence over it.
    pub fn pick(&self, ray: &Ray) -> Option<Hit> {
        if let Some(hit) = self.intersect_objects(ray).into_iter().next() {
            return Some(hit);
        }

        self.pivot
            .visible
            .then(|| self.pivot.intersect(ray))
            .flatten()
            .map(|distance| Hit {
                kind: HitKind::Pivot,
                distance,
                point: ray.at(distance),
            })
    }

    /// Point where `ray` meets the drag plane
    pub fn intersect_plane(&self, ray: &Ray) -> Option<Point3<f32>> {
        ray.intersect_plane(&self.plane).map(|t| ray.at(t))
    }
}

fn random_scale<R: Rng>(rng: &mut R, config: &SceneConfig) -> f32 {
    if config.max_scale > config.min_scale {
        rng.random_range(config.min_scale..config.max_scale)
    } else {
        config.min_scale
    }
}
