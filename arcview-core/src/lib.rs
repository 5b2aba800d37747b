//! arcview core library - scene, geometry and the arcball interaction model
//!
//! Everything here is host-independent: the terminal and web front ends feed
//! [`InputEvent`]s into a [`Viewer`] and draw what its [`Scene`] holds.

pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod projection;
pub mod ray;
pub mod scene;
pub mod transform;
pub mod viewer;

// Re-export commonly used types
pub use config::{CameraConfig, SceneConfig, ViewerConfig};
pub use error::ArcviewError;
pub use geometry::{Aabb, BoundingSphere, Color, Mesh, Triangle, Vertex};
pub use input::InputEvent;
pub use interaction::{InteractionContext, Mode, Target};
pub use projection::{Camera, ProjectionMode, Viewport};
pub use ray::{Plane, Ray};
pub use scene::{Hit, HitKind, ObjectId, Pivot, Scene, SceneObject};
pub use transform::{normal_matrix, RotationState, Transform};
pub use viewer::Viewer;
