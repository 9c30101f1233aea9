//! Core types for the Lucerna renderer: camera, bounding volumes, the light
//! model, and scene description loading.
//!
//! Nothing in this crate touches the GPU; it is the data model the lighting
//! and render crates build on.

pub mod bounds;
pub mod camera;
pub mod config;
pub mod error;
pub mod light;
pub mod scene;

pub use bounds::{Aabb, Sphere};
pub use camera::{Camera, ProjectionParams};
pub use config::SceneConfig;
pub use error::{Error, Result};
pub use light::{DirectionalLight, Light, LightCommon, PointLight, MAX_LIGHTS};
pub use scene::SceneLights;
