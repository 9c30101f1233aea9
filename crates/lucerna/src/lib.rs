//! Lucerna - a real-time renderer built around clustered forward lighting
//!
//! The view frustum is split into a 3-D cluster grid; a per-frame GPU pass
//! assigns each cluster the point lights whose spheres touch it, and the
//! forward pass shades every pixel from its own cluster's light list plus
//! the shadow feed (one directional map, one depth cube per point light).

pub use lucerna_core as core;
pub use lucerna_lighting as lighting;
pub use lucerna_render as render;

pub mod prelude {
    pub use crate::core::{
        Camera, DirectionalLight, Light, LightCommon, PointLight, SceneConfig, SceneLights,
    };
    pub use crate::lighting::{ClusterGrid, ScreenToView, GRID_SIZE, MAX_LIGHTS};
    pub use crate::render::{GpuMesh, Renderer, RendererConfig, Scene};
    pub use glam;
    pub use wgpu;
}
