//! Lucerna's wgpu renderer: a clustered forward pipeline.
//!
//! Per frame the renderer refreshes the GPU light array, renders the shadow
//! feed (one directional map, one depth cube per point light), recomputes
//! the cluster/light assignment against the current view matrix on the GPU,
//! then forward-shades reading both outputs. Pass ordering is resolved by a
//! small render graph from declared resource dependencies; the cluster grid
//! itself is only rebuilt when the projection changes.

pub mod cluster;
pub mod graph;
pub mod mesh;
pub mod passes;
pub mod pipeline;
pub mod resources;
pub mod scene;
pub mod shadow;

mod renderer;

pub use mesh::{DrawCall, GpuMesh, PackedVertex};
pub use renderer::{Renderer, RendererConfig};
pub use scene::{Scene, SceneObject};

/// Result type for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during rendering
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Shader error: {0}")]
    Shader(String),

    #[error(transparent)]
    Config(#[from] lucerna_core::Error),
}
