//! Built-in render and compute passes

pub mod cluster_grid;
pub mod depth_prepass;
pub mod forward;
pub mod light_cull;
pub mod shadow;

pub use cluster_grid::ClusterGridPass;
pub use depth_prepass::DepthPrepass;
pub use forward::ForwardPass;
pub use light_cull::LightCullPass;
pub use shadow::ShadowPass;
