//! Clustered forward lighting core.
//!
//! The view frustum is partitioned into a fixed 3-D grid of clusters:
//! screen-space tiles in x/y, logarithmic depth slices in z. Each frame a
//! culling pass assigns every point light to the clusters its influence
//! sphere touches, so shading walks only the lights near each pixel.
//!
//! This crate holds the host side of that pipeline: cluster grid geometry,
//! the screen-to-view constants, GPU-layout light records, and a sequential
//! reference culler that defines the semantics the GPU compute pass must
//! match. GPU resources and dispatch live in `lucerna-render`.

pub mod cull;
pub mod grid;
pub mod screen_to_view;
pub mod store;

pub use cull::{cull_lights, CullResults, LightGridCell};
pub use grid::{ClusterAabb, ClusterGrid};
pub use screen_to_view::ScreenToView;
pub use store::{pack_lights, GpuLight};

pub use lucerna_core::light::MAX_LIGHTS;

use glam::UVec3;

/// Cluster grid dimensions: 16 x 9 tiles, 24 depth slices.
pub const GRID_SIZE: UVec3 = UVec3::new(16, 9, 24);

/// Total cluster count (3,456 for the default grid).
pub const NUM_CLUSTERS: u32 = GRID_SIZE.x * GRID_SIZE.y * GRID_SIZE.z;

/// Per-cluster slot budget in the light index list. Clusters intersecting
/// more lights than this silently drop the excess.
pub const MAX_LIGHTS_PER_CLUSTER: u32 = 50;
