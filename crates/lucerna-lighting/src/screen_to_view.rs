//! Per-projection constants that let any (pixel, depth) pair be resolved to
//! a cluster index, on the CPU and in shaders alike.
//!
//! The logarithmic slice lookup is reduced to one multiply and one add:
//! `slice = floor(log2(depth) * slice_scale + slice_bias)` with
//! `slice_scale = Gz / log2(zFar/zNear)` and
//! `slice_bias = -Gz * log2(zNear) / log2(zFar/zNear)`.
//!
//! The record is uploaded verbatim as a uniform buffer; the layout is fixed
//! and asserted by tests against the WGSL struct it must match.

use crate::grid::ClusterGrid;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ScreenToView {
    pub inverse_projection: [[f32; 4]; 4],
    /// Grid dimensions (Gx, Gy, Gz, unused).
    pub grid_size: [u32; 4],
    pub screen_size: [f32; 2],
    /// Tile extent in pixels, screen size over grid size rounded up.
    pub tile_size_px: [f32; 2],
    pub slice_scale: f32,
    pub slice_bias: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl ScreenToView {
    /// Derives the constants for one projection. Must be recomputed, along
    /// with the cluster AABBs, whenever the projection changes; the
    /// renderer owns that check.
    pub fn new(grid: &ClusterGrid, projection: Mat4) -> Self {
        let depth_ratio_log2 = (grid.z_far / grid.z_near).log2();
        let tile = grid.tile_size_px();

        Self {
            inverse_projection: projection.inverse().to_cols_array_2d(),
            grid_size: [grid.dims.x, grid.dims.y, grid.dims.z, 0],
            screen_size: [grid.screen_width as f32, grid.screen_height as f32],
            tile_size_px: [tile.x, tile.y],
            slice_scale: grid.dims.z as f32 / depth_ratio_log2,
            slice_bias: -(grid.dims.z as f32 * grid.z_near.log2() / depth_ratio_log2),
            z_near: grid.z_near,
            z_far: grid.z_far,
        }
    }

    /// Depth slice for a positive view-space depth, clamped to the grid.
    pub fn slice_for_depth(&self, depth: f32) -> u32 {
        let slices = self.grid_size[2];
        if depth <= 0.0 {
            return 0;
        }
        let slice = (depth.log2() * self.slice_scale + self.slice_bias).floor();
        (slice.max(0.0) as u32).min(slices - 1)
    }

    /// Cluster index for a pixel (origin top-left) and view-space depth.
    pub fn cluster_index(&self, px: f32, py: f32, depth: f32) -> u32 {
        let tile_x = ((px / self.tile_size_px[0]) as u32).min(self.grid_size[0] - 1);
        let tile_y = ((py / self.tile_size_px[1]) as u32).min(self.grid_size[1] - 1);
        let slice = self.slice_for_depth(depth);
        tile_x + self.grid_size[0] * tile_y + self.grid_size[0] * self.grid_size[1] * slice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GRID_SIZE;
    use std::mem::{offset_of, size_of};

    fn test_grid() -> ClusterGrid {
        ClusterGrid::new(GRID_SIZE, 1280, 720, 0.1, 2000.0)
    }

    fn test_constants() -> ScreenToView {
        let grid = test_grid();
        let projection = Mat4::perspective_rh(
            std::f32::consts::FRAC_PI_3,
            1280.0 / 720.0,
            grid.z_near,
            grid.z_far,
        );
        ScreenToView::new(&grid, projection)
    }

    #[test]
    fn layout_matches_shader_struct() {
        assert_eq!(size_of::<ScreenToView>(), 112);
        assert_eq!(offset_of!(ScreenToView, inverse_projection), 0);
        assert_eq!(offset_of!(ScreenToView, grid_size), 64);
        assert_eq!(offset_of!(ScreenToView, screen_size), 80);
        assert_eq!(offset_of!(ScreenToView, tile_size_px), 88);
        assert_eq!(offset_of!(ScreenToView, slice_scale), 96);
        assert_eq!(offset_of!(ScreenToView, slice_bias), 100);
        assert_eq!(offset_of!(ScreenToView, z_near), 104);
        assert_eq!(offset_of!(ScreenToView, z_far), 108);
    }

    #[test]
    fn slice_endpoints() {
        let stv = test_constants();
        // Slice 0 starts exactly at the near plane; approaching the far
        // plane lands in the last slice.
        assert_eq!(stv.slice_for_depth(0.1), 0);
        assert_eq!(stv.slice_for_depth(1999.9), GRID_SIZE.z - 1);
    }

    #[test]
    fn slice_is_monotonic_in_depth() {
        let stv = test_constants();
        let mut last = 0;
        let mut depth = 0.1f32;
        while depth < 2000.0 {
            let slice = stv.slice_for_depth(depth);
            assert!(slice >= last, "slice regressed at depth {depth}");
            last = slice;
            depth *= 1.07;
        }
        assert_eq!(last, GRID_SIZE.z - 1);
    }

    #[test]
    fn slice_round_trips_grid_boundaries() {
        let grid = test_grid();
        let stv = test_constants();
        for slice in 0..GRID_SIZE.z {
            // Just past a slice's near boundary resolves to that slice.
            let depth = grid.slice_depth(slice) * 1.0001;
            assert_eq!(stv.slice_for_depth(depth), slice);
        }
    }

    #[test]
    fn cluster_index_agrees_with_grid_layout() {
        let grid = test_grid();
        let stv = test_constants();
        // Pixel in tile (3, 2), depth in slice 5.
        let depth = grid.slice_depth(5) * 1.01;
        let index = stv.cluster_index(3.0 * 80.0 + 1.0, 2.0 * 80.0 + 1.0, depth);
        assert_eq!(index, grid.linear_index(3, 2, 5));
    }
}
