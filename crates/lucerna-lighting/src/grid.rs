//! Cluster grid geometry.
//!
//! Clusters are identified by (x, y, z) with x/y indexing screen tiles from
//! the top-left and z indexing logarithmic depth slices, linearized as
//! `x + Gx*y + Gx*Gy*z`. Each cluster owns a view-space AABB that is valid
//! for any camera pose and only goes stale when the projection changes.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, UVec3, Vec2, Vec3, Vec4};
use lucerna_core::Aabb;

/// View-space cluster bounding box in the GPU buffer layout: two vec4s,
/// w components unused.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ClusterAabb {
    pub min_point: [f32; 4],
    pub max_point: [f32; 4],
}

impl ClusterAabb {
    pub fn to_aabb(&self) -> Aabb {
        Aabb::new(
            Vec3::new(self.min_point[0], self.min_point[1], self.min_point[2]),
            Vec3::new(self.max_point[0], self.max_point[1], self.max_point[2]),
        )
    }
}

/// The cluster grid for one projection. Rebuild whenever fov, aspect, near,
/// or far change; camera translation and rotation never invalidate it.
#[derive(Clone, Copy, Debug)]
pub struct ClusterGrid {
    pub dims: UVec3,
    pub screen_width: u32,
    pub screen_height: u32,
    pub z_near: f32,
    pub z_far: f32,
}

impl ClusterGrid {
    pub fn new(dims: UVec3, screen_width: u32, screen_height: u32, z_near: f32, z_far: f32) -> Self {
        Self {
            dims,
            screen_width,
            screen_height,
            z_near,
            z_far,
        }
    }

    pub fn cluster_count(&self) -> u32 {
        self.dims.x * self.dims.y * self.dims.z
    }

    pub fn linear_index(&self, x: u32, y: u32, z: u32) -> u32 {
        x + self.dims.x * y + self.dims.x * self.dims.y * z
    }

    /// Tile extent in pixels, rounded up so the grid covers the screen.
    pub fn tile_size_px(&self) -> Vec2 {
        Vec2::new(
            (self.screen_width as f32 / self.dims.x as f32).ceil(),
            (self.screen_height as f32 / self.dims.y as f32).ceil(),
        )
    }

    /// Near depth of slice `z`: `zNear * (zFar/zNear)^(z/Gz)`. Slice 0
    /// starts at the near plane; slice thickness grows geometrically.
    pub fn slice_depth(&self, slice: u32) -> f32 {
        self.z_near * (self.z_far / self.z_near).powf(slice as f32 / self.dims.z as f32)
    }

    /// View-space AABBs for every cluster, in linear-index order. Host
    /// mirror of the cluster-grid compute shader; the two must agree
    /// statement for statement.
    pub fn build_aabbs(&self, inverse_projection: Mat4) -> Vec<ClusterAabb> {
        let tile = self.tile_size_px();
        let mut aabbs = Vec::with_capacity(self.cluster_count() as usize);

        for z in 0..self.dims.z {
            // Slice planes sit at negative view-space z (camera looks down -z).
            let near_z = -self.slice_depth(z);
            let far_z = -self.slice_depth(z + 1);

            for y in 0..self.dims.y {
                for x in 0..self.dims.x {
                    let px_min = Vec2::new(x as f32 * tile.x, y as f32 * tile.y);
                    let px_max = Vec2::new((x + 1) as f32 * tile.x, (y + 1) as f32 * tile.y);

                    // Four corner rays of the tile, as view-space points on
                    // the far plane.
                    let corners = [
                        self.screen_to_view(Vec2::new(px_min.x, px_min.y), inverse_projection),
                        self.screen_to_view(Vec2::new(px_max.x, px_min.y), inverse_projection),
                        self.screen_to_view(Vec2::new(px_min.x, px_max.y), inverse_projection),
                        self.screen_to_view(Vec2::new(px_max.x, px_max.y), inverse_projection),
                    ];

                    let mut min = Vec3::splat(f32::MAX);
                    let mut max = Vec3::splat(f32::MIN);
                    for corner in corners {
                        let on_near = intersect_z_plane(corner, near_z);
                        let on_far = intersect_z_plane(corner, far_z);
                        min = min.min(on_near).min(on_far);
                        max = max.max(on_near).max(on_far);
                    }

                    aabbs.push(ClusterAabb {
                        min_point: [min.x, min.y, min.z, 0.0],
                        max_point: [max.x, max.y, max.z, 0.0],
                    });
                }
            }
        }

        aabbs
    }

    /// Maps a pixel coordinate (origin top-left) through the inverse
    /// projection to a view-space point on the far plane.
    fn screen_to_view(&self, px: Vec2, inverse_projection: Mat4) -> Vec3 {
        let uv = Vec2::new(
            px.x / self.screen_width as f32,
            px.y / self.screen_height as f32,
        );
        let ndc = Vec2::new(2.0 * uv.x - 1.0, 1.0 - 2.0 * uv.y);
        let view = inverse_projection * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        view.truncate() / view.w
    }
}

/// Intersection of the line from the eye (origin) through `point` with the
/// plane `z = plane_z`.
fn intersect_z_plane(point: Vec3, plane_z: f32) -> Vec3 {
    point * (plane_z / point.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GRID_SIZE;

    const WIDTH: u32 = 1280;
    const HEIGHT: u32 = 720;
    const Z_NEAR: f32 = 0.1;
    const Z_FAR: f32 = 2000.0;

    fn test_grid() -> ClusterGrid {
        ClusterGrid::new(GRID_SIZE, WIDTH, HEIGHT, Z_NEAR, Z_FAR)
    }

    fn test_projection() -> Mat4 {
        Mat4::perspective_rh(
            std::f32::consts::FRAC_PI_3,
            WIDTH as f32 / HEIGHT as f32,
            Z_NEAR,
            Z_FAR,
        )
    }

    /// View-space position of a pixel at a given (positive) depth, computed
    /// from first principles rather than through the inverse projection.
    fn analytic_view_point(grid: &ClusterGrid, px: Vec2, depth: f32) -> Vec3 {
        let half_fov_tan = (std::f32::consts::FRAC_PI_3 / 2.0).tan();
        let aspect = WIDTH as f32 / HEIGHT as f32;
        let ndc_x = 2.0 * px.x / grid.screen_width as f32 - 1.0;
        let ndc_y = 1.0 - 2.0 * px.y / grid.screen_height as f32;
        Vec3::new(
            ndc_x * depth * half_fov_tan * aspect,
            ndc_y * depth * half_fov_tan,
            -depth,
        )
    }

    #[test]
    fn layout_matches_shader_struct() {
        use std::mem::{offset_of, size_of};
        assert_eq!(size_of::<ClusterAabb>(), 32);
        assert_eq!(offset_of!(ClusterAabb, min_point), 0);
        assert_eq!(offset_of!(ClusterAabb, max_point), 16);
    }

    #[test]
    fn slice_depths_span_near_to_far() {
        let grid = test_grid();
        assert!((grid.slice_depth(0) - Z_NEAR).abs() < 1e-6);
        assert!((grid.slice_depth(grid.dims.z) - Z_FAR).abs() < Z_FAR * 1e-5);

        // Geometric growth: each slice is thicker than the one before.
        for z in 1..grid.dims.z {
            let prev = grid.slice_depth(z) - grid.slice_depth(z - 1);
            let next = grid.slice_depth(z + 1) - grid.slice_depth(z);
            assert!(next > prev);
        }
    }

    #[test]
    fn linear_index_matches_layout() {
        let grid = test_grid();
        assert_eq!(grid.linear_index(0, 0, 0), 0);
        assert_eq!(grid.linear_index(1, 0, 0), 1);
        assert_eq!(grid.linear_index(0, 1, 0), 16);
        assert_eq!(grid.linear_index(0, 0, 1), 144);
        assert_eq!(
            grid.linear_index(15, 8, 23),
            grid.cluster_count() - 1
        );
    }

    #[test]
    fn aabbs_contain_their_frustum_subvolume() {
        let grid = test_grid();
        let aabbs = grid.build_aabbs(test_projection().inverse());
        assert_eq!(aabbs.len(), grid.cluster_count() as usize);

        let tile = grid.tile_size_px();
        for z in 0..grid.dims.z {
            for y in 0..grid.dims.y {
                for x in 0..grid.dims.x {
                    let aabb = aabbs[grid.linear_index(x, y, z) as usize].to_aabb();
                    // Every analytically-computed corner of the sub-volume
                    // must sit inside the cluster's box.
                    for (px, py) in [
                        (x as f32, y as f32),
                        ((x + 1) as f32, y as f32),
                        (x as f32, (y + 1) as f32),
                        ((x + 1) as f32, (y + 1) as f32),
                    ] {
                        for depth in [grid.slice_depth(z), grid.slice_depth(z + 1)] {
                            let corner = analytic_view_point(
                                &grid,
                                Vec2::new(px * tile.x, py * tile.y),
                                depth,
                            );
                            let eps = Vec3::splat(1e-2 + depth * 1e-4);
                            let grown = Aabb::new(aabb.min - eps, aabb.max + eps);
                            assert!(
                                grown.contains_point(corner),
                                "cluster ({x},{y},{z}) corner {corner:?} outside {aabb:?}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn aabbs_are_in_front_of_the_camera() {
        let grid = test_grid();
        let aabbs = grid.build_aabbs(test_projection().inverse());
        for aabb in &aabbs {
            assert!(aabb.max_point[2] <= 0.0);
            assert!(aabb.min_point[2] < aabb.max_point[2]);
        }
    }
}
