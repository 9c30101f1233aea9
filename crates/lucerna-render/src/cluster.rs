//! GPU resources for the clustered lighting pipeline.
//!
//! Six buffers drive the two compute passes and the forward lookup: the
//! cluster AABB grid, the screen-to-view constants, the packed light array,
//! the compacted light index list, the per-cluster light grid, and the
//! single atomic counter the culling pass bump-allocates from.
//!
//! The AABB grid and screen-to-view constants are a function of the
//! projection alone. [`ClusterResources::update_projection`] compares the
//! camera's projection parameters against the snapshot they were last built
//! from and refreshes both when they differ, which is what keeps the
//! stale-constants failure mode from existing at all.

use crate::resources::BindGroupLayouts;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use lucerna_core::{Camera, ProjectionParams};
use lucerna_lighting::{
    ClusterGrid, GpuLight, ScreenToView, GRID_SIZE, MAX_LIGHTS, MAX_LIGHTS_PER_CLUSTER,
    NUM_CLUSTERS,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-dispatch uniforms for the light culler.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CullUniforms {
    pub view: [[f32; 4]; 4],
    pub light_count: u32,
    pub _pad: [u32; 3],
}

pub struct ClusterResources {
    pub screen_to_view_buffer: wgpu::Buffer,
    pub aabb_buffer: wgpu::Buffer,
    pub light_buffer: wgpu::Buffer,
    pub light_index_list_buffer: wgpu::Buffer,
    pub light_grid_buffer: wgpu::Buffer,
    pub counter_buffer: Arc<wgpu::Buffer>,
    pub cull_uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,

    /// Set when the AABB grid no longer matches the current projection;
    /// cleared by the cluster-grid pass when it re-dispatches.
    pub grid_dirty: Arc<AtomicBool>,

    width: u32,
    height: u32,
    built_for: Option<ProjectionParams>,
}

fn storage_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl ClusterResources {
    pub fn new(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        width: u32,
        height: u32,
    ) -> Self {
        let screen_to_view_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Screen To View Uniform"),
            size: std::mem::size_of::<ScreenToView>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let aabb_buffer = storage_buffer(
            device,
            "Cluster AABB Grid",
            NUM_CLUSTERS as u64 * 2 * 16,
        );
        let light_buffer = storage_buffer(
            device,
            "Light Storage Buffer",
            (MAX_LIGHTS * std::mem::size_of::<GpuLight>()) as u64,
        );
        let light_index_list_buffer = storage_buffer(
            device,
            "Light Index List",
            NUM_CLUSTERS as u64 * MAX_LIGHTS_PER_CLUSTER as u64 * 4,
        );
        let light_grid_buffer = storage_buffer(device, "Light Grid", NUM_CLUSTERS as u64 * 8);
        let counter_buffer = Arc::new(storage_buffer(device, "Light Index Global Counter", 4));

        let cull_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cull Uniforms"),
            size: std::mem::size_of::<CullUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Cluster Bind Group"),
            layout: &layouts.cluster,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: screen_to_view_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: aabb_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: light_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: light_index_list_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: light_grid_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: counter_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: cull_uniform_buffer.as_entire_binding(),
                },
            ],
        });

        log::info!(
            "Cluster resources created: {} clusters, {} light slots, {} index entries",
            NUM_CLUSTERS,
            MAX_LIGHTS,
            NUM_CLUSTERS * MAX_LIGHTS_PER_CLUSTER
        );

        Self {
            screen_to_view_buffer,
            aabb_buffer,
            light_buffer,
            light_index_list_buffer,
            light_grid_buffer,
            counter_buffer,
            cull_uniform_buffer,
            bind_group,
            grid_dirty: Arc::new(AtomicBool::new(true)),
            width,
            height,
            built_for: None,
        }
    }

    /// Refreshes the screen-to-view constants and flags the AABB grid for
    /// rebuild if the camera's projection parameters changed. Returns true
    /// when a rebuild was scheduled.
    pub fn update_projection(&mut self, queue: &wgpu::Queue, camera: &Camera) -> bool {
        let params = camera.projection_params();
        if self.built_for == Some(params) {
            return false;
        }

        let grid = ClusterGrid::new(
            GRID_SIZE,
            self.width,
            self.height,
            params.near_plane,
            params.far_plane,
        );
        let constants = ScreenToView::new(&grid, camera.projection_matrix());
        queue.write_buffer(
            &self.screen_to_view_buffer,
            0,
            bytemuck::bytes_of(&constants),
        );

        self.built_for = Some(params);
        self.grid_dirty.store(true, Ordering::Release);
        log::info!(
            "Cluster grid scheduled for rebuild (fov {:.3}, aspect {:.3}, depth [{}, {}])",
            params.fov_y,
            params.aspect_ratio,
            params.near_plane,
            params.far_plane
        );
        true
    }

    /// Per-frame upload: the packed light array and the culling view matrix.
    pub fn write_frame(&self, queue: &wgpu::Queue, view: Mat4, lights: &[GpuLight]) {
        if !lights.is_empty() {
            queue.write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(lights));
        }
        let uniforms = CullUniforms {
            view: view.to_cols_array_2d(),
            light_count: lights.len() as u32,
            _pad: [0; 3],
        };
        queue.write_buffer(&self.cull_uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Screen size feeds tile extents, so a resize invalidates the grid.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (self.width, self.height) != (width, height) {
            self.width = width;
            self.height = height;
            self.built_for = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn cull_uniforms_layout_matches_shader() {
        assert_eq!(size_of::<CullUniforms>(), 80);
        assert_eq!(offset_of!(CullUniforms, view), 0);
        assert_eq!(offset_of!(CullUniforms, light_count), 64);
    }
}
