//! Shadow feed: the depth maps the shading pass samples.
//!
//! One 2-D depth target for the directional light, rendered through its
//! orthographic light-space matrix, and one depth cube per point light,
//! rendered face by face through the shared 90-degree projection. Cube
//! faces store linear `distance / zFar` rather than projective depth, so
//! shading compares distances directly against each light's far plane.
//!
//! All targets are allocated here, up front; wgpu validates every
//! attachment at creation, so an unusable shadow target fails loudly at
//! startup instead of mid-frame. Matrices are rewritten every frame since
//! lights move freely.

use crate::resources::BindGroupLayouts;
use crate::scene::Scene;
use bytemuck::{Pod, Zeroable};
use lucerna_core::PointLight;

/// Per-face uniforms for the shadow pipelines: the light's view-projection
/// for this face, the light position, and its far plane in w.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ShadowFaceUniform {
    pub matrix: [[f32; 4]; 4],
    pub light_pos_far: [f32; 4],
}

/// One shadow render target plus the uniforms/bind group that draw into it.
pub struct ShadowTarget {
    pub view: wgpu::TextureView,
    pub uniform: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

pub struct ShadowFeed {
    /// Directional light depth map.
    pub directional: ShadowTarget,
    dir_resolution: u32,

    /// All point-light cube faces as a cube-array view, for shading.
    pub cube_array_view: wgpu::TextureView,
    /// Per-face render targets, 6 per point light, layer-major.
    pub point_faces: Vec<ShadowTarget>,
    point_count: usize,
    point_resolution: u32,

    /// Comparison sampler shared by the directional and cube lookups.
    pub comparison_sampler: wgpu::Sampler,

    _dir_texture: wgpu::Texture,
    _cube_texture: wgpu::Texture,
}

fn depth_texture(
    device: &wgpu::Device,
    label: &str,
    resolution: u32,
    layers: u32,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: resolution,
            height: resolution,
            depth_or_array_layers: layers,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}

fn face_uniform(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<ShadowFaceUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl ShadowFeed {
    /// Allocates targets sized for `scene`: the directional light's
    /// configured resolution, and a cube per point light at the largest
    /// point-light resolution (cube faces share one array texture, so
    /// per-light sizes coalesce to the maximum).
    pub fn for_scene(device: &wgpu::Device, layouts: &BindGroupLayouts, scene: &Scene) -> Self {
        let dir_resolution = scene.directional_light.common.shadow_resolution;
        let point_count = scene.point_lights.len();
        let point_resolution = Self::point_resolution_for(&scene.point_lights);

        let dir_texture = depth_texture(device, "Directional Shadow Map", dir_resolution, 1);
        let dir_view = dir_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let dir_uniform = face_uniform(device, "Directional Shadow Uniform");
        let dir_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Directional Shadow Bind Group"),
            layout: &layouts.shadow,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: dir_uniform.as_entire_binding(),
            }],
        });

        // Cube arrays need at least one cube even in point-light-free scenes.
        let cube_count = point_count.max(1) as u32;
        let cube_texture = depth_texture(
            device,
            "Point Shadow Cube Array",
            point_resolution,
            cube_count * 6,
        );
        let cube_array_view = cube_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Point Shadow Cube Array View"),
            dimension: Some(wgpu::TextureViewDimension::CubeArray),
            ..Default::default()
        });

        let mut point_faces = Vec::with_capacity(point_count * 6);
        for light in 0..point_count {
            for face in 0..6u32 {
                let view = cube_texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("Point Shadow L{light} F{face}")),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: light as u32 * 6 + face,
                    array_layer_count: Some(1),
                    ..Default::default()
                });
                let uniform = face_uniform(device, &format!("Point Shadow Uniform L{light} F{face}"));
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("Point Shadow Bind Group L{light} F{face}")),
                    layout: &layouts.shadow,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform.as_entire_binding(),
                    }],
                });
                point_faces.push(ShadowTarget {
                    view,
                    uniform,
                    bind_group,
                });
            }
        }

        let comparison_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            compare: Some(wgpu::CompareFunction::LessEqual),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        log::info!(
            "Shadow feed allocated: directional {}px, {} point cube(s) at {}px",
            dir_resolution,
            point_count,
            point_resolution
        );

        Self {
            directional: ShadowTarget {
                view: dir_view,
                uniform: dir_uniform,
                bind_group: dir_bind_group,
            },
            dir_resolution,
            cube_array_view,
            point_faces,
            point_count,
            point_resolution,
            comparison_sampler,
            _dir_texture: dir_texture,
            _cube_texture: cube_texture,
        }
    }

    fn point_resolution_for(lights: &[PointLight]) -> u32 {
        lights
            .iter()
            .map(|l| l.common.shadow_resolution)
            .max()
            .unwrap_or(1024)
    }

    /// Whether the allocated targets still fit the scene's lights.
    pub fn matches(&self, scene: &Scene) -> bool {
        self.point_count == scene.point_lights.len()
            && self.dir_resolution == scene.directional_light.common.shadow_resolution
            && self.point_resolution == Self::point_resolution_for(&scene.point_lights)
    }

    /// Rewrites every light's shadow matrices for this frame.
    pub fn write_matrices(&self, queue: &wgpu::Queue, scene: &Scene) {
        let dir = ShadowFaceUniform {
            matrix: scene.directional_light.light_space_matrix().to_cols_array_2d(),
            light_pos_far: [0.0; 4],
        };
        queue.write_buffer(&self.directional.uniform, 0, bytemuck::bytes_of(&dir));

        for (index, light) in scene.point_lights.iter().enumerate() {
            let p = light.position;
            for face in 0..6 {
                let uniform = ShadowFaceUniform {
                    matrix: light.face_matrix(face).to_cols_array_2d(),
                    light_pos_far: [p.x, p.y, p.z, light.common.z_far],
                };
                queue.write_buffer(
                    &self.point_faces[index * 6 + face].uniform,
                    0,
                    bytemuck::bytes_of(&uniform),
                );
            }
        }
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn face_uniform_layout_matches_shader() {
        assert_eq!(size_of::<ShadowFaceUniform>(), 80);
        assert_eq!(offset_of!(ShadowFaceUniform, matrix), 0);
        assert_eq!(offset_of!(ShadowFaceUniform, light_pos_far), 64);
    }
}
