//! Standard bind group layouts shared by all pipelines.
//!
//! Raster pipelines all use the same three groups so resources can be bound
//! once per frame:
//!
//! - Group 0: Global (camera, frame globals) - per-frame
//! - Group 1: Material (PBR properties, textures) - per-draw
//! - Group 2: Lighting (light array, cluster outputs, shadow maps) - per-frame
//!
//! The two compute passes share a single `cluster` layout over the culling
//! buffers, and the shadow pipelines bind one small `shadow` group with the
//! active light's matrix.

use std::sync::Arc;

#[derive(Clone)]
pub struct BindGroupLayouts {
    pub global: Arc<wgpu::BindGroupLayout>,
    pub material: Arc<wgpu::BindGroupLayout>,
    pub lighting: Arc<wgpu::BindGroupLayout>,
    pub cluster: Arc<wgpu::BindGroupLayout>,
    pub shadow: Arc<wgpu::BindGroupLayout>,
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    read_only: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl BindGroupLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            global: Arc::new(Self::create_global_layout(device)),
            material: Arc::new(Self::create_material_layout(device)),
            lighting: Arc::new(Self::create_lighting_layout(device)),
            cluster: Arc::new(Self::create_cluster_layout(device)),
            shadow: Arc::new(Self::create_shadow_layout(device)),
        }
    }

    /// Group 0: camera and frame globals, shared by all draw calls
    fn create_global_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let stages = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Global Bind Group Layout"),
            entries: &[uniform_entry(0, stages), uniform_entry(1, stages)],
        })
    }

    /// Group 1: material properties and textures, per draw call
    fn create_material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                // Binding 1: Base color texture
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Binding 2: Material sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    /// Group 2: everything the forward shader needs to light a pixel –
    /// the light array, the culling outputs it indexes by cluster, the
    /// screen-to-view constants, and the shadow maps.
    fn create_lighting_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let fs = wgpu::ShaderStages::FRAGMENT;
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lighting Bind Group Layout"),
            entries: &[
                // 0: GPU light array
                storage_entry(0, fs, true),
                // 1: light grid (offset, count) per cluster
                storage_entry(1, fs, true),
                // 2: compacted light index list
                storage_entry(2, fs, true),
                // 3: screen-to-view constants
                uniform_entry(3, wgpu::ShaderStages::VERTEX | fs),
                // 4: directional light (light-space matrix, direction, color)
                uniform_entry(4, fs),
                // 5: directional shadow map
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: fs,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // 6: comparison sampler shared by all shadow lookups
                wgpu::BindGroupLayoutEntry {
                    binding: 6,
                    visibility: fs,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
                // 7: point-light shadow cubes, one cube per shadowed light
                wgpu::BindGroupLayoutEntry {
                    binding: 7,
                    visibility: fs,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::CubeArray,
                        multisampled: false,
                    },
                    count: None,
                },
                // 8: per-light shadow params (far plane for depth linearization)
                storage_entry(8, fs, true),
            ],
        })
    }

    /// Compute group for the cluster-grid and light-cull passes
    fn create_cluster_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let cs = wgpu::ShaderStages::COMPUTE;
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Cluster Bind Group Layout"),
            entries: &[
                // 0: screen-to-view constants
                uniform_entry(0, cs),
                // 1: cluster AABB grid (written by grid pass, read by cull)
                storage_entry(1, cs, false),
                // 2: GPU light array
                storage_entry(2, cs, true),
                // 3: light index list
                storage_entry(3, cs, false),
                // 4: light grid
                storage_entry(4, cs, false),
                // 5: global index counter (atomic bump allocator)
                storage_entry(5, cs, false),
                // 6: per-cull uniforms (view matrix, light count)
                uniform_entry(6, cs),
            ],
        })
    }

    /// Shadow group: the active light's face matrix and depth parameters
    fn create_shadow_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Bind Group Layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        })
    }
}
