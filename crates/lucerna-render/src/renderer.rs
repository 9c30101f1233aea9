//! Main renderer implementation
//!
//! Owns every GPU resource the clustered pipeline needs and threads the
//! per-frame context through the render graph explicitly; there is no
//! ambient/global renderer state.
//!
//! Frame order: light refresh, shadow matrix refresh, then the graph runs
//! shadow -> light cull -> depth pre-pass -> forward, with the cluster grid
//! rebuild folded in on projection changes.

use crate::cluster::ClusterResources;
use crate::graph::{GraphContext, RenderGraph};
use crate::mesh::{DrawCall, GpuMesh};
use crate::passes::{ClusterGridPass, DepthPrepass, ForwardPass, LightCullPass, ShadowPass};
use crate::pipeline::{PipelineCache, PipelineVariant, ShaderDefine};
use crate::resources::BindGroupLayouts;
use crate::scene::Scene;
use crate::shadow::ShadowFeed;
use crate::{Error, Result};
use bytemuck::{Pod, Zeroable};
use lucerna_core::{Camera, MAX_LIGHTS};
use lucerna_lighting::pack_lights;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wgpu::util::DeviceExt;

const DIR_SHADOW_BIAS: f32 = 0.0005;
const POINT_SHADOW_BIAS: f32 = 0.005;

/// Main renderer configuration
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    pub surface_format: wgpu::TextureFormat,
}

/// Camera uniform data (group 0, binding 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    position: [f32; 4],
}

/// Globals uniform data (group 0, binding 1)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct GlobalsUniform {
    frame: u32,
    delta_time: f32,
    light_count: u32,
    debug_slices: u32,
    ambient_color: [f32; 4], // intensity in w
}

/// Directional light uniform (lighting group, binding 4)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct DirLightUniform {
    light_space: [[f32; 4]; 4],
    direction: [f32; 4],
    /// Strength premultiplied into rgb.
    color: [f32; 4],
}

/// Material uniform – must match the WGSL Material struct (32 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct MaterialUniform {
    base_color: [f32; 4],
    metallic: f32,
    roughness: f32,
    emissive: f32,
    ao: f32,
}

/// Create a Depth32Float texture + view at the given resolution
fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
    (tex, view)
}

fn create_lighting_bind_group(
    device: &wgpu::Device,
    layouts: &BindGroupLayouts,
    cluster: &ClusterResources,
    dir_light_buffer: &wgpu::Buffer,
    point_shadow_params_buffer: &wgpu::Buffer,
    feed: &ShadowFeed,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Lighting Bind Group"),
        layout: &layouts.lighting,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: cluster.light_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: cluster.light_grid_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: cluster.light_index_list_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: cluster.screen_to_view_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: dir_light_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::TextureView(&feed.directional.view),
            },
            wgpu::BindGroupEntry {
                binding: 6,
                resource: wgpu::BindingResource::Sampler(&feed.comparison_sampler),
            },
            wgpu::BindGroupEntry {
                binding: 7,
                resource: wgpu::BindingResource::TextureView(&feed.cube_array_view),
            },
            wgpu::BindGroupEntry {
                binding: 8,
                resource: point_shadow_params_buffer.as_entire_binding(),
            },
        ],
    })
}

/// Main renderer
pub struct Renderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,

    layouts: Arc<BindGroupLayouts>,
    graph: RenderGraph,
    cluster: ClusterResources,
    shadow_feed: Arc<Mutex<ShadowFeed>>,

    // Uniform buffers
    camera_buffer: wgpu::Buffer,
    globals_buffer: wgpu::Buffer,
    dir_light_buffer: wgpu::Buffer,
    point_shadow_params_buffer: wgpu::Buffer,

    // Bind groups
    global_bind_group: wgpu::BindGroup,
    lighting_bind_group: wgpu::BindGroup,
    default_material_bind_group: Arc<wgpu::BindGroup>,

    // Draw list (shared with the raster passes)
    draw_list: Arc<Mutex<Vec<DrawCall>>>,

    // Depth buffer (Depth32Float, recreated on resize)
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,

    // Frame state
    frame_count: u64,
    debug_slices: bool,
    width: u32,
    height: u32,
}

impl Renderer {
    /// Create a new renderer
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        config: RendererConfig,
    ) -> Result<Self> {
        log::info!("Creating Lucerna renderer");
        log::info!("  Surface format: {:?}", config.surface_format);
        log::info!("  Resolution: {}x{}", config.width, config.height);

        let layouts = Arc::new(BindGroupLayouts::new(&device));
        let mut pipelines =
            PipelineCache::new(device.clone(), layouts.clone(), config.surface_format);

        // ── Uniform buffers ──────────────────────────────────────────────────
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniform Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Uniform Buffer"),
            size: std::mem::size_of::<GlobalsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let dir_light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Directional Light Uniform"),
            size: std::mem::size_of::<DirLightUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let point_shadow_params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Point Shadow Params"),
            size: (MAX_LIGHTS * 16) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &layouts.global,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: globals_buffer.as_entire_binding(),
                },
            ],
        });

        // ── Cluster + shadow resources ───────────────────────────────────────
        let cluster = ClusterResources::new(&device, &layouts, config.width, config.height);
        let shadow_feed = ShadowFeed::for_scene(&device, &layouts, &Scene::new());
        let lighting_bind_group = create_lighting_bind_group(
            &device,
            &layouts,
            &cluster,
            &dir_light_buffer,
            &point_shadow_params_buffer,
            &shadow_feed,
        );
        let shadow_feed = Arc::new(Mutex::new(shadow_feed));

        // ── Default material (1x1 white texture) ─────────────────────────────
        let white_tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Default White Texture"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &white_tex,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[255u8, 255, 255, 255],
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let white_view = white_tex.create_view(&Default::default());

        let default_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Default Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let mat_uniform = MaterialUniform {
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.6,
            emissive: 0.0,
            ao: 1.0,
        };
        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Default Material Uniform"),
            contents: bytemuck::bytes_of(&mat_uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let default_material_bind_group =
            Arc::new(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Default Material Bind Group"),
                layout: &layouts.material,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: material_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&white_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&default_sampler),
                    },
                ],
            }));

        // ── Pipelines ────────────────────────────────────────────────────────
        let cluster_grid_pipeline = pipelines.get_or_create_compute(
            include_str!("../shaders/cluster_grid.wgsl"),
            "cluster_grid",
        )?;
        let light_cull_pipeline =
            pipelines.get_or_create_compute(include_str!("../shaders/light_cull.wgsl"), "light_cull")?;

        let no_defines = HashMap::new();
        let depth_prepass_pipeline = pipelines.get_or_create(
            include_str!("../shaders/depth_prepass.wgsl"),
            "depth_prepass",
            &no_defines,
            PipelineVariant::DepthPrepass,
        )?;
        let dir_shadow_pipeline = pipelines.get_or_create(
            include_str!("../shaders/shadow.wgsl"),
            "shadow",
            &no_defines,
            PipelineVariant::ShadowDirectional,
        )?;
        let point_shadow_pipeline = pipelines.get_or_create(
            include_str!("../shaders/shadow.wgsl"),
            "shadow",
            &no_defines,
            PipelineVariant::ShadowPoint,
        )?;

        let mut forward_defines = HashMap::new();
        forward_defines.insert(
            "DIR_SHADOW_BIAS".to_string(),
            ShaderDefine::F32(DIR_SHADOW_BIAS),
        );
        forward_defines.insert(
            "POINT_SHADOW_BIAS".to_string(),
            ShaderDefine::F32(POINT_SHADOW_BIAS),
        );
        let forward_pipeline = pipelines.get_or_create(
            include_str!("../shaders/forward.wgsl"),
            "forward",
            &forward_defines,
            PipelineVariant::Forward,
        )?;

        // ── Render graph, in frame order ─────────────────────────────────────
        let draw_list: Arc<Mutex<Vec<DrawCall>>> = Arc::new(Mutex::new(Vec::new()));

        let mut graph = RenderGraph::new();
        graph.add_pass(ClusterGridPass::new(
            cluster_grid_pipeline,
            cluster.grid_dirty.clone(),
        ));
        graph.add_pass(ShadowPass::new(
            dir_shadow_pipeline,
            point_shadow_pipeline,
            shadow_feed.clone(),
            draw_list.clone(),
        ));
        graph.add_pass(LightCullPass::new(
            light_cull_pipeline,
            cluster.counter_buffer.clone(),
        ));
        graph.add_pass(DepthPrepass::new(depth_prepass_pipeline, draw_list.clone()));
        graph.add_pass(ForwardPass::new(forward_pipeline, draw_list.clone()));
        graph.build()?;

        let (depth_texture, depth_view) = create_depth_texture(&device, config.width, config.height);

        log::info!("Lucerna renderer initialized successfully");

        Ok(Self {
            device,
            queue,
            layouts,
            graph,
            cluster,
            shadow_feed,
            camera_buffer,
            globals_buffer,
            dir_light_buffer,
            point_shadow_params_buffer,
            global_bind_group,
            lighting_bind_group,
            default_material_bind_group,
            draw_list,
            depth_texture,
            depth_view,
            frame_count: 0,
            debug_slices: false,
            width: config.width,
            height: config.height,
        })
    }

    // ── Draw submission ───────────────────────────────────────────────────────

    /// Queue a mesh to be drawn this frame using the default white material
    pub fn draw_mesh(&self, mesh: &GpuMesh) {
        self.draw_list
            .lock()
            .unwrap()
            .push(DrawCall::new(mesh, self.default_material_bind_group.clone()));
    }

    /// Queue a mesh with a custom material bind group
    pub fn draw_mesh_with_material(&self, mesh: &GpuMesh, material: Arc<wgpu::BindGroup>) {
        self.draw_list.lock().unwrap().push(DrawCall::new(mesh, material));
    }

    /// Tint output by depth slice, for inspecting the cluster partition
    pub fn set_debug_slices(&mut self, enabled: bool) {
        self.debug_slices = enabled;
    }

    // ── Frame rendering ───────────────────────────────────────────────────────

    /// Render the full scene. Everything in the scene is drawn; nothing else.
    pub fn render_scene(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        target: &wgpu::TextureView,
        delta_time: f32,
    ) -> Result<()> {
        log::trace!("Rendering frame {}", self.frame_count);

        if scene.point_lights.len() > MAX_LIGHTS {
            return Err(Error::Config(lucerna_core::Error::InvalidConfiguration(
                format!(
                    "scene has {} point lights, capacity is {}",
                    scene.point_lights.len(),
                    MAX_LIGHTS
                ),
            )));
        }

        // Reallocate shadow targets when the scene's lights changed shape.
        {
            let mut feed = self.shadow_feed.lock().unwrap();
            if !feed.matches(scene) {
                *feed = ShadowFeed::for_scene(&self.device, &self.layouts, scene);
                self.lighting_bind_group = create_lighting_bind_group(
                    &self.device,
                    &self.layouts,
                    &self.cluster,
                    &self.dir_light_buffer,
                    &self.point_shadow_params_buffer,
                    &feed,
                );
            }
            feed.write_matrices(&self.queue, scene);
        }

        // Rebuild cluster state if the projection changed.
        self.cluster.update_projection(&self.queue, camera);

        // ── Per-frame uniforms ───────────────────────────────────────────────
        let view = camera.view_matrix();
        let camera_uniform = CameraUniform {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            position: [camera.position.x, camera.position.y, camera.position.z, 1.0],
        };
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera_uniform));

        let globals = GlobalsUniform {
            frame: self.frame_count as u32,
            delta_time,
            light_count: scene.point_lights.len() as u32,
            debug_slices: self.debug_slices as u32,
            ambient_color: [
                scene.ambient_color[0],
                scene.ambient_color[1],
                scene.ambient_color[2],
                scene.ambient_intensity,
            ],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        // Light store refresh + culling inputs
        let gpu_lights = pack_lights(&scene.point_lights);
        self.cluster.write_frame(&self.queue, view, &gpu_lights);

        // Directional light constants
        let dir = &scene.directional_light;
        let dir_uniform = DirLightUniform {
            light_space: dir.light_space_matrix().to_cols_array_2d(),
            direction: [dir.direction.x, dir.direction.y, dir.direction.z, 0.0],
            color: [
                dir.common.color.x * dir.common.strength,
                dir.common.color.y * dir.common.strength,
                dir.common.color.z * dir.common.strength,
                1.0,
            ],
        };
        self.queue
            .write_buffer(&self.dir_light_buffer, 0, bytemuck::bytes_of(&dir_uniform));

        // Per-light shadow params: zFar for cube depth linearization
        if !scene.point_lights.is_empty() {
            let params: Vec<[f32; 4]> = scene
                .point_lights
                .iter()
                .map(|l| [l.common.z_far, 1.0, 0.0, 0.0])
                .collect();
            self.queue.write_buffer(
                &self.point_shadow_params_buffer,
                0,
                bytemuck::cast_slice(&params),
            );
        }

        // Queue draw calls for all objects
        for obj in &scene.objects {
            self.draw_mesh(&obj.mesh);
        }

        // ── Execute render graph ─────────────────────────────────────────────
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let mut graph_ctx = GraphContext {
            encoder: &mut encoder,
            target,
            depth_view: &self.depth_view,
            frame: self.frame_count,
            global_bind_group: &self.global_bind_group,
            lighting_bind_group: &self.lighting_bind_group,
            cluster_bind_group: &self.cluster.bind_group,
            sky_color: scene.sky_color,
        };
        self.graph.execute(&mut graph_ctx)?;

        self.queue.submit(Some(encoder.finish()));
        self.draw_list.lock().unwrap().clear();

        self.frame_count += 1;
        Ok(())
    }

    // ── Utilities ─────────────────────────────────────────────────────────────

    pub fn resize(&mut self, width: u32, height: u32) {
        log::info!("Resizing renderer to {}x{}", width, height);
        self.width = width;
        self.height = height;
        let (tex, view) = create_depth_texture(&self.device, width, height);
        self.depth_texture = tex;
        self.depth_view = view;
        self.cluster.resize(width, height);
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn uniform_layouts_match_shader_structs() {
        assert_eq!(size_of::<CameraUniform>(), 144);
        assert_eq!(offset_of!(CameraUniform, view), 64);
        assert_eq!(offset_of!(CameraUniform, position), 128);

        assert_eq!(size_of::<GlobalsUniform>(), 32);
        assert_eq!(offset_of!(GlobalsUniform, ambient_color), 16);

        assert_eq!(size_of::<DirLightUniform>(), 96);
        assert_eq!(offset_of!(DirLightUniform, direction), 64);
        assert_eq!(offset_of!(DirLightUniform, color), 80);

        assert_eq!(size_of::<MaterialUniform>(), 32);
    }
}
