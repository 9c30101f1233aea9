//! Pipeline cache.
//!
//! Pipelines are created lazily, keyed on (shader id, variant), with
//! shader defines prepended to the WGSL source as `override` declarations
//! so tuning constants live in one place on the host.

use crate::mesh::vertex_buffer_layout;
use crate::resources::BindGroupLayouts;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Shader tuning constant value
#[derive(Clone, Debug)]
pub enum ShaderDefine {
    Bool(bool),
    U32(u32),
    F32(f32),
}

/// Raster pipeline variants. Each fixes the pipeline layout, entry points,
/// and depth/blend state for one stage of the frame.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub enum PipelineVariant {
    /// Forward shading: full bind groups, LessEqual against the pre-pass
    /// depth, no depth writes.
    Forward,
    /// Depth pre-pass: position-only, no fragment stage.
    DepthPrepass,
    /// Directional shadow: depth-only into the light's map, culling off.
    ShadowDirectional,
    /// Point shadow face: fragment stage writes linear distance/far.
    ShadowPoint,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct PipelineKey {
    shader_id: String,
    variant: PipelineVariant,
}

/// Pipeline cache for render and compute pipelines
pub struct PipelineCache {
    device: Arc<wgpu::Device>,
    render_cache: HashMap<PipelineKey, Arc<wgpu::RenderPipeline>>,
    compute_cache: HashMap<String, Arc<wgpu::ComputePipeline>>,
    layouts: Arc<BindGroupLayouts>,
    surface_format: wgpu::TextureFormat,
}

impl PipelineCache {
    pub fn new(
        device: Arc<wgpu::Device>,
        layouts: Arc<BindGroupLayouts>,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            render_cache: HashMap::new(),
            compute_cache: HashMap::new(),
            layouts,
            surface_format,
        }
    }

    /// Get or create a render pipeline variant
    pub fn get_or_create(
        &mut self,
        shader_source: &str,
        shader_id: &str,
        defines: &HashMap<String, ShaderDefine>,
        variant: PipelineVariant,
    ) -> Result<Arc<wgpu::RenderPipeline>> {
        let key = PipelineKey {
            shader_id: shader_id.to_string(),
            variant,
        };
        if let Some(pipeline) = self.render_cache.get(&key) {
            log::trace!("Using cached pipeline: {:?}", key);
            return Ok(pipeline.clone());
        }

        log::info!("Creating pipeline variant: {:?}", key);
        let module = self.create_module(shader_source, shader_id, defines);

        let pipeline = match variant {
            PipelineVariant::Forward => self.create_forward_pipeline(shader_id, &module),
            PipelineVariant::DepthPrepass => self.create_depth_prepass_pipeline(shader_id, &module),
            PipelineVariant::ShadowDirectional => {
                self.create_shadow_pipeline(shader_id, &module, None)
            }
            PipelineVariant::ShadowPoint => {
                self.create_shadow_pipeline(shader_id, &module, Some("fs_point"))
            }
        };

        let pipeline = Arc::new(pipeline);
        self.render_cache.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    /// Get or create a compute pipeline over the cluster bind group
    pub fn get_or_create_compute(
        &mut self,
        shader_source: &str,
        shader_id: &str,
    ) -> Result<Arc<wgpu::ComputePipeline>> {
        if let Some(pipeline) = self.compute_cache.get(shader_id) {
            return Ok(pipeline.clone());
        }

        log::info!("Creating compute pipeline: {}", shader_id);
        let module = self.create_module(shader_source, shader_id, &HashMap::new());
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{}_layout", shader_id)),
                bind_group_layouts: &[&self.layouts.cluster],
                push_constant_ranges: &[],
            });

        let pipeline = Arc::new(self.device.create_compute_pipeline(
            &wgpu::ComputePipelineDescriptor {
                label: Some(shader_id),
                layout: Some(&layout),
                module: &module,
                entry_point: "main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            },
        ));
        self.compute_cache.insert(shader_id.to_string(), pipeline.clone());
        Ok(pipeline)
    }

    fn create_module(
        &self,
        source: &str,
        shader_id: &str,
        defines: &HashMap<String, ShaderDefine>,
    ) -> wgpu::ShaderModule {
        let processed = apply_defines(source, defines);
        self.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(shader_id),
                source: wgpu::ShaderSource::Wgsl(processed.into()),
            })
    }

    fn create_forward_pipeline(
        &self,
        shader_id: &str,
        module: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{}_layout", shader_id)),
                bind_group_layouts: &[
                    &self.layouts.global,
                    &self.layouts.material,
                    &self.layouts.lighting,
                ],
                push_constant_ranges: &[],
            });

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Forward Pipeline"),
                layout: Some(&layout),
                cache: None,
                vertex: wgpu::VertexState {
                    module,
                    entry_point: "vs_main",
                    buffers: &[vertex_buffer_layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                // The depth pre-pass already wrote final depth; shading
                // re-rasterizes against it without writing.
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: wgpu::TextureFormat::Depth32Float,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
            })
    }

    fn create_depth_prepass_pipeline(
        &self,
        shader_id: &str,
        module: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{}_layout", shader_id)),
                bind_group_layouts: &[&self.layouts.global],
                push_constant_ranges: &[],
            });

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Depth Prepass Pipeline"),
                layout: Some(&layout),
                cache: None,
                vertex: wgpu::VertexState {
                    module,
                    entry_point: "vs_main",
                    buffers: &[vertex_buffer_layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: None,
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: wgpu::TextureFormat::Depth32Float,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
            })
    }

    /// Shadow pipelines render depth from the light's point of view with
    /// face culling disabled so thin geometry shadows from both sides.
    fn create_shadow_pipeline(
        &self,
        shader_id: &str,
        module: &wgpu::ShaderModule,
        fragment_entry: Option<&str>,
    ) -> wgpu::RenderPipeline {
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{}_layout", shader_id)),
                bind_group_layouts: &[&self.layouts.shadow],
                push_constant_ranges: &[],
            });

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Shadow Pipeline"),
                layout: Some(&layout),
                cache: None,
                vertex: wgpu::VertexState {
                    module,
                    entry_point: "vs_main",
                    buffers: &[vertex_buffer_layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: fragment_entry.map(|entry_point| wgpu::FragmentState {
                    module,
                    entry_point,
                    targets: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: wgpu::TextureFormat::Depth32Float,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
            })
    }
}

/// Prepend shader defines to WGSL source as `override` declarations
fn apply_defines(source: &str, defines: &HashMap<String, ShaderDefine>) -> String {
    let mut result = String::new();
    for (name, value) in defines {
        match value {
            ShaderDefine::Bool(b) => {
                result.push_str(&format!("override {}: bool = {};\n", name, b));
            }
            ShaderDefine::U32(u) => {
                result.push_str(&format!("override {}: u32 = {}u;\n", name, u));
            }
            ShaderDefine::F32(f) => {
                result.push_str(&format!("override {}: f32 = {:?};\n", name, f));
            }
        }
    }
    result.push_str(source);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines_prepend_override_declarations() {
        let mut defines = HashMap::new();
        defines.insert("DIR_SHADOW_BIAS".to_string(), ShaderDefine::F32(0.0005));
        let out = apply_defines("fn main() {}", &defines);
        assert!(out.starts_with("override DIR_SHADOW_BIAS: f32 = 0.0005;\n"));
        assert!(out.ends_with("fn main() {}"));
    }
}
