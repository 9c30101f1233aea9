//! Render pass trait and execution context

use super::PassResourceBuilder;
use crate::Result;

/// Render pass trait - implemented by all rendering passes
pub trait RenderPass: Send + Sync {
    /// Unique name for this pass
    fn name(&self) -> &str;

    /// Declare resource dependencies
    ///
    /// Called once during graph building to determine pass ordering.
    /// Passes should declare which resources they read or write.
    fn declare_resources(&self, _builder: &mut PassResourceBuilder) {
        // Default: no resource dependencies
    }

    /// Execute the pass
    ///
    /// Called every frame during graph execution.
    fn execute(&mut self, ctx: &mut PassContext) -> Result<()>;
}

/// Context for pass execution
pub struct PassContext<'a> {
    /// Command encoder for recording GPU commands
    pub encoder: &'a mut wgpu::CommandEncoder,

    /// Main render target
    pub target: &'a wgpu::TextureView,

    /// Main depth buffer (Depth32Float)
    pub depth_view: &'a wgpu::TextureView,

    /// Bind group 0 – camera + globals (shared by all raster passes)
    pub global_bind_group: &'a wgpu::BindGroup,

    /// Bind group 2 – lights, cluster outputs, shadow maps
    pub lighting_bind_group: &'a wgpu::BindGroup,

    /// Compute bind group – cluster AABBs and culling buffers
    pub cluster_bind_group: &'a wgpu::BindGroup,

    /// Sky / background clear color (linear RGB)
    pub sky_color: [f32; 3],
}

impl<'a> PassContext<'a> {
    /// Begin a render pass
    pub fn begin_render_pass(
        &mut self,
        label: &str,
        color_attachments: &[Option<wgpu::RenderPassColorAttachment>],
        depth_stencil_attachment: Option<wgpu::RenderPassDepthStencilAttachment>,
    ) -> wgpu::RenderPass {
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    /// Begin a compute pass
    pub fn begin_compute_pass(&mut self, label: &str) -> wgpu::ComputePass {
        self.encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(label),
            timestamp_writes: None,
        })
    }
}
