//! Light culling pass - assigns lights to clusters on the GPU
//!
//! Runs every frame after the view matrix is final. The global index
//! counter is zeroed with `clear_buffer` inside the same encoder, so the
//! reset, the dispatch, and the forward pass that consumes the results are
//! strictly ordered on the GPU timeline; wgpu's usage tracking provides the
//! compute-to-fragment visibility barrier.
//!
//! One invocation per cluster: workgroup size (16, 9, 1) over a
//! (1, 1, 24) dispatch covers the 16x9x24 grid, one workgroup per depth
//! slice. The reference semantics are `lucerna_lighting::cull_lights`.

use crate::graph::{PassContext, PassResourceBuilder, RenderPass, ResourceHandle};
use crate::Result;
use lucerna_lighting::GRID_SIZE;
use std::sync::Arc;

pub struct LightCullPass {
    pipeline: Arc<wgpu::ComputePipeline>,
    counter_buffer: Arc<wgpu::Buffer>,
}

impl LightCullPass {
    pub fn new(pipeline: Arc<wgpu::ComputePipeline>, counter_buffer: Arc<wgpu::Buffer>) -> Self {
        Self {
            pipeline,
            counter_buffer,
        }
    }
}

impl RenderPass for LightCullPass {
    fn name(&self) -> &str {
        "light_cull"
    }

    fn declare_resources(&self, builder: &mut PassResourceBuilder) {
        builder.read(ResourceHandle::named("cluster_aabbs"));
        builder.write(ResourceHandle::named("light_grid"));
    }

    fn execute(&mut self, ctx: &mut PassContext) -> Result<()> {
        ctx.encoder.clear_buffer(&self.counter_buffer, 0, None);

        let cluster_bg = ctx.cluster_bind_group;
        let mut pass = ctx.begin_compute_pass("Light Cull Pass");
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, cluster_bg, &[]);
        pass.dispatch_workgroups(1, 1, GRID_SIZE.z);
        Ok(())
    }
}
