//! Depth pre-pass - lays down final depth before shading

use crate::graph::{PassContext, PassResourceBuilder, RenderPass, ResourceHandle};
use crate::mesh::DrawCall;
use crate::Result;
use std::sync::{Arc, Mutex};

pub struct DepthPrepass {
    pipeline: Arc<wgpu::RenderPipeline>,
    draw_list: Arc<Mutex<Vec<DrawCall>>>,
}

impl DepthPrepass {
    pub fn new(pipeline: Arc<wgpu::RenderPipeline>, draw_list: Arc<Mutex<Vec<DrawCall>>>) -> Self {
        Self {
            pipeline,
            draw_list,
        }
    }
}

impl RenderPass for DepthPrepass {
    fn name(&self) -> &str {
        "depth_prepass"
    }

    fn declare_resources(&self, builder: &mut PassResourceBuilder) {
        builder.write(ResourceHandle::named("depth"));
    }

    fn execute(&mut self, ctx: &mut PassContext) -> Result<()> {
        let draw_calls: Vec<DrawCall> = self.draw_list.lock().unwrap().clone();
        let depth_view = ctx.depth_view;
        let global_bg = ctx.global_bind_group;

        let mut pass = ctx.begin_render_pass(
            "Depth Prepass",
            &[],
            Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
        );

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, global_bg, &[]);
        for dc in &draw_calls {
            pass.set_vertex_buffer(0, dc.vertex_buffer.slice(..));
            pass.set_index_buffer(dc.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..dc.index_count, 0, 0..1);
        }

        Ok(())
    }
}
