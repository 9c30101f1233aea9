//! Forward shading pass - lights every pixel from its cluster's light list
//!
//! Consumes the culling outputs (light grid + index list) and the shadow
//! feed; must therefore run after both, which the graph guarantees from the
//! declared reads.

use crate::graph::{PassContext, PassResourceBuilder, RenderPass, ResourceHandle};
use crate::mesh::DrawCall;
use crate::Result;
use std::sync::{Arc, Mutex};

pub struct ForwardPass {
    pipeline: Arc<wgpu::RenderPipeline>,
    draw_list: Arc<Mutex<Vec<DrawCall>>>,
}

impl ForwardPass {
    pub fn new(pipeline: Arc<wgpu::RenderPipeline>, draw_list: Arc<Mutex<Vec<DrawCall>>>) -> Self {
        Self {
            pipeline,
            draw_list,
        }
    }
}

impl RenderPass for ForwardPass {
    fn name(&self) -> &str {
        "forward"
    }

    fn declare_resources(&self, builder: &mut PassResourceBuilder) {
        builder.read(ResourceHandle::named("light_grid"));
        builder.read(ResourceHandle::named("shadow_maps"));
        builder.read(ResourceHandle::named("depth"));
        builder.write(ResourceHandle::named("color"));
    }

    fn execute(&mut self, ctx: &mut PassContext) -> Result<()> {
        let draw_calls: Vec<DrawCall> = self.draw_list.lock().unwrap().clone();
        let target = ctx.target;
        let depth_view = ctx.depth_view;
        let global_bg = ctx.global_bind_group;
        let lighting_bg = ctx.lighting_bind_group;

        let [r, g, b] = ctx.sky_color.map(|c| c as f64);
        let mut pass = ctx.begin_render_pass(
            "Forward Pass",
            &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
        );

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, global_bg, &[]);
        pass.set_bind_group(2, lighting_bg, &[]);

        for dc in &draw_calls {
            pass.set_bind_group(1, &dc.material_bind_group, &[]);
            pass.set_vertex_buffer(0, dc.vertex_buffer.slice(..));
            pass.set_index_buffer(dc.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..dc.index_count, 0, 0..1);
        }

        Ok(())
    }
}
