//! Shadow feed pass - renders every light's depth map
//!
//! One depth-only sub-pass for the directional light, then six per point
//! light (one per cube face). All opaque geometry is drawn into each
//! target; passes for different lights are independent of one another, so
//! their relative order is irrelevant.

use crate::graph::{PassContext, PassResourceBuilder, RenderPass, ResourceHandle};
use crate::mesh::DrawCall;
use crate::shadow::ShadowFeed;
use crate::Result;
use std::sync::{Arc, Mutex};

pub struct ShadowPass {
    dir_pipeline: Arc<wgpu::RenderPipeline>,
    point_pipeline: Arc<wgpu::RenderPipeline>,
    feed: Arc<Mutex<ShadowFeed>>,
    draw_list: Arc<Mutex<Vec<DrawCall>>>,
}

impl ShadowPass {
    pub fn new(
        dir_pipeline: Arc<wgpu::RenderPipeline>,
        point_pipeline: Arc<wgpu::RenderPipeline>,
        feed: Arc<Mutex<ShadowFeed>>,
        draw_list: Arc<Mutex<Vec<DrawCall>>>,
    ) -> Self {
        Self {
            dir_pipeline,
            point_pipeline,
            feed,
            draw_list,
        }
    }

    fn draw_depth_only(
        ctx: &mut PassContext,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        target: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
        draw_calls: &[DrawCall],
    ) {
        let mut pass = ctx.begin_render_pass(
            label,
            &[],
            Some(wgpu::RenderPassDepthStencilAttachment {
                view: target,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
        );

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        for dc in draw_calls {
            pass.set_vertex_buffer(0, dc.vertex_buffer.slice(..));
            pass.set_index_buffer(dc.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..dc.index_count, 0, 0..1);
        }
    }
}

impl RenderPass for ShadowPass {
    fn name(&self) -> &str {
        "shadow"
    }

    fn declare_resources(&self, builder: &mut PassResourceBuilder) {
        builder.write(ResourceHandle::named("shadow_maps"));
    }

    fn execute(&mut self, ctx: &mut PassContext) -> Result<()> {
        let draw_calls: Vec<DrawCall> = self.draw_list.lock().unwrap().clone();
        let feed = self.feed.lock().unwrap();

        Self::draw_depth_only(
            ctx,
            "Directional Shadow Pass",
            &self.dir_pipeline,
            &feed.directional.view,
            &feed.directional.bind_group,
            &draw_calls,
        );

        for (index, face) in feed.point_faces.iter().enumerate() {
            Self::draw_depth_only(
                ctx,
                &format!("Point Shadow Pass L{} F{}", index / 6, index % 6),
                &self.point_pipeline,
                &face.view,
                &face.bind_group,
                &draw_calls,
            );
        }

        Ok(())
    }
}
