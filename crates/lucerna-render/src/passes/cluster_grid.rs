//! Cluster grid pass - rebuilds the view-space cluster AABBs
//!
//! Dispatches one thread per cluster, but only on frames where the
//! projection changed (the grid is camera-pose-invariant). The shared
//! dirty flag is set by `ClusterResources::update_projection`.

use crate::graph::{PassContext, PassResourceBuilder, RenderPass, ResourceHandle};
use crate::Result;
use lucerna_lighting::GRID_SIZE;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct ClusterGridPass {
    pipeline: Arc<wgpu::ComputePipeline>,
    dirty: Arc<AtomicBool>,
}

impl ClusterGridPass {
    pub fn new(pipeline: Arc<wgpu::ComputePipeline>, dirty: Arc<AtomicBool>) -> Self {
        Self { pipeline, dirty }
    }
}

impl RenderPass for ClusterGridPass {
    fn name(&self) -> &str {
        "cluster_grid"
    }

    fn declare_resources(&self, builder: &mut PassResourceBuilder) {
        builder.write(ResourceHandle::named("cluster_aabbs"));
    }

    fn execute(&mut self, ctx: &mut PassContext) -> Result<()> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        log::debug!("Rebuilding cluster AABB grid");
        let cluster_bg = ctx.cluster_bind_group;
        let mut pass = ctx.begin_compute_pass("Cluster Grid Pass");
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, cluster_bg, &[]);
        pass.dispatch_workgroups(GRID_SIZE.x, GRID_SIZE.y, GRID_SIZE.z);
        Ok(())
    }
}
