//! Render graph with automatic dependency resolution.
//!
//! Passes declare which logical resources they read and write; the graph
//! topologically sorts them so every producer runs before its consumers.
//! wgpu's usage tracking turns the resulting command-stream order into the
//! memory barriers the pipeline requires (compute outputs visible to the
//! draws that read them).

mod pass;
mod resource;

pub use pass::{PassContext, RenderPass};
pub use resource::{PassId, ResourceHandle};

use crate::{Error, Result};
use std::collections::{HashMap, VecDeque};

/// Render graph for automatic pass ordering
pub struct RenderGraph {
    passes: Vec<PassNode>,
    execution_order: Vec<usize>,
}

struct PassNode {
    pass: Box<dyn RenderPass>,
    reads: Vec<ResourceHandle>,
    writes: Vec<ResourceHandle>,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            execution_order: Vec::new(),
        }
    }

    /// Add a pass to the graph
    pub fn add_pass(&mut self, pass: impl RenderPass + 'static) -> PassId {
        let id = PassId(self.passes.len());

        let mut builder = PassResourceBuilder::new();
        pass.declare_resources(&mut builder);

        self.passes.push(PassNode {
            pass: Box::new(pass),
            reads: builder.reads,
            writes: builder.writes,
        });
        id
    }

    /// Build the graph - resolve dependencies and determine execution order
    pub fn build(&mut self) -> Result<()> {
        log::info!("Building render graph with {} passes", self.passes.len());

        // Collect all resource writers before building edges so ordering is
        // independent of pass registration order.
        let mut resource_writers: HashMap<ResourceHandle, usize> = HashMap::new();
        for (i, pass) in self.passes.iter().enumerate() {
            for &resource in &pass.writes {
                resource_writers.insert(resource, i);
            }
        }

        let mut in_degree = vec![0; self.passes.len()];
        let mut adj_list: Vec<Vec<usize>> = vec![Vec::new(); self.passes.len()];

        for (i, pass) in self.passes.iter().enumerate() {
            for &resource in &pass.reads {
                if let Some(&writer_idx) = resource_writers.get(&resource) {
                    adj_list[writer_idx].push(i);
                    in_degree[i] += 1;
                }
            }
        }

        // Topological sort (Kahn's algorithm — FIFO to preserve insertion order)
        let mut queue: VecDeque<usize> = (0..self.passes.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();

        let mut order = Vec::new();

        while let Some(node) = queue.pop_front() {
            order.push(node);

            for &neighbor in &adj_list[node] {
                in_degree[neighbor] -= 1;
                if in_degree[neighbor] == 0 {
                    queue.push_back(neighbor);
                }
            }
        }

        if order.len() != self.passes.len() {
            return Err(Error::Graph(
                "Cyclic dependency detected in render graph".to_string(),
            ));
        }

        self.execution_order = order;

        for (i, &pass_idx) in self.execution_order.iter().enumerate() {
            log::debug!("  Pass {}: {}", i, self.passes[pass_idx].pass.name());
        }

        log::info!("Render graph built successfully");
        Ok(())
    }

    /// Execute all passes in dependency order
    pub fn execute(&mut self, ctx: &mut GraphContext) -> Result<()> {
        log::trace!("Executing render graph (frame {})", ctx.frame);

        let execution_order = self.execution_order.clone();
        for &pass_idx in &execution_order {
            log::trace!("  Executing pass: {}", self.passes[pass_idx].pass.name());

            let mut pass_ctx = PassContext {
                encoder: &mut *ctx.encoder,
                target: ctx.target,
                depth_view: ctx.depth_view,
                global_bind_group: ctx.global_bind_group,
                lighting_bind_group: ctx.lighting_bind_group,
                cluster_bind_group: ctx.cluster_bind_group,
                sky_color: ctx.sky_color,
            };

            self.passes[pass_idx].pass.execute(&mut pass_ctx)?;
        }

        Ok(())
    }

    /// Execution order as pass names, for inspection and tests.
    pub fn pass_order(&self) -> Vec<&str> {
        self.execution_order
            .iter()
            .map(|&i| self.passes[i].pass.name())
            .collect()
    }
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Context for graph execution
pub struct GraphContext<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub target: &'a wgpu::TextureView,
    /// Main depth buffer (Depth32Float)
    pub depth_view: &'a wgpu::TextureView,
    pub frame: u64,
    /// Bind group 0 – camera + globals
    pub global_bind_group: &'a wgpu::BindGroup,
    /// Bind group 2 – lights, cluster outputs, shadow maps
    pub lighting_bind_group: &'a wgpu::BindGroup,
    /// Compute bind group – cluster AABBs, culling buffers
    pub cluster_bind_group: &'a wgpu::BindGroup,
    /// Sky / background clear color (linear RGB)
    pub sky_color: [f32; 3],
}

/// Builder for declaring pass resource dependencies
pub struct PassResourceBuilder {
    reads: Vec<ResourceHandle>,
    writes: Vec<ResourceHandle>,
}

impl PassResourceBuilder {
    fn new() -> Self {
        Self {
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Declare that this pass reads a resource
    pub fn read(&mut self, resource: ResourceHandle) -> &mut Self {
        self.reads.push(resource);
        self
    }

    /// Declare that this pass writes to a resource
    pub fn write(&mut self, resource: ResourceHandle) -> &mut Self {
        self.writes.push(resource);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedPass {
        name: &'static str,
        reads: Vec<ResourceHandle>,
        writes: Vec<ResourceHandle>,
    }

    impl RenderPass for NamedPass {
        fn name(&self) -> &str {
            self.name
        }

        fn declare_resources(&self, builder: &mut PassResourceBuilder) {
            for &r in &self.reads {
                builder.read(r);
            }
            for &w in &self.writes {
                builder.write(w);
            }
        }

        fn execute(&mut self, _ctx: &mut PassContext) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn orders_consumers_after_producers() {
        let grid = ResourceHandle::named("light_grid");
        let maps = ResourceHandle::named("shadow_maps");
        let aabbs = ResourceHandle::named("cluster_aabbs");

        let mut graph = RenderGraph::new();
        // Register the consumer first on purpose.
        graph.add_pass(NamedPass {
            name: "forward",
            reads: vec![grid, maps],
            writes: vec![],
        });
        graph.add_pass(NamedPass {
            name: "light_cull",
            reads: vec![aabbs],
            writes: vec![grid],
        });
        graph.add_pass(NamedPass {
            name: "shadow",
            reads: vec![],
            writes: vec![maps],
        });
        graph.add_pass(NamedPass {
            name: "cluster_grid",
            reads: vec![],
            writes: vec![aabbs],
        });
        graph.build().unwrap();

        let order = graph.pass_order();
        let position = |name: &str| order.iter().position(|&n| n == name).unwrap();
        assert!(position("cluster_grid") < position("light_cull"));
        assert!(position("light_cull") < position("forward"));
        assert!(position("shadow") < position("forward"));
    }

    #[test]
    fn rejects_cycles() {
        let a = ResourceHandle::named("a");
        let b = ResourceHandle::named("b");

        let mut graph = RenderGraph::new();
        graph.add_pass(NamedPass {
            name: "first",
            reads: vec![b],
            writes: vec![a],
        });
        graph.add_pass(NamedPass {
            name: "second",
            reads: vec![a],
            writes: vec![b],
        });
        assert!(matches!(graph.build(), Err(Error::Graph(_))));
    }
}
