use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::ir::handle;
use crate::runtime::manager::TransformManager;

impl TransformManager {
    /// Checks the ordering contract construction otherwise trusts.
    ///
    /// Handles whose producer id is not a registered transform are taken to
    /// be external data columns and are not checked. Every other handle must
    /// name a declared output of a transform registered earlier, and the
    /// dependency graph must be acyclic.
    pub fn validate(&self) -> GraphResult<()> {
        let configs = self.transforms();
        let mut graph = DiGraph::<&str, ()>::with_capacity(configs.len(), configs.len());
        let nodes: Vec<_> = configs.iter().map(|config| graph.add_node(config.id())).collect();
        let mut forward_reference = None;

        for (consumer, config) in configs.iter().enumerate() {
            for input in config.input_handles() {
                let (producer_id, output) = handle::split(input);
                let Some(producer) = self.position(producer_id) else {
                    continue;
                };

                let producer_config = &configs[producer];
                let declared = match output {
                    Some(output) => producer_config.has_output(output),
                    None => producer_config.metadata().outputs.len() == 1,
                };
                if !declared {
                    return Err(GraphError::UnknownOutput {
                        node_id: producer_id.to_string(),
                        output: output.unwrap_or_default().to_string(),
                    });
                }

                graph.add_edge(nodes[producer], nodes[consumer], ());
                if producer >= consumer && forward_reference.is_none() {
                    forward_reference = Some((config.id().to_string(), input.to_string()));
                }
            }
        }

        if let Err(cycle) = toposort(&graph, None) {
            return Err(GraphError::Cycle {
                node_id: graph[cycle.node_id()].to_string(),
            });
        }
        if let Some((node_id, handle)) = forward_reference {
            return Err(GraphError::ForwardReference { node_id, handle });
        }

        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "transform graph validated");
        Ok(())
    }
}
