//! Random complete graph generation.

use crate::error::{Result, TspError};
use crate::graph::{Graph, WeightedGraph};
use rand::Rng;

/// Smallest graph the genetic operators are defined on.
pub const MIN_NODES: usize = 4;

/// Generates complete graphs with uniformly random edge weights.
#[derive(Debug, Clone)]
pub struct CompleteGraphGenerator {
    pub node_count: usize,
    pub min_weight: f64,
    pub max_weight: f64,
}

impl CompleteGraphGenerator {
    pub fn new(node_count: usize, min_weight: f64, max_weight: f64) -> Self {
        CompleteGraphGenerator {
            node_count,
            min_weight,
            max_weight,
        }
    }

    /// Build a complete graph with weights drawn from `[min_weight, max_weight)`
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Graph> {
        if self.node_count < MIN_NODES {
            return Err(TspError::TooFewNodes {
                required: MIN_NODES,
                actual: self.node_count,
            });
        }
        if !(self.min_weight.is_finite() && self.max_weight.is_finite())
            || self.min_weight < 0.0
            || self.min_weight > self.max_weight
        {
            return Err(TspError::InvalidConfiguration(format!(
                "weight range [{}, {}) is not a finite non-negative interval",
                self.min_weight, self.max_weight
            )));
        }

        let mut graph = Graph::new(self.node_count);
        for source in 0..self.node_count - 1 {
            for target in source + 1..self.node_count {
                let weight = if self.min_weight < self.max_weight {
                    rng.gen_range(self.min_weight..self.max_weight)
                } else {
                    self.min_weight
                };
                graph.add_edge(source, target, weight)?;
            }
        }

        log::debug!(
            "generated complete graph: {} nodes, {} edges",
            self.node_count,
            graph.edge_count()
        );
        Ok(graph)
    }
}
