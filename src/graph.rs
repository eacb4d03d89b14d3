//! Weighted graph model for the TSP.
//!
//! Nodes are dense indices into an arena; undirected edge weights are kept in
//! a triangular array indexed by `(min(i, j), max(i, j))`. Solvers only see the
//! [`WeightedGraph`] trait, so any graph exposing the same queries can be used.

use crate::error::{Result, TspError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Index of a node inside its graph.
pub type NodeId = usize;

/// Undirected weighted edge, stored with `source < target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
}

impl Edge {
    pub fn new(a: NodeId, b: NodeId, weight: f64) -> Self {
        Edge {
            source: a.min(b),
            target: a.max(b),
            weight,
        }
    }

    /// Check whether this edge joins `a` and `b` (in either direction)
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

/// Read-only view of a weighted graph used by every solver in the crate.
pub trait WeightedGraph {
    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;

    /// Stable enumeration of all nodes.
    fn nodes(&self) -> Vec<NodeId> {
        (0..self.node_count()).collect()
    }

    fn edge_between(&self, a: NodeId, b: NodeId) -> Option<Edge>;

    fn weight(&self, edge: &Edge) -> f64 {
        edge.weight
    }

    /// Number of edges a complete graph on `node_count` nodes carries.
    fn complete_edge_count(&self) -> usize {
        let n = self.node_count();
        n * n.saturating_sub(1) / 2
    }

    fn is_complete(&self) -> bool {
        self.edge_count() == self.complete_edge_count()
    }

    /// Fail with [`TspError::IncompleteGraph`] unless every node pair is connected.
    fn ensure_complete(&self) -> Result<()> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(TspError::IncompleteGraph {
                nodes: self.node_count(),
                edges: self.edge_count(),
                expected: self.complete_edge_count(),
            })
        }
    }
}

/// Arena-backed undirected graph with labelled nodes.
#[derive(Debug, Clone)]
pub struct Graph {
    labels: Vec<String>,
    weights: Vec<Option<f64>>,
    edge_count: usize,
}

#[inline]
fn triangular_index(a: NodeId, b: NodeId) -> usize {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    hi * (hi - 1) / 2 + lo
}

impl Graph {
    /// Graph with `node_count` nodes labelled by their index and no edges
    pub fn new(node_count: usize) -> Self {
        Self::with_labels((0..node_count).map(|i| i.to_string()).collect())
    }

    /// Graph with one node per label and no edges
    pub fn with_labels(labels: Vec<String>) -> Self {
        let n = labels.len();
        Graph {
            labels,
            weights: vec![None; n * n.saturating_sub(1) / 2],
            edge_count: 0,
        }
    }

    /// Build a complete graph from the upper triangle of a square weight matrix
    pub fn from_weight_matrix(matrix: &[Vec<f64>]) -> Result<Self> {
        let n = matrix.len();
        let mut graph = Graph::new(n);
        for (i, row) in matrix.iter().enumerate() {
            if row.len() != n {
                return Err(TspError::InvalidEdge(format!(
                    "weight matrix row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            for (j, &w) in row.iter().enumerate().skip(i + 1) {
                graph.add_edge(i, j, w)?;
            }
        }
        Ok(graph)
    }

    /// Insert or overwrite the undirected edge between `a` and `b`
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: f64) -> Result<()> {
        let n = self.labels.len();
        if a >= n || b >= n {
            return Err(TspError::InvalidEdge(format!(
                "edge ({}, {}) refers to a node outside 0..{}",
                a, b, n
            )));
        }
        if a == b {
            return Err(TspError::InvalidEdge(format!("self-loop on node {}", a)));
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(TspError::InvalidWeight { weight });
        }

        let slot = &mut self.weights[triangular_index(a, b)];
        if slot.is_none() {
            self.edge_count += 1;
        }
        *slot = Some(weight);
        Ok(())
    }

    pub fn label(&self, node: NodeId) -> Option<&str> {
        self.labels.get(node).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// All present edges, ordered by `(target, source)`
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        let n = self.labels.len();
        (1..n).flat_map(move |hi| {
            (0..hi).filter_map(move |lo| {
                self.weights[triangular_index(lo, hi)].map(|w| Edge::new(lo, hi, w))
            })
        })
    }

    /// Render a node path with labels, e.g. `A - B - D - C - A`
    pub fn format_path(&self, path: &[NodeId]) -> String {
        path.iter()
            .map(|&n| self.label(n).unwrap_or("?"))
            .collect::<Vec<_>>()
            .join(" - ")
    }

    /// Load a graph from its JSON representation
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let data: GraphFile = serde_json::from_reader(reader)?;
        Graph::try_from(data)
    }

    /// Save the graph as JSON
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &GraphFile::from(self))?;
        Ok(())
    }

    /// Summary statistics over edge weights
    pub fn statistics(&self) -> GraphStatistics {
        let weights: Vec<f64> = self.edges().map(|e| e.weight).collect();
        let (min_weight, max_weight, avg_weight) = if weights.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                weights.iter().cloned().fold(f64::INFINITY, f64::min),
                weights.iter().cloned().fold(0.0, f64::max),
                weights.iter().sum::<f64>() / weights.len() as f64,
            )
        };

        GraphStatistics {
            nodes: self.node_count(),
            edges: self.edge_count(),
            complete: self.is_complete(),
            min_weight,
            max_weight,
            avg_weight,
        }
    }
}

impl WeightedGraph for Graph {
    fn node_count(&self) -> usize {
        self.labels.len()
    }

    fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn edge_between(&self, a: NodeId, b: NodeId) -> Option<Edge> {
        if a == b || a >= self.labels.len() || b >= self.labels.len() {
            return None;
        }
        self.weights[triangular_index(a, b)].map(|w| Edge::new(a, b, w))
    }
}

/// On-disk layout of a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphFile {
    pub labels: Vec<String>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: f64,
}

impl From<&Graph> for GraphFile {
    fn from(graph: &Graph) -> Self {
        GraphFile {
            labels: graph.labels.clone(),
            edges: graph
                .edges()
                .map(|e| EdgeRecord { a: e.source, b: e.target, weight: e.weight })
                .collect(),
        }
    }
}

impl TryFrom<GraphFile> for Graph {
    type Error = TspError;

    fn try_from(data: GraphFile) -> Result<Self> {
        let mut graph = Graph::with_labels(data.labels);
        for edge in data.edges {
            graph.add_edge(edge.a, edge.b, edge.weight)?;
        }
        Ok(graph)
    }
}

/// Statistics about a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub nodes: usize,
    pub edges: usize,
    pub complete: bool,
    pub min_weight: f64,
    pub max_weight: f64,
    pub avg_weight: f64,
}

impl std::fmt::Display for GraphStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Graph")?;
        writeln!(f, "  Nodes: {}", self.nodes)?;
        writeln!(f, "  Edges: {} (complete: {})", self.edges, self.complete)?;
        writeln!(f, "  Min weight: {:.2}", self.min_weight)?;
        writeln!(f, "  Max weight: {:.2}", self.max_weight)?;
        writeln!(f, "  Avg weight: {:.2}", self.avg_weight)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Four cities with a unique optimal tour A-B-D-C-A of weight 80.
    pub(crate) fn four_city_graph() -> Graph {
        let mut g = Graph::with_labels(vec!["A".into(), "B".into(), "C".into(), "D".into()]);
        g.add_edge(0, 1, 10.0).unwrap();
        g.add_edge(0, 2, 15.0).unwrap();
        g.add_edge(0, 3, 20.0).unwrap();
        g.add_edge(1, 2, 35.0).unwrap();
        g.add_edge(1, 3, 25.0).unwrap();
        g.add_edge(2, 3, 30.0).unwrap();
        g
    }

    #[test]
    fn test_edges_are_symmetric() {
        let g = four_city_graph();
        let ab = g.edge_between(0, 1).unwrap();
        let ba = g.edge_between(1, 0).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(g.weight(&ab), 10.0);
        assert!(ab.connects(1, 0));
    }

    #[test]
    fn test_completeness() {
        let mut g = four_city_graph();
        assert!(g.is_complete());
        assert_eq!(g.edge_count(), 6);

        // overwriting does not double count
        g.add_edge(3, 2, 31.0).unwrap();
        assert_eq!(g.edge_count(), 6);
        assert_eq!(g.edge_between(2, 3).unwrap().weight, 31.0);

        let mut partial = Graph::new(4);
        partial.add_edge(0, 1, 1.0).unwrap();
        assert!(!partial.is_complete());
        assert!(matches!(
            partial.ensure_complete(),
            Err(TspError::IncompleteGraph { nodes: 4, edges: 1, expected: 6 })
        ));
    }

    #[test]
    fn test_rejects_bad_edges() {
        let mut g = Graph::new(3);
        assert!(matches!(g.add_edge(1, 1, 1.0), Err(TspError::InvalidEdge(_))));
        assert!(matches!(g.add_edge(0, 3, 1.0), Err(TspError::InvalidEdge(_))));
        assert!(matches!(g.add_edge(0, 1, -1.0), Err(TspError::InvalidWeight { .. })));
        assert!(matches!(g.add_edge(0, 1, f64::NAN), Err(TspError::InvalidWeight { .. })));
        assert!(g.edge_between(0, 0).is_none());
        assert!(g.edge_between(0, 7).is_none());
    }

    #[test]
    fn test_weight_matrix() {
        let matrix = vec![
            vec![0.0, 1.0, 2.0],
            vec![1.0, 0.0, 3.0],
            vec![2.0, 3.0, 0.0],
        ];
        let g = Graph::from_weight_matrix(&matrix).unwrap();
        assert!(g.is_complete());
        assert_eq!(g.edge_between(2, 1).unwrap().weight, 3.0);

        let ragged = vec![vec![0.0, 1.0], vec![1.0]];
        assert!(Graph::from_weight_matrix(&ragged).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let g = four_city_graph();
        let path = std::env::temp_dir().join(format!("tsp_graph_{}.json", std::process::id()));
        g.to_file(&path).unwrap();
        let loaded = Graph::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.labels(), g.labels());
        assert_eq!(loaded.edge_count(), 6);
        assert_eq!(loaded.edge_between(1, 3).unwrap().weight, 25.0);
        assert_eq!(loaded.label(3), Some("D"));
    }

    #[test]
    fn test_statistics() {
        let stats = four_city_graph().statistics();
        assert_eq!(stats.nodes, 4);
        assert!(stats.complete);
        assert_eq!(stats.min_weight, 10.0);
        assert_eq!(stats.max_weight, 35.0);
        assert!((stats.avg_weight - 135.0 / 6.0).abs() < 1e-10);
    }
}
