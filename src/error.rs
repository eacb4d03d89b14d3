//! Error types shared by the graph model, the genetic operators and the solvers.

use thiserror::Error;

use crate::graph::NodeId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TspError>;

/// Every failure the crate can report.
///
/// None of these are retried internally: they describe either a caller
/// contract violation (bad configuration, incomplete graph, malformed path)
/// or an I/O failure in the file-facing layers.
#[derive(Debug, Error)]
pub enum TspError {
    /// A selector, rate or size parameter is outside its accepted domain.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The graph does not carry an edge between every pair of nodes.
    #[error("graph is not complete: {nodes} nodes and {edges} edges, expected {expected} edges")]
    IncompleteGraph {
        nodes: usize,
        edges: usize,
        expected: usize,
    },

    /// Two tours of different path length were recombined.
    #[error("cannot recombine tours with path lengths {left} and {right}")]
    LengthMismatch { left: usize, right: usize },

    /// Two consecutive path nodes are not connected.
    #[error("no edge between nodes {from} and {to}")]
    MissingEdge { from: NodeId, to: NodeId },

    /// A node path is not a closed permutation of the graph nodes.
    #[error("invalid tour path: {0}")]
    InvalidPath(String),

    /// The path weight is zero, so fitness is undefined.
    #[error("tour has zero path weight, fitness is undefined")]
    DegenerateTour,

    /// An edge refers to unknown nodes or is a self-loop.
    #[error("invalid edge: {0}")]
    InvalidEdge(String),

    /// Edge weights must be finite and non-negative.
    #[error("invalid edge weight {weight}")]
    InvalidWeight { weight: f64 },

    /// Graph generation below the supported minimum size.
    #[error("at least {required} nodes are required, got {actual}")]
    TooFewNodes { required: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
