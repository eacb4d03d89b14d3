//! TSP Heuristics Library
//!
//! Heuristic solvers for the symmetric Travelling Salesman Problem on complete
//! weighted graphs.
//!
//! # Features
//!
//! - Genetic algorithm with tournament selection, Order/Cycle crossover and
//!   Invert/Switch/Shift mutation
//! - Ant Colony Optimization
//! - Nearest Insertion construction
//! - Random complete graph generation and JSON graph files
//! - Experiment harness with CSV export
//!
//! # Example
//!
//! ```no_run
//! use tsp_heuristics::generator::CompleteGraphGenerator;
//! use tsp_heuristics::heuristics::genetic::{GAConfig, GeneticAlgorithms};
//! use rand::SeedableRng;
//!
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
//! let graph = CompleteGraphGenerator::new(50, 10.0, 30.0).generate(&mut rng).unwrap();
//!
//! let mut ga = GeneticAlgorithms::new(&graph, GAConfig::default().with_seed(42)).unwrap();
//! let best = ga.find_optimum(500).unwrap();
//!
//! println!("Path weight: {:.2}", best.path_weight());
//! ```

pub mod benchmark;
pub mod crossover;
pub mod error;
pub mod generator;
pub mod graph;
pub mod heuristics;
pub mod mutation;
pub mod population;
pub mod tour;

pub use error::{Result, TspError};
pub use graph::{Graph, WeightedGraph};
pub use tour::Tour;
