//! Ant Colony Optimization for the TSP.
//!
//! Ant System variant: every ant of an iteration lays pheromone in
//! proportion to the inverse of its tour length, then all trails evaporate.

use crate::error::{Result, TspError};
use crate::graph::{NodeId, WeightedGraph};
use crate::tour::Tour;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Heuristic desirability used for zero-weight edges
const ZERO_WEIGHT_HEURISTIC: f64 = 1e6;

/// ACO configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ACOConfig {
    /// Number of ants
    pub num_ants: usize,
    /// Number of iterations
    pub max_iterations: usize,
    /// Evaporation rate (rho)
    pub evaporation_rate: f64,
    /// Pheromone importance (alpha)
    pub alpha: f64,
    /// Heuristic importance (beta)
    pub beta: f64,
    /// Initial pheromone level
    pub initial_pheromone: f64,
    /// Random seed
    pub seed: Option<u64>,
}

impl Default for ACOConfig {
    fn default() -> Self {
        ACOConfig {
            num_ants: 10,
            max_iterations: 100,
            evaporation_rate: 0.1,
            alpha: 1.0,
            beta: 2.0,
            initial_pheromone: 1.0,
            seed: None,
        }
    }
}

impl ACOConfig {
    pub fn with_ants(mut self, num_ants: usize) -> Self {
        self.num_ants = num_ants;
        self
    }

    pub fn with_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_ants == 0 || self.max_iterations == 0 {
            return Err(TspError::InvalidConfiguration(
                "ACO needs at least one ant and one iteration".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.evaporation_rate) {
            return Err(TspError::InvalidConfiguration(format!(
                "evaporation rate must lie in [0, 1], got {}",
                self.evaporation_rate
            )));
        }
        if !(self.alpha >= 0.0 && self.beta >= 0.0 && self.alpha.is_finite() && self.beta.is_finite()) {
            return Err(TspError::InvalidConfiguration(format!(
                "alpha and beta must be finite and non-negative, got {} and {}",
                self.alpha, self.beta
            )));
        }
        if !(self.initial_pheromone > 0.0 && self.initial_pheromone.is_finite()) {
            return Err(TspError::InvalidConfiguration(format!(
                "initial pheromone must be positive, got {}",
                self.initial_pheromone
            )));
        }
        Ok(())
    }
}

/// Ant Colony Optimization solver
pub struct AntColonyOptimization<'g, G: WeightedGraph + ?Sized> {
    config: ACOConfig,
    graph: &'g G,
    pheromone: Vec<Vec<f64>>,
    heuristic: Vec<Vec<f64>>,
    best_tour: Option<Tour>,
    rng: ChaCha8Rng,
}

impl<'g, G: WeightedGraph + ?Sized> AntColonyOptimization<'g, G> {
    pub fn new(graph: &'g G, config: ACOConfig) -> Result<Self> {
        config.validate()?;
        let n = graph.node_count();
        if n < 2 {
            return Err(TspError::TooFewNodes { required: 2, actual: n });
        }
        graph.ensure_complete()?;

        let pheromone = vec![vec![config.initial_pheromone; n]; n];

        // Initialize heuristic information (inverse distance)
        let mut heuristic = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if let Some(edge) = graph.edge_between(i, j) {
                    let dist = graph.weight(&edge);
                    heuristic[i][j] = if dist > 0.0 { 1.0 / dist } else { ZERO_WEIGHT_HEURISTIC };
                }
            }
        }

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(AntColonyOptimization {
            config,
            graph,
            pheromone,
            heuristic,
            best_tour: None,
            rng,
        })
    }

    /// Walk one ant from node 0 through every node and back
    fn construct_path(&mut self) -> Vec<NodeId> {
        let n = self.graph.node_count();
        let mut path = Vec::with_capacity(n + 1);
        let mut visited = vec![false; n];
        path.push(0);
        visited[0] = true;

        let mut current = 0;
        while path.len() < n {
            let next = self.select_next_node(current, &visited);
            path.push(next);
            visited[next] = true;
            current = next;
        }

        path.push(0);
        path
    }

    /// Roulette wheel over unvisited nodes weighted by `tau^alpha * eta^beta`
    fn select_next_node(&mut self, current: NodeId, visited: &[bool]) -> NodeId {
        let candidates: Vec<(NodeId, f64)> = (0..visited.len())
            .filter(|&j| !visited[j])
            .map(|j| {
                let tau = self.pheromone[current][j].powf(self.config.alpha);
                let eta = self.heuristic[current][j].powf(self.config.beta);
                (j, tau * eta)
            })
            .collect();

        let total: f64 = candidates.iter().map(|&(_, p)| p).sum();
        let mut pick = self.rng.gen::<f64>() * total;

        for &(j, prob) in &candidates {
            pick -= prob;
            if pick <= 0.0 {
                return j;
            }
        }

        // rounding left a remainder
        candidates.last().map(|&(j, _)| j).unwrap_or(current)
    }

    fn deposit(&mut self, tour: &Tour) {
        let delta = 1.0 / tour.path_weight();
        for pair in tour.node_path().windows(2) {
            let (from, to) = (pair[0], pair[1]);
            self.pheromone[from][to] += delta;
            self.pheromone[to][from] = self.pheromone[from][to];
        }
    }

    fn evaporate(&mut self) {
        let keep = 1.0 - self.config.evaporation_rate;
        for row in &mut self.pheromone {
            for tau in row.iter_mut() {
                *tau *= keep;
            }
        }
    }

    /// Run ACO algorithm and return the best tour of all iterations
    pub fn run(&mut self) -> Result<Tour> {
        let start = std::time::Instant::now();

        for iteration in 0..self.config.max_iterations {
            let mut tours = Vec::with_capacity(self.config.num_ants);
            for _ in 0..self.config.num_ants {
                let path = self.construct_path();
                tours.push(Tour::from_path(self.graph, path)?);
            }

            for tour in tours {
                self.deposit(&tour);
                let improved = self
                    .best_tour
                    .as_ref()
                    .map_or(true, |best| tour.path_weight() < best.path_weight());
                if improved {
                    log::debug!("[ACO] Iter {}  new best {:.3}", iteration, tour.path_weight());
                    self.best_tour = Some(tour);
                }
            }

            self.evaporate();
        }

        let best = self
            .best_tour
            .clone()
            .ok_or_else(|| TspError::InvalidConfiguration("ACO produced no tour".to_string()))?;
        log::info!(
            "[ACO] {} iterations x {} ants: best {:.3} in {:.2}s",
            self.config.max_iterations,
            self.config.num_ants,
            best.path_weight(),
            start.elapsed().as_secs_f64()
        );
        Ok(best)
    }

    /// Best tour found so far
    pub fn best_tour(&self) -> Option<&Tour> {
        self.best_tour.as_ref()
    }

    pub fn pheromone(&self, a: NodeId, b: NodeId) -> f64 {
        self.pheromone[a][b]
    }
}
