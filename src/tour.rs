//! Tour representation for the TSP.
//!
//! A [`Tour`] is a closed cycle over every node of a complete graph together
//! with its derived edge path, path weight and fitness. Tours are immutable:
//! crossover and mutation always produce a new tour through
//! [`Tour::from_path`], the single place where path invariants are checked.

use crate::crossover::{self, CrossoverType};
use crate::error::{Result, TspError};
use crate::graph::{Edge, NodeId, WeightedGraph};
use crate::mutation::{self, MutationType};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;

/// A closed tour visiting every graph node exactly once
#[derive(Debug, Clone, Serialize)]
pub struct Tour {
    /// Node sequence of length `n + 1`, first and last element equal
    node_path: Vec<NodeId>,
    /// `edge_path[i]` joins `node_path[i]` and `node_path[i + 1]`
    edge_path: Vec<Edge>,
    /// Sum of the edge weights along the cycle
    path_weight: f64,
    /// `1 / path_weight`, higher is better
    fitness: f64,
}

impl Tour {
    /// Create a uniformly random tour over all nodes of a complete graph
    pub fn random<G, R>(graph: &G, rng: &mut R) -> Result<Self>
    where
        G: WeightedGraph + ?Sized,
        R: Rng + ?Sized,
    {
        graph.ensure_complete()?;

        let mut nodes = graph.nodes();
        nodes.shuffle(rng);
        if let Some(&first) = nodes.first() {
            nodes.push(first);
        }

        Tour::from_path(graph, nodes)
    }

    /// Create a tour from an explicit closed node path
    pub fn from_path<G>(graph: &G, node_path: Vec<NodeId>) -> Result<Self>
    where
        G: WeightedGraph + ?Sized,
    {
        let n = graph.node_count();
        if n < 2 {
            return Err(TspError::InvalidPath(format!(
                "a tour needs at least 2 nodes, graph has {}",
                n
            )));
        }
        if node_path.len() != n + 1 {
            return Err(TspError::InvalidPath(format!(
                "path has length {}, expected {}",
                node_path.len(),
                n + 1
            )));
        }
        if node_path[0] != node_path[n] {
            return Err(TspError::InvalidPath(format!(
                "path is not closed: starts at {} and ends at {}",
                node_path[0], node_path[n]
            )));
        }

        let mut seen = vec![false; n];
        for &node in &node_path[..n] {
            if node >= n {
                return Err(TspError::InvalidPath(format!(
                    "node {} is outside the graph",
                    node
                )));
            }
            if seen[node] {
                return Err(TspError::InvalidPath(format!("node {} is visited twice", node)));
            }
            seen[node] = true;
        }

        let edge_path = node_path
            .windows(2)
            .map(|pair| {
                graph.edge_between(pair[0], pair[1]).ok_or(TspError::MissingEdge {
                    from: pair[0],
                    to: pair[1],
                })
            })
            .collect::<Result<Vec<Edge>>>()?;

        let path_weight: f64 = edge_path.iter().map(|e| graph.weight(e)).sum();
        if path_weight == 0.0 {
            return Err(TspError::DegenerateTour);
        }

        Ok(Tour {
            node_path,
            edge_path,
            path_weight,
            fitness: 1.0 / path_weight,
        })
    }

    /// Closed node path, `n + 1` elements
    pub fn node_path(&self) -> &[NodeId] {
        &self.node_path
    }

    /// Node path without the closing element
    pub fn open_path(&self) -> &[NodeId] {
        &self.node_path[..self.node_path.len() - 1]
    }

    pub fn edge_path(&self) -> &[Edge] {
        &self.edge_path
    }

    pub fn path_weight(&self) -> f64 {
        self.path_weight
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Number of distinct nodes visited
    pub fn node_count(&self) -> usize {
        self.edge_path.len()
    }

    /// Sum the weights along the path again, looking every edge up in `graph`
    pub fn recompute_weight<G>(&self, graph: &G) -> Result<f64>
    where
        G: WeightedGraph + ?Sized,
    {
        self.node_path.windows(2).try_fold(0.0, |acc, pair| {
            graph
                .edge_between(pair[0], pair[1])
                .map(|e| acc + graph.weight(&e))
                .ok_or(TspError::MissingEdge { from: pair[0], to: pair[1] })
        })
    }

    /// Combine this tour (first parent) with `other` using the given crossover
    pub fn recombine<G, R>(
        &self,
        other: &Tour,
        crossover_type: CrossoverType,
        graph: &G,
        rng: &mut R,
    ) -> Result<Tour>
    where
        G: WeightedGraph + ?Sized,
        R: Rng + ?Sized,
    {
        let child = match crossover_type {
            CrossoverType::OrderCrossover => {
                crossover::order_crossover(&self.node_path, &other.node_path, rng)?
            }
            CrossoverType::CycleCrossover => {
                crossover::cycle_crossover(&self.node_path, &other.node_path, rng)?
            }
        };
        child.build(graph)
    }

    /// Derive a perturbed copy of this tour using the given mutation
    pub fn mutate<G, R>(&self, mutation_type: MutationType, graph: &G, rng: &mut R) -> Result<Tour>
    where
        G: WeightedGraph + ?Sized,
        R: Rng + ?Sized,
    {
        let mut builder = PathBuilder::from_closed_path(&self.node_path);
        mutation::apply(mutation_type, builder.open_slots_mut(), rng);
        builder.close();
        builder.build(graph)
    }
}

impl PartialEq for Tour {
    fn eq(&self, other: &Self) -> bool {
        self.path_weight.total_cmp(&other.path_weight) == Ordering::Equal
    }
}

impl PartialOrd for Tour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.path_weight.total_cmp(&other.path_weight))
    }
}

impl std::fmt::Display for Tour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = self
            .node_path
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(" - ");
        write!(
            f,
            "{} || path weight: {:.4} || fitness: {:.6e}",
            path, self.path_weight, self.fitness
        )
    }
}

/// Mutable scratch path that the genetic operators fill in.
///
/// Slots start vacant (crossover) or copied from a parent (mutation). The
/// last slot is the closing element and is only ever written by [`close`].
///
/// [`close`]: PathBuilder::close
#[derive(Debug, Clone)]
pub(crate) struct PathBuilder {
    slots: Vec<Option<NodeId>>,
}

impl PathBuilder {
    /// Vacant builder for a tour over `open_len` nodes
    pub(crate) fn vacant(open_len: usize) -> Self {
        PathBuilder {
            slots: vec![None; open_len + 1],
        }
    }

    pub(crate) fn from_closed_path(path: &[NodeId]) -> Self {
        PathBuilder {
            slots: path.iter().copied().map(Some).collect(),
        }
    }

    pub(crate) fn open_len(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    pub(crate) fn set(&mut self, index: usize, node: NodeId) {
        self.slots[index] = Some(node);
    }

    pub(crate) fn is_vacant(&self, index: usize) -> bool {
        self.slots[index].is_none()
    }

    pub(crate) fn open_slots_mut(&mut self) -> &mut [Option<NodeId>] {
        let n = self.open_len();
        &mut self.slots[..n]
    }

    /// Repeat the first node as the closing element
    pub(crate) fn close(&mut self) {
        if let Some(last) = self.slots.len().checked_sub(1) {
            self.slots[last] = self.slots[0];
        }
    }

    pub(crate) fn into_path(self) -> Result<Vec<NodeId>> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| TspError::InvalidPath(format!("position {} was never filled", i)))
            })
            .collect()
    }

    pub(crate) fn build<G>(self, graph: &G) -> Result<Tour>
    where
        G: WeightedGraph + ?Sized,
    {
        Tour::from_path(graph, self.into_path()?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::generator::CompleteGraphGenerator;
    use crate::graph::tests::four_city_graph;
    use crate::graph::Graph;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Open part is a permutation of `0..n` and the path is closed.
    pub(crate) fn assert_valid_cycle(path: &[NodeId], n: usize) {
        assert_eq!(path.len(), n + 1, "path {:?}", path);
        assert_eq!(path[0], path[n], "path {:?} is not closed", path);
        let mut sorted = path[..n].to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..n).collect::<Vec<_>>(), "path {:?}", path);
    }

    #[test]
    fn test_random_tours_are_closed_permutations() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let graph = CompleteGraphGenerator::new(20, 10.0, 50.0).generate(&mut rng).unwrap();

        for _ in 0..50 {
            let tour = Tour::random(&graph, &mut rng).unwrap();
            assert_valid_cycle(tour.node_path(), 20);
            assert_eq!(tour.edge_path().len(), 20);
            assert_eq!(tour.node_count(), 20);
            for (i, e) in tour.edge_path().iter().enumerate() {
                assert!(e.connects(tour.node_path()[i], tour.node_path()[i + 1]));
            }
        }
    }

    #[test]
    fn test_weight_and_fitness_are_derived() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let graph = CompleteGraphGenerator::new(15, 1.0, 9.0).generate(&mut rng).unwrap();

        for _ in 0..20 {
            let tour = Tour::random(&graph, &mut rng).unwrap();
            let recomputed = tour.recompute_weight(&graph).unwrap();
            assert!((recomputed - tour.path_weight()).abs() < 1e-9);
            assert_eq!(tour.fitness(), 1.0 / tour.path_weight());
        }
    }

    #[test]
    fn test_optimal_four_city_tour() {
        let graph = four_city_graph();
        let tour = Tour::from_path(&graph, vec![0, 1, 3, 2, 0]).unwrap();
        assert_eq!(tour.path_weight(), 80.0);
        assert_eq!(tour.open_path(), &[0, 1, 3, 2]);
        assert_eq!(graph.format_path(tour.node_path()), "A - B - D - C - A");

        let worse = Tour::from_path(&graph, vec![0, 1, 2, 3, 0]).unwrap();
        assert_eq!(worse.path_weight(), 95.0);
        assert!(tour < worse);
    }

    #[test]
    fn test_from_path_rejects_malformed_paths() {
        let graph = four_city_graph();
        let cases = vec![
            vec![0, 1, 2, 3],       // not closed, too short
            vec![0, 1, 2, 3, 1],    // not closed
            vec![0, 1, 1, 3, 0],    // repeat
            vec![0, 1, 2, 9, 0],    // out of range
            vec![0, 1, 2, 3, 0, 0], // too long
        ];
        for path in cases {
            assert!(
                matches!(Tour::from_path(&graph, path.clone()), Err(TspError::InvalidPath(_))),
                "{:?} was accepted",
                path
            );
        }
    }

    #[test]
    fn test_missing_edge_is_reported() {
        let mut graph = Graph::new(4);
        graph.add_edge(0, 1, 1.0).unwrap();
        graph.add_edge(1, 2, 1.0).unwrap();
        graph.add_edge(2, 3, 1.0).unwrap();
        assert!(matches!(
            Tour::from_path(&graph, vec![0, 1, 2, 3, 0]),
            Err(TspError::MissingEdge { from: 3, to: 0 })
        ));
    }

    #[test]
    fn test_random_requires_complete_graph() {
        let mut graph = Graph::new(4);
        graph.add_edge(0, 1, 1.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            Tour::random(&graph, &mut rng),
            Err(TspError::IncompleteGraph { .. })
        ));
    }

    #[test]
    fn test_zero_weight_is_degenerate() {
        let graph = Graph::from_weight_matrix(&vec![vec![0.0; 3]; 3]).unwrap();
        assert!(matches!(
            Tour::from_path(&graph, vec![0, 1, 2, 0]),
            Err(TspError::DegenerateTour)
        ));
    }

    #[test]
    fn test_operators_leave_parents_untouched() {
        let graph = four_city_graph();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let parent = Tour::from_path(&graph, vec![0, 1, 2, 3, 0]).unwrap();
        let other = Tour::from_path(&graph, vec![2, 0, 3, 1, 2]).unwrap();

        for _ in 0..20 {
            for m in [MutationType::Invert, MutationType::Switch, MutationType::Shift] {
                let child = parent.mutate(m, &graph, &mut rng).unwrap();
                assert_valid_cycle(child.node_path(), 4);
            }
            for c in [CrossoverType::OrderCrossover, CrossoverType::CycleCrossover] {
                let child = parent.recombine(&other, c, &graph, &mut rng).unwrap();
                assert_valid_cycle(child.node_path(), 4);
            }
        }
        assert_eq!(parent.node_path(), &[0, 1, 2, 3, 0]);
        assert_eq!(other.node_path(), &[2, 0, 3, 1, 2]);
    }

    #[test]
    fn test_builder_reports_vacant_slots() {
        let mut builder = PathBuilder::vacant(3);
        builder.set(0, 2);
        builder.set(1, 0);
        assert!(builder.is_vacant(2));
        builder.close();
        assert!(matches!(builder.into_path(), Err(TspError::InvalidPath(_))));
    }

    #[test]
    fn test_display() {
        let graph = four_city_graph();
        let tour = Tour::from_path(&graph, vec![0, 1, 3, 2, 0]).unwrap();
        let text = tour.to_string();
        assert!(text.starts_with("0 - 1 - 3 - 2 - 0"));
        assert!(text.contains("path weight: 80.0000"));
    }
}
