use crate::error::{Result, TspError};
use crate::graph::{NodeId, WeightedGraph};
use crate::tour::Tour;
use ordered_float::OrderedFloat;

pub trait ConstructionHeuristic {
    fn construct(&self, graph: &dyn WeightedGraph) -> Result<Tour>;
    fn name(&self) -> &str;
}

/// Nearest Insertion Heuristic
///
/// Starts from the cheapest edge of the graph as a two-node cycle, then keeps
/// adding the node reached by the cheapest edge leaving the cycle, inserted
/// where it lengthens the cycle the least.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestInsertion;

impl NearestInsertion {
    pub fn new() -> Self {
        NearestInsertion
    }

    fn edge_weight(graph: &dyn WeightedGraph, a: NodeId, b: NodeId) -> Result<f64> {
        graph
            .edge_between(a, b)
            .map(|e| graph.weight(&e))
            .ok_or(TspError::MissingEdge { from: a, to: b })
    }

    /// Cheapest edge of the whole graph, first in `(low, high)` order on ties
    fn cheapest_edge(graph: &dyn WeightedGraph) -> Option<(NodeId, NodeId)> {
        let n = graph.node_count();
        (0..n)
            .flat_map(|a| (a + 1..n).map(move |b| (a, b)))
            .filter_map(|(a, b)| graph.edge_between(a, b).map(|e| ((a, b), graph.weight(&e))))
            .min_by_key(|&(_, w)| OrderedFloat(w))
            .map(|(pair, _)| pair)
    }

    /// Unvisited node reached by the cheapest edge leaving the visited set
    fn nearest_outside(graph: &dyn WeightedGraph, visited: &[bool]) -> Option<NodeId> {
        let n = visited.len();
        (0..n)
            .filter(|&v| visited[v])
            .flat_map(|v| (0..n).filter(|&u| !visited[u]).map(move |u| (v, u)))
            .filter_map(|(v, u)| graph.edge_between(v, u).map(|e| (u, graph.weight(&e))))
            .min_by_key(|&(_, w)| OrderedFloat(w))
            .map(|(u, _)| u)
    }

    /// Position in `1..path.len()` where inserting `node` adds the least weight
    fn best_insertion(graph: &dyn WeightedGraph, path: &[NodeId], node: NodeId) -> Result<usize> {
        let mut best_position = 1;
        let mut best_delta = f64::INFINITY;

        for i in 1..path.len() {
            let (prev, next) = (path[i - 1], path[i]);
            let delta = Self::edge_weight(graph, prev, node)? + Self::edge_weight(graph, node, next)?
                - Self::edge_weight(graph, prev, next)?;
            if delta < best_delta {
                best_delta = delta;
                best_position = i;
            }
        }

        Ok(best_position)
    }
}

impl ConstructionHeuristic for NearestInsertion {
    fn construct(&self, graph: &dyn WeightedGraph) -> Result<Tour> {
        let n = graph.node_count();
        if n < 2 {
            return Err(TspError::TooFewNodes { required: 2, actual: n });
        }
        graph.ensure_complete()?;

        let (a, b) = Self::cheapest_edge(graph).ok_or(TspError::MissingEdge { from: 0, to: 1 })?;
        let mut visited = vec![false; n];
        visited[a] = true;
        visited[b] = true;
        let mut path = vec![a, b, a];

        while let Some(node) = Self::nearest_outside(graph, &visited) {
            let position = Self::best_insertion(graph, &path, node)?;
            path.insert(position, node);
            visited[node] = true;
        }

        log::debug!("[NI] built tour over {} nodes", n);
        Tour::from_path(graph, path)
    }

    fn name(&self) -> &str {
        "NearestInsertion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::CompleteGraphGenerator;
    use crate::graph::tests::four_city_graph;
    use crate::graph::Graph;
    use crate::tour::tests::assert_valid_cycle;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_four_city_optimum() {
        let graph = four_city_graph();
        let tour = NearestInsertion::new().construct(&graph).unwrap();
        // AB opens the cycle, C joins via AC in front of B, D lands between C and B
        assert_eq!(tour.node_path(), &[0, 2, 3, 1, 0]);
        assert_eq!(tour.path_weight(), 80.0);
    }

    #[test]
    fn test_random_graphs_yield_valid_tours() {
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        for n in [4, 10, 40] {
            let graph = CompleteGraphGenerator::new(n, 1.0, 100.0).generate(&mut rng).unwrap();
            let tour = NearestInsertion.construct(&graph).unwrap();
            assert_valid_cycle(tour.node_path(), n);
        }
    }

    #[test]
    fn test_two_nodes() {
        let graph = Graph::from_weight_matrix(&[vec![0.0, 4.0], vec![4.0, 0.0]]).unwrap();
        let tour = NearestInsertion.construct(&graph).unwrap();
        assert_eq!(tour.node_path(), &[0, 1, 0]);
        assert_eq!(tour.path_weight(), 8.0);
    }

    #[test]
    fn test_rejects_small_and_incomplete_graphs() {
        assert!(matches!(
            NearestInsertion.construct(&Graph::new(1)),
            Err(TspError::TooFewNodes { required: 2, actual: 1 })
        ));

        let mut graph = Graph::new(4);
        graph.add_edge(0, 1, 1.0).unwrap();
        assert!(matches!(
            NearestInsertion.construct(&graph),
            Err(TspError::IncompleteGraph { .. })
        ));
    }

    #[test]
    fn test_earliest_position_wins_ties() {
        let graph = Graph::from_weight_matrix(&vec![vec![1.0; 3]; 3]).unwrap();
        let path = [0, 1, 0];
        assert_eq!(NearestInsertion::best_insertion(&graph, &path, 2).unwrap(), 1);
    }
}
