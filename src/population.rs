//! Ranked population of tours.
//!
//! Membership and ranking live in one ordered map keyed by
//! `(path weight, insertion id)`, so there is no second structure to keep in
//! sync. The insertion id keeps tours of equal weight distinct and orders
//! them by age.

use crate::tour::Tour;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// Handle of a tour inside a [`Population`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TourKey {
    weight: OrderedFloat<f64>,
    id: u64,
}

impl TourKey {
    pub fn path_weight(&self) -> f64 {
        self.weight.into_inner()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Population {
    ranking: BTreeMap<TourKey, Tour>,
    next_id: u64,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ranking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }

    pub fn insert(&mut self, tour: Tour) -> TourKey {
        let key = TourKey {
            weight: OrderedFloat(tour.path_weight()),
            id: self.next_id,
        };
        self.next_id += 1;
        self.ranking.insert(key, tour);
        key
    }

    pub fn remove(&mut self, key: &TourKey) -> Option<Tour> {
        self.ranking.remove(key)
    }

    pub fn get(&self, key: &TourKey) -> Option<&Tour> {
        self.ranking.get(key)
    }

    /// Tour with the lowest path weight
    pub fn best(&self) -> Option<&Tour> {
        self.ranking.values().next()
    }

    /// Tour with the highest path weight
    pub fn worst(&self) -> Option<&Tour> {
        self.ranking.values().next_back()
    }

    /// Keys of all members in ranking order
    pub fn keys(&self) -> Vec<TourKey> {
        self.ranking.keys().copied().collect()
    }

    /// Members in ranking order, best first
    pub fn iter(&self) -> impl Iterator<Item = &Tour> {
        self.ranking.values()
    }

    /// Mean path weight of all members
    pub fn mean_weight(&self) -> Option<f64> {
        if self.ranking.is_empty() {
            return None;
        }
        Some(self.ranking.keys().map(|k| k.path_weight()).sum::<f64>() / self.ranking.len() as f64)
    }
}

impl Extend<Tour> for Population {
    fn extend<I: IntoIterator<Item = Tour>>(&mut self, tours: I) {
        for tour in tours {
            self.insert(tour);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::four_city_graph;

    #[test]
    fn test_ranking_and_removal() {
        let graph = four_city_graph();
        let mut population = Population::new();
        let worse = population.insert(Tour::from_path(&graph, vec![0, 1, 2, 3, 0]).unwrap());
        let best = population.insert(Tour::from_path(&graph, vec![0, 1, 3, 2, 0]).unwrap());
        let twin = population.insert(Tour::from_path(&graph, vec![0, 2, 1, 3, 0]).unwrap());

        assert_eq!(population.len(), 3);
        assert_eq!(population.best().unwrap().path_weight(), 80.0);
        assert_eq!(population.keys(), vec![best, worse, twin]);
        assert_eq!(worse.path_weight(), 95.0);
        assert_ne!(worse, twin);

        assert!(population.remove(&best).is_some());
        assert!(population.remove(&best).is_none());
        assert_eq!(population.len(), 2);
        assert_eq!(population.best().unwrap().path_weight(), 95.0);
        assert_eq!(population.worst().unwrap().node_path(), &[0, 2, 1, 3, 0]);
        assert_eq!(population.mean_weight(), Some(95.0));
    }

    #[test]
    fn test_duplicates_by_path_are_distinct_members() {
        let graph = four_city_graph();
        let tour = Tour::from_path(&graph, vec![0, 1, 3, 2, 0]).unwrap();
        let mut population = Population::new();
        population.extend(vec![tour.clone(), tour.clone(), tour]);
        assert_eq!(population.len(), 3);
        assert_eq!(population.iter().count(), 3);
    }

    #[test]
    fn test_empty() {
        let population = Population::new();
        assert!(population.is_empty());
        assert!(population.best().is_none());
        assert_eq!(population.mean_weight(), None);
    }
}
