//! Genetic Algorithm for the TSP.
//!
//! Each generation runs three stages on a ranked population of tours:
//! - Tournament selection: random pairs, the weaker tour of each pair dies
//! - Recombination: offspring from uniformly drawn parent pairs
//! - Mutation: offspring from uniformly drawn single parents
//!
//! Parents of both offspring stages are drawn with replacement from the
//! population left by selection. There is no elitism; the best tour ever
//! seen is tracked separately as the champion.

use crate::crossover::CrossoverType;
use crate::error::{Result, TspError};
use crate::graph::WeightedGraph;
use crate::mutation::MutationType;
use crate::population::{Population, TourKey};
use crate::tour::Tour;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Genetic Algorithm configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GAConfig {
    /// Number of random tours in the seeded population
    pub population_size: usize,
    /// Mutation operator
    pub mutation: MutationType,
    /// Crossover operator
    pub crossover: CrossoverType,
    /// Mutants spawned per generation, as a fraction of the post-selection size
    pub mutation_rate: f64,
    /// Offspring spawned per generation, as a fraction of the post-selection size
    pub recombination_rate: f64,
    /// Random seed, `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            population_size: 100,
            mutation: MutationType::Invert,
            crossover: CrossoverType::OrderCrossover,
            mutation_rate: 0.5,
            recombination_rate: 0.5,
            seed: None,
        }
    }
}

impl GAConfig {
    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    pub fn with_mutation(mut self, mutation: MutationType) -> Self {
        self.mutation = mutation;
        self
    }

    pub fn with_crossover(mut self, crossover: CrossoverType) -> Self {
        self.crossover = crossover;
        self
    }

    pub fn with_rates(mut self, mutation_rate: f64, recombination_rate: f64) -> Self {
        self.mutation_rate = mutation_rate;
        self.recombination_rate = recombination_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject sizes and rates outside their domain
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(TspError::InvalidConfiguration(
                "population size must be at least 1".to_string(),
            ));
        }
        for (name, rate) in [
            ("mutation rate", self.mutation_rate),
            ("recombination rate", self.recombination_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(TspError::InvalidConfiguration(format!(
                    "{} must lie in [0, 1], got {}",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

/// Tolerance absorbing rounding error in `size * rate` before flooring
const COUNT_EPSILON: f64 = 1e-9;

/// Offspring count for a stage: `floor(size * rate)`
pub fn offspring_count(size: usize, rate: f64) -> usize {
    (size as f64 * rate + COUNT_EPSILON).floor() as usize
}

/// What happened during one generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationStats {
    pub generation: usize,
    /// Tours culled by selection
    pub removed: usize,
    pub offspring_recombined: usize,
    pub offspring_mutated: usize,
    /// Population size at the end of the generation
    pub population_size: usize,
    /// Best weight currently in the population
    pub best_weight: f64,
    pub mean_weight: f64,
    pub worst_weight: f64,
    /// Best weight seen since seeding
    pub champion_weight: f64,
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithms<'g, G: WeightedGraph + ?Sized> {
    graph: &'g G,
    config: GAConfig,
    population: Population,
    champion: Tour,
    rng: ChaCha8Rng,
    generation: usize,
}

impl<'g, G: WeightedGraph + ?Sized> GeneticAlgorithms<'g, G> {
    /// Validate the configuration and seed the population with random tours
    pub fn new(graph: &'g G, config: GAConfig) -> Result<Self> {
        config.validate()?;
        graph.ensure_complete()?;

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let seeded = (0..config.population_size)
            .map(|_| Tour::random(graph, &mut rng))
            .collect::<Result<Vec<_>>>()?;
        let mut population = Population::new();
        population.extend(seeded);
        let champion = population
            .best()
            .cloned()
            .ok_or_else(|| TspError::InvalidConfiguration("empty population".to_string()))?;

        log::info!(
            "[GA] seeded {} tours over {} nodes ({} / {}), best weight {:.3}",
            population.len(),
            graph.node_count(),
            config.mutation,
            config.crossover,
            champion.path_weight()
        );

        Ok(GeneticAlgorithms {
            graph,
            config,
            population,
            champion,
            rng,
            generation: 0,
        })
    }

    /// Engine with numeric operator selectors and both rates at 0.5
    pub fn with_selectors(
        graph: &'g G,
        population_size: usize,
        mutation_type: usize,
        recombination_type: usize,
    ) -> Result<Self> {
        Self::with_rates(graph, population_size, mutation_type, recombination_type, 0.5, 0.5)
    }

    /// Engine with numeric operator selectors and explicit rates
    pub fn with_rates(
        graph: &'g G,
        population_size: usize,
        mutation_type: usize,
        recombination_type: usize,
        mutation_rate: f64,
        recombination_rate: f64,
    ) -> Result<Self> {
        let config = GAConfig {
            population_size,
            mutation: MutationType::try_from(mutation_type)?,
            crossover: CrossoverType::try_from(recombination_type)?,
            mutation_rate,
            recombination_rate,
            seed: None,
        };
        Self::new(graph, config)
    }

    /// Run `generations` generations and return the best tour of the final
    /// population
    pub fn find_optimum(&mut self, generations: usize) -> Result<Tour> {
        let start = std::time::Instant::now();

        for _ in 0..generations {
            let stats = self.step()?;
            log::debug!(
                "[GA] Gen {}  Size {}  Best {:.3}  Mean {:.3}  Worst {:.3}  Champion {:.3}  Elapsed {:.2}s",
                stats.generation,
                stats.population_size,
                stats.best_weight,
                stats.mean_weight,
                stats.worst_weight,
                stats.champion_weight,
                start.elapsed().as_secs_f64()
            );
        }

        let best = self.best().clone();
        log::info!(
            "[GA] finished after {} generations: best {:.3}, champion {:.3}, {:.2}s",
            self.generation,
            best.path_weight(),
            self.champion.path_weight(),
            start.elapsed().as_secs_f64()
        );
        Ok(best)
    }

    /// Run a single generation: selection, recombination, mutation
    pub fn step(&mut self) -> Result<GenerationStats> {
        self.step_with_lineage().map(|(stats, _)| stats)
    }

    /// Like [`step`](Self::step), also reporting which population keys
    /// the generation drew from and inserted
    pub fn step_with_lineage(&mut self) -> Result<(GenerationStats, Lineage)> {
        let removed = self.survival_of_the_fittest();

        let survivors = self.population.keys();
        let size = survivors.len();
        let recombined = self.recombination(&survivors, size)?;
        let mutated = self.mutation(&survivors, size)?;

        let best_weight = self.best().path_weight();
        if best_weight < self.champion.path_weight() {
            self.champion = self.best().clone();
        }
        self.generation += 1;

        let stats = GenerationStats {
            generation: self.generation,
            removed,
            offspring_recombined: recombined.len(),
            offspring_mutated: mutated.len(),
            population_size: self.population.len(),
            best_weight,
            mean_weight: self.population.mean_weight().unwrap_or(best_weight),
            worst_weight: self.population.worst().map_or(best_weight, |t| t.path_weight()),
            champion_weight: self.champion.path_weight(),
        };
        let lineage = Lineage {
            survivors,
            recombined,
            mutated,
        };
        Ok((stats, lineage))
    }

    /// Tournament selection: pair tours at random and remove the weaker one of
    /// each pair. On equal fitness the first tour of the pair is removed.
    fn survival_of_the_fittest(&mut self) -> usize {
        let mut keys = self.population.keys();
        keys.shuffle(&mut self.rng);

        let losers: Vec<TourKey> = keys
            .chunks_exact(2)
            .filter_map(|pair| {
                let first = self.population.get(&pair[0])?;
                let second = self.population.get(&pair[1])?;
                if first.fitness() > second.fitness() {
                    Some(pair[1])
                } else {
                    Some(pair[0])
                }
            })
            .collect();

        for key in &losers {
            self.population.remove(key);
        }
        log::trace!("[GA] selection removed {} tours", losers.len());
        losers.len()
    }

    /// Returns the keys of the inserted children
    fn recombination(&mut self, parents: &[TourKey], size: usize) -> Result<Vec<TourKey>> {
        let count = offspring_count(size, self.config.recombination_rate);
        let mut offspring = Vec::with_capacity(count);

        for _ in 0..count {
            let (_, first) = draw_parent(&self.population, parents, &mut self.rng)?;
            let (_, second) = draw_parent(&self.population, parents, &mut self.rng)?;
            offspring.push(first.recombine(second, self.config.crossover, self.graph, &mut self.rng)?);
        }

        let children: Vec<TourKey> = offspring.into_iter().map(|t| self.population.insert(t)).collect();
        log::trace!("[GA] recombination added {} tours", children.len());
        Ok(children)
    }

    /// Returns `(parent, child)` key pairs
    fn mutation(&mut self, parents: &[TourKey], size: usize) -> Result<Vec<(TourKey, TourKey)>> {
        let count = offspring_count(size, self.config.mutation_rate);
        let mut offspring = Vec::with_capacity(count);

        for _ in 0..count {
            let (key, parent) = draw_parent(&self.population, parents, &mut self.rng)?;
            offspring.push((key, parent.mutate(self.config.mutation, self.graph, &mut self.rng)?));
        }

        let pairs: Vec<(TourKey, TourKey)> = offspring
            .into_iter()
            .map(|(parent, child)| (parent, self.population.insert(child)))
            .collect();
        log::trace!("[GA] mutation added {} tours", pairs.len());
        Ok(pairs)
    }

    /// Best tour currently in the population
    pub fn best(&self) -> &Tour {
        // the population never empties: selection keeps at least half of it
        self.population.best().unwrap_or(&self.champion)
    }

    /// Best tour seen since seeding, including tours later lost to selection
    pub fn champion(&self) -> &Tour {
        &self.champion
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn config(&self) -> &GAConfig {
        &self.config
    }

    /// Number of completed generations
    pub fn generation(&self) -> usize {
        self.generation
    }
}

/// Population keys touched by one generation
#[derive(Debug, Clone, Default)]
pub struct Lineage {
    /// Members left by selection, the parent pool of both offspring stages
    pub survivors: Vec<TourKey>,
    pub recombined: Vec<TourKey>,
    /// `(parent, child)` pairs of the mutation stage
    pub mutated: Vec<(TourKey, TourKey)>,
}

/// Draw a parent uniformly, with replacement, from the given snapshot
fn draw_parent<'p, R: Rng + ?Sized>(
    population: &'p Population,
    parents: &[TourKey],
    rng: &mut R,
) -> Result<(TourKey, &'p Tour)> {
    let key = parents
        .choose(rng)
        .ok_or_else(|| TspError::InvalidConfiguration("no parents to draw from".to_string()))?;
    population
        .get(key)
        .map(|tour| (*key, tour))
        .ok_or_else(|| TspError::InvalidConfiguration("parent left the population".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::CompleteGraphGenerator;
    use crate::graph::tests::four_city_graph;
    use crate::graph::Graph;
    use crate::tour::tests::assert_valid_cycle;

    fn random_graph(n: usize, seed: u64) -> Graph {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        CompleteGraphGenerator::new(n, 10.0, 30.0).generate(&mut rng).unwrap()
    }

    #[test]
    fn test_genetic_algorithm_finds_four_city_optimum() {
        let graph = four_city_graph();
        for (mutation, crossover) in [
            (MutationType::Invert, CrossoverType::OrderCrossover),
            (MutationType::Switch, CrossoverType::CycleCrossover),
            (MutationType::Shift, CrossoverType::OrderCrossover),
        ] {
            let config = GAConfig::default()
                .with_population_size(30)
                .with_mutation(mutation)
                .with_crossover(crossover)
                .with_seed(17);
            let mut ga = GeneticAlgorithms::new(&graph, config).unwrap();
            let best = ga.find_optimum(50).unwrap();

            assert_eq!(best.path_weight(), 80.0);
            assert_eq!(ga.champion().path_weight(), 80.0);
            assert_valid_cycle(best.node_path(), 4);
        }
    }

    #[test]
    fn test_invalid_selectors_are_rejected() {
        let graph = four_city_graph();
        assert!(matches!(
            GeneticAlgorithms::with_selectors(&graph, 10, 3, 0),
            Err(TspError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            GeneticAlgorithms::with_selectors(&graph, 10, 0, 2),
            Err(TspError::InvalidConfiguration(_))
        ));
        assert!(GeneticAlgorithms::with_selectors(&graph, 10, 2, 1).is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let graph = four_city_graph();
        for config in [
            GAConfig::default().with_population_size(0),
            GAConfig::default().with_rates(1.5, 0.5),
            GAConfig::default().with_rates(0.5, -0.1),
            GAConfig::default().with_rates(f64::NAN, 0.5),
        ] {
            assert!(matches!(
                GeneticAlgorithms::new(&graph, config),
                Err(TspError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_incomplete_graph_is_rejected() {
        let mut graph = Graph::new(5);
        graph.add_edge(0, 1, 1.0).unwrap();
        assert!(matches!(
            GeneticAlgorithms::new(&graph, GAConfig::default()),
            Err(TspError::IncompleteGraph { .. })
        ));
    }

    #[test]
    fn test_zero_generations_returns_seeded_best() {
        let graph = random_graph(12, 1);
        let mut ga = GeneticAlgorithms::new(&graph, GAConfig::default().with_seed(4)).unwrap();
        let seeded_best = ga.population().best().unwrap().path_weight();
        let seeded_min = ga
            .population()
            .iter()
            .map(|t| t.path_weight())
            .fold(f64::INFINITY, f64::min);

        let result = ga.find_optimum(0).unwrap();
        assert_eq!(result.path_weight(), seeded_best);
        assert_eq!(result.path_weight(), seeded_min);
        assert_eq!(ga.generation(), 0);
        assert_eq!(ga.population().len(), 100);
    }

    #[test]
    fn test_generation_sizes() {
        let graph = random_graph(15, 2);
        let config = GAConfig::default()
            .with_population_size(41)
            .with_rates(0.3, 0.7)
            .with_seed(8);
        let mut ga = GeneticAlgorithms::new(&graph, config).unwrap();

        for _ in 0..25 {
            let before = ga.population().len();
            let stats = ga.step().unwrap();
            let survivors = before - stats.removed;

            assert_eq!(stats.removed, before / 2);
            assert!(survivors <= before);
            assert_eq!(stats.offspring_recombined, offspring_count(survivors, 0.7));
            assert_eq!(stats.offspring_mutated, offspring_count(survivors, 0.3));
            assert_eq!(
                stats.population_size,
                survivors + stats.offspring_recombined + stats.offspring_mutated
            );
            assert_eq!(ga.population().len(), stats.population_size);
        }
    }

    #[test]
    fn test_offspring_parents_come_from_survivors() {
        let graph = random_graph(10, 6);
        let config = GAConfig::default()
            .with_population_size(16)
            .with_rates(1.0, 1.0)
            .with_seed(13);
        let mut ga = GeneticAlgorithms::new(&graph, config).unwrap();

        for _ in 0..20 {
            let (stats, lineage) = ga.step_with_lineage().unwrap();
            assert_eq!(lineage.recombined.len(), lineage.survivors.len());
            assert_eq!(lineage.mutated.len(), lineage.survivors.len());
            assert_eq!(stats.offspring_mutated, lineage.mutated.len());

            for (parent, child) in &lineage.mutated {
                assert!(lineage.survivors.contains(parent));
                assert!(!lineage.recombined.contains(parent));
                assert!(!lineage.survivors.contains(child));
            }
            for child in &lineage.recombined {
                assert!(ga.population().get(child).is_some());
            }
        }
    }

    #[test]
    fn test_generation_stats_order_weights() {
        let graph = random_graph(12, 9);
        let mut ga = GeneticAlgorithms::new(&graph, GAConfig::default().with_population_size(20).with_seed(2)).unwrap();
        for _ in 0..10 {
            let stats = ga.step().unwrap();
            assert!(stats.best_weight <= stats.mean_weight + 1e-9);
            assert!(stats.mean_weight <= stats.worst_weight + 1e-9);
            assert_eq!(stats.worst_weight, ga.population().worst().unwrap().path_weight());
        }
    }

    #[test]
    fn test_champion_never_worsens() {
        let graph = random_graph(20, 3);
        let config = GAConfig::default()
            .with_population_size(40)
            .with_crossover(CrossoverType::CycleCrossover)
            .with_mutation(MutationType::Shift)
            .with_seed(21);
        let mut ga = GeneticAlgorithms::new(&graph, config).unwrap();

        let mut champion = ga.champion().path_weight();
        for _ in 0..40 {
            let stats = ga.step().unwrap();
            assert!(stats.champion_weight <= champion);
            assert!(stats.champion_weight <= stats.best_weight);
            champion = stats.champion_weight;
        }
        for tour in ga.population().iter() {
            assert_valid_cycle(tour.node_path(), 20);
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let graph = random_graph(25, 4);
        let config = GAConfig::default().with_population_size(30).with_seed(99);
        let a = GeneticAlgorithms::new(&graph, config.clone()).unwrap().find_optimum(30).unwrap();
        let b = GeneticAlgorithms::new(&graph, config).unwrap().find_optimum(30).unwrap();
        assert_eq!(a.node_path(), b.node_path());
    }

    #[test]
    fn test_offspring_count_floors() {
        assert_eq!(offspring_count(10, 0.5), 5);
        assert_eq!(offspring_count(11, 0.5), 5);
        assert_eq!(offspring_count(7, 0.0), 0);
        assert_eq!(offspring_count(7, 1.0), 7);
        // 90 * 0.7 evaluates to 62.99999999999999 in f64
        assert_eq!(offspring_count(90, 0.7), 63);
        for i in 0..=10 {
            let rate = i as f64 / 10.0;
            for size in [10, 90, 170, 180, 330, 1000, 5990] {
                assert_eq!(offspring_count(size, rate), size * i / 10, "size {} rate {}", size, rate);
            }
        }
    }

    #[test]
    fn test_single_tour_population_survives() {
        let graph = four_city_graph();
        let config = GAConfig::default().with_population_size(1).with_seed(0);
        let mut ga = GeneticAlgorithms::new(&graph, config).unwrap();
        let stats = ga.step().unwrap();
        assert_eq!(stats.removed, 0);
        assert_eq!(stats.population_size, 1);
    }
}
