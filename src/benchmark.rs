//! Experiment harness.
//!
//! Runs the solvers over freshly generated complete graphs, records one
//! [`RunRecord`] per run and variant, and exports the raw records, per-variant
//! statistics and a text report.

use crate::crossover::CrossoverType;
use crate::error::{Result, TspError};
use crate::generator::{CompleteGraphGenerator, MIN_NODES};
use crate::graph::Graph;
use crate::heuristics::aco::{ACOConfig, AntColonyOptimization};
use crate::heuristics::construction::{ConstructionHeuristic, NearestInsertion};
use crate::heuristics::genetic::{GAConfig, GeneticAlgorithms};
use crate::mutation::MutationType;
use crate::tour::Tour;

use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Experiment configuration
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Independent runs, each on its own graph. `None` uses the
    /// experiment's own default, see [`ExperimentKind::default_runs`]
    pub runs: Option<usize>,
    pub node_count: usize,
    pub min_weight: f64,
    pub max_weight: f64,
    /// GA population size, unless the experiment varies it
    pub population_size: usize,
    /// GA generations, unless the experiment varies them
    pub generations: usize,
    /// Base seed; run `i` generates its graph from `seed + i`
    pub seed: u64,
    /// Execute runs on the rayon thread pool
    pub parallel: bool,
    /// Show a progress bar on stderr
    pub progress: bool,
    pub output_dir: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            runs: None,
            node_count: 50,
            min_weight: 10.0,
            max_weight: 30.0,
            population_size: 100,
            generations: 500,
            seed: 42,
            parallel: true,
            progress: true,
            output_dir: "results".to_string(),
        }
    }
}

impl ExperimentConfig {
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = Some(runs);
        self
    }

    pub fn with_graph(mut self, node_count: usize, min_weight: f64, max_weight: f64) -> Self {
        self.node_count = node_count;
        self.min_weight = min_weight;
        self.max_weight = max_weight;
        self
    }

    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<String>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.runs == Some(0) {
            return Err(TspError::InvalidConfiguration(
                "an experiment needs at least one run".to_string(),
            ));
        }
        if self.node_count < MIN_NODES {
            return Err(TspError::TooFewNodes {
                required: MIN_NODES,
                actual: self.node_count,
            });
        }
        GAConfig::default()
            .with_population_size(self.population_size)
            .validate()
    }
}

/// The experiments of the study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperimentKind {
    /// Invert vs Switch vs Shift, Order Crossover
    MutationType,
    /// Order vs Cycle Crossover, Invert mutation
    RecombinationType,
    /// Recombination rate 1.0 down to 0.0 while the mutation rate rises
    Rates,
    /// Population sizes 10, 20, 40, ... 5120
    PopulationSize,
    /// Generation counts 10, 20, 40, ... 5120
    Generations,
    /// GA vs ACO vs Nearest Insertion
    Algorithms,
}

impl ExperimentKind {
    pub const ALL: [ExperimentKind; 6] = [
        ExperimentKind::MutationType,
        ExperimentKind::RecombinationType,
        ExperimentKind::Rates,
        ExperimentKind::PopulationSize,
        ExperimentKind::Generations,
        ExperimentKind::Algorithms,
    ];

    /// File stem of the exported CSVs and report
    pub fn name(&self) -> &'static str {
        match self {
            ExperimentKind::MutationType => "mutation_type_test",
            ExperimentKind::RecombinationType => "recombination_type_test",
            ExperimentKind::Rates => "rec_mut_rate_test",
            ExperimentKind::PopulationSize => "population_size_test",
            ExperimentKind::Generations => "generations_test",
            ExperimentKind::Algorithms => "aco_ga_ni",
        }
    }

    /// Runs used when the configuration does not set them. The parameter
    /// sweeps are expensive and run on 5 graphs, the comparisons on 50.
    pub fn default_runs(&self) -> usize {
        match self {
            ExperimentKind::Rates | ExperimentKind::PopulationSize | ExperimentKind::Generations => 5,
            ExperimentKind::MutationType | ExperimentKind::RecombinationType | ExperimentKind::Algorithms => 50,
        }
    }

    /// The solver variants executed on every graph of a run
    pub fn variants(&self, config: &ExperimentConfig) -> Vec<Variant> {
        let ga = GAConfig::default().with_population_size(config.population_size);
        let generations = config.generations;

        match self {
            ExperimentKind::MutationType => MutationType::ALL
                .iter()
                .map(|&m| Variant::genetic(m.name(), ga.clone().with_mutation(m), generations))
                .collect(),
            ExperimentKind::RecombinationType => CrossoverType::ALL
                .iter()
                .map(|&c| Variant::genetic(c.name(), ga.clone().with_crossover(c), generations))
                .collect(),
            ExperimentKind::Rates => (0..=10)
                .map(|i| {
                    let mutation_rate = i as f64 / 10.0;
                    let recombination_rate = (10 - i) as f64 / 10.0;
                    Variant::genetic(
                        format!("{:.1}/{:.1}", recombination_rate, mutation_rate),
                        ga.clone().with_rates(mutation_rate, recombination_rate),
                        generations,
                    )
                })
                .collect(),
            ExperimentKind::PopulationSize => doubling_series()
                .map(|size| Variant::genetic(size.to_string(), ga.clone().with_population_size(size), generations))
                .collect(),
            ExperimentKind::Generations => doubling_series()
                .map(|gens| Variant::genetic(gens.to_string(), ga.clone(), gens))
                .collect(),
            ExperimentKind::Algorithms => vec![
                Variant::genetic("GA", ga, generations),
                Variant {
                    label: "ACO".to_string(),
                    solver: Solver::AntColony(ACOConfig::default()),
                },
                Variant {
                    label: "Nearest Insertion".to_string(),
                    solver: Solver::NearestInsertion,
                },
            ],
        }
    }
}

impl std::fmt::Display for ExperimentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 10, 20, 40, ... ten values
fn doubling_series() -> impl Iterator<Item = usize> {
    (0..10).map(|i| 10usize << i)
}

#[derive(Debug, Clone)]
pub enum Solver {
    Genetic { config: GAConfig, generations: usize },
    AntColony(ACOConfig),
    NearestInsertion,
}

/// One labelled solver setup of an experiment
#[derive(Debug, Clone)]
pub struct Variant {
    pub label: String,
    pub solver: Solver,
}

impl Variant {
    fn genetic(label: impl Into<String>, config: GAConfig, generations: usize) -> Self {
        Variant {
            label: label.into(),
            solver: Solver::Genetic { config, generations },
        }
    }

    /// Solve `graph`, seeding stochastic solvers with `seed`
    pub fn solve(&self, graph: &Graph, seed: u64) -> Result<Tour> {
        match &self.solver {
            Solver::Genetic { config, generations } => {
                let config = config.clone().with_seed(seed);
                GeneticAlgorithms::new(graph, config)?.find_optimum(*generations)
            }
            Solver::AntColony(config) => {
                let config = config.clone().with_seed(seed);
                AntColonyOptimization::new(graph, config)?.run()
            }
            Solver::NearestInsertion => NearestInsertion.construct(graph),
        }
    }
}

/// Result of one variant on one run's graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub experiment: String,
    pub variant: String,
    /// 1-based run index
    pub run: usize,
    pub time_ns: u64,
    /// Path weight of the returned tour
    pub result: f64,
}

/// Aggregated statistics for a variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantStatistics {
    pub variant: String,
    pub runs: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub mean_time_ms: f64,
}

/// Group records by variant, keeping first-appearance order
pub fn summarize(records: &[RunRecord]) -> Vec<VariantStatistics> {
    let mut order: Vec<&str> = Vec::new();
    for record in records {
        if !order.contains(&record.variant.as_str()) {
            order.push(&record.variant);
        }
    }

    order
        .into_iter()
        .map(|variant| {
            let results: Vec<f64> = records
                .iter()
                .filter(|r| r.variant == variant)
                .map(|r| r.result)
                .collect();
            let times: Vec<f64> = records
                .iter()
                .filter(|r| r.variant == variant)
                .map(|r| r.time_ns as f64 / 1e6)
                .collect();

            let std_dev = results.iter().std_dev();
            VariantStatistics {
                variant: variant.to_string(),
                runs: results.len(),
                mean: results.iter().mean(),
                std_dev: if std_dev.is_nan() { 0.0 } else { std_dev },
                min: results.iter().cloned().fold(f64::INFINITY, f64::min),
                max: results.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                mean_time_ms: times.iter().mean(),
            }
        })
        .collect()
}

fn semicolon_writer(path: &Path) -> Result<csv::Writer<File>> {
    let file = File::create(path)?;
    Ok(csv::WriterBuilder::new().delimiter(b';').from_writer(file))
}

/// A configured experiment and the records it has produced
pub struct Experiment {
    kind: ExperimentKind,
    config: ExperimentConfig,
    records: Vec<RunRecord>,
}

impl Experiment {
    pub fn new(kind: ExperimentKind, config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Experiment {
            kind,
            config,
            records: Vec::new(),
        })
    }

    /// Execute all runs, replacing any previous records
    pub fn run(&mut self) -> Result<&[RunRecord]> {
        let runs = self.runs();
        let variants = self.kind.variants(&self.config);
        let generator = CompleteGraphGenerator::new(
            self.config.node_count,
            self.config.min_weight,
            self.config.max_weight,
        );

        log::info!(
            "Running experiment {} ({} runs x {} variants, n={})",
            self.kind,
            runs,
            variants.len(),
            self.config.node_count
        );

        let progress = if self.config.progress {
            let bar = ProgressBar::new((runs * variants.len()) as u64);
            let style = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ");
            bar.set_style(style);
            bar.set_message(self.kind.name());
            bar
        } else {
            ProgressBar::hidden()
        };

        let experiment = self.kind.name();
        let base_seed = self.config.seed;
        let run_one = |run: usize| -> Result<Vec<RunRecord>> {
            let run_seed = base_seed.wrapping_add(run as u64);
            let mut rng = ChaCha8Rng::seed_from_u64(run_seed);
            let graph = generator.generate(&mut rng)?;

            let mut records = Vec::with_capacity(variants.len());
            for (index, variant) in variants.iter().enumerate() {
                let solver_seed = run_seed.wrapping_mul(1_000).wrapping_add(index as u64);
                let start = Instant::now();
                let tour = variant.solve(&graph, solver_seed)?;
                let time_ns = start.elapsed().as_nanos() as u64;

                log::debug!(
                    "{} run {} {}: {:.3} in {} ns",
                    experiment,
                    run + 1,
                    variant.label,
                    tour.path_weight(),
                    time_ns
                );
                records.push(RunRecord {
                    experiment: experiment.to_string(),
                    variant: variant.label.clone(),
                    run: run + 1,
                    time_ns,
                    result: tour.path_weight(),
                });
                progress.inc(1);
            }
            Ok(records)
        };

        let per_run: Vec<Vec<RunRecord>> = if self.config.parallel {
            (0..runs).into_par_iter().map(run_one).collect::<Result<_>>()?
        } else {
            (0..runs).map(run_one).collect::<Result<_>>()?
        };
        progress.finish_and_clear();

        self.records = per_run.into_iter().flatten().collect();
        log::info!("Experiment {} produced {} records", self.kind, self.records.len());
        Ok(&self.records)
    }

    pub fn kind(&self) -> ExperimentKind {
        self.kind
    }

    /// Number of runs, the configured count or the experiment's default
    pub fn runs(&self) -> usize {
        self.config.runs.unwrap_or_else(|| self.kind.default_runs())
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn compute_statistics(&self) -> Vec<VariantStatistics> {
        summarize(&self.records)
    }

    /// Export records to a `;`-delimited CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = semicolon_writer(path.as_ref())?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export per-variant statistics to a `;`-delimited CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = semicolon_writer(path.as_ref())?;
        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       TSP Heuristics Experiment Report\n");
        report.push_str("========================================\n\n");
        report.push_str(&format!("Experiment: {}\n", self.kind));
        report.push_str(&format!(
            "Generated:  {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        report.push_str(&format!(
            "Runs: {}  Nodes: {}  Weights: [{}, {})  Population: {}  Generations: {}  Seed: {}\n\n",
            self.runs(),
            self.config.node_count,
            self.config.min_weight,
            self.config.max_weight,
            self.config.population_size,
            self.config.generations,
            self.config.seed
        ));

        report.push_str("-".repeat(80).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<22} {:>6} {:>11} {:>10} {:>11} {:>11} {:>12}\n",
            "Variant", "Runs", "Mean", "Std Dev", "Best", "Worst", "Mean ms"
        ));
        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<22} {:>6} {:>11.3} {:>10.3} {:>11.3} {:>11.3} {:>12.3}\n",
                stat.variant, stat.runs, stat.mean, stat.std_dev, stat.min, stat.max, stat.mean_time_ms
            ));
        }

        report.push_str("-".repeat(80).as_str());
        report.push('\n');
        report
    }

    /// Write records, statistics and report into the configured output
    /// directory, returning the directory
    pub fn save(&self) -> Result<PathBuf> {
        let dir = PathBuf::from(&self.config.output_dir);
        std::fs::create_dir_all(&dir)?;

        let stem = self.kind.name();
        self.export_to_csv(dir.join(format!("{}.csv", stem)))?;
        self.export_statistics_csv(dir.join(format!("{}_statistics.csv", stem)))?;
        std::fs::write(dir.join(format!("{}_report.txt", stem)), self.generate_report())?;

        log::info!("Saved {} results to {:?}", stem, dir);
        Ok(dir)
    }
}
