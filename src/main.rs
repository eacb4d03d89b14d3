//! TSP Heuristics - Command Line Interface
//!
//! Generate random complete graphs, solve them with the genetic algorithm,
//! ant colony optimization or nearest insertion, and run the experiments.

use clap::{Parser, Subcommand, ValueEnum};
use tsp_heuristics::benchmark::{Experiment, ExperimentConfig, ExperimentKind};
use tsp_heuristics::crossover::CrossoverType;
use tsp_heuristics::error::Result;
use tsp_heuristics::generator::CompleteGraphGenerator;
use tsp_heuristics::graph::Graph;
use tsp_heuristics::heuristics::{
    ACOConfig, AntColonyOptimization, ConstructionHeuristic, GAConfig, GeneticAlgorithms, NearestInsertion,
};
use tsp_heuristics::mutation::MutationType;
use tsp_heuristics::tour::Tour;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "tsp-heuristics")]
#[command(version = "1.0")]
#[command(about = "Genetic algorithms, ant colonies and nearest insertion for the symmetric TSP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random complete graph and write it as JSON
    Generate {
        /// Number of nodes
        #[arg(short, long, default_value = "50")]
        nodes: usize,

        #[arg(long, default_value = "10")]
        min_weight: f64,

        #[arg(long, default_value = "30")]
        max_weight: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output graph file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Solve a graph file or a freshly generated graph
    Solve {
        /// Graph JSON file; a random graph is generated when omitted
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Number of nodes of the generated graph
        #[arg(short, long, default_value = "50")]
        nodes: usize,

        #[arg(long, default_value = "10")]
        min_weight: f64,

        #[arg(long, default_value = "30")]
        max_weight: f64,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "ga")]
        algorithm: Algorithm,

        #[arg(short, long, default_value = "100")]
        population_size: usize,

        #[arg(long, default_value = "500")]
        generations: usize,

        #[arg(short, long, value_enum, default_value = "invert")]
        mutation: Mutation,

        #[arg(short, long, value_enum, default_value = "order")]
        crossover: Crossover,

        #[arg(long, default_value = "0.5")]
        mutation_rate: f64,

        #[arg(long, default_value = "0.5")]
        recombination_rate: f64,

        /// Number of ants
        #[arg(long, default_value = "10")]
        ants: usize,

        /// ACO iterations
        #[arg(long, default_value = "100")]
        iterations: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output tour to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run one experiment, or all of them
    Experiment {
        /// Experiment to run; all experiments when omitted
        #[arg(short, long, value_enum)]
        kind: Option<Kind>,

        /// Number of runs; each experiment's own default when omitted
        #[arg(short, long)]
        runs: Option<usize>,

        /// Number of nodes per generated graph
        #[arg(short, long, default_value = "50")]
        nodes: usize,

        #[arg(short, long, default_value = "100")]
        population_size: usize,

        #[arg(long, default_value = "500")]
        generations: usize,

        /// Base random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Run sequentially instead of on all cores
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Genetic Algorithm
    Ga,
    /// Ant Colony Optimization
    Aco,
    /// Nearest Insertion construction
    NearestInsertion,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Mutation {
    Invert,
    Switch,
    Shift,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Crossover {
    /// Order Crossover (OX)
    Order,
    /// Cycle Crossover (CX)
    Cycle,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Kind {
    MutationType,
    RecombinationType,
    Rates,
    PopulationSize,
    Generations,
    Algorithms,
}

impl From<Mutation> for MutationType {
    fn from(m: Mutation) -> Self {
        match m {
            Mutation::Invert => MutationType::Invert,
            Mutation::Switch => MutationType::Switch,
            Mutation::Shift => MutationType::Shift,
        }
    }
}

impl From<Crossover> for CrossoverType {
    fn from(c: Crossover) -> Self {
        match c {
            Crossover::Order => CrossoverType::OrderCrossover,
            Crossover::Cycle => CrossoverType::CycleCrossover,
        }
    }
}

impl From<Kind> for ExperimentKind {
    fn from(k: Kind) -> Self {
        match k {
            Kind::MutationType => ExperimentKind::MutationType,
            Kind::RecombinationType => ExperimentKind::RecombinationType,
            Kind::Rates => ExperimentKind::Rates,
            Kind::PopulationSize => ExperimentKind::PopulationSize,
            Kind::Generations => ExperimentKind::Generations,
            Kind::Algorithms => ExperimentKind::Algorithms,
        }
    }
}

struct SolveOptions {
    algorithm: Algorithm,
    ga: GAConfig,
    generations: usize,
    aco: ACOConfig,
    output: Option<PathBuf>,
    verbose: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Generate { nodes, min_weight, max_weight, seed, output } => {
            generate_graph(nodes, min_weight, max_weight, seed, &output)
        }

        Commands::Solve {
            graph,
            nodes,
            min_weight,
            max_weight,
            algorithm,
            population_size,
            generations,
            mutation,
            crossover,
            mutation_rate,
            recombination_rate,
            ants,
            iterations,
            seed,
            output,
            verbose,
        } => {
            let options = SolveOptions {
                algorithm,
                ga: GAConfig::default()
                    .with_population_size(population_size)
                    .with_mutation(mutation.into())
                    .with_crossover(crossover.into())
                    .with_rates(mutation_rate, recombination_rate)
                    .with_seed(seed),
                generations,
                aco: ACOConfig::default().with_ants(ants).with_iterations(iterations).with_seed(seed),
                output,
                verbose,
            };
            load_or_generate(graph.as_deref(), nodes, min_weight, max_weight, seed)
                .and_then(|g| solve_graph(&g, options))
        }

        Commands::Experiment {
            kind,
            runs,
            nodes,
            population_size,
            generations,
            seed,
            output,
            sequential,
        } => {
            let mut config = ExperimentConfig::default()
                .with_graph(nodes, 10.0, 30.0)
                .with_population_size(population_size)
                .with_generations(generations)
                .with_seed(seed)
                .with_parallel(!sequential)
                .with_output_dir(output.to_string_lossy());
            if let Some(runs) = runs {
                config = config.with_runs(runs);
            }
            let kinds = match kind {
                Some(k) => vec![k.into()],
                None => ExperimentKind::ALL.to_vec(),
            };
            run_experiments(&kinds, config)
        }
    };

    if let Err(e) = outcome {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn generate_graph(nodes: usize, min_weight: f64, max_weight: f64, seed: u64, output: &Path) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let graph = CompleteGraphGenerator::new(nodes, min_weight, max_weight).generate(&mut rng)?;
    graph.to_file(output)?;

    println!("{}", graph.statistics());
    println!("Graph saved to {:?}", output);
    Ok(())
}

fn load_or_generate(
    path: Option<&Path>,
    nodes: usize,
    min_weight: f64,
    max_weight: f64,
    seed: u64,
) -> Result<Graph> {
    match path {
        Some(path) => {
            println!("Loading graph from {:?}...", path);
            Graph::from_file(path)
        }
        None => {
            println!("Generating complete graph with {} nodes...", nodes);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            CompleteGraphGenerator::new(nodes, min_weight, max_weight).generate(&mut rng)
        }
    }
}

fn solve_graph(graph: &Graph, options: SolveOptions) -> Result<()> {
    if options.verbose {
        println!("{}", graph.statistics());
    }

    println!("Solving with {:?} algorithm...", options.algorithm);
    let start = Instant::now();

    let tour: Tour = match options.algorithm {
        Algorithm::Ga => {
            let mut ga = GeneticAlgorithms::new(graph, options.ga)?;
            let best = ga.find_optimum(options.generations)?;
            if options.verbose {
                println!("Champion weight: {:.4}", ga.champion().path_weight());
            }
            best
        }
        Algorithm::Aco => AntColonyOptimization::new(graph, options.aco)?.run()?,
        Algorithm::NearestInsertion => NearestInsertion::new().construct(graph)?,
    };

    let elapsed = start.elapsed();

    println!("\n========== Results ==========");
    println!("Algorithm: {:?}", options.algorithm);
    println!("Path weight: {:.4}", tour.path_weight());
    println!("Fitness: {:.6e}", tour.fitness());
    println!("Time: {:.4}s", elapsed.as_secs_f64());

    if options.verbose {
        println!("\nTour: {}", graph.format_path(tour.node_path()));
    }

    if let Some(out_path) = options.output {
        let json = serde_json::to_string_pretty(&tour)?;
        std::fs::write(&out_path, json)?;
        println!("\nTour saved to {:?}", out_path);
    }

    Ok(())
}

fn run_experiments(kinds: &[ExperimentKind], config: ExperimentConfig) -> Result<()> {
    for &kind in kinds {
        let mut experiment = Experiment::new(kind, config.clone())?;
        println!("\nRunning {} ({} runs)...", kind, experiment.runs());

        experiment.run()?;
        let dir = experiment.save()?;

        println!("\n{}", experiment.generate_report());
        println!("Results exported to {:?}", dir);
    }
    Ok(())
}
