//! Fleet ACO - Command Line Interface
//!
//! Loads shipments and vehicles, assigns them with the ant colony or a
//! baseline, and reports the loading plan.

use clap::{Parser, Subcommand, ValueEnum};
use fleet_aco::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use fleet_aco::heuristics::aco::{ACOConfig, AntColonyOptimization};
use fleet_aco::heuristics::construction::*;
use fleet_aco::instance::FleetInstance;
use fleet_aco::solution::Solution;
use fleet_aco::SolverResult;

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "fleet-aco")]
#[command(version = "1.0")]
#[command(about = "Assign shipments to a capacity-constrained fleet with Ant Colony Optimization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single instance
    Solve {
        /// JSON instance file
        #[arg(short, long, conflicts_with_all = ["shipments", "vehicles"])]
        instance: Option<PathBuf>,

        /// CSV file of shipments (id,demand)
        #[arg(long, requires = "vehicles")]
        shipments: Option<PathBuf>,

        /// CSV file of vehicles (id,capacity[,reserve])
        #[arg(long, requires = "shipments")]
        vehicles: Option<PathBuf>,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "aco")]
        algorithm: Algorithm,

        #[command(flatten)]
        colony: ColonyArgs,

        /// Output solution to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write a random instance
    Generate {
        /// Number of shipments
        #[arg(short = 'n', long, default_value = "20")]
        shipments: usize,

        /// Demands are drawn uniformly in 1..=max_demand
        #[arg(long, default_value = "100")]
        max_demand: u32,

        /// Vehicle capacities
        #[arg(short, long, num_args = 1.., default_values_t = vec![500.0, 510.0, 600.0])]
        capacity: Vec<f64>,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Analyze an instance
    Analyze {
        /// JSON instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing JSON instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of ACO runs per instance
        #[arg(short, long, default_value = "5")]
        runs: usize,

        #[command(flatten)]
        colony: ColonyArgs,

        /// Maximum number of shipments
        #[arg(long)]
        max_size: Option<usize>,
    },
}

#[derive(clap::Args, Debug)]
struct ColonyArgs {
    /// Ants per iteration
    #[arg(long, default_value = "10")]
    ants: usize,

    /// Number of iterations
    #[arg(long, default_value = "100")]
    iterations: usize,

    /// Evaporation rate in [0, 1)
    #[arg(long, default_value = "0.1")]
    decay: f64,

    /// Pheromone influence
    #[arg(long, default_value = "1.0")]
    alpha: f64,

    /// Heuristic influence
    #[arg(long, default_value = "1.0")]
    beta: f64,

    /// Initial pheromone level
    #[arg(long, default_value = "1.0")]
    initial_pheromone: f64,

    /// Pheromone floor
    #[arg(long, default_value = "0.001")]
    min_pheromone: f64,

    /// Stop after this many iterations without improvement
    #[arg(long)]
    max_no_improve: Option<usize>,

    /// Time limit in seconds
    #[arg(short, long)]
    time_limit: Option<f64>,

    /// Random seed
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Construct ants on a single thread
    #[arg(long)]
    sequential: bool,
}

impl ColonyArgs {
    fn to_config(&self) -> ACOConfig {
        ACOConfig {
            num_ants: self.ants,
            num_iterations: self.iterations,
            decay: self.decay,
            alpha: self.alpha,
            beta: self.beta,
            initial_pheromone: self.initial_pheromone,
            min_pheromone: self.min_pheromone,
            seed: self.seed,
            parallel: !self.sequential,
            max_no_improve: self.max_no_improve,
            time_limit: self.time_limit,
            ..Default::default()
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Ant Colony Optimization
    Aco,
    /// First-Fit Decreasing
    Ffd,
    /// Best-Fit Decreasing
    Bfd,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve { instance, shipments, vehicles, algorithm, colony, output, verbose } => {
            load_instance(instance, shipments, vehicles)
                .and_then(|inst| solve_instance(&inst, algorithm, &colony, output, verbose))
        }

        Commands::Generate { shipments, max_demand, capacity, seed, output } => {
            generate_instance(shipments, max_demand, &capacity, seed, &output)
        }

        Commands::Analyze { instance } => analyze_instance(&instance),

        Commands::Benchmark { dir, output, runs, colony, max_size } => {
            run_benchmark(&dir, &output, runs, &colony, max_size)
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_instance(
    instance: Option<PathBuf>,
    shipments: Option<PathBuf>,
    vehicles: Option<PathBuf>,
) -> SolverResult<FleetInstance> {
    match (instance, shipments, vehicles) {
        (Some(path), _, _) => {
            println!("Loading instance from {:?}...", path);
            FleetInstance::from_json_file(&path)
        }
        (None, Some(s), Some(v)) => {
            println!("Loading shipments from {:?} and vehicles from {:?}...", s, v);
            FleetInstance::from_csv_files(&s, &v)
        }
        _ => Err(fleet_aco::SolverError::InvalidInput {
            reason: "pass --instance or both --shipments and --vehicles".to_string(),
        }),
    }
}

fn solve_instance(
    instance: &FleetInstance,
    algorithm: Algorithm,
    colony: &ColonyArgs,
    output: Option<PathBuf>,
    verbose: bool,
) -> SolverResult<()> {
    if verbose {
        println!("{}", instance.statistics());
    }

    println!("Solving with {:?} algorithm...", algorithm);
    let start = Instant::now();

    let solution: Solution = match algorithm {
        Algorithm::Aco => {
            let mut aco = AntColonyOptimization::new(instance.clone(), colony.to_config())?;
            aco.run()?
        }
        Algorithm::Ffd => FirstFitDecreasing::new().construct(instance),
        Algorithm::Bfd => BestFitDecreasing::new().construct(instance),
    };

    let elapsed = start.elapsed();

    println!("\n========== Results ==========");
    println!("Algorithm: {}", solution.algorithm);
    println!("Vehicles used: {}", solution.vehicles_used);
    println!("Unused capacity: {:.2}", solution.unused_capacity);
    println!("Utilization: {:.2}%", solution.utilization(instance) * 100.0);
    println!("Feasible: {}", solution.feasible);
    println!("Time: {:.4}s", elapsed.as_secs_f64());
    if let Some(iter) = solution.iterations {
        println!("Iterations: {}", iter);
    }
    if let Some(bound) = instance.vehicle_lower_bound() {
        println!("Vehicle lower bound: {}", bound);
    }

    println!();
    print!("{}", solution.report(instance));

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&solution)?;
        std::fs::write(&out_path, json)?;
        println!("\nSolution saved to {:?}", out_path);
    }

    Ok(())
}

fn generate_instance(
    num_shipments: usize,
    max_demand: u32,
    capacities: &[f64],
    seed: u64,
    output: &PathBuf,
) -> SolverResult<()> {
    let instance = FleetInstance::random(seed, num_shipments, max_demand, capacities)?;
    instance.to_json_file(output)?;
    println!("Instance {} written to {:?}", instance.name, output);
    Ok(())
}

fn analyze_instance(path: &PathBuf) -> SolverResult<()> {
    let instance = FleetInstance::from_json_file(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let ffd = FirstFitDecreasing::new().construct(&instance);
    let bfd = BestFitDecreasing::new().construct(&instance);

    println!("Quick Solution Estimates:");
    println!(
        "  First-Fit Decreasing: {} vehicles, {:.2} unused (feasible: {})",
        ffd.vehicles_used, ffd.unused_capacity, ffd.feasible
    );
    println!(
        "  Best-Fit Decreasing: {} vehicles, {:.2} unused (feasible: {})",
        bfd.vehicles_used, bfd.unused_capacity, bfd.feasible
    );

    Ok(())
}

fn run_benchmark(
    dir: &PathBuf,
    output: &PathBuf,
    runs: usize,
    colony: &ColonyArgs,
    max_size: Option<usize>,
) -> SolverResult<()> {
    println!("Loading instances from {:?}...", dir);

    let mut instances = load_instances_from_dir(dir);

    if let Some(max) = max_size {
        instances.retain(|i| i.num_shipments() <= max);
    }

    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        eprintln!("No instances found!");
        return Ok(());
    }

    let config = BenchmarkConfig {
        num_runs: runs,
        aco: colony.to_config(),
        output_dir: output.to_string_lossy().to_string(),
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);

    let progress = ProgressBar::new(instances.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}") {
        progress.set_style(style);
    }

    for instance in &instances {
        progress.set_message(instance.name.clone());
        benchmark.run_full_benchmark(instance);
        progress.inc(1);
    }
    progress.finish_with_message("done");

    let report = benchmark.export_all()?;
    println!("\n{}", report);
    println!("Results, statistics and report written to {:?}", output);

    Ok(())
}
