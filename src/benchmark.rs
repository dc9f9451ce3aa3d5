//! Benchmarking and experimentation module for fleet loading.
//!
//! Runs the constructive baselines and several seeded ACO runs per instance,
//! collects statistics and exports them.

use crate::error::{SolverError, SolverResult};
use crate::heuristics::aco::{ACOConfig, AntColonyOptimization};
use crate::heuristics::construction::*;
use crate::instance::FleetInstance;
use crate::solution::Solution;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    pub num_shipments: usize,
    pub num_vehicles: usize,
    /// Vehicles used by the solution
    pub vehicles_used: usize,
    /// Unused capacity on the used vehicles
    pub unused_capacity: f64,
    /// Whether solution is feasible
    pub feasible: bool,
    /// Computation time in seconds
    pub time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
    /// Vehicles above the instance lower bound (if available)
    pub gap_to_bound: Option<usize>,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of recorded runs
    pub num_runs: usize,
    /// Number of feasible solutions
    pub num_feasible: usize,
    pub avg_vehicles: f64,
    pub best_vehicles: usize,
    pub worst_vehicles: usize,
    pub avg_unused: f64,
    /// Standard deviation of unused capacity
    pub std_unused: f64,
    /// Average time
    pub avg_time: f64,
    /// Total time
    pub total_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeded ACO runs per instance
    pub num_runs: usize,
    /// Base colony parameters; the seed is replaced per run
    pub aco: ACOConfig,
    /// Run the seeded ACO runs in parallel
    pub parallel: bool,
    /// Directory written by `export_all`
    pub output_dir: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            aco: ACOConfig::default(),
            parallel: true,
            output_dir: "results".to_string(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run the deterministic baselines on an instance
    pub fn run_construction_heuristics(&mut self, instance: &FleetInstance) {
        let heuristics: Vec<Box<dyn ConstructionHeuristic + Send + Sync>> = vec![
            Box::new(FirstFitDecreasing::new()),
            Box::new(BestFitDecreasing::new()),
        ];

        for heuristic in heuristics {
            let solution = heuristic.construct(instance);
            self.record_result(instance, &solution);
        }
    }

    /// Run `num_runs` seeded colonies on an instance
    pub fn run_aco(&mut self, instance: &FleetInstance) {
        let run_one = |seed: u64| -> Option<Solution> {
            let config = ACOConfig {
                seed,
                parallel: !self.config.parallel,
                ..self.config.aco.clone()
            };
            let algorithm = format!("ACO-run{}", seed);

            let outcome = AntColonyOptimization::new(instance.clone(), config).and_then(|mut aco| aco.run());
            match outcome {
                Ok(mut solution) => {
                    solution.algorithm = algorithm;
                    Some(solution)
                }
                Err(SolverError::NoFeasibleSolution { iterations }) => {
                    let mut solution = Solution::new();
                    solution.algorithm = algorithm;
                    solution.iterations = Some(iterations);
                    Some(solution)
                }
                Err(e) => {
                    log::error!("ACO run {} on {} failed: {}", seed, instance.name, e);
                    None
                }
            }
        };

        let seeds: Vec<u64> = (0..self.config.num_runs as u64).collect();
        let solutions: Vec<Option<Solution>> = if self.config.parallel {
            seeds.par_iter().map(|&seed| run_one(seed)).collect()
        } else {
            seeds.iter().map(|&seed| run_one(seed)).collect()
        };

        for solution in solutions.into_iter().flatten() {
            self.record_result(instance, &solution);
        }
    }

    /// Run full benchmark on an instance
    pub fn run_full_benchmark(&mut self, instance: &FleetInstance) {
        log::info!("Running benchmark on instance: {}", instance.name);

        self.run_construction_heuristics(instance);
        self.run_aco(instance);
    }

    /// Run benchmark on multiple instances
    pub fn run_on_instances(&mut self, instances: &[FleetInstance]) {
        for instance in instances {
            self.run_full_benchmark(instance);
        }
    }

    /// Record a result
    fn record_result(&mut self, instance: &FleetInstance, solution: &Solution) {
        let gap_to_bound = match (solution.feasible, instance.vehicle_lower_bound()) {
            (true, Some(bound)) => Some(solution.vehicles_used.saturating_sub(bound)),
            _ => None,
        };

        self.results.push(AlgorithmResult {
            algorithm: solution.algorithm.clone(),
            instance: instance.name.clone(),
            num_shipments: instance.num_shipments(),
            num_vehicles: instance.num_vehicles(),
            vehicles_used: solution.vehicles_used,
            unused_capacity: solution.unused_capacity,
            feasible: solution.feasible,
            time: solution.computation_time,
            iterations: solution.iterations,
            gap_to_bound,
        });
    }

    /// Compute statistics for each algorithm. Seeded ACO runs are grouped
    /// under a single "ACO" entry.
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<String, Vec<&AlgorithmResult>> = HashMap::new();

        for result in &self.results {
            let family = result
                .algorithm
                .split("-run")
                .next()
                .unwrap_or(&result.algorithm)
                .to_string();
            stats_map.entry(family).or_default().push(result);
        }

        let mut statistics = Vec::new();

        for (algo, results) in stats_map {
            let feasible_results: Vec<_> = results.iter().filter(|r| r.feasible).collect();

            if feasible_results.is_empty() {
                continue;
            }

            let vehicles: Vec<f64> = feasible_results.iter().map(|r| r.vehicles_used as f64).collect();
            let unused: Vec<f64> = feasible_results.iter().map(|r| r.unused_capacity).collect();
            let times: Vec<f64> = feasible_results.iter().map(|r| r.time).collect();

            let std_unused = if unused.len() > 1 { unused.iter().std_dev() } else { 0.0 };

            statistics.push(AlgorithmStatistics {
                algorithm: algo,
                num_runs: results.len(),
                num_feasible: feasible_results.len(),
                avg_vehicles: vehicles.iter().mean(),
                best_vehicles: feasible_results.iter().fold(usize::MAX, |m, r| m.min(r.vehicles_used)),
                worst_vehicles: feasible_results.iter().fold(0, |m, r| m.max(r.vehicles_used)),
                avg_unused: unused.iter().mean(),
                std_unused,
                avg_time: times.iter().mean(),
                total_time: times.iter().sum::<f64>(),
            });
        }

        statistics.sort_by(|a, b| {
            a.avg_vehicles
                .total_cmp(&b.avg_vehicles)
                .then(a.avg_unused.total_cmp(&b.avg_unused))
        });

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        let stats = self.compute_statistics();
        for stat in stats {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write `results.csv`, `statistics.csv` and `report.txt` into the
    /// configured output directory. Returns the report text.
    pub fn export_all(&self) -> SolverResult<String> {
        let dir = Path::new(&self.config.output_dir);
        std::fs::create_dir_all(dir)?;

        self.export_to_csv(dir.join("results.csv"))?;
        self.export_statistics_csv(dir.join("statistics.csv"))?;

        let report = self.generate_report();
        std::fs::write(dir.join("report.txt"), &report)?;
        log::info!("Benchmark output written to {}", dir.display());
        Ok(report)
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("     Fleet Loading Benchmark Report\n");
        report.push_str(&format!(
            "     {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        report.push_str("========================================\n\n");

        let stats = self.compute_statistics();

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(84).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<22} {:>10} {:>10} {:>6} {:>6} {:>12} {:>12}\n",
            "Algorithm", "Feasible", "Avg Veh", "Best", "Worst", "Avg Unused", "Avg Time"
        ));
        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        for stat in &stats {
            report.push_str(&format!(
                "{:<22} {:>10} {:>10.2} {:>6} {:>6} {:>12.2} {:>12.4}\n",
                stat.algorithm,
                format!("{}/{}", stat.num_feasible, stat.num_runs),
                stat.avg_vehicles,
                stat.best_vehicles,
                stat.worst_vehicles,
                stat.avg_unused,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");

        let mut instance_best: HashMap<&str, &AlgorithmResult> = HashMap::new();

        for result in self.results.iter().filter(|r| r.feasible) {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            let better = (result.vehicles_used, result.unused_capacity)
                < (entry.vehicles_used, entry.unused_capacity);
            if better {
                *entry = result;
            }
        }

        let mut names: Vec<&str> = instance_best.keys().copied().collect();
        names.sort();
        for name in names {
            let best = instance_best[name];
            report.push_str(&format!(
                "  {}: {} vehicles, {:.2} unused ({})\n",
                name, best.vehicles_used, best.unused_capacity, best.algorithm
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}

/// Helper function to load JSON instances from a directory
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<FleetInstance> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match FleetInstance::from_json_file(&path) {
                    Ok(instance) => instances.push(instance),
                    Err(e) => log::warn!("Skipping {:?}: {}", path, e),
                }
            }
        }
    }

    // Sort by size
    instances.sort_by_key(|i| i.num_shipments());

    instances
}
