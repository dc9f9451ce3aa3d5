//! Ant Colony Optimization for fleet loading.
//!
//! Each iteration spawns `num_ants` independent constructions, keeps the
//! best-so-far solution under the lexicographic cost, then evaporates the
//! pheromone store and deposits along the iteration-best assignment.

use crate::error::{SolverError, SolverResult};
use crate::heuristics::ant::Ant;
use crate::heuristics::pheromone::PheromoneStore;
use crate::instance::{FleetInstance, Shipment, Vehicle};
use crate::solution::{Cost, Solution};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::time::Instant;

/// ACO configuration parameters
#[derive(Debug, Clone)]
pub struct ACOConfig {
    /// Number of ants per iteration
    pub num_ants: usize,
    /// Number of iterations
    pub num_iterations: usize,
    /// Evaporation rate, in [0, 1)
    pub decay: f64,
    /// Pheromone importance (alpha)
    pub alpha: f64,
    /// Heuristic importance (beta)
    pub beta: f64,
    /// Initial pheromone level
    pub initial_pheromone: f64,
    /// Lower bound on every pheromone entry
    pub min_pheromone: f64,
    /// Pheromone deposit factor
    pub q: f64,
    /// Random seed
    pub seed: u64,
    /// Construct the ants of an iteration on the rayon pool
    pub parallel: bool,
    /// Stop after this many iterations without improvement
    pub max_no_improve: Option<usize>,
    /// Time limit in seconds, checked between iterations
    pub time_limit: Option<f64>,
}

impl Default for ACOConfig {
    fn default() -> Self {
        ACOConfig {
            num_ants: 10,
            num_iterations: 100,
            decay: 0.1,
            alpha: 1.0,
            beta: 1.0,
            initial_pheromone: 1.0,
            min_pheromone: 1e-3,
            q: 1.0,
            seed: 42,
            parallel: true,
            max_no_improve: None,
            time_limit: None,
        }
    }
}

impl ACOConfig {
    /// Reject illegal parameter values before any iteration runs.
    pub fn validate(&self) -> SolverResult<()> {
        if self.num_ants == 0 {
            return Err(SolverError::config("num_ants", "must be positive"));
        }
        if !(0.0..1.0).contains(&self.decay) {
            return Err(SolverError::config(
                "decay",
                format!("must lie in [0, 1), got {}", self.decay),
            ));
        }
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(SolverError::config(
                "alpha",
                format!("must be non-negative, got {}", self.alpha),
            ));
        }
        if !(self.beta.is_finite() && self.beta >= 0.0) {
            return Err(SolverError::config(
                "beta",
                format!("must be non-negative, got {}", self.beta),
            ));
        }
        if !(self.initial_pheromone.is_finite() && self.initial_pheromone > 0.0) {
            return Err(SolverError::config(
                "initial_pheromone",
                format!("must be positive, got {}", self.initial_pheromone),
            ));
        }
        if !(self.min_pheromone > 0.0 && self.min_pheromone <= self.initial_pheromone) {
            return Err(SolverError::config(
                "min_pheromone",
                format!(
                    "must lie in (0, initial_pheromone], got {}",
                    self.min_pheromone
                ),
            ));
        }
        if !(self.q.is_finite() && self.q > 0.0) {
            return Err(SolverError::config("q", format!("must be positive, got {}", self.q)));
        }
        Ok(())
    }
}

/// Outcome of one colony iteration
#[derive(Debug, Clone)]
pub struct IterationReport {
    pub iteration: usize,
    /// Ants that completed a feasible assignment
    pub feasible_ants: usize,
    pub iteration_best: Option<Cost>,
    pub best_so_far: Option<Cost>,
    pub improved: bool,
}

/// Ant Colony Optimization solver
pub struct AntColonyOptimization {
    config: ACOConfig,
    instance: FleetInstance,
    pheromone: PheromoneStore,
    best: Option<Solution>,
    history: Vec<Option<Cost>>,
    iteration: usize,
}

impl AntColonyOptimization {
    pub fn new(instance: FleetInstance, config: ACOConfig) -> SolverResult<Self> {
        config.validate()?;

        let pheromone = PheromoneStore::initialize(
            instance.num_shipments(),
            instance.num_vehicles(),
            config.initial_pheromone,
            config.min_pheromone,
        );

        Ok(AntColonyOptimization {
            config,
            instance,
            pheromone,
            best: None,
            history: Vec::new(),
            iteration: 0,
        })
    }

    /// Per-ant generator. The stream depends only on (iteration, ant), so the
    /// result does not depend on thread scheduling.
    fn ant_rng(&self, ant: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        rng.set_stream(((self.iteration as u64) << 32) | ant as u64);
        rng
    }

    fn construct_ant(&self, ant: usize) -> SolverResult<Option<Solution>> {
        let builder = Ant::new(&self.instance, &self.pheromone, self.config.alpha, self.config.beta);
        let mut rng = self.ant_rng(ant);

        match builder.construct(&mut rng) {
            Ok(assignment) => Ok(Some(Solution::from_assignment(&self.instance, assignment, "ACO"))),
            Err(SolverError::InfeasibleAssignment { shipment }) => {
                log::trace!(
                    "iteration {} ant {} discarded: shipment '{}' does not fit",
                    self.iteration,
                    ant,
                    shipment
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Run a single iteration: construct, evaluate, update best-so-far, then
    /// evaporate and deposit.
    pub fn step(&mut self) -> SolverResult<IterationReport> {
        let results: Vec<SolverResult<Option<Solution>>> = if self.config.parallel {
            (0..self.config.num_ants)
                .into_par_iter()
                .map(|ant| self.construct_ant(ant))
                .collect()
        } else {
            (0..self.config.num_ants).map(|ant| self.construct_ant(ant)).collect()
        };

        // Ants are scanned in index order so the earliest wins ties.
        let mut feasible_ants = 0;
        let mut iteration_best: Option<Solution> = None;
        for result in results {
            let Some(solution) = result? else { continue };
            if !solution.feasible {
                return Err(SolverError::invariant(
                    "ant produced an assignment that overloads a vehicle",
                ));
            }
            feasible_ants += 1;
            if iteration_best.as_ref().map_or(true, |b| solution.is_better_than(b)) {
                iteration_best = Some(solution);
            }
        }

        let mut improved = false;
        if let Some(candidate) = &iteration_best {
            if self.best.as_ref().map_or(true, |b| candidate.is_better_than(b)) {
                log::debug!(
                    "iteration {}: new best {}",
                    self.iteration,
                    candidate.cost()
                );
                self.best = Some(candidate.clone());
                improved = true;
            }
        } else {
            log::warn!(
                "iteration {}: all {} ants failed to place every shipment",
                self.iteration,
                self.config.num_ants
            );
        }

        self.pheromone.evaporate(self.config.decay);
        if let Some(solution) = &iteration_best {
            self.deposit(solution)?;
        }

        let report = IterationReport {
            iteration: self.iteration,
            feasible_ants,
            iteration_best: iteration_best.as_ref().map(Solution::cost),
            best_so_far: self.best.as_ref().map(Solution::cost),
            improved,
        };

        self.history.push(report.best_so_far);
        self.iteration += 1;
        Ok(report)
    }

    /// Reinforce every pair of `solution` by `q / (vehicles + unused / used capacity)`.
    /// The denominator preserves the lexicographic cost order.
    fn deposit(&mut self, solution: &Solution) -> SolverResult<()> {
        let used_capacity = solution.used_capacity(&self.instance);
        let slack = if used_capacity > 0.0 {
            solution.unused_capacity / used_capacity
        } else {
            0.0
        };
        let amount = self.config.q / (solution.vehicles_used as f64 + slack);

        for (s, &v) in solution.assignment.iter().enumerate() {
            self.pheromone.deposit(s, v, amount)?;
        }
        Ok(())
    }

    /// Run ACO algorithm
    pub fn run(&mut self) -> SolverResult<Solution> {
        let start = Instant::now();
        log::info!(
            "ACO on '{}': {} shipments, {} vehicles, {} ants x {} iterations",
            self.instance.name,
            self.instance.num_shipments(),
            self.instance.num_vehicles(),
            self.config.num_ants,
            self.config.num_iterations
        );

        let mut no_improve = 0;
        while self.iteration < self.config.num_iterations {
            let report = self.step()?;
            no_improve = if report.improved { 0 } else { no_improve + 1 };

            if self.config.max_no_improve.is_some_and(|limit| no_improve >= limit) {
                log::debug!("stopping after {} iterations without improvement", no_improve);
                break;
            }
            if self
                .config
                .time_limit
                .is_some_and(|limit| start.elapsed().as_secs_f64() >= limit)
            {
                log::debug!("stopping at time limit after {} iterations", self.iteration);
                break;
            }
        }

        let Some(best) = &self.best else {
            log::info!("ACO found no feasible solution in {} iterations", self.iteration);
            return Err(SolverError::NoFeasibleSolution {
                iterations: self.iteration,
            });
        };

        let mut solution = best.clone();
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(self.iteration);
        log::info!(
            "ACO finished: {} in {:.3}s",
            solution.cost(),
            solution.computation_time
        );

        Ok(solution)
    }

    /// Best solution found so far
    pub fn best(&self) -> Option<&Solution> {
        self.best.as_ref()
    }

    /// Best-so-far cost after each completed iteration
    pub fn history(&self) -> &[Option<Cost>] {
        &self.history
    }

    pub fn pheromones(&self) -> &PheromoneStore {
        &self.pheromone
    }

    pub fn instance(&self) -> &FleetInstance {
        &self.instance
    }

    pub fn iterations_done(&self) -> usize {
        self.iteration
    }
}

/// Assign `shipments` to `vehicles` with a fresh colony.
pub fn solve(shipments: &[Shipment], vehicles: &[Vehicle], config: &ACOConfig) -> SolverResult<Solution> {
    config.validate()?;
    let instance = FleetInstance::new("fleet", shipments.to_vec(), vehicles.to_vec())?;
    AntColonyOptimization::new(instance, config.clone())?.run()
}
