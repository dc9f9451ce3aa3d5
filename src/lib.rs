//! Fleet loading with Ant Colony Optimization
//! 
//! Assigns shipments to capacity-constrained vehicles, minimising the number
//! of vehicles used and, among equal counts, the unused capacity left on them.
//! 
//! # Features
//! 
//! - Ant Colony Optimization with pheromone floor and parallel ant construction
//! - Reserve vehicles opened only when the primary fleet cannot carry a shipment
//! - First-Fit and Best-Fit Decreasing baselines
//! - JSON/CSV loaders, random instances, benchmarking
//! 
//! # Example
//! 
//! ```no_run
//! use fleet_aco::instance::{Shipment, Vehicle};
//! use fleet_aco::heuristics::aco::{solve, ACOConfig};
//! 
//! let shipments = vec![Shipment::new("S1", 10.0), Shipment::new("S2", 20.0)];
//! let vehicles = vec![Vehicle::new("V1", 100.0), Vehicle::new("V2", 150.0)];
//! 
//! let config = ACOConfig {
//!     num_ants: 5,
//!     num_iterations: 10,
//!     ..Default::default()
//! };
//! let solution = solve(&shipments, &vehicles, &config).unwrap();
//! 
//! println!("Vehicles used: {}", solution.vehicles_used);
//! ```

pub mod error;
pub mod instance;
pub mod solution;
pub mod heuristics;
pub mod benchmark;

pub use error::{SolverError, SolverResult};
pub use heuristics::aco::{solve, ACOConfig, AntColonyOptimization};
pub use instance::{FleetInstance, Shipment, Vehicle};
pub use solution::{Cost, Solution};
