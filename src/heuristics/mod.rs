//! Heuristics module for fleet loading.
//! 
//! This module exports the ant colony and the constructive baselines.

pub mod pheromone;
pub mod ant;
pub mod aco;
pub mod construction;

pub use pheromone::*;
pub use ant::*;
pub use aco::*;
pub use construction::*;
