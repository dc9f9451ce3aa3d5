//! Probabilistic shipment placement.
//!
//! One `Ant` walks the shipments in instance order and places each on a
//! vehicle drawn by roulette wheel over `tau^alpha * eta^beta`, where `tau` is
//! the pheromone on the pair and `eta` the capacity-fit heuristic. Remaining
//! capacities live in a per-ant scratch array, so ants never share mutable
//! state and can run on separate threads.

use crate::error::{SolverError, SolverResult};
use crate::heuristics::pheromone::PheromoneStore;
use crate::instance::FleetInstance;
use crate::solution::fits;
use rand::prelude::*;

/// Static desirability of placing `demand` into a vehicle with `remaining`
/// capacity. Tighter fits score higher; 0 means the pair is infeasible.
#[inline]
pub fn heuristic(demand: f64, remaining: f64) -> f64 {
    if demand <= remaining {
        remaining / (remaining - demand + 1.0)
    } else {
        0.0
    }
}

/// Per-ant working state, indexed by vehicle
#[derive(Debug, Clone)]
pub struct AntScratch {
    pub remaining: Vec<f64>,
    pub open: Vec<bool>,
    candidates: Vec<(usize, f64)>,
}

impl AntScratch {
    pub fn new(instance: &FleetInstance) -> Self {
        AntScratch {
            remaining: instance.vehicles().iter().map(|v| v.capacity).collect(),
            open: (0..instance.num_vehicles()).map(|v| !instance.is_reserve(v)).collect(),
            candidates: Vec::with_capacity(instance.num_vehicles()),
        }
    }
}

/// Solution constructor for a single colony member
pub struct Ant<'a> {
    instance: &'a FleetInstance,
    pheromone: &'a PheromoneStore,
    alpha: f64,
    beta: f64,
}

impl<'a> Ant<'a> {
    pub fn new(instance: &'a FleetInstance, pheromone: &'a PheromoneStore, alpha: f64, beta: f64) -> Self {
        Ant {
            instance,
            pheromone,
            alpha,
            beta,
        }
    }

    /// Build a complete assignment, or fail with `InfeasibleAssignment` when
    /// some shipment fits in no open vehicle and no reserve vehicle.
    pub fn construct<R: Rng>(&self, rng: &mut R) -> SolverResult<Vec<usize>> {
        let mut scratch = AntScratch::new(self.instance);
        let mut assignment = Vec::with_capacity(self.instance.num_shipments());

        for (s, shipment) in self.instance.shipments().iter().enumerate() {
            self.collect_candidates(s, shipment.demand, &mut scratch)?;

            let vehicle = if scratch.candidates.is_empty() {
                self.open_reserve(shipment.demand, &mut scratch)
                    .ok_or_else(|| SolverError::InfeasibleAssignment {
                        shipment: shipment.id.clone(),
                    })?
            } else {
                select(&scratch.candidates, rng)
            };

            scratch.remaining[vehicle] -= shipment.demand;
            assignment.push(vehicle);
        }

        Ok(assignment)
    }

    /// Feasible open vehicles with their selection weights
    fn collect_candidates(&self, shipment: usize, demand: f64, scratch: &mut AntScratch) -> SolverResult<()> {
        scratch.candidates.clear();

        let vehicles = self.instance.vehicles();
        for v in 0..vehicles.len() {
            let remaining = scratch.remaining[v];
            if !scratch.open[v] || !fits(demand, remaining, vehicles[v].capacity) {
                continue;
            }

            // An exact fit may sit a rounding error below `demand`.
            let tau = self.pheromone.get(shipment, v)?.powf(self.alpha);
            let eta = heuristic(demand, remaining.max(demand)).powf(self.beta);
            scratch.candidates.push((v, tau * eta));
        }

        Ok(())
    }

    /// Open the first closed reserve vehicle able to carry `demand`.
    fn open_reserve(&self, demand: f64, scratch: &mut AntScratch) -> Option<usize> {
        let vehicles = self.instance.vehicles();
        let v = (self.instance.num_primary()..vehicles.len())
            .find(|&v| !scratch.open[v] && fits(demand, scratch.remaining[v], vehicles[v].capacity))?;
        scratch.open[v] = true;
        Some(v)
    }
}

/// Roulette wheel over the candidate weights. Zero-weight candidates are never
/// drawn unless every weight overflows or underflows, in which case the draw
/// is uniform.
fn select<R: Rng>(candidates: &[(usize, f64)], rng: &mut R) -> usize {
    let total: f64 = candidates.iter().map(|&(_, w)| w).sum();

    if !(total.is_finite() && total > 0.0) {
        return candidates[rng.gen_range(0..candidates.len())].0;
    }

    let mut pick = rng.gen::<f64>() * total;
    for &(v, weight) in candidates {
        pick -= weight;
        if pick < 0.0 {
            return v;
        }
    }

    // Rounding left `pick` at or above zero: take the last weighted candidate.
    candidates
        .iter()
        .rev()
        .find(|&&(_, w)| w > 0.0)
        .map_or(candidates[candidates.len() - 1].0, |&(v, _)| v)
}
