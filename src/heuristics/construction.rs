//! Deterministic constructive baselines.
//!
//! Both heuristics sort shipments by decreasing demand. A new vehicle is opened
//! only when no open vehicle can take the shipment: primary vehicles largest
//! first, then the reserve pool in instance order.

use crate::instance::FleetInstance;
use crate::solution::{fits, Solution};
use ordered_float::OrderedFloat;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &FleetInstance) -> Solution;
    fn name(&self) -> &str;
}

/// Marks a shipment no vehicle could take. The resulting solution is infeasible.
const UNASSIGNED: usize = usize::MAX;

/// Which open vehicle receives a shipment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FitRule {
    First,
    Best,
}

struct Packing<'a> {
    instance: &'a FleetInstance,
    remaining: Vec<f64>,
    /// Open vehicles in opening order
    open: Vec<usize>,
    /// Closed vehicles in opening priority
    closed: Vec<usize>,
}

impl<'a> Packing<'a> {
    fn new(instance: &'a FleetInstance) -> Self {
        let mut primary: Vec<usize> = (0..instance.num_primary()).collect();
        primary.sort_by_key(|&v| std::cmp::Reverse(OrderedFloat(instance.vehicles()[v].capacity)));

        let closed = primary
            .into_iter()
            .chain(instance.num_primary()..instance.num_vehicles())
            .collect();

        Packing {
            instance,
            remaining: instance.vehicles().iter().map(|v| v.capacity).collect(),
            open: Vec::new(),
            closed,
        }
    }

    fn has_room(&self, v: usize, demand: f64) -> bool {
        fits(demand, self.remaining[v], self.instance.vehicles()[v].capacity)
    }

    fn choose(&self, demand: f64, rule: FitRule) -> Option<usize> {
        let mut fitting = self.open.iter().copied().filter(|&v| self.has_room(v, demand));
        match rule {
            FitRule::First => fitting.next(),
            FitRule::Best => fitting.min_by_key(|&v| OrderedFloat(self.remaining[v] - demand)),
        }
    }

    fn open_vehicle(&mut self, demand: f64) -> Option<usize> {
        let pos = self.closed.iter().position(|&v| self.has_room(v, demand))?;
        let v = self.closed.remove(pos);
        self.open.push(v);
        Some(v)
    }

    fn pack(mut self, rule: FitRule) -> Vec<usize> {
        let instance = self.instance;
        let shipments = instance.shipments();
        let mut order: Vec<usize> = (0..shipments.len()).collect();
        order.sort_by_key(|&s| std::cmp::Reverse(OrderedFloat(shipments[s].demand)));

        let mut assignment = vec![UNASSIGNED; shipments.len()];
        for s in order {
            let demand = shipments[s].demand;
            let chosen = self.choose(demand, rule).or_else(|| self.open_vehicle(demand));
            if let Some(v) = chosen {
                self.remaining[v] -= demand;
                assignment[s] = v;
            } else {
                log::debug!("shipment '{}' fits no vehicle", shipments[s].id);
            }
        }
        assignment
    }
}

fn finish(instance: &FleetInstance, assignment: Vec<usize>, name: &str, start: std::time::Instant) -> Solution {
    let mut solution = Solution::from_assignment(instance, assignment, name);
    solution.computation_time = start.elapsed().as_secs_f64();
    if !solution.is_complete(instance) {
        log::warn!("{} left shipments unassigned on '{}'", name, instance.name);
    }
    solution
}

/// First-Fit Decreasing: first open vehicle with room
pub struct FirstFitDecreasing;

impl FirstFitDecreasing {
    pub fn new() -> Self {
        FirstFitDecreasing
    }
}

impl Default for FirstFitDecreasing {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for FirstFitDecreasing {
    fn construct(&self, instance: &FleetInstance) -> Solution {
        let start = std::time::Instant::now();
        let assignment = Packing::new(instance).pack(FitRule::First);
        finish(instance, assignment, self.name(), start)
    }

    fn name(&self) -> &str {
        "FirstFitDecreasing"
    }
}

/// Best-Fit Decreasing: open vehicle left with the least room
pub struct BestFitDecreasing;

impl BestFitDecreasing {
    pub fn new() -> Self {
        BestFitDecreasing
    }
}

impl Default for BestFitDecreasing {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for BestFitDecreasing {
    fn construct(&self, instance: &FleetInstance) -> Solution {
        let start = std::time::Instant::now();
        let assignment = Packing::new(instance).pack(FitRule::Best);
        finish(instance, assignment, self.name(), start)
    }

    fn name(&self) -> &str {
        "BestFitDecreasing"
    }
}
