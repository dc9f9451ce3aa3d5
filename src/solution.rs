//! Solution representation and evaluation for fleet loading.
//!
//! A solution maps every shipment to exactly one vehicle. It is ranked by
//! `Cost`: fewer vehicles used first, then less unused capacity on the
//! vehicles that are used.

use crate::instance::FleetInstance;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Relative slack when comparing summed loads against capacity.
pub const CAPACITY_TOLERANCE: f64 = 1e-9;

/// Whether `demand` fits into a vehicle of `capacity` with `remaining` room
/// left. Uses the same slack as `Solution::validate`, so a running remainder
/// that drifted below an exact fit still accepts it.
#[inline]
pub fn fits(demand: f64, remaining: f64, capacity: f64) -> bool {
    remaining + CAPACITY_TOLERANCE * capacity >= demand
}

/// Lexicographic cost of a solution. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cost {
    pub vehicles_used: usize,
    pub unused_capacity: OrderedFloat<f64>,
}

impl Cost {
    pub fn new(vehicles_used: usize, unused_capacity: f64) -> Self {
        Cost {
            vehicles_used,
            unused_capacity: OrderedFloat(unused_capacity),
        }
    }
}

impl std::fmt::Display for Cost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} vehicles, {:.2} unused",
            self.vehicles_used, self.unused_capacity.0
        )
    }
}

/// Represents a complete assignment of shipments to vehicles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Vehicle index for every shipment, in instance order
    pub assignment: Vec<usize>,
    /// Load carried by every vehicle, in instance order
    pub loads: Vec<f64>,
    /// Vehicles carrying at least one shipment
    pub vehicles_used: usize,
    /// Sum of `capacity - load` over used vehicles
    pub unused_capacity: f64,
    /// Whether every shipment is placed and no vehicle is overloaded
    pub feasible: bool,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            assignment: Vec::new(),
            loads: Vec::new(),
            vehicles_used: 0,
            unused_capacity: f64::INFINITY,
            feasible: false,
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Evaluate an assignment against the instance.
    pub fn from_assignment(instance: &FleetInstance, assignment: Vec<usize>, algorithm: &str) -> Self {
        let mut solution = Solution {
            assignment,
            algorithm: algorithm.to_string(),
            ..Solution::new()
        };
        solution.validate(instance);
        solution
    }

    /// Recompute loads and metrics from the assignment
    pub fn validate(&mut self, instance: &FleetInstance) {
        let vehicles = instance.vehicles();
        let mut loads = vec![0.0; vehicles.len()];
        let mut in_range = self.assignment.len() == instance.num_shipments();

        for (shipment, &v) in instance.shipments().iter().zip(&self.assignment) {
            match loads.get_mut(v) {
                Some(load) => *load += shipment.demand,
                None => in_range = false,
            }
        }

        let mut vehicles_used = 0;
        let mut unused_capacity = 0.0;
        let mut overloaded = false;
        for (vehicle, &load) in vehicles.iter().zip(&loads) {
            if load > 0.0 {
                vehicles_used += 1;
                unused_capacity += vehicle.capacity - load;
                overloaded |= load > vehicle.capacity * (1.0 + CAPACITY_TOLERANCE);
            }
        }

        self.loads = loads;
        self.vehicles_used = vehicles_used;
        self.unused_capacity = unused_capacity;
        self.feasible = in_range && !overloaded;
    }

    pub fn cost(&self) -> Cost {
        Cost::new(self.vehicles_used, self.unused_capacity)
    }

    /// Strict comparison under the lexicographic cost. Infeasible solutions
    /// never beat feasible ones.
    pub fn is_better_than(&self, other: &Solution) -> bool {
        match (self.feasible, other.feasible) {
            (true, false) => true,
            (false, true) => false,
            _ => self.cost() < other.cost(),
        }
    }

    /// Every shipment assigned to a known vehicle
    pub fn is_complete(&self, instance: &FleetInstance) -> bool {
        self.assignment.len() == instance.num_shipments()
            && self.assignment.iter().all(|&v| v < instance.num_vehicles())
    }

    /// Capacity of the used vehicles
    pub fn used_capacity(&self, instance: &FleetInstance) -> f64 {
        instance
            .vehicles()
            .iter()
            .zip(&self.loads)
            .filter(|(_, &load)| load > 0.0)
            .map(|(v, _)| v.capacity)
            .sum()
    }

    /// Fraction of the used vehicles' capacity that is actually loaded
    pub fn utilization(&self, instance: &FleetInstance) -> f64 {
        let capacity = self.used_capacity(instance);
        if capacity > 0.0 {
            (capacity - self.unused_capacity) / capacity
        } else {
            0.0
        }
    }

    /// Per-vehicle loading plan, used vehicles only
    pub fn vehicle_loads(&self, instance: &FleetInstance) -> Vec<VehicleLoad> {
        let mut plan: Vec<VehicleLoad> = instance
            .vehicles()
            .iter()
            .enumerate()
            .map(|(v, vehicle)| VehicleLoad {
                vehicle_id: vehicle.id.clone(),
                capacity: vehicle.capacity,
                reserve: instance.is_reserve(v),
                load: self.loads.get(v).copied().unwrap_or(0.0),
                shipments: Vec::new(),
            })
            .collect();

        for (shipment, &v) in instance.shipments().iter().zip(&self.assignment) {
            if let Some(entry) = plan.get_mut(v) {
                entry.shipments.push(shipment.id.clone());
            }
        }

        plan.retain(|entry| !entry.shipments.is_empty());
        plan
    }

    /// Human-readable loading configuration
    pub fn report(&self, instance: &FleetInstance) -> String {
        let mut report = String::new();
        report.push_str("Truck Loading Configuration:\n");

        for entry in self.vehicle_loads(instance) {
            let tag = if entry.reserve { " [reserve]" } else { "" };
            report.push_str(&format!(
                "Vehicle {}{} (Capacity: {:.2}):\n",
                entry.vehicle_id, tag, entry.capacity
            ));
            for id in &entry.shipments {
                report.push_str(&format!("  - Shipment {}\n", id));
            }
            report.push_str(&format!("  Used Capacity: {:.2}\n", entry.load));
            report.push_str(&format!("  Remaining Capacity: {:.2}\n", entry.remaining()));
            report.push_str("----\n");
        }

        report
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Vehicles used: {}", self.vehicles_used)?;
        writeln!(f, "  Unused capacity: {:.2}", self.unused_capacity)?;
        writeln!(f, "  Feasible: {}", self.feasible)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Assignment: {:?}", self.assignment)
    }
}

/// One vehicle of a loading plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleLoad {
    pub vehicle_id: String,
    pub capacity: f64,
    pub reserve: bool,
    pub load: f64,
    pub shipments: Vec<String>,
}

impl VehicleLoad {
    pub fn remaining(&self) -> f64 {
        self.capacity - self.load
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Shipment, Vehicle};

    fn create_test_instance() -> FleetInstance {
        FleetInstance::new(
            "test",
            vec![Shipment::new("S1", 10.0), Shipment::new("S2", 20.0), Shipment::new("S3", 40.0)],
            vec![Vehicle::new("V1", 100.0), Vehicle::new("V2", 50.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_solution_creation() {
        let sol = Solution::new();
        assert!(sol.assignment.is_empty());
        assert!(!sol.feasible);
        assert_eq!(sol.unused_capacity, f64::INFINITY);
    }

    #[test]
    fn test_evaluation() {
        let instance = create_test_instance();
        let sol = Solution::from_assignment(&instance, vec![0, 0, 1], "test");

        assert!(sol.feasible);
        assert_eq!(sol.loads, vec![30.0, 40.0]);
        assert_eq!(sol.vehicles_used, 2);
        assert_eq!(sol.unused_capacity, 80.0);
        assert!(sol.is_complete(&instance));
    }

    #[test]
    fn test_overload_is_infeasible() {
        let instance = create_test_instance();
        let sol = Solution::from_assignment(&instance, vec![1, 1, 1], "test");
        assert!(!sol.feasible);

        let sol = Solution::from_assignment(&instance, vec![0, 0], "test");
        assert!(!sol.feasible);

        let sol = Solution::from_assignment(&instance, vec![0, 0, 7], "test");
        assert!(!sol.feasible);
        assert!(!sol.is_complete(&instance));
    }

    #[test]
    fn test_cost_ordering() {
        assert!(Cost::new(1, 500.0) < Cost::new(2, 0.0));
        assert!(Cost::new(2, 10.0) < Cost::new(2, 20.0));
        assert_eq!(Cost::new(2, 10.0), Cost::new(2, 10.0));

        let instance = create_test_instance();
        let one = Solution::from_assignment(&instance, vec![0, 0, 0], "test");
        let two = Solution::from_assignment(&instance, vec![0, 0, 1], "test");
        assert!(one.is_better_than(&two));
        assert!(!two.is_better_than(&one));
        assert!(!one.is_better_than(&one.clone()));
    }

    #[test]
    fn test_vehicle_loads_report() {
        let instance = create_test_instance();
        let sol = Solution::from_assignment(&instance, vec![0, 0, 0], "test");
        let plan = sol.vehicle_loads(&instance);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].vehicle_id, "V1");
        assert_eq!(plan[0].shipments, vec!["S1", "S2", "S3"]);
        assert_eq!(plan[0].remaining(), 30.0);
        assert!((sol.utilization(&instance) - 0.7).abs() < 1e-12);
        assert!(sol.report(&instance).contains("Remaining Capacity: 30.00"));
    }

    #[test]
    fn test_fits_matches_validate() {
        let remaining = 1.0 - 0.1 - 0.8;
        assert!(remaining < 0.1);
        assert!(fits(0.1, remaining, 1.0));
        assert!(!fits(0.2, remaining, 1.0));

        let instance = FleetInstance::new(
            "exact",
            vec![Shipment::new("S1", 0.1), Shipment::new("S2", 0.8), Shipment::new("S3", 0.1)],
            vec![Vehicle::new("V1", 1.0)],
        )
        .unwrap();
        assert!(Solution::from_assignment(&instance, vec![0, 0, 0], "test").feasible);
    }
}
