//! Pheromone store over (shipment, vehicle) pairs.

use crate::error::{SolverError, SolverResult};

/// Dense pheromone matrix, row per shipment, column per vehicle.
/// Every entry stays at or above `floor`.
#[derive(Debug, Clone)]
pub struct PheromoneStore {
    values: Vec<f64>,
    num_shipments: usize,
    num_vehicles: usize,
    floor: f64,
}

impl PheromoneStore {
    /// Set every pair to `initial_value`.
    pub fn initialize(num_shipments: usize, num_vehicles: usize, initial_value: f64, floor: f64) -> Self {
        debug_assert!(floor > 0.0 && initial_value >= floor);
        PheromoneStore {
            values: vec![initial_value; num_shipments * num_vehicles],
            num_shipments,
            num_vehicles,
            floor,
        }
    }

    #[inline]
    fn index(&self, shipment: usize, vehicle: usize) -> SolverResult<usize> {
        if shipment < self.num_shipments && vehicle < self.num_vehicles {
            Ok(shipment * self.num_vehicles + vehicle)
        } else {
            Err(SolverError::invariant(format!(
                "pheromone pair ({}, {}) outside {}x{} store",
                shipment, vehicle, self.num_shipments, self.num_vehicles
            )))
        }
    }

    #[inline]
    pub fn get(&self, shipment: usize, vehicle: usize) -> SolverResult<f64> {
        Ok(self.values[self.index(shipment, vehicle)?])
    }

    /// Multiply every entry by `1 - decay_rate`, clamped up to the floor.
    pub fn evaporate(&mut self, decay_rate: f64) {
        debug_assert!((0.0..1.0).contains(&decay_rate));
        let keep = 1.0 - decay_rate;
        let floor = self.floor;
        for value in self.values.iter_mut() {
            *value = (*value * keep).max(floor);
        }
    }

    pub fn deposit(&mut self, shipment: usize, vehicle: usize, amount: f64) -> SolverResult<()> {
        if !(amount >= 0.0 && amount.is_finite()) {
            return Err(SolverError::invariant(format!(
                "pheromone deposit must be a non-negative finite amount, got {}",
                amount
            )));
        }
        let idx = self.index(shipment, vehicle)?;
        self.values[idx] += amount;
        Ok(())
    }

    #[inline]
    pub fn floor(&self) -> f64 {
        self.floor
    }

    pub fn min_value(&self) -> f64 {
        self.values.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().cloned().fold(0.0, f64::max)
    }

    pub fn num_shipments(&self) -> usize {
        self.num_shipments
    }

    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_and_get() {
        let store = PheromoneStore::initialize(3, 2, 1.0, 0.01);
        for s in 0..3 {
            for v in 0..2 {
                assert_eq!(store.get(s, v).unwrap(), 1.0);
            }
        }
        assert!(matches!(store.get(3, 0), Err(SolverError::InvariantViolation { .. })));
        assert!(matches!(store.get(0, 2), Err(SolverError::InvariantViolation { .. })));
    }

    #[test]
    fn test_evaporation_respects_floor() {
        let mut store = PheromoneStore::initialize(2, 2, 1.0, 0.2);
        store.evaporate(0.5);
        assert_eq!(store.get(0, 0).unwrap(), 0.5);

        for _ in 0..20 {
            store.evaporate(0.5);
        }
        assert_eq!(store.min_value(), 0.2);
        assert_eq!(store.max_value(), 0.2);
    }

    #[test]
    fn test_deposit() {
        let mut store = PheromoneStore::initialize(2, 2, 1.0, 0.1);
        store.deposit(1, 0, 0.25).unwrap();
        assert_eq!(store.get(1, 0).unwrap(), 1.25);
        assert_eq!(store.get(0, 1).unwrap(), 1.0);

        assert!(store.deposit(0, 0, -1.0).is_err());
        assert!(store.deposit(0, 0, f64::NAN).is_err());
        assert!(store.deposit(5, 0, 1.0).is_err());
        assert_eq!(store.get(0, 0).unwrap(), 1.0);
    }
}
