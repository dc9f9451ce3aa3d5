//! Problem model for fleet loading.
//!
//! A `FleetInstance` is an ordered list of shipments and an ordered list of
//! vehicles. Vehicles are split into a primary fleet, which every ant may use,
//! and a reserve pool that is only opened when no open vehicle can carry a
//! shipment. Instances are validated once on construction and never mutated.

use crate::error::{SolverError, SolverResult};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A shipment to be loaded onto exactly one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    /// Stable identifier (air waybill number in the source records)
    #[serde(alias = "awb", deserialize_with = "deserialize_id")]
    pub id: String,
    /// Capacity consumed on the vehicle
    #[serde(alias = "capacity")]
    pub demand: f64,
}

impl Shipment {
    pub fn new(id: impl Into<String>, demand: f64) -> Self {
        Shipment { id: id.into(), demand }
    }
}

/// A vehicle with a fixed capacity limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub capacity: f64,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, capacity: f64) -> Self {
        Vehicle { id: id.into(), capacity }
    }
}

/// Source records carry numeric ids; accept both numbers and strings.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// On-disk JSON layout of an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InstanceFile {
    #[serde(default)]
    name: String,
    shipments: Vec<Shipment>,
    vehicles: Vec<Vehicle>,
    #[serde(default)]
    reserve: Vec<Vehicle>,
}

#[derive(Debug, Deserialize)]
struct ShipmentRow {
    #[serde(alias = "awb")]
    id: String,
    #[serde(alias = "capacity")]
    demand: f64,
}

#[derive(Debug, Deserialize)]
struct VehicleRow {
    id: String,
    capacity: f64,
    #[serde(default)]
    reserve: bool,
}

/// A validated, immutable fleet loading instance
#[derive(Debug, Clone)]
pub struct FleetInstance {
    pub name: String,
    shipments: Vec<Shipment>,
    /// Primary vehicles first, then reserve vehicles
    vehicles: Vec<Vehicle>,
    num_primary: usize,
}

impl FleetInstance {
    /// Build an instance with no reserve pool.
    pub fn new(
        name: impl Into<String>,
        shipments: Vec<Shipment>,
        vehicles: Vec<Vehicle>,
    ) -> SolverResult<Self> {
        let num_primary = vehicles.len();
        let instance = FleetInstance {
            name: name.into(),
            shipments,
            vehicles,
            num_primary,
        };
        instance.check()?;
        Ok(instance)
    }

    /// Attach a reserve pool, opened by ants only when no open vehicle fits.
    pub fn with_reserve(mut self, reserve: Vec<Vehicle>) -> SolverResult<Self> {
        self.vehicles.truncate(self.num_primary);
        self.vehicles.extend(reserve);
        self.check()?;
        Ok(self)
    }

    fn check(&self) -> SolverResult<()> {
        if self.shipments.is_empty() {
            return Err(SolverError::invalid_input("instance has no shipments"));
        }
        if self.num_primary == 0 {
            return Err(SolverError::invalid_input("instance has no primary vehicles"));
        }

        let mut seen = HashSet::new();
        for s in &self.shipments {
            if !(s.demand.is_finite() && s.demand > 0.0) {
                return Err(SolverError::invalid_input(format!(
                    "shipment '{}' has non-positive demand {}",
                    s.id, s.demand
                )));
            }
            if !seen.insert(s.id.as_str()) {
                return Err(SolverError::invalid_input(format!(
                    "duplicate shipment id '{}'",
                    s.id
                )));
            }
        }

        let mut seen = HashSet::new();
        for v in &self.vehicles {
            if !(v.capacity.is_finite() && v.capacity > 0.0) {
                return Err(SolverError::invalid_input(format!(
                    "vehicle '{}' has non-positive capacity {}",
                    v.id, v.capacity
                )));
            }
            if !seen.insert(v.id.as_str()) {
                return Err(SolverError::invalid_input(format!(
                    "duplicate vehicle id '{}'",
                    v.id
                )));
            }
        }

        Ok(())
    }

    /// Load an instance from a JSON file with `shipments`, `vehicles` and an
    /// optional `reserve` array.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> SolverResult<Self> {
        let file = File::open(&path)?;
        let raw: InstanceFile = serde_json::from_reader(BufReader::new(file))?;

        let name = if raw.name.is_empty() {
            path.as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        } else {
            raw.name
        };

        FleetInstance::new(name, raw.shipments, raw.vehicles)?.with_reserve(raw.reserve)
    }

    /// Load an instance from two CSV files. The vehicle file may carry a
    /// boolean `reserve` column.
    pub fn from_csv_files<P: AsRef<Path>>(shipments_path: P, vehicles_path: P) -> SolverResult<Self> {
        let mut reader = csv::Reader::from_path(&shipments_path)?;
        let mut shipments = Vec::new();
        for row in reader.deserialize() {
            let row: ShipmentRow = row?;
            shipments.push(Shipment::new(row.id, row.demand));
        }

        let mut reader = csv::Reader::from_path(&vehicles_path)?;
        let mut vehicles = Vec::new();
        let mut reserve = Vec::new();
        for row in reader.deserialize() {
            let row: VehicleRow = row?;
            let vehicle = Vehicle::new(row.id, row.capacity);
            if row.reserve {
                reserve.push(vehicle);
            } else {
                vehicles.push(vehicle);
            }
        }

        let name = shipments_path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        FleetInstance::new(name, shipments, vehicles)?.with_reserve(reserve)
    }

    /// Write the instance in the layout read by `from_json_file`.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> SolverResult<()> {
        let raw = InstanceFile {
            name: self.name.clone(),
            shipments: self.shipments.clone(),
            vehicles: self.vehicles[..self.num_primary].to_vec(),
            reserve: self.vehicles[self.num_primary..].to_vec(),
        };
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &raw)?;
        Ok(())
    }

    /// Random instance with integer demands drawn uniformly in `1..=max_demand`.
    /// Deterministic via seed.
    pub fn random(
        seed: u64,
        num_shipments: usize,
        max_demand: u32,
        capacities: &[f64],
    ) -> SolverResult<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let upper = max_demand.max(1);

        let shipments = (1..=num_shipments)
            .map(|i| Shipment::new(i.to_string(), rng.gen_range(1..=upper) as f64))
            .collect();
        let vehicles = capacities
            .iter()
            .enumerate()
            .map(|(i, &c)| Vehicle::new(format!("V{}", i + 1), c))
            .collect();

        FleetInstance::new(format!("random-{}-{}", num_shipments, seed), shipments, vehicles)
    }

    /// Shipments in processing order
    #[inline]
    pub fn shipments(&self) -> &[Shipment] {
        &self.shipments
    }

    /// All vehicles, primary fleet first then reserve pool
    #[inline]
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    #[inline]
    pub fn num_shipments(&self) -> usize {
        self.shipments.len()
    }

    #[inline]
    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    #[inline]
    pub fn num_primary(&self) -> usize {
        self.num_primary
    }

    #[inline]
    pub fn is_reserve(&self, vehicle: usize) -> bool {
        vehicle >= self.num_primary
    }

    pub fn total_demand(&self) -> f64 {
        self.shipments.iter().map(|s| s.demand).sum()
    }

    pub fn total_capacity(&self) -> f64 {
        self.vehicles.iter().map(|v| v.capacity).sum()
    }

    /// Fewest vehicles whose combined capacity covers the total demand,
    /// taking the largest vehicles first. `None` if the whole fleet is too small.
    pub fn vehicle_lower_bound(&self) -> Option<usize> {
        let mut capacities: Vec<f64> = self.vehicles.iter().map(|v| v.capacity).collect();
        capacities.sort_by(|a, b| b.total_cmp(a));

        let demand = self.total_demand();
        let mut covered = 0.0;
        for (i, c) in capacities.iter().enumerate() {
            covered += c;
            if covered >= demand {
                return Some(i + 1);
            }
        }
        None
    }

    pub fn statistics(&self) -> InstanceStatistics {
        let demands: Vec<f64> = self.shipments.iter().map(|s| s.demand).collect();
        let max_capacity = self.vehicles.iter().map(|v| v.capacity).fold(0.0, f64::max);
        let max_demand = demands.iter().cloned().fold(0.0, f64::max);

        InstanceStatistics {
            name: self.name.clone(),
            num_shipments: self.num_shipments(),
            num_vehicles: self.num_primary,
            num_reserve: self.num_vehicles() - self.num_primary,
            total_demand: self.total_demand(),
            total_capacity: self.total_capacity(),
            avg_demand: self.total_demand() / demands.len() as f64,
            min_demand: demands.iter().cloned().fold(f64::INFINITY, f64::min),
            max_demand,
            max_capacity,
            oversized_shipments: demands.iter().filter(|&&d| d > max_capacity).count(),
            vehicle_lower_bound: self.vehicle_lower_bound(),
        }
    }
}

/// Statistics about a fleet loading instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_shipments: usize,
    pub num_vehicles: usize,
    pub num_reserve: usize,
    pub total_demand: f64,
    pub total_capacity: f64,
    pub avg_demand: f64,
    pub min_demand: f64,
    pub max_demand: f64,
    pub max_capacity: f64,
    /// Shipments larger than every vehicle
    pub oversized_shipments: usize,
    pub vehicle_lower_bound: Option<usize>,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Shipments: {}", self.num_shipments)?;
        writeln!(f, "  Vehicles: {} (+{} reserve)", self.num_vehicles, self.num_reserve)?;
        writeln!(f, "  Total demand: {:.2}", self.total_demand)?;
        writeln!(f, "  Total capacity: {:.2}", self.total_capacity)?;
        writeln!(
            f,
            "  Demand min/avg/max: {:.2} / {:.2} / {:.2}",
            self.min_demand, self.avg_demand, self.max_demand
        )?;
        writeln!(f, "  Largest vehicle: {:.2}", self.max_capacity)?;
        writeln!(f, "  Oversized shipments: {}", self.oversized_shipments)?;
        match self.vehicle_lower_bound {
            Some(lb) => writeln!(f, "  Vehicle lower bound: {}", lb),
            None => writeln!(f, "  Vehicle lower bound: fleet too small"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet(capacities: &[f64]) -> Vec<Vehicle> {
        capacities
            .iter()
            .enumerate()
            .map(|(i, &c)| Vehicle::new(format!("V{}", i + 1), c))
            .collect()
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let err = FleetInstance::new("t", vec![Shipment::new("S1", 0.0)], fleet(&[10.0]));
        assert!(matches!(err, Err(SolverError::InvalidInput { .. })));

        let err = FleetInstance::new("t", vec![Shipment::new("S1", 5.0)], fleet(&[-1.0]));
        assert!(matches!(err, Err(SolverError::InvalidInput { .. })));

        let err = FleetInstance::new("t", vec![Shipment::new("S1", f64::NAN)], fleet(&[10.0]));
        assert!(matches!(err, Err(SolverError::InvalidInput { .. })));
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        let shipments = vec![Shipment::new("S1", 1.0), Shipment::new("S1", 2.0)];
        assert!(FleetInstance::new("t", shipments, fleet(&[10.0])).is_err());
        assert!(FleetInstance::new("t", Vec::new(), fleet(&[10.0])).is_err());
        assert!(FleetInstance::new("t", vec![Shipment::new("S1", 1.0)], Vec::new()).is_err());

        let instance = FleetInstance::new("t", vec![Shipment::new("S1", 1.0)], fleet(&[10.0])).unwrap();
        assert!(instance.with_reserve(fleet(&[5.0])).is_err());
    }

    #[test]
    fn test_reserve_indexing() {
        let instance = FleetInstance::new("t", vec![Shipment::new("S1", 1.0)], fleet(&[10.0, 20.0]))
            .unwrap()
            .with_reserve(vec![Vehicle::new("R1", 50.0)])
            .unwrap();

        assert_eq!(instance.num_vehicles(), 3);
        assert_eq!(instance.num_primary(), 2);
        assert!(!instance.is_reserve(1));
        assert!(instance.is_reserve(2));
        assert_eq!(instance.vehicles()[2].id, "R1");
    }

    #[test]
    fn test_vehicle_lower_bound() {
        let shipments = vec![Shipment::new("S1", 60.0), Shipment::new("S2", 60.0)];
        let instance = FleetInstance::new("t", shipments, fleet(&[50.0, 100.0, 30.0])).unwrap();
        assert_eq!(instance.vehicle_lower_bound(), Some(2));

        let shipments = vec![Shipment::new("S1", 500.0)];
        let instance = FleetInstance::new("t", shipments, fleet(&[50.0, 100.0])).unwrap();
        assert_eq!(instance.vehicle_lower_bound(), None);
        assert_eq!(instance.statistics().oversized_shipments, 1);
    }

    #[test]
    fn test_random_is_deterministic() {
        let a = FleetInstance::random(7, 20, 100, &[500.0, 510.0, 600.0]).unwrap();
        let b = FleetInstance::random(7, 20, 100, &[500.0, 510.0, 600.0]).unwrap();
        assert_eq!(a.shipments(), b.shipments());
        assert!(a.shipments().iter().all(|s| s.demand >= 1.0 && s.demand <= 100.0));
    }

    #[test]
    fn test_json_accepts_source_record_shape() {
        let raw = r#"{
            "shipments": [{"awb": 1, "capacity": 500}, {"awb": 2, "capacity": 300}],
            "vehicles": [{"id": 1, "capacity": 1000}],
            "reserve": [{"id": "R", "capacity": 800}]
        }"#;
        let file: InstanceFile = serde_json::from_str(raw).unwrap();
        assert_eq!(file.shipments[0].id, "1");
        assert_eq!(file.shipments[1].demand, 300.0);
        assert_eq!(file.vehicles[0].id, "1");
        assert_eq!(file.reserve[0].id, "R");
    }

    fn scratch_path(file: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("fleet-aco-{}-{}", std::process::id(), file))
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = scratch_path("round-trip.json");
        let instance = FleetInstance::random(4, 12, 80, &[300.0, 250.0])
            .unwrap()
            .with_reserve(vec![Vehicle::new("R1", 400.0)])
            .unwrap();

        instance.to_json_file(&path).unwrap();
        let loaded = FleetInstance::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.name, instance.name);
        assert_eq!(loaded.shipments(), instance.shipments());
        assert_eq!(loaded.vehicles(), instance.vehicles());
        assert_eq!(loaded.num_primary(), 2);
        assert!(loaded.is_reserve(2));
    }

    #[test]
    fn test_json_name_falls_back_to_file_stem() {
        let path = scratch_path("unnamed.json");
        std::fs::write(
            &path,
            r#"{"shipments": [{"awb": 1, "capacity": 5}], "vehicles": [{"id": 1, "capacity": 10}]}"#,
        )
        .unwrap();

        let loaded = FleetInstance::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.name, format!("fleet-aco-{}-unnamed", std::process::id()));
        assert_eq!(loaded.num_vehicles(), 1);
        assert_eq!(loaded.num_primary(), 1);
    }

    #[test]
    fn test_sample_files_load() {
        let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");

        let instance = FleetInstance::from_csv_files(data.join("shipments.csv"), data.join("vehicles.csv")).unwrap();
        assert_eq!(instance.name, "shipments");
        assert_eq!(instance.num_shipments(), 6);
        assert_eq!(instance.num_primary(), 2);
        assert_eq!(instance.num_vehicles(), 3);
        assert_eq!(instance.vehicles()[2].id, "R1");
        assert!(instance.is_reserve(2));
        assert_eq!(instance.total_demand(), 1040.0);

        let instance = FleetInstance::from_json_file(data.join("sample.json")).unwrap();
        assert_eq!(instance.name, "sample");
        assert_eq!(instance.shipments()[0].id, "1");
        assert_eq!(instance.total_demand(), 1000.0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = FleetInstance::from_json_file(scratch_path("does-not-exist.json"));
        assert!(matches!(err, Err(SolverError::Io(_))));
    }
}
