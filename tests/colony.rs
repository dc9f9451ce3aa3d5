use fleet_aco::heuristics::aco::{solve, ACOConfig, AntColonyOptimization};
use fleet_aco::heuristics::construction::{BestFitDecreasing, ConstructionHeuristic, FirstFitDecreasing};
use fleet_aco::instance::{FleetInstance, Shipment, Vehicle};
use fleet_aco::solution::Cost;
use fleet_aco::SolverError;

fn shipments(demands: &[f64]) -> Vec<Shipment> {
    demands
        .iter()
        .enumerate()
        .map(|(i, &d)| Shipment::new(format!("S{}", i + 1), d))
        .collect()
}

fn vehicles(capacities: &[f64]) -> Vec<Vehicle> {
    capacities
        .iter()
        .enumerate()
        .map(|(i, &c)| Vehicle::new(format!("V{}", i + 1), c))
        .collect()
}

fn small_config() -> ACOConfig {
    ACOConfig {
        num_ants: 5,
        num_iterations: 10,
        decay: 0.1,
        alpha: 1.0,
        beta: 1.0,
        ..Default::default()
    }
}

#[test]
fn two_small_shipments_share_one_vehicle() {
    let solution = solve(&shipments(&[10.0, 20.0]), &vehicles(&[100.0, 150.0]), &small_config()).unwrap();

    assert!(solution.feasible);
    assert_eq!(solution.vehicles_used, 1);
    assert!(solution.unused_capacity == 70.0 || solution.unused_capacity == 120.0);
}

#[test]
fn demand_above_largest_vehicle_uses_exactly_two() {
    let config = ACOConfig {
        num_ants: 10,
        num_iterations: 30,
        ..small_config()
    };
    let solution = solve(&shipments(&[60.0, 50.0, 40.0]), &vehicles(&[100.0, 100.0, 100.0]), &config).unwrap();

    assert!(solution.feasible);
    assert_eq!(solution.vehicles_used, 2);
}

#[test]
fn shipments_exactly_filling_a_vehicle_are_feasible() {
    let solution = solve(&shipments(&[0.1, 0.8, 0.1]), &vehicles(&[1.0]), &small_config()).unwrap();

    assert!(solution.feasible);
    assert_eq!(solution.vehicles_used, 1);
    assert_eq!(solution.assignment, vec![0, 0, 0]);
    assert!(solution.unused_capacity.abs() < 1e-9);
}

#[test]
fn oversized_shipment_yields_no_feasible_solution() {
    let instance = FleetInstance::new("oversized", shipments(&[10.0, 500.0]), vehicles(&[100.0, 150.0])).unwrap();
    let mut aco = AntColonyOptimization::new(instance, small_config()).unwrap();

    for _ in 0..10 {
        let report = aco.step().unwrap();
        assert_eq!(report.feasible_ants, 0);
        assert!(report.best_so_far.is_none());
        assert!(aco.pheromones().min_value() >= aco.pheromones().floor());
    }

    let config = small_config();
    let result = solve(&shipments(&[10.0, 500.0]), &vehicles(&[100.0, 150.0]), &config);
    assert!(matches!(result, Err(SolverError::NoFeasibleSolution { iterations: 10 })));
}

#[test]
fn zero_iterations_reports_no_feasible_solution() {
    let config = ACOConfig {
        num_iterations: 0,
        ..small_config()
    };
    let result = solve(&shipments(&[10.0]), &vehicles(&[100.0]), &config);
    assert!(matches!(result, Err(SolverError::NoFeasibleSolution { iterations: 0 })));
}

#[test]
fn illegal_configuration_is_rejected_before_running() {
    let config = ACOConfig {
        decay: 1.0,
        ..small_config()
    };
    let result = solve(&shipments(&[10.0]), &vehicles(&[100.0]), &config);
    assert!(matches!(result, Err(SolverError::ConfigError { parameter: "decay", .. })));
}

#[test]
fn fixed_seed_is_reproducible() {
    let instance = FleetInstance::random(11, 30, 60, &[500.0, 510.0, 600.0, 600.0, 600.0]).unwrap();
    let config = ACOConfig {
        num_ants: 10,
        num_iterations: 25,
        seed: 1234,
        ..Default::default()
    };

    let first = AntColonyOptimization::new(instance.clone(), config.clone()).unwrap().run().unwrap();
    let second = AntColonyOptimization::new(instance, config).unwrap().run().unwrap();

    assert_eq!(first.assignment, second.assignment);
    assert_eq!(first.cost(), second.cost());
}

#[test]
fn every_solution_is_feasible_and_best_never_worsens() {
    let instance = FleetInstance::random(5, 25, 50, &[400.0, 400.0, 350.0, 500.0]).unwrap();
    let config = ACOConfig {
        num_ants: 8,
        num_iterations: 40,
        decay: 0.3,
        ..Default::default()
    };
    let floor = config.min_pheromone;
    let mut aco = AntColonyOptimization::new(instance.clone(), config).unwrap();

    let mut previous: Option<Cost> = None;
    for _ in 0..40 {
        let report = aco.step().unwrap();
        if let (Some(before), Some(now)) = (previous, report.best_so_far) {
            assert!(now <= before);
        }
        if previous.is_some() {
            assert!(report.best_so_far.is_some());
        }
        previous = report.best_so_far;
        assert!(aco.pheromones().min_value() >= floor);
    }

    let best = aco.best().unwrap();
    assert!(best.feasible);
    assert_eq!(best.assignment.len(), instance.num_shipments());
    for (v, vehicle) in instance.vehicles().iter().enumerate() {
        let load: f64 = best
            .assignment
            .iter()
            .zip(instance.shipments())
            .filter(|(&assigned, _)| assigned == v)
            .map(|(_, s)| s.demand)
            .sum();
        assert!(load <= vehicle.capacity);
    }
}

#[test]
fn colony_matches_lower_bound_on_easy_instance() {
    let instance = FleetInstance::new(
        "easy",
        shipments(&[30.0, 30.0, 30.0, 30.0, 30.0, 30.0]),
        vehicles(&[90.0, 90.0, 90.0, 90.0]),
    )
    .unwrap();
    let config = ACOConfig {
        num_ants: 10,
        num_iterations: 50,
        ..Default::default()
    };
    let solution = AntColonyOptimization::new(instance.clone(), config).unwrap().run().unwrap();

    assert_eq!(Some(solution.vehicles_used), instance.vehicle_lower_bound());
    assert_eq!(solution.unused_capacity, 0.0);
}

#[test]
fn reserve_fleet_only_opens_when_needed() {
    let instance = FleetInstance::new("reserve", shipments(&[70.0, 70.0]), vehicles(&[100.0]))
        .unwrap()
        .with_reserve(vec![Vehicle::new("R1", 100.0)])
        .unwrap();
    let solution = AntColonyOptimization::new(instance.clone(), small_config())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(solution.assignment, vec![0, 1]);
    assert!(instance.is_reserve(1));

    let instance = FleetInstance::new("no-reserve-needed", shipments(&[30.0, 30.0]), vehicles(&[100.0]))
        .unwrap()
        .with_reserve(vec![Vehicle::new("R1", 100.0)])
        .unwrap();
    let solution = AntColonyOptimization::new(instance, small_config()).unwrap().run().unwrap();
    assert_eq!(solution.assignment, vec![0, 0]);
}

#[test]
fn baselines_are_feasible_and_bounded() {
    let instance = FleetInstance::random(21, 40, 50, &[500.0, 510.0, 600.0, 500.0, 450.0]).unwrap();
    let bound = instance.vehicle_lower_bound().unwrap();

    for solution in [
        FirstFitDecreasing::new().construct(&instance),
        BestFitDecreasing::new().construct(&instance),
    ] {
        assert!(solution.feasible);
        assert!(solution.vehicles_used >= bound);
    }
}
