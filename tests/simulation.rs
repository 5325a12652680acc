//! Integration tests which build small factories, solve them and check the results.
use factopt::component::ComponentType;
use factopt::connection::ConnectionOptions;
use factopt::factory::{Factory, FactoryOptions};
use factopt::parameter::{ParameterMap, ParameterValue};
use factopt::scenario::Scenario;
use factopt::simulation::results::ComponentResult;
use factopt::simulation::validation::AnomalyKind;
use factopt::simulation::{Simulation, SimulationState, SolverOptions};
use float_cmp::assert_approx_eq;
use rstest::rstest;

fn params<const N: usize>(pairs: [(&str, ParameterValue); N]) -> ParameterMap {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

fn new_factory(max_timesteps: usize) -> Factory {
    let mut factory = Factory::new(FactoryOptions {
        name: "test".into(),
        max_timesteps,
        ..FactoryOptions::default()
    });
    factory.add_flowtype("electricity", "energy", None).unwrap();
    factory.add_flowtype("gas", "energy", None).unwrap();

    factory
}

fn simulate(factory: &Factory, number_of_timesteps: usize) -> Simulation {
    let scenario = Scenario::new("test", number_of_timesteps, 1.0).unwrap();
    let mut simulation = Simulation::new(factory, &scenario).unwrap();
    simulation.simulate(&SolverOptions::default()).unwrap();
    assert_eq!(simulation.state, SimulationState::Solved);
    assert!(
        simulation.is_valid,
        "Unexpected anomalies: {:?}",
        simulation.anomalies
    );

    simulation
}

fn assert_series_eq(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (actual, expected) in actual.iter().zip(expected) {
        assert_approx_eq!(f64, *actual, *expected, epsilon = 1e-6);
    }
}

#[test]
fn test_grid_supplies_demand_through_pool() {
    let mut factory = new_factory(3);
    let default = ConnectionOptions::default();
    factory
        .add_component("grid", ComponentType::Source, Some("electricity"))
        .unwrap();
    factory
        .add_component("pool", ComponentType::Pool, None)
        .unwrap();
    factory
        .add_component("demand", ComponentType::Sink, None)
        .unwrap();
    factory.add_connection("grid", "pool", &default).unwrap();
    factory.add_connection("pool", "demand", &default).unwrap();
    factory
        .set_configuration(
            "grid",
            &params([("cost", 2.0.into()), ("power_max", 10.0.into())]),
        )
        .unwrap();
    factory
        .set_configuration("demand", &params([("demand", 5.0.into())]))
        .unwrap();

    let simulation = simulate(&factory, 3);
    let results = simulation.results.unwrap();
    assert_approx_eq!(f64, results.objective, 30.0, epsilon = 1e-6);
    assert_series_eq(results.flow("grid_to_pool").unwrap(), &[5.0, 5.0, 5.0]);
    let Some(ComponentResult::Source { utilisation, .. }) = results.component("grid") else {
        panic!("Missing result for grid");
    };
    assert_series_eq(utilisation, &[5.0, 5.0, 5.0]);

    // Sources are onsite unless configured otherwise
    assert_approx_eq!(f64, results.offsite_energy, 0.0, epsilon = 1e-6);
    assert_approx_eq!(f64, results.onsite_energy, 15.0, epsilon = 1e-6);
}

#[test]
fn test_storage_shifts_energy() {
    let mut factory = new_factory(4);
    let default = ConnectionOptions::default();
    factory
        .add_component("pv", ComponentType::Source, Some("electricity"))
        .unwrap();
    factory
        .add_component("battery", ComponentType::Storage, Some("electricity"))
        .unwrap();
    factory
        .add_component("demand", ComponentType::Sink, None)
        .unwrap();
    factory.add_connection("pv", "battery", &default).unwrap();
    factory.add_connection("battery", "demand", &default).unwrap();
    factory
        .set_configuration(
            "pv",
            &params([("determined_power", vec![0.0, 5.0, 0.0, 0.0].into())]),
        )
        .unwrap();
    factory
        .set_configuration(
            "battery",
            &params([("capacity", 100.0.into()), ("soc_start", 0.5.into())]),
        )
        .unwrap();
    factory
        .set_configuration(
            "demand",
            &params([("demand", vec![0.0, 0.0, 5.0, 0.0].into())]),
        )
        .unwrap();

    let simulation = simulate(&factory, 4);
    let results = simulation.results.unwrap();
    let Some(ComponentResult::Storage { soc, soc_start, .. }) = results.component("battery")
    else {
        panic!("Missing result for battery");
    };
    assert_approx_eq!(f64, *soc_start, 50.0, epsilon = 1e-6);
    assert_series_eq(soc, &[50.0, 55.0, 50.0, 50.0]);
    assert_series_eq(
        results.flow("battery_to_demand").unwrap(),
        &[0.0, 0.0, 5.0, 0.0],
    );
}

#[test]
fn test_deadtime_delays_flow() {
    let mut factory = new_factory(5);
    let default = ConnectionOptions::default();
    factory
        .add_component("grid", ComponentType::Source, Some("electricity"))
        .unwrap();
    factory
        .add_component("delay", ComponentType::Deadtime, None)
        .unwrap();
    factory
        .add_component("demand", ComponentType::Sink, None)
        .unwrap();
    factory.add_connection("grid", "delay", &default).unwrap();
    factory.add_connection("delay", "demand", &default).unwrap();
    factory
        .set_configuration("grid", &params([("cost", 1.0.into())]))
        .unwrap();
    factory
        .set_configuration("delay", &params([("delay", 2.0.into())]))
        .unwrap();
    factory
        .set_configuration(
            "demand",
            &params([("demand", vec![0.0, 0.0, 0.0, 0.0, 5.0].into())]),
        )
        .unwrap();

    let simulation = simulate(&factory, 5);
    let results = simulation.results.unwrap();
    assert_series_eq(
        results.flow("grid_to_delay").unwrap(),
        &[0.0, 0.0, 5.0, 0.0, 0.0],
    );
    assert_series_eq(
        results.flow("delay_to_demand").unwrap(),
        &[0.0, 0.0, 0.0, 0.0, 5.0],
    );
}

#[test]
fn test_variable_efficiency_converter() {
    let mut factory = new_factory(3);
    factory
        .add_component("gas_supply", ComponentType::Source, Some("gas"))
        .unwrap();
    factory
        .add_component("boiler", ComponentType::Converter, None)
        .unwrap();
    factory
        .add_component("demand", ComponentType::Sink, None)
        .unwrap();
    factory
        .add_connection("gas_supply", "boiler", &ConnectionOptions::default())
        .unwrap();
    factory
        .add_connection("boiler", "demand", &ConnectionOptions::flowtype("heat"))
        .unwrap();
    factory
        .set_configuration("gas_supply", &params([("cost", 1.0.into())]))
        .unwrap();
    factory
        .set_configuration(
            "boiler",
            &params([
                ("power_max", 10.0.into()),
                ("eta_max", 0.9.into()),
                ("delta_eta", 0.2.into()),
            ]),
        )
        .unwrap();
    factory
        .set_configuration("demand", &params([("demand", 9.0.into())]))
        .unwrap();

    // Only full load gives an output of 9
    let simulation = simulate(&factory, 3);
    let results = simulation.results.unwrap();
    let Some(ComponentResult::Converter {
        operating_point,
        efficiency,
        ..
    }) = results.component("boiler")
    else {
        panic!("Missing result for boiler");
    };
    assert_series_eq(operating_point, &[10.0, 10.0, 10.0]);
    assert_series_eq(efficiency, &[0.9, 0.9, 0.9]);
    assert_approx_eq!(f64, results.objective, 30.0, epsilon = 1e-6);
    assert_series_eq(
        results.flow("boiler_to_losses_energy").unwrap(),
        &[1.0, 1.0, 1.0],
    );
}

#[test]
fn test_infeasible_demand_is_an_error() {
    let mut factory = new_factory(2);
    factory
        .add_component("grid", ComponentType::Source, Some("electricity"))
        .unwrap();
    factory
        .add_component("demand", ComponentType::Sink, None)
        .unwrap();
    factory
        .add_connection("grid", "demand", &ConnectionOptions::default())
        .unwrap();
    factory
        .set_configuration("grid", &params([("power_max", 1.0.into())]))
        .unwrap();
    factory
        .set_configuration("demand", &params([("demand", 5.0.into())]))
        .unwrap();

    let scenario = Scenario::new("test", 2, 1.0).unwrap();
    let mut simulation = Simulation::new(&factory, &scenario).unwrap();
    assert!(simulation.simulate(&SolverOptions::default()).is_err());
    assert_eq!(simulation.state, SimulationState::NotSimulated);
}

/// A heater supplying a hall which leaks heat to an ambient of 20 degrees
fn heated_hall(hall: ParameterMap) -> Factory {
    let mut factory = new_factory(5);
    factory
        .add_component("heater", ComponentType::Source, Some("heat"))
        .unwrap();
    factory
        .add_component("hall", ComponentType::ThermalSystem, None)
        .unwrap();
    factory
        .add_connection("heater", "hall", &ConnectionOptions::default())
        .unwrap();
    factory
        .set_configuration("heater", &params([("cost", 1.0.into())]))
        .unwrap();
    factory.set_configuration("hall", &hall).unwrap();

    factory
}

#[test]
fn test_thermal_system_heats_up() {
    let hall = params([
        ("resistance", 1.0.into()),
        ("capacity", 10.0.into()),
        ("temperature_start", 20.0.into()),
        ("temperature_min", vec![20.0, 22.0, 22.0, 22.0, 22.0].into()),
    ]);
    let simulation = simulate(&heated_hall(hall), 3);
    let results = simulation.results.unwrap();

    // Heating by 2 degrees takes 20, holding the temperature then makes up for the 2 lost
    let Some(ComponentResult::Source { utilisation, .. }) = results.component("heater") else {
        panic!("Missing result for heater");
    };
    assert_series_eq(utilisation, &[20.0, 2.0, 2.0]);
    let Some(ComponentResult::ThermalSystem {
        temperature,
        temperature_end,
    }) = results.component("hall")
    else {
        panic!("Missing result for hall");
    };
    assert_series_eq(temperature, &[20.0, 22.0, 22.0]);
    assert_approx_eq!(f64, *temperature_end, 22.0, epsilon = 1e-6);
    assert_series_eq(results.flow("hall_to_losses_energy").unwrap(), &[0.0, 2.0, 2.0]);
    assert_series_eq(results.flow("ambient_gains_to_hall").unwrap(), &[0.0, 0.0, 0.0]);
    assert_approx_eq!(f64, results.objective, 24.0, epsilon = 1e-6);
}

#[test]
fn test_sustainable_thermal_system() {
    let hall = params([
        ("resistance", 1.0.into()),
        ("capacity", 1.0.into()),
        ("temperature_start", 25.0.into()),
        ("sustainable", true.into()),
    ]);
    let simulation = simulate(&heated_hall(hall), 3);
    let results = simulation.results.unwrap();

    // The hall cools to the ambient at once and is only heated back up at the end
    let Some(ComponentResult::ThermalSystem {
        temperature,
        temperature_end,
    }) = results.component("hall")
    else {
        panic!("Missing result for hall");
    };
    assert_series_eq(temperature, &[25.0, 20.0, 20.0]);
    assert_approx_eq!(f64, *temperature_end, 25.0, epsilon = 1e-6);
    assert_series_eq(results.flow("heater_to_hall").unwrap(), &[0.0, 0.0, 5.0]);
    assert_approx_eq!(f64, results.objective, 5.0, epsilon = 1e-6);
}

#[test]
fn test_trigger_demand_executions() {
    let mut factory = new_factory(5);
    factory
        .add_component("grid", ComponentType::Source, Some("electricity"))
        .unwrap();
    factory
        .add_component("press", ComponentType::TriggerDemand, None)
        .unwrap();
    factory
        .add_component("press_out", ComponentType::Sink, Some("electricity"))
        .unwrap();
    factory
        .add_connection("grid", "press", &ConnectionOptions::default())
        .unwrap();
    factory
        .add_connection("press", "press_out", &ConnectionOptions::flowtype("electricity"))
        .unwrap();
    factory
        .set_configuration(
            "grid",
            &params([("cost", vec![5.0, 1.0, 1.0, 1.0, 1.0].into())]),
        )
        .unwrap();
    factory
        .set_configuration(
            "press",
            &params([
                ("load_profile_energy", vec![2.0, 2.0].into()),
                ("executions", 2.0.into()),
                ("max_parallel", 1.0.into()),
            ]),
        )
        .unwrap();

    // Two runs which may not overlap, both avoiding the expensive first timestep
    let simulation = simulate(&factory, 5);
    let results = simulation.results.unwrap();
    let Some(ComponentResult::TriggerDemand {
        executions,
        energy_load,
        material_load,
    }) = results.component("press")
    else {
        panic!("Missing result for press");
    };
    assert_series_eq(executions, &[0.0, 1.0, 0.0, 1.0, 0.0]);
    assert_series_eq(energy_load, &[0.0, 2.0, 2.0, 2.0, 2.0]);
    assert_series_eq(material_load, &[0.0; 5]);
    assert_series_eq(
        results.flow("grid_to_press").unwrap(),
        &[0.0, 2.0, 2.0, 2.0, 2.0],
    );
    assert_approx_eq!(f64, results.objective, 8.0, epsilon = 1e-6);
}

#[test]
fn test_schedule_delivers_within_windows() {
    let mut factory = new_factory(5);
    let default = ConnectionOptions::default();
    factory
        .add_component("grid", ComponentType::Source, Some("electricity"))
        .unwrap();
    factory
        .add_component("line", ComponentType::Schedule, None)
        .unwrap();
    factory
        .add_component("demand", ComponentType::Sink, Some("electricity"))
        .unwrap();
    factory.add_connection("grid", "line", &default).unwrap();
    factory.add_connection("line", "demand", &default).unwrap();
    factory
        .set_configuration(
            "grid",
            &params([("cost", vec![3.0, 1.0, 2.0, 1.0, 3.0].into())]),
        )
        .unwrap();
    factory
        .set_configuration(
            "line",
            &params([
                ("start_times", vec![0.0, 2.0].into()),
                ("end_times", vec![2.0, 4.0].into()),
                ("volumes", vec![4.0, 3.0].into()),
                ("max_rates", vec![3.0, 2.0].into()),
            ]),
        )
        .unwrap();

    let simulation = simulate(&factory, 5);
    let results = simulation.results.unwrap();
    let Some(ComponentResult::Schedule {
        throughput,
        deliveries,
    }) = results.component("line")
    else {
        panic!("Missing result for line");
    };

    // Each part takes what it can in its cheapest timestep and the rest in the next cheapest
    assert_eq!(deliveries.len(), 2);
    assert_series_eq(&deliveries[0], &[0.0, 3.0, 1.0, 0.0, 0.0]);
    assert_series_eq(&deliveries[1], &[0.0, 0.0, 1.0, 2.0, 0.0]);
    for (delivery, volume) in deliveries.iter().zip([4.0, 3.0]) {
        assert_approx_eq!(f64, delivery.iter().sum::<f64>(), volume, epsilon = 1e-6);
    }
    assert_series_eq(throughput, &[0.0, 3.0, 2.0, 2.0, 0.0]);
    assert_approx_eq!(f64, results.objective, 9.0, epsilon = 1e-6);
}

#[test]
fn test_slack_usage_is_reported() {
    let mut factory = Factory::new(FactoryOptions {
        name: "test".into(),
        max_timesteps: 2,
        enable_slacks: true,
        ..FactoryOptions::default()
    });
    factory.add_flowtype("electricity", "energy", None).unwrap();
    factory
        .add_component("grid", ComponentType::Source, Some("electricity"))
        .unwrap();
    factory
        .add_component("demand", ComponentType::Sink, None)
        .unwrap();
    factory
        .add_connection("grid", "demand", &ConnectionOptions::default())
        .unwrap();
    factory
        .set_configuration(
            "grid",
            &params([("cost", 1.0.into()), ("power_max", 2.0.into())]),
        )
        .unwrap();
    factory
        .set_configuration("demand", &params([("demand", 5.0.into())]))
        .unwrap();

    let scenario = Scenario::new("test", 2, 1.0).unwrap();
    let mut simulation = Simulation::new(&factory, &scenario).unwrap();
    simulation.simulate(&SolverOptions::default()).unwrap();
    assert_eq!(simulation.state, SimulationState::Solved);
    assert!(!simulation.is_valid);
    assert!(
        simulation
            .anomalies
            .iter()
            .any(|anomaly| anomaly.kind == AnomalyKind::SlackUsage
                && anomaly.component == "slack_demand")
    );

    let results = simulation.results.unwrap();
    let Some(ComponentResult::Slack { usage, .. }) = results.component("slack_demand") else {
        panic!("Missing result for slack_demand");
    };
    assert_series_eq(usage, &[3.0, 3.0]);
    assert_series_eq(results.flow("grid_to_demand").unwrap(), &[2.0, 2.0]);
}

#[rstest]
#[case(false, 0.0, 45.0)]
#[case(true, 5.0, 50.0)]
fn test_sustainable_storage(
    #[case] sustainable: bool,
    #[case] expected_objective: f64,
    #[case] expected_soc_end: f64,
) {
    let mut factory = new_factory(4);
    let default = ConnectionOptions::default();
    factory
        .add_component("grid", ComponentType::Source, Some("electricity"))
        .unwrap();
    factory
        .add_component("battery", ComponentType::Storage, Some("electricity"))
        .unwrap();
    factory
        .add_component("demand", ComponentType::Sink, None)
        .unwrap();
    factory.add_connection("grid", "battery", &default).unwrap();
    factory.add_connection("battery", "demand", &default).unwrap();
    factory
        .set_configuration("grid", &params([("cost", 1.0.into())]))
        .unwrap();
    factory
        .set_configuration(
            "battery",
            &params([
                ("capacity", 100.0.into()),
                ("soc_start", 0.5.into()),
                ("sustainable", sustainable.into()),
            ]),
        )
        .unwrap();
    factory
        .set_configuration(
            "demand",
            &params([("demand", vec![0.0, 0.0, 5.0, 0.0].into())]),
        )
        .unwrap();

    // Without the end condition the demand is met from the initial charge for free
    let simulation = simulate(&factory, 4);
    let results = simulation.results.unwrap();
    let Some(ComponentResult::Storage { soc, soc_start, .. }) = results.component("battery")
    else {
        panic!("Missing result for battery");
    };
    assert_approx_eq!(f64, *soc_start, 50.0, epsilon = 1e-6);
    assert_approx_eq!(f64, soc[3], expected_soc_end, epsilon = 1e-6);
    assert_approx_eq!(f64, results.objective, expected_objective, epsilon = 1e-6);

    // Nothing is lost by a lossless storage
    assert_series_eq(
        results.flow("battery_to_losses_energy").unwrap(),
        &[0.0; 4],
    );
}
