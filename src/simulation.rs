//! Functionality for simulating a factory under a scenario.
use crate::error::ModelResult;
use crate::factory::Factory;
use crate::scenario::Scenario;
use anyhow::Result;
use log::{info, warn};
use serde::Serialize;

pub mod optimisation;
use optimisation::compile;
pub mod problem;
pub use problem::SolverOptions;
use problem::SolveOutcome;
pub mod results;
pub use results::Results;
use results::decode;
pub mod validation;
pub use validation::Anomaly;
use validation::check_consistency;

/// How far a simulation got
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SimulationState {
    /// The simulation has not been run yet
    NotSimulated,
    /// The solver ran out of time before finding an optimal solution
    TimeLimitReached,
    /// An optimal solution was found and decoded
    Solved,
}

/// A factory paired with the scenario it is operated under
#[derive(Debug, Clone)]
pub struct Simulation {
    /// The factory with its parameters resolved against the scenario
    pub factory: Factory,
    /// The scenario
    pub scenario: Scenario,
    /// Number of timesteps simulated
    pub horizon: usize,
    /// How far the simulation got
    pub state: SimulationState,
    /// Results of the simulation, once solved
    pub results: Option<Results>,
    /// Inconsistencies found in the results
    pub anomalies: Vec<Anomaly>,
    /// Whether the results can be trusted
    pub is_valid: bool,
}

impl Simulation {
    /// Create a simulation of `factory` under `scenario`.
    ///
    /// The factory is checked and then resolved against the scenario, so any scenario data it
    /// refers to must be present.
    pub fn new(factory: &Factory, scenario: &Scenario) -> ModelResult<Self> {
        scenario.check()?;
        let mut factory = factory.clone();
        factory.check_validity()?;
        let factory = factory.resolve_scenario(scenario)?;

        Ok(Self {
            factory,
            scenario: scenario.clone(),
            horizon: scenario.number_of_timesteps,
            state: SimulationState::NotSimulated,
            results: None,
            anomalies: Vec::new(),
            is_valid: false,
        })
    }

    /// Solve the simulation and read back its results.
    ///
    /// Reaching the time limit is not an error: the state is set to
    /// [`SimulationState::TimeLimitReached`] and no results are stored.
    pub fn simulate(&mut self, options: &SolverOptions) -> Result<()> {
        info!(
            "Simulating {} under scenario {} over {} timesteps",
            self.factory.name, self.scenario.name, self.horizon
        );
        let compiled = compile(&self.factory, &self.scenario);

        let raw = match compiled.problem.solve(options)? {
            SolveOutcome::Optimal(raw) => raw,
            SolveOutcome::TimeLimitReached => {
                warn!("The solver reached its time limit before finding an optimal solution");
                self.state = SimulationState::TimeLimitReached;
                self.results = None;
                self.anomalies.clear();
                self.is_valid = false;
                return Ok(());
            }
        };

        let results = decode(&self.factory, &self.scenario, &compiled, &raw, options);
        self.anomalies = check_consistency(&self.factory, &self.scenario, &compiled, &raw, options);
        self.is_valid = !self.anomalies.iter().any(|anomaly| anomaly.kind.invalidates());
        if self.is_valid {
            info!("Objective value: {}", results.objective);
        } else {
            warn!("The results of the simulation are not consistent and should not be trusted");
        }

        self.results = Some(results);
        self.state = SimulationState::Solved;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_model_error, grid_factory, scenario};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_new_simulation_is_not_simulated(grid_factory: Factory, scenario: Scenario) {
        let simulation = Simulation::new(&grid_factory, &scenario).unwrap();
        assert_eq!(simulation.state, SimulationState::NotSimulated);
        assert_eq!(simulation.horizon, 3);
        assert!(simulation.results.is_none());
    }

    #[rstest]
    fn test_new_simulation_empty_horizon(grid_factory: Factory, mut scenario: Scenario) {
        scenario.number_of_timesteps = 0;
        assert_model_error!(
            Simulation::new(&grid_factory, &scenario),
            "Invalid configuration for scenario test: number_of_timesteps must be positive"
        );
    }

    #[rstest]
    fn test_simulate_grid(grid_factory: Factory, scenario: Scenario) {
        let mut simulation = Simulation::new(&grid_factory, &scenario).unwrap();
        simulation.simulate(&SolverOptions::default()).unwrap();
        assert_eq!(simulation.state, SimulationState::Solved);
        assert!(simulation.is_valid);

        // Demand of 5 for three hours at a cost of 2
        let results = simulation.results.unwrap();
        assert_approx_eq!(f64, results.objective, 30.0, epsilon = 1e-6);
    }
}
