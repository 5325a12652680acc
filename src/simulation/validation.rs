//! Checks that a solution is physically consistent.
//!
//! The optimisation should never return an inconsistent solution, but rounding, slacks and
//! numerical trouble can all produce results which should not be trusted. Every problem found is
//! logged as a warning and recorded as an [`Anomaly`].
use super::optimisation::{CompiledFactory, Role};
use super::problem::SolverOptions;
use super::results::Solution;
use crate::component::{Component, ComponentKind};
use crate::connection::Connection;
use crate::factory::{AMBIENT_GAINS, Factory};
use crate::scenario::Scenario;
use crate::units::QuantityType;
use log::warn;
use serde::Serialize;
use strum::Display;

/// Relative tolerance of the balance checks
const RELATIVE_TOLERANCE: f64 = 1e-6;

/// Share of the energy supply above which the use of ambient gains is reported
const AMBIENT_GAINS_SHARE: f64 = 0.5;

/// What kind of inconsistency was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// The inputs and outputs of a component do not balance
    Balance,
    /// Energy or material is created or destroyed across the factory
    Conservation,
    /// A slack was used, so the factory could not be operated as modelled
    SlackUsage,
    /// A thermal system gains heat from and loses heat to the ambient at the same time
    AmbientExchange,
    /// Most of the energy supplied came from the ambient, so the cost of ambient gains may be too
    /// low to keep the solver from using them freely
    AmbientGainsUsage,
}

impl AnomalyKind {
    /// Whether the anomaly means the results cannot be trusted
    pub fn invalidates(self) -> bool {
        !matches!(self, Self::AmbientExchange | Self::AmbientGainsUsage)
    }
}

/// An inconsistency in the results of a simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// Component concerned (or the factory name for global checks)
    pub component: String,
    /// What kind of inconsistency
    pub kind: AnomalyKind,
    /// Description
    pub message: String,
}

struct Checker<'a> {
    factory: &'a Factory,
    solution: Solution<'a>,
    horizon: usize,
    timestep: f64,
    /// Largest error introduced into a single value by thresholding and rounding
    value_error: f64,
    anomalies: Vec<Anomaly>,
}

impl Checker<'_> {
    fn report(&mut self, component: &str, kind: AnomalyKind, message: String) {
        warn!("{message}");
        self.anomalies.push(Anomaly {
            component: component.to_string(),
            kind,
            message,
        });
    }

    /// Whether two sums of `terms` cleaned values agree
    fn agree(&self, lhs: f64, rhs: f64, terms: usize) -> bool {
        let scale = lhs.abs().max(rhs.abs());
        (lhs - rhs).abs() <= RELATIVE_TOLERANCE * (1.0 + scale) + self.value_error * terms as f64
    }

    fn flow(&self, connection: &Connection) -> Vec<f64> {
        self.solution.flow(connection.id)
    }

    fn quantity(&self, connection: &Connection) -> QuantityType {
        self.factory.quantity(&connection.flowtype)
    }

    fn check_component(&mut self, component: &Component) {
        let factory = self.factory;
        let name = &component.name;
        let inputs: Vec<_> = factory.inputs(component).collect();
        let outputs: Vec<_> = factory.outputs(component).collect();
        let terms = inputs.len() + outputs.len();

        match &component.kind {
            ComponentKind::Pool | ComponentKind::Schedule(_) => {
                let inflow = self.solution.weighted_sum(
                    inputs.iter().copied(),
                    self.horizon,
                    |c| c.weight_destination,
                );
                let outflow = self.solution.weighted_sum(
                    outputs.iter().copied(),
                    self.horizon,
                    |c| c.weight_origin,
                );
                for t in 0..self.horizon {
                    if !self.agree(inflow[t], outflow[t], terms) {
                        self.report(
                            name,
                            AnomalyKind::Balance,
                            format!(
                                "{name} receives {} but passes on {} at timestep {t}",
                                inflow[t], outflow[t]
                            ),
                        );
                    }
                }

                if let ComponentKind::Schedule(schedule) = &component.kind {
                    let delivered = inflow.iter().sum::<f64>() * self.timestep;
                    let scheduled = schedule.total_volume();
                    if !self.agree(delivered, scheduled, inputs.len() * self.horizon) {
                        self.report(
                            name,
                            AnomalyKind::Balance,
                            format!("{name} delivers {delivered} of the {scheduled} scheduled"),
                        );
                    }
                }
            }
            ComponentKind::Converter(_) => {
                for material in [false, true] {
                    let selected = |c: &Connection| self.quantity(c).is_material() == material;
                    let inflow = self.solution.weighted_sum(
                        inputs.iter().copied().filter(|c| selected(c)),
                        self.horizon,
                        |_| 1.0,
                    );
                    let outflow = self.solution.weighted_sum(
                        outputs.iter().copied().filter(|c| selected(c)),
                        self.horizon,
                        |_| 1.0,
                    );
                    for t in 0..self.horizon {
                        if !self.agree(inflow[t], outflow[t], terms) {
                            let quantity = if material { "material" } else { "energy" };
                            self.report(
                                name,
                                AnomalyKind::Balance,
                                format!(
                                    "{name} takes in {} {quantity} but puts out {} at timestep {t}",
                                    inflow[t], outflow[t]
                                ),
                            );
                        }
                    }
                }
            }
            ComponentKind::Storage(_) => {
                let key = &component.key;
                let charge = self.solution.component(key, Role::Charge);
                let discharge = self.solution.component(key, Role::Discharge);
                let soc = self.solution.component(key, Role::Soc);
                let soc_start = self.solution.component(key, Role::SocStart);
                let losses = self.solution.weighted_sum(
                    outputs.iter().copied().filter(|c| c.to_losses),
                    self.horizon,
                    |_| 1.0,
                );
                let mut previous = soc_start.first().copied().unwrap_or(0.0);
                // Errors in the powers are scaled by the timestep
                let error_terms = 2 + (3.0 * self.timestep).ceil() as usize;
                for t in 0..self.horizon {
                    let change = (charge[t] - discharge[t] - losses[t]) * self.timestep;
                    if !self.agree(soc[t] - previous, change, error_terms) {
                        self.report(
                            name,
                            AnomalyKind::Balance,
                            format!(
                                "The state of charge of {name} changes by {} at timestep {t} but \
                                 {change} was stored",
                                soc[t] - previous
                            ),
                        );
                    }
                    previous = soc[t];
                }
            }
            ComponentKind::Deadtime(_) => {
                let total = |series: Vec<f64>| series.iter().sum::<f64>();
                let inflow = total(self.solution.weighted_sum(
                    inputs.iter().copied(),
                    self.horizon,
                    |c| c.weight_destination,
                ));
                let outflow = total(self.solution.weighted_sum(
                    outputs.iter().copied(),
                    self.horizon,
                    |c| c.weight_origin,
                ));
                if !self.agree(inflow, outflow, terms * self.horizon) {
                    self.report(
                        name,
                        AnomalyKind::Balance,
                        format!("{name} receives {inflow} in total but passes on {outflow}"),
                    );
                }
            }
            ComponentKind::TriggerDemand(_) => {
                for material in [false, true] {
                    let selected = |c: &Connection| self.quantity(c).is_material() == material;
                    let inflow = self.solution.weighted_sum(
                        inputs.iter().copied().filter(|c| selected(c)),
                        self.horizon,
                        |c| c.weight_destination,
                    );
                    let outflow = self.solution.weighted_sum(
                        outputs.iter().copied().filter(|c| selected(c)),
                        self.horizon,
                        |c| c.weight_origin,
                    );
                    for t in 0..self.horizon {
                        if !self.agree(inflow[t], outflow[t], terms) {
                            self.report(
                                name,
                                AnomalyKind::Balance,
                                format!(
                                    "{name} draws {} but passes on {} at timestep {t}",
                                    inflow[t], outflow[t]
                                ),
                            );
                        }
                    }
                }
            }
            ComponentKind::ThermalSystem(_) => {
                let gains = self.solution.weighted_sum(
                    inputs.iter().copied().filter(|c| c.from_gains),
                    self.horizon,
                    |_| 1.0,
                );
                let losses = self.solution.weighted_sum(
                    outputs.iter().copied().filter(|c| c.to_losses),
                    self.horizon,
                    |_| 1.0,
                );
                if let Some(t) = (0..self.horizon).find(|t| gains[*t] > 0.0 && losses[*t] > 0.0) {
                    self.report(
                        name,
                        AnomalyKind::AmbientExchange,
                        format!(
                            "{name} gains {} from and loses {} to the ambient at timestep {t}",
                            gains[t], losses[t]
                        ),
                    );
                }
            }
            ComponentKind::Slack(_) => {
                let usage: f64 = inputs
                    .iter()
                    .chain(&outputs)
                    .map(|c| self.flow(c).iter().sum::<f64>())
                    .sum::<f64>()
                    * self.timestep;
                if usage > 0.0 {
                    self.report(
                        name,
                        AnomalyKind::SlackUsage,
                        format!("{name} was used for {usage} units"),
                    );
                }
            }
            ComponentKind::Source(_) | ComponentKind::Sink(_) => {}
        }
    }

    /// Whether all connections have unit weights, apart from those of converters
    fn has_unit_weights(&self) -> bool {
        self.factory.connections.values().all(|connection| {
            connection.has_unit_weights()
                || [&connection.origin, &connection.destination]
                    .into_iter()
                    .any(|key| {
                        matches!(
                            self.factory.components[key].kind,
                            ComponentKind::Converter(_)
                        )
                    })
        })
    }

    /// Check that every quantity supplied is either consumed or stored
    fn check_conservation(&mut self) {
        if !self.has_unit_weights() {
            return;
        }

        let factory = self.factory;
        for quantity in [QuantityType::Energy, QuantityType::Material] {
            let is_material = quantity.is_material();
            let mut supplied = 0.0;
            let mut consumed = 0.0;
            let mut terms = 0;
            for connection in factory.connections.values() {
                if self.quantity(connection).is_material() != is_material {
                    continue;
                }
                let total = self.flow(connection).iter().sum::<f64>() * self.timestep;
                if factory.components[&connection.origin].is_source() {
                    supplied += total;
                    terms += self.horizon;
                }
                if factory.components[&connection.destination].is_sink() {
                    consumed += total;
                    terms += self.horizon;
                }
            }

            let mut stored = 0.0;
            for component in factory.components.values() {
                match &component.kind {
                    ComponentKind::Storage(_)
                        if factory.quantity(&component.flowtype).is_material() == is_material =>
                    {
                        let soc = self.solution.component(&component.key, Role::Soc);
                        let start = self.solution.component(&component.key, Role::SocStart);
                        if let (Some(end), Some(start)) = (soc.last(), start.first()) {
                            stored += end - start;
                        }
                    }
                    ComponentKind::ThermalSystem(thermal) if !is_material => {
                        let temperature =
                            self.solution.component(&component.key, Role::Temperature);
                        if let (Some(start), Some(end)) = (temperature.first(), temperature.last())
                        {
                            stored += thermal.capacity * (end - start);
                        }
                    }
                    _ => {}
                }
            }

            if !self.agree(supplied, consumed + stored, terms) {
                self.report(
                    &factory.name,
                    AnomalyKind::Conservation,
                    format!(
                        "{supplied} {quantity} was supplied but {consumed} was consumed and \
                         {stored} stored"
                    ),
                );
            }
        }
    }

    /// Check that the ambient supplies no more than a modest share of the energy
    fn check_ambient_gains(&mut self) {
        let factory = self.factory;
        let Ok(ambient) = factory.component(AMBIENT_GAINS) else {
            return;
        };
        let total = |connection: &Connection| self.flow(connection).iter().sum::<f64>();
        let gains = factory.outputs(ambient).map(total).sum::<f64>() * self.timestep;
        if gains <= 0.0 {
            return;
        }

        let supplied = factory
            .connections
            .values()
            .filter(|connection| {
                let origin = &factory.components[&connection.origin];
                origin.is_source() && !origin.is_slack() && !self.quantity(connection).is_material()
            })
            .map(total)
            .sum::<f64>()
            * self.timestep;
        if gains > AMBIENT_GAINS_SHARE * supplied {
            self.report(
                AMBIENT_GAINS,
                AnomalyKind::AmbientGainsUsage,
                format!("{gains} of the {supplied} energy supplied came from {AMBIENT_GAINS}"),
            );
        }
    }
}

/// Check the solution of a simulation for inconsistencies.
///
/// # Returns
///
/// Every anomaly found
pub fn check_consistency(
    factory: &Factory,
    scenario: &Scenario,
    compiled: &CompiledFactory,
    raw: &[f64],
    options: &SolverOptions,
) -> Vec<Anomaly> {
    let rounding = 0.5 * 10f64.powi(-(options.result_decimals as i32));
    let mut checker = Checker {
        factory,
        solution: Solution::new(raw, &compiled.variables, options),
        horizon: scenario.number_of_timesteps,
        timestep: scenario.timefactor,
        value_error: rounding.max(options.result_epsilon),
        anomalies: Vec::new(),
    };

    for component in factory.components.values() {
        checker.check_component(component);
    }
    checker.check_conservation();
    checker.check_ambient_gains();

    checker.anomalies
}
