//! The results of a simulation, read from the solution of the optimisation problem.
//!
//! Values closer to zero than `result_epsilon` are reported as zero and all values are rounded to
//! `result_decimals` decimal places.
use super::optimisation::{CompiledFactory, Role, VariableMap};
use super::problem::{SolverOptions, Var};
use crate::component::{Component, ComponentKind, ComponentType};
use crate::connection::Connection;
use crate::factory::Factory;
use crate::id::{ComponentID, ConnectionID, FlowTypeID};
use crate::parameter::Series;
use crate::scenario::Scenario;
use indexmap::IndexMap;
use serde::Serialize;

/// Threshold a value at `epsilon` and round it to `decimals` decimal places
pub fn clean_value(value: f64, epsilon: f64, decimals: u32) -> f64 {
    if value.abs() < epsilon {
        return 0.0;
    }

    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// The cleaned values of all variables of a solved problem
pub struct Solution<'a> {
    values: Vec<f64>,
    variables: &'a VariableMap,
}

impl<'a> Solution<'a> {
    /// Clean the raw values returned by the solver
    pub fn new(raw: &[f64], variables: &'a VariableMap, options: &SolverOptions) -> Self {
        let values = raw
            .iter()
            .map(|value| clean_value(*value, options.result_epsilon, options.result_decimals))
            .collect();

        Self { values, variables }
    }

    /// The value of a variable
    pub fn value(&self, var: Var) -> f64 {
        self.values[var.index()]
    }

    /// The values of several variables
    pub fn series(&self, vars: &[Var]) -> Series {
        vars.iter().map(|var| self.value(*var)).collect()
    }

    /// The flow through a connection at each timestep
    pub fn flow(&self, id: ConnectionID) -> Series {
        self.series(self.variables.flows(id))
    }

    /// The values of a component's variables with the given role (empty if there are none)
    pub fn component(&self, key: &ComponentID, role: Role) -> Series {
        self.variables
            .get(key, role)
            .map(|vars| self.series(vars))
            .unwrap_or_default()
    }

    /// Σ flow·weight over the given connections at each timestep
    pub fn weighted_sum<'b, I, F>(&self, connections: I, horizon: usize, weight: F) -> Series
    where
        I: IntoIterator<Item = &'b Connection>,
        F: Fn(&Connection) -> f64,
    {
        let mut total = vec![0.0; horizon];
        for connection in connections {
            let w = weight(connection);
            for (t, flow) in self.flow(connection.id).into_iter().enumerate() {
                total[t] += flow * w;
            }
        }

        total
    }
}

/// The flow through a connection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionResult {
    /// Name of the connection
    pub name: String,
    /// Origin component
    pub origin: ComponentID,
    /// Destination component
    pub destination: ComponentID,
    /// The flowtype carried
    pub flowtype: FlowTypeID,
    /// Flow at each timestep
    pub flow: Series,
}

/// The results of a single component, depending on its kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ComponentResult {
    /// Results of a source
    Source {
        /// Power delivered at each timestep
        utilisation: Series,
        /// Total cost, including the capacity charge
        cost: f64,
        /// Total CO2 emissions
        emissions: f64,
        /// Cost of the emissions
        emission_cost: f64,
    },
    /// Results of a sink
    Sink {
        /// Power taken at each timestep
        utilisation: Series,
        /// Total cost
        cost: f64,
        /// Total revenue
        revenue: f64,
        /// Total CO2 emissions, net of refunds
        emissions: f64,
        /// Cost of the emissions
        emission_cost: f64,
    },
    /// Results of a pool
    Pool {
        /// Weighted inflow at each timestep
        throughput: Series,
    },
    /// Results of a converter
    Converter {
        /// Operating point at each timestep
        operating_point: Series,
        /// Ratio of energy outputs to energy inputs at each timestep
        efficiency: Series,
        /// Whether a switchable converter is running at each timestep (1 or 0)
        on: Option<Series>,
    },
    /// Results of a storage
    Storage {
        /// Charging power at each timestep
        charge: Series,
        /// Discharging power at each timestep
        discharge: Series,
        /// State of charge at the end of each timestep
        soc: Series,
        /// State of charge as a fraction of the capacity
        utilisation: Series,
        /// State of charge before the first timestep
        soc_start: f64,
    },
    /// Results of a thermal system
    ThermalSystem {
        /// Temperature at the start of each timestep
        temperature: Series,
        /// Temperature after the last timestep
        temperature_end: f64,
    },
    /// Results of a deadtime
    Deadtime {
        /// Weighted inflow at each timestep
        input: Series,
        /// Weighted outflow at each timestep
        output: Series,
        /// Delay in timesteps
        delay: usize,
    },
    /// Results of a trigger demand
    TriggerDemand {
        /// Number of executions starting at each timestep
        executions: Series,
        /// Energy load at each timestep
        energy_load: Series,
        /// Material load at each timestep
        material_load: Series,
    },
    /// Results of a schedule
    Schedule {
        /// Weighted inflow at each timestep
        throughput: Series,
        /// Power delivered to each part demand at each timestep
        deliveries: Vec<Series>,
    },
    /// Results of a slack
    Slack {
        /// Flow through the slack at each timestep
        usage: Series,
        /// Total penalty
        cost: f64,
    },
}

/// Pair a time series with its name
fn named<'a>(name: &str, series: &'a Series) -> (String, &'a [f64]) {
    (name.to_string(), series.as_slice())
}

impl ComponentResult {
    /// The kind of component the result belongs to
    pub fn component_type(&self) -> ComponentType {
        match self {
            Self::Source { .. } => ComponentType::Source,
            Self::Sink { .. } => ComponentType::Sink,
            Self::Pool { .. } => ComponentType::Pool,
            Self::Converter { .. } => ComponentType::Converter,
            Self::Storage { .. } => ComponentType::Storage,
            Self::ThermalSystem { .. } => ComponentType::ThermalSystem,
            Self::Deadtime { .. } => ComponentType::Deadtime,
            Self::TriggerDemand { .. } => ComponentType::TriggerDemand,
            Self::Schedule { .. } => ComponentType::Schedule,
            Self::Slack { .. } => ComponentType::Slack,
        }
    }

    /// The time series of the result, by name
    pub fn series(&self) -> Vec<(String, &[f64])> {
        match self {
            Self::Source { utilisation, .. } | Self::Sink { utilisation, .. } => {
                vec![named("utilisation", utilisation)]
            }
            Self::Pool { throughput } => vec![named("throughput", throughput)],
            Self::Converter {
                operating_point,
                efficiency,
                on,
            } => {
                let mut series = vec![
                    named("operating_point", operating_point),
                    named("efficiency", efficiency),
                ];
                if let Some(on) = on {
                    series.push(named("on", on));
                }
                series
            }
            Self::Storage {
                charge,
                discharge,
                soc,
                utilisation,
                ..
            } => vec![
                named("charge", charge),
                named("discharge", discharge),
                named("soc", soc),
                named("utilisation", utilisation),
            ],
            Self::ThermalSystem { temperature, .. } => vec![named("temperature", temperature)],
            Self::Deadtime { input, output, .. } => {
                vec![named("input", input), named("output", output)]
            }
            Self::TriggerDemand {
                executions,
                energy_load,
                material_load,
            } => vec![
                named("executions", executions),
                named("energy_load", energy_load),
                named("material_load", material_load),
            ],
            Self::Schedule {
                throughput,
                deliveries,
            } => {
                let mut series = vec![named("throughput", throughput)];
                series.extend(
                    deliveries
                        .iter()
                        .enumerate()
                        .map(|(index, delivery)| named(&format!("delivery_{index}"), delivery)),
                );
                series
            }
            Self::Slack { usage, .. } => vec![named("usage", usage)],
        }
    }

    /// The scalar values of the result, by name
    pub fn scalars(&self) -> Vec<(&'static str, f64)> {
        match self {
            Self::Source {
                cost,
                emissions,
                emission_cost,
                ..
            } => vec![
                ("cost", *cost),
                ("emissions", *emissions),
                ("emission_cost", *emission_cost),
            ],
            Self::Sink {
                cost,
                revenue,
                emissions,
                emission_cost,
                ..
            } => vec![
                ("cost", *cost),
                ("revenue", *revenue),
                ("emissions", *emissions),
                ("emission_cost", *emission_cost),
            ],
            Self::Storage { soc_start, .. } => vec![("soc_start", *soc_start)],
            Self::ThermalSystem {
                temperature_end, ..
            } => vec![("temperature_end", *temperature_end)],
            Self::Deadtime { delay, .. } => vec![("delay", *delay as f64)],
            Self::Slack { cost, .. } => vec![("cost", *cost)],
            Self::Pool { .. }
            | Self::Converter { .. }
            | Self::TriggerDemand { .. }
            | Self::Schedule { .. } => Vec::new(),
        }
    }
}

/// The results of a solved simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Results {
    /// Value of the objective: costs minus revenues
    pub objective: f64,
    /// CO2 emitted by sources and sinks, net of refunds
    pub total_emissions: f64,
    /// Cost of the emissions at the scenario's CO2 price
    pub total_emission_cost: f64,
    /// Share of the energy used on site which was produced on site
    pub self_sufficiency: f64,
    /// Energy supplied by onsite sources
    pub onsite_energy: f64,
    /// Energy supplied by offsite sources
    pub offsite_energy: f64,
    /// Energy taken by onsite sinks, excluding losses
    pub onsite_consumption: f64,
    /// Energy taken by offsite sinks, such as a feed-in to the grid
    pub offsite_consumption: f64,
    /// Results of each connection
    pub connections: IndexMap<ConnectionID, ConnectionResult>,
    /// Results of each component
    pub components: IndexMap<ComponentID, ComponentResult>,
}

impl Results {
    /// The result of a component
    pub fn component(&self, key: &str) -> Option<&ComponentResult> {
        self.components.get(key)
    }

    /// The flow through the connection with the given name
    pub fn flow(&self, name: &str) -> Option<&[f64]> {
        self.connections
            .values()
            .find(|connection| connection.name == name)
            .map(|connection| connection.flow.as_slice())
    }
}

/// Reads results from a solution
struct Decoder<'a> {
    factory: &'a Factory,
    solution: &'a Solution<'a>,
    compiled: &'a CompiledFactory,
    horizon: usize,
    timestep: f64,
    co2_price: f64,
    options: &'a SolverOptions,
}

impl Decoder<'_> {
    fn clean(&self, value: f64) -> f64 {
        clean_value(
            value,
            self.options.result_epsilon,
            self.options.result_decimals,
        )
    }

    /// Σ series[t]·values[t]·Δ
    fn energy_weighted(&self, series: Option<&Series>, values: &[f64]) -> f64 {
        series.map_or(0.0, |series| {
            values
                .iter()
                .zip(series)
                .map(|(value, factor)| value * factor * self.timestep)
                .sum()
        })
    }

    fn inflow(&self, component: &Component) -> Series {
        self.solution.weighted_sum(
            self.factory.inputs(component),
            self.horizon,
            |c: &Connection| c.weight_destination,
        )
    }

    fn outflow(&self, component: &Component) -> Series {
        self.solution.weighted_sum(
            self.factory.outputs(component),
            self.horizon,
            |c: &Connection| c.weight_origin,
        )
    }

    fn peak_cost(&self, component: &Component, capacity_charge: f64) -> f64 {
        self.solution
            .component(&component.key, Role::Peak)
            .first()
            .map_or(0.0, |peak| {
                peak * capacity_charge * self.horizon as f64 * self.timestep / 8760.0
            })
    }

    fn decode_component(&self, component: &Component) -> ComponentResult {
        let solution = self.solution;
        let key = &component.key;
        match &component.kind {
            ComponentKind::Source(source) => {
                let utilisation = solution.component(key, Role::Power);
                let cost = self.energy_weighted(source.cost.as_ref(), &utilisation)
                    + self.peak_cost(component, source.capacity_charge);
                let emissions = self.energy_weighted(source.co2_emissions.as_ref(), &utilisation);
                ComponentResult::Source {
                    cost: self.clean(cost),
                    emissions: self.clean(emissions),
                    emission_cost: self.clean(emissions * self.co2_price),
                    utilisation,
                }
            }
            ComponentKind::Sink(sink) => {
                let utilisation = solution.component(key, Role::Power);
                let emissions = self.energy_weighted(sink.co2_emissions.as_ref(), &utilisation)
                    - self.energy_weighted(sink.co2_refund.as_ref(), &utilisation);
                ComponentResult::Sink {
                    cost: self.clean(self.energy_weighted(sink.cost.as_ref(), &utilisation)),
                    revenue: self
                        .clean(self.energy_weighted(sink.revenue.as_ref(), &utilisation)),
                    emissions: self.clean(emissions),
                    emission_cost: self.clean(emissions * self.co2_price),
                    utilisation,
                }
            }
            ComponentKind::Pool => ComponentResult::Pool {
                throughput: self.inflow(component),
            },
            ComponentKind::Converter(_) => {
                let is_energy = |c: &Connection| !self.factory.quantity(&c.flowtype).is_material();
                let energy_in = solution.weighted_sum(
                    self.factory.inputs(component).filter(|c| is_energy(c)),
                    self.horizon,
                    |_| 1.0,
                );
                let energy_out = solution.weighted_sum(
                    self.factory
                        .outputs(component)
                        .filter(|c| !c.to_losses && is_energy(c)),
                    self.horizon,
                    |_| 1.0,
                );
                let efficiency = energy_in
                    .iter()
                    .zip(&energy_out)
                    .map(|(input, output)| {
                        if *input > 0.0 {
                            self.clean(output / input)
                        } else {
                            0.0
                        }
                    })
                    .collect();
                let on = solution.component(key, Role::On);
                ComponentResult::Converter {
                    operating_point: solution.component(key, Role::OperatingPoint),
                    efficiency,
                    on: (!on.is_empty()).then_some(on),
                }
            }
            ComponentKind::Storage(storage) => {
                let soc = solution.component(key, Role::Soc);
                let utilisation = soc
                    .iter()
                    .map(|soc| {
                        if storage.capacity > 0.0 {
                            self.clean(soc / storage.capacity)
                        } else {
                            0.0
                        }
                    })
                    .collect();
                ComponentResult::Storage {
                    charge: solution.component(key, Role::Charge),
                    discharge: solution.component(key, Role::Discharge),
                    utilisation,
                    soc,
                    soc_start: solution
                        .component(key, Role::SocStart)
                        .first()
                        .copied()
                        .unwrap_or(0.0),
                }
            }
            ComponentKind::ThermalSystem(_) => {
                let mut temperature = solution.component(key, Role::Temperature);
                let temperature_end = temperature.pop().unwrap_or(0.0);
                ComponentResult::ThermalSystem {
                    temperature,
                    temperature_end,
                }
            }
            ComponentKind::Deadtime(_) => ComponentResult::Deadtime {
                input: self.inflow(component),
                output: self.outflow(component),
                delay: self.compiled.delays.get(key).copied().unwrap_or(0),
            },
            ComponentKind::TriggerDemand(trigger) => {
                let counts = solution.component(key, Role::Executions);
                let length = trigger.length();
                let offsets = trigger
                    .offsets()
                    .filter(|offset| offset + length <= self.horizon);
                let mut executions = vec![0.0; self.horizon];
                let mut loads = [vec![0.0; self.horizon], vec![0.0; self.horizon]];
                for (offset, count) in offsets.zip(counts) {
                    executions[offset] = count;
                    for (material, load) in [false, true].into_iter().zip(&mut loads) {
                        if let Some(profile) = trigger.profile(material) {
                            for (step, value) in profile.iter().enumerate() {
                                load[offset + step] += count * value;
                            }
                        }
                    }
                }
                let [energy_load, material_load] = loads.map(|load| {
                    load.into_iter()
                        .map(|value| self.clean(value))
                        .collect::<Series>()
                });
                ComponentResult::TriggerDemand {
                    executions,
                    energy_load,
                    material_load,
                }
            }
            ComponentKind::Schedule(schedule) => {
                let deliveries = schedule
                    .part_demands
                    .iter()
                    .enumerate()
                    .map(|(index, part)| {
                        let mut taken = solution.component(key, Role::Take(index)).into_iter();
                        (0..self.horizon)
                            .map(|t| {
                                if part.is_available(t) {
                                    taken.next().unwrap_or(0.0)
                                } else {
                                    0.0
                                }
                            })
                            .collect::<Series>()
                    })
                    .collect();
                ComponentResult::Schedule {
                    throughput: self.inflow(component),
                    deliveries,
                }
            }
            ComponentKind::Slack(slack) => {
                let factory = self.factory;
                let usage = solution.weighted_sum(
                    factory.inputs(component).chain(factory.outputs(component)),
                    self.horizon,
                    |_| 1.0,
                );
                let cost = self.energy_weighted(Some(&slack.cost), &usage);
                ComponentResult::Slack {
                    usage,
                    cost: self.clean(cost),
                }
            }
        }
    }

    /// Energy taken from onsite and offsite sources and given to onsite and offsite sinks.
    ///
    /// Structural components and material flows are not counted.
    fn energy_totals(&self) -> EnergyTotals {
        let mut totals = EnergyTotals::default();
        for component in self.factory.components.values() {
            if component.is_structural || self.factory.quantity(&component.flowtype).is_material()
            {
                continue;
            }

            let energy = || {
                self.solution
                    .component(&component.key, Role::Power)
                    .iter()
                    .sum::<f64>()
                    * self.timestep
            };
            match &component.kind {
                ComponentKind::Source(source) if source.is_onsite => {
                    totals.onsite_supply += energy();
                }
                ComponentKind::Source(_) => totals.offsite_supply += energy(),
                ComponentKind::Sink(sink) if sink.is_losses => {}
                ComponentKind::Sink(sink) if sink.is_onsite => {
                    totals.onsite_consumption += energy();
                }
                ComponentKind::Sink(_) => totals.offsite_consumption += energy(),
                _ => {}
            }
        }

        totals
    }
}

/// Energy totals over the horizon, split by the `is_onsite` flag of sources and sinks
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct EnergyTotals {
    onsite_supply: f64,
    offsite_supply: f64,
    onsite_consumption: f64,
    offsite_consumption: f64,
}

impl EnergyTotals {
    /// Share of the energy used on site which was produced on site.
    ///
    /// Energy sent offsite is taken out of the onsite production first.
    fn self_sufficiency(&self) -> f64 {
        let used_onsite = self.onsite_supply + self.offsite_supply - self.offsite_consumption;
        if used_onsite <= 0.0 {
            return 0.0;
        }

        ((self.onsite_supply - self.offsite_consumption) / used_onsite).clamp(0.0, 1.0)
    }
}

/// Read the results of a simulation from the solver's raw values
pub fn decode(
    factory: &Factory,
    scenario: &Scenario,
    compiled: &CompiledFactory,
    raw: &[f64],
    options: &SolverOptions,
) -> Results {
    let solution = Solution::new(raw, &compiled.variables, options);
    let decoder = Decoder {
        factory,
        solution: &solution,
        compiled,
        horizon: scenario.number_of_timesteps,
        timestep: scenario.timefactor,
        co2_price: scenario.co2_price(),
        options,
    };

    let connections = factory
        .connections
        .values()
        .map(|connection| {
            let result = ConnectionResult {
                name: connection.name.clone(),
                origin: connection.origin.clone(),
                destination: connection.destination.clone(),
                flowtype: connection.flowtype.clone(),
                flow: solution.flow(connection.id),
            };
            (connection.id, result)
        })
        .collect();

    let components: IndexMap<_, _> = factory
        .components
        .values()
        .map(|component| (component.key.clone(), decoder.decode_component(component)))
        .collect();

    let total_emissions: f64 = components
        .values()
        .map(|result| match result {
            ComponentResult::Source { emissions, .. } | ComponentResult::Sink { emissions, .. } => {
                *emissions
            }
            _ => 0.0,
        })
        .sum();

    let energy = decoder.energy_totals();

    Results {
        objective: decoder.clean(compiled.problem.objective_value(raw)),
        total_emissions: decoder.clean(total_emissions),
        total_emission_cost: decoder.clean(total_emissions * decoder.co2_price),
        self_sufficiency: decoder.clean(energy.self_sufficiency()),
        onsite_energy: decoder.clean(energy.onsite_supply),
        offsite_energy: decoder.clean(energy.offsite_supply),
        onsite_consumption: decoder.clean(energy.onsite_consumption),
        offsite_consumption: decoder.clean(energy.offsite_consumption),
        connections,
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionOptions;
    use crate::fixture::{factory, params, scenario};
    use crate::simulation::Simulation;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    /// Solar panels and a grid supplying a demand, with any surplus fed in to the grid
    fn feed_in_results(mut factory: Factory, scenario: &Scenario) -> Results {
        for (key, component_type, flowtype) in [
            ("pv", ComponentType::Source, Some("electricity")),
            ("grid", ComponentType::Source, Some("electricity")),
            ("busbar", ComponentType::Pool, None),
            ("demand", ComponentType::Sink, None),
            ("feed_in", ComponentType::Sink, None),
        ] {
            factory.add_component(key, component_type, flowtype).unwrap();
        }
        for (origin, destination) in [
            ("pv", "busbar"),
            ("grid", "busbar"),
            ("busbar", "demand"),
            ("busbar", "feed_in"),
        ] {
            factory
                .add_connection(origin, destination, &ConnectionOptions::default())
                .unwrap();
        }
        let configuration = [
            (
                "pv",
                params([(
                    "determined_power",
                    vec![8.0, 2.0, 2.0, 0.0, 0.0].into(),
                )]),
            ),
            (
                "grid",
                params([("cost", 1.0.into()), ("is_onsite", false.into())]),
            ),
            ("demand", params([("demand", 5.0.into())])),
            (
                "feed_in",
                params([("revenue", 0.5.into()), ("is_onsite", false.into())]),
            ),
        ];
        for (key, parameters) in configuration {
            factory.set_configuration(key, &parameters).unwrap();
        }

        let mut simulation = Simulation::new(&factory, scenario).unwrap();
        simulation.simulate(&SolverOptions::default()).unwrap();
        simulation.results.unwrap()
    }

    #[rstest]
    fn test_energy_totals_split_by_onsite_flag(factory: Factory, scenario: Scenario) {
        let results = feed_in_results(factory, &scenario);

        // The surplus of 3 in the first hour is sold, then the grid covers 3 in each later hour
        assert_approx_eq!(f64, results.onsite_energy, 12.0, epsilon = 1e-6);
        assert_approx_eq!(f64, results.offsite_energy, 6.0, epsilon = 1e-6);
        assert_approx_eq!(f64, results.onsite_consumption, 15.0, epsilon = 1e-6);
        assert_approx_eq!(f64, results.offsite_consumption, 3.0, epsilon = 1e-6);
        assert_approx_eq!(f64, results.self_sufficiency, 0.6, epsilon = 1e-6);
        assert_approx_eq!(f64, results.objective, 4.5, epsilon = 1e-6);
    }

    #[rstest]
    #[case(10.0, 0.0, 0.0, 1.0)]
    #[case(6.0, 4.0, 0.0, 0.6)]
    #[case(6.0, 4.0, 1.0, 5.0 / 9.0)]
    #[case(2.0, 4.0, 3.0, 0.0)]
    #[case(0.0, 0.0, 0.0, 0.0)]
    fn test_self_sufficiency(
        #[case] onsite_supply: f64,
        #[case] offsite_supply: f64,
        #[case] offsite_consumption: f64,
        #[case] expected: f64,
    ) {
        let totals = EnergyTotals {
            onsite_supply,
            offsite_supply,
            onsite_consumption: onsite_supply + offsite_supply - offsite_consumption,
            offsite_consumption,
        };
        assert_approx_eq!(f64, totals.self_sufficiency(), expected, epsilon = 1e-9);
    }

    #[rstest]
    #[case(1e-7, 0.0)]
    #[case(-1e-7, 0.0)]
    #[case(1.234_567_89, 1.234_568)]
    #[case(-2.5, -2.5)]
    fn test_clean_value(#[case] value: f64, #[case] expected: f64) {
        assert_eq!(clean_value(value, 1e-6, 6), expected);
    }

    #[test]
    fn test_clean_value_no_negative_zero() {
        let cleaned = clean_value(-4e-7, 1e-7, 6);
        assert!(cleaned == 0.0 && cleaned.is_sign_positive());
    }
}
