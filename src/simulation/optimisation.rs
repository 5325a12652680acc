//! Code for compiling a factory into an optimisation problem.
//!
//! Every connection gets one flow variable per timestep. Components then add their own variables
//! and constraints on top of the flows, depending on their kind.
use super::problem::{Problem, Var};
use crate::component::{Component, ComponentKind};
use crate::connection::Connection;
use crate::factory::Factory;
use crate::id::{ComponentID, ConnectionID};
use crate::parameter::Series;
use crate::scenario::Scenario;
use indexmap::IndexMap;
use log::debug;

mod constraints;
use constraints::{
    add_converter_constraints, add_deadtime_constraints, add_pool_constraints,
    add_schedule_constraints, add_sink_constraints, add_slack_costs, add_source_constraints,
    add_storage_constraints, add_thermal_constraints, add_trigger_constraints,
};

/// A sum of variables with coefficients
pub type Terms = Vec<(Var, f64)>;

/// What a group of component variables stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Power delivered by a source or taken by a sink
    Power,
    /// Highest power or operating point over the horizon
    Peak,
    /// Operating point of a converter
    OperatingPoint,
    /// Whether a switchable converter is running
    On,
    /// Charging power of a storage
    Charge,
    /// Discharging power of a storage
    Discharge,
    /// State of charge of a storage before the first timestep
    SocStart,
    /// State of charge of a storage at the end of each timestep
    Soc,
    /// Temperature of a thermal system at the start of each timestep, plus the projected final one
    Temperature,
    /// Number of executions of a trigger demand starting at each allowed offset
    Executions,
    /// Power delivered to the part demand with the given index, at each timestep it is available
    Take(usize),
}

/// A map for easy lookup of variables in the problem.
///
/// We use this data structure for two things:
///
/// 1. In order to define constraints for the optimisation
/// 2. To keep track of what each variable stands for, for when we are reading the results of the
///    optimisation.
#[derive(Debug, Default, Clone)]
pub struct VariableMap {
    flows: IndexMap<ConnectionID, Vec<Var>>,
    components: IndexMap<(ComponentID, Role), Vec<Var>>,
}

impl VariableMap {
    /// The flow variables of a connection, one per timestep
    pub fn flows(&self, id: ConnectionID) -> &[Var] {
        self.flows
            .get(&id)
            .expect("No flow variables found for connection")
    }

    /// The variables of a component with the given role, if it has any
    pub fn get(&self, key: &ComponentID, role: Role) -> Option<&[Var]> {
        self.components
            .get(&(key.clone(), role))
            .map(Vec::as_slice)
    }

    fn insert(&mut self, key: &ComponentID, role: Role, vars: Vec<Var>) {
        let existing = self.components.insert((key.clone(), role), vars);
        assert!(existing.is_none(), "Variables of {key} registered twice");
    }
}

/// The optimisation problem for a factory along with its variables
#[derive(Debug, Clone)]
pub struct CompiledFactory {
    /// The problem to hand to the solver
    pub problem: Problem,
    /// Lookup of the problem's variables
    pub variables: VariableMap,
    /// Delay of each deadtime in timesteps of the scenario
    pub delays: IndexMap<ComponentID, usize>,
}

/// State shared by the code which adds each kind of component to the problem
pub struct ModelBuilder<'a> {
    /// The factory, already resolved against the scenario
    pub factory: &'a Factory,
    /// Number of timesteps
    pub horizon: usize,
    /// Hours per timestep
    pub timestep: f64,
    /// Factory timesteps per scenario timestep, used to convert delays
    pub time_ratio: f64,
    /// Price per kg of CO2
    pub co2_price: f64,
    /// The problem under construction
    pub problem: Problem,
    /// Variables added so far
    pub variables: VariableMap,
    delays: IndexMap<ComponentID, usize>,
}

impl<'a> ModelBuilder<'a> {
    fn new(factory: &'a Factory, scenario: &Scenario) -> Self {
        Self {
            factory,
            horizon: scenario.number_of_timesteps,
            timestep: scenario.timefactor,
            time_ratio: factory.timefactor / scenario.timefactor,
            co2_price: scenario.co2_price(),
            problem: Problem::default(),
            variables: VariableMap::default(),
            delays: IndexMap::new(),
        }
    }

    /// The flow variables of a connection
    pub fn flows(&self, id: ConnectionID) -> &[Var] {
        self.variables.flows(id)
    }

    /// Σ flow·weight_destination over the inputs of `component` selected by `include`, at `t`
    pub fn inflow<F>(&self, component: &Component, t: usize, include: F) -> Terms
    where
        F: Fn(&Connection) -> bool,
    {
        self.factory
            .inputs(component)
            .filter(|connection| include(connection))
            .map(|connection| (self.flows(connection.id)[t], connection.weight_destination))
            .collect()
    }

    /// Σ flow·weight_origin over the outputs of `component` selected by `include`, at `t`
    pub fn outflow<F>(&self, component: &Component, t: usize, include: F) -> Terms
    where
        F: Fn(&Connection) -> bool,
    {
        self.factory
            .outputs(component)
            .filter(|connection| include(connection))
            .map(|connection| (self.flows(connection.id)[t], connection.weight_origin))
            .collect()
    }

    /// Add one variable per timestep, with bounds given by `bounds(t)`, and register it
    pub fn add_series<F>(&mut self, key: &ComponentID, role: Role, bounds: F) -> Vec<Var>
    where
        F: Fn(usize) -> (f64, f64),
    {
        let vars: Vec<_> = (0..self.horizon)
            .map(|t| {
                let (min, max) = bounds(t);
                self.problem.add_var(min, max)
            })
            .collect();
        self.variables.insert(key, role, vars.clone());

        vars
    }

    /// Register variables created by the caller
    pub fn register(&mut self, key: &ComponentID, role: Role, vars: Vec<Var>) {
        self.variables.insert(key, role, vars);
    }

    /// Add a variable bounded below by each of `vars` and put `cost` on it
    pub fn add_peak(&mut self, key: &ComponentID, vars: &[Var], cost: f64) {
        let peak = self.problem.add_var(0.0, f64::INFINITY);
        self.problem.add_cost(peak, cost);
        for var in vars {
            self.problem.add_ge(vec![(peak, 1.0), (*var, -1.0)], 0.0);
        }
        self.register(key, Role::Peak, vec![peak]);
    }

    /// Put a cost per unit of energy (`series[t]·Δ`) on each of `vars`
    pub fn add_energy_costs(&mut self, vars: &[Var], series: &Series, factor: f64) {
        for (t, var) in vars.iter().enumerate() {
            self.problem
                .add_cost(*var, series[t] * self.timestep * factor);
        }
    }

    /// The yearly fraction of a capacity charge which applies to the horizon
    pub fn capacity_charge_factor(&self) -> f64 {
        self.horizon as f64 * self.timestep / 8760.0
    }

    fn add_flow_variables(&mut self) {
        let factory = self.factory;
        for id in factory.connections.keys() {
            let vars = (0..self.horizon)
                .map(|_| self.problem.add_var(0.0, f64::INFINITY))
                .collect();
            self.variables.flows.insert(*id, vars);
        }
    }
}

/// Negate every coefficient of a sum
pub fn negated(terms: Terms) -> impl Iterator<Item = (Var, f64)> {
    terms
        .into_iter()
        .map(|(var, coefficient)| (var, -coefficient))
}

/// Compile a factory, already resolved against `scenario`, into an optimisation problem.
///
/// The objective is the sum of all costs minus the sum of all revenues.
pub fn compile(factory: &Factory, scenario: &Scenario) -> CompiledFactory {
    let mut builder = ModelBuilder::new(factory, scenario);
    builder.add_flow_variables();

    for component in factory.components.values() {
        match &component.kind {
            ComponentKind::Source(source) => {
                add_source_constraints(&mut builder, component, source);
            }
            ComponentKind::Sink(sink) => add_sink_constraints(&mut builder, component, sink),
            ComponentKind::Pool => add_pool_constraints(&mut builder, component),
            ComponentKind::Converter(converter) => {
                add_converter_constraints(&mut builder, component, converter);
            }
            ComponentKind::Storage(storage) => {
                add_storage_constraints(&mut builder, component, storage);
            }
            ComponentKind::ThermalSystem(thermal) => {
                add_thermal_constraints(&mut builder, component, thermal);
            }
            ComponentKind::Deadtime(deadtime) => {
                let delay = add_deadtime_constraints(&mut builder, component, deadtime);
                builder.delays.insert(component.key.clone(), delay);
            }
            ComponentKind::TriggerDemand(trigger) => {
                add_trigger_constraints(&mut builder, component, trigger);
            }
            ComponentKind::Schedule(schedule) => {
                add_schedule_constraints(&mut builder, component, schedule);
            }
            ComponentKind::Slack(slack) => add_slack_costs(&mut builder, component, slack),
        }
    }

    debug!(
        "Compiled factory {} into {} variables and {} constraints",
        factory.name,
        builder.problem.num_vars(),
        builder.problem.num_constraints()
    );

    CompiledFactory {
        problem: builder.problem,
        variables: builder.variables,
        delays: builder.delays,
    }
}
