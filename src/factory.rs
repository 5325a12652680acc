//! The factory is the arena which owns the component graph.
//!
//! Components are keyed by their string key and connections by a [`ConnectionID`] handed out from
//! an explicit counter. Components refer to their connections by handle only, so the graph holds
//! no references between its parts.
use crate::component::{Component, ComponentKind, ComponentType, Port, Sink, Source};
use crate::connection::{Connection, ConnectionOptions, derive_flowtype};
use crate::error::{ModelError, ModelResult};
use crate::flowtype::{
    ENERGY_LOSSES_FLOWTYPE, FlowType, HEAT_FLOWTYPE, MATERIAL_LOSSES_FLOWTYPE, UNKNOWN_FLOWTYPE,
};
use crate::id::{ComponentID, ConnectionID, FlowTypeID, UnitID};
use crate::parameter::{ParameterMap, ParameterValue};
use crate::scenario::Scenario;
use crate::units::{QuantityType, Unit};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;

mod propagation;
mod validation;

/// Key of the sink which takes energy losses
pub const LOSSES_ENERGY: &str = "losses_energy";

/// Key of the sink which takes material losses
pub const LOSSES_MATERIAL: &str = "losses_material";

/// Key of the source which supplies ambient heat to thermal systems
pub const AMBIENT_GAINS: &str = "ambient_gains";

/// Cost per unit of ambient heat.
///
/// Without it the solver could route ambient heat straight into the losses at no cost.
pub const AMBIENT_GAINS_COST: f64 = 1e-3;

/// Global options for a factory
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FactoryOptions {
    /// Name of the factory
    pub name: String,
    /// Free text description
    pub description: String,
    /// Number of timesteps static time series must cover
    pub max_timesteps: usize,
    /// Hours per timestep
    pub timefactor: f64,
    /// Whether to attach a slack to every pool, deadtime, thermal system and sink
    pub enable_slacks: bool,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            name: "factory".into(),
            description: String::new(),
            max_timesteps: 168,
            timefactor: 1.0,
            enable_slacks: false,
        }
    }
}

/// A graph of components joined by connections
#[derive(Debug, Clone, PartialEq)]
pub struct Factory {
    /// Name of the factory
    pub name: String,
    /// Free text description
    pub description: String,
    /// Components in the order they were added
    pub components: IndexMap<ComponentID, Component>,
    /// Connections in the order they were added
    pub connections: IndexMap<ConnectionID, Connection>,
    /// Known flowtypes
    pub flowtypes: IndexMap<FlowTypeID, FlowType>,
    /// Known units
    pub units: IndexMap<UnitID, Unit>,
    /// Number of timesteps static time series must cover
    pub max_timesteps: usize,
    /// Hours per timestep
    pub timefactor: f64,
    /// Whether slacks are attached to new components
    pub enable_slacks: bool,
    next_connection_id: u32,
}

impl Factory {
    /// Create a factory holding only the default units, flowtypes and structural components
    pub fn new(options: FactoryOptions) -> Self {
        let mut factory = Self {
            name: options.name,
            description: options.description,
            components: IndexMap::new(),
            connections: IndexMap::new(),
            flowtypes: IndexMap::new(),
            units: IndexMap::new(),
            max_timesteps: options.max_timesteps,
            timefactor: options.timefactor,
            enable_slacks: options.enable_slacks,
            next_connection_id: 0,
        };

        for unit in [Unit::energy(), Unit::material(), Unit::unspecified()] {
            factory.units.insert(unit.key.clone(), unit);
        }

        for (key, unit, color) in [
            (UNKNOWN_FLOWTYPE, "unspecified", "#808080"),
            (ENERGY_LOSSES_FLOWTYPE, "energy", "#d3d3d3"),
            (MATERIAL_LOSSES_FLOWTYPE, "material", "#a9a9a9"),
            (HEAT_FLOWTYPE, "energy", "#ff8c00"),
        ] {
            let flowtype = FlowType::new(key, unit.into(), Some(color));
            factory.flowtypes.insert(flowtype.key.clone(), flowtype);
        }

        let horizon = factory.max_timesteps;
        for (key, flowtype) in [
            (LOSSES_ENERGY, ENERGY_LOSSES_FLOWTYPE),
            (LOSSES_MATERIAL, MATERIAL_LOSSES_FLOWTYPE),
        ] {
            let mut sink =
                Component::new(key.into(), ComponentType::Sink, flowtype.into(), horizon);
            sink.kind = ComponentKind::Sink(Sink::losses());
            sink.is_structural = true;
            factory.components.insert(sink.key.clone(), sink);
        }

        let mut gains = Component::new(
            AMBIENT_GAINS.into(),
            ComponentType::Source,
            HEAT_FLOWTYPE.into(),
            horizon,
        );
        gains.is_structural = true;
        gains.kind = ComponentKind::Source(Source {
            cost: Some(vec![AMBIENT_GAINS_COST; horizon]),
            ..Source::default()
        });
        // Stored so that the cost is kept when the factory is resolved against a scenario
        gains.parameters = [("cost".to_string(), ParameterValue::Number(AMBIENT_GAINS_COST))]
            .into_iter()
            .collect();
        factory.components.insert(gains.key.clone(), gains);

        factory
    }

    /// Look up a component by key
    pub fn component(&self, key: &str) -> ModelResult<&Component> {
        self.components
            .get(key)
            .ok_or_else(|| ModelError::structure(format!("Component {key} does not exist")))
    }

    fn component_mut(&mut self, key: &str) -> ModelResult<&mut Component> {
        self.components
            .get_mut(key)
            .ok_or_else(|| ModelError::structure(format!("Component {key} does not exist")))
    }

    /// Look up a connection by handle
    pub fn connection(&self, id: ConnectionID) -> ModelResult<&Connection> {
        self.connections
            .get(&id)
            .ok_or_else(|| ModelError::structure(format!("Connection {id} does not exist")))
    }

    /// Iterate over the incoming connections of a component
    pub fn inputs<'a>(&'a self, component: &'a Component) -> impl Iterator<Item = &'a Connection> {
        component.inputs.iter().map(|id| &self.connections[id])
    }

    /// Iterate over the outgoing connections of a component
    pub fn outputs<'a>(
        &'a self,
        component: &'a Component,
    ) -> impl Iterator<Item = &'a Connection> {
        component.outputs.iter().map(|id| &self.connections[id])
    }

    /// The quantity type of a flowtype, resolved through its unit
    pub fn quantity(&self, flowtype: &FlowTypeID) -> QuantityType {
        self.flowtypes
            .get(flowtype)
            .and_then(|flowtype| self.units.get(&flowtype.unit))
            .map_or(QuantityType::Unspecified, |unit| unit.quantity_type)
    }

    /// Whether a key is already used by a component or a flowtype
    fn is_key_taken(&self, key: &str) -> bool {
        self.components.contains_key(key) || self.flowtypes.contains_key(key)
    }

    /// Add a unit.
    ///
    /// # Returns
    ///
    /// The key of the new unit
    pub fn add_unit(&mut self, unit: Unit) -> ModelResult<UnitID> {
        if self.units.contains_key(&unit.key) {
            return Err(ModelError::structure(format!(
                "Unit {} already exists",
                unit.key
            )));
        }

        let key = unit.key.clone();
        self.units.insert(key.clone(), unit);

        Ok(key)
    }

    /// Add a flowtype measured in `unit`.
    ///
    /// # Returns
    ///
    /// The key of the new flowtype
    pub fn add_flowtype(
        &mut self,
        key: &str,
        unit: &str,
        color: Option<&str>,
    ) -> ModelResult<FlowTypeID> {
        if self.is_key_taken(key) {
            return Err(ModelError::structure(format!(
                "The key {key} is already in use"
            )));
        }
        let Some((unit, _)) = self.units.get_key_value(unit) else {
            return Err(ModelError::structure(format!("Unit {unit} does not exist")));
        };

        let flowtype = FlowType::new(key, unit.clone(), color);
        let key = flowtype.key.clone();
        self.flowtypes.insert(key.clone(), flowtype);

        Ok(key)
    }

    /// Add a component and any connections it needs to its structural components and slack.
    ///
    /// Nothing is modified if the key is already in use.
    ///
    /// # Arguments
    ///
    /// * `key` - Unique key of the new component
    /// * `component_type` - What kind of component to create
    /// * `flowtype` - The flowtype of the component, if known
    ///
    /// # Returns
    ///
    /// The key of the new component
    pub fn add_component(
        &mut self,
        key: &str,
        component_type: ComponentType,
        flowtype: Option<&str>,
    ) -> ModelResult<ComponentID> {
        if self.is_key_taken(key) {
            return Err(ModelError::structure(format!(
                "The key {key} is already in use"
            )));
        }
        let flowtype = self.flowtype_id(flowtype.unwrap_or(UNKNOWN_FLOWTYPE))?;

        let slack_key = format!("slack_{key}");
        let needs_slack = self.enable_slacks
            && matches!(
                component_type,
                ComponentType::Pool
                    | ComponentType::Deadtime
                    | ComponentType::ThermalSystem
                    | ComponentType::Sink
            );
        if needs_slack && self.is_key_taken(&slack_key) {
            return Err(ModelError::structure(format!(
                "The key {slack_key} is already in use"
            )));
        }

        let component = Component::new(
            key.into(),
            component_type,
            flowtype.clone(),
            self.max_timesteps,
        );
        let key = component.key.clone();
        self.components.insert(key.clone(), component);
        debug!("Added {component_type} {key}");

        match component_type {
            ComponentType::Storage => {
                let losses = losses_sink_for(self.quantity(&flowtype));
                self.connect(key.as_str(), losses, &ConnectionOptions::default(), false)?;
            }
            ComponentType::Converter => {
                self.connect(key.as_str(), LOSSES_ENERGY, &ConnectionOptions::default(), false)?;
            }
            ComponentType::ThermalSystem => {
                self.connect(key.as_str(), LOSSES_ENERGY, &ConnectionOptions::default(), false)?;
                self.connect(AMBIENT_GAINS, key.as_str(), &ConnectionOptions::default(), false)?;
            }
            _ => {}
        }

        if needs_slack {
            let slack = Component::new(
                slack_key.as_str().into(),
                ComponentType::Slack,
                flowtype,
                self.max_timesteps,
            );
            let slack_key = slack.key.clone();
            self.components.insert(slack_key.clone(), slack);
            self.connect(slack_key.as_str(), key.as_str(), &ConnectionOptions::default(), false)?;
            if component_type != ComponentType::Sink {
                self.connect(key.as_str(), slack_key.as_str(), &ConnectionOptions::default(), false)?;
            }
        }

        Ok(key)
    }

    fn flowtype_id(&self, key: &str) -> ModelResult<FlowTypeID> {
        self.flowtypes
            .get_key_value(key)
            .map(|(key, _)| key.clone())
            .ok_or_else(|| ModelError::structure(format!("Flowtype {key} does not exist")))
    }

    /// Add a connection from `origin` to `destination`.
    ///
    /// The flowtype is derived from the endpoints if not given and then propagated through the
    /// graph. Nothing is modified if any check fails.
    ///
    /// # Returns
    ///
    /// The handle of the new connection
    pub fn add_connection(
        &mut self,
        origin: &str,
        destination: &str,
        options: &ConnectionOptions,
    ) -> ModelResult<ConnectionID> {
        let id = self.connect(origin, destination, options, true)?;
        self.sync_losses_edges()?;

        Ok(id)
    }

    fn connect(
        &mut self,
        origin: &str,
        destination: &str,
        options: &ConnectionOptions,
        by_user: bool,
    ) -> ModelResult<ConnectionID> {
        let origin = self.component(origin)?;
        let destination = self.component(destination)?;
        if origin.key == destination.key {
            return Err(ModelError::structure(format!(
                "Cannot connect {} to itself",
                origin.name
            )));
        }
        if matches!(origin.kind, ComponentKind::ThermalSystem(_))
            && matches!(destination.kind, ComponentKind::ThermalSystem(_))
        {
            return Err(ModelError::structure(format!(
                "Thermal systems cannot be connected directly ({} to {})",
                origin.name, destination.name
            )));
        }
        let to_losses = destination.is_losses_sink();
        let from_gains = origin.key.as_str() == AMBIENT_GAINS;
        if by_user {
            if to_losses && !origin.may_connect_to_losses() {
                return Err(ModelError::structure(format!(
                    "Only pools can be connected to {} (got {})",
                    destination.name, origin.name
                )));
            }
            if from_gains {
                return Err(ModelError::structure(format!(
                    "{AMBIENT_GAINS} can only supply thermal systems"
                )));
            }
        }
        options.validate()?;

        let flowtype = if to_losses {
            destination.flowtype.clone()
        } else if from_gains {
            HEAT_FLOWTYPE.into()
        } else {
            let explicit = options
                .flowtype
                .as_ref()
                .map(|key| self.flowtype_id(key.as_str()))
                .transpose()?;
            derive_flowtype(origin, destination, explicit.as_ref())?
        };

        let id = ConnectionID(self.next_connection_id);
        let mut name = format!("{}_to_{}", origin.key, destination.key);
        if self.connections.values().any(|c| c.name == name) {
            name = format!("{name}_{id}");
        }
        let connection = Connection {
            id,
            name,
            origin: origin.key.clone(),
            destination: destination.key.clone(),
            flowtype,
            weight_origin: options.weight_origin,
            weight_destination: options.weight_destination,
            to_losses,
            from_gains,
            is_slack: origin.is_slack() || destination.is_slack(),
        };

        let port = self.port(&connection);
        let existing_inputs: Vec<Port> = self.inputs(destination).map(|c| self.port(c)).collect();
        let existing_outputs: Vec<Port> = self.outputs(origin).map(|c| self.port(c)).collect();

        // Flowtypes are checked before the endpoints are touched
        let plan = if connection.propagates() && connection.has_known_flowtype() {
            self.plan_propagation([
                (
                    connection.origin.clone(),
                    connection.flowtype.clone(),
                    connection.destination.clone(),
                ),
                (
                    connection.destination.clone(),
                    connection.flowtype.clone(),
                    connection.origin.clone(),
                ),
            ])?
        } else {
            propagation::PropagationPlan::default()
        };

        let origin = connection.origin.clone();
        let destination = connection.destination.clone();
        self.component_mut(destination.as_str())?
            .set_input(id, port, &existing_inputs)?;
        let output = self
            .component_mut(origin.as_str())?
            .set_output(id, port, &existing_outputs);
        if let Err(err) = output {
            // Undo the input so that a rejected connection leaves no trace
            self.component_mut(destination.as_str())?.inputs.pop();
            return Err(err);
        }

        debug!(
            "Added connection {} ({})",
            connection.name, connection.flowtype
        );
        self.next_connection_id += 1;
        self.connections.insert(id, connection);
        self.commit_propagation(plan);

        Ok(id)
    }

    /// Summarise a connection for cardinality checks
    pub fn port(&self, connection: &Connection) -> Port {
        Port {
            quantity: self.quantity(&connection.flowtype),
            is_slack: connection.is_slack,
            to_losses: connection.to_losses,
            from_gains: connection.from_gains,
        }
    }

    /// Keep the automatic losses connections in line with the flowtypes now known.
    ///
    /// Converters with a material input get a connection to the material losses sink, and storages
    /// of material have their losses redirected to it.
    fn sync_losses_edges(&mut self) -> ModelResult<()> {
        let converters: Vec<ComponentID> = self
            .components
            .values()
            .filter(|component| matches!(component.kind, ComponentKind::Converter(_)))
            .filter(|component| {
                let has_material_input = self.inputs(component).any(|c| {
                    c.propagates() && !c.is_slack && self.quantity(&c.flowtype).is_material()
                });
                let has_material_losses = self
                    .outputs(component)
                    .any(|c| c.destination.as_str() == LOSSES_MATERIAL);
                has_material_input && !has_material_losses
            })
            .map(|component| component.key.clone())
            .collect();
        for key in converters {
            self.connect(key.as_str(), LOSSES_MATERIAL, &ConnectionOptions::default(), false)?;
        }

        let misdirected: Vec<ConnectionID> = self
            .components
            .values()
            .filter(|component| {
                matches!(component.kind, ComponentKind::Storage(_))
                    && self.quantity(&component.flowtype).is_material()
            })
            .flat_map(|component| self.outputs(component))
            .filter(|c| c.destination.as_str() == LOSSES_ENERGY)
            .map(|c| c.id)
            .collect();
        for id in misdirected {
            let connection = &mut self.connections[&id];
            connection.destination = LOSSES_MATERIAL.into();
            connection.flowtype = MATERIAL_LOSSES_FLOWTYPE.into();
            connection.name = format!("{}_to_{LOSSES_MATERIAL}", connection.origin);
            self.component_mut(LOSSES_ENERGY)?.inputs.retain(|input| *input != id);
            self.component_mut(LOSSES_MATERIAL)?.inputs.push(id);
        }

        Ok(())
    }

    /// Apply parameters to a component.
    ///
    /// Time series must cover at least `max_timesteps` values. The component is left unchanged if
    /// any parameter is invalid.
    pub fn set_configuration(&mut self, key: &str, params: &ParameterMap) -> ModelResult<()> {
        let horizon = self.max_timesteps;
        self.component_mut(key)?.configure(params, horizon)
    }

    /// Declare that some of a component's parameters are read from the scenario.
    ///
    /// # Arguments
    ///
    /// * `key` - The component
    /// * `mapping` - Maps parameter names to the names of scenario time series or scalars
    pub fn set_scenario_data(
        &mut self,
        key: &str,
        mapping: IndexMap<String, String>,
    ) -> ModelResult<()> {
        let component = self.component_mut(key)?;
        let allowed = component.parameter_names();
        if let Some(name) = mapping.keys().find(|name| !allowed.contains(&name.as_str())) {
            return Err(ModelError::configuration(
                key,
                format!("Unknown parameter '{name}' in scenario data"),
            ));
        }
        component.scenario_data = mapping;

        Ok(())
    }

    /// Create a copy of the factory with every component configured for `scenario`.
    ///
    /// Static parameters are merged with the values the components read from the scenario, and
    /// all time series are resized to the scenario's horizon.
    pub fn resolve_scenario(&self, scenario: &Scenario) -> ModelResult<Factory> {
        let horizon = scenario.number_of_timesteps;
        let mut factory = self.clone();
        for component in factory.components.values_mut() {
            if component.is_scenario_dependent() {
                debug!(
                    "Reading {} parameters of {} from scenario {}",
                    component.scenario_data.len(),
                    component.key,
                    scenario.name
                );
            }

            let mut params = component.parameters.clone();
            for (name, scenario_key) in &component.scenario_data {
                let value = scenario.get_value(scenario_key).map_err(|err| {
                    ModelError::configuration(
                        &component.key,
                        format!("cannot read {name} from the scenario: {err}"),
                    )
                })?;
                params.insert(name.clone(), value);
            }
            component.configure(&params, horizon)?;
            // Keep the static parameters so the factory can be resolved again
            component.parameters = self.components[&component.key].parameters.clone();
        }

        Ok(factory)
    }

    /// Number of components a user has added (excluding structural components)
    pub fn user_component_count(&self) -> usize {
        self.components
            .values()
            .filter(|component| !component.is_structural)
            .count()
    }
}

/// Key of the losses sink for flows of the given quantity
pub fn losses_sink_for(quantity: QuantityType) -> &'static str {
    if quantity.is_material() {
        LOSSES_MATERIAL
    } else {
        LOSSES_ENERGY
    }
}
