//! Components are the nodes of a factory graph.
//!
//! Every component has a small set of common attributes (key, name, flowtype, connections) plus a
//! kind-specific configuration held in [`ComponentKind`].
use crate::error::{ModelError, ModelResult};
use crate::id::{ComponentID, ConnectionID, FlowTypeID};
use crate::parameter::{ParameterMap, ParameterReader};
use crate::units::QuantityType;
use indexmap::IndexMap;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

mod bounds;
pub use bounds::PowerBounds;
mod converter;
pub use converter::{Converter, Efficiency, VariableEfficiency};
mod deadtime;
pub use deadtime::Deadtime;
mod schedule;
pub use schedule::{PartDemand, Schedule};
mod sink;
pub use sink::Sink;
mod slack;
pub use slack::{SLACK_COST, Slack};
mod source;
pub use source::Source;
mod storage;
pub use storage::Storage;
mod thermal;
pub use thermal::ThermalSystem;
mod trigger;
pub use trigger::TriggerDemand;

/// Upper bound applied to flows which are otherwise unbounded, keeping the problem bounded
pub const BIG_M_POWER: f64 = 1e7;

/// Parameters accepted by every kind of component
const COMMON_PARAMETERS: [&str; 2] = ["name", "description"];

/// The type tag of a component
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumIter,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
#[strum(serialize_all = "lowercase")]
pub enum ComponentType {
    #[string = "source"]
    Source,
    #[string = "sink"]
    Sink,
    #[string = "pool"]
    Pool,
    #[string = "converter"]
    Converter,
    #[string = "storage"]
    Storage,
    #[string = "thermalsystem"]
    ThermalSystem,
    #[string = "deadtime"]
    Deadtime,
    #[string = "triggerdemand"]
    TriggerDemand,
    #[string = "schedule"]
    Schedule,
    #[string = "slack"]
    Slack,
}

/// How a component takes part in flowtype propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowtypePolicy {
    /// The component has a single flowtype which it pushes to all of its connections
    Broadcast,
    /// The component has a single flowtype but does not push it to its other connections
    Adopt,
    /// The component may carry several flowtypes and is ignored by propagation
    Ignore,
}

/// The kind-specific configuration of a component
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    /// Produces a flow
    Source(Source),
    /// Consumes a flow
    Sink(Sink),
    /// Conserves flow between its inputs and outputs
    Pool,
    /// Transforms inputs into outputs through a single operating point
    Converter(Converter),
    /// Stores a single flow over time
    Storage(Storage),
    /// A first-order thermal node
    ThermalSystem(ThermalSystem),
    /// Delays a flow by a fixed number of timesteps
    Deadtime(Deadtime),
    /// Executes a fixed load profile a number of times
    TriggerDemand(TriggerDemand),
    /// Delivers volumes within deadlines
    Schedule(Schedule),
    /// Expensive overflow/underflow valve
    Slack(Slack),
}

impl ComponentKind {
    /// Create the default configuration for the given component type
    pub fn new(component_type: ComponentType, horizon: usize) -> Self {
        match component_type {
            ComponentType::Source => Self::Source(Source::default()),
            ComponentType::Sink => Self::Sink(Sink::default()),
            ComponentType::Pool => Self::Pool,
            ComponentType::Converter => Self::Converter(Converter::default()),
            ComponentType::Storage => Self::Storage(Storage::default()),
            ComponentType::ThermalSystem => Self::ThermalSystem(ThermalSystem::default()),
            ComponentType::Deadtime => Self::Deadtime(Deadtime::default()),
            ComponentType::TriggerDemand => Self::TriggerDemand(TriggerDemand::default()),
            ComponentType::Schedule => Self::Schedule(Schedule::default()),
            ComponentType::Slack => Self::Slack(Slack::new(horizon)),
        }
    }

    /// The type tag of this configuration
    pub fn component_type(&self) -> ComponentType {
        match self {
            Self::Source(_) => ComponentType::Source,
            Self::Sink(_) => ComponentType::Sink,
            Self::Pool => ComponentType::Pool,
            Self::Converter(_) => ComponentType::Converter,
            Self::Storage(_) => ComponentType::Storage,
            Self::ThermalSystem(_) => ComponentType::ThermalSystem,
            Self::Deadtime(_) => ComponentType::Deadtime,
            Self::TriggerDemand(_) => ComponentType::TriggerDemand,
            Self::Schedule(_) => ComponentType::Schedule,
            Self::Slack(_) => ComponentType::Slack,
        }
    }

    /// Names of the parameters accepted by this kind of component
    fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            Self::Source(_) => Source::PARAMETERS,
            Self::Sink(_) => Sink::PARAMETERS,
            Self::Pool => &[],
            Self::Converter(_) => Converter::PARAMETERS,
            Self::Storage(_) => Storage::PARAMETERS,
            Self::ThermalSystem(_) => ThermalSystem::PARAMETERS,
            Self::Deadtime(_) => Deadtime::PARAMETERS,
            Self::TriggerDemand(_) => TriggerDemand::PARAMETERS,
            Self::Schedule(_) => Schedule::PARAMETERS,
            Self::Slack(_) => Slack::PARAMETERS,
        }
    }

    /// Replace the configuration with one read from parameters
    fn configure(&mut self, reader: &ParameterReader) -> ModelResult<()> {
        match self {
            Self::Source(source) => {
                *source = Source::from_parameters(reader)?;
            }
            Self::Sink(sink) => {
                let is_losses = sink.is_losses;
                *sink = Sink::from_parameters(reader)?;
                sink.is_losses = is_losses;
            }
            Self::Pool => {}
            Self::Converter(converter) => *converter = Converter::from_parameters(reader)?,
            Self::Storage(storage) => *storage = Storage::from_parameters(reader)?,
            Self::ThermalSystem(thermal) => *thermal = ThermalSystem::from_parameters(reader)?,
            Self::Deadtime(deadtime) => *deadtime = Deadtime::from_parameters(reader)?,
            Self::TriggerDemand(trigger) => *trigger = TriggerDemand::from_parameters(reader)?,
            Self::Schedule(schedule) => *schedule = Schedule::from_parameters(reader)?,
            Self::Slack(slack) => *slack = Slack::from_parameters(reader)?,
        }

        Ok(())
    }
}

/// Summary of a connection attached to a component, used to enforce cardinality rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Port {
    /// The quantity carried by the connection
    pub quantity: QuantityType,
    /// Whether the connection leads to or from a slack
    pub is_slack: bool,
    /// Whether the connection leads into a losses sink
    pub to_losses: bool,
    /// Whether the connection comes from the ambient gains source
    pub from_gains: bool,
}

impl Port {
    /// Whether the connection is an ordinary edge of the graph (not slack, losses or gains)
    pub fn is_regular(&self) -> bool {
        !(self.is_slack || self.to_losses || self.from_gains)
    }
}

/// A node in the factory graph
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Unique key within the factory
    pub key: ComponentID,
    /// Human-readable name
    pub name: String,
    /// Free text description
    pub description: String,
    /// The flowtype of the component (may be "unknown")
    pub flowtype: FlowTypeID,
    /// Incoming connections, in the order they were added
    pub inputs: Vec<ConnectionID>,
    /// Outgoing connections, in the order they were added
    pub outputs: Vec<ConnectionID>,
    /// Whether this is one of the factory's essential components (losses sinks, ambient gains)
    pub is_structural: bool,
    /// Maps component attributes to the scenario attributes they are read from
    pub scenario_data: IndexMap<String, String>,
    /// The most recently applied static parameters
    pub parameters: ParameterMap,
    /// Kind-specific configuration
    pub kind: ComponentKind,
}

impl Component {
    /// Create a new, unconnected component with the default configuration for its type
    pub fn new(
        key: ComponentID,
        component_type: ComponentType,
        flowtype: FlowTypeID,
        horizon: usize,
    ) -> Self {
        Self {
            name: key.to_string(),
            key,
            description: String::new(),
            flowtype,
            inputs: Vec::new(),
            outputs: Vec::new(),
            is_structural: false,
            scenario_data: IndexMap::new(),
            parameters: ParameterMap::new(),
            kind: ComponentKind::new(component_type, horizon),
        }
    }

    /// The type tag of the component
    pub fn component_type(&self) -> ComponentType {
        self.kind.component_type()
    }

    /// Whether the component can supply flow to the graph
    pub fn is_source(&self) -> bool {
        matches!(self.kind, ComponentKind::Source(_) | ComponentKind::Slack(_))
    }

    /// Whether the component can take flow out of the graph
    pub fn is_sink(&self) -> bool {
        matches!(self.kind, ComponentKind::Sink(_) | ComponentKind::Slack(_))
    }

    /// Whether the component is one of the structural losses sinks
    pub fn is_losses_sink(&self) -> bool {
        matches!(&self.kind, ComponentKind::Sink(sink) if sink.is_losses)
    }

    /// Whether the component is a slack
    pub fn is_slack(&self) -> bool {
        matches!(self.kind, ComponentKind::Slack(_))
    }

    /// Whether any attribute is read from the scenario at simulation time
    pub fn is_scenario_dependent(&self) -> bool {
        !self.scenario_data.is_empty()
    }

    /// How this component takes part in flowtype propagation
    pub fn flowtype_policy(&self) -> FlowtypePolicy {
        if self.is_structural {
            return FlowtypePolicy::Ignore;
        }

        match self.kind {
            ComponentKind::Converter(_) | ComponentKind::TriggerDemand(_) => {
                FlowtypePolicy::Ignore
            }
            ComponentKind::ThermalSystem(_) => FlowtypePolicy::Adopt,
            _ => FlowtypePolicy::Broadcast,
        }
    }

    /// Whether a user may connect this component to a losses sink
    pub fn may_connect_to_losses(&self) -> bool {
        matches!(self.kind, ComponentKind::Pool)
    }

    /// Names of the parameters this component accepts
    pub fn parameter_names(&self) -> Vec<&'static str> {
        COMMON_PARAMETERS
            .iter()
            .chain(self.kind.parameter_names())
            .copied()
            .collect()
    }

    /// Apply a set of parameters to the component.
    ///
    /// The kind-specific configuration is rebuilt from scratch, so parameters which are not
    /// supplied revert to their defaults.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameters to apply
    /// * `horizon` - The number of values required for time series
    pub fn configure(&mut self, params: &ParameterMap, horizon: usize) -> ModelResult<()> {
        let reader = ParameterReader::new(self.key.as_str(), params, horizon);
        reader.check_names(&self.parameter_names())?;

        let mut kind = self.kind.clone();
        kind.configure(&reader)?;

        // Only mutate once everything has been validated
        if let Some(name) = reader.string("name")? {
            self.name = name;
        }
        if let Some(description) = reader.string("description")? {
            self.description = description;
        }
        self.kind = kind;
        self.parameters = params.clone();

        Ok(())
    }

    /// Register a new incoming connection, enforcing the cardinality rules for this kind
    ///
    /// # Arguments
    ///
    /// * `id` - The new connection
    /// * `port` - Summary of the new connection
    /// * `existing` - Summaries of the component's existing inputs
    pub fn set_input(
        &mut self,
        id: ConnectionID,
        port: Port,
        existing: &[Port],
    ) -> ModelResult<()> {
        self.check_input(&port, existing)?;
        self.inputs.push(id);

        Ok(())
    }

    /// Register a new outgoing connection, enforcing the cardinality rules for this kind
    ///
    /// # Arguments
    ///
    /// * `id` - The new connection
    /// * `port` - Summary of the new connection
    /// * `existing` - Summaries of the component's existing outputs
    pub fn set_output(
        &mut self,
        id: ConnectionID,
        port: Port,
        existing: &[Port],
    ) -> ModelResult<()> {
        self.check_output(&port, existing)?;
        self.outputs.push(id);

        Ok(())
    }

    /// Check whether a new incoming connection is allowed
    pub fn check_input(&self, port: &Port, existing: &[Port]) -> ModelResult<()> {
        let regular = existing.iter().filter(|p| !p.is_slack).count();
        match &self.kind {
            ComponentKind::Source(_) => Err(self.structure_error("Sources cannot have inputs")),
            ComponentKind::Deadtime(_) if !port.is_slack && regular >= 1 => {
                Err(self.structure_error("Deadtimes can only have one input"))
            }
            ComponentKind::Schedule(_) if !port.is_slack && regular >= 1 => {
                Err(self.structure_error("Schedules can only have one input"))
            }
            ComponentKind::Slack(_) if !existing.is_empty() => {
                Err(self.structure_error("Slacks can only have one input"))
            }
            ComponentKind::TriggerDemand(_) => check_trigger_port(self, port, existing, "input"),
            _ => Ok(()),
        }
    }

    /// Check whether a new outgoing connection is allowed
    pub fn check_output(&self, port: &Port, existing: &[Port]) -> ModelResult<()> {
        let regular = existing
            .iter()
            .filter(|p| !p.is_slack && !p.to_losses)
            .count();
        match &self.kind {
            ComponentKind::Sink(_) => Err(self.structure_error("Sinks cannot have outputs")),
            ComponentKind::Deadtime(_) if !port.is_slack && regular >= 1 => {
                Err(self.structure_error("Deadtimes can only have one output"))
            }
            ComponentKind::Schedule(_) if !port.is_slack && regular >= 2 => {
                Err(self.structure_error("Schedules can have at most two outputs"))
            }
            ComponentKind::Slack(_) if !existing.is_empty() => {
                Err(self.structure_error("Slacks can only have one output"))
            }
            ComponentKind::TriggerDemand(_) => check_trigger_port(self, port, existing, "output"),
            _ => Ok(()),
        }
    }

    fn structure_error(&self, message: &str) -> ModelError {
        ModelError::structure(format!("{message} (component {})", self.name))
    }
}

/// Triggers have at most one energy and one material connection on each side
fn check_trigger_port(
    component: &Component,
    port: &Port,
    existing: &[Port],
    side: &str,
) -> ModelResult<()> {
    let same_quantity = existing
        .iter()
        .filter(|p| p.quantity.is_material() == port.quantity.is_material())
        .count();
    if same_quantity >= 1 {
        let quantity = if port.quantity.is_material() {
            "material"
        } else {
            "energy"
        };
        return Err(component.structure_error(&format!(
            "Trigger demands can only have one {quantity} {side}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_model_error;
    use crate::parameter::ParameterValue;
    use rstest::rstest;

    fn port(quantity: QuantityType) -> Port {
        Port {
            quantity,
            is_slack: false,
            to_losses: false,
            from_gains: false,
        }
    }

    fn component(component_type: ComponentType) -> Component {
        Component::new("c".into(), component_type, "unknown".into(), 3)
    }

    #[test]
    fn test_source_has_no_inputs() {
        let source = component(ComponentType::Source);
        assert_model_error!(
            source.check_input(&port(QuantityType::Energy), &[]),
            "Sources cannot have inputs (component c)"
        );
    }

    #[test]
    fn test_deadtime_single_input() {
        let deadtime = component(ComponentType::Deadtime);
        let energy = port(QuantityType::Energy);
        assert!(deadtime.check_input(&energy, &[]).is_ok());
        assert!(deadtime.check_input(&energy, &[energy]).is_err());

        // Slack connections don't count
        let slack = Port {
            is_slack: true,
            ..energy
        };
        assert!(deadtime.check_input(&slack, &[energy]).is_ok());
    }

    #[test]
    fn test_trigger_ports() {
        let trigger = component(ComponentType::TriggerDemand);
        let energy = port(QuantityType::Energy);
        let material = port(QuantityType::Material);
        assert!(trigger.check_input(&material, &[energy]).is_ok());
        assert_model_error!(
            trigger.check_input(&energy, &[energy, material]),
            "Trigger demands can only have one energy input (component c)"
        );
    }

    #[test]
    fn test_schedule_outputs() {
        let schedule = component(ComponentType::Schedule);
        let energy = port(QuantityType::Energy);
        assert!(schedule.check_output(&energy, &[energy]).is_ok());
        assert!(schedule.check_output(&energy, &[energy, energy]).is_err());
    }

    #[rstest]
    #[case(ComponentType::Converter, FlowtypePolicy::Ignore)]
    #[case(ComponentType::TriggerDemand, FlowtypePolicy::Ignore)]
    #[case(ComponentType::ThermalSystem, FlowtypePolicy::Adopt)]
    #[case(ComponentType::Pool, FlowtypePolicy::Broadcast)]
    #[case(ComponentType::Storage, FlowtypePolicy::Broadcast)]
    fn test_flowtype_policy(
        #[case] component_type: ComponentType,
        #[case] expected: FlowtypePolicy,
    ) {
        assert_eq!(component(component_type).flowtype_policy(), expected);
    }

    #[test]
    fn test_configure_unknown_parameter_leaves_component_unchanged() {
        let mut pool = component(ComponentType::Pool);
        let params: ParameterMap = [("volume".to_string(), ParameterValue::Number(1.0))]
            .into_iter()
            .collect();
        assert!(pool.configure(&params, 3).is_err());
        assert!(pool.parameters.is_empty());
    }

    #[test]
    fn test_configure_name() {
        let mut pool = component(ComponentType::Pool);
        let params: ParameterMap = [("name".to_string(), ParameterValue::from("Main pool"))]
            .into_iter()
            .collect();
        pool.configure(&params, 3).unwrap();
        assert_eq!(pool.name, "Main pool");
    }
}
