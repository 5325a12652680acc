//! Connections are the directed edges of a factory graph
use crate::component::{Component, FlowtypePolicy};
use crate::error::{ModelError, ModelResult};
use crate::flowtype::UNKNOWN_FLOWTYPE;
use crate::id::{ComponentID, ConnectionID, FlowTypeID};

/// A directed edge carrying a flow from one component to another
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Handle of the connection within its factory
    pub id: ConnectionID,
    /// Unique name, used to label results
    pub name: String,
    /// The component the flow leaves
    pub origin: ComponentID,
    /// The component the flow enters
    pub destination: ComponentID,
    /// The flowtype carried (may be "unknown")
    pub flowtype: FlowTypeID,
    /// Scaling of the flow as seen by the origin
    pub weight_origin: f64,
    /// Scaling of the flow as seen by the destination
    pub weight_destination: f64,
    /// Whether the connection leads into a losses sink
    pub to_losses: bool,
    /// Whether the connection comes from the ambient gains source
    pub from_gains: bool,
    /// Whether either end of the connection is a slack
    pub is_slack: bool,
}

impl Connection {
    /// Whether the connection takes part in flowtype propagation
    pub fn propagates(&self) -> bool {
        !(self.to_losses || self.from_gains)
    }

    /// Whether the flowtype has been determined
    pub fn has_known_flowtype(&self) -> bool {
        self.flowtype.as_str() != UNKNOWN_FLOWTYPE
    }

    /// The component at the other end of the connection from `key`
    pub fn other_end(&self, key: &ComponentID) -> &ComponentID {
        if &self.origin == key {
            &self.destination
        } else {
            &self.origin
        }
    }

    /// Whether neither weight rescales the flow
    pub fn has_unit_weights(&self) -> bool {
        self.weight_origin == 1.0 && self.weight_destination == 1.0
    }
}

/// Optional settings for a new connection
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionOptions {
    /// Explicit flowtype (derived from the endpoints if not given)
    pub flowtype: Option<FlowTypeID>,
    /// Scaling of the flow as seen by the origin
    pub weight_origin: f64,
    /// Scaling of the flow as seen by the destination
    pub weight_destination: f64,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            flowtype: None,
            weight_origin: 1.0,
            weight_destination: 1.0,
        }
    }
}

impl ConnectionOptions {
    /// Options with the same weight at both ends
    pub fn weight(weight: f64) -> Self {
        Self {
            weight_origin: weight,
            weight_destination: weight,
            ..Self::default()
        }
    }

    /// Options with an explicit flowtype
    pub fn flowtype(flowtype: &str) -> Self {
        Self {
            flowtype: Some(flowtype.into()),
            ..Self::default()
        }
    }

    /// Check that both weights are usable
    pub fn validate(&self) -> ModelResult<()> {
        for (name, weight) in [
            ("weight_origin", self.weight_origin),
            ("weight_destination", self.weight_destination),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ModelError::structure(format!(
                    "{name} must be a non-negative number, got {weight}"
                )));
            }
        }

        Ok(())
    }
}

/// The flowtype a component imposes on its connections, if any
fn imposed_flowtype(component: &Component) -> Option<&FlowTypeID> {
    if component.flowtype_policy() == FlowtypePolicy::Ignore
        || component.flowtype.as_str() == UNKNOWN_FLOWTYPE
    {
        None
    } else {
        Some(&component.flowtype)
    }
}

/// Work out the flowtype of a new connection between `origin` and `destination`.
///
/// An explicit flowtype must agree with every endpoint which imposes one. Otherwise the flowtype
/// is taken from whichever endpoint imposes one, and is "unknown" if neither does.
pub fn derive_flowtype(
    origin: &Component,
    destination: &Component,
    explicit: Option<&FlowTypeID>,
) -> ModelResult<FlowTypeID> {
    let mismatch = |first: &Component,
                    first_ft: &FlowTypeID,
                    second: &Component,
                    second_ft: &FlowTypeID| ModelError::FlowType {
        origin: first.name.clone(),
        origin_flowtype: first_ft.to_string(),
        destination: second.name.clone(),
        destination_flowtype: second_ft.to_string(),
    };

    let origin_ft = imposed_flowtype(origin);
    let destination_ft = imposed_flowtype(destination);

    if let Some(explicit) = explicit {
        if explicit.as_str() != UNKNOWN_FLOWTYPE {
            if let Some(ft) = origin_ft.filter(|ft| *ft != explicit) {
                return Err(mismatch(origin, ft, destination, explicit));
            }
            if let Some(ft) = destination_ft.filter(|ft| *ft != explicit) {
                return Err(mismatch(origin, explicit, destination, ft));
            }
            return Ok(explicit.clone());
        }
    }

    match (origin_ft, destination_ft) {
        (None, None) => Ok(UNKNOWN_FLOWTYPE.into()),
        (Some(ft), None) | (None, Some(ft)) => Ok(ft.clone()),
        (Some(a), Some(b)) if a == b => Ok(a.clone()),
        (Some(a), Some(b)) => Err(mismatch(origin, a, destination, b)),
    }
}
