//! Flowtypes distinguish the physical flows travelling along connections.
use crate::id::{FlowTypeID, UnitID};

/// The key of the flowtype meaning "not yet determined"
pub const UNKNOWN_FLOWTYPE: &str = "unknown";

/// The key of the flowtype carried into the energy losses sink
pub const ENERGY_LOSSES_FLOWTYPE: &str = "energy_losses";

/// The key of the flowtype carried into the material losses sink
pub const MATERIAL_LOSSES_FLOWTYPE: &str = "material_losses";

/// The key of the flowtype supplied by the ambient gains source
pub const HEAT_FLOWTYPE: &str = "heat";

/// A distinguishable physical flow (e.g. "electricity", "hydrogen")
#[derive(Debug, Clone, PartialEq)]
pub struct FlowType {
    /// Unique key of the flowtype
    pub key: FlowTypeID,
    /// Human-readable name
    pub name: String,
    /// The unit in which the flow is measured
    pub unit: UnitID,
    /// Whether this flowtype represents losses
    pub is_losses: bool,
    /// Colour used when displaying the flow
    pub color: String,
}

impl FlowType {
    /// Create a new flowtype
    pub fn new(key: &str, unit: UnitID, color: Option<&str>) -> Self {
        Self {
            key: key.into(),
            name: key.into(),
            unit,
            is_losses: key.ends_with("_losses"),
            color: color.unwrap_or("#808080").into(),
        }
    }

    /// Whether this is the placeholder flowtype for flows not yet determined
    pub fn is_unknown(&self) -> bool {
        self.key.as_str() == UNKNOWN_FLOWTYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_losses_flag() {
        assert!(FlowType::new(ENERGY_LOSSES_FLOWTYPE, "energy".into(), None).is_losses);
        assert!(!FlowType::new("hydrogen", "material".into(), None).is_losses);
    }

    #[test]
    fn test_is_unknown() {
        assert!(FlowType::new(UNKNOWN_FLOWTYPE, "unspecified".into(), None).is_unknown());
    }
}
