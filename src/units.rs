//! Physical quantity descriptors used for display and for separating energy and material balances.
use crate::id::UnitID;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// The kind of physical quantity a flow carries
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum QuantityType {
    /// Energy flows (electricity, heat, fuels measured by their energy content)
    #[string = "energy"]
    Energy,
    /// Material flows (measured by mass)
    #[string = "material"]
    Material,
    /// Quantity not (yet) known
    #[string = "unspecified"]
    Unspecified,
}

impl QuantityType {
    /// Whether flows of this quantity are accounted for in energy balances.
    ///
    /// Unspecified quantities are treated as energy.
    pub fn is_energy(self) -> bool {
        !self.is_material()
    }

    /// Whether flows of this quantity are accounted for in material balances
    pub fn is_material(self) -> bool {
        self == Self::Material
    }
}

/// A named quantity descriptor.
///
/// Units have no role in the optimisation: they are used to label and scale values for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// Unique key of the unit
    pub key: UnitID,
    /// Human-readable name
    pub name: String,
    /// What kind of quantity the unit measures
    pub quantity_type: QuantityType,
    /// Display magnitudes as (scale factor, label) pairs in ascending order of scale
    pub magnitudes: Vec<(f64, String)>,
}

impl Unit {
    /// Create a new unit with the given magnitude table.
    ///
    /// The magnitudes are sorted by scale factor.
    pub fn new(
        key: &str,
        name: &str,
        quantity_type: QuantityType,
        magnitudes: &[(f64, &str)],
    ) -> Self {
        let mut magnitudes: Vec<_> = magnitudes
            .iter()
            .map(|(scale, label)| (*scale, (*label).to_string()))
            .collect();
        magnitudes.sort_by(|a, b| a.0.total_cmp(&b.0));

        Self {
            key: key.into(),
            name: name.into(),
            quantity_type,
            magnitudes,
        }
    }

    /// The default unit for energy flows (power per timestep)
    pub fn energy() -> Self {
        Self::new(
            "energy",
            "Energy",
            QuantityType::Energy,
            &[(1.0, "kW"), (1e3, "MW"), (1e6, "GW"), (1e9, "TW")],
        )
    }

    /// The default unit for material flows (mass per timestep)
    pub fn material() -> Self {
        Self::new(
            "material",
            "Material",
            QuantityType::Material,
            &[(1.0, "kg/h"), (1e3, "t/h"), (1e6, "kt/h"), (1e9, "Mt/h")],
        )
    }

    /// The default unit for flows whose quantity is not known
    pub fn unspecified() -> Self {
        Self::new(
            "unspecified",
            "Unspecified",
            QuantityType::Unspecified,
            &[(1.0, "units"), (1e3, "k units"), (1e6, "M units")],
        )
    }

    /// Format a value using the largest magnitude not exceeding it
    pub fn format(&self, value: f64) -> String {
        let Some(smallest) = self.magnitudes.first() else {
            return format!("{value}");
        };

        let (scale, label) = self
            .magnitudes
            .iter()
            .rev()
            .find(|(scale, _)| value.abs() >= *scale)
            .unwrap_or(smallest);

        format!("{:.2} {label}", value / scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(500.0, "500.00 kW")]
    #[case(1500.0, "1.50 MW")]
    #[case(2.5e6, "2.50 GW")]
    #[case(0.5, "0.50 kW")]
    fn test_format_energy(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(Unit::energy().format(value), expected);
    }

    #[test]
    fn test_quantity_type() {
        assert!(QuantityType::Energy.is_energy());
        assert!(QuantityType::Unspecified.is_energy());
        assert!(QuantityType::Material.is_material());
        assert!(!QuantityType::Material.is_energy());
    }
}
