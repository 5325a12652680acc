//! Sources supply a flow to the factory
use super::PowerBounds;
use crate::error::ModelResult;
use crate::parameter::{ParameterReader, Series};

/// Configuration of a source
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Whether the flow is produced on site (counts towards self-sufficiency)
    pub is_onsite: bool,
    /// Fixed output power, if any
    pub determined_power: Option<Series>,
    /// Output power limits
    pub bounds: PowerBounds,
    /// Cost per unit of energy supplied
    pub cost: Option<Series>,
    /// Cost per unit of peak power per year
    pub capacity_charge: f64,
    /// Emitted CO2 (kg) per unit of energy supplied
    pub co2_emissions: Option<Series>,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            is_onsite: true,
            determined_power: None,
            bounds: PowerBounds::default(),
            cost: None,
            capacity_charge: 0.0,
            co2_emissions: None,
        }
    }
}

impl Source {
    pub(super) const PARAMETERS: &'static [&'static str] = &[
        "is_onsite",
        "determined_power",
        "power_min",
        "power_max",
        "availability",
        "cost",
        "capacity_charge",
        "co2_emissions",
    ];

    pub(super) fn from_parameters(reader: &ParameterReader) -> ModelResult<Self> {
        let source = Self {
            is_onsite: reader.bool("is_onsite")?.unwrap_or(true),
            determined_power: reader.non_negative_series("determined_power")?,
            bounds: PowerBounds::from_parameters(reader)?,
            cost: reader.series("cost")?,
            capacity_charge: reader.non_negative("capacity_charge")?.unwrap_or(0.0),
            co2_emissions: reader.non_negative_series("co2_emissions")?,
        };

        if source.determined_power.is_some() {
            if source.bounds.is_bounded() || source.bounds.availability.is_some() {
                return Err(reader.error(
                    "determined_power cannot be combined with power_min, power_max or availability",
                ));
            }
            if source.cost.is_some() {
                return Err(reader.error("determined_power cannot be combined with cost"));
            }
        }

        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_model_error;
    use crate::parameter::ParameterMap;

    #[test]
    fn test_determined_with_cost() {
        let map: ParameterMap = [
            ("determined_power".to_string(), 5.0.into()),
            ("cost".to_string(), 2.0.into()),
        ]
        .into_iter()
        .collect();
        assert_model_error!(
            Source::from_parameters(&ParameterReader::new("pv", &map, 3)),
            "Invalid configuration for pv: determined_power cannot be combined with cost"
        );
    }

    #[test]
    fn test_defaults() {
        let map = ParameterMap::new();
        let source = Source::from_parameters(&ParameterReader::new("grid", &map, 3)).unwrap();
        assert_eq!(source, Source::default());
    }
}
