//! Sinks take a flow out of the factory
use super::PowerBounds;
use crate::error::ModelResult;
use crate::parameter::{ParameterReader, Series};

/// Configuration of a sink
#[derive(Debug, Clone, PartialEq)]
pub struct Sink {
    /// Whether the flow is consumed on site (counts towards self-sufficiency)
    pub is_onsite: bool,
    /// Whether this is one of the factory's losses sinks
    pub is_losses: bool,
    /// Fixed demand, if any
    pub demand: Option<Series>,
    /// Input power limits
    pub bounds: PowerBounds,
    /// Cost per unit of energy taken
    pub cost: Option<Series>,
    /// Revenue per unit of energy taken
    pub revenue: Option<Series>,
    /// Avoided CO2 (kg) per unit of energy taken
    pub co2_refund: Option<Series>,
    /// Emitted CO2 (kg) per unit of energy taken
    pub co2_emissions: Option<Series>,
}

impl Default for Sink {
    fn default() -> Self {
        Self {
            is_onsite: true,
            is_losses: false,
            demand: None,
            bounds: PowerBounds::default(),
            cost: None,
            revenue: None,
            co2_refund: None,
            co2_emissions: None,
        }
    }
}

impl Sink {
    pub(super) const PARAMETERS: &'static [&'static str] = &[
        "is_onsite",
        "demand",
        "power_min",
        "power_max",
        "availability",
        "cost",
        "revenue",
        "co2_refund",
        "co2_emissions",
    ];

    /// Configuration of a structural losses sink
    pub fn losses() -> Self {
        Self {
            is_losses: true,
            ..Self::default()
        }
    }

    pub(super) fn from_parameters(reader: &ParameterReader) -> ModelResult<Self> {
        let sink = Self {
            is_onsite: reader.bool("is_onsite")?.unwrap_or(true),
            is_losses: false,
            demand: reader.non_negative_series("demand")?,
            bounds: PowerBounds::from_parameters(reader)?,
            cost: reader.series("cost")?,
            revenue: reader.series("revenue")?,
            co2_refund: reader.non_negative_series("co2_refund")?,
            co2_emissions: reader.non_negative_series("co2_emissions")?,
        };

        if sink.cost.is_some() && sink.revenue.is_some() {
            return Err(reader.error("cost and revenue cannot both be set"));
        }
        if sink.demand.is_some() {
            if sink.bounds.is_bounded() || sink.bounds.availability.is_some() {
                return Err(reader.error(
                    "demand cannot be combined with power_min, power_max or availability",
                ));
            }
            if sink.cost.is_some() || sink.revenue.is_some() {
                return Err(reader.error("demand cannot be combined with cost or revenue"));
            }
        }

        Ok(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_model_error;
    use crate::parameter::ParameterMap;

    fn reader_for(map: &ParameterMap) -> ParameterReader<'_> {
        ParameterReader::new("market", map, 2)
    }

    #[test]
    fn test_cost_and_revenue() {
        let map: ParameterMap = [
            ("cost".to_string(), 1.0.into()),
            ("revenue".to_string(), 2.0.into()),
        ]
        .into_iter()
        .collect();
        assert_model_error!(
            Sink::from_parameters(&reader_for(&map)),
            "Invalid configuration for market: cost and revenue cannot both be set"
        );
    }

    #[test]
    fn test_demand_with_revenue() {
        let map: ParameterMap = [
            ("demand".to_string(), vec![1.0, 2.0].into()),
            ("revenue".to_string(), 2.0.into()),
        ]
        .into_iter()
        .collect();
        assert!(Sink::from_parameters(&reader_for(&map)).is_err());
    }

    #[test]
    fn test_losses() {
        assert!(Sink::losses().is_losses);
        assert!(!Sink::default().is_losses);
    }
}
