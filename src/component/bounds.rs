//! Power bounds shared by sources, sinks and converters
use super::BIG_M_POWER;
use crate::error::ModelResult;
use crate::parameter::{ParameterReader, Series};

/// Optional lower and upper power limits, with the upper limit scaled by an availability series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerBounds {
    /// Minimum power at each timestep
    pub min: Option<Series>,
    /// Maximum power at each timestep
    pub max: Option<Series>,
    /// Share of the maximum power available at each timestep
    pub availability: Option<Series>,
}

impl PowerBounds {
    /// Read `power_min`, `power_max` and `availability`.
    ///
    /// Fails if the minimum exceeds the available maximum at any timestep.
    pub fn from_parameters(reader: &ParameterReader) -> ModelResult<Self> {
        let bounds = Self {
            min: reader.non_negative_series("power_min")?,
            max: reader.non_negative_series("power_max")?,
            availability: reader.availability("availability")?,
        };

        if bounds.availability.is_some() && bounds.max.is_none() {
            return Err(reader.error("availability requires power_max"));
        }

        for t in 0..reader.horizon() {
            if bounds.lower(t) > bounds.upper(t) {
                return Err(reader.error(format!(
                    "power_min ({}) exceeds the available power_max ({}) at timestep {t}",
                    bounds.lower(t),
                    bounds.upper(t)
                )));
            }
        }

        Ok(bounds)
    }

    /// Whether any bound was given
    pub fn is_bounded(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// Lower limit at timestep `t`
    pub fn lower(&self, t: usize) -> f64 {
        self.min.as_ref().map_or(0.0, |min| min[t])
    }

    /// Upper limit at timestep `t`, or [`BIG_M_POWER`] if unbounded
    pub fn upper(&self, t: usize) -> f64 {
        let Some(max) = &self.max else {
            return BIG_M_POWER;
        };

        max[t] * self.availability.as_ref().map_or(1.0, |availability| availability[t])
    }

    /// The largest upper limit over the horizon
    pub fn peak(&self, horizon: usize) -> f64 {
        (0..horizon).map(|t| self.upper(t)).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_model_error;
    use crate::parameter::{ParameterMap, ParameterValue};

    fn params(pairs: &[(&str, ParameterValue)]) -> ParameterMap {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_upper_scaled_by_availability() {
        let map = params(&[
            ("power_max", 10.0.into()),
            ("availability", vec![1.0, 0.5].into()),
        ]);
        let bounds = PowerBounds::from_parameters(&ParameterReader::new("grid", &map, 2)).unwrap();
        assert_eq!(bounds.upper(0), 10.0);
        assert_eq!(bounds.upper(1), 5.0);
        assert_eq!(bounds.lower(1), 0.0);
    }

    #[test]
    fn test_unbounded() {
        let map = ParameterMap::new();
        let bounds = PowerBounds::from_parameters(&ParameterReader::new("grid", &map, 2)).unwrap();
        assert!(!bounds.is_bounded());
        assert_eq!(bounds.upper(0), BIG_M_POWER);
    }

    #[test]
    fn test_min_above_available_max() {
        let map = params(&[
            ("power_min", 6.0.into()),
            ("power_max", 10.0.into()),
            ("availability", vec![1.0, 0.5].into()),
        ]);
        assert_model_error!(
            PowerBounds::from_parameters(&ParameterReader::new("grid", &map, 2)),
            "Invalid configuration for grid: power_min (6) exceeds the available power_max (5) at \
             timestep 1"
        );
    }
}
