//! Thermal systems are first-order RC nodes coupled to the ambient temperature
use crate::error::ModelResult;
use crate::parameter::{ParameterReader, Series};

/// Temperature used when none is given (°C)
const DEFAULT_TEMPERATURE: f64 = 20.0;

/// Configuration of a thermal system
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalSystem {
    /// Thermal resistance to the ambient (K per power unit)
    pub resistance: f64,
    /// Thermal capacity (energy units per K)
    pub capacity: f64,
    /// Temperature at the start of the horizon
    pub temperature_start: f64,
    /// Lowest allowed temperature at each timestep
    pub temperature_min: Option<Series>,
    /// Highest allowed temperature at each timestep
    pub temperature_max: Option<Series>,
    /// Ambient temperature at each timestep (a single value if not given)
    pub ambient_temperature: Option<Series>,
    /// Whether the temperature must return to its starting value at the end of the horizon
    pub sustainable: bool,
}

impl Default for ThermalSystem {
    fn default() -> Self {
        Self {
            resistance: 0.0,
            capacity: 0.0,
            temperature_start: DEFAULT_TEMPERATURE,
            temperature_min: None,
            temperature_max: None,
            ambient_temperature: None,
            sustainable: false,
        }
    }
}

impl ThermalSystem {
    pub(super) const PARAMETERS: &'static [&'static str] = &[
        "resistance",
        "capacity",
        "temperature_start",
        "temperature_min",
        "temperature_max",
        "ambient_temperature",
        "sustainable",
    ];

    pub(super) fn from_parameters(reader: &ParameterReader) -> ModelResult<Self> {
        let thermal = Self {
            resistance: reader.positive("resistance")?.unwrap_or(0.0),
            capacity: reader.positive("capacity")?.unwrap_or(0.0),
            temperature_start: reader
                .float("temperature_start")?
                .unwrap_or(DEFAULT_TEMPERATURE),
            temperature_min: reader.series("temperature_min")?,
            temperature_max: reader.series("temperature_max")?,
            ambient_temperature: reader.series("ambient_temperature")?,
            sustainable: reader.bool("sustainable")?.unwrap_or(false),
        };

        for t in 0..reader.horizon() {
            if thermal.min_temperature(t) > thermal.max_temperature(t) {
                return Err(reader.error(format!(
                    "temperature_min exceeds temperature_max at timestep {t}"
                )));
            }
        }
        if let Some(min) = &thermal.temperature_min {
            if min.first().is_some_and(|min| thermal.temperature_start < *min) {
                return Err(reader.error("temperature_start is below temperature_min"));
            }
        }
        if let Some(max) = &thermal.temperature_max {
            if max.first().is_some_and(|max| thermal.temperature_start > *max) {
                return Err(reader.error("temperature_start is above temperature_max"));
            }
        }

        Ok(thermal)
    }

    /// Whether both resistance and capacity have been given
    pub fn is_configured(&self) -> bool {
        self.resistance > 0.0 && self.capacity > 0.0
    }

    /// Lowest allowed temperature at timestep `t`
    pub fn min_temperature(&self, t: usize) -> f64 {
        self.temperature_min
            .as_ref()
            .map_or(f64::NEG_INFINITY, |min| min[t])
    }

    /// Highest allowed temperature at timestep `t`
    pub fn max_temperature(&self, t: usize) -> f64 {
        self.temperature_max.as_ref().map_or(f64::INFINITY, |max| max[t])
    }

    /// Ambient temperature at timestep `t`
    pub fn ambient(&self, t: usize) -> f64 {
        self.ambient_temperature
            .as_ref()
            .map_or(DEFAULT_TEMPERATURE, |ambient| ambient[t])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_model_error;
    use crate::parameter::ParameterMap;

    #[test]
    fn test_start_below_min() {
        let map: ParameterMap = [
            ("resistance".to_string(), 1.0.into()),
            ("capacity".to_string(), 10.0.into()),
            ("temperature_start".to_string(), 15.0.into()),
            ("temperature_min".to_string(), 18.0.into()),
        ]
        .into_iter()
        .collect();
        assert_model_error!(
            ThermalSystem::from_parameters(&ParameterReader::new("hall", &map, 2)),
            "Invalid configuration for hall: temperature_start is below temperature_min"
        );
    }

    #[test]
    fn test_defaults() {
        let thermal = ThermalSystem::default();
        assert!(!thermal.is_configured());
        assert_eq!(thermal.ambient(0), 20.0);
        assert_eq!(thermal.min_temperature(0), f64::NEG_INFINITY);
    }
}
