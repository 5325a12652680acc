//! Storages hold a single flow over time
use crate::error::ModelResult;
use crate::parameter::ParameterReader;

/// Configuration of a storage
#[derive(Debug, Clone, PartialEq)]
pub struct Storage {
    /// Maximum state of charge (energy units)
    pub capacity: f64,
    /// Discharge efficiency; anything below 1 causes losses on discharge
    pub efficiency: f64,
    /// Share of the capacity lost per hour
    pub leakage_time: f64,
    /// Share of the state of charge lost per hour
    pub leakage_soc: f64,
    /// Maximum charging power
    pub power_max_charge: Option<f64>,
    /// Maximum discharging power
    pub power_max_discharge: Option<f64>,
    /// Initial state of charge as a share of the capacity (`None` means it is free)
    pub soc_start: Option<f64>,
    /// Whether the final state of charge must equal the initial one
    pub sustainable: bool,
    /// Whether the storage may charge and discharge in the same timestep
    pub allow_pass_through: bool,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            capacity: 0.0,
            efficiency: 1.0,
            leakage_time: 0.0,
            leakage_soc: 0.0,
            power_max_charge: None,
            power_max_discharge: None,
            soc_start: None,
            sustainable: false,
            allow_pass_through: true,
        }
    }
}

impl Storage {
    pub(super) const PARAMETERS: &'static [&'static str] = &[
        "capacity",
        "efficiency",
        "leakage_time",
        "leakage_soc",
        "power_max_charge",
        "power_max_discharge",
        "soc_start",
        "sustainable",
        "allow_pass_through",
    ];

    pub(super) fn from_parameters(reader: &ParameterReader) -> ModelResult<Self> {
        let efficiency = reader.ratio("efficiency")?.unwrap_or(1.0);
        if efficiency == 0.0 {
            return Err(reader.error("efficiency must be positive"));
        }

        Ok(Self {
            capacity: reader.non_negative("capacity")?.unwrap_or(0.0),
            efficiency,
            leakage_time: reader.ratio("leakage_time")?.unwrap_or(0.0),
            leakage_soc: reader.ratio("leakage_soc")?.unwrap_or(0.0),
            power_max_charge: reader.non_negative("power_max_charge")?,
            power_max_discharge: reader.non_negative("power_max_discharge")?,
            soc_start: reader.ratio("soc_start")?,
            sustainable: reader.bool("sustainable")?.unwrap_or(false),
            allow_pass_through: reader.bool("allow_pass_through")?.unwrap_or(true),
        })
    }

    /// Whether the storage loses any energy
    pub fn is_lossy(&self) -> bool {
        self.efficiency < 1.0 || self.leakage_time > 0.0 || self.leakage_soc > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterMap;
    use rstest::rstest;

    #[rstest]
    #[case("efficiency", 0.9, true)]
    #[case("leakage_time", 0.01, true)]
    #[case("leakage_soc", 0.01, true)]
    #[case("efficiency", 1.0, false)]
    fn test_is_lossy(#[case] name: &str, #[case] value: f64, #[case] expected: bool) {
        let map: ParameterMap = [(name.to_string(), value.into())].into_iter().collect();
        let storage = Storage::from_parameters(&ParameterReader::new("battery", &map, 2)).unwrap();
        assert_eq!(storage.is_lossy(), expected);
    }

    #[test]
    fn test_zero_efficiency() {
        let map: ParameterMap = [("efficiency".to_string(), 0.0.into())].into_iter().collect();
        assert!(Storage::from_parameters(&ParameterReader::new("battery", &map, 2)).is_err());
    }
}
