//! Scenarios hold the time series and scalars which components may read at simulation time
use crate::error::{ModelError, ModelResult};
use crate::parameter::{ParameterValue, Series};
use indexmap::IndexMap;
use log::warn;

/// Name of the scalar holding the price of CO2 per kg
pub const CO2_PRICE: &str = "cost_co2_per_kg";

/// A named bag of time series and scalars
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Length of the simulated horizon
    pub number_of_timesteps: usize,
    /// Hours per timestep
    pub timefactor: f64,
    /// Named time series
    pub timeseries: IndexMap<String, Series>,
    /// Named scalars
    pub scalars: IndexMap<String, f64>,
}

impl Scenario {
    /// Create an empty scenario
    pub fn new(name: &str, number_of_timesteps: usize, timefactor: f64) -> ModelResult<Self> {
        let scenario = Self {
            name: name.into(),
            number_of_timesteps,
            timefactor,
            timeseries: IndexMap::new(),
            scalars: IndexMap::new(),
        };

        scenario.check()?;

        Ok(scenario)
    }

    /// Check that the scenario describes a usable horizon
    pub fn check(&self) -> ModelResult<()> {
        if self.number_of_timesteps == 0 {
            return Err(self.error("number_of_timesteps must be positive"));
        }
        if !(self.timefactor.is_finite() && self.timefactor > 0.0) {
            return Err(self.error("timefactor must be positive"));
        }

        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> ModelError {
        ModelError::configuration(format!("scenario {}", self.name), message)
    }

    /// Get a time series with at least `len` values, truncated to `len`
    pub fn get_series(&self, key: &str, len: usize) -> ModelResult<&[f64]> {
        let series = self
            .timeseries
            .get(key)
            .ok_or_else(|| self.error(format!("Time series {key} not found")))?;

        if series.len() < len {
            return Err(self.error(format!(
                "Time series {key} has {} values but at least {len} are required",
                series.len()
            )));
        }

        Ok(&series[..len])
    }

    /// Get a scalar
    pub fn get_scalar(&self, key: &str) -> ModelResult<f64> {
        self.scalars
            .get(key)
            .copied()
            .ok_or_else(|| self.error(format!("Scalar {key} not found")))
    }

    /// Get a value to use as a component parameter, looking in the time series first
    pub fn get_value(&self, key: &str) -> ModelResult<ParameterValue> {
        if self.timeseries.contains_key(key) {
            let series = self.get_series(key, self.number_of_timesteps)?;
            return Ok(ParameterValue::Series(series.to_vec()));
        }

        Ok(ParameterValue::Number(self.get_scalar(key)?))
    }

    /// The price of CO2 per kg (zero if not given)
    pub fn co2_price(&self) -> f64 {
        self.scalars.get(CO2_PRICE).copied().unwrap_or(0.0)
    }

    /// Resample every time series onto a new timefactor.
    ///
    /// Coarser timesteps take the mean of the values they cover, while finer ones repeat values.
    /// The ratio between the timefactors must be a whole number.
    pub fn resample(&self, timefactor: f64) -> ModelResult<Self> {
        let (ratio, coarser) = if timefactor >= self.timefactor {
            (timefactor / self.timefactor, true)
        } else {
            (self.timefactor / timefactor, false)
        };
        if (ratio - ratio.round()).abs() > 1e-9 {
            return Err(self.error(format!(
                "cannot resample from a timefactor of {} to {timefactor}",
                self.timefactor
            )));
        }
        let ratio = ratio.round() as usize;

        let resample_series = |series: &Series| -> Series {
            if coarser {
                series
                    .chunks(ratio)
                    .map(|chunk| chunk.iter().sum::<f64>() / chunk.len() as f64)
                    .collect()
            } else {
                series
                    .iter()
                    .flat_map(|value| std::iter::repeat_n(*value, ratio))
                    .collect()
            }
        };

        let number_of_timesteps = if coarser {
            let steps = self.number_of_timesteps / ratio;
            if self.number_of_timesteps % ratio != 0 {
                warn!(
                    "Scenario {} has {} timesteps, which is not a multiple of {ratio}; \
                     dropping the remainder",
                    self.name, self.number_of_timesteps
                );
            }
            steps.max(1)
        } else {
            self.number_of_timesteps * ratio
        };

        Ok(Self {
            name: self.name.clone(),
            number_of_timesteps,
            timefactor,
            timeseries: self
                .timeseries
                .iter()
                .map(|(key, series)| (key.clone(), resample_series(series)))
                .collect(),
            scalars: self.scalars.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_model_error;

    fn scenario() -> Scenario {
        let mut scenario = Scenario::new("base", 4, 1.0).unwrap();
        scenario
            .timeseries
            .insert("price".into(), vec![1.0, 3.0, 5.0, 7.0]);
        scenario.scalars.insert(CO2_PRICE.into(), 0.1);
        scenario
    }

    #[test]
    fn test_get_series() {
        let scenario = scenario();
        assert_eq!(scenario.get_series("price", 2).unwrap(), &[1.0, 3.0]);
        assert_model_error!(
            scenario.get_series("price", 5),
            "Invalid configuration for scenario base: Time series price has 4 values but at \
             least 5 are required"
        );
        assert!(scenario.get_series("missing", 1).is_err());
    }

    #[test]
    fn test_get_value() {
        let scenario = scenario();
        assert_eq!(
            scenario.get_value(CO2_PRICE).unwrap(),
            ParameterValue::Number(0.1)
        );
        assert_eq!(
            scenario.get_value("price").unwrap(),
            ParameterValue::Series(vec![1.0, 3.0, 5.0, 7.0])
        );
        assert_eq!(scenario.co2_price(), 0.1);
    }

    #[test]
    fn test_resample_coarser() {
        let resampled = scenario().resample(2.0).unwrap();
        assert_eq!(resampled.number_of_timesteps, 2);
        assert_eq!(resampled.timeseries["price"], vec![2.0, 6.0]);
    }

    #[test]
    fn test_resample_finer() {
        let resampled = scenario().resample(0.5).unwrap();
        assert_eq!(resampled.number_of_timesteps, 8);
        assert_eq!(resampled.timeseries["price"][..4], [1.0, 1.0, 3.0, 3.0]);
    }

    #[test]
    fn test_resample_invalid_ratio() {
        assert!(scenario().resample(1.5).is_err());
    }

    #[test]
    fn test_invalid_timesteps() {
        assert!(Scenario::new("empty", 0, 1.0).is_err());
    }
}
