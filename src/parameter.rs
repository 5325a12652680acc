//! Component configuration parameters and the shared routines for validating them.
//!
//! Components are configured with a flat mapping of parameter names to values. Each value may be a
//! scalar, a boolean, a string or a list of numbers. The routines here coerce these raw values into
//! the types the components need, raising a configuration error for anything which cannot be
//! coerced.
use crate::error::{ModelError, ModelResult};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// A time series with one value per timestep
pub type Series = Vec<f64>;

/// A raw parameter value, as supplied by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// A boolean flag
    Bool(bool),
    /// A single number
    Number(f64),
    /// A free string (may also hold a number or a boolean in text form)
    Text(String),
    /// A list of numbers
    Series(Vec<f64>),
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<Vec<f64>> for ParameterValue {
    fn from(value: Vec<f64>) -> Self {
        Self::Series(value)
    }
}

/// A mapping of parameter names to raw values
pub type ParameterMap = IndexMap<String, ParameterValue>;

/// Reads and validates parameters for a single component
pub struct ParameterReader<'a> {
    component: &'a str,
    params: &'a ParameterMap,
    horizon: usize,
}

impl<'a> ParameterReader<'a> {
    /// Create a reader for the parameters of `component`.
    ///
    /// # Arguments
    ///
    /// * `component` - Key of the component, used in error messages
    /// * `params` - The raw parameters
    /// * `horizon` - The number of values required for time series
    pub fn new(component: &'a str, params: &'a ParameterMap, horizon: usize) -> Self {
        Self {
            component,
            params,
            horizon,
        }
    }

    /// The number of values required for time series
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Create a configuration error for this component
    pub fn error(&self, message: impl Into<String>) -> ModelError {
        ModelError::configuration(self.component, message)
    }

    /// Check that every supplied parameter is one of `allowed`
    pub fn check_names(&self, allowed: &[&str]) -> ModelResult<()> {
        for name in self.params.keys() {
            if !allowed.contains(&name.as_str()) {
                return Err(self.error(format!(
                    "Unknown parameter '{name}'. Valid parameters are: {}",
                    allowed.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Whether the parameter was supplied
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Read a free string
    pub fn string(&self, name: &str) -> ModelResult<Option<String>> {
        let Some(value) = self.params.get(name) else {
            return Ok(None);
        };

        match value {
            ParameterValue::Text(text) => Ok(Some(text.clone())),
            ParameterValue::Number(number) => Ok(Some(number.to_string())),
            ParameterValue::Bool(flag) => Ok(Some(flag.to_string())),
            ParameterValue::Series(_) => Err(self.error(format!("{name} must be a string"))),
        }
    }

    /// Read a boolean.
    ///
    /// Accepts booleans, the strings "true" and "false" (in any case) and the numbers 0 and 1.
    pub fn bool(&self, name: &str) -> ModelResult<Option<bool>> {
        let Some(value) = self.params.get(name) else {
            return Ok(None);
        };

        let flag = match value {
            ParameterValue::Bool(flag) => *flag,
            ParameterValue::Number(number) if *number == 0.0 => false,
            ParameterValue::Number(number) if *number == 1.0 => true,
            ParameterValue::Text(text) if text.eq_ignore_ascii_case("true") => true,
            ParameterValue::Text(text) if text.eq_ignore_ascii_case("false") => false,
            _ => return Err(self.error(format!("{name} must be a boolean, got {value:?}"))),
        };

        Ok(Some(flag))
    }

    /// Read a single number. Numeric strings are accepted.
    pub fn float(&self, name: &str) -> ModelResult<Option<f64>> {
        let Some(value) = self.params.get(name) else {
            return Ok(None);
        };

        let number = match value {
            ParameterValue::Number(number) => *number,
            ParameterValue::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| self.error(format!("{name} must be a number, got '{text}'")))?,
            _ => return Err(self.error(format!("{name} must be a number, got {value:?}"))),
        };

        if !number.is_finite() {
            return Err(self.error(format!("{name} must be finite")));
        }

        Ok(Some(number))
    }

    /// Read a number which must be non-negative
    pub fn non_negative(&self, name: &str) -> ModelResult<Option<f64>> {
        let value = self.float(name)?;
        if let Some(value) = value {
            if value < 0.0 {
                return Err(self.error(format!("{name} must be non-negative, got {value}")));
            }
        }

        Ok(value)
    }

    /// Read a number which must be strictly positive
    pub fn positive(&self, name: &str) -> ModelResult<Option<f64>> {
        let value = self.float(name)?;
        if let Some(value) = value {
            if value <= 0.0 {
                return Err(self.error(format!("{name} must be positive, got {value}")));
            }
        }

        Ok(value)
    }

    /// Read a ratio, which must lie between 0 and 1
    pub fn ratio(&self, name: &str) -> ModelResult<Option<f64>> {
        let value = self.float(name)?;
        if let Some(value) = value {
            if !(0.0..=1.0).contains(&value) {
                return Err(self.error(format!("{name} must be between 0 and 1, got {value}")));
            }
        }

        Ok(value)
    }

    /// Read a time series.
    ///
    /// A single number is broadcast over the horizon. Lists must contain at least as many values
    /// as the horizon and are truncated to it.
    pub fn series(&self, name: &str) -> ModelResult<Option<Series>> {
        let Some(value) = self.params.get(name) else {
            return Ok(None);
        };

        let series = match value {
            ParameterValue::Series(values) => {
                if values.len() < self.horizon {
                    return Err(self.error(format!(
                        "{name} has {} values but at least {} are required",
                        values.len(),
                        self.horizon
                    )));
                }
                values[..self.horizon].to_vec()
            }
            ParameterValue::Bool(_) => {
                return Err(self.error(format!("{name} must be a number or a time series")));
            }
            _ => {
                let Some(number) = self.float(name)? else {
                    return Ok(None);
                };
                vec![number; self.horizon]
            }
        };

        if series.iter().any(|value| !value.is_finite()) {
            return Err(self.error(format!("{name} contains non-finite values")));
        }

        Ok(Some(series))
    }

    /// Read a time series whose values must all be non-negative
    pub fn non_negative_series(&self, name: &str) -> ModelResult<Option<Series>> {
        let series = self.series(name)?;
        if let Some(series) = &series {
            if series.iter().any(|value| *value < 0.0) {
                return Err(self.error(format!("{name} must not contain negative values")));
            }
        }

        Ok(series)
    }

    /// Read an availability series.
    ///
    /// Availability is a ratio, but series given as absolute values (i.e. with values above 1) are
    /// normalised by their maximum.
    pub fn availability(&self, name: &str) -> ModelResult<Option<Series>> {
        let Some(mut series) = self.non_negative_series(name)? else {
            return Ok(None);
        };

        let max = series.iter().copied().fold(0.0, f64::max);
        if max > 1.0 {
            warn!(
                "{name} of {} exceeds 1; normalising by its maximum ({max})",
                self.component
            );
            for value in &mut series {
                *value /= max;
            }
        }

        Ok(Some(series))
    }

    /// Read an integer.
    ///
    /// Floats are rounded and values outside `bounds` are clamped to them. Both cases are logged.
    pub fn integer(&self, name: &str, bounds: RangeInclusive<i64>) -> ModelResult<Option<i64>> {
        let Some(value) = self.float(name)? else {
            return Ok(None);
        };

        Ok(Some(self.to_integer(name, value, &bounds)))
    }

    /// Read a list of integers, applying the same rounding and clamping as [`Self::integer`]
    pub fn integer_list(
        &self,
        name: &str,
        bounds: RangeInclusive<i64>,
    ) -> ModelResult<Option<Vec<i64>>> {
        let Some(values) = self.array(name)? else {
            return Ok(None);
        };

        Ok(Some(
            values
                .into_iter()
                .map(|value| self.to_integer(name, value, &bounds))
                .collect(),
        ))
    }

    /// Read a list of numbers of any length
    pub fn array(&self, name: &str) -> ModelResult<Option<Vec<f64>>> {
        let Some(value) = self.params.get(name) else {
            return Ok(None);
        };

        match value {
            ParameterValue::Series(values) => Ok(Some(values.clone())),
            ParameterValue::Number(number) => Ok(Some(vec![*number])),
            _ => Err(self.error(format!("{name} must be a list of numbers"))),
        }
    }

    fn to_integer(&self, name: &str, value: f64, bounds: &RangeInclusive<i64>) -> i64 {
        let rounded = value.round();
        if rounded != value {
            warn!(
                "{name} of {} must be an integer; rounding {value} to {rounded}",
                self.component
            );
        }

        let integer = rounded as i64;
        let clamped = integer.clamp(*bounds.start(), *bounds.end());
        if clamped != integer {
            warn!(
                "{name} of {} is out of range; clamping {integer} to {clamped}",
                self.component
            );
        }

        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_model_error;
    use rstest::rstest;

    fn params(name: &str, value: ParameterValue) -> ParameterMap {
        [(name.to_string(), value)].into_iter().collect()
    }

    #[rstest]
    #[case(ParameterValue::Bool(true), true)]
    #[case(ParameterValue::Text("True".into()), true)]
    #[case(ParameterValue::Text("false".into()), false)]
    #[case(ParameterValue::Number(0.0), false)]
    #[case(ParameterValue::Number(1.0), true)]
    fn test_bool(#[case] value: ParameterValue, #[case] expected: bool) {
        let map = params("flag", value);
        let reader = ParameterReader::new("pool", &map, 3);
        assert_eq!(reader.bool("flag").unwrap(), Some(expected));
    }

    #[test]
    fn test_bool_invalid() {
        let map = params("flag", ParameterValue::Number(2.0));
        let reader = ParameterReader::new("pool", &map, 3);
        assert!(reader.bool("flag").is_err());
    }

    #[test]
    fn test_float_from_text() {
        let map = params("cost", "2.5".into());
        let reader = ParameterReader::new("grid", &map, 3);
        assert_eq!(reader.float("cost").unwrap(), Some(2.5));
        assert_eq!(reader.float("missing").unwrap(), None);
    }

    #[test]
    fn test_series_broadcast() {
        let map = params("cost", 2.0.into());
        let reader = ParameterReader::new("grid", &map, 3);
        assert_eq!(reader.series("cost").unwrap(), Some(vec![2.0, 2.0, 2.0]));
    }

    #[test]
    fn test_series_truncated() {
        let map = params("cost", vec![1.0, 2.0, 3.0, 4.0].into());
        let reader = ParameterReader::new("grid", &map, 3);
        assert_eq!(reader.series("cost").unwrap(), Some(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_series_too_short() {
        let map = params("cost", vec![1.0, 2.0].into());
        let reader = ParameterReader::new("grid", &map, 3);
        assert_model_error!(
            reader.series("cost"),
            "Invalid configuration for grid: cost has 2 values but at least 3 are required"
        );
    }

    #[test]
    fn test_availability_normalised() {
        let map = params("availability", vec![2.0, 4.0].into());
        let reader = ParameterReader::new("grid", &map, 2);
        assert_eq!(reader.availability("availability").unwrap(), Some(vec![0.5, 1.0]));
    }

    #[rstest]
    #[case(2.0, 2)]
    #[case(2.4, 2)]
    #[case(-3.0, 0)]
    #[case(50.0, 10)]
    fn test_integer(#[case] value: f64, #[case] expected: i64) {
        let map = params("delay", value.into());
        let reader = ParameterReader::new("delay", &map, 1);
        assert_eq!(reader.integer("delay", 0..=10).unwrap(), Some(expected));
    }

    #[test]
    fn test_check_names() {
        let map = params("colour", "red".into());
        let reader = ParameterReader::new("pool", &map, 1);
        assert!(reader.check_names(&["color"]).is_err());
        assert!(reader.check_names(&["colour"]).is_ok());
    }
}
