//! Deadtimes delay a flow by a fixed number of timesteps
use crate::error::ModelResult;
use crate::parameter::ParameterReader;

/// Configuration of a deadtime
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deadtime {
    /// Delay in factory timesteps
    pub delay: usize,
}

impl Deadtime {
    pub(super) const PARAMETERS: &'static [&'static str] = &["delay"];

    pub(super) fn from_parameters(reader: &ParameterReader) -> ModelResult<Self> {
        let delay = reader.integer("delay", 0..=i64::from(u32::MAX))?.unwrap_or(0);

        Ok(Self {
            delay: delay as usize,
        })
    }
}
