//! Trigger demands execute a fixed load profile a number of times within a window
use crate::error::ModelResult;
use crate::parameter::ParameterReader;
use std::ops::RangeInclusive;

/// Configuration of a trigger demand
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerDemand {
    /// Energy drawn at each step of one execution
    pub load_profile_energy: Option<Vec<f64>>,
    /// Material drawn at each step of one execution
    pub load_profile_material: Option<Vec<f64>>,
    /// First timestep at which an execution may run
    pub start: usize,
    /// Last timestep at which an execution may run
    pub end: usize,
    /// Required total number of executions
    pub executions: Option<u32>,
    /// Maximum number of executions running at the same time
    pub max_parallel: Option<u32>,
}

impl TriggerDemand {
    pub(super) const PARAMETERS: &'static [&'static str] = &[
        "load_profile_energy",
        "load_profile_material",
        "start",
        "end",
        "executions",
        "max_parallel",
    ];

    pub(super) fn from_parameters(reader: &ParameterReader) -> ModelResult<Self> {
        let last = reader.horizon().saturating_sub(1) as i64;
        let mut trigger = Self {
            load_profile_energy: read_profile(reader, "load_profile_energy")?,
            load_profile_material: read_profile(reader, "load_profile_material")?,
            start: reader.integer("start", 0..=last)?.unwrap_or(0) as usize,
            end: reader.integer("end", 0..=last)?.unwrap_or(last) as usize,
            executions: reader
                .integer("executions", 0..=i64::from(u32::MAX))?
                .map(|n| n as u32),
            max_parallel: reader
                .integer("max_parallel", 1..=i64::from(u32::MAX))?
                .map(|n| n as u32),
        };

        if trigger.load_profile_energy.is_none() && trigger.load_profile_material.is_none() {
            return Err(reader.error("at least one load profile is required"));
        }
        if trigger.start > trigger.end {
            return Err(reader.error("start must not be after end"));
        }

        // Profiles of different lengths are padded to a common length
        let length = trigger.length();
        for profile in [
            &mut trigger.load_profile_energy,
            &mut trigger.load_profile_material,
        ]
        .into_iter()
        .flatten()
        {
            profile.resize(length, 0.0);
        }

        if length == 0 {
            return Err(reader.error("load profiles must not be empty"));
        }
        if length > trigger.end - trigger.start + 1 {
            return Err(reader.error(format!(
                "the load profile ({length} steps) does not fit between start ({}) and end ({})",
                trigger.start, trigger.end
            )));
        }

        Ok(trigger)
    }

    /// Number of timesteps one execution lasts
    pub fn length(&self) -> usize {
        [&self.load_profile_energy, &self.load_profile_material]
            .into_iter()
            .flatten()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }

    /// The timesteps at which an execution may begin
    pub fn offsets(&self) -> RangeInclusive<usize> {
        self.start..=(self.end + 1 - self.length())
    }

    /// The load profile for energy (`material == false`) or material flows
    pub fn profile(&self, material: bool) -> Option<&[f64]> {
        if material {
            self.load_profile_material.as_deref()
        } else {
            self.load_profile_energy.as_deref()
        }
    }

    /// Whether the trigger has been given a load profile
    pub fn is_configured(&self) -> bool {
        self.length() > 0
    }
}

fn read_profile(reader: &ParameterReader, name: &str) -> ModelResult<Option<Vec<f64>>> {
    let profile = reader.array(name)?;
    if let Some(profile) = &profile {
        if profile.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(reader.error(format!("{name} must only contain non-negative values")));
        }
    }

    Ok(profile)
}
