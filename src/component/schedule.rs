//! Schedules deliver several volumes, each within its own window
use crate::error::ModelResult;
use crate::parameter::{ParameterReader, Series};
use itertools::Itertools;

/// A volume which must be delivered between two timesteps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartDemand {
    /// First timestep of the window
    pub start: usize,
    /// Last timestep of the window
    pub end: usize,
    /// Volume to deliver (energy units)
    pub volume: f64,
    /// Maximum delivery power at any timestep
    pub max_rate: f64,
}

impl PartDemand {
    /// Whether the demand may be served at timestep `t`
    pub fn is_available(&self, t: usize) -> bool {
        (self.start..=self.end).contains(&t)
    }
}

/// Configuration of a schedule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    /// The part demands
    pub part_demands: Vec<PartDemand>,
    /// Maximum total delivery power at each timestep
    pub power_max: Option<Series>,
}

impl Schedule {
    pub(super) const PARAMETERS: &'static [&'static str] = &[
        "start_times",
        "end_times",
        "volumes",
        "max_rates",
        "power_max",
    ];

    pub(super) fn from_parameters(reader: &ParameterReader) -> ModelResult<Self> {
        let last = reader.horizon().saturating_sub(1) as i64;
        let starts = reader.integer_list("start_times", 0..=last)?.unwrap_or_default();
        let ends = reader.integer_list("end_times", 0..=last)?.unwrap_or_default();
        let volumes = reader.array("volumes")?.unwrap_or_default();
        let max_rates = reader.array("max_rates")?.unwrap_or_default();

        if [ends.len(), volumes.len(), max_rates.len()]
            .iter()
            .any(|len| *len != starts.len())
        {
            return Err(reader.error(
                "start_times, end_times, volumes and max_rates must have the same length",
            ));
        }

        let mut part_demands = Vec::with_capacity(starts.len());
        for (i, (start, end, volume, max_rate)) in
            itertools::multizip((starts, ends, volumes, max_rates)).enumerate()
        {
            if start > end {
                return Err(reader.error(format!("part demand {i} ends before it starts")));
            }
            if !(volume.is_finite() && volume >= 0.0) {
                return Err(reader.error(format!("part demand {i} has an invalid volume")));
            }
            if !(max_rate.is_finite() && max_rate > 0.0) {
                return Err(reader.error(format!("part demand {i} must have a positive max_rate")));
            }
            part_demands.push(PartDemand {
                start: start as usize,
                end: end as usize,
                volume,
                max_rate,
            });
        }

        Ok(Self {
            part_demands,
            power_max: reader.non_negative_series("power_max")?,
        })
    }

    /// Total volume over all part demands
    pub fn total_volume(&self) -> f64 {
        self.part_demands.iter().map(|demand| demand.volume).sum()
    }

    /// Indexes of the part demands which may be served at timestep `t`
    pub fn available_at(&self, t: usize) -> Vec<usize> {
        self.part_demands
            .iter()
            .positions(|demand| demand.is_available(t))
            .collect()
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
    fn test_part_demands() {
        let map = params(&[
            ("start_times", vec![0.0, 2.0].into()),
            ("end_times", vec![1.0, 3.0].into()),
            ("volumes", vec![4.0, 6.0].into()),
            ("max_rates", vec![5.0, 5.0].into()),
        ]);
        let schedule = Schedule::from_parameters(&ParameterReader::new("line", &map, 4)).unwrap();
        assert_eq!(schedule.part_demands.len(), 2);
        assert_eq!(schedule.total_volume(), 10.0);
        assert_eq!(schedule.available_at(1), vec![0]);
        assert_eq!(schedule.available_at(2), vec![1]);
    }

    #[test]
    fn test_mismatched_lengths() {
        let map = params(&[
            ("start_times", vec![0.0, 2.0].into()),
            ("end_times", vec![1.0].into()),
            ("volumes", vec![4.0, 6.0].into()),
            ("max_rates", vec![5.0, 5.0].into()),
        ]);
        assert_model_error!(
            Schedule::from_parameters(&ParameterReader::new("line", &map, 4)),
            "Invalid configuration for line: start_times, end_times, volumes and max_rates must \
             have the same length"
        );
    }
}
