//! Slacks keep a model feasible by supplying or removing flow at a punitive cost
use crate::error::ModelResult;
use crate::parameter::{ParameterReader, Series};

/// Default cost per unit of energy passing through a slack
pub const SLACK_COST: f64 = 1e6;

/// Configuration of a slack
#[derive(Debug, Clone, PartialEq)]
pub struct Slack {
    /// Cost per unit of energy passing through the slack
    pub cost: Series,
}

impl Slack {
    pub(super) const PARAMETERS: &'static [&'static str] = &["cost"];

    /// Create a slack with the default cost over `horizon` timesteps
    pub fn new(horizon: usize) -> Self {
        Self {
            cost: vec![SLACK_COST; horizon],
        }
    }

    pub(super) fn from_parameters(reader: &ParameterReader) -> ModelResult<Self> {
        Ok(Self {
            cost: reader
                .non_negative_series("cost")?
                .unwrap_or_else(|| vec![SLACK_COST; reader.horizon()]),
        })
    }
}
