//! Converters transform a weighted set of inputs into a weighted set of outputs
use super::PowerBounds;
use crate::error::ModelResult;
use crate::parameter::ParameterReader;

/// Default number of linear segments on each side of the nominal operating point
const DEFAULT_SEGMENTS: i64 = 4;

/// An efficiency curve which peaks at a nominal operating point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableEfficiency {
    /// Efficiency at the nominal operating point
    pub eta_max: f64,
    /// Operating point with the highest efficiency
    pub power_nominal: f64,
    /// Efficiency drop per relative deviation below the nominal point
    pub delta_eta_low: f64,
    /// Efficiency drop per relative deviation above the nominal point
    pub delta_eta_high: f64,
}

impl VariableEfficiency {
    /// Efficiency at operating point `power`
    pub fn eta(&self, power: f64) -> f64 {
        let deviation = (power - self.power_nominal) / self.power_nominal;
        if deviation >= 0.0 {
            self.eta_max - self.delta_eta_high * deviation
        } else {
            self.eta_max + self.delta_eta_low * deviation
        }
    }

    /// Output at operating point `power` (i.e. `power * eta(power)`)
    pub fn output(&self, power: f64) -> f64 {
        power * self.eta(power)
    }

    /// Whether the efficiency does not depend on the operating point
    pub fn is_constant(&self) -> bool {
        self.delta_eta_low == 0.0 && self.delta_eta_high == 0.0
    }
}

/// The efficiency model of a converter
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Efficiency {
    /// Outputs equal the operating point
    #[default]
    Fixed,
    /// Energy outputs depend on the operating point through a piecewise-linear efficiency curve
    Variable(VariableEfficiency),
}

/// Configuration of a converter
#[derive(Debug, Clone, PartialEq)]
pub struct Converter {
    /// Operating point limits
    pub bounds: PowerBounds,
    /// Maximum increase of the operating point between timesteps
    pub max_ramp_up: Option<f64>,
    /// Maximum decrease of the operating point between timesteps
    pub max_ramp_down: Option<f64>,
    /// Whether the converter can be switched off entirely
    pub switchable: bool,
    /// Cost per unit of operating point increase
    pub ramp_cost: f64,
    /// Cost per unit of peak operating point per year
    pub capacity_charge: f64,
    /// The efficiency model
    pub efficiency: Efficiency,
    /// Number of linear segments on each side of the nominal point for variable efficiency
    pub segments: usize,
    /// Ratio of energy output weights to energy input weights, set by the validity check
    pub eta_base: Option<f64>,
}

impl Default for Converter {
    fn default() -> Self {
        Self {
            bounds: PowerBounds::default(),
            max_ramp_up: None,
            max_ramp_down: None,
            switchable: false,
            ramp_cost: 0.0,
            capacity_charge: 0.0,
            efficiency: Efficiency::Fixed,
            segments: DEFAULT_SEGMENTS as usize,
            eta_base: None,
        }
    }
}

impl Converter {
    pub(super) const PARAMETERS: &'static [&'static str] = &[
        "power_min",
        "power_max",
        "availability",
        "max_ramp_up",
        "max_ramp_down",
        "switchable",
        "ramp_cost",
        "capacity_charge",
        "eta_max",
        "power_nominal",
        "delta_eta",
        "delta_eta_low",
        "delta_eta_high",
        "segments",
    ];

    pub(super) fn from_parameters(reader: &ParameterReader) -> ModelResult<Self> {
        let bounds = PowerBounds::from_parameters(reader)?;
        let converter = Self {
            max_ramp_up: reader.non_negative("max_ramp_up")?,
            max_ramp_down: reader.non_negative("max_ramp_down")?,
            switchable: reader.bool("switchable")?.unwrap_or(false),
            ramp_cost: reader.non_negative("ramp_cost")?.unwrap_or(0.0),
            capacity_charge: reader.non_negative("capacity_charge")?.unwrap_or(0.0),
            efficiency: read_efficiency(reader, &bounds)?,
            segments: reader
                .integer("segments", 1..=50)?
                .unwrap_or(DEFAULT_SEGMENTS) as usize,
            eta_base: None,
            bounds,
        };

        if converter.switchable && converter.is_ramp_limited() {
            return Err(reader.error("switchable cannot be combined with ramp limits"));
        }

        Ok(converter)
    }

    /// Whether the change of operating point between timesteps is limited
    pub fn is_ramp_limited(&self) -> bool {
        self.max_ramp_up.is_some() || self.max_ramp_down.is_some()
    }

    /// Whether the operating point affects the efficiency
    pub fn has_variable_efficiency(&self) -> bool {
        matches!(self.efficiency, Efficiency::Variable(curve) if !curve.is_constant())
    }
}

fn read_efficiency(reader: &ParameterReader, bounds: &PowerBounds) -> ModelResult<Efficiency> {
    const NAMES: [&str; 5] = [
        "eta_max",
        "power_nominal",
        "delta_eta",
        "delta_eta_low",
        "delta_eta_high",
    ];
    if !NAMES.iter().any(|name| reader.contains(name)) {
        return Ok(Efficiency::Fixed);
    }

    let eta_max = reader.ratio("eta_max")?.unwrap_or(1.0);
    if eta_max == 0.0 {
        return Err(reader.error("eta_max must be positive"));
    }

    let delta_eta = reader.non_negative("delta_eta")?.unwrap_or(0.0);
    let delta_eta_low = reader.non_negative("delta_eta_low")?.unwrap_or(delta_eta);
    let delta_eta_high = reader.non_negative("delta_eta_high")?.unwrap_or(delta_eta);
    if bounds.max.is_none() && (delta_eta_low > 0.0 || delta_eta_high > 0.0) {
        return Err(reader.error("a variable efficiency requires power_max"));
    }

    let horizon = reader.horizon();
    let peak = bounds.peak(horizon);
    let power_nominal = match reader.positive("power_nominal")? {
        Some(power_nominal) => power_nominal,
        None if bounds.max.is_some() && peak > 0.0 => peak,
        None => 1.0,
    };

    let curve = VariableEfficiency {
        eta_max,
        power_nominal,
        delta_eta_low,
        delta_eta_high,
    };

    // The curve is concave so its minimum over the operating range lies at an end
    if bounds.max.is_some() {
        let lowest = (0..horizon)
            .map(|t| bounds.lower(t))
            .fold(f64::INFINITY, f64::min);
        for power in [lowest.min(peak), peak] {
            if curve.eta(power) <= 0.0 {
                return Err(reader.error(format!(
                    "efficiency is not positive at operating point {power}"
                )));
            }
        }
    }

    Ok(Efficiency::Variable(curve))
}
