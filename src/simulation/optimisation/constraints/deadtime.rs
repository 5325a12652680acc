use super::super::{ModelBuilder, negated};
use crate::component::{Component, Deadtime};
use log::warn;

/// Convert a delay in factory timesteps into scenario timesteps
pub fn scenario_delay(delay: usize, time_ratio: f64, name: &str) -> usize {
    let exact = delay as f64 * time_ratio;
    let rounded = exact.round();
    if (exact - rounded).abs() > 1e-9 {
        warn!(
            "The delay of deadtime {name} ({exact} timesteps at the scenario resolution) has been \
             rounded to {rounded}"
        );
    }

    rounded as usize
}

/// Add the delay of a deadtime: what goes in comes out `d` timesteps later.
///
/// Nothing comes out during the first `d` timesteps and nothing may go in during the last `d`,
/// since it would not come out within the horizon.
///
/// # Returns
///
/// The delay in scenario timesteps
pub fn add_deadtime_constraints(
    builder: &mut ModelBuilder,
    component: &Component,
    deadtime: &Deadtime,
) -> usize {
    let delay = scenario_delay(deadtime.delay, builder.time_ratio, &component.name);
    let horizon = builder.horizon;

    for t in 0..horizon {
        let mut terms = builder.outflow(component, t, |_| true);
        if t >= delay {
            terms.extend(negated(builder.inflow(component, t - delay, |_| true)));
        }
        builder.problem.add_eq(terms, 0.0);

        if t + delay >= horizon && delay > 0 {
            let terms = builder.inflow(component, t, |_| true);
            builder.problem.add_eq(terms, 0.0);
        }
    }

    delay
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2, 1.0, 2)]
    #[case(2, 4.0, 8)]
    #[case(3, 0.5, 2)]
    #[case(1, 0.25, 0)]
    fn test_scenario_delay(#[case] delay: usize, #[case] ratio: f64, #[case] expected: usize) {
        assert_eq!(scenario_delay(delay, ratio, "belt"), expected);
    }
}
