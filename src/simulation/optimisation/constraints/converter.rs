use super::super::{ModelBuilder, Role, Terms, negated};
use crate::component::{Component, Converter, Efficiency, VariableEfficiency};
use crate::connection::Connection;
use crate::simulation::problem::Var;

/// Add the operating point of a converter and tie its flows to it.
///
/// Each input flow is the operating point times its weight. Material outputs follow the operating
/// point in the same way while energy outputs follow the energy output, which depends on the
/// efficiency. Whatever goes in but does not come out is sent to the losses.
pub fn add_converter_constraints(
    builder: &mut ModelBuilder,
    component: &Component,
    converter: &Converter,
) {
    let bounds = &converter.bounds;
    let power = builder.add_series(&component.key, Role::OperatingPoint, |t| {
        if converter.switchable {
            (0.0, bounds.upper(t))
        } else {
            (bounds.lower(t), bounds.upper(t))
        }
    });

    // The energy output as a multiple of a variable, one per timestep
    let output: Vec<(Var, f64)> = match converter.efficiency {
        Efficiency::Variable(curve) if converter.has_variable_efficiency() => {
            let peak = bounds.peak(builder.horizon);
            add_piecewise_output(builder, &power, &curve, converter.segments, peak)
                .into_iter()
                .map(|var| (var, 1.0))
                .collect()
        }
        Efficiency::Variable(curve) => power.iter().map(|var| (*var, curve.eta_max)).collect(),
        Efficiency::Fixed => power.iter().map(|var| (*var, 1.0)).collect(),
    };

    let factory = builder.factory;
    let quantity_of = |connection: &Connection| factory.quantity(&connection.flowtype);
    for t in 0..builder.horizon {
        for connection in factory.inputs(component) {
            let flow = builder.flows(connection.id)[t];
            builder.problem.add_eq(
                vec![(flow, 1.0), (power[t], -connection.weight_destination)],
                0.0,
            );
        }

        for connection in factory.outputs(component).filter(|c| !c.to_losses) {
            let flow = builder.flows(connection.id)[t];
            let (var, coefficient) = if quantity_of(connection).is_material() {
                (power[t], 1.0)
            } else {
                output[t]
            };
            builder.problem.add_eq(
                vec![(flow, 1.0), (var, -coefficient * connection.weight_origin)],
                0.0,
            );
        }

        for losses in factory.outputs(component).filter(|c| c.to_losses) {
            let quantity = quantity_of(losses);
            let same_quantity = |connection: &Connection| {
                !connection.to_losses
                    && quantity_of(connection).is_material() == quantity.is_material()
            };
            let mut terms: Terms = vec![(builder.flows(losses.id)[t], 1.0)];
            let inputs = unweighted(builder, factory.inputs(component), t, same_quantity);
            terms.extend(negated(inputs));
            terms.extend(unweighted(
                builder,
                factory.outputs(component),
                t,
                same_quantity,
            ));
            builder.problem.add_eq(terms, 0.0);
        }
    }

    if converter.switchable {
        let on: Vec<_> = (0..builder.horizon)
            .map(|_| builder.problem.add_binary_var())
            .collect();
        for t in 0..builder.horizon {
            builder
                .problem
                .add_ge(vec![(power[t], 1.0), (on[t], -bounds.lower(t))], 0.0);
            builder
                .problem
                .add_le(vec![(power[t], 1.0), (on[t], -bounds.upper(t))], 0.0);
        }
        builder.register(&component.key, Role::On, on);
    }

    for t in 1..builder.horizon {
        if let Some(max_ramp_up) = converter.max_ramp_up {
            builder
                .problem
                .add_le(vec![(power[t], 1.0), (power[t - 1], -1.0)], max_ramp_up);
        }
        if let Some(max_ramp_down) = converter.max_ramp_down {
            builder
                .problem
                .add_le(vec![(power[t - 1], 1.0), (power[t], -1.0)], max_ramp_down);
        }
        if converter.ramp_cost > 0.0 {
            let ramp = builder.problem.add_var(0.0, f64::INFINITY);
            builder.problem.add_cost(ramp, converter.ramp_cost);
            builder.problem.add_ge(
                vec![(ramp, 1.0), (power[t], -1.0), (power[t - 1], 1.0)],
                0.0,
            );
        }
    }

    if converter.capacity_charge > 0.0 {
        let cost = converter.capacity_charge * builder.capacity_charge_factor();
        builder.add_peak(&component.key, &power, cost);
    }
}

/// Sum of the raw flows of the selected connections at `t`
fn unweighted<'a, I, F>(builder: &ModelBuilder, connections: I, t: usize, include: F) -> Terms
where
    I: Iterator<Item = &'a Connection>,
    F: Fn(&Connection) -> bool,
{
    connections
        .filter(|connection| include(connection))
        .map(|connection| (builder.flows(connection.id)[t], 1.0))
        .collect()
}

/// Operating points between which the efficiency curve is linearised.
///
/// There are `segments` equal segments on each side of the nominal point, or `2 * segments` over
/// the whole range if the nominal point lies outside it.
fn breakpoints(nominal: f64, peak: f64, segments: usize) -> Vec<f64> {
    let linspace = |from: f64, to: f64, n: usize| {
        (0..=n).map(move |i| from + (to - from) * i as f64 / n as f64)
    };
    if nominal > 0.0 && nominal < peak {
        linspace(0.0, nominal, segments)
            .chain(linspace(nominal, peak, segments).skip(1))
            .collect()
    } else {
        linspace(0.0, peak, 2 * segments).collect()
    }
}

/// Add the energy output of a converter with a variable efficiency.
///
/// The output `P·η(P)` is not linear in the operating point `P`, so it is replaced by its
/// piecewise-linear interpolation between breakpoints. At each timestep, one binary selects the
/// active segment and only the weights of its two ends may be nonzero.
fn add_piecewise_output(
    builder: &mut ModelBuilder,
    power: &[Var],
    curve: &VariableEfficiency,
    segments: usize,
    peak: f64,
) -> Vec<Var> {
    let points = breakpoints(curve.power_nominal, peak, segments);
    let problem = &mut builder.problem;
    problem.mark_nonconvex();

    power
        .iter()
        .map(|power| {
            let output = problem.add_var(0.0, f64::INFINITY);
            let weights: Vec<_> = points.iter().map(|_| problem.add_var(0.0, 1.0)).collect();
            let selectors: Vec<_> = (1..points.len())
                .map(|_| problem.add_binary_var())
                .collect();

            problem.add_eq(weights.iter().map(|w| (*w, 1.0)).collect(), 1.0);
            problem.add_eq(selectors.iter().map(|s| (*s, 1.0)).collect(), 1.0);

            let mut operating_point = vec![(*power, -1.0)];
            operating_point.extend(weights.iter().zip(&points).map(|(w, p)| (*w, *p)));
            problem.add_eq(operating_point, 0.0);

            let mut energy = vec![(output, -1.0)];
            energy.extend(
                weights
                    .iter()
                    .zip(&points)
                    .map(|(w, p)| (*w, curve.output(*p))),
            );
            problem.add_eq(energy, 0.0);

            // A weight may only be used if a segment it bounds is selected
            for (k, weight) in weights.iter().enumerate() {
                let mut terms = vec![(*weight, 1.0)];
                if k > 0 {
                    terms.push((selectors[k - 1], -1.0));
                }
                if k < selectors.len() {
                    terms.push((selectors[k], -1.0));
                }
                problem.add_le(terms, 0.0);
            }

            output
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoints_around_nominal() {
        assert_eq!(breakpoints(4.0, 10.0, 2), [0.0, 2.0, 4.0, 7.0, 10.0]);
    }

    #[test]
    fn test_breakpoints_nominal_at_peak() {
        assert_eq!(breakpoints(10.0, 10.0, 2), [0.0, 2.5, 5.0, 7.5, 10.0]);
    }
}
