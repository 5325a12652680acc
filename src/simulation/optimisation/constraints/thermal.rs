use super::super::{ModelBuilder, Role, negated};
use crate::component::{Component, ThermalSystem};
use crate::connection::Connection;

/// Connections which carry heat deliberately supplied to or drawn from the system
fn is_regular(connection: &Connection) -> bool {
    !connection.to_losses && !connection.from_gains
}

/// Add the temperature of a thermal system.
///
/// The system is a single thermal capacity coupled to the ambient through a resistance. Heat
/// exchanged with the ambient is routed through the gains and losses connections.
pub fn add_thermal_constraints(
    builder: &mut ModelBuilder,
    component: &Component,
    thermal: &ThermalSystem,
) {
    let horizon = builder.horizon;
    let timestep = builder.timestep;
    let resistance = thermal.resistance;
    let capacity = thermal.capacity;
    let factory = builder.factory;

    // One temperature per timestep plus the temperature after the last one
    let mut temperature = vec![builder.problem.add_fixed_var(thermal.temperature_start)];
    for t in 1..horizon {
        temperature.push(
            builder
                .problem
                .add_var(thermal.min_temperature(t), thermal.max_temperature(t)),
        );
    }
    let last = horizon.saturating_sub(1);
    temperature.push(if thermal.sustainable {
        builder.problem.add_fixed_var(thermal.temperature_start)
    } else {
        builder
            .problem
            .add_var(thermal.min_temperature(last), thermal.max_temperature(last))
    });

    let coupling = timestep / (resistance * capacity);
    for t in 1..=horizon {
        let mut terms = vec![
            (temperature[t], 1.0),
            (temperature[t - 1], coupling - 1.0),
        ];
        terms.extend(
            negated(builder.inflow(component, t - 1, is_regular))
                .map(|(var, weight)| (var, weight * timestep / capacity)),
        );
        terms.extend(
            builder
                .outflow(component, t - 1, is_regular)
                .into_iter()
                .map(|(var, weight)| (var, weight * timestep / capacity)),
        );
        builder
            .problem
            .add_eq(terms, thermal.ambient(t - 1) * coupling);
    }

    let losses: Vec<_> = factory
        .outputs(component)
        .filter(|connection| connection.to_losses)
        .map(|connection| connection.id)
        .collect();
    let gains: Vec<_> = factory
        .inputs(component)
        .filter(|connection| connection.from_gains)
        .map(|connection| connection.id)
        .collect();
    for t in 0..horizon {
        let mut terms = vec![(temperature[t], -1.0 / resistance)];
        terms.extend(losses.iter().map(|id| (builder.flows(*id)[t], 1.0)));
        terms.extend(gains.iter().map(|id| (builder.flows(*id)[t], -1.0)));
        builder
            .problem
            .add_eq(terms, -thermal.ambient(t) / resistance);
    }

    builder.register(&component.key, Role::Temperature, temperature);
}
