use super::super::{ModelBuilder, Role};
use crate::component::{Component, TriggerDemand};
use crate::connection::Connection;

/// Add the executions of a trigger demand.
///
/// An integer variable counts the executions starting at each allowed offset. The load at a
/// timestep is the sum of the profiles of all executions running at that time, and both the input
/// and the output of each quantity carry it.
pub fn add_trigger_constraints(
    builder: &mut ModelBuilder,
    component: &Component,
    trigger: &TriggerDemand,
) {
    let horizon = builder.horizon;
    let length = trigger.length();
    let offsets: Vec<_> = trigger
        .offsets()
        .filter(|offset| offset + length <= horizon)
        .collect();
    let max_executions = trigger.executions.map_or(f64::INFINITY, f64::from);
    let executions: Vec<_> = offsets
        .iter()
        .map(|_| builder.problem.add_integer_var(0.0, max_executions))
        .collect();

    if let Some(total) = trigger.executions {
        builder.problem.add_eq(
            executions.iter().map(|var| (*var, 1.0)).collect(),
            f64::from(total),
        );
    }

    let running = |t: usize| {
        offsets
            .iter()
            .zip(&executions)
            .filter(move |(offset, _)| **offset <= t && t < **offset + length)
    };

    if let Some(max_parallel) = trigger.max_parallel {
        for t in 0..horizon {
            let terms: Vec<_> = running(t).map(|(_, var)| (*var, 1.0)).collect();
            if !terms.is_empty() {
                builder.problem.add_le(terms, f64::from(max_parallel));
            }
        }
    }

    let factory = builder.factory;
    for material in [false, true] {
        let profile = trigger.profile(material);
        let has_quantity = |connection: &Connection| {
            factory.quantity(&connection.flowtype).is_material() == material
        };

        for t in 0..horizon {
            let load: Vec<_> = match profile {
                Some(profile) => running(t)
                    .map(|(offset, var)| (*var, -profile[t - offset]))
                    .collect(),
                None => Vec::new(),
            };

            for (flow, weight) in builder
                .inflow(component, t, has_quantity)
                .into_iter()
                .chain(builder.outflow(component, t, has_quantity))
            {
                let mut terms = vec![(flow, weight)];
                terms.extend(load.iter().copied());
                builder.problem.add_eq(terms, 0.0);
            }
        }
    }

    builder.register(&component.key, Role::Executions, executions);
}
