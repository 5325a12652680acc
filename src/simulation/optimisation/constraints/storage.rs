use super::super::{ModelBuilder, Role};
use crate::component::{BIG_M_POWER, Component, ComponentKind, Storage};

/// Add the state of charge of a storage.
///
/// The state of charge at the end of each timestep is the state at its start plus the energy
/// charged minus the energy discharged and lost during the timestep.
pub fn add_storage_constraints(
    builder: &mut ModelBuilder,
    component: &Component,
    storage: &Storage,
) {
    let key = &component.key;
    let capacity = storage.capacity;
    let timestep = builder.timestep;
    let factory = builder.factory;
    let losses = factory
        .outputs(component)
        .find(|connection| connection.to_losses)
        .map(|connection| builder.flows(connection.id).to_vec());

    let charge = builder.add_series(key, Role::Charge, |_| {
        (0.0, storage.power_max_charge.unwrap_or(f64::INFINITY))
    });
    let discharge = builder.add_series(key, Role::Discharge, |_| {
        (0.0, storage.power_max_discharge.unwrap_or(f64::INFINITY))
    });
    let soc_start = match storage.soc_start {
        Some(fraction) => builder.problem.add_fixed_var(fraction * capacity),
        None => builder.problem.add_var(0.0, capacity),
    };
    builder.register(key, Role::SocStart, vec![soc_start]);
    let soc = builder.add_series(key, Role::Soc, |_| (0.0, capacity));

    for t in 0..builder.horizon {
        let mut terms = builder.inflow(component, t, |_| true);
        terms.push((charge[t], -1.0));
        builder.problem.add_eq(terms, 0.0);

        let mut terms = builder.outflow(component, t, |c| !c.to_losses);
        terms.push((discharge[t], -1.0));
        builder.problem.add_eq(terms, 0.0);

        let previous = if t == 0 { soc_start } else { soc[t - 1] };
        let mut terms = vec![
            (soc[t], 1.0),
            (previous, -1.0),
            (charge[t], -timestep),
            (discharge[t], timestep),
        ];

        if let Some(losses) = &losses {
            terms.push((losses[t], timestep));
            if storage.is_lossy() {
                builder.problem.add_eq(
                    vec![
                        (losses[t], 1.0),
                        (previous, -storage.leakage_soc),
                        (discharge[t], -(1.0 / storage.efficiency - 1.0)),
                    ],
                    storage.leakage_time * capacity,
                );
            } else {
                builder.problem.add_eq(vec![(losses[t], 1.0)], 0.0);
            }
        }
        builder.problem.add_eq(terms, 0.0);
    }

    if storage.sustainable {
        if let Some(last) = soc.last() {
            builder
                .problem
                .add_eq(vec![(*last, 1.0), (soc_start, -1.0)], 0.0);
        }
    }

    if !storage.allow_pass_through || shares_pool(builder, component) {
        let limit_charge = storage.power_max_charge.unwrap_or(BIG_M_POWER);
        let limit_discharge = storage.power_max_discharge.unwrap_or(BIG_M_POWER);
        for t in 0..builder.horizon {
            let charging = builder.problem.add_binary_var();
            builder
                .problem
                .add_le(vec![(charge[t], 1.0), (charging, -limit_charge)], 0.0);
            builder.problem.add_le(
                vec![(discharge[t], 1.0), (charging, limit_discharge)],
                limit_discharge,
            );
        }
    }
}

/// Whether the storage is charged from and discharged into the same pool
fn shares_pool(builder: &ModelBuilder, component: &Component) -> bool {
    let factory = builder.factory;
    factory.inputs(component).any(|input| {
        matches!(
            factory.components[&input.origin].kind,
            ComponentKind::Pool
        ) && factory
            .outputs(component)
            .any(|output| output.destination == input.origin)
    })
}
