use super::super::{ModelBuilder, Role, negated};
use crate::component::{Component, Schedule};

/// Add the deliveries of a schedule.
///
/// Each part demand must receive its volume while it is available, at no more than its maximum
/// rate. The schedule passes on everything it receives.
pub fn add_schedule_constraints(
    builder: &mut ModelBuilder,
    component: &Component,
    schedule: &Schedule,
) {
    let horizon = builder.horizon;
    let timestep = builder.timestep;

    // take[d][t] is only defined while part demand d is available
    let mut take = Vec::with_capacity(schedule.part_demands.len());
    for (index, part) in schedule.part_demands.iter().enumerate() {
        let vars: Vec<_> = (0..horizon)
            .map(|t| {
                part.is_available(t)
                    .then(|| builder.problem.add_var(0.0, part.max_rate))
            })
            .collect();
        builder.register(
            &component.key,
            Role::Take(index),
            vars.iter().flatten().copied().collect(),
        );

        let volume = vars.iter().flatten().map(|var| (*var, timestep)).collect();
        builder.problem.add_eq(volume, part.volume);
        take.push(vars);
    }

    for t in 0..horizon {
        let inflow = builder.inflow(component, t, |_| true);

        let mut terms: Vec<_> = schedule
            .available_at(t)
            .into_iter()
            .filter_map(|index| take[index][t])
            .map(|var| (var, 1.0))
            .collect();
        terms.extend(negated(inflow.clone()));
        builder.problem.add_eq(terms, 0.0);

        let mut terms = inflow.clone();
        terms.extend(negated(builder.outflow(component, t, |_| true)));
        builder.problem.add_eq(terms, 0.0);

        if let Some(power_max) = &schedule.power_max {
            builder.problem.add_le(inflow, power_max[t]);
        }
    }
}
