use super::super::{ModelBuilder, Role};
use crate::component::{Component, Source};

/// Add the power of a source along with its costs.
///
/// The power is the weighted outflow. It is either fixed to the determined power or limited by
/// the power bounds.
pub fn add_source_constraints(builder: &mut ModelBuilder, component: &Component, source: &Source) {
    let power = builder.add_series(&component.key, Role::Power, |t| {
        match &source.determined_power {
            Some(determined) => (determined[t], determined[t]),
            None => (source.bounds.lower(t), source.bounds.upper(t)),
        }
    });

    for (t, var) in power.iter().enumerate() {
        let mut terms = builder.outflow(component, t, |_| true);
        terms.push((*var, -1.0));
        builder.problem.add_eq(terms, 0.0);
    }

    if let Some(cost) = &source.cost {
        builder.add_energy_costs(&power, cost, 1.0);
    }
    if let Some(co2_emissions) = &source.co2_emissions {
        let co2_price = builder.co2_price;
        builder.add_energy_costs(&power, co2_emissions, co2_price);
    }
    if source.capacity_charge > 0.0 {
        let cost = source.capacity_charge * builder.capacity_charge_factor();
        builder.add_peak(&component.key, &power, cost);
    }
}
