use super::super::{ModelBuilder, Role};
use crate::component::{Component, Sink};

/// Add the power of a sink along with its costs and revenues.
///
/// The power is the weighted inflow. Losses sinks take whatever they are given.
pub fn add_sink_constraints(builder: &mut ModelBuilder, component: &Component, sink: &Sink) {
    let power = builder.add_series(&component.key, Role::Power, |t| {
        if sink.is_losses {
            return (0.0, f64::INFINITY);
        }
        match &sink.demand {
            Some(demand) => (demand[t], demand[t]),
            None => (sink.bounds.lower(t), sink.bounds.upper(t)),
        }
    });

    for (t, var) in power.iter().enumerate() {
        let mut terms = builder.inflow(component, t, |_| true);
        terms.push((*var, -1.0));
        builder.problem.add_eq(terms, 0.0);
    }

    let co2_price = builder.co2_price;
    if let Some(cost) = &sink.cost {
        builder.add_energy_costs(&power, cost, 1.0);
    }
    if let Some(revenue) = &sink.revenue {
        builder.add_energy_costs(&power, revenue, -1.0);
    }
    if let Some(co2_emissions) = &sink.co2_emissions {
        builder.add_energy_costs(&power, co2_emissions, co2_price);
    }
    if let Some(co2_refund) = &sink.co2_refund {
        builder.add_energy_costs(&power, co2_refund, -co2_price);
    }
}
