use super::super::{ModelBuilder, negated};
use crate::component::Component;

/// Add the balance of a pool: weighted inflow equals weighted outflow at every timestep
pub fn add_pool_constraints(builder: &mut ModelBuilder, component: &Component) {
    for t in 0..builder.horizon {
        let mut terms = builder.inflow(component, t, |_| true);
        terms.extend(negated(builder.outflow(component, t, |_| true)));
        builder.problem.add_eq(terms, 0.0);
    }
}
