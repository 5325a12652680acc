use super::super::ModelBuilder;
use crate::component::{Component, Slack};

/// Put the slack penalty on every unit of energy passing through a slack, in either direction
pub fn add_slack_costs(builder: &mut ModelBuilder, component: &Component, slack: &Slack) {
    let factory = builder.factory;
    for connection in factory.inputs(component).chain(factory.outputs(component)) {
        let flows = builder.flows(connection.id).to_vec();
        builder.add_energy_costs(&flows, &slack.cost, 1.0);
    }
}
