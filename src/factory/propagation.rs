//! Flowtype propagation through the component graph.
//!
//! When a connection's flowtype becomes known, every component which can only carry a single
//! flowtype adopts it and passes it on to its other connections. The work is done in two steps:
//! the assignments are planned against the current state of the factory and only committed once
//! the whole plan is known to be consistent.
use super::Factory;
use crate::component::FlowtypePolicy;
use crate::error::{ModelError, ModelResult};
use crate::flowtype::UNKNOWN_FLOWTYPE;
use crate::id::{ComponentID, ConnectionID, FlowTypeID};
use indexmap::IndexMap;
use log::debug;
use std::collections::VecDeque;

/// The flowtype assignments resulting from one propagation
#[derive(Debug, Default)]
pub(super) struct PropagationPlan {
    components: IndexMap<ComponentID, FlowTypeID>,
    connections: IndexMap<ConnectionID, FlowTypeID>,
}

impl Factory {
    /// Plan the flowtype assignments which follow from the given seeds.
    ///
    /// Each seed is a `(component, flowtype, from)` triple stating that `component` is reached by
    /// `flowtype` through a connection with `from`.
    pub(super) fn plan_propagation<I>(&self, seeds: I) -> ModelResult<PropagationPlan>
    where
        I: IntoIterator<Item = (ComponentID, FlowTypeID, ComponentID)>,
    {
        let mut plan = PropagationPlan::default();
        let mut worklist: VecDeque<_> = seeds.into_iter().collect();

        while let Some((key, flowtype, from)) = worklist.pop_front() {
            let component = &self.components[&key];
            let policy = component.flowtype_policy();
            if policy == FlowtypePolicy::Ignore {
                continue;
            }

            let current = plan.components.get(&key).unwrap_or(&component.flowtype);
            if current.as_str() != UNKNOWN_FLOWTYPE {
                if *current != flowtype {
                    return Err(ModelError::FlowType {
                        origin: self.components[&from].name.clone(),
                        origin_flowtype: flowtype.to_string(),
                        destination: component.name.clone(),
                        destination_flowtype: current.to_string(),
                    });
                }
                continue;
            }

            plan.components.insert(key.clone(), flowtype.clone());
            if policy == FlowtypePolicy::Adopt {
                continue;
            }

            for id in component.inputs.iter().chain(&component.outputs) {
                let connection = &self.connections[id];
                if !connection.propagates() {
                    continue;
                }

                let other = connection.other_end(&key);
                let current = plan.connections.get(id).unwrap_or(&connection.flowtype);
                if current.as_str() == UNKNOWN_FLOWTYPE {
                    plan.connections.insert(*id, flowtype.clone());
                    worklist.push_back((other.clone(), flowtype.clone(), key.clone()));
                } else if *current != flowtype {
                    return Err(ModelError::FlowType {
                        origin: component.name.clone(),
                        origin_flowtype: flowtype.to_string(),
                        destination: self.components[other].name.clone(),
                        destination_flowtype: current.to_string(),
                    });
                }
            }
        }

        Ok(plan)
    }

    /// Apply a plan made by [`Factory::plan_propagation`]
    pub(super) fn commit_propagation(&mut self, plan: PropagationPlan) {
        for (key, flowtype) in plan.components {
            debug!("Component {key} takes flowtype {flowtype}");
            self.components[&key].flowtype = flowtype;
        }
        for (id, flowtype) in plan.connections {
            self.connections[&id].flowtype = flowtype;
        }
    }
}
