//! Module for creating and analysing graphs of a factory
use crate::component::ComponentKind;
use crate::factory::Factory;
use crate::id::{ComponentID, ConnectionID};
use petgraph::Directed;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{EdgeReference, Graph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef, Reversed};
use std::collections::HashMap;

/// A graph of the components of a factory, with one edge per connection
pub type FactoryGraph = Graph<ComponentID, ConnectionID, Directed>;

/// Create a directed graph of a factory.
///
/// # Returns
///
/// The graph and a lookup from component keys to node indices
pub fn create_factory_graph(factory: &Factory) -> (FactoryGraph, HashMap<ComponentID, NodeIndex>) {
    let mut graph = Graph::new();
    let nodes: HashMap<_, _> = factory
        .components
        .keys()
        .map(|key| (key.clone(), graph.add_node(key.clone())))
        .collect();

    for connection in factory.connections.values() {
        graph.add_edge(
            nodes[&connection.origin],
            nodes[&connection.destination],
            connection.id,
        );
    }

    (graph, nodes)
}

/// Find the components which no flow can reach, because no source lies upstream of them.
///
/// Structural components, sources and components without inputs are skipped.
pub fn find_unsupplied_components(factory: &Factory) -> Vec<ComponentID> {
    let (graph, nodes) = create_factory_graph(factory);
    let mut supplied = vec![false; graph.node_count()];

    for component in factory.components.values().filter(|c| c.is_source()) {
        let mut bfs = Bfs::new(&graph, nodes[&component.key]);
        while let Some(node) = bfs.next(&graph) {
            supplied[node.index()] = true;
        }
    }

    factory
        .components
        .values()
        .filter(|c| !c.is_structural && !c.is_source() && !c.inputs.is_empty())
        .filter(|c| !supplied[nodes[&c.key].index()])
        .map(|c| c.key.clone())
        .collect()
}

/// Find the components from which flow cannot leave the factory, because no sink or storage lies
/// downstream of them.
pub fn find_undrained_components(factory: &Factory) -> Vec<ComponentID> {
    let (graph, nodes) = create_factory_graph(factory);
    let reversed = Reversed(&graph);
    let mut drained = vec![false; graph.node_count()];

    for component in factory.components.values().filter(|c| {
        (c.is_sink() && !c.is_losses_sink()) || matches!(c.kind, ComponentKind::Storage(_))
    }) {
        let mut bfs = Bfs::new(reversed, nodes[&component.key]);
        while let Some(node) = bfs.next(reversed) {
            drained[node.index()] = true;
        }
    }

    factory
        .components
        .values()
        .filter(|c| !c.is_structural && !c.is_sink() && !c.outputs.is_empty())
        .filter(|c| {
            // Outputs which only lead to the losses don't count
            factory.outputs(c).any(|o| !o.to_losses)
        })
        .filter(|c| !drained[nodes[&c.key].index()])
        .map(|c| c.key.clone())
        .collect()
}

/// Render the factory in Graphviz DOT format.
///
/// Nodes are labelled with the component name and type, and edges with their flowtype.
pub fn factory_to_dot(factory: &Factory) -> String {
    let (graph, _) = create_factory_graph(factory);
    let edge_attrs = |_, edge: EdgeReference<'_, ConnectionID>| {
        let connection = &factory.connections[edge.weight()];
        let color = factory
            .flowtypes
            .get(&connection.flowtype)
            .map_or("#808080", |flowtype| flowtype.color.as_str());
        let style = if connection.to_losses || connection.from_gains || connection.is_slack {
            ", style=dashed"
        } else {
            ""
        };
        format!(
            "label=\"{}\", color=\"{color}\"{style}",
            connection.flowtype
        )
    };
    let node_attrs = |_, (_, key): (NodeIndex, &ComponentID)| {
        let component = &factory.components[key];
        format!(
            "label=\"{}\\n({})\"",
            component.name,
            component.component_type()
        )
    };
    let dot = Dot::with_attr_getters(
        &graph,
        &[Config::EdgeNoLabel, Config::NodeNoLabel],
        &edge_attrs,
        &node_attrs,
    );

    format!("{dot:?}")
}
