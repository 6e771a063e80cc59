// SPDX-License-Identifier: MIT OR Apache-2.0
//! Read-only, serializable view of a graph.
//!
//! Renderers draw from it and it doubles as a debug dump. Behaviors are not
//! part of the snapshot, so it cannot be turned back into a running graph.

use crate::connection::Connection;
use crate::graph::Graph;
use crate::node::{FlowControl, Node, NodeId};
use crate::pin::Pin;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State of one node at snapshot time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Node id
    pub id: NodeId,
    /// Title
    pub title: String,
    /// Category
    pub category: String,
    /// Input pins
    pub inputs: Vec<Pin>,
    /// Output pins
    pub outputs: Vec<Pin>,
    /// Flow role
    pub flow: FlowControl,
    /// Whether the node was executing
    pub active: bool,
    /// Current input values by pin index
    pub input_values: BTreeMap<usize, Value>,
    /// Last computed output values by pin index
    pub output_values: BTreeMap<usize, Value>,
}

impl From<&Node> for NodeSnapshot {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id(),
            title: node.title.clone(),
            category: node.category.clone(),
            inputs: node.inputs().to_vec(),
            outputs: node.outputs().to_vec(),
            flow: node.flow(),
            active: node.is_active(),
            input_values: node
                .input_values()
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
            output_values: node
                .output_values()
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
        }
    }
}

/// State of a whole graph at snapshot time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Graph name
    pub name: String,
    /// Nodes in creation order
    pub nodes: Vec<NodeSnapshot>,
    /// Connections in insertion order
    pub connections: Vec<Connection>,
}

impl GraphSnapshot {
    /// Pretty RON dump
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Snapshot of one node
    pub fn node(&self, id: NodeId) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

impl Graph {
    /// Capture the current structure and values
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            name: self.name.clone(),
            nodes: self.nodes().map(NodeSnapshot::from).collect(),
            connections: self.connections().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeSpec;

    #[test]
    fn test_snapshot_captures_values_and_connections() {
        let mut graph = Graph::new("Demo");
        let a = graph
            .create_node(NodeSpec::new("A").exec_output().data_output("Out", 3))
            .unwrap();
        let b = graph
            .create_node(NodeSpec::new("B").exec_input().data_input("In", 0))
            .unwrap();
        assert!(graph.create_connection(a, 1, b, 1));

        let snapshot = graph.snapshot();
        assert_eq!(snapshot.name, "Demo");
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.connections.len(), 1);
        assert_eq!(snapshot.node(b).unwrap().input_values.get(&1), Some(&Value::Int(3)));
    }

    #[test]
    fn test_ron_dump() {
        let mut graph = Graph::new("Dump");
        graph
            .create_node(NodeSpec::branch("Branch"))
            .unwrap();

        let ron_str = graph.snapshot().to_ron().unwrap();
        assert!(ron_str.contains("Branch"));
        let loaded: GraphSnapshot = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, graph.snapshot());
    }
}
