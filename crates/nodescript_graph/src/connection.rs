// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed edge from an output pin to an input pin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Source node ID
    pub from_node: NodeId,
    /// Source output pin index
    pub from_pin: usize,
    /// Target node ID
    pub to_node: NodeId,
    /// Target input pin index
    pub to_pin: usize,
}

impl Connection {
    /// Create a new connection
    pub fn new(from_node: NodeId, from_pin: usize, to_node: NodeId, to_pin: usize) -> Self {
        Self {
            id: ConnectionId::new(),
            from_node,
            from_pin,
            to_node,
            to_pin,
        }
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }

    /// Check if this connection starts at `(node, output pin)`
    pub fn leaves(&self, node_id: NodeId, pin: usize) -> bool {
        self.from_node == node_id && self.from_pin == pin
    }

    /// Check if this connection ends at `(node, input pin)`
    pub fn targets(&self, node_id: NodeId, pin: usize) -> bool {
        self.to_node == node_id && self.to_pin == pin
    }

    /// Check if this connection touches the given pin on the given side
    pub fn touches_pin(&self, node_id: NodeId, pin: usize, is_input: bool) -> bool {
        if is_input {
            self.targets(node_id, pin)
        } else {
            self.leaves(node_id, pin)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_queries() {
        let c = Connection::new(NodeId(1), 0, NodeId(2), 3);
        assert!(c.involves_node(NodeId(1)));
        assert!(c.involves_node(NodeId(2)));
        assert!(!c.involves_node(NodeId(3)));
        assert!(c.leaves(NodeId(1), 0));
        assert!(c.targets(NodeId(2), 3));
        assert!(c.touches_pin(NodeId(2), 3, true));
        assert!(!c.touches_pin(NodeId(2), 3, false));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Connection::new(NodeId(1), 0, NodeId(2), 0);
        let b = Connection::new(NodeId(1), 0, NodeId(2), 0);
        assert_ne!(a.id, b.id);
    }
}
