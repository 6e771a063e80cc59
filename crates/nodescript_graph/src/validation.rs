// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection validation.
//!
//! Rules are checked in a fixed order and the first failure wins:
//! endpoints resolve, pin classes agree, no self-loop, fan-in of one,
//! no cycle.

use crate::connection::Connection;
use crate::graph::Graph;
use crate::node::NodeId;
use crate::pin::PinClass;
use std::collections::{HashMap, HashSet};

/// Error when creating a connection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Source pin index is not an output of the source node
    #[error("Node {node} has no output pin {pin}")]
    OutputPinNotFound {
        /// Source node
        node: NodeId,
        /// Requested pin
        pin: usize,
    },

    /// Target pin index is not an input of the target node
    #[error("Node {node} has no input pin {pin}")]
    InputPinNotFound {
        /// Target node
        node: NodeId,
        /// Requested pin
        pin: usize,
    },

    /// Exec pins only connect to exec pins, data pins to data pins
    #[error("Incompatible pin classes: {from:?} -> {to:?}")]
    IncompatiblePins {
        /// Source pin class
        from: PinClass,
        /// Target pin class
        to: PinClass,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// Input pin already has a connection
    #[error("Input pin {pin} of node {node} is already connected")]
    PinAlreadyConnected {
        /// Target node
        node: NodeId,
        /// Target pin
        pin: usize,
    },

    /// The connection would close a cycle
    #[error("Connection {from} -> {to} would create a cycle")]
    WouldCreateCycle {
        /// Source node
        from: NodeId,
        /// Target node
        to: NodeId,
    },
}

impl Graph {
    /// Check every rule for a prospective connection without changing the graph
    pub fn check_connection(
        &self,
        from_node: NodeId,
        from_pin: usize,
        to_node: NodeId,
        to_pin: usize,
    ) -> Result<(), ConnectionError> {
        // Validate nodes exist
        let source = self
            .nodes
            .get(&from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?;
        let target = self
            .nodes
            .get(&to_node)
            .ok_or(ConnectionError::NodeNotFound(to_node))?;

        // Validate pins exist on the right side
        let source_pin = source
            .output(from_pin)
            .ok_or(ConnectionError::OutputPinNotFound {
                node: from_node,
                pin: from_pin,
            })?;
        let target_pin = target
            .input(to_pin)
            .ok_or(ConnectionError::InputPinNotFound {
                node: to_node,
                pin: to_pin,
            })?;

        if !source_pin.can_connect(target_pin) {
            return Err(ConnectionError::IncompatiblePins {
                from: source_pin.class,
                to: target_pin.class,
            });
        }

        // Prevent self-loops
        if from_node == to_node {
            return Err(ConnectionError::SelfLoop);
        }

        // Fan-in of one per input pin
        if self.connections.values().any(|c| c.targets(to_node, to_pin)) {
            return Err(ConnectionError::PinAlreadyConnected {
                node: to_node,
                pin: to_pin,
            });
        }

        if self.would_create_cycle(from_node, to_node) {
            return Err(ConnectionError::WouldCreateCycle {
                from: from_node,
                to: to_node,
            });
        }

        Ok(())
    }

    /// Boolean view of [`Graph::check_connection`]
    pub fn can_connect(
        &self,
        from_node: NodeId,
        from_pin: usize,
        to_node: NodeId,
        to_pin: usize,
    ) -> bool {
        self.check_connection(from_node, from_pin, to_node, to_pin)
            .is_ok()
    }

    /// Check if adding an edge `from -> to` would close a cycle.
    ///
    /// Every existing edge counts, exec and data alike.
    pub fn would_create_cycle(&self, from: NodeId, to: NodeId) -> bool {
        Adjacency::from_connections(self.connections.values()).path_exists(to, from)
    }
}

/// Successor lists keyed by source node
#[derive(Debug, Default)]
pub(crate) struct Adjacency {
    successors: HashMap<NodeId, Vec<NodeId>>,
}

impl Adjacency {
    /// Build from a set of connections, ignoring pin classes
    pub(crate) fn from_connections<'a>(
        connections: impl IntoIterator<Item = &'a Connection>,
    ) -> Self {
        let mut adjacency = Self::default();
        for connection in connections {
            adjacency.insert(connection);
        }
        adjacency
    }

    /// Add one edge
    pub(crate) fn insert(&mut self, connection: &Connection) {
        self.successors
            .entry(connection.from_node)
            .or_default()
            .push(connection.to_node);
    }

    /// Depth-first search for a path from `start` to `goal`
    pub(crate) fn path_exists(&self, start: NodeId, goal: NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            if current == goal {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for next in self.successors.get(&current).into_iter().flatten() {
                if !visited.contains(next) {
                    stack.push(*next);
                }
            }
        }
        false
    }
}
