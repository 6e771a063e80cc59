// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural maintenance: removal cascades, integrity checks and cleanup.

use crate::connection::{Connection, ConnectionId};
use crate::graph::Graph;
use crate::node::{Node, NodeId};
use crate::validation::Adjacency;
use std::collections::HashSet;

/// A stored connection that breaks a graph invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityViolation {
    /// An endpoint node no longer exists
    #[error("Connection {connection:?} references missing node {node}")]
    MissingNode {
        /// Offending connection
        connection: ConnectionId,
        /// Missing node
        node: NodeId,
    },

    /// The source pin index is not an output of the source node
    #[error("Connection {connection:?} leaves missing output pin {pin} of node {node}")]
    InvalidOutputPin {
        /// Offending connection
        connection: ConnectionId,
        /// Source node
        node: NodeId,
        /// Pin index
        pin: usize,
    },

    /// The target pin index is not an input of the target node
    #[error("Connection {connection:?} enters missing input pin {pin} of node {node}")]
    InvalidInputPin {
        /// Offending connection
        connection: ConnectionId,
        /// Target node
        node: NodeId,
        /// Pin index
        pin: usize,
    },

    /// The two pins have different classes
    #[error("Connection {connection:?} joins an exec pin to a data pin")]
    ClassMismatch {
        /// Offending connection
        connection: ConnectionId,
    },

    /// An earlier connection already enters the same input pin
    #[error("Connection {connection:?} is a second connection into pin {pin} of node {node}")]
    DuplicateInput {
        /// Offending connection
        connection: ConnectionId,
        /// Target node
        node: NodeId,
        /// Pin index
        pin: usize,
    },

    /// The connection closes a cycle with earlier connections
    #[error("Connection {connection:?} closes a cycle")]
    Cycle {
        /// Offending connection
        connection: ConnectionId,
    },
}

impl Graph {
    /// Remove a node and its connections.
    ///
    /// Every connection touching the node goes first, so no connection ever
    /// refers to a missing node.
    pub fn delete_node(&mut self, node_id: NodeId) -> Option<Node> {
        if !self.nodes.contains_key(&node_id) {
            return None;
        }
        let removed = self.remove_all_connections_from_node(node_id);
        let node = self.nodes.shift_remove(&node_id);
        self.invalidate_order();
        tracing::debug!("Deleted node {} and {} connections", node_id, removed);
        node
    }

    /// Remove one connection
    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.shift_remove(&connection_id)?;
        self.detach(&connection);
        self.invalidate_order();
        Some(connection)
    }

    /// Remove every connection touching a node. Returns how many were removed.
    pub fn remove_all_connections_from_node(&mut self, node_id: NodeId) -> usize {
        self.remove_where(|c| c.involves_node(node_id))
    }

    /// Remove every connection on one pin. Returns how many were removed.
    ///
    /// Disconnected data inputs go back to their default value.
    pub fn remove_connections_from_pin(
        &mut self,
        node_id: NodeId,
        pin: usize,
        is_input: bool,
    ) -> usize {
        self.remove_where(|c| c.touches_pin(node_id, pin, is_input))
    }

    /// Check every stored connection, without changing anything
    pub fn validate_integrity(&self) -> bool {
        let violations = self.integrity_report();
        for violation in &violations {
            tracing::warn!("Integrity: {}", violation);
        }
        violations.is_empty()
    }

    /// List every stored connection that breaks an invariant.
    ///
    /// Connections are replayed in insertion order against the ones accepted
    /// before them, so for a duplicate input or a cycle the later connection
    /// is the one reported.
    pub fn integrity_report(&self) -> Vec<IntegrityViolation> {
        let mut accepted = Adjacency::default();
        let mut occupied: HashSet<(NodeId, usize)> = HashSet::new();
        let mut violations = Vec::new();

        for connection in self.connections.values() {
            match self.audit(connection, &accepted, &occupied) {
                Some(violation) => violations.push(violation),
                None => {
                    occupied.insert((connection.to_node, connection.to_pin));
                    accepted.insert(connection);
                }
            }
        }
        violations
    }

    /// Drop every connection that [`Graph::integrity_report`] would report.
    /// Returns how many were removed.
    pub fn cleanup_invalid_connections(&mut self) -> usize {
        let invalid: HashSet<ConnectionId> = self
            .integrity_report()
            .iter()
            .map(IntegrityViolation::connection)
            .collect();
        if invalid.is_empty() {
            tracing::debug!("Cleanup found no invalid connections");
            return 0;
        }

        let removed = self.remove_where(|c| invalid.contains(&c.id));
        tracing::info!("Removed {} invalid connections", removed);
        removed
    }

    /// Insert a connection without validation.
    ///
    /// For loaders rebuilding a saved graph. Follow up with
    /// [`Graph::validate_integrity`] or [`Graph::cleanup_invalid_connections`].
    pub fn restore_connection(&mut self, connection: Connection) -> ConnectionId {
        let id = connection.id;
        self.connections.insert(id, connection);
        self.invalidate_order();
        id
    }

    fn audit(
        &self,
        connection: &Connection,
        accepted: &Adjacency,
        occupied: &HashSet<(NodeId, usize)>,
    ) -> Option<IntegrityViolation> {
        let id = connection.id;
        let Some(source) = self.nodes.get(&connection.from_node) else {
            return Some(IntegrityViolation::MissingNode {
                connection: id,
                node: connection.from_node,
            });
        };
        let Some(target) = self.nodes.get(&connection.to_node) else {
            return Some(IntegrityViolation::MissingNode {
                connection: id,
                node: connection.to_node,
            });
        };
        let Some(source_pin) = source.output(connection.from_pin) else {
            return Some(IntegrityViolation::InvalidOutputPin {
                connection: id,
                node: connection.from_node,
                pin: connection.from_pin,
            });
        };
        let Some(target_pin) = target.input(connection.to_pin) else {
            return Some(IntegrityViolation::InvalidInputPin {
                connection: id,
                node: connection.to_node,
                pin: connection.to_pin,
            });
        };
        if source_pin.class != target_pin.class {
            return Some(IntegrityViolation::ClassMismatch { connection: id });
        }
        if occupied.contains(&(connection.to_node, connection.to_pin)) {
            return Some(IntegrityViolation::DuplicateInput {
                connection: id,
                node: connection.to_node,
                pin: connection.to_pin,
            });
        }
        if connection.from_node == connection.to_node
            || accepted.path_exists(connection.to_node, connection.from_node)
        {
            return Some(IntegrityViolation::Cycle { connection: id });
        }
        None
    }

    fn remove_where(&mut self, mut predicate: impl FnMut(&Connection) -> bool) -> usize {
        let mut removed = Vec::new();
        self.connections.retain(|_, c| {
            if predicate(c) {
                removed.push(c.clone());
                false
            } else {
                true
            }
        });

        for connection in &removed {
            tracing::debug!(
                "Removed connection {}:{} -> {}:{}",
                connection.from_node,
                connection.from_pin,
                connection.to_node,
                connection.to_pin
            );
            self.detach(connection);
        }
        if !removed.is_empty() {
            self.invalidate_order();
        }
        removed.len()
    }

    /// A data input left with no connection goes back to its default
    fn detach(&mut self, connection: &Connection) {
        if self.has_connection(connection.to_node, connection.to_pin, true) {
            return;
        }
        if let Some(target) = self.nodes.get_mut(&connection.to_node) {
            target.restore_default(connection.to_pin);
        }
    }
}

impl IntegrityViolation {
    /// The offending connection
    pub fn connection(&self) -> ConnectionId {
        match self {
            Self::MissingNode { connection, .. }
            | Self::InvalidOutputPin { connection, .. }
            | Self::InvalidInputPin { connection, .. }
            | Self::ClassMismatch { connection }
            | Self::DuplicateInput { connection, .. }
            | Self::Cycle { connection } => *connection,
        }
    }
}
