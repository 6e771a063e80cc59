// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph registry: owns every node and connection.
//!
//! Nodes live in a single arena keyed by [`NodeId`]; connections refer to
//! nodes by id only, so removing a node can never leave a dangling
//! reference behind. Validation, propagation, execution and maintenance are
//! implemented as further `impl Graph` blocks in their own modules.

use crate::config::EngineConfig;
use crate::connection::{Connection, ConnectionId};
use crate::node::{Node, NodeId, NodeIdAllocator, NodeSpec, NodeSpecError};
use crate::validation::ConnectionError;
use indexmap::IndexMap;

/// A node graph
#[derive(Debug)]
pub struct Graph {
    /// Graph name
    pub name: String,
    pub(crate) config: EngineConfig,
    ids: NodeIdAllocator,
    /// Nodes in the graph
    pub(crate) nodes: IndexMap<NodeId, Node>,
    /// Connections between nodes, in insertion order
    pub(crate) connections: IndexMap<ConnectionId, Connection>,
    /// Cached data-dependency order, dropped on every structural change
    pub(crate) data_order: Option<Vec<NodeId>>,
}

impl Graph {
    /// Create a new empty graph with the default engine configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, EngineConfig::default())
    }

    /// Create a new empty graph
    pub fn with_config(name: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            name: name.into(),
            config,
            ids: NodeIdAllocator::new(),
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            data_order: None,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the engine configuration
    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    /// Create a node from its spec and add it to the graph
    pub fn create_node(&mut self, spec: NodeSpec) -> Result<NodeId, NodeSpecError> {
        let id = self.ids.allocate();
        let node = Node::from_spec(id, spec)?;
        tracing::debug!(
            "Created node {} '{}' ({} inputs, {} outputs)",
            id,
            node.title,
            node.inputs().len(),
            node.outputs().len()
        );
        self.nodes.insert(id, node);
        self.invalidate_order();
        Ok(id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// First node with the given title, in creation order
    pub fn find_node_by_title(&self, title: &str) -> Option<NodeId> {
        self.nodes
            .values()
            .find(|n| n.title == title)
            .map(Node::id)
    }

    /// Validate and add a connection; `false` leaves the graph unchanged
    pub fn create_connection(
        &mut self,
        from_node: NodeId,
        from_pin: usize,
        to_node: NodeId,
        to_pin: usize,
    ) -> bool {
        self.try_connect(from_node, from_pin, to_node, to_pin).is_ok()
    }

    /// Validate and add a connection, reporting why it was rejected
    pub fn try_connect(
        &mut self,
        from_node: NodeId,
        from_pin: usize,
        to_node: NodeId,
        to_pin: usize,
    ) -> Result<ConnectionId, ConnectionError> {
        if let Err(e) = self.check_connection(from_node, from_pin, to_node, to_pin) {
            tracing::debug!(
                "Rejected connection {}:{} -> {}:{}: {}",
                from_node,
                from_pin,
                to_node,
                to_pin,
                e
            );
            return Err(e);
        }

        let connection = Connection::new(from_node, from_pin, to_node, to_pin);
        let id = connection.id;
        self.connections.insert(id, connection);
        self.invalidate_order();
        tracing::debug!(
            "Connected {}:{} -> {}:{}",
            from_node,
            from_pin,
            to_node,
            to_pin
        );

        // The destination should reflect the source right away, not on the next tick
        self.pull_connection(id);
        Ok(id)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections, in insertion order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get connections leaving an output pin
    pub fn connections_from(
        &self,
        node_id: NodeId,
        pin: usize,
    ) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.leaves(node_id, pin))
    }

    /// Get connections entering an input pin
    pub fn connections_to(
        &self,
        node_id: NodeId,
        pin: usize,
    ) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.targets(node_id, pin))
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Check whether a pin has any connection on the given side
    pub fn has_connection(&self, node_id: NodeId, pin: usize, is_input: bool) -> bool {
        self.connections
            .values()
            .any(|c| c.touches_pin(node_id, pin, is_input))
    }

    /// Whether a connection runs between data pins. Unresolvable connections are not.
    pub(crate) fn is_data_connection(&self, connection: &Connection) -> bool {
        self.nodes
            .get(&connection.from_node)
            .and_then(|n| n.output(connection.from_pin))
            .is_some_and(|p| p.is_data())
    }

    /// Whether a connection runs between exec pins
    pub(crate) fn is_exec_connection(&self, connection: &Connection) -> bool {
        self.nodes
            .get(&connection.from_node)
            .and_then(|n| n.output(connection.from_pin))
            .is_some_and(|p| p.is_exec())
    }

    pub(crate) fn invalidate_order(&mut self) {
        self.data_order = None;
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
