// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dataflow propagation.
//!
//! Values move from output stores to connected input stores by pulling:
//!
//! - [`Graph::tick`] runs once per host tick and refreshes every data
//!   connection whose source is a pure node, re-invoking that source first.
//! - [`Graph::pull_connection`] and [`Graph::force_refresh_all`] copy
//!   immediately, for one edge or for all of them.
//! - [`Graph::pull_dependencies`] refreshes the inputs of one node by walking
//!   its data dependencies upstream; the execution engine calls it before
//!   invoking each node.
//!
//! [`Graph::propagate`] is the single entry point over these and push
//! execution.

use crate::connection::{Connection, ConnectionId};
use crate::execution::ExecutionError;
use crate::graph::Graph;
use crate::node::NodeId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::AddAssign;

/// Counters for one propagation or execution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Node behaviors invoked
    pub invoked: usize,
    /// Values copied across data connections
    pub copied: usize,
}

impl AddAssign for RunStats {
    fn add_assign(&mut self, other: Self) {
        self.invoked += other.invoked;
        self.copied += other.copied;
    }
}

/// What to propagate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Continuous pull from pure nodes, once per host tick
    Tick,
    /// Immediate pull over every data connection
    RefreshAll,
    /// Immediate pull over one connection
    Connection(ConnectionId),
    /// Refresh one node's inputs from its upstream data dependencies
    Dependencies(NodeId),
    /// Push execution along exec connections from a node
    ExecuteFrom(NodeId),
}

impl Graph {
    /// Run one propagation strategy
    pub fn propagate(&mut self, propagation: Propagation) -> Result<RunStats, ExecutionError> {
        match propagation {
            Propagation::Tick => Ok(self.tick()),
            Propagation::RefreshAll => Ok(self.force_refresh_all()),
            Propagation::Connection(id) => Ok(self.pull_connection(id)),
            Propagation::Dependencies(id) => {
                if !self.nodes.contains_key(&id) {
                    return Err(ExecutionError::NodeNotFound(id));
                }
                Ok(self.pull_dependencies(id))
            }
            Propagation::ExecuteFrom(id) => self.execute_from(id),
        }
    }

    /// Continuous pull: refresh every data connection whose source is pure
    pub fn tick(&mut self) -> RunStats {
        self.pull_in_order(true)
    }

    /// Immediate pull over every data connection, pure sources re-invoked first
    pub fn force_refresh_all(&mut self) -> RunStats {
        self.pull_in_order(false)
    }

    /// Immediate pull over a single connection
    pub fn pull_connection(&mut self, connection_id: ConnectionId) -> RunStats {
        let mut stats = RunStats::default();
        let Some(connection) = self.connections.get(&connection_id).cloned() else {
            return stats;
        };
        if !self.is_data_connection(&connection) {
            return stats;
        }

        if let Some(source) = self.nodes.get_mut(&connection.from_node) {
            if source.is_pure() {
                source.invoke();
                stats.invoked += 1;
            }
        }
        if self.copy_value(&connection) {
            stats.copied += 1;
        }
        stats
    }

    /// Refresh the inputs of `node_id` from its data dependencies.
    ///
    /// Walks upstream through pure nodes only: each is refreshed and
    /// re-invoked once, dependencies first. Non-pure sources contribute their
    /// last computed outputs. `node_id` itself is not invoked.
    pub fn pull_dependencies(&mut self, node_id: NodeId) -> RunStats {
        let mut stats = RunStats::default();

        for id in self.upstream_order(node_id) {
            for connection in self.data_inputs_of(id) {
                if self.copy_value(&connection) {
                    stats.copied += 1;
                }
            }
            if id == node_id {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(&id) {
                if node.is_pure() {
                    node.invoke();
                    stats.invoked += 1;
                }
            }
        }
        stats
    }

    /// Node ids in data-dependency order: every source before its targets.
    ///
    /// Only data connections are considered. Cached until the next
    /// structural change.
    pub fn data_order(&mut self) -> Vec<NodeId> {
        if let Some(order) = &self.data_order {
            return order.clone();
        }
        let order = self.calculate_data_order();
        tracing::debug!("Calculated data order over {} nodes", order.len());
        self.data_order = Some(order.clone());
        order
    }

    fn calculate_data_order(&self) -> Vec<NodeId> {
        let mut in_degree: HashMap<NodeId, usize> =
            self.nodes.keys().map(|id| (*id, 0)).collect();
        let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

        for connection in self.connections.values() {
            if !self.nodes.contains_key(&connection.to_node)
                || !self.is_data_connection(connection)
            {
                continue;
            }
            *in_degree.entry(connection.to_node).or_insert(0) += 1;
            adjacency
                .entry(connection.from_node)
                .or_default()
                .push(connection.to_node);
        }

        // Seed in creation order so the result is deterministic
        let mut queue: VecDeque<NodeId> = self
            .nodes
            .keys()
            .filter(|id| in_degree.get(id) == Some(&0))
            .copied()
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(current) = queue.pop_front() {
            order.push(current);
            for next in adjacency.get(&current).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*next);
                    }
                }
            }
        }
        order
    }

    fn pull_in_order(&mut self, pure_sources_only: bool) -> RunStats {
        let mut stats = RunStats::default();

        for id in self.data_order() {
            for connection in self.data_inputs_of(id) {
                let source_is_pure = self
                    .nodes
                    .get(&connection.from_node)
                    .is_some_and(|n| n.is_pure());
                if pure_sources_only && !source_is_pure {
                    continue;
                }
                if self.copy_value(&connection) {
                    stats.copied += 1;
                }
            }

            let feeds_data = self
                .connections
                .values()
                .any(|c| c.from_node == id && self.is_data_connection(c));
            if !feeds_data {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(&id) {
                if node.is_pure() {
                    node.invoke();
                    stats.invoked += 1;
                }
            }
        }

        tracing::trace!(
            "Pulled {} values, invoked {} nodes (pure only: {})",
            stats.copied,
            stats.invoked,
            pure_sources_only
        );
        stats
    }

    /// Upstream nodes of `target` in post-order, ending with `target`
    fn upstream_order(&self, target: NodeId) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![(target, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if !visited.insert(id) {
                continue;
            }
            stack.push((id, true));

            // Walk past pure nodes only; anything else is a leaf
            let walk = id == target || self.nodes.get(&id).is_some_and(|n| n.is_pure());
            if !walk {
                continue;
            }
            for connection in self.data_inputs_of(id) {
                if !visited.contains(&connection.from_node)
                    && self.nodes.contains_key(&connection.from_node)
                {
                    stack.push((connection.from_node, false));
                }
            }
        }
        order
    }

    /// Data connections ending at `node_id`, in insertion order
    fn data_inputs_of(&self, node_id: NodeId) -> Vec<Connection> {
        self.connections
            .values()
            .filter(|c| c.to_node == node_id && self.is_data_connection(c))
            .cloned()
            .collect()
    }

    /// Copy the source's output value into the target's input slot.
    ///
    /// Returns `false` if either end is gone or the source has no value yet.
    fn copy_value(&mut self, connection: &Connection) -> bool {
        let Some(value) = self
            .nodes
            .get(&connection.from_node)
            .and_then(|n| n.output_values().value(&connection.from_pin))
            .cloned()
        else {
            return false;
        };
        let Some(target) = self.nodes.get_mut(&connection.to_node) else {
            return false;
        };
        if target.input(connection.to_pin).is_none() {
            return false;
        }
        target.set_input_value(connection.to_pin, value);
        true
    }
}
