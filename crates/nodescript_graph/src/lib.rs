// SPDX-License-Identifier: MIT OR Apache-2.0
//! Visual scripting graph engine.
//!
//! Host code builds graphs of nodes connected by typed pins. Exec pins carry
//! control flow, data pins carry [`Value`]s. Each node's behavior is a
//! callback bound at creation time; the engine owns structure, validation,
//! value propagation and execution order.
//!
//! ## Architecture
//!
//! - [`Graph`] owns every node and connection and is the only entry point
//! - Connections are validated before insertion (pin class, fan-in, cycles)
//! - Data is pulled from pure nodes once per tick, or immediately on demand
//! - Exec flow is pushed depth-first from an entry node, with branch and
//!   loop nodes choosing which outputs to follow
//!
//! ```
//! use nodescript_graph::{Graph, NodeSpec};
//!
//! let mut graph = Graph::default();
//! let start = graph.create_node(NodeSpec::new("On Start").exec_output()).unwrap();
//! let print = graph
//!     .create_node(
//!         NodeSpec::new("Print")
//!             .exec_input()
//!             .data_input("Text", "Hello")
//!             .with_behavior(|ctx| println!("{}", ctx.input(1, String::new()))),
//!     )
//!     .unwrap();
//! assert!(graph.create_connection(start, 0, print, 0));
//! graph.execute_graph();
//! ```

pub mod catalog;
pub mod config;
pub mod connection;
pub mod execution;
pub mod graph;
pub mod maintenance;
pub mod node;
pub mod pin;
pub mod propagation;
pub mod snapshot;
pub mod store;
pub mod validation;
pub mod value;

pub use catalog::{CatalogError, NodeCatalog, NodeTemplate};
pub use config::{ConfigError, EngineConfig};
pub use connection::{Connection, ConnectionId};
pub use execution::ExecutionError;
pub use graph::Graph;
pub use maintenance::IntegrityViolation;
pub use node::{Behavior, FlowControl, Node, NodeContext, NodeId, NodeSpec, NodeSpecError};
pub use pin::{Pin, PinClass, PinDirection, PinSpec};
pub use propagation::{Propagation, RunStats};
pub use snapshot::{GraphSnapshot, NodeSnapshot};
pub use store::ValueStore;
pub use validation::ConnectionError;
pub use value::{FromValue, Handle, Value, ValueKind};
