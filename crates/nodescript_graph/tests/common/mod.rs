//! Shared helpers for integration tests

#![allow(dead_code)]

use nodescript_graph::{Graph, NodeId, NodeSpec};
use std::cell::RefCell;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test harness. Set `RUST_LOG=nodescript_graph=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Log of behavior invocations, in order
pub type Trace = Rc<RefCell<Vec<String>>>;

/// Exec node with one data input, recording `title` or `title:value` when it runs
pub fn recorder(graph: &mut Graph, title: &str, trace: &Trace) -> NodeId {
    let trace = Rc::clone(trace);
    graph
        .create_node(
            NodeSpec::new(title)
                .exec_input()
                .data_input("Value", "")
                .exec_output()
                .with_behavior(move |ctx| {
                    let entry = match ctx.input_value(1) {
                        Some(value) if value.to_string().is_empty() => ctx.title().to_string(),
                        Some(value) => format!("{}:{}", ctx.title(), value),
                        None => ctx.title().to_string(),
                    };
                    trace.borrow_mut().push(entry);
                }),
        )
        .unwrap()
}

/// Node with every pin class on both sides:
/// inputs `[exec, A, B]`, outputs `[exec, Out]`
pub fn generic(graph: &mut Graph, title: &str) -> NodeId {
    graph
        .create_node(
            NodeSpec::new(title)
                .exec_input()
                .data_input("A", 0)
                .data_input("B", 0)
                .exec_output()
                .data_output("Out", 0),
        )
        .unwrap()
}
