//! Integration tests for building and running graphs end to end
//!
//! These tests exercise the engine the way a host would:
//! - Building graphs from built-in templates and custom specs
//! - Running from the start and tick events
//! - Branching and looping
//! - Editing a graph between runs

mod common;

use common::{init_tracing, recorder, Trace};
use nodescript_graph::{EngineConfig, Graph, NodeCatalog, NodeSpec, Propagation, Value};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_start_runs_print_once() {
    init_tracing();
    let mut graph = Graph::default();
    let calls = Rc::new(Cell::new(0));

    let start = graph
        .create_node(NodeSpec::new("On Start").exec_output())
        .unwrap();
    let counter = Rc::clone(&calls);
    let print = graph
        .create_node(
            NodeSpec::new("Print")
                .exec_input()
                .data_input("Text", "Hello")
                .exec_output()
                .with_behavior(move |ctx| {
                    assert_eq!(ctx.input(1, String::new()), "Hello");
                    counter.set(counter.get() + 1);
                }),
        )
        .unwrap();

    assert!(graph.create_connection(start, 0, print, 0));
    assert!(graph.execute_graph().is_some());
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_branch_driven_by_pure_constant() {
    init_tracing();
    let catalog = NodeCatalog::with_builtins();
    let mut graph = Graph::default();
    let trace = Trace::default();

    let start = catalog.instantiate(&mut graph, "event_start").unwrap();
    let condition = catalog.instantiate(&mut graph, "const_bool").unwrap();
    let branch = catalog.instantiate(&mut graph, "branch").unwrap();
    let yes = recorder(&mut graph, "Yes", &trace);
    let yes_after = recorder(&mut graph, "YesAfter", &trace);
    let no = recorder(&mut graph, "No", &trace);

    assert!(graph.create_connection(start, 0, branch, 0));
    assert!(graph.create_connection(condition, 0, branch, 1));
    assert!(graph.create_connection(branch, 0, yes, 0));
    assert!(graph.create_connection(yes, 0, yes_after, 0));
    assert!(graph.create_connection(branch, 1, no, 0));

    graph.node_mut(condition).unwrap().set_input_value(0, true);
    graph.execute_graph();
    assert_eq!(*trace.borrow(), ["Yes", "YesAfter"]);

    trace.borrow_mut().clear();
    graph.node_mut(condition).unwrap().set_input_value(0, false);
    graph.execute_graph();
    assert_eq!(*trace.borrow(), ["No"]);
}

#[test]
fn test_loop_counts_and_indices() {
    init_tracing();
    let catalog = NodeCatalog::with_builtins();
    let mut graph = Graph::default();
    let trace = Trace::default();

    let start = catalog.instantiate(&mut graph, "event_start").unwrap();
    let end = catalog.instantiate(&mut graph, "const_int").unwrap();
    let looped = catalog.instantiate(&mut graph, "for_loop").unwrap();
    let body = recorder(&mut graph, "Body", &trace);
    let done = recorder(&mut graph, "Done", &trace);

    assert!(graph.create_connection(start, 0, looped, 0));
    assert!(graph.create_connection(end, 0, looped, 2));
    assert!(graph.create_connection(looped, 0, body, 0));
    assert!(graph.create_connection(looped, 2, body, 1));
    assert!(graph.create_connection(looped, 1, done, 0));

    graph.node_mut(end).unwrap().set_input_value(0, 5);
    graph.execute_graph();

    assert_eq!(
        *trace.borrow(),
        ["Body:0", "Body:1", "Body:2", "Body:3", "Body:4", "Done"]
    );
    assert_eq!(graph.node(looped).unwrap().output_value(2, -1), 4);
    assert!(!graph.node(looped).unwrap().is_active());
}

#[test]
fn test_nested_loops() {
    init_tracing();
    let catalog = NodeCatalog::with_builtins();
    let mut graph = Graph::default();
    let calls = Rc::new(Cell::new(0));

    let start = catalog.instantiate(&mut graph, "event_start").unwrap();
    let outer = catalog.instantiate(&mut graph, "for_loop").unwrap();
    let inner = catalog.instantiate(&mut graph, "for_loop").unwrap();
    let counter = Rc::clone(&calls);
    let body = graph
        .create_node(
            NodeSpec::new("Count")
                .exec_input()
                .with_behavior(move |_| counter.set(counter.get() + 1)),
        )
        .unwrap();

    assert!(graph.create_connection(start, 0, outer, 0));
    assert!(graph.create_connection(outer, 0, inner, 0));
    assert!(graph.create_connection(inner, 0, body, 0));
    graph.node_mut(outer).unwrap().set_input_value(2, 3);
    graph.node_mut(inner).unwrap().set_input_value(2, 4);

    graph.execute_graph();
    assert_eq!(calls.get(), 12);
}

#[test]
fn test_tick_event_uses_configured_title() {
    init_tracing();
    let config = EngineConfig::from_ron_str("(tick_event: \"Every Frame\")").unwrap();
    let mut graph = Graph::with_config("Ticking", config);
    let trace = Trace::default();

    let tick = graph
        .create_node(NodeSpec::new("Every Frame").exec_output())
        .unwrap();
    let step = recorder(&mut graph, "Step", &trace);
    assert!(graph.create_connection(tick, 0, step, 0));

    assert!(graph.execute_graph().is_none());
    graph.execute_tick();
    graph.execute_tick();
    assert_eq!(*trace.borrow(), ["Step", "Step"]);
}

#[test]
fn test_pure_chain_feeds_executed_node() {
    init_tracing();
    let catalog = NodeCatalog::with_builtins();
    let mut graph = Graph::default();
    let trace = Trace::default();

    let start = catalog.instantiate(&mut graph, "event_start").unwrap();
    let text = catalog.instantiate(&mut graph, "const_string").unwrap();
    let show = recorder(&mut graph, "Show", &trace);
    assert!(graph.create_connection(start, 0, show, 0));
    assert!(graph.create_connection(text, 0, show, 1));

    // Connecting pulled the constant's default right away
    assert_eq!(
        graph.node(show).unwrap().input_values().value(&1),
        Some(&Value::Text("Hello".to_string()))
    );

    graph.node_mut(text).unwrap().set_input_value(0, "World");
    graph.propagate(Propagation::Tick).unwrap();
    assert_eq!(graph.node(show).unwrap().input_value(1, String::new()), "World");

    graph.execute_graph();
    assert_eq!(*trace.borrow(), ["Show:World"]);
}

#[test]
fn test_editing_between_runs() {
    init_tracing();
    let catalog = NodeCatalog::with_builtins();
    let mut graph = Graph::default();
    let trace = Trace::default();

    let start = catalog.instantiate(&mut graph, "event_start").unwrap();
    let text = catalog.instantiate(&mut graph, "const_string").unwrap();
    let show = recorder(&mut graph, "Show", &trace);
    assert!(graph.create_connection(start, 0, show, 0));
    assert!(graph.create_connection(text, 0, show, 1));

    graph.execute_graph();
    graph.delete_node(text);
    graph.execute_graph();
    let replacement = recorder(&mut graph, "Other", &trace);
    assert!(graph.create_connection(start, 0, replacement, 0));
    graph.execute_graph();

    assert_eq!(*trace.borrow(), ["Show:Hello", "Show", "Show", "Other"]);
    assert!(graph.validate_integrity());
}

#[test]
fn test_print_string_builtin() {
    init_tracing();
    let catalog = NodeCatalog::with_builtins();
    let mut graph = Graph::default();

    let start = catalog.instantiate(&mut graph, "event_start").unwrap();
    let print = catalog.instantiate(&mut graph, "print_string").unwrap();
    assert!(graph.create_connection(start, 0, print, 0));

    let stats = graph.execute_graph().unwrap();
    assert_eq!(stats.invoked, 2);
}

#[test]
fn test_config_loaded_from_file() {
    init_tracing();
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/engine.ron");
    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.start_event, "Begin Play");
    assert!(!config.pull_dependencies);

    let mut graph = Graph::with_config("Loaded", config);
    let trace = Trace::default();
    let begin = graph
        .create_node(NodeSpec::new("Begin Play").exec_output())
        .unwrap();
    let step = recorder(&mut graph, "Step", &trace);
    assert!(graph.create_connection(begin, 0, step, 0));

    graph.execute_graph();
    assert_eq!(*trace.borrow(), ["Step"]);
}

#[test]
fn test_missing_config_file() {
    let result = EngineConfig::load("does/not/exist.ron");
    assert!(matches!(result, Err(nodescript_graph::ConfigError::Io(_))));
}
