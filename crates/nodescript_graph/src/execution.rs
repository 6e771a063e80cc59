// SPDX-License-Identifier: MIT OR Apache-2.0
//! Push execution along exec connections.
//!
//! Execution is depth-first from an entry node: a node runs, then each of
//! its exec successors runs to completion in connection order before the
//! next one starts. Branch and loop nodes pick which exec outputs to follow.
//!
//! The traversal uses an explicit frame stack instead of recursion, so a
//! long chain of nodes costs heap, not host stack.

use crate::graph::Graph;
use crate::node::{FlowControl, NodeId};
use crate::propagation::RunStats;

/// Error during execution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Invoke a node and schedule its successors
    Enter(NodeId),
    /// All successors of a node have finished
    Leave(NodeId),
    /// Next iteration of a loop node
    LoopStep { node: NodeId, next: i32, end: i32 },
}

impl Graph {
    /// Run from the configured start event (`On Start` by default).
    ///
    /// Returns `None` without doing anything if the graph has no such node.
    pub fn execute_graph(&mut self) -> Option<RunStats> {
        let title = self.config.start_event.clone();
        self.execute_event(&title)
    }

    /// Run from the configured tick event (`On Tick` by default)
    pub fn execute_tick(&mut self) -> Option<RunStats> {
        let title = self.config.tick_event.clone();
        self.execute_event(&title)
    }

    /// Run from the first node titled `title`, if any
    pub fn execute_event(&mut self, title: &str) -> Option<RunStats> {
        let Some(entry) = self.find_node_by_title(title) else {
            tracing::debug!("No '{}' node, nothing to execute", title);
            return None;
        };

        let mut stats = RunStats::default();
        if self.config.refresh_before_execute {
            stats += self.force_refresh_all();
        }
        if let Ok(run) = self.execute_from(entry) {
            stats += run;
        }
        Some(stats)
    }

    /// Execute `start` and everything reachable from it over exec connections.
    ///
    /// Does not return until every reachable node, including every loop
    /// iteration, has run.
    pub fn execute_from(&mut self, start: NodeId) -> Result<RunStats, ExecutionError> {
        if !self.nodes.contains_key(&start) {
            return Err(ExecutionError::NodeNotFound(start));
        }
        tracing::debug!("Executing from {}", start);

        let mut stats = RunStats::default();
        let mut stack = vec![Frame::Enter(start)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id) => {
                    if self.config.pull_dependencies {
                        stats += self.pull_dependencies(id);
                    }
                    let Some(node) = self.nodes.get_mut(&id) else {
                        continue;
                    };
                    node.set_active(true);
                    node.invoke();
                    stats.invoked += 1;

                    let flow = node.flow();
                    stack.push(Frame::Leave(id));
                    match flow {
                        FlowControl::Sequence => {
                            let targets = self.exec_successors(id, None);
                            schedule(&mut stack, targets);
                        }
                        FlowControl::Branch {
                            condition,
                            on_true,
                            on_false,
                        } => {
                            let taken = if node.input_value(condition, false) {
                                on_true
                            } else {
                                on_false
                            };
                            let targets = self.exec_successors(id, Some(taken));
                            schedule(&mut stack, targets);
                        }
                        FlowControl::Loop { start, end, .. } => {
                            let first = node.input_value(start, 0);
                            let end = node.input_value(end, 0);
                            tracing::trace!("Loop {} over [{}, {})", id, first, end);
                            stack.push(Frame::LoopStep {
                                node: id,
                                next: first,
                                end,
                            });
                        }
                    }
                }
                Frame::Leave(id) => {
                    if let Some(node) = self.nodes.get_mut(&id) {
                        node.set_active(false);
                    }
                }
                Frame::LoopStep { node: id, next, end } => {
                    let Some(node) = self.nodes.get_mut(&id) else {
                        continue;
                    };
                    let FlowControl::Loop {
                        index,
                        body,
                        completed,
                        ..
                    } = node.flow()
                    else {
                        continue;
                    };

                    if next < end {
                        node.set_output_value(index, next);
                        // The rest of the loop resumes once this body pass has finished
                        stack.push(Frame::LoopStep {
                            node: id,
                            next: next + 1,
                            end,
                        });
                        let targets = self.exec_successors(id, Some(body));
                        schedule(&mut stack, targets);
                    } else {
                        let targets = self.exec_successors(id, Some(completed));
                        schedule(&mut stack, targets);
                    }
                }
            }
        }

        Ok(stats)
    }

    /// Targets of exec connections leaving `node_id`, optionally from one pin only
    fn exec_successors(&self, node_id: NodeId, pin: Option<usize>) -> Vec<NodeId> {
        self.connections
            .values()
            .filter(|c| c.from_node == node_id && pin.map_or(true, |p| c.from_pin == p))
            .filter(|c| self.is_exec_connection(c) && c.to_node != node_id)
            .filter(|c| self.nodes.contains_key(&c.to_node))
            .map(|c| c.to_node)
            .collect()
    }
}

/// Push successors so the first one is popped first
fn schedule(stack: &mut Vec<Frame>, targets: Vec<NodeId>) {
    stack.extend(targets.into_iter().rev().map(Frame::Enter));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeSpec;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Trace = Rc<RefCell<Vec<String>>>;

    fn step(graph: &mut Graph, title: &str, trace: &Trace) -> NodeId {
        let trace = Rc::clone(trace);
        graph
            .create_node(
                NodeSpec::new(title)
                    .exec_input()
                    .exec_output()
                    .with_behavior(move |ctx| trace.borrow_mut().push(ctx.title().to_string())),
            )
            .unwrap()
    }

    fn start(graph: &mut Graph) -> NodeId {
        graph
            .create_node(NodeSpec::new("On Start").exec_output())
            .unwrap()
    }

    #[test]
    fn test_depth_first_in_connection_order() {
        let mut graph = Graph::default();
        let trace = Trace::default();
        let s = start(&mut graph);
        let a = step(&mut graph, "A", &trace);
        let a1 = step(&mut graph, "A1", &trace);
        let b = step(&mut graph, "B", &trace);

        assert!(graph.create_connection(s, 0, a, 0));
        assert!(graph.create_connection(s, 0, b, 0));
        assert!(graph.create_connection(a, 0, a1, 0));

        let stats = graph.execute_graph().unwrap();
        assert_eq!(*trace.borrow(), ["A", "A1", "B"]);
        assert_eq!(stats.invoked, 4);
        assert!(graph.nodes().all(|n| !n.is_active()));
    }

    #[test]
    fn test_missing_entry_is_a_no_op() {
        let mut graph = Graph::default();
        let trace = Trace::default();
        step(&mut graph, "A", &trace);

        assert_eq!(graph.execute_graph(), None);
        assert_eq!(graph.execute_tick(), None);
        assert!(trace.borrow().is_empty());
    }

    #[test]
    fn test_execute_from_unknown_node() {
        let mut graph = Graph::default();
        assert_eq!(
            graph.execute_from(NodeId(12)),
            Err(ExecutionError::NodeNotFound(NodeId(12)))
        );
    }

    #[test]
    fn test_branch_follows_one_side() {
        let mut graph = Graph::default();
        let trace = Trace::default();
        let s = start(&mut graph);
        let branch = graph.create_node(NodeSpec::branch("Branch")).unwrap();
        let yes = step(&mut graph, "Yes", &trace);
        let no = step(&mut graph, "No", &trace);
        assert!(graph.create_connection(s, 0, branch, 0));
        assert!(graph.create_connection(branch, 0, yes, 0));
        assert!(graph.create_connection(branch, 1, no, 0));

        graph.node_mut(branch).unwrap().set_input_value(1, true);
        graph.execute_graph();
        assert_eq!(*trace.borrow(), ["Yes"]);

        trace.borrow_mut().clear();
        graph.node_mut(branch).unwrap().set_input_value(1, false);
        graph.execute_graph();
        assert_eq!(*trace.borrow(), ["No"]);
    }

    #[test]
    fn test_loop_runs_body_then_completed() {
        let mut graph = Graph::default();
        let trace = Trace::default();
        let s = start(&mut graph);
        let looped = graph.create_node(NodeSpec::for_loop("For Loop")).unwrap();
        let body_trace = Rc::clone(&trace);
        let body = graph
            .create_node(
                NodeSpec::new("Body")
                    .exec_input()
                    .data_input("Index", -1)
                    .with_behavior(move |ctx| {
                        let i: i32 = ctx.input(1, -1);
                        body_trace.borrow_mut().push(format!("body {i}"));
                    }),
            )
            .unwrap();
        let done = step(&mut graph, "Done", &trace);

        assert!(graph.create_connection(s, 0, looped, 0));
        assert!(graph.create_connection(looped, 0, body, 0));
        assert!(graph.create_connection(looped, 2, body, 1));
        assert!(graph.create_connection(looped, 1, done, 0));

        let node = graph.node_mut(looped).unwrap();
        node.set_input_value(1, 2);
        node.set_input_value(2, 5);
        graph.execute_graph();

        assert_eq!(*trace.borrow(), ["body 2", "body 3", "body 4", "Done"]);
    }

    #[test]
    fn test_empty_loop_only_completes() {
        let mut graph = Graph::default();
        let trace = Trace::default();
        let s = start(&mut graph);
        let looped = graph.create_node(NodeSpec::for_loop("For Loop")).unwrap();
        let body = step(&mut graph, "Body", &trace);
        let done = step(&mut graph, "Done", &trace);
        assert!(graph.create_connection(s, 0, looped, 0));
        assert!(graph.create_connection(looped, 0, body, 0));
        assert!(graph.create_connection(looped, 1, done, 0));

        let node = graph.node_mut(looped).unwrap();
        node.set_input_value(1, 3);
        node.set_input_value(2, 3);
        graph.execute_graph();

        assert_eq!(*trace.borrow(), ["Done"]);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut graph = Graph::default();
        let trace = Trace::default();
        let mut previous = start(&mut graph);
        for i in 0..5_000 {
            let next = step(&mut graph, &format!("N{i}"), &trace);
            assert!(graph.create_connection(previous, 0, next, 0));
            previous = next;
        }
        graph.set_config(crate::EngineConfig {
            refresh_before_execute: false,
            pull_dependencies: false,
            ..Default::default()
        });

        let stats = graph.execute_graph().unwrap();
        assert_eq!(stats.invoked, 5_001);
        assert_eq!(trace.borrow().len(), 5_000);
    }
}
