// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph engine.
//!
//! A node owns its pins, its value stores and its behavior. The behavior only
//! ever sees a [`NodeContext`] over the node's own stores, so it cannot reach
//! other nodes or the graph; everything between nodes travels over
//! connections.

use crate::pin::{Pin, PinClass, PinDirection, PinSpec};
use crate::store::ValueStore;
use crate::value::{FromValue, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node within its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic node id source. Ids are never reused, even after deletion.
#[derive(Debug, Clone, Default)]
pub struct NodeIdAllocator {
    next: u64,
}

impl NodeIdAllocator {
    /// Create an allocator starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// Callback bound to a node at creation time
pub type Behavior = Box<dyn FnMut(&mut NodeContext<'_>)>;

/// How the execution engine continues after invoking a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FlowControl {
    /// Follow every outgoing exec connection
    #[default]
    Sequence,
    /// Follow only `on_true` or `on_false`, depending on the `condition` input
    Branch {
        /// Boolean data input
        condition: usize,
        /// Exec output taken when the condition holds
        on_true: usize,
        /// Exec output taken otherwise
        on_false: usize,
    },
    /// Run `body` once per index in `[start, end)`, then `completed` once
    Loop {
        /// Integer data input, inclusive
        start: usize,
        /// Integer data input, exclusive
        end: usize,
        /// Integer data output receiving the current index
        index: usize,
        /// Exec output run once per iteration
        body: usize,
        /// Exec output run after the last iteration
        completed: usize,
    },
}

/// Error in a [`NodeSpec`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeSpecError {
    /// A flow role names a pin that does not exist
    #[error("{role} pin {index} does not exist on {direction:?} side")]
    MissingFlowPin {
        /// Role name
        role: &'static str,
        /// Requested index
        index: usize,
        /// Side the pin was expected on
        direction: PinDirection,
    },

    /// A flow role names a pin of the wrong class
    #[error("{role} pin {index} must be a {expected:?} pin")]
    WrongFlowPinClass {
        /// Role name
        role: &'static str,
        /// Requested index
        index: usize,
        /// Required class
        expected: PinClass,
    },
}

/// Everything needed to create a node
pub struct NodeSpec {
    /// Display title
    pub title: String,
    /// Free-form category, presentation only
    pub category: String,
    /// Input pins in order
    pub inputs: Vec<PinSpec>,
    /// Output pins in order
    pub outputs: Vec<PinSpec>,
    /// Flow role
    pub flow: FlowControl,
    /// Bound behavior
    pub behavior: Option<Behavior>,
}

impl NodeSpec {
    /// Create a spec with no pins and no behavior
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            flow: FlowControl::Sequence,
            behavior: None,
        }
    }

    /// Conditional branch: exec in, boolean `Condition`, `True`/`False` exec outs
    pub fn branch(title: impl Into<String>) -> Self {
        Self::new(title)
            .with_category("Flow")
            .exec_input()
            .data_input("Condition", false)
            .exec_output_named("True")
            .exec_output_named("False")
            .with_flow(FlowControl::Branch {
                condition: 1,
                on_true: 0,
                on_false: 1,
            })
    }

    /// Bounded loop: exec in, `Start`/`End` integers, `Loop Body`/`Completed`
    /// exec outs and an `Index` output
    pub fn for_loop(title: impl Into<String>) -> Self {
        Self::new(title)
            .with_category("Flow")
            .exec_input()
            .data_input("Start", 0)
            .data_input("End", 0)
            .exec_output_named("Loop Body")
            .exec_output_named("Completed")
            .data_output("Index", 0)
            .with_flow(FlowControl::Loop {
                start: 1,
                end: 2,
                index: 2,
                body: 0,
                completed: 1,
            })
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Append an unnamed exec input
    pub fn exec_input(mut self) -> Self {
        self.inputs.push(PinSpec::exec(""));
        self
    }

    /// Append an unnamed exec output
    pub fn exec_output(self) -> Self {
        self.exec_output_named("")
    }

    /// Append a named exec output
    pub fn exec_output_named(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(PinSpec::exec(name));
        self
    }

    /// Append a data input with its default value
    pub fn data_input(mut self, name: impl Into<String>, default_value: impl Into<Value>) -> Self {
        self.inputs.push(PinSpec::data(name, default_value));
        self
    }

    /// Append a data output with its initial value
    pub fn data_output(mut self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        self.outputs.push(PinSpec::data(name, initial));
        self
    }

    /// Append an arbitrary input pin
    pub fn input(mut self, pin: PinSpec) -> Self {
        self.inputs.push(pin);
        self
    }

    /// Append an arbitrary output pin
    pub fn output(mut self, pin: PinSpec) -> Self {
        self.outputs.push(pin);
        self
    }

    /// Set the flow role
    pub fn with_flow(mut self, flow: FlowControl) -> Self {
        self.flow = flow;
        self
    }

    /// Bind the behavior
    pub fn with_behavior(mut self, behavior: impl FnMut(&mut NodeContext<'_>) + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    fn check_flow(&self) -> Result<(), NodeSpecError> {
        let check = |role: &'static str,
                     index: usize,
                     direction: PinDirection,
                     expected: PinClass|
         -> Result<(), NodeSpecError> {
            let pins = match direction {
                PinDirection::Input => &self.inputs,
                PinDirection::Output => &self.outputs,
            };
            let pin = pins.get(index).ok_or(NodeSpecError::MissingFlowPin {
                role,
                index,
                direction,
            })?;
            if pin.class != expected {
                return Err(NodeSpecError::WrongFlowPinClass {
                    role,
                    index,
                    expected,
                });
            }
            Ok(())
        };

        match self.flow {
            FlowControl::Sequence => Ok(()),
            FlowControl::Branch {
                condition,
                on_true,
                on_false,
            } => {
                check("condition", condition, PinDirection::Input, PinClass::Data)?;
                check("true", on_true, PinDirection::Output, PinClass::Exec)?;
                check("false", on_false, PinDirection::Output, PinClass::Exec)
            }
            FlowControl::Loop {
                start,
                end,
                index,
                body,
                completed,
            } => {
                check("start", start, PinDirection::Input, PinClass::Data)?;
                check("end", end, PinDirection::Input, PinClass::Data)?;
                check("index", index, PinDirection::Output, PinClass::Data)?;
                check("body", body, PinDirection::Output, PinClass::Exec)?;
                check("completed", completed, PinDirection::Output, PinClass::Exec)
            }
        }
    }
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("title", &self.title)
            .field("category", &self.category)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("flow", &self.flow)
            .field("behavior", &self.behavior.is_some())
            .finish()
    }
}

/// The view of a node handed to its behavior
pub struct NodeContext<'a> {
    id: NodeId,
    title: &'a str,
    inputs: &'a mut ValueStore,
    outputs: &'a mut ValueStore,
    locals: &'a mut ValueStore<String>,
}

impl NodeContext<'_> {
    /// Id of the running node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Title of the running node
    pub fn title(&self) -> &str {
        self.title
    }

    /// Typed read of an input, `fallback` on missing value or kind mismatch
    pub fn input<T: FromValue>(&self, pin: usize, fallback: T) -> T {
        self.inputs.get(&pin, fallback)
    }

    /// Raw input value
    pub fn input_value(&self, pin: usize) -> Option<&Value> {
        self.inputs.value(&pin)
    }

    /// Overwrite an input value
    pub fn set_input(&mut self, pin: usize, value: impl Into<Value>) {
        self.inputs.set(pin, value);
    }

    /// Typed read of an output, `fallback` on missing value or kind mismatch
    pub fn output<T: FromValue>(&self, pin: usize, fallback: T) -> T {
        self.outputs.get(&pin, fallback)
    }

    /// Write an output value
    pub fn set_output(&mut self, pin: usize, value: impl Into<Value>) {
        self.outputs.set(pin, value);
    }

    /// Typed read of a scratch value kept between invocations
    pub fn local<T: FromValue>(&self, name: &str, fallback: T) -> T {
        self.locals.get(&name.to_string(), fallback)
    }

    /// Keep a scratch value until the next invocation
    pub fn set_local(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.locals.set(name.into(), value);
    }
}

/// A node instance in the graph
pub struct Node {
    id: NodeId,
    /// Display title
    pub title: String,
    /// Free-form category
    pub category: String,
    inputs: Vec<Pin>,
    outputs: Vec<Pin>,
    flow: FlowControl,
    input_values: ValueStore,
    output_values: ValueStore,
    locals: ValueStore<String>,
    active: bool,
    behavior: Option<Behavior>,
}

impl Node {
    /// Build a node from its spec, seeding data inputs with their defaults
    pub fn from_spec(id: NodeId, spec: NodeSpec) -> Result<Self, NodeSpecError> {
        spec.check_flow()?;

        let inputs: Vec<Pin> = spec
            .inputs
            .iter()
            .enumerate()
            .map(|(i, s)| Pin::from_spec(i, PinDirection::Input, s))
            .collect();
        let outputs: Vec<Pin> = spec
            .outputs
            .iter()
            .enumerate()
            .map(|(i, s)| Pin::from_spec(i, PinDirection::Output, s))
            .collect();

        let mut input_values = ValueStore::new();
        for pin in &inputs {
            if let Some(default) = &pin.default_value {
                input_values.set(pin.index, default.clone());
            }
        }
        let mut output_values = ValueStore::new();
        for (index, s) in spec.outputs.iter().enumerate() {
            if let (PinClass::Data, Some(initial)) = (s.class, &s.default_value) {
                output_values.set(index, initial.clone());
            }
        }

        Ok(Self {
            id,
            title: spec.title,
            category: spec.category,
            inputs,
            outputs,
            flow: spec.flow,
            input_values,
            output_values,
            locals: ValueStore::new(),
            active: false,
            behavior: spec.behavior,
        })
    }

    /// Node id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Input pins
    pub fn inputs(&self) -> &[Pin] {
        &self.inputs
    }

    /// Output pins
    pub fn outputs(&self) -> &[Pin] {
        &self.outputs
    }

    /// Get an input pin by index
    pub fn input(&self, index: usize) -> Option<&Pin> {
        self.inputs.get(index)
    }

    /// Get an output pin by index
    pub fn output(&self, index: usize) -> Option<&Pin> {
        self.outputs.get(index)
    }

    /// Flow role
    pub fn flow(&self) -> FlowControl {
        self.flow
    }

    /// A pure node has no exec input and is re-evaluated on every pull
    pub fn is_pure(&self) -> bool {
        !self.inputs.iter().any(Pin::is_exec)
    }

    /// Whether the node is currently executing
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a behavior is bound
    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    /// Current input values
    pub fn input_values(&self) -> &ValueStore {
        &self.input_values
    }

    /// Last computed output values
    pub fn output_values(&self) -> &ValueStore {
        &self.output_values
    }

    /// Scratch values kept by the behavior
    pub fn locals(&self) -> &ValueStore<String> {
        &self.locals
    }

    /// Typed read of an input value
    pub fn input_value<T: FromValue>(&self, pin: usize, fallback: T) -> T {
        self.input_values.get(&pin, fallback)
    }

    /// Typed read of an output value
    pub fn output_value<T: FromValue>(&self, pin: usize, fallback: T) -> T {
        self.output_values.get(&pin, fallback)
    }

    /// Set an input value directly (host-side editing of unconnected inputs)
    pub fn set_input_value(&mut self, pin: usize, value: impl Into<Value>) {
        self.input_values.set(pin, value);
    }

    /// Set an output value directly
    pub fn set_output_value(&mut self, pin: usize, value: impl Into<Value>) {
        self.output_values.set(pin, value);
    }

    /// Run the bound behavior against this node's own stores
    pub fn invoke(&mut self) {
        let Some(behavior) = self.behavior.as_mut() else {
            return;
        };
        let mut ctx = NodeContext {
            id: self.id,
            title: &self.title,
            inputs: &mut self.input_values,
            outputs: &mut self.output_values,
            locals: &mut self.locals,
        };
        behavior(&mut ctx);
    }

    /// Put a data input back to its captured default, or clear it if it has none
    pub(crate) fn restore_default(&mut self, pin: usize) {
        match self.inputs.get(pin) {
            Some(p) if p.is_data() => match &p.default_value {
                Some(default) => self.input_values.set(pin, default.clone()),
                None => {
                    self.input_values.remove(&pin);
                }
            },
            _ => {}
        }
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("category", &self.category)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("flow", &self.flow)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
