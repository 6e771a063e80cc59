// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reusable node templates.
//!
//! A [`NodeTemplate`] describes a kind of node once (pins, flow role and a
//! shared behavior); the [`NodeCatalog`] keeps them in registration order and
//! stamps out instances into a graph. Domain libraries register their own
//! templates next to the built-in event, flow and constant nodes.

use crate::config::EngineConfig;
use crate::graph::Graph;
use crate::node::{FlowControl, NodeContext, NodeId, NodeSpec, NodeSpecError};
use crate::pin::PinSpec;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Behavior shared by every instance of a template
pub type SharedBehavior = Rc<dyn Fn(&mut NodeContext<'_>)>;

/// Error when instantiating a template
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// No template with this key
    #[error("Unknown node template: {0}")]
    UnknownTemplate(String),

    /// The template describes an invalid node
    #[error("Invalid node template: {0}")]
    InvalidSpec(#[from] NodeSpecError),
}

/// Node template definition
#[derive(Clone)]
pub struct NodeTemplate {
    /// Unique template key
    pub key: String,
    /// Title given to instances
    pub title: String,
    /// Category
    pub category: String,
    /// Description
    pub description: String,
    /// Input pins
    pub inputs: Vec<PinSpec>,
    /// Output pins
    pub outputs: Vec<PinSpec>,
    /// Flow role
    pub flow: FlowControl,
    /// Behavior, if any
    pub behavior: Option<SharedBehavior>,
}

impl NodeTemplate {
    /// Capture a template from a node spec. The spec's own behavior is dropped;
    /// use [`NodeTemplate::with_behavior`] to attach a shared one.
    pub fn from_spec(key: impl Into<String>, spec: NodeSpec) -> Self {
        Self {
            key: key.into(),
            title: spec.title,
            category: spec.category,
            description: String::new(),
            inputs: spec.inputs,
            outputs: spec.outputs,
            flow: spec.flow,
            behavior: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a behavior shared by all instances
    pub fn with_behavior(mut self, behavior: impl Fn(&mut NodeContext<'_>) + 'static) -> Self {
        self.behavior = Some(Rc::new(behavior));
        self
    }

    /// Build a spec for a new instance
    pub fn to_spec(&self) -> NodeSpec {
        let mut spec = NodeSpec::new(self.title.clone()).with_category(self.category.clone());
        spec.inputs = self.inputs.clone();
        spec.outputs = self.outputs.clone();
        spec.flow = self.flow;
        if let Some(behavior) = &self.behavior {
            let behavior = Rc::clone(behavior);
            spec = spec.with_behavior(move |ctx| behavior(ctx));
        }
        spec
    }
}

impl fmt::Debug for NodeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeTemplate")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("category", &self.category)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("flow", &self.flow)
            .finish_non_exhaustive()
    }
}

/// Registry of available node templates
#[derive(Debug, Default)]
pub struct NodeCatalog {
    /// Registered templates by key
    templates: IndexMap<String, NodeTemplate>,
}

impl NodeCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the built-in templates, with the default event titles
    pub fn with_builtins() -> Self {
        Self::with_builtins_for(&EngineConfig::default())
    }

    /// Create a catalog holding the built-in templates.
    ///
    /// The event templates take their titles from `config`, so graphs built
    /// with the same config find them in `execute_graph` and `execute_tick`.
    pub fn with_builtins_for(config: &EngineConfig) -> Self {
        let mut catalog = Self::new();
        register_builtins(&mut catalog, config);
        catalog
    }

    /// Register a template, replacing any template with the same key
    pub fn register(&mut self, template: NodeTemplate) {
        self.templates.insert(template.key.clone(), template);
    }

    /// Get a template by key
    pub fn get(&self, key: &str) -> Option<&NodeTemplate> {
        self.templates.get(key)
    }

    /// Get all registered templates
    pub fn templates(&self) -> impl Iterator<Item = &NodeTemplate> {
        self.templates.values()
    }

    /// Get templates by category
    pub fn templates_in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a NodeTemplate> {
        self.templates.values().filter(move |t| t.category == category)
    }

    /// Distinct categories in registration order
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for template in self.templates.values() {
            if !categories.contains(&template.category.as_str()) {
                categories.push(&template.category);
            }
        }
        categories
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Create a node from a template key
    pub fn instantiate(&self, graph: &mut Graph, key: &str) -> Result<NodeId, CatalogError> {
        let template = self
            .get(key)
            .ok_or_else(|| CatalogError::UnknownTemplate(key.to_string()))?;
        Ok(graph.create_node(template.to_spec())?)
    }
}

/// Pure node forwarding its single input to its single output
fn constant(key: &str, title: &str, default_value: Value) -> NodeTemplate {
    let spec = NodeSpec::new(title)
        .with_category("Const")
        .data_input("Value", default_value.clone())
        .data_output("Value", default_value);
    NodeTemplate::from_spec(key, spec).with_behavior(|ctx| {
        if let Some(value) = ctx.input_value(0).cloned() {
            ctx.set_output(0, value);
        }
    })
}

/// Register the built-in event, flow and constant templates
pub fn register_builtins(catalog: &mut NodeCatalog, config: &EngineConfig) {
    // Events
    catalog.register(
        NodeTemplate::from_spec(
            "event_start",
            NodeSpec::new(config.start_event.clone())
                .with_category("Events")
                .exec_output(),
        )
        .with_description("Entry point for execute_graph"),
    );
    catalog.register(
        NodeTemplate::from_spec(
            "event_tick",
            NodeSpec::new(config.tick_event.clone())
                .with_category("Events")
                .exec_output(),
        )
        .with_description("Entry point for execute_tick"),
    );

    // Flow control
    catalog.register(
        NodeTemplate::from_spec("branch", NodeSpec::branch("Branch"))
            .with_description("If/else branching"),
    );
    catalog.register(
        NodeTemplate::from_spec("for_loop", NodeSpec::for_loop("For Loop"))
            .with_description("Runs the body for each index in [Start, End)"),
    );

    // Print string (for debugging)
    catalog.register(
        NodeTemplate::from_spec(
            "print_string",
            NodeSpec::new("Print String")
                .with_category("Debug")
                .exec_input()
                .data_input("Text", "Hello")
                .exec_output(),
        )
        .with_description("Print a string to the log")
        .with_behavior(|ctx| {
            let text: String = ctx.input(1, String::new());
            tracing::info!(target: "nodescript::print", "[{}] {}", ctx.id(), text);
        }),
    );

    // Constants
    catalog.register(constant("const_string", "String", Value::Text("Hello".to_string())));
    catalog.register(constant("const_int", "Int", Value::Int(0)));
    catalog.register(constant("const_float", "Float", Value::Float(0.0)));
    catalog.register(constant("const_bool", "Boolean", Value::Bool(false)));
}
