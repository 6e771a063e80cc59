// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin definitions for node inputs/outputs.

use crate::value::{Value, ValueKind};
use serde::{Deserialize, Serialize};

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    /// Input pin
    Input,
    /// Output pin
    Output,
}

/// What a pin carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinClass {
    /// Execution flow
    Exec,
    /// A value
    Data,
}

impl PinClass {
    /// Color used by renderers for this pin class
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Exec => [255, 255, 255],
            Self::Data => [160, 160, 164],
        }
    }

    /// Check if this class can connect to another class
    pub fn can_connect_to(&self, other: PinClass) -> bool {
        *self == other
    }
}

/// Declaration of a pin, used when creating a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinSpec {
    /// Pin name
    pub name: String,
    /// Exec or data
    pub class: PinClass,
    /// Default value (data inputs) or initial value (data outputs)
    pub default_value: Option<Value>,
}

impl PinSpec {
    /// An execution pin
    pub fn exec(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: PinClass::Exec,
            default_value: None,
        }
    }

    /// A data pin with a default value
    pub fn data(name: impl Into<String>, default_value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            class: PinClass::Data,
            default_value: Some(default_value.into()),
        }
    }

    /// A data pin with no default value
    pub fn data_untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: PinClass::Data,
            default_value: None,
        }
    }
}

/// A pin on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    /// Position in the node's input or output list
    pub index: usize,
    /// Pin name
    pub name: String,
    /// Pin direction
    pub direction: PinDirection,
    /// Exec or data
    pub class: PinClass,
    /// Default value captured at creation (data inputs only)
    pub default_value: Option<Value>,
}

impl Pin {
    /// Build a pin from its declaration
    pub fn from_spec(index: usize, direction: PinDirection, spec: &PinSpec) -> Self {
        let default_value = match (direction, spec.class) {
            (PinDirection::Input, PinClass::Data) => spec.default_value.clone(),
            _ => None,
        };
        Self {
            index,
            name: spec.name.clone(),
            direction,
            class: spec.class,
            default_value,
        }
    }

    /// Whether this is an execution pin
    pub fn is_exec(&self) -> bool {
        self.class == PinClass::Exec
    }

    /// Whether this is a data pin
    pub fn is_data(&self) -> bool {
        self.class == PinClass::Data
    }

    /// Kind of the default value, if the pin has one
    pub fn value_kind(&self) -> Option<ValueKind> {
        self.default_value.as_ref().map(Value::kind)
    }

    /// Check if a connection from this pin to another is valid
    pub fn can_connect(&self, other: &Pin) -> bool {
        // Must be opposite directions
        if self.direction == other.direction {
            return false;
        }

        self.class.can_connect_to(other.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_data_inputs_keep_defaults() {
        let spec = PinSpec::data("Value", 5);
        let input = Pin::from_spec(0, PinDirection::Input, &spec);
        let output = Pin::from_spec(0, PinDirection::Output, &spec);

        assert_eq!(input.default_value, Some(Value::Int(5)));
        assert_eq!(input.value_kind(), Some(ValueKind::Int));
        assert_eq!(output.default_value, None);
    }

    #[test]
    fn test_can_connect_requires_same_class_and_opposite_direction() {
        let exec_out = Pin::from_spec(0, PinDirection::Output, &PinSpec::exec("Then"));
        let exec_in = Pin::from_spec(0, PinDirection::Input, &PinSpec::exec(""));
        let data_in = Pin::from_spec(1, PinDirection::Input, &PinSpec::data("Text", ""));

        assert!(exec_out.can_connect(&exec_in));
        assert!(!exec_out.can_connect(&data_in));
        assert!(!exec_in.can_connect(&data_in));
    }
}
