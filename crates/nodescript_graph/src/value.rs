// SPDX-License-Identifier: MIT OR Apache-2.0
//! Values that flow through data pins.
//!
//! The set of kinds is closed: every pin store holds a [`Value`], and typed
//! reads go through [`FromValue`], which reports a mismatch as `None` instead
//! of failing.

use glam::{Mat3, Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to something owned by the host (a scene object, an asset...).
///
/// The engine never dereferences it; it only carries it between pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle(pub u64);

/// Kind of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// UTF-8 text
    Text,
    /// 32-bit signed integer
    Int,
    /// 32-bit float
    Float,
    /// Boolean
    Bool,
    /// 2D vector
    Vec2,
    /// 3D vector
    Vec3,
    /// 3x3 matrix
    Mat3,
    /// 4x4 matrix
    Mat4,
    /// Host handle
    Handle,
}

impl ValueKind {
    /// Display name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
            Self::Handle => "handle",
        }
    }
}

/// Value that can be stored in a pin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Text
    Text(String),
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// Boolean
    Bool(bool),
    /// 2D vector
    Vec2(Vec2),
    /// 3D vector
    Vec3(Vec3),
    /// 3x3 matrix
    Mat3(Mat3),
    /// 4x4 matrix
    Mat4(Mat4),
    /// Host handle
    Handle(Handle),
}

impl Value {
    /// Get the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Bool,
            Self::Vec2(_) => ValueKind::Vec2,
            Self::Vec3(_) => ValueKind::Vec3,
            Self::Mat3(_) => ValueKind::Mat3,
            Self::Mat4(_) => ValueKind::Mat4,
            Self::Handle(_) => ValueKind::Handle,
        }
    }

    /// Read this value as `T`, or `None` if the kind differs
    pub fn get<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Vec2(v) => write!(f, "({}, {})", v.x, v.y),
            Self::Vec3(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            Self::Mat3(m) => write!(f, "{m}"),
            Self::Mat4(m) => write!(f, "{m}"),
            Self::Handle(h) => write!(f, "handle#{}", h.0),
        }
    }
}

/// Conversion out of a [`Value`] for typed pin reads.
pub trait FromValue: Sized {
    /// Extract `Self`, or `None` when the stored kind is not `Self`'s kind
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! value_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(inner) => Some(inner.clone()),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(inner: $ty) -> Self {
                    Value::$variant(inner)
                }
            }
        )*
    };
}

value_conversions! {
    String => Text,
    i32 => Int,
    f32 => Float,
    bool => Bool,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Mat3 => Mat3,
    Mat4 => Mat4,
    Handle => Handle,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}
