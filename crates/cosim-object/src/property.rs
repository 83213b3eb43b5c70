//! Declared property descriptors.
//!
//! # Design
//!
//! The original family of systems resolved published properties through
//! runtime name→offset arithmetic.  Here each object type instead declares an
//! explicit table of accessor functions over `&dyn Any`: the getter downcasts
//! to the concrete model type and reads a field, the setter downcasts and
//! writes one.  Misdeclared accessors fail as a visible `None`/`false`, never
//! as an out-of-bounds read.
//!
//! Setters take `&dyn Any` (shared), so writable fields on a model must use
//! interior mutability — a `Cell`, an atomic, or a value guarded by the
//! object's [`ObjectLock`][crate::ObjectLock].  That is already the rule for
//! anything neighbors may touch during a parallel rank.

use std::any::Any;
use std::fmt;

// ── PropertyValue ─────────────────────────────────────────────────────────────

/// A dynamically typed published value.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            PropertyValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            PropertyValue::Float(v) => Some(v),
            PropertyValue::Int(v)   => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            PropertyValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Int(v)   => write!(f, "{v}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Bool(v)  => write!(f, "{v}"),
            PropertyValue::Text(v)  => write!(f, "{v}"),
        }
    }
}

// ── PropertyDef ───────────────────────────────────────────────────────────────

/// Read a property from a model (passed as `model.as_any()`).
/// `None` means the downcast failed — the def was attached to the wrong type.
pub type GetFn = fn(&dyn Any) -> Option<PropertyValue>;

/// Write a property on a model.  `false` means the downcast failed or the
/// value's variant does not match the field.
pub type SetFn = fn(&dyn Any, &PropertyValue) -> bool;

/// One declared, externally accessible field of an object type.
pub struct PropertyDef {
    pub name: &'static str,
    pub get:  GetFn,
    pub set:  SetFn,
}

impl PropertyDef {
    pub fn new(name: &'static str, get: GetFn, set: SetFn) -> Self {
        Self { name, get, set }
    }
}

impl fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef").field("name", &self.name).finish()
    }
}
