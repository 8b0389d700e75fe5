//! Type descriptor definitions
//!
//! Supported descriptor kinds:
//! - primitive: runtime type tag of the candidate value
//! - predicate: opaque boolean test
//! - object shape: open-world mapping of field name to descriptor
//! - fixed tuple: positional sequence of descriptors
//! - homogeneous array: any-length array with one element descriptor
//! - alternatives: value must match at least one member

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::conformance::{field_path, index_path};
use super::errors::{DescriptorError, DescriptorResult};

/// Runtime type tag of a (possibly absent) JSON value.
///
/// `null`, arrays and objects all carry the `Object` tag; an absent value
/// carries `Undefined`. Those two must never be conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveTag {
    Number,
    String,
    Boolean,
    Undefined,
    Object,
}

impl PrimitiveTag {
    /// Computes the tag of a candidate value. `None` means absent.
    pub fn of(value: Option<&Value>) -> Self {
        match value {
            None => PrimitiveTag::Undefined,
            Some(Value::Number(_)) => PrimitiveTag::Number,
            Some(Value::String(_)) => PrimitiveTag::String,
            Some(Value::Bool(_)) => PrimitiveTag::Boolean,
            Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => {
                PrimitiveTag::Object
            }
        }
    }

    /// Returns the lowercase tag name
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveTag::Number => "number",
            PrimitiveTag::String => "string",
            PrimitiveTag::Boolean => "boolean",
            PrimitiveTag::Undefined => "undefined",
            PrimitiveTag::Object => "object",
        }
    }
}

impl fmt::Display for PrimitiveTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrimitiveTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "number" => Ok(PrimitiveTag::Number),
            "string" => Ok(PrimitiveTag::String),
            "boolean" => Ok(PrimitiveTag::Boolean),
            "undefined" => Ok(PrimitiveTag::Undefined),
            "object" => Ok(PrimitiveTag::Object),
            other => Err(format!("unknown primitive type tag '{}'", other)),
        }
    }
}

/// Opaque boolean test over a candidate value.
///
/// Panics raised by the closure propagate to the caller of `conforms`.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(Option<&Value>) -> bool + Send + Sync>);

impl Predicate {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(test))
    }

    /// Runs the test
    pub fn test(&self, value: Option<&Value>) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(<fn>)")
    }
}

/// Two predicates are equal only if they share the same closure.
impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Recursive description of an expected value shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// Runtime type tag must equal the given tag
    Primitive(PrimitiveTag),
    /// Value is accepted iff the predicate returns true
    Predicate(Predicate),
    /// Non-array object whose declared fields each conform; extra fields ignored
    ObjectShape(BTreeMap<String, TypeDescriptor>),
    /// Array of exactly this length, matched position by position
    FixedTuple(Vec<TypeDescriptor>),
    /// Array of any length (including zero) whose elements all conform
    HomogeneousArray(Box<TypeDescriptor>),
    /// Value conforms to at least one member; member order carries no meaning
    Alternatives(Vec<TypeDescriptor>),
}

impl TypeDescriptor {
    pub fn number() -> Self {
        TypeDescriptor::Primitive(PrimitiveTag::Number)
    }

    pub fn string() -> Self {
        TypeDescriptor::Primitive(PrimitiveTag::String)
    }

    pub fn boolean() -> Self {
        TypeDescriptor::Primitive(PrimitiveTag::Boolean)
    }

    pub fn undefined() -> Self {
        TypeDescriptor::Primitive(PrimitiveTag::Undefined)
    }

    /// Matches `null`, arrays and objects
    pub fn object() -> Self {
        TypeDescriptor::Primitive(PrimitiveTag::Object)
    }

    pub fn predicate<F>(test: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        TypeDescriptor::Predicate(Predicate::new(test))
    }

    /// Builds an object shape from `(field, descriptor)` pairs
    pub fn shape<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, TypeDescriptor)>,
        K: Into<String>,
    {
        TypeDescriptor::ObjectShape(
            fields
                .into_iter()
                .map(|(name, descr)| (name.into(), descr))
                .collect(),
        )
    }

    /// Any-length array of `element`
    pub fn array_of(element: TypeDescriptor) -> Self {
        TypeDescriptor::HomogeneousArray(Box::new(element))
    }

    /// Positional tuple. Requires at least two elements.
    pub fn tuple(elements: Vec<TypeDescriptor>) -> DescriptorResult<Self> {
        match elements.len() {
            0 => Err(DescriptorError::empty_sequence("$")),
            1 => Err(DescriptorError::TupleTooShort { len: 1 }),
            _ => Ok(TypeDescriptor::FixedTuple(elements)),
        }
    }

    /// Arity-overloaded array descriptor: one element means a homogeneous
    /// array, two or more mean a fixed tuple, none is an error.
    pub fn from_sequence(mut elements: Vec<TypeDescriptor>) -> DescriptorResult<Self> {
        match elements.len() {
            0 => Err(DescriptorError::empty_sequence("$")),
            1 => Ok(Self::array_of(elements.remove(0))),
            _ => Ok(TypeDescriptor::FixedTuple(elements)),
        }
    }

    pub fn any_of<I>(members: I) -> Self
    where
        I: IntoIterator<Item = TypeDescriptor>,
    {
        TypeDescriptor::Alternatives(members.into_iter().collect())
    }

    /// Accepts an absent value or anything matching `inner`
    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Alternatives(vec![Self::undefined(), inner])
    }

    /// Returns the descriptor kind name for diagnostics
    pub fn kind_name(&self) -> String {
        match self {
            TypeDescriptor::Primitive(tag) => tag.as_str().to_string(),
            TypeDescriptor::Predicate(_) => "predicate".to_string(),
            TypeDescriptor::ObjectShape(_) => "object shape".to_string(),
            TypeDescriptor::FixedTuple(elements) => format!("tuple of {}", elements.len()),
            TypeDescriptor::HomogeneousArray(element) => {
                format!("array of {}", element.kind_name())
            }
            TypeDescriptor::Alternatives(members) => format!(
                "one of [{}]",
                members
                    .iter()
                    .map(|m| m.kind_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Checks the whole descriptor tree for malformed nodes.
    pub fn validate(&self) -> DescriptorResult<()> {
        self.validate_at("$")
    }

    fn validate_at(&self, path: &str) -> DescriptorResult<()> {
        match self {
            TypeDescriptor::Primitive(_) | TypeDescriptor::Predicate(_) => Ok(()),
            TypeDescriptor::ObjectShape(fields) => {
                for (name, descr) in fields {
                    descr.validate_at(&field_path(path, name))?;
                }
                Ok(())
            }
            TypeDescriptor::FixedTuple(elements) => {
                if elements.is_empty() {
                    return Err(DescriptorError::empty_sequence(path));
                }
                for (i, descr) in elements.iter().enumerate() {
                    descr.validate_at(&index_path(path, i))?;
                }
                Ok(())
            }
            TypeDescriptor::HomogeneousArray(element) => element.validate_at(&format!("{}[]", path)),
            TypeDescriptor::Alternatives(members) => {
                for member in members {
                    member.validate_at(path)?;
                }
                Ok(())
            }
        }
    }
}
