//! Conformance evaluation of JSON values against type descriptors
//!
//! Evaluation semantics:
//! - primitive: runtime tag equality (`null` is an object, absence is undefined)
//! - predicate: the closure's verdict, verbatim
//! - fixed tuple: array, equal length, positional conformance
//! - homogeneous array: array of any length, every element conforms
//! - alternatives: at least one member conforms
//! - object shape: non-null, non-array object; each declared field conforms,
//!   a missing field is evaluated as an absent value, extra fields are ignored
//!
//! A malformed descriptor is reported as `DescriptorError`, never as a
//! `false` verdict. The whole descriptor tree is checked before any value is
//! inspected, so the outcome does not depend on the data.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

use super::errors::{DescriptorError, DescriptorResult};
use super::types::{PrimitiveTag, TypeDescriptor};

/// First point at which a value failed to conform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Location within the value (e.g., `$.items[2].name`)
    pub path: String,
    /// Descriptor kind expected at that location
    pub expected: String,
    /// What was actually found
    pub actual: String,
}

impl Mismatch {
    fn new(path: &str, expected: impl Into<String>, value: Option<&Value>) -> Self {
        Self {
            path: path.to_string(),
            expected: expected.into(),
            actual: describe_actual(value).to_string(),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at '{}': expected {}, got {}",
            self.path, self.expected, self.actual
        )
    }
}

/// Returns whether `value` conforms to `descriptor`. `None` is an absent value.
pub fn conforms(value: Option<&Value>, descriptor: &TypeDescriptor) -> DescriptorResult<bool> {
    check(value, descriptor).map(|mismatch| mismatch.is_none())
}

/// [`conforms`] for a value that is known to be present.
pub fn conforms_value(value: &Value, descriptor: &TypeDescriptor) -> DescriptorResult<bool> {
    conforms(Some(value), descriptor)
}

/// Evaluates conformance and reports the first mismatch, if any.
pub fn check(
    value: Option<&Value>,
    descriptor: &TypeDescriptor,
) -> DescriptorResult<Option<Mismatch>> {
    descriptor.validate()?;
    check_at(value, descriptor, "$")
}

/// Narrows an untyped value to `T` when it conforms to `descriptor`.
///
/// Returns `Ok(None)` if the value does not conform or does not deserialize
/// into `T`.
pub fn narrow<T: DeserializeOwned>(
    value: Value,
    descriptor: &TypeDescriptor,
) -> DescriptorResult<Option<T>> {
    if !conforms_value(&value, descriptor)? {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

fn check_at(
    value: Option<&Value>,
    descriptor: &TypeDescriptor,
    path: &str,
) -> DescriptorResult<Option<Mismatch>> {
    match descriptor {
        TypeDescriptor::Primitive(tag) => {
            if PrimitiveTag::of(value) == *tag {
                Ok(None)
            } else {
                Ok(Some(Mismatch::new(path, tag.as_str(), value)))
            }
        }
        TypeDescriptor::Predicate(predicate) => {
            if predicate.test(value) {
                Ok(None)
            } else {
                Ok(Some(Mismatch::new(path, "value accepted by predicate", value)))
            }
        }
        TypeDescriptor::FixedTuple(elements) => {
            if elements.is_empty() {
                return Err(DescriptorError::empty_sequence(path));
            }
            let Some(items) = value.and_then(Value::as_array) else {
                return Ok(Some(Mismatch::new(path, descriptor.kind_name(), value)));
            };
            if items.len() != elements.len() {
                return Ok(Some(Mismatch {
                    path: path.to_string(),
                    expected: descriptor.kind_name(),
                    actual: format!("array of {}", items.len()),
                }));
            }
            for (i, (item, element)) in items.iter().zip(elements).enumerate() {
                if let Some(mismatch) = check_at(Some(item), element, &index_path(path, i))? {
                    return Ok(Some(mismatch));
                }
            }
            Ok(None)
        }
        TypeDescriptor::HomogeneousArray(element) => {
            let Some(items) = value.and_then(Value::as_array) else {
                return Ok(Some(Mismatch::new(path, descriptor.kind_name(), value)));
            };
            for (i, item) in items.iter().enumerate() {
                if let Some(mismatch) = check_at(Some(item), element, &index_path(path, i))? {
                    return Ok(Some(mismatch));
                }
            }
            Ok(None)
        }
        TypeDescriptor::Alternatives(members) => {
            for member in members {
                if check_at(value, member, path)?.is_none() {
                    return Ok(None);
                }
            }
            Ok(Some(Mismatch::new(path, descriptor.kind_name(), value)))
        }
        TypeDescriptor::ObjectShape(fields) => {
            let Some(object) = value.and_then(Value::as_object) else {
                return Ok(Some(Mismatch::new(path, "object shape", value)));
            };
            for (name, field_descriptor) in fields {
                let field_value = object.get(name);
                if let Some(mismatch) =
                    check_at(field_value, field_descriptor, &field_path(path, name))?
                {
                    return Ok(Some(mismatch));
                }
            }
            Ok(None)
        }
    }
}

/// Finer-grained name than the primitive tag, for diagnostics only.
fn describe_actual(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

pub(crate) fn field_path(prefix: &str, field: &str) -> String {
    format!("{}.{}", prefix, field)
}

pub(crate) fn index_path(prefix: &str, index: usize) -> String {
    format!("{}[{}]", prefix, index)
}
