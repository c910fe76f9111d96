//! Item references: the link from a traceability item to the tests that verify it.
//!
//! Doorstop has stored references in two shapes over time: a single scalar
//! (`ref: test_login`) and a list of descriptors, each either a bare token or
//! a mapping of named fields (`references: [{path: ..., keyword: ...}]`).
//! Both collapse to one searchable string.

use serde_yaml::Value;

/// Joins flattened reference values. Never part of a test identifier.
const SEPARATOR: &str = "\n";

/// The references of one item, in stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum References {
    /// A single scalar reference.
    Scalar(String),

    /// An ordered list of reference descriptors.
    Descriptors(Vec<Descriptor>),
}

/// One entry of a reference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// A bare reference token.
    Token(String),

    /// Named reference fields, in stored order.
    Fields(Vec<(String, String)>),
}

impl References {
    /// Read references from a raw YAML value.
    ///
    /// Returns `None` for null or empty values. A lone mapping is treated
    /// as a one-element descriptor list.
    pub fn from_yaml(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
            Value::Sequence(seq) => {
                let descriptors: Vec<Descriptor> =
                    seq.iter().filter_map(Descriptor::from_yaml).collect();
                (!descriptors.is_empty()).then_some(Self::Descriptors(descriptors))
            }
            Value::Mapping(_) => Descriptor::from_yaml(value).map(|d| Self::Descriptors(vec![d])),
            scalar => scalar_text(scalar)
                .filter(|s| !s.is_empty())
                .map(Self::Scalar),
        }
    }

    /// Concatenate every reference value into one string for substring search.
    ///
    /// Order is descriptor order, then field order within a descriptor.
    pub fn flatten_for_search(&self) -> String {
        match self {
            Self::Scalar(text) => text.clone(),
            Self::Descriptors(descriptors) => {
                let mut parts: Vec<&str> = Vec::new();
                for descriptor in descriptors {
                    match descriptor {
                        Descriptor::Token(token) => parts.push(token),
                        Descriptor::Fields(fields) => {
                            parts.extend(fields.iter().map(|(_, value)| value.as_str()));
                        }
                    }
                }
                parts.join(SEPARATOR)
            }
        }
    }
}

impl Descriptor {
    fn from_yaml(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
            Value::Sequence(_) => {
                let mut leaves = Vec::new();
                collect_leaves(value, &mut leaves);
                (!leaves.is_empty()).then(|| Self::Token(leaves.join(SEPARATOR)))
            }
            Value::Mapping(mapping) => {
                let fields: Vec<(String, String)> = mapping
                    .iter()
                    .filter_map(|(key, value)| {
                        let key = scalar_text(key)?;
                        let mut leaves = Vec::new();
                        collect_leaves(value, &mut leaves);
                        (!leaves.is_empty()).then(|| (key, leaves.join(SEPARATOR)))
                    })
                    .collect();
                Some(Self::Fields(fields))
            }
            scalar => scalar_text(scalar).map(Self::Token),
        }
    }
}

/// String form of a scalar YAML value. `None` for null and collections.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Depth-first scalar leaves of a nested value.
fn collect_leaves(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Sequence(seq) => seq.iter().for_each(|v| collect_leaves(v, out)),
        Value::Mapping(mapping) => mapping.values().for_each(|v| collect_leaves(v, out)),
        Value::Tagged(tagged) => collect_leaves(&tagged.value, out),
        scalar => out.extend(scalar_text(scalar)),
    }
}
