//! Items and conditional-write expressions.

use serde_json::{Map, Value};

/// A stored item: attribute name to JSON value.
pub type Item = Map<String, Value>;

/// Read consistency requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadConsistency {
    #[default]
    Eventual,
    Strong,
}

/// Precondition evaluated atomically with a write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Condition {
    /// Unconditional.
    #[default]
    None,
    /// The key must already hold an item.
    KeyExists,
    /// The key must not hold an item.
    KeyNotExists,
    /// The key must hold an item whose `attribute` equals one of `any_of`.
    KeyExistsWith { attribute: String, any_of: Vec<Value> },
}

impl Condition {
    pub fn attribute_in<I, V>(attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::KeyExistsWith {
            attribute: attribute.into(),
            any_of: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Evaluate against the current item (if any).
    #[must_use]
    pub fn evaluate(&self, existing: Option<&Item>) -> bool {
        match (self, existing) {
            (Self::None, _) => true,
            (Self::KeyExists, existing) => existing.is_some(),
            (Self::KeyNotExists, existing) => existing.is_none(),
            (Self::KeyExistsWith { .. }, None) => false,
            (Self::KeyExistsWith { attribute, any_of }, Some(item)) => item
                .get(attribute)
                .is_some_and(|value| any_of.contains(value)),
        }
    }
}
