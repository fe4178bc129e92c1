// Numeric data carried in the `data` key of an input envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{DomainError, Result};

/// A JSON number that keeps integer-ness through arithmetic
///
/// Integers stay integers (`[1, 2]` sums to `3`, not `3.0`). Any float
/// operand, or an integer overflow, promotes the result to a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Add two numbers, falling back to float on integer overflow
    pub fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map(Number::Int)
                .unwrap_or(Number::Float(a as f64 + b as f64)),
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn doubled(self) -> Number {
        match self {
            Number::Int(i) => i
                .checked_mul(2)
                .map(Number::Int)
                .unwrap_or(Number::Float(i as f64 * 2.0)),
            Number::Float(f) => Number::Float(f * 2.0),
        }
    }

    /// Parse a single JSON value as a number
    pub fn from_value(value: &Value) -> Option<Number> {
        if let Some(i) = value.as_i64() {
            return Some(Number::Int(i));
        }
        value.as_f64().map(Number::Float)
    }

    pub fn to_value(self) -> Value {
        match self {
            Number::Int(i) => Value::from(i),
            Number::Float(f) => Value::from(f),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

/// Ordered sequence of numbers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Numbers(Vec<Number>);

impl Numbers {
    pub fn new(values: Vec<Number>) -> Self {
        Self(values)
    }

    /// Parse a JSON array of numbers
    ///
    /// # Errors
    /// - DomainError::InvalidData if the value is not an array or holds a non-number
    pub fn from_value(value: &Value) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| {
            DomainError::InvalidData(format!("expected an array of numbers, got {}", value))
        })?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                Number::from_value(item).ok_or_else(|| {
                    DomainError::InvalidData(format!(
                        "element {} is not a number: {}",
                        index, item
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Number> {
        self.0.iter()
    }

    /// Sum of all elements (`0` when empty)
    pub fn sum(&self) -> Number {
        self.0
            .iter()
            .fold(Number::Int(0), |acc, n| acc.add(*n))
    }

    /// Arithmetic mean, None when empty
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.sum().as_f64() / self.len() as f64)
    }

    /// Largest element; the first one wins on ties
    pub fn max(&self) -> Option<Number> {
        self.0.iter().copied().reduce(|best, n| {
            if n.as_f64() > best.as_f64() {
                n
            } else {
                best
            }
        })
    }

    /// Smallest element; the first one wins on ties
    pub fn min(&self) -> Option<Number> {
        self.0.iter().copied().reduce(|best, n| {
            if n.as_f64() < best.as_f64() {
                n
            } else {
                best
            }
        })
    }

    pub fn doubled(&self) -> Numbers {
        Numbers(self.0.iter().map(|n| n.doubled()).collect())
    }

    /// Elements strictly greater than `threshold`, order preserved
    pub fn above(&self, threshold: f64) -> Numbers {
        Numbers(
            self.0
                .iter()
                .copied()
                .filter(|n| n.as_f64() > threshold)
                .collect(),
        )
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().map(|n| n.to_value()).collect())
    }
}

impl From<Vec<Number>> for Numbers {
    fn from(values: Vec<Number>) -> Self {
        Self(values)
    }
}

impl FromIterator<Number> for Numbers {
    fn from_iter<I: IntoIterator<Item = Number>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
