// Operation Domain Model

use std::convert::Infallible;
use std::str::FromStr;

use super::error::{DomainError, Result};

/// Named computation selected by the caller through the `operation` key
///
/// Names are matched exactly (lowercase). Anything else is kept verbatim in
/// `Unsupported` so it can be echoed back in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Analyze,
    Transform,
    Filter,
    Sum,
    Average,
    Max,
    Min,
    Unsupported(String),
}

impl Operation {
    /// Every operation the compute engine understands
    pub const SUPPORTED: [Operation; 7] = [
        Operation::Analyze,
        Operation::Transform,
        Operation::Filter,
        Operation::Sum,
        Operation::Average,
        Operation::Max,
        Operation::Min,
    ];

    pub fn parse(name: &str) -> Self {
        match name {
            "analyze" => Operation::Analyze,
            "transform" => Operation::Transform,
            "filter" => Operation::Filter,
            "sum" => Operation::Sum,
            "average" => Operation::Average,
            "max" => Operation::Max,
            "min" => Operation::Min,
            other => Operation::Unsupported(other.to_string()),
        }
    }

    /// Parse a name that must be one of `SUPPORTED`
    ///
    /// # Errors
    /// - DomainError::ValidationError naming the accepted operations
    pub fn parse_supported(name: &str) -> Result<Self> {
        let operation = Self::parse(name);
        if operation.is_supported() {
            return Ok(operation);
        }
        let names: Vec<&str> = Self::SUPPORTED.iter().map(|op| op.name()).collect();
        Err(DomainError::ValidationError(format!(
            "unsupported operation '{}', expected one of: {}",
            name,
            names.join(", ")
        )))
    }

    pub fn name(&self) -> &str {
        match self {
            Operation::Analyze => "analyze",
            Operation::Transform => "transform",
            Operation::Filter => "filter",
            Operation::Sum => "sum",
            Operation::Average => "average",
            Operation::Max => "max",
            Operation::Min => "min",
            Operation::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Operation::Unsupported(_))
    }

    pub fn description(&self) -> &'static str {
        match self {
            Operation::Analyze => "sum, mean, min, max and count of the data",
            Operation::Transform => "every element doubled",
            Operation::Filter => "elements greater than 10",
            Operation::Sum => "sum of the data",
            Operation::Average => "mean of the data (0 when empty)",
            Operation::Max => "largest element (0 when empty)",
            Operation::Min => "smallest element (0 when empty)",
            Operation::Unsupported(_) => "not supported",
        }
    }
}

impl FromStr for Operation {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Operation::parse(s))
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
