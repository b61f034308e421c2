//! Metadata records consumed by the graph builder.

use serde::{Deserialize, Serialize};

/// A declared code unit: its name and the names it depends on.
///
/// Records are produced by the [`parser`](crate::parser) module from
/// `Metadata:` comment blocks, or deserialized directly from JSON.
///
/// # Example
///
/// ```rust
/// use metagraph::graph::MetadataRecord;
///
/// let record = MetadataRecord::new("validate_data", ["log_error"]);
/// assert_eq!(record.name, "validate_data");
/// assert_eq!(record.dependencies, vec!["log_error".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Unique name of the unit (e.g., a function name)
    pub name: String,
    /// Declared dependency names, in declaration order
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl MetadataRecord {
    /// Creates a new record.
    pub fn new<I, S>(name: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a record with no dependencies.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
        }
    }

    /// Returns true if the record lists itself as a dependency.
    pub fn is_self_referential(&self) -> bool {
        self.dependencies.iter().any(|d| *d == self.name)
    }
}
