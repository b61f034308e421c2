//! Shared types for metadata extraction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::graph::MetadataRecord;

/// Source languages whose comment blocks can carry `Metadata:` sections.
///
/// The language decides where an unnamed block looks for its function
/// signature: Python docstrings follow the `def` line, while C-family doc
/// comments precede the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    Python,
    Java,
    C,
    Cpp,
}

impl SourceLanguage {
    /// All supported languages.
    pub const ALL: [SourceLanguage; 4] = [Self::Python, Self::Java, Self::C, Self::Cpp];

    /// Determines the language from a file extension (without the dot).
    ///
    /// # Example
    ///
    /// ```
    /// use metagraph::parser::SourceLanguage;
    ///
    /// assert_eq!(SourceLanguage::from_extension("py"), Some(SourceLanguage::Python));
    /// assert_eq!(SourceLanguage::from_extension("hpp"), Some(SourceLanguage::Cpp));
    /// assert_eq!(SourceLanguage::from_extension("rs"), None);
    /// ```
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "py" => Some(Self::Python),
            "java" => Some(Self::Java),
            "c" | "h" => Some(Self::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Some(Self::Cpp),
            _ => None,
        }
    }

    /// Determines the language from a file path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Returns true if doc comments precede the function they describe.
    pub fn comment_precedes_signature(self) -> bool {
        !matches!(self, Self::Python)
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::Java => write!(f, "java"),
            Self::C => write!(f, "c"),
            Self::Cpp => write!(f, "cpp"),
        }
    }
}

/// Records extracted from a single source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecords {
    /// Path of the analyzed file
    pub path: PathBuf,
    /// Language the file was parsed as
    pub language: SourceLanguage,
    /// Records in the order their comment blocks appear
    pub records: Vec<MetadataRecord>,
}

impl SourceRecords {
    /// Returns true if the file contained no metadata blocks.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
