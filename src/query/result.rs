//! Result kinds
//!
//! Result frames carry an optional custom metadata object; its `resultType`
//! entry tells callers which kind of series the frame holds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata key holding the result kind tag
pub const RESULT_TYPE_KEY: &str = "resultType";

/// Kind of series a result frame holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryResultKind {
    Matrix,
    Exemplar,
    Vector,
    Unknown,
}

impl QueryResultKind {
    /// Map a tag string to a kind; unrecognised tags are `Unknown`
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "matrix" => Self::Matrix,
            "exemplar" => Self::Exemplar,
            "vector" => Self::Vector,
            _ => Self::Unknown,
        }
    }

    /// Classify a frame from its custom metadata.
    ///
    /// Absent metadata, a non-object, a missing key or a non-string value
    /// all classify as `Unknown`.
    pub fn from_metadata(custom: Option<&serde_json::Value>) -> Self {
        custom
            .and_then(|meta| meta.as_object())
            .and_then(|meta| meta.get(RESULT_TYPE_KEY))
            .and_then(|tag| tag.as_str())
            .map(Self::from_tag)
            .unwrap_or(Self::Unknown)
    }

    /// Tag string, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matrix => "matrix",
            Self::Exemplar => "exemplar",
            Self::Vector => "vector",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for QueryResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Frame metadata as attached by the fetch layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMeta {
    #[serde(default)]
    pub custom: Option<serde_json::Value>,
}

impl FrameMeta {
    pub fn result_kind(&self) -> QueryResultKind {
        QueryResultKind::from_metadata(self.custom.as_ref())
    }
}
