//! Core domain types for the sync run.

use serde::{Deserialize, Serialize};

/// The documentation files every run synchronizes, in upload order.
///
/// These are expected in the working directory (or `--dir`). The set is
/// deliberately fixed: the remote assistant's knowledge base is defined
/// by exactly these three documents.
pub const REQUIRED_FILES: [&str; 3] = [
    "yeahdesk-docs_support.md",
    "yeahdesk-docs_product.md",
    "yeahdesk-docs_marketing.md",
];

// ---------------------------------------------------------------------------
// VectorStoreId
// ---------------------------------------------------------------------------

/// Identifier of a remote vector store.
///
/// Resolved once per run: either supplied externally (env or `--store`)
/// or created fresh during store provisioning. A freshly created id is
/// only logged and reported — never written back to the environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorStoreId(pub String);

impl VectorStoreId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VectorStoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VectorStoreId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VectorStoreId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Remote file records
// ---------------------------------------------------------------------------

/// A file currently present in the vector store, resolved to its filename
/// via a per-id metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Remote file identifier (`file_...`).
    pub id: String,
    /// Original filename recorded at upload time.
    pub filename: String,
}

/// A freshly uploaded file, identified only by the id the API returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Remote file identifier (`file_...`).
    pub id: String,
}
