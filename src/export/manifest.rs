//! # Export Manifest
//!
//! The archive's index file: schema version, filter echo, counts, and a
//! SHA-256 entry for every emitted file. The manifest lists itself via a
//! two-pass construction — serialize without the self entry, hash that,
//! append `{path: "manifest.json", sha256}`, then serialize again. The
//! written file's embedded self-hash therefore describes the pre-append
//! serialization, not the bytes on disk. Downstream consumers depend on this
//! shape; changing it is a schema-version bump.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::DocpressError;
use crate::export::ExportFilters;

/// Bump major on field removal/rename, minor on additive fields. Consumers
/// check this before parsing.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// One `files[]` entry: archive-relative path and content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counts {
    pub documents: usize,
    pub revisions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportManifest {
    pub schema_version: String,
    pub exported_at: DateTime<Utc>,
    pub company_id: String,
    pub filters: ExportFilters,
    pub counts: Counts,
    pub files: Vec<FileEntry>,
}

impl ExportManifest {
    pub fn new(
        company_id: &str,
        filters: &ExportFilters,
        distinct_documents: usize,
        revisions: usize,
        exported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            exported_at,
            company_id: company_id.to_string(),
            filters: filters.clone(),
            counts: Counts {
                documents: distinct_documents,
                revisions,
            },
            files: Vec::new(),
        }
    }

    pub fn add_file(&mut self, path: &str, data: &[u8]) {
        self.files.push(FileEntry {
            path: path.to_string(),
            sha256: sha256_hex(data),
        });
    }

    /// Two-pass finalization: hash the manifest without its own entry,
    /// append the self entry carrying that hash, then serialize the
    /// completed manifest. The returned bytes are what goes into the
    /// archive as `manifest.json`.
    pub fn finalize(mut self) -> Result<Vec<u8>, DocpressError> {
        let without_self = serde_json::to_vec_pretty(&self)?;
        let self_hash = sha256_hex(&without_self);
        self.files.push(FileEntry {
            path: "manifest.json".to_string(),
            sha256: self_hash,
        });
        Ok(serde_json::to_vec_pretty(&self)?)
    }
}

/// Lowercase hex SHA-256.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
