//! # Storage Seams
//!
//! The exporter talks to persistence through two small traits: a blob store
//! for PDF bytes and a revision store for issued-document rows. Production
//! wires these to object storage and the application database; the in-memory
//! implementations here back the CLI and the test suite.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::defaults::DocumentType;
use crate::error::DocpressError;

/// One issued revision of a document, denormalized with the job and customer
/// fields the export summary needs. Revisions are immutable once issued;
/// `pdf_key` and `pdf_checksum` are the only fields written after the fact,
/// when a missing PDF is regenerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRevision {
    pub id: String,
    pub parent_document_id: String,
    pub document_number: String,
    pub doc_type: DocumentType,
    pub revision_number: u32,
    /// SHA-256 over the canonical snapshot, fixed at signing time.
    pub signing_hash: String,
    /// The full data context the document was rendered from.
    pub snapshot: Value,
    /// Blob store key of the rendered PDF, if one exists.
    pub pdf_key: Option<String>,
    pub pdf_checksum: Option<String>,
    pub pdf_generated_at: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
    pub issued_by: String,
    pub verification_token: String,
    pub outcome: Option<String>,
    pub outcome_reason: Option<String>,
    pub job_id: Option<String>,
    pub customer_name: Option<String>,
    pub address: Option<String>,
}

/// Binary blob persistence (PDF files). `read_bytes` distinguishes a key
/// with no bytes (`Ok(None)`, the self-healing trigger) from a backend
/// failure (`Err`).
pub trait BlobStore {
    fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, DocpressError>;
    fn write_bytes(&self, key: &str, data: &[u8]) -> Result<(), DocpressError>;
}

/// Issued-revision rows, scoped per company.
pub trait RevisionStore {
    /// All issued revisions for a company, any revision number, any type.
    fn query(&self, company_id: &str) -> Result<Vec<DocumentRevision>, DocpressError>;

    /// Record a regenerated PDF against a revision. Failures here must not
    /// fail the caller's export; they only lose the write-back.
    fn record_pdf(
        &self,
        revision_id: &str,
        pdf_key: &str,
        checksum: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<(), DocpressError>;
}

/// In-memory blob store.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, data: Vec<u8>) {
        self.blobs.lock().unwrap().insert(key.to_string(), data);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }
}

impl BlobStore for MemoryBlobStore {
    fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, DocpressError> {
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }

    fn write_bytes(&self, key: &str, data: &[u8]) -> Result<(), DocpressError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }
}

/// In-memory revision store keyed by company.
#[derive(Default)]
pub struct MemoryRevisionStore {
    rows: Mutex<HashMap<String, Vec<DocumentRevision>>>,
}

impl MemoryRevisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, company_id: &str, revision: DocumentRevision) {
        self.rows
            .lock()
            .unwrap()
            .entry(company_id.to_string())
            .or_default()
            .push(revision);
    }
}

impl RevisionStore for MemoryRevisionStore {
    fn query(&self, company_id: &str) -> Result<Vec<DocumentRevision>, DocpressError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(company_id)
            .cloned()
            .unwrap_or_default())
    }

    fn record_pdf(
        &self,
        revision_id: &str,
        pdf_key: &str,
        checksum: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<(), DocpressError> {
        let mut rows = self.rows.lock().unwrap();
        for revisions in rows.values_mut() {
            if let Some(rev) = revisions.iter_mut().find(|r| r.id == revision_id) {
                rev.pdf_key = Some(pdf_key.to_string());
                rev.pdf_checksum = Some(checksum.to_string());
                rev.pdf_generated_at = Some(generated_at);
                return Ok(());
            }
        }
        Err(DocpressError::Storage(format!(
            "revision not found: {}",
            revision_id
        )))
    }
}
