//! # Export Bundler
//!
//! Regulator-grade export of signed document revisions: selects revisions in
//! a date range, self-heals missing PDFs from stored snapshots, and packages
//! JSON snapshots, PDFs, a CSV summary, and a checksummed manifest into one
//! ZIP archive.
//!
//! Two hard caps protect the process: at most 500 revisions per export
//! (checked up front) and at most 200MB of accumulated file bytes (checked
//! during iteration, so a runaway export fails early instead of after
//! buffering everything).

pub mod manifest;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::archive::ZipWriter;
use crate::defaults::default_layout;
use crate::error::{DocpressError, SkipReason};
use crate::render;
use crate::storage::{BlobStore, DocumentRevision, RevisionStore};
use manifest::{sha256_hex, ExportManifest, SCHEMA_VERSION};

/// Upper bound on revisions per export run.
pub const MAX_EXPORT_REVISIONS: usize = 500;

/// Upper bound on accumulated (uncompressed) file bytes per archive.
pub const MAX_ARCHIVE_BYTES: usize = 200 * 1024 * 1024;

const SANITIZED_NAME_MAX: usize = 60;

/// Date-range and selection filters for an export run. Dates are inclusive
/// ISO `YYYY-MM-DD` strings, as received from the HTTP layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFilters {
    pub issued_from: String,
    pub issued_to: String,
    #[serde(default)]
    pub include_all_revisions: bool,
    /// Restrict to these document types (strings as stored), if set.
    #[serde(default)]
    pub types: Option<Vec<String>>,
    /// Restrict to these outcome values, if set.
    #[serde(default)]
    pub status: Option<Vec<String>>,
}

/// A revision exported without its PDF, and why.
#[derive(Debug)]
pub struct SkippedPdf {
    pub revision_id: String,
    pub reason: SkipReason,
}

/// The finished export: archive bytes plus a download filename derived from
/// the date range.
#[derive(Debug)]
pub struct ExportBundle {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub skipped: Vec<SkippedPdf>,
}

/// Run a full export for one company. See the module docs for the caps; the
/// empty case (no matching revisions) is a valid archive, not an error.
pub fn export_bundle(
    company_id: &str,
    filters: &ExportFilters,
    revisions: &dyn RevisionStore,
    blobs: &dyn BlobStore,
) -> Result<ExportBundle, DocpressError> {
    let (from, to) = validate_date_range(filters)?;

    let selected = select_revisions(revisions.query(company_id)?, filters, from, to);
    if selected.len() > MAX_EXPORT_REVISIONS {
        return Err(DocpressError::LimitExceeded(format!(
            "export matches {} revisions, more than the {} allowed per run; narrow the date range or filters",
            selected.len(),
            MAX_EXPORT_REVISIONS
        )));
    }

    let exported_at = Utc::now();
    let distinct_documents = {
        let mut ids: Vec<&str> = selected.iter().map(|r| r.parent_document_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        ids.len()
    };
    debug!(
        company = company_id,
        revisions = selected.len(),
        documents = distinct_documents,
        "starting export"
    );

    let mut manifest =
        ExportManifest::new(company_id, filters, distinct_documents, selected.len(), exported_at);
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    let mut running_bytes = 0usize;
    let mut skipped = Vec::new();
    let mut csv = String::from(
        "certificateNumber,type,revision,issuedAt,outcome,signingHash,pdfChecksum,jobId,customerName,address,verificationToken\n",
    );

    let mut push_file = |files: &mut Vec<(String, Vec<u8>)>,
                         running: &mut usize,
                         path: String,
                         data: Vec<u8>|
     -> Result<(), DocpressError> {
        *running += data.len();
        files.push((path, data));
        if *running > MAX_ARCHIVE_BYTES {
            return Err(DocpressError::LimitExceeded(format!(
                "export exceeds the {}MB archive size limit; narrow the date range",
                MAX_ARCHIVE_BYTES / (1024 * 1024)
            )));
        }
        Ok(())
    };

    for revision in &selected {
        let stem = format!(
            "{}_rev{}",
            sanitize_filename(&revision.document_number),
            revision.revision_number
        );

        let (pdf_bytes, pdf_checksum) = match resolve_pdf(company_id, revision, blobs, revisions)? {
            Ok((bytes, checksum)) => (Some(bytes), Some(checksum)),
            Err(reason) => {
                warn!(revision = %revision.id, reason = %reason, "exporting revision without PDF");
                skipped.push(SkippedPdf {
                    revision_id: revision.id.clone(),
                    reason,
                });
                (None, revision.pdf_checksum.clone())
            }
        };

        let snapshot_json = serde_json::to_vec_pretty(&json!({
            "schemaVersion": SCHEMA_VERSION,
            "exportedAt": exported_at,
            "companyId": company_id,
            "documentId": revision.parent_document_id,
            "documentNumber": revision.document_number,
            "type": revision.doc_type.as_str(),
            "revision": revision.revision_number,
            "issuedAt": revision.issued_at,
            "issuedBy": revision.issued_by,
            "signingHash": revision.signing_hash,
            "pdfChecksum": pdf_checksum,
            "verificationToken": revision.verification_token,
            "outcome": revision.outcome,
            "outcomeReason": revision.outcome_reason,
            "snapshot": revision.snapshot,
        }))?;
        push_file(&mut files, &mut running_bytes, format!("json/{}.json", stem), snapshot_json)?;

        if let Some(bytes) = pdf_bytes {
            push_file(&mut files, &mut running_bytes, format!("pdf/{}.pdf", stem), bytes)?;
        }

        csv_row(&mut csv, revision, pdf_checksum.as_deref());
    }

    // The CSV counts against the size cap like every other file; it then
    // moves to the front so entries land in the documented archive order.
    push_file(&mut files, &mut running_bytes, "csv/summary.csv".to_string(), csv.into_bytes())?;
    if let Some(csv_entry) = files.pop() {
        files.insert(0, csv_entry);
    }

    for (path, data) in &files {
        manifest.add_file(path, data);
    }
    let manifest_bytes = manifest.finalize()?;

    let mut zip = ZipWriter::new();
    zip.add_file("manifest.json", &manifest_bytes);
    for (path, data) in &files {
        zip.add_file(path, data);
    }

    Ok(ExportBundle {
        filename: format!(
            "exports_{}_to_{}.zip",
            from.format("%Y%m%d"),
            to.format("%Y%m%d")
        ),
        bytes: zip.finish(),
        skipped,
    })
}

/// Parse and order-check the inclusive date range.
fn validate_date_range(filters: &ExportFilters) -> Result<(NaiveDate, NaiveDate), DocpressError> {
    let parse = |label: &str, value: &str| {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
            DocpressError::InvalidInput(format!("Invalid date for '{}': {:?}", label, value))
        })
    };
    let from = parse("issuedFrom", &filters.issued_from)?;
    let to = parse("issuedTo", &filters.issued_to)?;
    if from > to {
        return Err(DocpressError::InvalidInput(format!(
            "'issuedFrom' ({}) must be before or equal to 'issuedTo' ({})",
            from, to
        )));
    }
    Ok((from, to))
}

/// Apply range/type/status filters, then reduce to latest-in-range per
/// parent document unless every revision was requested.
fn select_revisions(
    rows: Vec<DocumentRevision>,
    filters: &ExportFilters,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<DocumentRevision> {
    let mut in_range: Vec<DocumentRevision> = rows
        .into_iter()
        .filter(|r| {
            let date = r.issued_at.date_naive();
            date >= from && date <= to
        })
        .filter(|r| match &filters.types {
            Some(types) => types.iter().any(|t| t == r.doc_type.as_str()),
            None => true,
        })
        .filter(|r| match &filters.status {
            Some(statuses) => match &r.outcome {
                Some(outcome) => statuses.iter().any(|s| s == outcome),
                None => false,
            },
            None => true,
        })
        .collect();

    if !filters.include_all_revisions {
        // Latest revision number observed inside the range, per parent — a
        // later revision outside the range does not displace it.
        in_range.sort_by(|a, b| {
            a.parent_document_id
                .cmp(&b.parent_document_id)
                .then(b.revision_number.cmp(&a.revision_number))
        });
        in_range.dedup_by(|a, b| a.parent_document_id == b.parent_document_id);
    }

    in_range.sort_by(|a, b| {
        a.issued_at
            .cmp(&b.issued_at)
            .then(a.document_number.cmp(&b.document_number))
    });
    in_range
}

/// Resolve a revision's PDF bytes: read from storage, or self-heal by
/// re-rendering the stored snapshot when storage has nothing.
///
/// The outer `Result` carries infrastructure failures — a blob backend that
/// errors on read or write fails the whole export, because an archive
/// silently missing PDFs during an outage is worse than no archive. The
/// inner `Result` carries the per-revision skip (render failure only).
fn resolve_pdf(
    company_id: &str,
    revision: &DocumentRevision,
    blobs: &dyn BlobStore,
    revisions: &dyn RevisionStore,
) -> Result<Result<(Vec<u8>, String), SkipReason>, DocpressError> {
    if let Some(key) = &revision.pdf_key {
        if let Some(bytes) = blobs.read_bytes(key)? {
            let checksum = sha256_hex(&bytes);
            return Ok(Ok((bytes, checksum)));
        }
        warn!(revision = %revision.id, key = %key, "stored PDF missing, regenerating");
    }

    let key = revision
        .pdf_key
        .clone()
        .unwrap_or_else(|| format!("generated/{}/{}.pdf", company_id, revision.id));

    let layout = default_layout(revision.doc_type);
    let bytes = match render::render(&layout, &revision.snapshot, None, None) {
        Ok(bytes) => bytes,
        Err(e) => return Ok(Err(SkipReason::RegenerationFailed(e.to_string()))),
    };
    let checksum = sha256_hex(&bytes);

    blobs.write_bytes(&key, &bytes)?;

    // Best effort: losing the row update only costs a future regeneration.
    if let Err(e) = revisions.record_pdf(&revision.id, &key, &checksum, Utc::now()) {
        warn!(revision = %revision.id, error = %e, "failed to record regenerated PDF");
    }

    Ok(Ok((bytes, checksum)))
}

fn csv_row(csv: &mut String, revision: &DocumentRevision, pdf_checksum: Option<&str>) {
    let fields = [
        revision.document_number.as_str(),
        revision.doc_type.as_str(),
        &revision.revision_number.to_string(),
        &revision.issued_at.to_rfc3339(),
        revision.outcome.as_deref().unwrap_or(""),
        revision.signing_hash.as_str(),
        pdf_checksum.unwrap_or(""),
        revision.job_id.as_deref().unwrap_or(""),
        revision.customer_name.as_deref().unwrap_or(""),
        revision.address.as_deref().unwrap_or(""),
        revision.verification_token.as_str(),
    ];
    let row: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
    csv.push_str(&row.join(","));
    csv.push('\n');
}

/// Quote-wrap when the value contains a comma, quote, or newline; double
/// internal quotes.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Strip everything but alphanumerics, underscore, and hyphen, then truncate.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(SANITIZED_NAME_MAX)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DocumentType;
    use chrono::NaiveDateTime;

    fn filters(from: &str, to: &str) -> ExportFilters {
        ExportFilters {
            issued_from: from.into(),
            issued_to: to.into(),
            include_all_revisions: false,
            types: None,
            status: None,
        }
    }

    fn revision(parent: &str, number: u32, issued: &str) -> DocumentRevision {
        DocumentRevision {
            id: format!("{}-r{}", parent, number),
            parent_document_id: parent.to_string(),
            document_number: format!("CERT-{}", parent),
            doc_type: DocumentType::Certificate,
            revision_number: number,
            signing_hash: "hash".into(),
            snapshot: json!({}),
            pdf_key: None,
            pdf_checksum: None,
            pdf_generated_at: None,
            issued_at: NaiveDateTime::parse_from_str(
                &format!("{} 12:00:00", issued),
                "%Y-%m-%d %H:%M:%S",
            )
            .unwrap()
            .and_utc(),
            issued_by: "a@b.c".into(),
            verification_token: "tok".into(),
            outcome: Some("satisfactory".into()),
            outcome_reason: None,
            job_id: None,
            customer_name: None,
            address: None,
        }
    }

    #[test]
    fn test_invalid_date_rejected() {
        let err = validate_date_range(&filters("not-a-date", "2026-01-01")).unwrap_err();
        assert!(err.to_string().contains("Invalid date"));
    }

    #[test]
    fn test_reversed_range_rejected() {
        let err = validate_date_range(&filters("2026-02-01", "2026-01-01")).unwrap_err();
        assert!(err.to_string().contains("before"));
    }

    #[test]
    fn test_inclusive_range_boundaries() {
        let rows = vec![
            revision("a", 1, "2026-01-01"),
            revision("b", 1, "2026-01-31"),
            revision("c", 1, "2026-02-01"),
        ];
        let f = filters("2026-01-01", "2026-01-31");
        let (from, to) = validate_date_range(&f).unwrap();
        let selected = select_revisions(rows, &f, from, to);
        let ids: Vec<&str> = selected.iter().map(|r| r.parent_document_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_latest_in_range_per_parent() {
        let rows = vec![
            revision("a", 1, "2026-01-05"),
            revision("a", 2, "2026-01-10"),
            // Revision 3 lands after the range end: revision 2 still wins.
            revision("a", 3, "2026-02-10"),
        ];
        let f = filters("2026-01-01", "2026-01-31");
        let (from, to) = validate_date_range(&f).unwrap();
        let selected = select_revisions(rows, &f, from, to);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].revision_number, 2);
    }

    #[test]
    fn test_all_revisions_keeps_every_row() {
        let rows = vec![revision("a", 1, "2026-01-05"), revision("a", 2, "2026-01-10")];
        let mut f = filters("2026-01-01", "2026-01-31");
        f.include_all_revisions = true;
        let (from, to) = validate_date_range(&f).unwrap();
        assert_eq!(select_revisions(rows, &f, from, to).len(), 2);
    }

    #[test]
    fn test_type_and_status_filters() {
        let mut invoice = revision("a", 1, "2026-01-05");
        invoice.doc_type = DocumentType::Invoice;
        let mut failed = revision("b", 1, "2026-01-06");
        failed.outcome = Some("unsatisfactory".into());
        let cert = revision("c", 1, "2026-01-07");

        let mut f = filters("2026-01-01", "2026-01-31");
        f.types = Some(vec!["certificate".into()]);
        f.status = Some(vec!["satisfactory".into()]);
        let (from, to) = validate_date_range(&f).unwrap();
        let selected = select_revisions(vec![invoice, failed, cert], &f, from, to);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].parent_document_id, "c");
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("Smith, J Ltd"), "\"Smith, J Ltd\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("CERT/2026 #12"), "CERT202612");
        assert_eq!(sanitize_filename("ok_name-1"), "ok_name-1");
        let long = "x".repeat(100);
        assert_eq!(sanitize_filename(&long).len(), 60);
    }
}
