//! LMDB database integrity checks.
//!
//! Run on startup (and on demand from the daemon) to detect corruption early,
//! before the service starts handling requests.

use std::path::Path;

use crate::environment::{
    LmdbStore, CLAIMS_DB, COMPLETED_TYPES_DB, OWNER_QUESTIONS_DB, OWNER_REQUESTS_DB, QUESTIONS_DB,
    REQUESTS_DB, USERS_DB,
};
use crate::request::{decode_lease, decode_request};
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    /// `(database name, entry count)` for every table.
    pub databases: Vec<(&'static str, u64)>,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Count every table, decode every request, and check that the secondary
/// indexes only point at existing, consistent records.
///
/// Problems are collected in the report rather than aborting the check.
pub(crate) fn check_integrity(store: &LmdbStore) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = store.env.read_txn()?;

    let tables = [
        (REQUESTS_DB, &store.requests_db),
        (OWNER_REQUESTS_DB, &store.owner_requests_db),
        (COMPLETED_TYPES_DB, &store.completed_types_db),
        (CLAIMS_DB, &store.claims_db),
        (USERS_DB, &store.users_db),
        (QUESTIONS_DB, &store.questions_db),
        (OWNER_QUESTIONS_DB, &store.owner_questions_db),
    ];
    for (name, db) in tables {
        match db.len(&rtxn) {
            Ok(count) => {
                report.databases.push((name, count));
                report.total_entries += count;
            }
            Err(e) => report
                .errors
                .push(format!("failed to read database '{name}': {e}")),
        }
    }

    for entry in store.requests_db.iter(&rtxn)? {
        let (key, val) = entry?;
        if let Err(e) = decode_request(key, val) {
            report.errors.push(e.to_string());
        }
    }

    for entry in store.owner_requests_db.iter(&rtxn)? {
        let (_key, code) = entry?;
        if store.requests_db.get(&rtxn, code)?.is_none() {
            report.errors.push(format!(
                "owner index points at missing request '{}'",
                String::from_utf8_lossy(code)
            ));
        }
    }

    for entry in store.completed_types_db.iter(&rtxn)? {
        let (_key, code) = entry?;
        match store.requests_db.get(&rtxn, code)? {
            Some(bytes) => match decode_request(code, bytes) {
                Ok(record) if record.is_pending() => report.errors.push(format!(
                    "completed index points at pending request {}",
                    record.verification_code
                )),
                Ok(_) => {}
                Err(e) => report.errors.push(e.to_string()),
            },
            None => report.errors.push(format!(
                "completed index points at missing request '{}'",
                String::from_utf8_lossy(code)
            )),
        }
    }

    for entry in store.claims_db.iter(&rtxn)? {
        let (_key, val) = entry?;
        match decode_lease(val) {
            Ok(lease) => {
                if store.requests_db.get(&rtxn, lease.code.as_bytes())?.is_none() {
                    report
                        .errors
                        .push(format!("claim lease held by missing request {}", lease.code));
                }
            }
            Err(e) => report.errors.push(e.to_string()),
        }
    }

    if !report.is_healthy() {
        tracing::error!(errors = report.errors.len(), "LMDB integrity check found problems");
    }
    Ok(report)
}

/// Check that a data directory looks usable before opening it.
///
/// A missing or empty directory is a fresh start. A populated directory
/// without `data.mdb` suggests a wrong path or a damaged environment.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let populated = std::fs::read_dir(path)
        .map_err(|e| format!("cannot read data directory {}: {e}", path.display()))?
        .next()
        .is_some();
    if populated && !path.join("data.mdb").exists() {
        return Err(format!(
            "LMDB directory {} is not empty but data.mdb is missing",
            path.display()
        ));
    }
    Ok(())
}
