//! Per-document diagnostic state
//!
//! Diagnostics are last-write-wins per document: starting a scan for a newer
//! version cancels any in-flight scan for an older one, and results computed
//! for a stale version are discarded instead of being merged.

use crate::types::{Diagnostic, DiagnosticSet};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct DocumentState {
    latest_version: i32,
    in_flight: Option<CancellationToken>,
    published: Option<DiagnosticSet>,
}

/// Handle for one scan of one document version
#[derive(Debug, Clone)]
pub struct ScanTicket {
    uri: String,
    version: i32,
    cancel: CancellationToken,
}

impl ScanTicket {
    /// Document the scan belongs to
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Document version being scanned
    #[must_use]
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Token cancelled once a newer version supersedes this scan
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Tracks the published diagnostic set of every open document
#[derive(Debug, Default)]
pub struct DocumentDiagnostics {
    documents: Mutex<HashMap<String, DocumentState>>,
}

impl DocumentDiagnostics {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scan of `version`
    ///
    /// Returns `None` if a newer version has already been seen. Otherwise any
    /// in-flight scan of an older version is cancelled.
    pub fn begin(&self, uri: &str, version: i32) -> Option<ScanTicket> {
        let mut documents = self.documents.lock();
        let state = documents.entry(uri.to_string()).or_default();

        let seen = state.in_flight.is_some() || state.published.is_some();
        if seen && version < state.latest_version {
            log::debug!(
                "Ignoring stale scan of {uri} v{version} (latest v{})",
                state.latest_version
            );
            return None;
        }
        if let Some(previous) = state.in_flight.take() {
            previous.cancel();
        }

        let cancel = CancellationToken::new();
        state.latest_version = version;
        state.in_flight = Some(cancel.clone());
        Some(ScanTicket {
            uri: uri.to_string(),
            version,
            cancel,
        })
    }

    /// Publish the result of a scan, replacing the previous set atomically
    ///
    /// Returns `false` (and drops the diagnostics) if the ticket was
    /// superseded or the document was closed.
    pub fn publish(&self, ticket: &ScanTicket, diagnostics: Vec<Diagnostic>) -> bool {
        let mut documents = self.documents.lock();
        let Some(state) = documents.get_mut(&ticket.uri) else {
            return false;
        };
        if ticket.cancel.is_cancelled() || ticket.version != state.latest_version {
            log::debug!("Discarding stale diagnostics for {} v{}", ticket.uri, ticket.version);
            return false;
        }

        state.published = Some(DiagnosticSet::new(ticket.version, diagnostics));
        state.in_flight = None;
        true
    }

    /// The current diagnostic set of `uri`
    #[must_use]
    pub fn get(&self, uri: &str) -> Option<DiagnosticSet> {
        self.documents
            .lock()
            .get(uri)
            .and_then(|state| state.published.clone())
    }

    /// Forget `uri`, cancelling any in-flight scan
    pub fn close(&self, uri: &str) {
        if let Some(state) = self.documents.lock().remove(uri) {
            if let Some(cancel) = state.in_flight {
                cancel.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DiagnosticSeverity, Range};

    fn diagnostic(message: &str) -> Diagnostic {
        Diagnostic {
            range: Range::on_line(0, 0, 1),
            message: message.to_string(),
            severity: DiagnosticSeverity::Warning,
            code: None,
            suggestions: Vec::new(),
        }
    }

    #[test]
    fn test_publish_replaces_previous_set() {
        let docs = DocumentDiagnostics::new();

        let first = docs.begin("a.kql", 1).unwrap();
        assert!(docs.publish(&first, vec![diagnostic("one"), diagnostic("two")]));
        let second = docs.begin("a.kql", 2).unwrap();
        assert!(docs.publish(&second, vec![diagnostic("three")]));

        let set = docs.get("a.kql").unwrap();
        assert_eq!(set.version, 2);
        assert_eq!(set.diagnostics.len(), 1);
        assert_eq!(set.diagnostics[0].message, "three");
    }

    #[test]
    fn test_newer_version_cancels_in_flight_scan() {
        let docs = DocumentDiagnostics::new();

        let old = docs.begin("a.kql", 1).unwrap();
        let new = docs.begin("a.kql", 2).unwrap();
        assert!(old.cancellation().is_cancelled());

        assert!(!docs.publish(&old, vec![diagnostic("stale")]));
        assert!(docs.get("a.kql").is_none());
        assert!(docs.publish(&new, Vec::new()));
        assert_eq!(docs.get("a.kql").unwrap().version, 2);
    }

    #[test]
    fn test_older_version_is_rejected() {
        let docs = DocumentDiagnostics::new();

        let current = docs.begin("a.kql", 5).unwrap();
        assert!(docs.begin("a.kql", 4).is_none());
        assert!(!current.cancellation().is_cancelled());
    }

    #[test]
    fn test_close_drops_state() {
        let docs = DocumentDiagnostics::new();

        let ticket = docs.begin("a.kql", 1).unwrap();
        docs.close("a.kql");

        assert!(ticket.cancellation().is_cancelled());
        assert!(!docs.publish(&ticket, Vec::new()));
        assert!(docs.get("a.kql").is_none());
    }
}
