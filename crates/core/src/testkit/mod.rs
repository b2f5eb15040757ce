//! In-process collaborator doubles for tests
//!
//! Real deployments inject an encryption provider and a source mapper; the
//! doubles here stand in for them so lifecycle behaviour can be exercised
//! without any cryptography or remote datasource. The secure-string codec in
//! [`PlainCredentialsProvider`] is reversible and password-checked but
//! deliberately NOT encryption — never use it outside tests.
//!
//! All doubles write to a shared [`OpLog`] so tests can assert on the exact
//! interleaving of operations across suspension points.

mod provider;
mod workspace;

pub use provider::PlainCredentialsProvider;
pub use workspace::{StubMapper, StubWorkspace};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::id::IdProvider;

/// Shared, ordered record of collaborator activity
#[derive(Clone, Default)]
pub struct OpLog(Arc<Mutex<Vec<String>>>);

impl OpLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Deterministic id strategy: "1", "2", ...
#[derive(Debug, Default)]
pub struct SequentialIds(AtomicU64);

impl IdProvider for SequentialIds {
    fn next_id(&self) -> String {
        (self.0.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }
}
