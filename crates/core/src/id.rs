//! Unique-ID generation strategy
//!
//! Archives generate ids for new groups and entries. The generator is an
//! injected strategy rather than a process-global so tests can supply
//! deterministic ids.

use std::fmt::Debug;
use std::sync::Arc;

use uuid::Uuid;

/// Strategy for producing unique identifiers
pub trait IdProvider: Send + Sync + Debug {
    fn next_id(&self) -> String;
}

/// Shared handle to an id strategy
pub type SharedIds = Arc<dyn IdProvider>;

/// Default strategy: random UUID v4
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdProvider for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// The default shared id strategy
pub fn default_ids() -> SharedIds {
    Arc::new(UuidIds)
}
