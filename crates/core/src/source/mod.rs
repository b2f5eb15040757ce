//! Source lifecycle
//!
//! An [`ArchiveSource`] wraps one vault's identity and credential material.
//! Persisted credential fields are always encrypted secure-strings; the
//! decrypted credentials and the live workspace exist only in memory while
//! the source is `Unlocked`, and are discarded on lock.
//!
//! Every state-changing operation (`unlock`, `lock`,
//! `update_archive_credentials`, `dehydrate`) runs on the source's own
//! [`SerialQueue`]: strictly FIFO, one at a time, so operations never
//! interleave at their internal suspension points. Encryption, workspace
//! mapping and persistence are delegated to the collaborator interfaces in
//! [`collaborators`].

mod collaborators;
mod credentials;
mod events;
mod queue;
mod snapshot;
#[allow(clippy::module_inception)]
mod source;

pub use collaborators::{CredentialsProvider, SourceBinding, SourceMapper, Workspace};
pub use credentials::{CredentialState, Credentials, SecureString};
pub use events::{SourceEvent, SourceSubscriber, SubscriberSet};
pub use queue::{QueueError, SerialQueue};
pub use snapshot::{SourceSnapshot, DEFAULT_COLOUR, DEFAULT_ORDER};
pub use source::{ArchiveSource, SourceDescription, SourceError, Status};
