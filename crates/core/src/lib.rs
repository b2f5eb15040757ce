/**
 * The in-memory document model: the Dataset tree
 *  of groups and entries, plus the Archive wrapper
 *  that funnels every mutation through commands.
 */
pub mod archive;
/**
 * The command/descriptor engine.
 * Maps between a Dataset and its ordered, textual
 *  mutation log via an open opcode dispatch table.
 */
pub mod descriptor;
/**
 * Reversible string encoding (safe-token wrapping)
 *  and the compression codec used to shrink
 *  descriptor payloads before storage.
 */
pub mod encoding;
/**
 * Injectable unique-ID generation strategy, so
 *  tests can supply deterministic identifiers.
 */
pub mod id;
/**
 * Source lifecycle: the lock/unlock state machine,
 *  the credential encryption boundary, dehydrated
 *  snapshots and the per-source serialized queue.
 */
pub mod source;
/**
 * In-process collaborator doubles (encryption
 *  provider, mapper, workspace) for tests.
 */
pub mod testkit;

pub mod prelude {
    pub use crate::archive::{Archive, Dataset, Entry, Group};
    pub use crate::descriptor::{describe, execute, CommandRegistry, ReplayError};
    pub use crate::encoding::{decode_text, encode_text, is_encoded};
    pub use crate::source::{ArchiveSource, SourceError, SourceSnapshot, Status};
}
