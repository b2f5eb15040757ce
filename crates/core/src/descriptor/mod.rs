//! Command/descriptor engine
//!
//! A descriptor is the persisted form of an archive's content: an ordered,
//! newline-delimited log of mutation commands, one `<opcode> <arg> ...` per
//! line. Free-text arguments travel through the token encoding so the
//! space/newline delimiters stay unambiguous.
//!
//! The engine is bidirectional:
//! - [`describe`] walks a [`Dataset`](crate::archive::Dataset) and emits its
//!   facts as command lines in a stable order
//! - [`execute`] replays descriptor text against an empty dataset,
//!   fail-fast on the first unknown opcode, malformed token or command
//!   precondition violation
//!
//! Dispatch goes through an open [`CommandRegistry`] table so callers can
//! register opcodes beyond the standard catalog.

mod command;
mod describe;
mod execute;

pub use command::{Command, CommandError, CommandHandler, CommandRegistry, CommentCallback};
pub use describe::describe;
pub use execute::{execute, execute_into, execute_line, ReplayError};
