//! Document model
//!
//! An archive's contents are a tree: the [`Dataset`] root carries archive
//! attributes and an ordered list of [`Group`]s; groups carry ordered child
//! groups and [`Entry`]s. The dataset is the replay target of the
//! descriptor engine and is only ever mutated through commands.
//!
//! [`Archive`] wraps a dataset together with the ordered history of command
//! lines that built it, keeping the live model and the persisted log in
//! lockstep.

#[allow(clippy::module_inception)]
mod archive;
mod dataset;

pub use archive::{Archive, DEFAULT_FORMAT};
pub use dataset::{
    is_valid_property, Dataset, Entry, Group, ROOT_PARENT_ID, VALID_ENTRY_PROPERTIES,
};
