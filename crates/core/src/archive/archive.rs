use crate::descriptor::{describe, execute_line, CommandRegistry, ReplayError};
use crate::encoding::encode_text;
use crate::id::SharedIds;

use super::dataset::{Dataset, ROOT_PARENT_ID};

/// Format marker written as the first line of every new archive
pub const DEFAULT_FORMAT: &str = "strongroom/a";

/// A live archive: dataset plus the command history that built it
///
/// There is no direct mutation API. Every change goes through
/// [`Archive::execute`], which applies the command to the dataset and, on
/// success, appends the line to the history — so the history replayed
/// against an empty dataset always reproduces the current state.
pub struct Archive {
    dataset: Dataset,
    history: Vec<String>,
    registry: CommandRegistry,
    ids: SharedIds,
}

impl Archive {
    /// Create a fresh archive with a generated archive id
    pub fn new(ids: SharedIds) -> Self {
        let mut archive = Archive {
            dataset: Dataset::default(),
            history: Vec::new(),
            registry: CommandRegistry::standard(),
            ids,
        };
        let archive_id = archive.ids.next_id();
        // an empty dataset accepts these unconditionally
        archive
            .execute(&format!("fmt {}", encode_text(DEFAULT_FORMAT)))
            .expect("fresh dataset accepts format");
        archive
            .execute(&format!("aid {archive_id}"))
            .expect("fresh dataset accepts archive id");
        archive
    }

    /// Rebuild an archive by replaying an existing descriptor
    pub fn from_descriptor(descriptor: &str, ids: SharedIds) -> Result<Self, ReplayError> {
        let mut archive = Archive {
            dataset: Dataset::default(),
            history: Vec::new(),
            registry: CommandRegistry::standard(),
            ids,
        };
        for line in descriptor.lines().filter(|l| !l.trim().is_empty()) {
            archive.execute(line)?;
        }
        Ok(archive)
    }

    /// Apply a command line; appended to the history on success
    pub fn execute(&mut self, line: &str) -> Result<(), ReplayError> {
        execute_line(&self.registry, &mut self.dataset, line)?;
        self.history.push(line.to_string());
        Ok(())
    }

    /// The current dataset
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The ordered command lines executed so far
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Serialize the current dataset (not the raw history)
    pub fn describe(&self) -> String {
        describe(&self.dataset)
    }

    /// Register custom opcodes or the comment callback
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn archive_id(&self) -> &str {
        &self.dataset.archive_id
    }

    /// Create a group; `parent` of `None` targets the root
    pub fn create_group(
        &mut self,
        parent: Option<&str>,
        title: &str,
    ) -> Result<String, ReplayError> {
        let id = self.ids.next_id();
        let parent = parent.unwrap_or(ROOT_PARENT_ID);
        self.execute(&format!("cgr {parent} {id}"))?;
        if !title.is_empty() {
            self.execute(&format!("tgr {id} {}", encode_text(title)))?;
        }
        Ok(id)
    }

    /// Create an entry under a group, titled on creation
    pub fn create_entry(&mut self, group_id: &str, title: &str) -> Result<String, ReplayError> {
        let id = self.ids.next_id();
        self.execute(&format!("cen {group_id} {id}"))?;
        self.set_entry_property(&id, "title", title)?;
        Ok(id)
    }

    pub fn set_group_title(&mut self, group_id: &str, title: &str) -> Result<(), ReplayError> {
        self.execute(&format!("tgr {group_id} {}", encode_text(title)))
    }

    pub fn set_group_attribute(
        &mut self,
        group_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ReplayError> {
        self.execute(&format!(
            "sga {group_id} {} {}",
            encode_text(key),
            encode_text(value)
        ))
    }

    pub fn set_entry_property(
        &mut self,
        entry_id: &str,
        name: &str,
        value: &str,
    ) -> Result<(), ReplayError> {
        self.execute(&format!(
            "sep {entry_id} {} {}",
            encode_text(name),
            encode_text(value)
        ))
    }

    pub fn set_entry_meta(
        &mut self,
        entry_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ReplayError> {
        self.execute(&format!(
            "sem {entry_id} {} {}",
            encode_text(key),
            encode_text(value)
        ))
    }

    pub fn set_entry_attribute(
        &mut self,
        entry_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ReplayError> {
        self.execute(&format!(
            "sea {entry_id} {} {}",
            encode_text(key),
            encode_text(value)
        ))
    }

    pub fn set_archive_attribute(&mut self, key: &str, value: &str) -> Result<(), ReplayError> {
        self.execute(&format!("saa {} {}", encode_text(key), encode_text(value)))
    }

    pub fn remove_group(&mut self, group_id: &str) -> Result<(), ReplayError> {
        self.execute(&format!("dgr {group_id}"))
    }

    pub fn remove_entry(&mut self, entry_id: &str) -> Result<(), ReplayError> {
        self.execute(&format!("den {entry_id}"))
    }

    /// Move a group under a new parent; `None` targets the root
    pub fn move_group(&mut self, group_id: &str, parent: Option<&str>) -> Result<(), ReplayError> {
        let parent = parent.unwrap_or(ROOT_PARENT_ID);
        self.execute(&format!("mgr {group_id} {parent}"))
    }

    pub fn move_entry(&mut self, entry_id: &str, group_id: &str) -> Result<(), ReplayError> {
        self.execute(&format!("men {entry_id} {group_id}"))
    }
}
