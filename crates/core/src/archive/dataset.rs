use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel parent id addressing the dataset root
pub const ROOT_PARENT_ID: &str = "0";

/// The fixed set of allowed entry property names
///
/// Properties are the first-class fields of a secret record. Anything else
/// belongs in the entry's free-form meta or attributes maps.
pub const VALID_ENTRY_PROPERTIES: [&str; 3] = ["title", "username", "password"];

/// Check whether a name is an allowed entry property
pub fn is_valid_property(name: &str) -> bool {
    VALID_ENTRY_PROPERTIES.contains(&name)
}

/// The plain replay target mutated by descriptor commands
///
/// Replaying the same descriptor text against `Dataset::default()` always
/// yields the same dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Dataset {
    /// Archive format marker, set once via the `fmt` command
    pub format: Option<String>,
    /// Globally unique archive identifier
    pub archive_id: String,
    /// Free-form archive attributes
    pub attributes: BTreeMap<String, String>,
    /// Ordered root-level groups
    pub groups: Vec<Group>,
}

/// A folder within an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Group {
    pub id: String,
    pub title: String,
    pub attributes: BTreeMap<String, String>,
    pub groups: Vec<Group>,
    pub entries: Vec<Entry>,
}

/// A leaf secret record within a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Entry {
    pub id: String,
    /// Restricted to [`VALID_ENTRY_PROPERTIES`]
    pub properties: BTreeMap<String, String>,
    pub meta: BTreeMap<String, String>,
    pub attributes: BTreeMap<String, String>,
}

impl Dataset {
    /// Find a group anywhere in the tree
    pub fn find_group(&self, id: &str) -> Option<&Group> {
        find_group_in(&self.groups, id)
    }

    pub fn find_group_mut(&mut self, id: &str) -> Option<&mut Group> {
        find_group_in_mut(&mut self.groups, id)
    }

    /// Find an entry anywhere in the tree
    pub fn find_entry(&self, id: &str) -> Option<&Entry> {
        find_entry_in(&self.groups, id)
    }

    pub fn find_entry_mut(&mut self, id: &str) -> Option<&mut Entry> {
        find_entry_in_mut(&mut self.groups, id)
    }

    /// Remove a group (with its subtree) from wherever it lives
    pub fn remove_group(&mut self, id: &str) -> Option<Group> {
        remove_group_in(&mut self.groups, id)
    }

    /// Remove an entry from wherever it lives
    pub fn remove_entry(&mut self, id: &str) -> Option<Entry> {
        remove_entry_in(&mut self.groups, id)
    }

    /// Whether any group or entry already uses the given id
    pub fn has_id(&self, id: &str) -> bool {
        self.find_group(id).is_some() || self.find_entry(id).is_some()
    }
}

impl Group {
    pub fn new(id: impl Into<String>) -> Self {
        Group {
            id: id.into(),
            ..Group::default()
        }
    }

    /// Ordered child groups
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Ordered child entries
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

impl Entry {
    pub fn new(id: impl Into<String>) -> Self {
        Entry {
            id: id.into(),
            ..Entry::default()
        }
    }

    /// Read a first-class property (title/username/password)
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Read a free-form meta value
    pub fn meta_value(&self, name: &str) -> Option<&str> {
        self.meta.get(name).map(String::as_str)
    }

    /// Read a free-form attribute value
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

fn find_group_in<'a>(groups: &'a [Group], id: &str) -> Option<&'a Group> {
    for group in groups {
        if group.id == id {
            return Some(group);
        }
        if let Some(found) = find_group_in(&group.groups, id) {
            return Some(found);
        }
    }
    None
}

fn find_group_in_mut<'a>(groups: &'a mut [Group], id: &str) -> Option<&'a mut Group> {
    for group in groups.iter_mut() {
        if group.id == id {
            return Some(group);
        }
        if let Some(found) = find_group_in_mut(&mut group.groups, id) {
            return Some(found);
        }
    }
    None
}

fn find_entry_in<'a>(groups: &'a [Group], id: &str) -> Option<&'a Entry> {
    for group in groups {
        if let Some(entry) = group.entries.iter().find(|e| e.id == id) {
            return Some(entry);
        }
        if let Some(found) = find_entry_in(&group.groups, id) {
            return Some(found);
        }
    }
    None
}

fn find_entry_in_mut<'a>(groups: &'a mut [Group], id: &str) -> Option<&'a mut Entry> {
    for group in groups.iter_mut() {
        if let Some(index) = group.entries.iter().position(|e| e.id == id) {
            return Some(&mut group.entries[index]);
        }
        if let Some(found) = find_entry_in_mut(&mut group.groups, id) {
            return Some(found);
        }
    }
    None
}

fn remove_group_in(groups: &mut Vec<Group>, id: &str) -> Option<Group> {
    if let Some(index) = groups.iter().position(|g| g.id == id) {
        return Some(groups.remove(index));
    }
    for group in groups.iter_mut() {
        if let Some(removed) = remove_group_in(&mut group.groups, id) {
            return Some(removed);
        }
    }
    None
}

fn remove_entry_in(groups: &mut [Group], id: &str) -> Option<Entry> {
    for group in groups.iter_mut() {
        if let Some(index) = group.entries.iter().position(|e| e.id == id) {
            return Some(group.entries.remove(index));
        }
        if let Some(removed) = remove_entry_in(&mut group.groups, id) {
            return Some(removed);
        }
    }
    None
}
