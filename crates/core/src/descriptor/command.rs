use std::collections::HashMap;
use std::sync::Arc;

use crate::archive::{is_valid_property, Dataset, Entry, Group, ROOT_PARENT_ID};

/// Handler applied to a dataset with decoded arguments
pub type CommandHandler =
    Arc<dyn Fn(&mut Dataset, &[String]) -> Result<(), CommandError> + Send + Sync>;

/// Callback invoked by the `cmm` comment command
pub type CommentCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Validation failures raised by command handlers
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("wrong argument count for '{opcode}': expected {expected}, got {got}")]
    Arity {
        opcode: String,
        expected: usize,
        got: usize,
    },
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("entry not found: {0}")]
    EntryNotFound(String),
    #[error("parent group not found: {0}")]
    ParentNotFound(String),
    #[error("id already in use: {0}")]
    DuplicateId(String),
    #[error("invalid property name for entry: {0}")]
    InvalidProperty(String),
    #[error("format already set")]
    FormatAlreadySet,
    #[error("no such key '{key}' on '{owner}'")]
    KeyNotFound { owner: String, key: String },
    #[error("cannot move group '{group}' under '{target}'")]
    InvalidMove { group: String, target: String },
}

/// A registered command: fixed arity plus its handler
#[derive(Clone)]
pub struct Command {
    opcode: String,
    arity: usize,
    handler: CommandHandler,
}

impl Command {
    /// Validate arity, then run the handler against the dataset
    pub fn apply(&self, dataset: &mut Dataset, args: &[String]) -> Result<(), CommandError> {
        if args.len() != self.arity {
            return Err(CommandError::Arity {
                opcode: self.opcode.clone(),
                expected: self.arity,
                got: args.len(),
            });
        }
        (self.handler)(dataset, args)
    }
}

/// Open opcode dispatch table
///
/// The standard catalog is installed by [`CommandRegistry::standard`];
/// callers may register additional opcodes at any time. Dispatch is a flat
/// lookup, not a closed enumeration.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    /// An empty registry with no opcodes installed
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard catalog
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.install_standard();
        registry
    }

    /// Register (or replace) an opcode
    pub fn register<F>(&mut self, opcode: impl Into<String>, arity: usize, handler: F)
    where
        F: Fn(&mut Dataset, &[String]) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        let opcode = opcode.into();
        self.commands.insert(
            opcode.clone(),
            Command {
                opcode,
                arity,
                handler: Arc::new(handler),
            },
        );
    }

    /// Register an alias for an existing opcode
    pub fn alias(&mut self, alias: impl Into<String>, opcode: &str) -> bool {
        match self.commands.get(opcode).cloned() {
            Some(command) => {
                self.commands.insert(alias.into(), command);
                true
            }
            None => false,
        }
    }

    /// Install a callback for `cmm` comment lines
    ///
    /// Without a callback, comments replay as no-ops.
    pub fn set_comment_callback<F>(&mut self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let callback: CommentCallback = Arc::new(callback);
        self.register("cmm", 1, move |_, args| {
            callback(&args[0]);
            Ok(())
        });
    }

    /// Look up an opcode
    pub fn get(&self, opcode: &str) -> Option<&Command> {
        self.commands.get(opcode)
    }

    /// Whether an opcode is registered
    pub fn contains(&self, opcode: &str) -> bool {
        self.commands.contains_key(opcode)
    }

    fn install_standard(&mut self) {
        self.register("fmt", 1, |dataset, args| {
            if dataset.format.is_some() {
                return Err(CommandError::FormatAlreadySet);
            }
            dataset.format = Some(args[0].clone());
            Ok(())
        });
        self.register("aid", 1, |dataset, args| {
            dataset.archive_id = args[0].clone();
            Ok(())
        });
        self.register("cgr", 2, |dataset, args| {
            let (parent, id) = (&args[0], &args[1]);
            if dataset.has_id(id) {
                return Err(CommandError::DuplicateId(id.clone()));
            }
            if parent == ROOT_PARENT_ID {
                dataset.groups.push(Group::new(id));
                return Ok(());
            }
            let parent_group = dataset
                .find_group_mut(parent)
                .ok_or_else(|| CommandError::ParentNotFound(parent.clone()))?;
            parent_group.groups.push(Group::new(id));
            Ok(())
        });
        self.register("tgr", 2, |dataset, args| {
            let group = require_group(dataset, &args[0])?;
            group.title = args[1].clone();
            Ok(())
        });
        self.register("cen", 2, |dataset, args| {
            let (group_id, id) = (&args[0], &args[1]);
            if dataset.has_id(id) {
                return Err(CommandError::DuplicateId(id.clone()));
            }
            let group = require_group(dataset, group_id)?;
            group.entries.push(Entry::new(id));
            Ok(())
        });
        self.register("sep", 3, |dataset, args| {
            if !is_valid_property(&args[1]) {
                return Err(CommandError::InvalidProperty(args[1].clone()));
            }
            let entry = require_entry(dataset, &args[0])?;
            entry.properties.insert(args[1].clone(), args[2].clone());
            Ok(())
        });
        self.register("sem", 3, |dataset, args| {
            let entry = require_entry(dataset, &args[0])?;
            entry.meta.insert(args[1].clone(), args[2].clone());
            Ok(())
        });
        self.register("sea", 3, |dataset, args| {
            let entry = require_entry(dataset, &args[0])?;
            entry.attributes.insert(args[1].clone(), args[2].clone());
            Ok(())
        });
        self.register("sga", 3, |dataset, args| {
            let group = require_group(dataset, &args[0])?;
            group.attributes.insert(args[1].clone(), args[2].clone());
            Ok(())
        });
        self.register("saa", 2, |dataset, args| {
            dataset.attributes.insert(args[0].clone(), args[1].clone());
            Ok(())
        });
        self.register("dgr", 1, |dataset, args| {
            dataset
                .remove_group(&args[0])
                .map(|_| ())
                .ok_or_else(|| CommandError::GroupNotFound(args[0].clone()))
        });
        self.register("den", 1, |dataset, args| {
            dataset
                .remove_entry(&args[0])
                .map(|_| ())
                .ok_or_else(|| CommandError::EntryNotFound(args[0].clone()))
        });
        self.register("dem", 2, |dataset, args| {
            let entry = require_entry(dataset, &args[0])?;
            remove_key(&mut entry.meta, &args[0], &args[1])
        });
        self.register("dea", 2, |dataset, args| {
            let entry = require_entry(dataset, &args[0])?;
            remove_key(&mut entry.attributes, &args[0], &args[1])
        });
        self.register("dga", 2, |dataset, args| {
            let group = require_group(dataset, &args[0])?;
            remove_key(&mut group.attributes, &args[0], &args[1])
        });
        self.register("daa", 1, |dataset, args| {
            let owner = dataset.archive_id.clone();
            remove_key(&mut dataset.attributes, &owner, &args[0])
        });
        self.register("mgr", 2, |dataset, args| {
            move_group(dataset, &args[0], &args[1])
        });
        self.register("men", 2, |dataset, args| {
            move_entry(dataset, &args[0], &args[1])
        });
        // comment: no-op until a callback is installed
        self.register("cmm", 1, |_, _| Ok(()));
        // history padding marker
        self.register("pad", 1, |_, _| Ok(()));
        self.alias("format", "fmt");
    }
}

fn require_group<'a>(dataset: &'a mut Dataset, id: &str) -> Result<&'a mut Group, CommandError> {
    dataset
        .find_group_mut(id)
        .ok_or_else(|| CommandError::GroupNotFound(id.to_string()))
}

fn require_entry<'a>(dataset: &'a mut Dataset, id: &str) -> Result<&'a mut Entry, CommandError> {
    dataset
        .find_entry_mut(id)
        .ok_or_else(|| CommandError::EntryNotFound(id.to_string()))
}

fn remove_key(
    map: &mut std::collections::BTreeMap<String, String>,
    owner: &str,
    key: &str,
) -> Result<(), CommandError> {
    map.remove(key).map(|_| ()).ok_or_else(|| CommandError::KeyNotFound {
        owner: owner.to_string(),
        key: key.to_string(),
    })
}

fn move_group(dataset: &mut Dataset, group_id: &str, target_id: &str) -> Result<(), CommandError> {
    // a group cannot be moved into itself or its own subtree
    {
        let group = dataset
            .find_group(group_id)
            .ok_or_else(|| CommandError::GroupNotFound(group_id.to_string()))?;
        let target_inside = group.id == target_id
            || group_contains(group, target_id);
        if target_inside {
            return Err(CommandError::InvalidMove {
                group: group_id.to_string(),
                target: target_id.to_string(),
            });
        }
    }
    if target_id != ROOT_PARENT_ID && dataset.find_group(target_id).is_none() {
        return Err(CommandError::ParentNotFound(target_id.to_string()));
    }
    let moved = dataset
        .remove_group(group_id)
        .ok_or_else(|| CommandError::GroupNotFound(group_id.to_string()))?;
    if target_id == ROOT_PARENT_ID {
        dataset.groups.push(moved);
        return Ok(());
    }
    match dataset.find_group_mut(target_id) {
        Some(target) => {
            target.groups.push(moved);
            Ok(())
        }
        None => Err(CommandError::ParentNotFound(target_id.to_string())),
    }
}

fn move_entry(dataset: &mut Dataset, entry_id: &str, group_id: &str) -> Result<(), CommandError> {
    if dataset.find_group(group_id).is_none() {
        return Err(CommandError::GroupNotFound(group_id.to_string()));
    }
    let entry = dataset
        .remove_entry(entry_id)
        .ok_or_else(|| CommandError::EntryNotFound(entry_id.to_string()))?;
    match dataset.find_group_mut(group_id) {
        Some(group) => {
            group.entries.push(entry);
            Ok(())
        }
        None => Err(CommandError::GroupNotFound(group_id.to_string())),
    }
}

fn group_contains(group: &Group, id: &str) -> bool {
    group
        .groups
        .iter()
        .any(|child| child.id == id || group_contains(child, id))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn apply(
        registry: &CommandRegistry,
        dataset: &mut Dataset,
        opcode: &str,
        args: &[&str],
    ) -> Result<(), CommandError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        registry.get(opcode).unwrap().apply(dataset, &args)
    }

    #[test]
    fn test_format_set_once() {
        let registry = CommandRegistry::standard();
        let mut dataset = Dataset::default();
        apply(&registry, &mut dataset, "fmt", &["strongroom/a"]).unwrap();
        assert_eq!(dataset.format.as_deref(), Some("strongroom/a"));
        let result = apply(&registry, &mut dataset, "fmt", &["strongroom/b"]);
        assert!(matches!(result, Err(CommandError::FormatAlreadySet)));
    }

    #[test]
    fn test_create_group_requires_parent() {
        let registry = CommandRegistry::standard();
        let mut dataset = Dataset::default();
        let result = apply(&registry, &mut dataset, "cgr", &["missing", "G1"]);
        assert!(matches!(result, Err(CommandError::ParentNotFound(_))));
        apply(&registry, &mut dataset, "cgr", &["0", "G1"]).unwrap();
        apply(&registry, &mut dataset, "cgr", &["G1", "G2"]).unwrap();
        assert!(dataset.find_group("G2").is_some());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let registry = CommandRegistry::standard();
        let mut dataset = Dataset::default();
        apply(&registry, &mut dataset, "cgr", &["0", "G1"]).unwrap();
        let result = apply(&registry, &mut dataset, "cgr", &["0", "G1"]);
        assert!(matches!(result, Err(CommandError::DuplicateId(_))));
    }

    #[test]
    fn test_entry_property_validation() {
        let registry = CommandRegistry::standard();
        let mut dataset = Dataset::default();
        apply(&registry, &mut dataset, "cgr", &["0", "G1"]).unwrap();
        apply(&registry, &mut dataset, "cen", &["G1", "E1"]).unwrap();
        apply(&registry, &mut dataset, "sep", &["E1", "title", "Site"]).unwrap();
        let result = apply(&registry, &mut dataset, "sep", &["E1", "url", "x"]);
        assert!(matches!(result, Err(CommandError::InvalidProperty(_))));
    }

    #[test]
    fn test_arity_checked_before_handler() {
        let registry = CommandRegistry::standard();
        let mut dataset = Dataset::default();
        let result = apply(&registry, &mut dataset, "aid", &[]);
        assert!(matches!(result, Err(CommandError::Arity { .. })));
    }

    #[test]
    fn test_move_group_rejects_own_subtree() {
        let registry = CommandRegistry::standard();
        let mut dataset = Dataset::default();
        apply(&registry, &mut dataset, "cgr", &["0", "G1"]).unwrap();
        apply(&registry, &mut dataset, "cgr", &["G1", "G2"]).unwrap();
        let result = apply(&registry, &mut dataset, "mgr", &["G1", "G2"]);
        assert!(matches!(result, Err(CommandError::InvalidMove { .. })));
        let result = apply(&registry, &mut dataset, "mgr", &["G1", "G1"]);
        assert!(matches!(result, Err(CommandError::InvalidMove { .. })));
    }

    #[test]
    fn test_move_group_to_root() {
        let registry = CommandRegistry::standard();
        let mut dataset = Dataset::default();
        apply(&registry, &mut dataset, "cgr", &["0", "G1"]).unwrap();
        apply(&registry, &mut dataset, "cgr", &["G1", "G2"]).unwrap();
        apply(&registry, &mut dataset, "mgr", &["G2", "0"]).unwrap();
        assert_eq!(dataset.groups.len(), 2);
        assert!(dataset.find_group("G1").unwrap().groups.is_empty());
    }

    #[test]
    fn test_move_entry_between_groups() {
        let registry = CommandRegistry::standard();
        let mut dataset = Dataset::default();
        apply(&registry, &mut dataset, "cgr", &["0", "G1"]).unwrap();
        apply(&registry, &mut dataset, "cgr", &["0", "G2"]).unwrap();
        apply(&registry, &mut dataset, "cen", &["G1", "E1"]).unwrap();
        apply(&registry, &mut dataset, "men", &["E1", "G2"]).unwrap();
        assert!(dataset.find_group("G1").unwrap().entries.is_empty());
        assert_eq!(dataset.find_group("G2").unwrap().entries.len(), 1);
    }

    #[test]
    fn test_comment_callback() {
        let mut registry = CommandRegistry::standard();
        let mut dataset = Dataset::default();
        // no callback installed: replay is a no-op
        apply(&registry, &mut dataset, "cmm", &["just a note"]).unwrap();

        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry.set_comment_callback(move |comment| sink.lock().push(comment.to_string()));
        apply(&registry, &mut dataset, "cmm", &["first"]).unwrap();
        apply(&registry, &mut dataset, "cmm", &["second note"]).unwrap();
        assert_eq!(*seen.lock(), vec!["first", "second note"]);
        assert_eq!(dataset, Dataset::default());
    }

    #[test]
    fn test_format_alias() {
        let registry = CommandRegistry::standard();
        let mut dataset = Dataset::default();
        apply(&registry, &mut dataset, "format", &["strongroom/a"]).unwrap();
        assert_eq!(dataset.format.as_deref(), Some("strongroom/a"));
        let result = apply(&registry, &mut dataset, "fmt", &["again"]);
        assert!(matches!(result, Err(CommandError::FormatAlreadySet)));
    }

    #[test]
    fn test_custom_opcode_registration() {
        let mut registry = CommandRegistry::standard();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        registry.register("nop", 0, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let mut dataset = Dataset::default();
        apply(&registry, &mut dataset, "nop", &[]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delete_commands() {
        let registry = CommandRegistry::standard();
        let mut dataset = Dataset::default();
        apply(&registry, &mut dataset, "cgr", &["0", "G1"]).unwrap();
        apply(&registry, &mut dataset, "cen", &["G1", "E1"]).unwrap();
        apply(&registry, &mut dataset, "sem", &["E1", "note", "hi"]).unwrap();
        apply(&registry, &mut dataset, "dem", &["E1", "note"]).unwrap();
        assert!(dataset.find_entry("E1").unwrap().meta.is_empty());
        let result = apply(&registry, &mut dataset, "dem", &["E1", "note"]);
        assert!(matches!(result, Err(CommandError::KeyNotFound { .. })));
        apply(&registry, &mut dataset, "den", &["E1"]).unwrap();
        assert!(dataset.find_entry("E1").is_none());
        apply(&registry, &mut dataset, "dgr", &["G1"]).unwrap();
        assert!(dataset.groups.is_empty());
    }
}
