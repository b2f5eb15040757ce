//! Integration tests for descriptor serialize/replay

use std::sync::Arc;

use strongroom::archive::{Archive, Dataset, Entry, Group};
use strongroom::descriptor::{describe, execute, CommandRegistry, ReplayError};
use strongroom::encoding::{compress_text, decompress_text, encode_text};
use strongroom::testkit::SequentialIds;

fn ids() -> Arc<SequentialIds> {
    Arc::new(SequentialIds::default())
}

#[test]
fn test_replay_scenario_yields_expected_dataset() {
    let registry = CommandRegistry::standard();
    let descriptor = [
        "aid A1".to_string(),
        "cgr 0 G1".to_string(),
        format!("tgr G1 {}", encode_text("Main")),
        "cen G1 E1".to_string(),
        format!("sep E1 {} {}", encode_text("title"), encode_text("Site")),
    ]
    .join("\n");

    let dataset = execute(&registry, &descriptor).unwrap();

    let expected = Dataset {
        format: None,
        archive_id: "A1".into(),
        attributes: Default::default(),
        groups: vec![Group {
            id: "G1".into(),
            title: "Main".into(),
            attributes: Default::default(),
            groups: vec![],
            entries: vec![Entry {
                id: "E1".into(),
                properties: [("title".to_string(), "Site".to_string())].into(),
                meta: Default::default(),
                attributes: Default::default(),
            }],
        }],
    };
    assert_eq!(dataset, expected);
}

#[test]
fn test_describe_execute_roundtrip_after_edits() {
    let mut archive = Archive::new(ids());
    let email = archive.create_group(None, "Email").unwrap();
    let work = archive.create_group(Some(&email), "Work").unwrap();
    let personal = archive.create_group(None, "Personal").unwrap();
    let entry = archive.create_entry(&work, "Mail login").unwrap();
    archive
        .set_entry_property(&entry, "username", "user@example.org")
        .unwrap();
    archive
        .set_entry_property(&entry, "password", "pa55 word")
        .unwrap();
    archive.set_entry_meta(&entry, "url", "mail.example.org").unwrap();
    archive.set_archive_attribute("status", "rw").unwrap();

    // exercise deletion and moves before the roundtrip
    let doomed = archive.create_group(None, "Doomed").unwrap();
    archive.remove_group(&doomed).unwrap();
    archive.move_group(&work, None).unwrap();
    archive.move_entry(&entry, &personal).unwrap();

    let described = archive.describe();
    let registry = CommandRegistry::standard();
    let replayed = execute(&registry, &described).unwrap();
    assert_eq!(&replayed, archive.dataset());
}

#[test]
fn test_fail_fast_returns_no_dataset() {
    let registry = CommandRegistry::standard();
    let descriptor = [
        "aid A1".to_string(),
        "cgr 0 G1".to_string(),
        "zzz bogus".to_string(),
        "cgr 0 G2".to_string(),
    ]
    .join("\n");
    let err = execute(&registry, &descriptor).unwrap_err();
    assert!(matches!(
        err,
        ReplayError::UnknownOpcode { line: 3, ref opcode } if opcode == "zzz"
    ));
}

#[test]
fn test_replay_determinism() {
    let mut archive = Archive::new(ids());
    let group = archive.create_group(None, "Sites").unwrap();
    let entry = archive.create_entry(&group, "Forum").unwrap();
    archive
        .set_entry_property(&entry, "password", "hunter2")
        .unwrap();

    let described = archive.describe();
    let registry = CommandRegistry::standard();
    let first = execute(&registry, &described).unwrap();
    let second = execute(&registry, &described).unwrap();
    assert_eq!(first, second);
    assert_eq!(&first, archive.dataset());
}

#[test]
fn test_compressed_descriptor_storage_roundtrip() {
    let mut archive = Archive::new(ids());
    let group = archive.create_group(None, "Banking").unwrap();
    for index in 0..10 {
        let entry = archive
            .create_entry(&group, &format!("Account {index}"))
            .unwrap();
        archive
            .set_entry_property(&entry, "username", "holder")
            .unwrap();
    }

    let described = archive.describe();
    let stored = compress_text(&described).unwrap();
    assert!(stored.len() < described.len());

    let restored = decompress_text(&stored).unwrap();
    let registry = CommandRegistry::standard();
    let replayed = execute(&registry, &restored).unwrap();
    assert_eq!(&replayed, archive.dataset());
}

#[test]
fn test_history_is_replayable_descriptor() {
    let mut archive = Archive::new(ids());
    let group = archive.create_group(None, "Main").unwrap();
    archive.set_group_attribute(&group, "icon", "home").unwrap();

    let rebuilt = Archive::from_descriptor(&archive.history().join("\n"), ids()).unwrap();
    assert_eq!(rebuilt.dataset(), archive.dataset());
    assert_eq!(rebuilt.history(), archive.history());
}

#[test]
fn test_unicode_values_survive_roundtrip() {
    let mut archive = Archive::new(ids());
    let group = archive.create_group(None, "Köpenhamn ☂").unwrap();
    let entry = archive.create_entry(&group, "站点").unwrap();
    archive
        .set_entry_meta(&entry, "note", "line one\nline two")
        .unwrap();

    let registry = CommandRegistry::standard();
    let replayed = execute(&registry, &archive.describe()).unwrap();
    assert_eq!(&replayed, archive.dataset());
    let replayed_entry = replayed.find_entry(&entry).unwrap();
    assert_eq!(replayed_entry.meta_value("note"), Some("line one\nline two"));
}
