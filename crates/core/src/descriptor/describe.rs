use crate::archive::{Dataset, Entry, Group, ROOT_PARENT_ID};
use crate::encoding::encode_text;

/// Serialize a dataset into descriptor text
///
/// One line per logical fact, in a stable order: format and archive id
/// first, archive attributes in key order, then a depth-first walk of the
/// group tree emitting creation before property-setting commands for each
/// node. Every free-text argument is wrapped with the token encoding; ids
/// pass through raw.
pub fn describe(dataset: &Dataset) -> String {
    let mut lines = Vec::new();
    if let Some(format) = &dataset.format {
        lines.push(format!("fmt {}", encode_text(format)));
    }
    if !dataset.archive_id.is_empty() {
        lines.push(format!("aid {}", dataset.archive_id));
    }
    for (key, value) in &dataset.attributes {
        lines.push(format!("saa {} {}", encode_text(key), encode_text(value)));
    }
    for group in &dataset.groups {
        describe_group(group, ROOT_PARENT_ID, &mut lines);
    }
    lines.join("\n")
}

fn describe_group(group: &Group, parent_id: &str, lines: &mut Vec<String>) {
    lines.push(format!("cgr {} {}", parent_id, group.id));
    if !group.title.is_empty() {
        lines.push(format!("tgr {} {}", group.id, encode_text(&group.title)));
    }
    for (key, value) in &group.attributes {
        lines.push(format!(
            "sga {} {} {}",
            group.id,
            encode_text(key),
            encode_text(value)
        ));
    }
    for entry in &group.entries {
        describe_entry(entry, &group.id, lines);
    }
    for child in &group.groups {
        describe_group(child, &group.id, lines);
    }
}

fn describe_entry(entry: &Entry, group_id: &str, lines: &mut Vec<String>) {
    lines.push(format!("cen {} {}", group_id, entry.id));
    for (name, value) in &entry.properties {
        lines.push(format!(
            "sep {} {} {}",
            entry.id,
            encode_text(name),
            encode_text(value)
        ));
    }
    for (key, value) in &entry.meta {
        lines.push(format!(
            "sem {} {} {}",
            entry.id,
            encode_text(key),
            encode_text(value)
        ));
    }
    for (key, value) in &entry.attributes {
        lines.push(format!(
            "sea {} {} {}",
            entry.id,
            encode_text(key),
            encode_text(value)
        ));
    }
}
