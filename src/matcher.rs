//! Path classification for schema definition files.
//!
//! The matcher is the single source of truth for mapping a relative path
//! key to its [`RecordType`] and for extracting path coordinates (extension
//! name, event category). The resolver and validators never parse paths
//! themselves.

use crate::types::RecordType;

/// Classify a relative path key into its record type.
///
/// Total over all inputs; anything unrecognized is `RecordType::Unknown`.
pub fn classify(path: &str) -> RecordType {
    let rel = strip_extension_prefix(path);

    if !rel.ends_with(".json") {
        return RecordType::Unknown;
    }

    match rel {
        "dictionary.json" => RecordType::Dictionary,
        "categories.json" => RecordType::Category,
        "version.json" => RecordType::Version,
        "extension.json" if in_extension(path).is_some() => RecordType::Extension,
        _ if rel.starts_with("events/") => RecordType::Event,
        _ if rel.starts_with("objects/") => RecordType::Object,
        _ if rel.starts_with("profiles/") => RecordType::Profile,
        _ if rel.starts_with("includes/") || rel.starts_with("enums/") => RecordType::Include,
        _ => RecordType::Unknown,
    }
}

/// The extension name owning `path`, if it lies under `extensions/<name>/`.
pub fn in_extension(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("extensions/")?;
    let (name, tail) = rest.split_once('/')?;
    if name.is_empty() || tail.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// The path as it would appear at the schema root, with any
/// `extensions/<name>/` prefix removed.
pub fn strip_extension_prefix(path: &str) -> &str {
    match in_extension(path) {
        Some(name) => &path["extensions/".len() + name.len() + 1..],
        None => path,
    }
}

/// The category directory of an event path, relative to its owning root.
///
/// `events/activity/thing.json` yields `activity`;
/// `events/base_event.json` has no category.
pub fn category_of_event(path: &str) -> Option<&str> {
    let rest = strip_extension_prefix(path).strip_prefix("events/")?;
    let (category, tail) = rest.split_once('/')?;
    if tail.is_empty() {
        None
    } else {
        Some(category)
    }
}

pub fn is_dictionary(path: &str) -> bool {
    classify(path) == RecordType::Dictionary
}

pub fn is_category(path: &str) -> bool {
    classify(path) == RecordType::Category
}

pub fn is_event(path: &str) -> bool {
    classify(path) == RecordType::Event
}

pub fn is_object(path: &str) -> bool {
    classify(path) == RecordType::Object
}

pub fn is_profile(path: &str) -> bool {
    classify(path) == RecordType::Profile
}

pub fn is_extension(path: &str) -> bool {
    classify(path) == RecordType::Extension
}

pub fn is_include(path: &str) -> bool {
    classify(path) == RecordType::Include
}
