//! Structural checks over a resolved schema tree.
//!
//! Every validator is a pure function of the reader plus a collector: it
//! mutates nothing, iterates in lexicographic path order, and reports
//! through the collector. Unresolved-target diagnostics are emitted by the
//! resolver itself while it still has the directives in hand; the checks
//! here cover what is left once the tree is fully merged.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::errors::{Collector, ValidationError};
use crate::matcher;
use crate::reader::Reader;
use crate::types::{RecordType, ATTRIBUTES_KEY, INCLUDE_KEY};

/// Run every check in a fixed order.
pub fn validate_all(reader: &Reader, collector: &mut Collector) {
    validate_required_keys(reader, collector);
    validate_unknown_keys(reader, collector);
    validate_unused_attributes(reader, collector);
    validate_undefined_attributes(reader, collector);
    validate_name_collisions(reader, collector);
}

/// Every required key of a record's type must be present, and each entry
/// of a declared attribute container must satisfy the nested record spec.
pub fn validate_required_keys(reader: &Reader, collector: &mut Collector) {
    for (path, doc) in reader.iter(|_| true) {
        let Some(spec) = matcher::classify(path).spec() else {
            continue;
        };

        for key in spec.required {
            if doc.get(*key).is_none() {
                collector.report(ValidationError::MissingRequiredKey {
                    path: path.to_string(),
                    key: (*key).to_string(),
                    trail: String::new(),
                });
            }
        }

        if let Some(nested) = spec.attributes {
            for (name, entry) in container_entries(doc) {
                for key in nested.required {
                    if entry.get(*key).is_none() {
                        collector.report(ValidationError::MissingRequiredKey {
                            path: path.to_string(),
                            key: (*key).to_string(),
                            trail: format!("{ATTRIBUTES_KEY}.{name}"),
                        });
                    }
                }
            }
        }
    }
}

/// Any key outside a record type's declared set is unknown, at the top
/// level and inside attribute container entries.
pub fn validate_unknown_keys(reader: &Reader, collector: &mut Collector) {
    for (path, doc) in reader.iter(|_| true) {
        let Some(spec) = matcher::classify(path).spec() else {
            continue;
        };
        let Some(map) = doc.as_object() else {
            continue;
        };

        for key in map.keys() {
            if !spec.allows(key) {
                collector.report(ValidationError::UnknownKey {
                    path: path.to_string(),
                    key: key.clone(),
                    trail: String::new(),
                });
            }
        }

        if let Some(nested) = spec.attributes {
            for (name, entry) in container_entries(doc) {
                let Some(fields) = entry.as_object() else {
                    continue;
                };
                for key in fields.keys() {
                    if !nested.allows(key) {
                        collector.report(ValidationError::UnknownKey {
                            path: path.to_string(),
                            key: key.clone(),
                            trail: format!("{ATTRIBUTES_KEY}.{name}"),
                        });
                    }
                }
            }
        }
    }
}

/// Every entry of the root dictionary must be referenced by at least one
/// event or object.
pub fn validate_unused_attributes(reader: &Reader, collector: &mut Collector) {
    let Some(dictionary) = reader
        .get("dictionary.json")
        .and_then(|d| d.get(ATTRIBUTES_KEY))
        .and_then(Value::as_object)
    else {
        return;
    };

    let mut used: BTreeSet<&str> = BTreeSet::new();
    for (_, doc) in reader.iter(|p| matcher::is_event(p) || matcher::is_object(p)) {
        for (name, _) in container_entries(doc) {
            used.insert(name);
        }
    }

    for name in dictionary.keys() {
        if !used.contains(name.as_str()) {
            collector.report(ValidationError::UnusedAttribute { attr: name.clone() });
        }
    }
}

/// Every attribute a record uses must be defined in the root dictionary
/// or, for records inside an extension, that extension's dictionary.
pub fn validate_undefined_attributes(reader: &Reader, collector: &mut Collector) {
    if reader.get("dictionary.json").is_none() {
        // A tree without a dictionary has nothing to check against;
        // required-keys reporting on the records is noise enough.
        return;
    }

    for (path, doc) in reader.iter(|p| matcher::classify(p).merges_dictionary()) {
        let extension_dict = matcher::in_extension(path)
            .map(|ext| format!("extensions/{ext}/dictionary.json"));

        for (name, _) in container_entries(doc) {
            let defined = dictionary_defines(reader, "dictionary.json", name)
                || extension_dict
                    .as_deref()
                    .map(|key| dictionary_defines(reader, key, name))
                    .unwrap_or(false);

            if !defined {
                collector.report(ValidationError::UndefinedAttribute {
                    path: path.to_string(),
                    attr: name.to_string(),
                });
            }
        }
    }
}

/// Two records of the same type must not declare the same `name`,
/// wherever in the tree they live — extension records share the namespace
/// of the schema root.
pub fn validate_name_collisions(reader: &Reader, collector: &mut Collector) {
    let mut seen: Vec<(RecordType, String, String)> = Vec::new();

    for (path, doc) in reader.iter(|p| matcher::is_event(p) || matcher::is_object(p)) {
        let Some(name) = doc.get("name").and_then(Value::as_str) else {
            continue;
        };
        let record_type = matcher::classify(path);

        if let Some((_, _, first)) = seen
            .iter()
            .find(|(t, n, _)| *t == record_type && n == name)
        {
            collector.report(ValidationError::NameCollision {
                path: path.to_string(),
                name: name.to_string(),
                record_type: record_type.name().to_string(),
                other: first.clone(),
            });
        } else {
            seen.push((record_type, name.to_string(), path.to_string()));
        }
    }
}

/// Entries of a document's `attributes` container, skipping any literal
/// `$include` key (a directive, not an attribute).
fn container_entries(doc: &Value) -> impl Iterator<Item = (&str, &Value)> {
    doc.get(ATTRIBUTES_KEY)
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .filter(|(name, _)| name.as_str() != INCLUDE_KEY)
        .map(|(name, value)| (name.as_str(), value))
}

fn dictionary_defines(reader: &Reader, key: &str, attr: &str) -> bool {
    reader
        .get(key)
        .and_then(|d| d.get(ATTRIBUTES_KEY))
        .and_then(|a| a.get(attr))
        .is_some()
}
