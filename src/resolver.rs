//! Directive expansion: the merge engine behind schema resolution.
//!
//! Resolution runs four passes in a fixed order over the whole tree:
//! `$include` expansion, `profiles` application, `extends` inheritance,
//! then the dictionary merge. Includes come first because they produce
//! static content the later passes reference; the dictionary runs last so
//! it sees the final key set of every `attributes` container. All merging
//! shares one substrate, [`deep_merge`]: the host always wins, objects
//! recurse, arrays and scalars replace wholesale.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::errors::{Collector, ValidationError};
use crate::matcher;
use crate::reader::Reader;
use crate::types::{
    RecordType, TypeSpec, ATTRIBUTES_KEY, EXTENDS_KEY, INCLUDE_KEY, PROFILES_KEY,
};

/// Expand every directive in the reader, in place.
///
/// Unresolvable targets and cycles are reported to the collector; the
/// traversal itself never fails. Running on an already-resolved reader is
/// a no-op.
pub fn resolve(reader: &mut Reader, collector: &mut Collector) {
    if reader.is_resolved() {
        return;
    }

    let mut resolver = Resolver {
        collector,
        done: BTreeSet::new(),
        active: Vec::new(),
    };

    resolver.expand_includes(reader);
    resolver.apply_profiles(reader);
    resolver.apply_extends(reader);
    resolver.merge_dictionaries(reader);

    reader.mark_resolved();
}

/// Merge `other` into `host` with host precedence at every level.
///
/// Objects merge key by key, recursing where both sides hold objects. Any
/// other disagreement in shape, arrays included, leaves the host value
/// untouched. An explicit `null` on the host is a value like any other and
/// wins.
pub fn deep_merge(host: &mut Value, other: &Value) {
    if let (Value::Object(host), Value::Object(other)) = (host, other) {
        merge_objects(host, other, &[]);
    }
}

fn merge_objects(host: &mut Map<String, Value>, other: &Map<String, Value>, exclude: &[&str]) {
    for (key, value) in other {
        if exclude.contains(&key.as_str()) {
            continue;
        }
        match host.get_mut(key) {
            Some(existing) => {
                if let (Value::Object(h), Value::Object(o)) = (existing, value) {
                    merge_objects(h, o, &[]);
                }
            }
            None => {
                host.insert(key.clone(), value.clone());
            }
        }
    }
}

/// A directive value that may be a single string or a list of strings.
fn string_or_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect(),
        _ => Vec::new(),
    }
}

/// Walk `doc` along the host's nesting trail. Falls back to the document
/// root when the target has nothing at that trail (flat include
/// fragments).
fn navigate_trail<'a>(doc: &'a Value, trail: &[String]) -> &'a Value {
    let mut current = doc;
    for key in trail {
        match current.get(key) {
            Some(next) => current = next,
            None => return doc,
        }
    }
    current
}

struct Resolver<'c> {
    collector: &'c mut Collector,
    /// Documents fully processed by the current pass.
    done: BTreeSet<String>,
    /// DFS stack of the current pass; re-entering a member is a cycle.
    active: Vec<String>,
}

impl Resolver<'_> {
    // --- Pass 1: $include ---

    fn expand_includes(&mut self, reader: &mut Reader) {
        self.done.clear();
        self.active.clear();
        let keys: Vec<String> = reader.keys().map(str::to_owned).collect();
        for key in keys {
            self.expand_document(reader, &key);
        }
    }

    fn expand_document(&mut self, reader: &mut Reader, key: &str) {
        if self.done.contains(key) || self.active.iter().any(|k| k.as_str() == key) {
            return;
        }
        self.active.push(key.to_string());

        if let Some(mut doc) = reader.get(key).cloned() {
            let profile_targets = self.profile_targets(reader, &doc, key);
            let mut trail = Vec::new();
            self.expand_value(reader, &mut doc, key, &profile_targets, &mut trail);
            reader.set(key, doc);
        }

        self.active.pop();
        self.done.insert(key.to_string());
    }

    /// Resolved paths of the document's listed profiles, used to flag
    /// `$include`s that duplicate a profile while both directives are
    /// still visible.
    fn profile_targets(&self, reader: &Reader, doc: &Value, origin: &str) -> Vec<String> {
        string_or_list(doc.get(PROFILES_KEY))
            .iter()
            .filter_map(|name| reader.find_profile(name, origin))
            .collect()
    }

    fn expand_value(
        &mut self,
        reader: &mut Reader,
        value: &mut Value,
        origin: &str,
        profile_targets: &[String],
        trail: &mut Vec<String>,
    ) {
        let Value::Object(map) = value else {
            return;
        };

        if map.contains_key(INCLUDE_KEY) {
            let targets = string_or_list(map.get(INCLUDE_KEY));
            map.shift_remove(INCLUDE_KEY);

            for target in targets {
                let Some(found) = reader.find_include(&target, origin) else {
                    self.collector.report(ValidationError::UnresolvedInclude {
                        path: origin.to_string(),
                        target,
                    });
                    continue;
                };

                if profile_targets.contains(&found) {
                    self.collector
                        .report(ValidationError::RedundantProfileInclude {
                            path: origin.to_string(),
                            target: found.clone(),
                        });
                }

                if self.active.iter().any(|k| k == &found) {
                    self.collector.report(ValidationError::InclusionCycle {
                        path: origin.to_string(),
                        target: found,
                    });
                    continue;
                }

                // Expand the target first so transitive includes land here
                // already flattened, then merge it at the directive's
                // location. Earlier includes become part of the host and
                // therefore win over later ones.
                self.expand_document(reader, &found);
                if let Some(source) = reader.get(&found) {
                    let content = navigate_trail(source, trail);
                    if let Value::Object(other) = content {
                        merge_objects(map, other, &[]);
                    }
                }
            }
        }

        for (name, child) in map.iter_mut() {
            if child.is_object() {
                trail.push(name.clone());
                self.expand_value(reader, child, origin, profile_targets, trail);
                trail.pop();
            }
        }
    }

    // --- Pass 2: profiles ---

    fn apply_profiles(&mut self, reader: &mut Reader) {
        let keys: Vec<String> = reader.keys().map(str::to_owned).collect();
        for key in keys {
            let names = string_or_list(reader.get(&key).and_then(|d| d.get(PROFILES_KEY)));
            if names.is_empty() {
                continue;
            }

            let exclude = foreign_profile_keys(matcher::classify(&key).spec());
            let Some(mut doc) = reader.get(&key).cloned() else {
                continue;
            };

            for name in names {
                match reader.find_profile(&name, &key) {
                    None => self.collector.report(ValidationError::UnresolvedProfile {
                        path: key.clone(),
                        target: name,
                    }),
                    Some(target) if target == key => {}
                    Some(target) => {
                        if let (Value::Object(host), Some(Value::Object(other))) =
                            (&mut doc, reader.get(&target))
                        {
                            merge_objects(host, other, &exclude);
                        }
                    }
                }
            }

            reader.set(key.as_str(), doc);
        }
    }

    // --- Pass 3: extends ---

    fn apply_extends(&mut self, reader: &mut Reader) {
        self.done.clear();
        self.active.clear();
        let keys: Vec<String> = reader.keys().map(str::to_owned).collect();
        for key in keys {
            self.extend_document(reader, &key);
        }
    }

    fn extend_document(&mut self, reader: &mut Reader, key: &str) {
        if self.done.contains(key) || self.active.iter().any(|k| k.as_str() == key) {
            return;
        }
        self.active.push(key.to_string());

        let target = reader
            .get(key)
            .and_then(|d| d.get(EXTENDS_KEY))
            .and_then(Value::as_str)
            .map(str::to_owned);

        if let Some(name) = target {
            match reader.find_base(&name, key) {
                None => {
                    // The directive stays in place; the recorded error is
                    // the marker that resolution failed here.
                    self.collector.report(ValidationError::UnresolvedExtends {
                        path: key.to_string(),
                        target: name,
                    });
                }
                Some(base) => {
                    if base.via_sibling {
                        self.collector.report(ValidationError::SiblingInheritance {
                            path: key.to_string(),
                            target: name.clone(),
                            found: base.key.clone(),
                        });
                    }

                    if self.active.iter().any(|k| k == &base.key) {
                        self.collector.report(ValidationError::InclusionCycle {
                            path: key.to_string(),
                            target: base.key.clone(),
                        });
                        self.remove_extends(reader, key);
                    } else {
                        // Inheritance is transitive: flatten the base's own
                        // chain before merging it down.
                        self.extend_document(reader, &base.key);
                        let base_doc = reader.get(&base.key).cloned();
                        if let (Some(mut doc), Some(base_doc)) =
                            (reader.get(key).cloned(), base_doc)
                        {
                            if let Value::Object(map) = &mut doc {
                                map.shift_remove(EXTENDS_KEY);
                            }
                            deep_merge(&mut doc, &base_doc);
                            reader.set(key, doc);
                        }
                    }
                }
            }
        }

        self.active.pop();
        self.done.insert(key.to_string());
    }

    fn remove_extends(&mut self, reader: &mut Reader, key: &str) {
        if let Some(mut doc) = reader.get(key).cloned() {
            if let Value::Object(map) = &mut doc {
                map.shift_remove(EXTENDS_KEY);
            }
            reader.set(key, doc);
        }
    }

    // --- Pass 4: dictionary ---

    fn merge_dictionaries(&mut self, reader: &mut Reader) {
        let root_attrs = dictionary_attributes(reader, "dictionary.json");
        let keys: Vec<String> = reader.keys().map(str::to_owned).collect();

        for key in keys {
            if !matcher::classify(&key).merges_dictionary() {
                continue;
            }

            let ext_attrs = matcher::in_extension(&key).and_then(|ext| {
                dictionary_attributes(reader, &format!("extensions/{ext}/dictionary.json"))
            });
            if root_attrs.is_none() && ext_attrs.is_none() {
                continue;
            }

            let Some(mut doc) = reader.get(&key).cloned() else {
                continue;
            };
            if let Some(attrs) = doc.get_mut(ATTRIBUTES_KEY).and_then(Value::as_object_mut) {
                for (name, entry) in attrs.iter_mut() {
                    if name == INCLUDE_KEY {
                        continue;
                    }
                    // Extension entries merge first; host-wins then makes
                    // them take precedence over the root dictionary.
                    if let Some(source) = ext_attrs.as_ref().and_then(|d| d.get(name)) {
                        deep_merge(entry, source);
                    }
                    if let Some(source) = root_attrs.as_ref().and_then(|d| d.get(name)) {
                        deep_merge(entry, source);
                    }
                }
            }
            reader.set(key.as_str(), doc);
        }
    }
}

/// Top-level keys the profile type declares but the host's type does not.
/// Profile plumbing such as `meta` and `annotations` must not leak into
/// the records a profile is applied to.
fn foreign_profile_keys(host: Option<&'static TypeSpec>) -> Vec<&'static str> {
    let (Some(host), Some(profile)) = (host, RecordType::Profile.spec()) else {
        return Vec::new();
    };
    profile.declared().filter(|key| !host.allows(key)).collect()
}

fn dictionary_attributes(reader: &Reader, key: &str) -> Option<Map<String, Value>> {
    reader
        .get(key)?
        .get(ATTRIBUTES_KEY)?
        .as_object()
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    fn resolve_documents(docs: Vec<(&str, Value)>) -> (Reader, Collector) {
        let mut reader = Reader::from_documents(docs);
        let mut collector = Collector::default();
        resolve(&mut reader, &mut collector);
        (reader, collector)
    }

    // === Deep merge ===

    #[test]
    fn merge_keeps_host_scalars() {
        let mut host = json!({"x": 1, "s": "host"});
        deep_merge(&mut host, &json!({"x": 9, "s": "other", "y": 2}));
        assert_eq!(host, json!({"x": 1, "s": "host", "y": 2}));
    }

    #[test]
    fn merge_recurses_into_objects() {
        let mut host = json!({"a": {"b": {"c": 1}}});
        deep_merge(&mut host, &json!({"a": {"b": {"c": 9, "d": 2}, "e": 3}}));
        assert_eq!(host, json!({"a": {"b": {"c": 1, "d": 2}, "e": 3}}));
    }

    #[test]
    fn merge_never_concatenates_arrays() {
        let mut host = json!({"values": [1, 2]});
        deep_merge(&mut host, &json!({"values": [3, 4, 5]}));
        assert_eq!(host, json!({"values": [1, 2]}));
    }

    #[test]
    fn merge_host_null_wins() {
        let mut host = json!({"suppressed": null});
        deep_merge(&mut host, &json!({"suppressed": {"caption": "X"}}));
        assert_eq!(host, json!({"suppressed": null}));
    }

    #[test]
    fn merge_shape_disagreement_keeps_host() {
        let mut host = json!({"thing": "scalar"});
        deep_merge(&mut host, &json!({"thing": {"caption": "X"}}));
        assert_eq!(host, json!({"thing": "scalar"}));
    }

    // === $include ===

    #[test]
    fn include_merges_at_document_root() {
        let (reader, collector) = resolve_documents(vec![
            ("a.json", json!({"$include": "b.json", "x": 1})),
            ("b.json", json!({"y": 2, "x": 9})),
        ]);
        assert_eq!(reader.get("a.json").unwrap(), &json!({"x": 1, "y": 2}));
        assert!(collector.is_empty());
    }

    #[test]
    fn nested_include_follows_the_trail() {
        let (reader, collector) = resolve_documents(vec![
            (
                "a.json",
                json!({"attributes": {"$include": "b.json", "k": {"v": 1}}}),
            ),
            (
                "b.json",
                json!({"attributes": {"k": {"v": 9, "w": 2}, "m": {"v": 3}}}),
            ),
        ]);
        assert_eq!(
            reader.get("a.json").unwrap()["attributes"],
            json!({"k": {"v": 1, "w": 2}, "m": {"v": 3}})
        );
        assert!(collector.is_empty());
    }

    #[test]
    fn nested_include_flat_fragment_falls_back_to_root() {
        let (reader, _) = resolve_documents(vec![
            (
                "objects/thing.json",
                json!({"attributes": {"$include": "includes/frag.json"}}),
            ),
            ("includes/frag.json", json!({"color": {"type": "string_t"}})),
        ]);
        assert_eq!(
            reader.get("objects/thing.json").unwrap()["attributes"],
            json!({"color": {"type": "string_t"}})
        );
    }

    #[test]
    fn earlier_include_wins_over_later() {
        let (reader, _) = resolve_documents(vec![
            (
                "a.json",
                json!({"$include": ["first.json", "second.json"]}),
            ),
            ("first.json", json!({"x": "first"})),
            ("second.json", json!({"x": "second", "y": 2})),
        ]);
        assert_eq!(reader.get("a.json").unwrap(), &json!({"x": "first", "y": 2}));
    }

    #[test]
    fn transitive_includes_are_flattened_first() {
        let (reader, collector) = resolve_documents(vec![
            ("a.json", json!({"$include": "b.json"})),
            ("b.json", json!({"$include": "c.json", "from_b": 1})),
            ("c.json", json!({"from_c": 2})),
        ]);
        assert_eq!(
            reader.get("a.json").unwrap(),
            &json!({"from_b": 1, "from_c": 2})
        );
        assert!(collector.is_empty());
    }

    #[test]
    fn unresolved_include_is_reported_and_removed() {
        let (reader, collector) = resolve_documents(vec![(
            "a.json",
            json!({"$include": "nowhere.json", "x": 1}),
        )]);
        assert_eq!(reader.get("a.json").unwrap(), &json!({"x": 1}));
        assert_eq!(collector.count_kind(ErrorKind::UnresolvedInclude), 1);
    }

    #[test]
    fn include_cycle_terminates_with_one_error() {
        let (reader, collector) = resolve_documents(vec![
            ("a.json", json!({"$include": "b.json"})),
            ("b.json", json!({"$include": "a.json"})),
        ]);
        assert_eq!(collector.count_kind(ErrorKind::InclusionCycle), 1);
        assert!(reader.get("a.json").unwrap().get("$include").is_none());
        assert!(reader.get("b.json").unwrap().get("$include").is_none());
    }

    #[test]
    fn include_prefers_extension_copy() {
        let (reader, _) = resolve_documents(vec![
            (
                "extensions/e/objects/thing.json",
                json!({"$include": "includes/frag.json"}),
            ),
            ("extensions/e/includes/frag.json", json!({"who": "extension"})),
            ("includes/frag.json", json!({"who": "root"})),
        ]);
        assert_eq!(
            reader.get("extensions/e/objects/thing.json").unwrap()["who"],
            json!("extension")
        );
    }

    // === profiles ===

    #[test]
    fn profile_merges_at_root_and_key_is_retained() {
        let (reader, collector) = resolve_documents(vec![
            (
                "events/net/http.json",
                json!({
                    "name": "http",
                    "caption": "HTTP",
                    "profiles": "p1",
                    "attributes": {}
                }),
            ),
            (
                "profiles/p1.json",
                json!({
                    "name": "p1",
                    "caption": "P1",
                    "meta": "profile",
                    "annotations": {"group": "net"},
                    "attributes": {"proxy": {"requirement": "optional"}}
                }),
            ),
        ]);
        let doc = reader.get("events/net/http.json").unwrap();
        assert_eq!(doc["profiles"], json!("p1"));
        assert_eq!(doc["name"], json!("http"));
        assert_eq!(doc["attributes"]["proxy"]["requirement"], json!("optional"));
        // Profile plumbing must not leak into the event.
        assert!(doc.get("meta").is_none());
        assert!(doc.get("annotations").is_none());
        assert!(collector.is_empty());
    }

    #[test]
    fn profile_list_applies_in_order() {
        let (reader, _) = resolve_documents(vec![
            (
                "events/net/http.json",
                json!({
                    "name": "http",
                    "caption": "HTTP",
                    "profiles": ["p1", "p2"],
                    "attributes": {}
                }),
            ),
            ("profiles/p1.json", json!({"attributes": {"a": {"group": "one"}}})),
            ("profiles/p2.json", json!({"attributes": {"a": {"group": "two"}, "b": {}}})),
        ]);
        let attrs = &reader.get("events/net/http.json").unwrap()["attributes"];
        assert_eq!(attrs["a"]["group"], json!("one"));
        assert!(attrs.get("b").is_some());
    }

    #[test]
    fn extension_document_uses_extension_profile() {
        let (reader, _) = resolve_documents(vec![
            (
                "extensions/one/events/net/http.json",
                json!({"name": "http", "caption": "h", "profiles": "p1", "attributes": {}}),
            ),
            (
                "extensions/one/profiles/p1.json",
                json!({"attributes": {"thing": {}}}),
            ),
            ("profiles/p1.json", json!({"attributes": {"thing2": {}}})),
        ]);
        let attrs = &reader.get("extensions/one/events/net/http.json").unwrap()["attributes"];
        assert!(attrs.get("thing").is_some());
        assert!(attrs.get("thing2").is_none());
    }

    #[test]
    fn unresolved_profile_is_reported() {
        let (reader, collector) = resolve_documents(vec![(
            "events/net/http.json",
            json!({"name": "http", "caption": "h", "profiles": "ghost", "attributes": {}}),
        )]);
        assert_eq!(collector.count_kind(ErrorKind::UnresolvedProfile), 1);
        // The directive is kept verbatim either way.
        assert_eq!(
            reader.get("events/net/http.json").unwrap()["profiles"],
            json!("ghost")
        );
    }

    #[test]
    fn redundant_profile_include_is_flagged() {
        let (_, collector) = resolve_documents(vec![
            (
                "events/net/http.json",
                json!({
                    "name": "http",
                    "caption": "h",
                    "profiles": "p1",
                    "$include": "profiles/p1.json",
                    "attributes": {}
                }),
            ),
            ("profiles/p1.json", json!({"attributes": {"x": {}}})),
        ]);
        assert_eq!(collector.count_kind(ErrorKind::RedundantProfileInclude), 1);
    }

    // === extends ===

    #[test]
    fn extends_merges_base_and_removes_directive() {
        let (reader, collector) = resolve_documents(vec![
            (
                "events/activity/child.json",
                json!({"extends": "parent", "name": "c", "attributes": {}}),
            ),
            (
                "events/activity/parent.json",
                json!({"name": "p", "caption": "P", "attributes": {"t": {}}}),
            ),
        ]);
        let child = reader.get("events/activity/child.json").unwrap();
        assert!(child.get("extends").is_none());
        assert_eq!(child["name"], json!("c"));
        assert_eq!(child["caption"], json!("P"));
        assert!(child["attributes"].get("t").is_some());
        assert!(collector.is_empty());
    }

    #[test]
    fn extends_in_extension_falls_back_to_root() {
        let (reader, collector) = resolve_documents(vec![
            (
                "extensions/e/events/activity/child.json",
                json!({"extends": "parent", "name": "c"}),
            ),
            (
                "events/activity/parent.json",
                json!({"name": "p", "caption": "P"}),
            ),
        ]);
        let child = reader.get("extensions/e/events/activity/child.json").unwrap();
        assert_eq!(child["caption"], json!("P"));
        assert_eq!(child["name"], json!("c"));
        assert_eq!(collector.count_kind(ErrorKind::SiblingInheritance), 0);
    }

    #[test]
    fn extends_via_sibling_warns() {
        let (reader, collector) = resolve_documents(vec![
            ("events/a/child.json", json!({"extends": "base", "name": "c"})),
            ("events/b/base.json", json!({"name": "b", "caption": "B"})),
        ]);
        assert_eq!(collector.count_kind(ErrorKind::SiblingInheritance), 1);
        assert_eq!(
            reader.get("events/a/child.json").unwrap()["caption"],
            json!("B")
        );
    }

    #[test]
    fn extends_is_transitive() {
        let (reader, _) = resolve_documents(vec![
            (
                "events/a/leaf.json",
                json!({"extends": "middle", "name": "leaf"}),
            ),
            (
                "events/a/middle.json",
                json!({"extends": "root", "name": "middle", "caption": "M"}),
            ),
            (
                "events/a/root.json",
                json!({"name": "root", "caption": "R", "uid": 1}),
            ),
        ]);
        let leaf = reader.get("events/a/leaf.json").unwrap();
        assert_eq!(leaf["name"], json!("leaf"));
        assert_eq!(leaf["caption"], json!("M"));
        assert_eq!(leaf["uid"], json!(1));
        assert!(leaf.get("extends").is_none());
    }

    #[test]
    fn extends_cycle_terminates() {
        let (reader, collector) = resolve_documents(vec![
            ("events/a/one.json", json!({"extends": "two", "name": "one"})),
            ("events/a/two.json", json!({"extends": "one", "name": "two"})),
        ]);
        assert_eq!(collector.count_kind(ErrorKind::InclusionCycle), 1);
        assert!(reader.get("events/a/one.json").unwrap().get("extends").is_none());
        assert!(reader.get("events/a/two.json").unwrap().get("extends").is_none());
    }

    #[test]
    fn unresolved_extends_keeps_directive_and_reports() {
        let (reader, collector) = resolve_documents(vec![(
            "events/a/child.json",
            json!({"extends": "ghost", "name": "c"}),
        )]);
        assert_eq!(collector.count_kind(ErrorKind::UnresolvedExtends), 1);
        assert_eq!(
            reader.get("events/a/child.json").unwrap()["extends"],
            json!("ghost")
        );
    }

    // === dictionary ===

    #[test]
    fn dictionary_details_merge_into_attributes() {
        let (reader, _) = resolve_documents(vec![
            (
                "objects/thing.json",
                json!({
                    "name": "thing",
                    "caption": "Thing",
                    "description": "",
                    "attributes": {"foo": {"requirement": "required"}}
                }),
            ),
            (
                "dictionary.json",
                json!({
                    "name": "dictionary",
                    "caption": "d",
                    "description": "",
                    "attributes": {
                        "foo": {"type": "string_t"},
                        "bar": {"type": "integer_t"}
                    }
                }),
            ),
        ]);
        let attrs = &reader.get("objects/thing.json").unwrap()["attributes"];
        assert_eq!(
            attrs["foo"],
            json!({"requirement": "required", "type": "string_t"})
        );
        // Unreferenced dictionary entries are not pulled in.
        assert!(attrs.get("bar").is_none());
    }

    #[test]
    fn record_detail_wins_over_dictionary() {
        let (reader, _) = resolve_documents(vec![
            (
                "objects/thing.json",
                json!({
                    "name": "thing", "caption": "t", "description": "",
                    "attributes": {"foo": {"name": "renamed"}}
                }),
            ),
            (
                "dictionary.json",
                json!({
                    "name": "dictionary", "caption": "d", "description": "",
                    "attributes": {"foo": {"name": "foo", "caption": "Foo"}}
                }),
            ),
        ]);
        let foo = &reader.get("objects/thing.json").unwrap()["attributes"]["foo"];
        assert_eq!(foo["name"], json!("renamed"));
        assert_eq!(foo["caption"], json!("Foo"));
    }

    #[test]
    fn extension_dictionary_takes_precedence() {
        let (reader, _) = resolve_documents(vec![
            (
                "extensions/e/objects/thing.json",
                json!({
                    "name": "thing", "caption": "t", "description": "",
                    "attributes": {"foo": {}}
                }),
            ),
            (
                "extensions/e/dictionary.json",
                json!({
                    "name": "e", "caption": "e", "description": "",
                    "attributes": {"foo": {"type": "long_t", "group": "ext"}}
                }),
            ),
            (
                "dictionary.json",
                json!({
                    "name": "dictionary", "caption": "d", "description": "",
                    "attributes": {"foo": {"type": "string_t", "caption": "Foo"}}
                }),
            ),
        ]);
        let foo = &reader.get("extensions/e/objects/thing.json").unwrap()["attributes"]["foo"];
        assert_eq!(foo["type"], json!("long_t"));
        assert_eq!(foo["group"], json!("ext"));
        // Keys only the root dictionary has still arrive.
        assert_eq!(foo["caption"], json!("Foo"));
    }

    #[test]
    fn dictionary_itself_is_not_rewritten() {
        let dict = json!({
            "name": "dictionary", "caption": "d", "description": "",
            "attributes": {"foo": {"type": "string_t"}}
        });
        let (reader, _) = resolve_documents(vec![("dictionary.json", dict.clone())]);
        assert_eq!(reader.get("dictionary.json").unwrap(), &dict);
    }

    // === whole-run properties ===

    #[test]
    fn resolution_is_idempotent() {
        let docs = vec![
            (
                "events/a/child.json",
                json!({"extends": "parent", "name": "c", "profiles": "p", "attributes": {"foo": {}}}),
            ),
            ("events/a/parent.json", json!({"name": "p", "caption": "P", "attributes": {}})),
            ("profiles/p.json", json!({"attributes": {"mixin": {}}})),
            (
                "dictionary.json",
                json!({"name": "d", "caption": "d", "description": "", "attributes": {"foo": {"type": "string_t"}}}),
            ),
        ];
        let (reader, _) = resolve_documents(docs);
        let snapshot: Vec<(String, Value)> = reader
            .keys()
            .map(|k| (k.to_string(), reader.get(k).unwrap().clone()))
            .collect();

        // Resolving the already-resolved tree from scratch must change
        // nothing and report nothing.
        let mut second = Reader::from_documents(snapshot.clone());
        let mut collector = Collector::default();
        resolve(&mut second, &mut collector);

        assert!(collector.is_empty());
        for (key, before) in snapshot {
            assert_eq!(second.get(&key).unwrap(), &before, "changed: {key}");
        }
    }

    #[test]
    fn host_keys_survive_resolution_byte_identical() {
        let (reader, _) = resolve_documents(vec![
            (
                "events/a/child.json",
                json!({"extends": "parent", "name": "c", "uid": 7, "attributes": {"x": {"requirement": "required"}}}),
            ),
            (
                "events/a/parent.json",
                json!({"name": "p", "uid": 99, "attributes": {"x": {"requirement": "optional"}}}),
            ),
        ]);
        let child = reader.get("events/a/child.json").unwrap();
        assert_eq!(child["name"], json!("c"));
        assert_eq!(child["uid"], json!(7));
        assert_eq!(child["attributes"]["x"]["requirement"], json!("required"));
    }
}
