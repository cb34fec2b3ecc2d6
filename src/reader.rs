//! The in-memory schema tree and directive target search.
//!
//! A [`Reader`] maps normalized relative paths (forward-slash separated,
//! no leading slash) to parsed JSON documents. It is loaded once from the
//! filesystem, mutated by the resolver, and read by the validators. The
//! backing map is a `BTreeMap`, so every iteration is lexicographic and
//! reports are reproducible run to run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{Collector, ValidationError};
use crate::matcher;

/// Directory names the loader recurses into, mirroring the layout of an
/// OCSF working copy. Anything else at the top level (docs, CI config) is
/// not schema content.
const TRAVERSABLE_DIRS: &[&str] = &[
    "enums",
    "includes",
    "objects",
    "events",
    "profiles",
    "extensions",
];

/// Result of an `extends` target search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseMatch {
    /// Path key of the base record.
    pub key: String,
    /// True when the base was only found through the sibling-category
    /// secondary search.
    pub via_sibling: bool,
}

/// An in-memory copy of the raw schema definition tree.
#[derive(Debug, Default)]
pub struct Reader {
    documents: BTreeMap<String, Value>,
    resolved: bool,
}

impl Reader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a reader from already-parsed documents. Used by tests and by
    /// callers that assemble trees programmatically.
    pub fn from_documents<I, K>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            documents: documents
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
            resolved: false,
        }
    }

    /// Load every `.json` file under `root`.
    ///
    /// Parse failures and a missing root are reported to the collector as
    /// FATAL diagnostics rather than returned; the reader simply omits the
    /// affected documents. Symlinks are followed.
    pub fn load(root: &Path, collector: &mut Collector) -> Self {
        let mut reader = Self::new();

        if !root.is_dir() {
            collector.report(ValidationError::InvalidBasePath {
                path: root.display().to_string(),
            });
            return reader;
        }

        let mut files = Vec::new();
        collect_files(root, root, &mut files);
        files.sort();

        for file in files {
            let key = normalize_key(root, &file);
            let content = match fs::read_to_string(&file) {
                Ok(content) => content,
                Err(err) => {
                    collector.report(ValidationError::InvalidJson {
                        path: key,
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            match serde_json::from_str::<Value>(&content) {
                Ok(doc) if doc.is_object() => {
                    reader.set(key, doc);
                }
                Ok(doc) => {
                    collector.report(ValidationError::InvalidJson {
                        path: key,
                        message: format!(
                            "top-level value is {}, expected object",
                            crate::types::json_type_name(&doc)
                        ),
                    });
                }
                Err(err) => {
                    collector.report(ValidationError::InvalidJson {
                        path: key,
                        message: err.to_string(),
                    });
                }
            }
        }

        reader
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.documents.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, doc: Value) {
        self.documents.insert(key.into(), doc);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.documents.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// All path keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Documents whose path satisfies `predicate`, in lexicographic order.
    pub fn iter<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = (&'a str, &'a Value)>
    where
        P: Fn(&str) -> bool + 'a,
    {
        self.documents
            .iter()
            .filter(move |(k, _)| predicate(k.as_str()))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the resolver has already run to completion on this reader.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    /// Locate the target of a `$include` directive.
    ///
    /// For a fragment `f` referenced from a document in extension `e`, the
    /// search is `extensions/e/f`, then `f`; if `f` has no `.json` suffix
    /// the search repeats with the suffix appended.
    pub fn find_include(&self, fragment: &str, origin: &str) -> Option<String> {
        for candidate in with_json_suffix(fragment) {
            if let Some(ext) = matcher::in_extension(origin) {
                let key = format!("extensions/{ext}/{candidate}");
                if self.contains(&key) {
                    return Some(key);
                }
            }
            if self.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Locate the target of a `profiles` directive.
    ///
    /// Layered search: the extension's `profiles/` directory, the root
    /// `profiles/` directory, then the bare name under the extension root
    /// and the schema root, each with and without a `.json` suffix.
    pub fn find_profile(&self, name: &str, origin: &str) -> Option<String> {
        let extension = matcher::in_extension(origin);
        let mut candidates = Vec::new();

        if let Some(ext) = extension {
            candidates.extend(with_json_suffix(&format!("extensions/{ext}/profiles/{name}")));
        }
        candidates.extend(with_json_suffix(&format!("profiles/{name}")));
        if let Some(ext) = extension {
            candidates.extend(with_json_suffix(&format!("extensions/{ext}/{name}")));
        }
        candidates.extend(with_json_suffix(name));

        candidates.into_iter().find(|key| self.contains(key))
    }

    /// Locate the base record of an `extends` directive.
    ///
    /// Primary search: walk up the directory chain of the origin and, for
    /// documents inside an extension, the chain of the extension-stripped
    /// path, trying `<dir>/<name>.json` at each level (extension side
    /// first). Secondary search: sibling category directories, reported to
    /// the caller via `via_sibling` so it can warn. The origin itself is
    /// never a match.
    pub fn find_base(&self, name: &str, origin: &str) -> Option<BaseMatch> {
        let file = json_filename(name);

        // For extension documents the walk stops at the extension root;
        // the schema root is reached through the stripped chain instead.
        let ext_dirs = match matcher::in_extension(origin) {
            Some(ext) => {
                let ext_root = format!("extensions/{ext}");
                let below_root = format!("{ext_root}/");
                ancestor_dirs(origin)
                    .into_iter()
                    .take_while(|dir| *dir == ext_root || dir.starts_with(&below_root))
                    .collect()
            }
            None => ancestor_dirs(origin),
        };
        let stripped = matcher::strip_extension_prefix(origin);
        let root_dirs = if stripped == origin {
            Vec::new()
        } else {
            ancestor_dirs(stripped)
        };

        // Interleave the two chains level by level. For a document at the
        // schema root only one chain exists.
        let (primary, secondary) = if root_dirs.is_empty() {
            (ext_dirs, Vec::new())
        } else {
            (ext_dirs, root_dirs)
        };

        let levels = primary.len().max(secondary.len());
        let mut dirs = Vec::new();
        for i in 0..levels {
            if let Some(dir) = primary.get(i) {
                dirs.push(dir.clone());
            }
            if let Some(dir) = secondary.get(i) {
                dirs.push(dir.clone());
            }
        }

        for dir in &dirs {
            let candidate = join_key(dir, &file);
            if candidate != origin && self.contains(&candidate) {
                return Some(BaseMatch {
                    key: candidate,
                    via_sibling: false,
                });
            }
        }

        // Sibling categories: for each `events/<category>` level, try the
        // other category directories under the same `events/` root.
        for dir in &dirs {
            let Some((parent, _)) = dir.rsplit_once('/') else {
                continue;
            };
            if parent.rsplit('/').next() != Some("events") {
                continue;
            }
            let prefix = format!("{parent}/");
            let suffix = format!("/{file}");
            for key in self.documents.keys() {
                if key != origin
                    && key.starts_with(&prefix)
                    && key.ends_with(&suffix)
                    && key[prefix.len()..].matches('/').count() == 1
                {
                    return Some(BaseMatch {
                        key: key.clone(),
                        via_sibling: true,
                    });
                }
            }
        }

        None
    }
}

/// The fragment as given plus, when it lacks one, with `.json` appended.
fn with_json_suffix(fragment: &str) -> Vec<String> {
    let mut candidates = vec![fragment.to_string()];
    if !fragment.ends_with(".json") {
        candidates.push(format!("{fragment}.json"));
    }
    candidates
}

fn json_filename(name: &str) -> String {
    if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{name}.json")
    }
}

/// Ancestor directories of a path key, nearest first, ending with the
/// root (empty string).
fn ancestor_dirs(path: &str) -> Vec<String> {
    let mut dirs = Vec::new();
    let mut current = path;
    while let Some((dir, _)) = current.rsplit_once('/') {
        dirs.push(dir.to_string());
        current = dir;
    }
    dirs.push(String::new());
    dirs
}

fn join_key(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}

fn normalize_key(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Collect `.json` files: everything at the root, then recursively inside
/// the known schema container directories.
fn collect_files(dir: &Path, root: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if traversable(&path, root) {
                collect_files(&path, root, files);
            }
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

fn traversable(dir: &Path, _root: &Path) -> bool {
    // A container directory itself, or one level below a container (event
    // categories, extension roots).
    let name = dir.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if TRAVERSABLE_DIRS.contains(&name) {
        return true;
    }
    dir.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(|parent| TRAVERSABLE_DIRS.contains(&parent))
        .unwrap_or(false)
}
