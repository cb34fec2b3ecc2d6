//! Record types and the declarative key table for OCSF definition files.

use serde_json::Value;

/// Directive key that pulls another file's content into the host document.
pub const INCLUDE_KEY: &str = "$include";

/// Directive key naming a base record to inherit from.
pub const EXTENDS_KEY: &str = "extends";

/// Directive key listing profile mix-ins.
pub const PROFILES_KEY: &str = "profiles";

/// The attribute container key shared by most record types.
pub const ATTRIBUTES_KEY: &str = "attributes";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Semantic category of a schema definition file, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// The shared attribute catalog (`dictionary.json`).
    Dictionary,
    /// The category index (`categories.json`).
    Category,
    /// An event class under `events/`.
    Event,
    /// A shared object under `objects/`.
    Object,
    /// A reusable mix-in under `profiles/`.
    Profile,
    /// An extension marker (`extensions/<name>/extension.json`).
    Extension,
    /// A reusable fragment under `includes/`, referenced only by `$include`.
    Include,
    /// The schema version marker (`version.json`).
    Version,
    /// Anything the matcher cannot classify.
    Unknown,
}

impl RecordType {
    /// Human-readable name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            RecordType::Dictionary => "dictionary",
            RecordType::Category => "category",
            RecordType::Event => "event",
            RecordType::Object => "object",
            RecordType::Profile => "profile",
            RecordType::Extension => "extension",
            RecordType::Include => "include",
            RecordType::Version => "version",
            RecordType::Unknown => "unknown",
        }
    }

    /// The declared key set for this record type, or `None` for `Unknown`.
    pub fn spec(&self) -> Option<&'static TypeSpec> {
        match self {
            RecordType::Dictionary => Some(&DICTIONARY),
            RecordType::Category => Some(&CATEGORIES),
            RecordType::Event => Some(&EVENT),
            RecordType::Object => Some(&OBJECT),
            RecordType::Profile => Some(&PROFILE),
            RecordType::Extension => Some(&EXTENSION),
            RecordType::Include => Some(&INCLUDE),
            RecordType::Version => Some(&VERSION),
            RecordType::Unknown => None,
        }
    }

    /// Whether records of this type pull attribute details from the
    /// dictionary during resolution.
    pub fn merges_dictionary(&self) -> bool {
        matches!(
            self,
            RecordType::Event | RecordType::Object | RecordType::Profile | RecordType::Include
        )
    }
}

/// Declared keys for one record type.
///
/// This is the authoritative input to the required-keys and unknown-keys
/// checks: `required` must all be present, anything outside `required` and
/// `optional` is unknown, and `attributes` (when set) is the record spec
/// each entry of the `attributes` container must satisfy.
#[derive(Debug)]
pub struct TypeSpec {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub attributes: Option<&'static TypeSpec>,
}

impl TypeSpec {
    /// Whether `key` is declared by this spec.
    pub fn allows(&self, key: &str) -> bool {
        self.required.contains(&key) || self.optional.contains(&key)
    }

    /// All declared top-level keys.
    pub fn declared(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.required.iter().chain(self.optional.iter()).copied()
    }
}

/// A single attribute entry. Nothing is required; most fields arrive from
/// the dictionary merge.
pub static ATTRIBUTE: TypeSpec = TypeSpec {
    required: &[],
    optional: &[
        "$include",
        "caption",
        "default",
        "description",
        "enum",
        "group",
        "is_array",
        "max_len",
        "name",
        "notes",
        "observable",
        "profile",
        "range",
        "regex",
        "requirement",
        "sibling",
        "type",
        "type_name",
        "values",
        "@deprecated",
    ],
    attributes: None,
};

/// A single category entry inside `categories.json`.
pub static CATEGORY: TypeSpec = TypeSpec {
    required: &["caption", "description", "uid"],
    optional: &["@deprecated"],
    attributes: None,
};

static EVENT: TypeSpec = TypeSpec {
    required: &["caption", "name", "attributes"],
    optional: &[
        "uid",
        "category",
        "description",
        "extends",
        "profiles",
        "associations",
        "constraints",
        "$include",
        "@deprecated",
    ],
    attributes: Some(&ATTRIBUTE),
};

static OBJECT: TypeSpec = TypeSpec {
    required: &["caption", "description", "name", "attributes"],
    optional: &[
        "extends",
        "observable",
        "profiles",
        "constraints",
        "$include",
        "@deprecated",
    ],
    attributes: Some(&ATTRIBUTE),
};

static DICTIONARY: TypeSpec = TypeSpec {
    required: &["attributes", "caption", "description", "name"],
    optional: &["types"],
    attributes: Some(&ATTRIBUTE),
};

static CATEGORIES: TypeSpec = TypeSpec {
    required: &["attributes", "caption", "description", "name"],
    optional: &[],
    attributes: Some(&CATEGORY),
};

static PROFILE: TypeSpec = TypeSpec {
    required: &[
        "caption",
        "description",
        "meta",
        "name",
        "annotations",
        "attributes",
    ],
    optional: &["$include"],
    attributes: Some(&ATTRIBUTE),
};

static INCLUDE: TypeSpec = TypeSpec {
    required: &["caption", "attributes"],
    optional: &["description", "annotations"],
    attributes: Some(&ATTRIBUTE),
};

static EXTENSION: TypeSpec = TypeSpec {
    required: &["uid", "name", "path", "caption"],
    optional: &["version", "description"],
    attributes: None,
};

static VERSION: TypeSpec = TypeSpec {
    required: &["version"],
    optional: &[],
    attributes: None,
};
