//! Diagnostics, severities, and the error collector.
//!
//! Every structural problem the tool can report is a variant of
//! [`ValidationError`]. Severity is attached per [`ErrorKind`], not per
//! instance, and is fixed before a run starts. The [`Collector`] accumulates
//! diagnostics in insertion order; nothing in the resolver or validators
//! unwinds on a non-fatal problem.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Diagnostic severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suppressed entirely.
    Ignore,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// Tag used in report output.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Ignore => "IGNORE",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(Severity::Ignore),
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(format!(
                "unknown severity \"{other}\": expected fatal, error, warning, info, or ignore"
            )),
        }
    }
}

/// Structural problems found while loading, resolving, or validating a
/// schema tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{path} is not valid JSON: {message}")]
    InvalidJson { path: String, message: String },

    #[error("schema base path \"{path}\" is missing or not a directory")]
    InvalidBasePath { path: String },

    #[error("missing include target '{target}' in {path}")]
    UnresolvedInclude { path: String, target: String },

    #[error("missing base record '{target}' in {path}")]
    UnresolvedExtends { path: String, target: String },

    #[error("missing profile '{target}' in {path}")]
    UnresolvedProfile { path: String, target: String },

    #[error("directive cycle through '{target}' in {path}")]
    InclusionCycle { path: String, target: String },

    #[error("missing required key `{key}` at `{trail}` in {path}")]
    MissingRequiredKey {
        path: String,
        key: String,
        trail: String,
    },

    #[error("unrecognized key `{key}` at `{trail}` in {path}")]
    UnknownKey {
        path: String,
        key: String,
        trail: String,
    },

    #[error("dictionary attribute `{attr}` is used by no record")]
    UnusedAttribute { attr: String },

    #[error("attribute `{attr}` in {path} is not defined in the dictionary")]
    UndefinedAttribute { path: String, attr: String },

    #[error("{record_type} name `{name}` in {path} collides with {other}")]
    NameCollision {
        path: String,
        name: String,
        record_type: String,
        other: String,
    },

    #[error("base record '{target}' for {path} found in sibling category at {found}")]
    SiblingInheritance {
        path: String,
        target: String,
        found: String,
    },

    #[error("profile '{target}' in {path} is both listed and included")]
    RedundantProfileInclude { path: String, target: String },

    #[error("unable to detect the record type of {path}")]
    UndetectableType { path: String },
}

impl ValidationError {
    /// The kind used for severity lookup.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::InvalidJson { .. } => ErrorKind::InvalidJson,
            ValidationError::InvalidBasePath { .. } => ErrorKind::InvalidBasePath,
            ValidationError::UnresolvedInclude { .. } => ErrorKind::UnresolvedInclude,
            ValidationError::UnresolvedExtends { .. } => ErrorKind::UnresolvedExtends,
            ValidationError::UnresolvedProfile { .. } => ErrorKind::UnresolvedProfile,
            ValidationError::InclusionCycle { .. } => ErrorKind::InclusionCycle,
            ValidationError::MissingRequiredKey { .. } => ErrorKind::MissingRequiredKey,
            ValidationError::UnknownKey { .. } => ErrorKind::UnknownKey,
            ValidationError::UnusedAttribute { .. } => ErrorKind::UnusedAttribute,
            ValidationError::UndefinedAttribute { .. } => ErrorKind::UndefinedAttribute,
            ValidationError::NameCollision { .. } => ErrorKind::NameCollision,
            ValidationError::SiblingInheritance { .. } => ErrorKind::SiblingInheritance,
            ValidationError::RedundantProfileInclude { .. } => {
                ErrorKind::RedundantProfileInclude
            }
            ValidationError::UndetectableType { .. } => ErrorKind::UndetectableType,
        }
    }

    /// The path key the diagnostic is anchored to, when it has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidJson { path, .. }
            | ValidationError::InvalidBasePath { path }
            | ValidationError::UnresolvedInclude { path, .. }
            | ValidationError::UnresolvedExtends { path, .. }
            | ValidationError::UnresolvedProfile { path, .. }
            | ValidationError::InclusionCycle { path, .. }
            | ValidationError::MissingRequiredKey { path, .. }
            | ValidationError::UnknownKey { path, .. }
            | ValidationError::UndefinedAttribute { path, .. }
            | ValidationError::NameCollision { path, .. }
            | ValidationError::SiblingInheritance { path, .. }
            | ValidationError::RedundantProfileInclude { path, .. }
            | ValidationError::UndetectableType { path } => Some(path),
            ValidationError::UnusedAttribute { .. } => None,
        }
    }
}

/// Diagnostic kinds, used to attach severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidJson,
    InvalidBasePath,
    UnresolvedInclude,
    UnresolvedExtends,
    UnresolvedProfile,
    InclusionCycle,
    MissingRequiredKey,
    UnknownKey,
    UnusedAttribute,
    UndefinedAttribute,
    NameCollision,
    SiblingInheritance,
    RedundantProfileInclude,
    UndetectableType,
}

impl ErrorKind {
    /// Stable kebab-case name used in machine-readable output.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::InvalidJson => "invalid-json",
            ErrorKind::InvalidBasePath => "invalid-base-path",
            ErrorKind::UnresolvedInclude => "unresolved-include",
            ErrorKind::UnresolvedExtends => "unresolved-extends",
            ErrorKind::UnresolvedProfile => "unresolved-profile",
            ErrorKind::InclusionCycle => "inclusion-cycle",
            ErrorKind::MissingRequiredKey => "missing-required-key",
            ErrorKind::UnknownKey => "unknown-key",
            ErrorKind::UnusedAttribute => "unused-attribute",
            ErrorKind::UndefinedAttribute => "undefined-attribute",
            ErrorKind::NameCollision => "name-collision",
            ErrorKind::SiblingInheritance => "sibling-inheritance",
            ErrorKind::RedundantProfileInclude => "redundant-profile-include",
            ErrorKind::UndetectableType => "undetectable-type",
        }
    }

    /// Severity applied when no override is configured.
    pub fn default_severity(&self) -> Severity {
        match self {
            ErrorKind::InvalidJson
            | ErrorKind::InvalidBasePath
            | ErrorKind::UndetectableType => Severity::Fatal,
            ErrorKind::UnresolvedInclude
            | ErrorKind::UnresolvedExtends
            | ErrorKind::UnresolvedProfile
            | ErrorKind::InclusionCycle => Severity::Error,
            ErrorKind::MissingRequiredKey
            | ErrorKind::UnknownKey
            | ErrorKind::UnusedAttribute
            | ErrorKind::UndefinedAttribute
            | ErrorKind::NameCollision
            | ErrorKind::SiblingInheritance
            | ErrorKind::RedundantProfileInclude => Severity::Warning,
        }
    }
}

/// Per-kind severity configuration, fixed before a run starts.
#[derive(Debug, Clone, Default)]
pub struct SeverityMap {
    overrides: HashMap<ErrorKind, Severity>,
}

impl SeverityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the severity of a kind.
    pub fn set(&mut self, kind: ErrorKind, severity: Severity) {
        self.overrides.insert(kind, severity);
    }

    /// The effective severity of a kind.
    pub fn severity(&self, kind: ErrorKind) -> Severity {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_severity())
    }
}

/// How the collector reacts to fatal diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorMode {
    /// Accumulate everything; the caller inspects the result at the end.
    Deferred,
    /// Accumulate, but signal the caller to stop after the first FATAL.
    FailFast,
}

/// Accumulates diagnostics with their effective severities.
///
/// Entries keep insertion order. Diagnostics whose kind is configured as
/// `Severity::Ignore` are dropped on arrival.
#[derive(Debug)]
pub struct Collector {
    severities: SeverityMap,
    mode: CollectorMode,
    entries: Vec<(Severity, ValidationError)>,
}

impl Collector {
    pub fn new(severities: SeverityMap, mode: CollectorMode) -> Self {
        Self {
            severities,
            mode,
            entries: Vec::new(),
        }
    }

    /// Record a diagnostic at its configured severity.
    pub fn report(&mut self, err: ValidationError) {
        let severity = self.severities.severity(err.kind());
        if severity == Severity::Ignore {
            return;
        }
        self.entries.push((severity, err));
    }

    pub fn entries(&self) -> &[(Severity, ValidationError)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of recorded diagnostics at or above `severity`.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|(s, _)| *s >= severity).count()
    }

    pub fn has_fatal(&self) -> bool {
        self.count_at_least(Severity::Fatal) > 0
    }

    /// Whether the run should stop now instead of continuing to the next
    /// phase. Only fail-fast collectors ever abort.
    pub fn should_abort(&self) -> bool {
        self.mode == CollectorMode::FailFast && self.has_fatal()
    }

    /// Count how many recorded diagnostics match a kind. Used by tests.
    pub fn count_kind(&self, kind: ErrorKind) -> usize {
        self.entries.iter().filter(|(_, e)| e.kind() == kind).count()
    }

    pub fn into_entries(self) -> Vec<(Severity, ValidationError)> {
        self.entries
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(SeverityMap::new(), CollectorMode::Deferred)
    }
}
