//! Run orchestration: load, resolve, validate, and summarize.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::errors::{Collector, CollectorMode, Severity, SeverityMap, ValidationError};
use crate::matcher;
use crate::reader::Reader;
use crate::resolver;
use crate::types::RecordType;
use crate::validators;

/// Configuration for a single validation run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Root directory of the schema working copy.
    pub schema_path: PathBuf,
    /// Per-kind severity overrides, applied before the run starts.
    pub severities: SeverityMap,
    /// Stop after the first FATAL instead of collecting everything.
    pub fail_fast: bool,
}

impl RunOptions {
    pub fn new(schema_path: impl Into<PathBuf>) -> Self {
        Self {
            schema_path: schema_path.into(),
            severities: SeverityMap::new(),
            fail_fast: false,
        }
    }
}

/// One diagnostic in machine-readable form.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable kind name, e.g. `unresolved-include`.
    pub kind: &'static str,
    /// Path key the diagnostic is anchored to, when it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

/// Outcome of a validation run.
#[derive(Debug)]
pub struct RunReport {
    entries: Vec<(Severity, ValidationError)>,
}

impl RunReport {
    /// All diagnostics in the order they were recorded.
    pub fn entries(&self) -> &[(Severity, ValidationError)] {
        &self.entries
    }

    /// Number of diagnostics recorded at `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|(s, _)| *s == severity).count()
    }

    /// Non-zero counts per severity, most severe first.
    pub fn counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for (severity, _) in &self.entries {
            *counts.entry(*severity).or_insert(0) += 1;
        }
        counts
    }

    /// The diagnostics as serializable values, in recorded order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.entries
            .iter()
            .map(|(severity, err)| Diagnostic {
                severity: *severity,
                kind: err.kind().name(),
                path: err.path().map(str::to_owned),
                message: err.to_string(),
            })
            .collect()
    }

    /// Whether anything at ERROR or above was recorded.
    pub fn failed(&self) -> bool {
        self.entries.iter().any(|(s, _)| *s >= Severity::Error)
    }

    pub fn exit_code(&self) -> i32 {
        if self.failed() {
            1
        } else {
            0
        }
    }
}

/// Execute a full validation run.
///
/// Phases run in a fixed order: load, classification check, resolution,
/// validation. In fail-fast mode a FATAL diagnostic ends the run at the
/// next phase boundary; partially-resolved state is discarded with the
/// reader either way.
pub fn run(options: &RunOptions) -> RunReport {
    let mode = if options.fail_fast {
        CollectorMode::FailFast
    } else {
        CollectorMode::Deferred
    };
    let mut collector = Collector::new(options.severities.clone(), mode);

    let mut reader = Reader::load(&options.schema_path, &mut collector);

    if !collector.should_abort() {
        // Every loaded file must classify before the resolver and the
        // validators can reason about it.
        let unknown: Vec<String> = reader
            .keys()
            .filter(|key| matcher::classify(key) == RecordType::Unknown)
            .map(str::to_owned)
            .collect();
        for path in unknown {
            collector.report(ValidationError::UndetectableType { path });
        }
    }

    if !collector.should_abort() {
        resolver::resolve(&mut reader, &mut collector);
    }

    if !collector.should_abort() {
        validators::validate_all(&reader, &mut collector);
    }

    RunReport {
        entries: collector.into_entries(),
    }
}
