//! OCSF Schema Lint
//!
//! Validation for working copies of an [OCSF](https://schema.ocsf.io/)
//! schema definition tree.
//!
//! OCSF distributes its metaschema as JSON fragments that reference each
//! other through `$include`, `extends`, `profiles`, and an implicit
//! attribute dictionary, so individual files are partial and cannot be
//! checked in isolation. This crate loads the whole tree into a [`Reader`],
//! expands every reuse directive in place with [`resolve`], and then runs
//! structural checks over the fully-merged records: required keys, unknown
//! keys, unused and undefined dictionary attributes, and name collisions.
//!
//! Diagnostics carry a configurable [`Severity`] per kind and accumulate in
//! a [`Collector`]; nothing short of a fatal problem stops a run.
//!
//! # Example
//!
//! ```no_run
//! use ocsf_lint::{run, RunOptions};
//!
//! let report = run(&RunOptions::new("path/to/ocsf-schema"));
//! for (severity, err) in report.entries() {
//!     eprintln!("{severity} {err}");
//! }
//! std::process::exit(report.exit_code());
//! ```
//!
//! # Resolution order
//!
//! The resolver runs four passes in a fixed order: `$include` expansion,
//! `profiles` application, `extends` inheritance, then the dictionary
//! merge. All merging is host-wins: a record's own values are never
//! overwritten by content merged into it.

mod errors;
mod matcher;
mod reader;
mod resolver;
mod runner;
mod types;
mod validators;

pub use errors::{
    Collector, CollectorMode, ErrorKind, Severity, SeverityMap, ValidationError,
};
pub use matcher::{
    category_of_event, classify, in_extension, is_category, is_dictionary, is_event,
    is_extension, is_include, is_object, is_profile, strip_extension_prefix,
};
pub use reader::{BaseMatch, Reader};
pub use resolver::{deep_merge, resolve};
pub use runner::{run, Diagnostic, RunOptions, RunReport};
pub use types::{
    json_type_name, RecordType, TypeSpec, ATTRIBUTES_KEY, EXTENDS_KEY, INCLUDE_KEY,
    PROFILES_KEY,
};
pub use validators::{
    validate_all, validate_name_collisions, validate_required_keys,
    validate_undefined_attributes, validate_unknown_keys, validate_unused_attributes,
};
