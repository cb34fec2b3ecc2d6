//! OCSF Schema Lint CLI
//!
//! Command-line interface for resolving and validating an OCSF schema
//! working copy.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ocsf_lint::{run, ErrorKind, RunOptions, RunReport, Severity, SeverityMap};

fn parse_severity(s: &str) -> Result<Severity, String> {
    s.parse()
}

/// Validate OCSF schema definitions.
///
/// Resolves every $include, extends, profiles, and dictionary reference in
/// the tree, then checks the fully-merged records for structural problems.
/// Each severity flag accepts: fatal, error, warning, info, or ignore.
#[derive(Parser)]
#[command(name = "ocsf-lint", version, about)]
struct Cli {
    /// The OCSF schema root directory
    schema_path: PathBuf,

    /// Stop at the first fatal diagnostic instead of collecting everything
    #[arg(long)]
    fail_fast: bool,

    /// Disable ANSI colors in the report
    #[arg(long)]
    no_color: bool,

    /// Output format: text (default) or json
    #[arg(long, default_value = "text")]
    format: String,

    /// Severity of schema files that fail to parse
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    invalid_json: Option<Severity>,

    /// Severity of $include targets that cannot be found
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    unresolved_include: Option<Severity>,

    /// Severity of extends targets that cannot be found
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    unresolved_extends: Option<Severity>,

    /// Severity of profiles targets that cannot be found
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    unresolved_profile: Option<Severity>,

    /// Severity of cycles in the directive graph
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    inclusion_cycle: Option<Severity>,

    /// Severity of required keys missing after resolution
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    required_keys: Option<Severity>,

    /// Severity of keys outside a record type's declared set
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    unknown_keys: Option<Severity>,

    /// Severity of dictionary attributes no record uses
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    unused_attributes: Option<Severity>,

    /// Severity of attributes missing from the dictionary
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    undefined_attributes: Option<Severity>,

    /// Severity of records of one type sharing a name
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    name_collisions: Option<Severity>,

    /// Severity of extends resolved only through a sibling category
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    sibling_inheritance: Option<Severity>,

    /// Severity of profiles that are also $included
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    redundant_profiles: Option<Severity>,
}

impl Cli {
    fn severity_map(&self) -> SeverityMap {
        let mut map = SeverityMap::new();
        let overrides = [
            (ErrorKind::InvalidJson, self.invalid_json),
            (ErrorKind::UnresolvedInclude, self.unresolved_include),
            (ErrorKind::UnresolvedExtends, self.unresolved_extends),
            (ErrorKind::UnresolvedProfile, self.unresolved_profile),
            (ErrorKind::InclusionCycle, self.inclusion_cycle),
            (ErrorKind::MissingRequiredKey, self.required_keys),
            (ErrorKind::UnknownKey, self.unknown_keys),
            (ErrorKind::UnusedAttribute, self.unused_attributes),
            (ErrorKind::UndefinedAttribute, self.undefined_attributes),
            (ErrorKind::NameCollision, self.name_collisions),
            (ErrorKind::SiblingInheritance, self.sibling_inheritance),
            (
                ErrorKind::RedundantProfileInclude,
                self.redundant_profiles,
            ),
        ];
        for (kind, severity) in overrides {
            if let Some(severity) = severity {
                map.set(kind, severity);
            }
        }
        map
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut options = RunOptions::new(&cli.schema_path);
    options.severities = cli.severity_map();
    options.fail_fast = cli.fail_fast;

    let report = run(&options);

    if cli.format == "json" {
        let output = serde_json::json!({
            "valid": !report.failed(),
            "diagnostics": report.diagnostics(),
        });
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    } else {
        print_report(&report, !cli.no_color);
    }

    ExitCode::from(report.exit_code() as u8)
}

fn print_report(report: &RunReport, color: bool) {
    for (severity, err) in report.entries() {
        println!("{} {}", severity_tag(*severity, color), err);
    }

    if !report.entries().is_empty() {
        println!();
    }

    let summary = report
        .counts()
        .iter()
        .rev()
        .map(|(severity, count)| format!("{} {}", count, severity.label().to_lowercase()))
        .collect::<Vec<_>>()
        .join(", ");

    if report.failed() {
        let line = format!("✗ validation failed ({summary})");
        if color {
            println!("\x1b[31;1m{line}\x1b[0m");
        } else {
            println!("{line}");
        }
    } else {
        let line = if summary.is_empty() {
            "✓ schema is valid".to_string()
        } else {
            format!("✓ schema is valid ({summary})")
        };
        if color {
            println!("\x1b[32;1m{line}\x1b[0m");
        } else {
            println!("{line}");
        }
    }
}

fn severity_tag(severity: Severity, color: bool) -> String {
    if !color {
        return severity.label().to_string();
    }
    let code = match severity {
        Severity::Fatal | Severity::Error => "\x1b[31m",
        Severity::Warning => "\x1b[33m",
        Severity::Info | Severity::Ignore => "\x1b[36m",
    };
    format!("{code}{}\x1b[0m", severity.label())
}
