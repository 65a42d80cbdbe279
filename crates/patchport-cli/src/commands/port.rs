//! Port command: relocate a whole patch set.

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use patchport::{
    GroupFailure, GroupOutcome, GroupResult, PortJob, RelocationConfig, RelocationReport,
};
use tracing::debug;

use super::hex_utils::format_hex_offset;
use crate::cli::PortArgs;

/// Run the port command
pub fn run(args: &PortArgs) -> Result<()> {
    let (Some(game_code), Some(old_module), Some(new_module)) =
        (&args.game_code, &args.old_module, &args.new_module)
    else {
        bail!("Usage: patchport <GAME_CODE> <OLD_MODULE> <NEW_MODULE>");
    };

    let mut config = match &args.config {
        Some(path) => RelocationConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RelocationConfig::default(),
    };
    if let Some(margin) = args.max_margin {
        config.max_margin = margin;
    }
    if let Some(clamp) = args.clamp {
        config.clamp = clamp;
    }
    debug!("Relocation settings: {:?}", config);

    let summary = PortJob::new(game_code, old_module, new_module, &args.patch_dir)
        .with_config(config)
        .dry_run(args.dry_run)
        .run()?;

    println!("{} -> {}", summary.old_fingerprint, summary.new_fingerprint);
    println!();
    print_report(&summary.report);

    if let Some(path) = &summary.output_path {
        println!("New patches written to '{}'", path.display());
    }

    Ok(())
}

fn print_report(report: &RelocationReport) {
    for result in &report.results {
        if let GroupOutcome::Relocated(moves) = &result.outcome {
            println!("{} found!", group_label(result).green());
            for m in moves {
                println!(
                    "  {} -> {}",
                    format_hex_offset(m.from),
                    format_hex_offset(m.to)
                );
            }
        }
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!();
        for (result, failure) in failures {
            println!("{}", failure_line(result, failure).yellow());
        }
    }

    println!();
    println!("{}", summary_line(report).bold());
}

fn group_label(result: &GroupResult) -> String {
    match result.kind {
        Some(kind) => format!("[{}] '{}'", kind, result.name),
        None => format!("[?] '{}'", result.name),
    }
}

fn failure_line(result: &GroupResult, failure: &GroupFailure) -> String {
    match failure {
        // The failure names the offending sub-patch itself
        GroupFailure::Incompatible { .. } => format!("{} {}", group_label(result), failure),
        _ => format!("{}: {}", group_label(result), failure),
    }
}

fn summary_line(report: &RelocationReport) -> String {
    format!(
        "Results: [{}/{}] found, {:.2}% success rate!",
        report.relocated(),
        report.total(),
        report.success_rate()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchport::{GroupKind, PatchSet};
    use patchport::relocate::Incompatibility;

    fn result(kind: Option<GroupKind>, name: &str, outcome: GroupOutcome) -> GroupResult {
        GroupResult {
            kind,
            name: name.to_string(),
            outcome,
        }
    }

    #[test]
    fn test_failure_lines() {
        let partial = result(
            Some(GroupKind::Memory),
            "Skip intro",
            GroupOutcome::Failed(GroupFailure::Partial {
                resolved: 2,
                total: 3,
            }),
        );
        let failure = partial.failure().unwrap();
        assert_eq!(
            failure_line(&partial, failure),
            "[Memory] 'Skip intro': not found (2/3)"
        );

        let incompatible = result(
            Some(GroupKind::Union),
            "Region",
            GroupOutcome::Failed(GroupFailure::Incompatible {
                entry: "US".to_string(),
                reason: Incompatibility::LengthMismatch,
            }),
        );
        let failure = incompatible.failure().unwrap();
        assert_eq!(
            failure_line(&incompatible, failure),
            "[Union] 'Region' 'US': incompatible (sub-patch data length mismatch)"
        );
    }

    #[test]
    fn test_summary_line() {
        let report = RelocationReport {
            output: PatchSet::default(),
            results: vec![
                result(Some(GroupKind::Number), "A", GroupOutcome::Relocated(Vec::new())),
                result(Some(GroupKind::Number), "B", GroupOutcome::Failed(GroupFailure::NotFound)),
                result(Some(GroupKind::Number), "C", GroupOutcome::Failed(GroupFailure::NotFound)),
            ],
        };
        assert_eq!(summary_line(&report), "Results: [1/3] found, 33.33% success rate!");
    }

    #[test]
    fn test_unrecognized_label() {
        let unknown = result(
            None,
            "",
            GroupOutcome::Failed(GroupFailure::Unrecognized("missing field `type`".to_string())),
        );
        assert_eq!(group_label(&unknown), "[?] ''");
    }
}
