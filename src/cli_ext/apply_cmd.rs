//! `ortk apply` and `ortk preview`.

use anyhow::{Context, Result};
use owo_colors::Style;
use serde_json::json;

use super::analyze_cmd::{approve, open_clean, resolve_candidates};
use super::report;
use crate::cli::{AppContext, ApplyArgs, PreviewArgs};
use crate::core::apply::{ApplyOptions, ReplacePolicy, apply_approved, plan_corrections};
use crate::core::container::DocxPackage;
use crate::core::encode::{EncodeMode, split};
use crate::core::model::Correction;
use crate::infra::config::{Config, load_config};
use crate::infra::io::sibling_path;

fn policy(all_occurrences: bool, config: &Config) -> ReplacePolicy {
    if all_occurrences { ReplacePolicy::AllOccurrences } else { config.analysis.replace_policy }
}

pub fn run(args: ApplyArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config()?;
    let mut set = resolve_candidates(&args.document, args.session.as_deref(), &config)?;
    approve(&mut set, &args.approval)?;

    let mode = if args.untracked { EncodeMode::Untracked } else { EncodeMode::Tracked };
    let output = args.output.clone().unwrap_or_else(|| {
        let suffix = match mode {
            EncodeMode::Tracked => "_tc",
            EncodeMode::Untracked => "_corregido",
        };
        sibling_path(&args.document, suffix)
    });

    let options = ApplyOptions {
        author: args.author.clone().unwrap_or_else(|| config.revision.author.clone()),
        insert_style: config.revision.insert_style(),
        mode,
        policy: policy(args.all_occurrences, &config),
        timestamp: None,
    };

    let mut package = DocxPackage::open(&args.document)
        .with_context(|| format!("Failed to open {}", args.document.display()))?;
    let outcome = apply_approved(&mut package, &set, &options);

    if !ctx.dry_run {
        package
            .save(&output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
    }

    if args.json {
        let out = json!({
            "output": output,
            "written": !ctx.dry_run,
            "report": outcome,
        });
        println!("{out}");
        return Ok(());
    }
    if ctx.quiet {
        return Ok(());
    }
    report::print_apply_report(ctx, &outcome);
    if ctx.dry_run {
        println!(
            "{} {}",
            report::paint(ctx, "DRY RUN: Would write", Style::new().yellow()),
            output.display()
        );
    } else {
        println!("  saved to {}", output.display());
    }
    Ok(())
}

pub fn preview(args: PreviewArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config()?;
    let mut set = resolve_candidates(&args.document, args.session.as_deref(), &config)?;
    approve(&mut set, &args.approval)?;

    let package = open_clean(&args.document)?;
    let approved: Vec<&Correction> = set.approved().collect();
    let plan = plan_corrections(&package.paragraphs(), &approved, policy(args.all_occurrences, &config));

    let mut entries = Vec::new();
    for step in plan.paragraphs.iter().filter(|p| p.is_change()) {
        let parts = split(&step.original, &step.corrected)
            .with_context(|| format!("Cannot split paragraph {}", step.index))?;
        entries.push((step, parts));
    }

    if args.json {
        let paragraphs: Vec<_> = entries
            .iter()
            .map(|(step, parts)| {
                json!({
                    "paragraph_index": step.index,
                    "prefix": parts.prefix,
                    "deleted": parts.deleted,
                    "inserted": parts.inserted,
                    "suffix": parts.suffix,
                    "applied": step.applied,
                    "unmatched": step.unmatched,
                })
            })
            .collect();
        let out = json!({
            "paragraphs": paragraphs,
            "advisory_skipped": plan.advisory_skipped,
            "out_of_range": plan.out_of_range,
        });
        println!("{out}");
        return Ok(());
    }

    if entries.is_empty() {
        if !ctx.quiet {
            println!("No paragraph would change");
        }
        return Ok(());
    }
    for (step, parts) in &entries {
        report::print_split(ctx, step.index, parts);
    }
    Ok(())
}
