use anyhow::{Context, Result};
use owo_colors::Style;

use super::report;
use crate::cli::{AppContext, CleanArgs};
use crate::core::cleanup::accept_all_revisions;
use crate::core::container::DocxPackage;
use crate::infra::io::sibling_path;

/// `ortk clean`: accept every tracked change and save a clean copy
pub fn run(args: CleanArgs, ctx: &AppContext) -> Result<()> {
    let mut package = DocxPackage::open(&args.document)
        .with_context(|| format!("Failed to open {}", args.document.display()))?;
    let accepted = accept_all_revisions(&mut package);
    let output = args.output.unwrap_or_else(|| sibling_path(&args.document, "_limpio"));

    if ctx.dry_run {
        if !ctx.quiet {
            println!(
                "{} accept {accepted} revisions into {}",
                report::paint(ctx, "DRY RUN: Would", Style::new().yellow()),
                output.display()
            );
        }
        return Ok(());
    }

    package
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    if !ctx.quiet {
        println!(
            "{} Accepted {accepted} revisions, saved to {}",
            report::paint(ctx, "✓", Style::new().green()),
            output.display()
        );
    }
    Ok(())
}
