//! `ortk analyze`: scan a document and list (or persist) its candidates.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::Style;
use tracing::{info, warn};

use super::report;
use crate::cli::{AnalyzeArgs, AppContext, ApprovalArgs};
use crate::core::aggregate::{Aggregator, CandidateSet};
use crate::core::cleanup::accept_all_revisions;
use crate::core::container::DocxPackage;
use crate::core::model::Correction;
use crate::core::rules::{NeighborCapitalGuard, NoGuard, ProperNameGuard, RuleEngine};
use crate::core::session::{AnalysisSession, load_external, parse_id_list};
use crate::core::tables::RuleTables;
use crate::infra::config::Config;

/// Engine configured from `[analysis]` and `[tables]`
pub(crate) fn build_aggregator(config: &Config) -> Result<Aggregator> {
    let tables = RuleTables::default().with_overrides(&config.tables);
    let guard: Box<dyn ProperNameGuard> = if config.analysis.proper_name_guard {
        Box::new(NeighborCapitalGuard)
    } else {
        Box::new(NoGuard)
    };
    let engine = RuleEngine::standard(&tables, guard).context("Failed to build rule engine")?;
    let (engine, unknown) = engine.without(&config.analysis.disabled_rules);
    for name in unknown {
        warn!(rule = %name, "disabled rule does not exist");
    }
    Ok(Aggregator::new(engine))
}

/// Open `document` with existing revisions accepted, as analysis sees it
pub(crate) fn open_clean(document: &Path) -> Result<DocxPackage> {
    let mut package = DocxPackage::open(document)
        .with_context(|| format!("Failed to open {}", document.display()))?;
    accept_all_revisions(&mut package);
    Ok(package)
}

pub(crate) fn analyze_document(document: &Path, config: &Config) -> Result<CandidateSet> {
    let package = open_clean(document)?;
    let aggregator = build_aggregator(config)?;
    Ok(aggregator.analyze(&package.paragraphs()))
}

/// Candidates from a session file, or a fresh deterministic analysis
pub(crate) fn resolve_candidates(
    document: &Path,
    session: Option<&Path>,
    config: &Config,
) -> Result<CandidateSet> {
    match session {
        Some(path) => {
            let session = AnalysisSession::load(path)?;
            session.verify(document)?;
            Ok(session.candidates)
        }
        None => analyze_document(document, config),
    }
}

/// Set approval flags from `--all`, `--approve` or `--approve-file`
pub(crate) fn approve(set: &mut CandidateSet, approval: &ApprovalArgs) -> Result<usize> {
    if approval.all {
        return Ok(set.approve_all());
    }
    let ids = match (&approval.approve, &approval.approve_file) {
        (Some(list), _) => parse_id_list(list)?,
        (None, Some(file)) => {
            let list = fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            parse_id_list(&list)?
        }
        (None, None) => Vec::new(),
    };
    Ok(set.approve(&ids)?)
}

pub fn run(args: AnalyzeArgs, ctx: &AppContext) -> Result<()> {
    let config = crate::infra::config::load_config()?;
    let mut set = analyze_document(&args.document, &config)?;

    if let Some(path) = &args.external {
        let external = load_external(path)?;
        let added = set.extend_external(external);
        info!(added, "external candidates merged");
    }

    if let Some(path) = &args.session {
        if ctx.dry_run {
            if !ctx.quiet {
                println!("{}", report::paint(ctx, "DRY RUN: Would write session:", Style::new().yellow()));
                println!("  {}", path.display());
            }
        } else {
            AnalysisSession::new(&args.document, set.clone())?.save(path)?;
            info!(path = %path.display(), "session written");
        }
    }

    let shown: Vec<&Correction> = set
        .iter()
        .filter(|c| args.categories.is_empty() || args.categories.contains(&c.category))
        .collect();
    let counts = set.counts();

    if args.json {
        println!("{}", report::candidates_json(&shown, &counts));
        return Ok(());
    }
    if ctx.quiet {
        return Ok(());
    }

    if set.is_empty() {
        println!("{} No candidates in {}", report::paint(ctx, "✓", Style::new().green()), args.document.display());
        return Ok(());
    }
    println!("{}", report::counts_table(&counts));
    println!();
    report::print_candidates(ctx, &shown);
    if let Some(path) = &args.session {
        if !ctx.dry_run {
            println!("\nSession saved to {}", path.display());
        }
    }
    Ok(())
}
