//! Human and JSON rendering for command results.

use indexmap::IndexMap;
use owo_colors::{OwoColorize, Style};
use serde_json::json;
use tabled::settings::Style as TableStyle;
use tabled::{Table, Tabled};

use crate::cli::AppContext;
use crate::core::apply::ApplyReport;
use crate::core::encode::EditSplit;
use crate::core::model::{Category, Correction};

/// Spanish display name of a category
pub fn display_name(category: Category) -> &'static str {
    match category {
        Category::Spelling => "Ortografía",
        Category::Typography => "Ortotipografía",
        Category::Capitalization => "Mayúsculas incorrectas",
        Category::Abbreviation => "Abreviaturas",
        Category::Acronym => "Siglas",
        Category::Numbers => "Formato de números",
        Category::Punctuation => "Puntuación",
        Category::ForeignWord => "Extranjerismos",
        Category::PassiveVoice => "Voz pasiva",
        Category::Gerund => "Gerundios incorrectos",
        Category::Queismo => "Queísmo",
        Category::Dequeismo => "Dequeísmo",
        Category::Laismo => "Laísmo",
        Category::Loismo => "Loísmo",
        Category::VagueTerm => "Uso de «cosa»",
        Category::Redundancy => "Redundancias",
    }
}

/// Apply `style` unless colors are off
pub fn paint(ctx: &AppContext, text: &str, style: Style) -> String {
    if ctx.no_color { text.to_string() } else { text.style(style).to_string() }
}

/// Show invisible characters that corrections often touch
pub fn visible(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{a0}' => '⍽',
            '\t' => '→',
            '\n' => '↵',
            c => c,
        })
        .collect()
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Categoría")]
    category: &'static str,
    #[tabled(rename = "Candidatos")]
    count: usize,
}

pub fn counts_table(counts: &IndexMap<Category, usize>) -> String {
    let rows: Vec<CountRow> = counts
        .iter()
        .map(|(&category, &count)| CountRow { category: display_name(category), count })
        .collect();
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    table.to_string()
}

pub fn print_candidates(ctx: &AppContext, candidates: &[&Correction]) {
    for c in candidates {
        let id = paint(ctx, &format!("#{:<4}", c.id), Style::new().bold());
        let place = paint(ctx, &format!("¶{}", c.paragraph_index), Style::new().dimmed());
        let change = if c.is_advisory() {
            paint(ctx, &format!("«{}»", visible(&c.original_span)), Style::new().yellow())
        } else {
            format!(
                "{} → {}",
                paint(ctx, &format!("«{}»", visible(&c.original_span)), Style::new().red()),
                paint(ctx, &format!("«{}»", visible(&c.replacement_span)), Style::new().green()),
            )
        };
        println!("{id} {place} [{}] {change}", display_name(c.category));
        println!("      {} ({:.2})", c.explanation, c.confidence);
    }
}

pub fn candidates_json(candidates: &[&Correction], counts: &IndexMap<Category, usize>) -> String {
    json!({
        "total": candidates.len(),
        "counts": counts,
        "candidates": candidates,
    })
    .to_string()
}

pub fn print_apply_report(ctx: &AppContext, report: &ApplyReport) {
    let ok = paint(ctx, "✓", Style::new().green());
    println!(
        "{ok} {} corrections written to {} paragraphs ({} revision marks)",
        report.corrections_applied.len(),
        report.paragraphs_modified,
        report.revision_marks.len()
    );
    if report.revisions_accepted > 0 {
        println!("  accepted {} existing revisions first", report.revisions_accepted);
    }
    let warn = Style::new().yellow();
    if !report.corrections_unmatched.is_empty() {
        println!(
            "  {} {:?}",
            paint(ctx, "not found in their paragraph:", warn),
            report.corrections_unmatched
        );
    }
    if !report.advisory_skipped.is_empty() {
        println!("  {} {:?}", paint(ctx, "advisory, not applied:", warn), report.advisory_skipped);
    }
    if !report.out_of_range.is_empty() {
        println!("  {} {:?}", paint(ctx, "paragraph out of range:", warn), report.out_of_range);
    }
    for failure in &report.encoding_failures {
        println!(
            "  {} ¶{}: {}",
            paint(ctx, "left unmodified", Style::new().red()),
            failure.paragraph_index,
            failure.error
        );
    }
}

pub fn print_split(ctx: &AppContext, index: usize, split: &EditSplit<'_>) {
    println!("{}", paint(ctx, &format!("¶{index}"), Style::new().bold()));
    let context = Style::new().dimmed();
    println!(
        "  {}{}{}{}",
        paint(ctx, &visible(split.prefix), context),
        paint(ctx, &format!("[-{}-]", visible(split.deleted)), Style::new().red()),
        paint(ctx, &format!("{{+{}+}}", visible(split.inserted)), Style::new().green()),
        paint(ctx, &visible(split.suffix), context),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_a_name() {
        let names: Vec<&str> = Category::ALL.iter().map(|&c| display_name(c)).collect();
        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_no_color_is_plain() {
        let ctx = AppContext { quiet: false, no_color: true, dry_run: false };
        assert_eq!(paint(&ctx, "x", Style::new().red()), "x");
        assert_eq!(visible("25\u{a0}%"), "25⍽%");
    }

    #[test]
    fn test_counts_table_uses_display_names() {
        let mut counts = IndexMap::new();
        counts.insert(Category::Typography, 2);
        let table = counts_table(&counts);
        assert!(table.contains("Ortotipografía"));
        assert!(table.contains('2'));
    }
}
