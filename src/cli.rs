use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::model::Category;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "ortk")]
#[command(
    about = "Orthotypographic checker that writes approved corrections into .docx files as tracked changes"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Do everything except writing output files
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// More log output on stderr (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a document and list correction candidates
    Analyze(AnalyzeArgs),

    /// Write approved corrections into a copy of the document
    Apply(ApplyArgs),

    /// Show the deletion/insertion each approved correction would produce
    Preview(PreviewArgs),

    /// Accept every existing tracked change
    Clean(CleanArgs),

    /// Initialize an ortotrack.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Document to analyze (.docx)
    pub document: PathBuf,

    /// Write the candidates to this session file
    #[arg(short, long)]
    pub session: Option<PathBuf>,

    /// JSON array of extra candidates from an external checker
    #[arg(long)]
    pub external: Option<PathBuf>,

    /// Only list candidates of these categories
    #[arg(long = "category", value_enum)]
    pub categories: Vec<Category>,

    /// Output results in JSON format (single line)
    #[arg(long)]
    pub json: bool,
}

/// Which candidates are approved
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("approval").required(true).args(["all", "approve", "approve_file"])))]
pub struct ApprovalArgs {
    /// Approve every candidate
    #[arg(long)]
    pub all: bool,

    /// Candidate ids, e.g. "0,3,7" or "2-5"
    #[arg(long, value_name = "IDS")]
    pub approve: Option<String>,

    /// File listing candidate ids separated by commas or whitespace
    #[arg(long, value_name = "FILE")]
    pub approve_file: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct ApplyArgs {
    /// Document to correct (.docx)
    pub document: PathBuf,

    /// Output path (default: <stem>_tc.docx, or <stem>_corregido.docx with --untracked)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Session file from `analyze --session`; re-analyzes when omitted
    #[arg(short, long)]
    pub session: Option<PathBuf>,

    #[command(flatten)]
    pub approval: ApprovalArgs,

    /// Revision author (overrides config)
    #[arg(long)]
    pub author: Option<String>,

    /// Write corrected text directly instead of tracked changes
    #[arg(long)]
    pub untracked: bool,

    /// Replace every occurrence of a correction's span in its paragraph
    #[arg(long)]
    pub all_occurrences: bool,

    /// Output results in JSON format (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct PreviewArgs {
    /// Document to preview (.docx)
    pub document: PathBuf,

    /// Session file from `analyze --session`; re-analyzes when omitted
    #[arg(short, long)]
    pub session: Option<PathBuf>,

    #[command(flatten)]
    pub approval: ApprovalArgs,

    /// Replace every occurrence of a correction's span in its paragraph
    #[arg(long)]
    pub all_occurrences: bool,

    /// Output results in JSON format (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct CleanArgs {
    /// Document whose revisions are accepted (.docx)
    pub document: PathBuf,

    /// Output path (default: <stem>_limpio.docx)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; required unless --stdout is set
    #[arg(long, conflicts_with = "stdout")]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_requires_an_approval() {
        assert!(Cli::try_parse_from(["ortk", "apply", "a.docx"]).is_err());
        assert!(Cli::try_parse_from(["ortk", "apply", "a.docx", "--all", "--approve", "1"]).is_err());
        let cli = Cli::try_parse_from(["ortk", "-vv", "apply", "a.docx", "--approve", "0,2"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Apply(args) = cli.command else { panic!("expected apply") };
        assert_eq!(args.approval.approve.as_deref(), Some("0,2"));
    }
}
