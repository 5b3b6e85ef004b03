use anyhow::Result;
use clap::Parser;
use ortotrack::cli::{AppContext, Cli, Commands};
use ortotrack::cli_ext::{analyze_cmd, apply_cmd, clean_cmd};

fn main() -> Result<()> {
    let cli = Cli::parse();

    ortotrack::infra::logging::init(cli.verbose, cli.no_color);

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Analyze(args) => analyze_cmd::run(args, &ctx),
        Commands::Apply(args) => apply_cmd::run(args, &ctx),
        Commands::Preview(args) => apply_cmd::preview(args, &ctx),
        Commands::Clean(args) => clean_cmd::run(args, &ctx),
        Commands::Init(args) => ortotrack::infra::config::init(args, &ctx),
        Commands::Completions(args) => ortotrack::completion::run(args, &ctx),
    }
}
