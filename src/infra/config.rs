use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::apply::ReplacePolicy;
use crate::core::encode::{DEFAULT_AUTHOR, InsertStyle};
use crate::core::tables::TableOverrides;

/// Config file names, first existing one wins
const CONFIG_FILES: [&str; 4] =
    ["ortotrack.toml", "ortotrack.yaml", "ortotrack.json", ".ortotrack.toml"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Revision metadata and highlight of inserted text
    pub revision: RevisionConfig,

    /// Which rules run and how corrections are composed
    pub analysis: AnalysisConfig,

    /// Entries merged over the built-in lookup tables
    pub tables: TableOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisionConfig
{
    pub author: String,
    pub insert_color: String,
    pub underline: String,
}

impl Default for RevisionConfig
{
    fn default() -> Self
    {
        let style = InsertStyle::default();
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            insert_color: style.color,
            underline: style.underline,
        }
    }
}

impl RevisionConfig
{
    pub fn insert_style(&self) -> InsertStyle
    {
        InsertStyle { color: self.insert_color.clone(), underline: self.underline.clone() }
    }

    /// `insert_color` is `auto` or six hex digits, as `w:color` expects
    fn validate(&self) -> Result<()>
    {
        let color = self.insert_color.as_str();
        let is_hex = color.len() == 6 && color.chars().all(|c| c.is_ascii_hexdigit());
        if color != "auto" && !is_hex
        {
            anyhow::bail!(
                "revision.insert_color must be six hex digits (e.g. 0000FF) or auto, got '{color}'"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig
{
    /// Keep capitalized calendar words that look like part of a name
    pub proper_name_guard: bool,

    /// Rule names to skip
    pub disabled_rules: Vec<String>,

    pub replace_policy: ReplacePolicy,
}

impl Default for AnalysisConfig
{
    fn default() -> Self
    {
        Self {
            proper_name_guard: true,
            disabled_rules: Vec::new(),
            replace_policy: ReplacePolicy::FirstOccurrence,
        }
    }
}

pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

/// Load the config file found in `dir`, then `ORTOTRACK__SECTION__KEY` variables
pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    for name in CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("ORTOTRACK")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("analysis.disabled_rules")
            // Values stay strings: a color like 000000 must not become 0
            .try_parsing(false),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;
    parsed
        .revision
        .validate()?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("ortotrack.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let toml_string =
        toml::to_string_pretty(&Config::default()).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        print!("{toml_string}");
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
