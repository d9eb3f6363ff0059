//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use madforge_core::{ConversionResult, ConvertRequest, ProgressReporter};
use madforge_parsers::ParserRegistry;
use madforge_shared::{AppConfig, ConversionStats, ConvertSettings, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// MadForge: turn parsed documents into MAD knowledge bundles.
#[derive(Parser)]
#[command(
    name = "madforge",
    version,
    about = "Convert documents into content-addressed MAD bundles with entities and embeddings.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert a document (path or URL) into a MAD bundle.
    Convert {
        /// Source file path or http(s) URL.
        source: String,

        /// Output directory (defaults to <source stem>_mad next to the source).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Document title (extracted from the document when omitted).
        #[arg(short, long)]
        title: Option<String>,

        /// Document author (extracted from the document when omitted).
        #[arg(short, long)]
        author: Option<String>,

        /// Embedding model: hashing, hashing-<dims>, or none.
        #[arg(short, long, env = "MADFORGE_EMBEDDING_MODEL")]
        embedding_model: Option<String>,

        /// Entity tagger model: patterns or none.
        #[arg(short = 's', long, env = "MADFORGE_TAGGER_MODEL")]
        tagger_model: Option<String>,
    },

    /// Check a bundle directory: required files, version and content hash.
    Validate {
        /// Bundle directory.
        dir: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Default filter directive for a `-v` count.
pub(crate) fn filter_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "madforge=warn",
        1 => "madforge=info",
        2 => "madforge=debug",
        _ => "madforge=trace",
    }
}

/// Initialize tracing based on CLI flags. `RUST_LOG` takes precedence.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for(cli.verbose)));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert {
            source,
            output,
            title,
            author,
            embedding_model,
            tagger_model,
        } => {
            let request = ConvertRequest {
                source,
                output_dir: output,
                title,
                author,
            };
            cmd_convert(&request, embedding_model, tagger_model).await
        }
        Command::Validate { dir } => cmd_validate(&dir),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Merge CLI model overrides into the configured settings.
pub(crate) fn merge_settings(
    config: &AppConfig,
    embedding_model: Option<String>,
    tagger_model: Option<String>,
) -> ConvertSettings {
    let mut settings = ConvertSettings::from(config);
    if let Some(model) = embedding_model {
        settings.embedding_model = model;
    }
    if let Some(model) = tagger_model {
        settings.tagger_model = model;
    }
    settings
}

async fn cmd_convert(
    request: &ConvertRequest,
    embedding_model: Option<String>,
    tagger_model: Option<String>,
) -> Result<()> {
    let config = load_config()?;
    let settings = merge_settings(&config, embedding_model, tagger_model);

    info!(
        source = %request.source,
        embedding_model = %settings.embedding_model,
        tagger_model = %settings.tagger_model,
        "converting document"
    );

    let capabilities =
        madforge_nlp::capabilities_for(&settings.embedding_model, &settings.tagger_model);
    let registry = ParserRegistry::new();
    let reporter = CliProgress::new();

    let result = match madforge_core::convert(
        request,
        &registry,
        &capabilities,
        &settings,
        &reporter,
    )
    .await
    {
        Ok(result) => result,
        Err(e) => {
            reporter.spinner.finish_and_clear();
            return Err(e.into());
        }
    };

    println!();
    println!("  Conversion successful!");
    println!("  Title:     {}", result.title);
    println!("  Document:  {}", result.document_id);
    println!("  Hash:      {}", result.content_hash);
    println!("  Output:    {}", result.output_dir.display());
    println!("  Script:    {}", result.script_path.display());
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    print_stats(&result.stats);
    println!();

    Ok(())
}

fn cmd_validate(dir: &Path) -> Result<()> {
    let report = madforge_core::validate_bundle(dir)?;

    println!();
    println!("  Bundle is valid.");
    println!("  Title:     {}", report.title);
    println!("  Document:  {}", report.document_id);
    println!("  Hash:      {}", report.content_hash);
    print_stats(&report.stats);
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_stats(stats: &ConversionStats) {
    println!("  Statistics:");
    println!("    pages:         {}", stats.pages);
    println!("    text_chunks:   {}", stats.text_chunks);
    println!("    tables:        {}", stats.tables);
    println!("    images:        {}", stats.images);
    println!("    headings:      {}", stats.headings);
    println!("    entities:      {}", stats.entities);
    println!("    relationships: {}", stats.relationships);
    println!("    embeddings:    {}", stats.embeddings);
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &ConversionResult) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_convert_flags() {
        let cli = Cli::try_parse_from([
            "madforge", "-vv", "convert", "paper.json", "-o", "out", "-t", "Paper", "-a", "Ada",
            "-e", "none", "-s", "patterns",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Convert {
                source,
                output,
                title,
                author,
                embedding_model,
                tagger_model,
            } => {
                assert_eq!(source, "paper.json");
                assert_eq!(output, Some(PathBuf::from("out")));
                assert_eq!(title.as_deref(), Some("Paper"));
                assert_eq!(author.as_deref(), Some("Ada"));
                assert_eq!(embedding_model.as_deref(), Some("none"));
                assert_eq!(tagger_model.as_deref(), Some("patterns"));
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn parses_validate_and_config() {
        let cli = Cli::try_parse_from(["madforge", "validate", "bundle_mad"]).unwrap();
        assert!(matches!(cli.command, Command::Validate { .. }));

        let cli = Cli::try_parse_from(["madforge", "--log-format", "json", "config", "show"])
            .unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn convert_requires_source() {
        assert!(Cli::try_parse_from(["madforge", "convert"]).is_err());
    }

    #[test]
    fn verbosity_maps_to_filters() {
        assert_eq!(filter_for(0), "madforge=warn");
        assert_eq!(filter_for(1), "madforge=info");
        assert_eq!(filter_for(2), "madforge=debug");
        assert_eq!(filter_for(7), "madforge=trace");
    }

    #[test]
    fn cli_models_override_config() {
        let config = AppConfig::default();
        let settings = merge_settings(&config, Some("none".into()), None);
        assert_eq!(settings.embedding_model, "none");
        assert_eq!(settings.tagger_model, config.tagger.model);
    }
}
