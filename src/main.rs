use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;

use pipeline::{Analysis, AnalysisOptions};
use report::{PlainReporter, ReportOptions, Reporter};

mod aggregator;
mod config;
mod debug_log;
mod loader;
mod pipeline;
mod ranking;
mod report;
mod tui;
mod types;
mod utils;

#[derive(Parser)]
#[command(name = "chatstats")]
#[command(version)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Print the charts as plain text instead of running the TUI
    #[arg(long)]
    plain: bool,

    /// Output stats as JSON instead of drawing charts
    #[arg(long)]
    json: bool,

    /// Use comma-separated number formatting
    #[arg(long)]
    number_comma: bool,

    /// Use human-readable number formatting (k, m, b, t)
    #[arg(short = 'H', long)]
    number_human: bool,

    /// Locale for number formatting (en, de, fr, es, it, ja, ko, zh)
    #[arg(long)]
    locale: Option<String>,

    /// Number of decimal places for averages and human-readable numbers
    #[arg(long)]
    decimal_places: Option<usize>,
}

#[derive(Args, Clone, Default)]
struct AnalysisArgs {
    /// Directory with one subdirectory per conversation
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Scan at most this many conversation directories
    #[arg(long, global = true)]
    max_conversations: Option<usize>,

    /// Minimum number of messages for a conversation to be analyzed
    #[arg(short, long, global = true)]
    threshold: Option<usize>,

    /// Index of the conversation to chart, in ranked order
    #[arg(short, long, global = true)]
    conversation: Option<usize>,

    /// IANA time zone used for time-of-day charts (defaults to the system zone)
    #[arg(long, global = true)]
    timezone: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Output conversation statistics as JSON
    Stats(StatsArgs),
    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Args)]
struct StatsArgs {
    /// Include stats for every retained conversation, not just the selected one
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Pretty-print JSON instead of a single line
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    subcommand: ConfigSubcommands,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Create default configuration file
    Init {
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key (messages-dir, archive-file, max-conversations, message-threshold,
        /// conversation, histogram-bins, top-words, timezone, number-comma, number-human,
        /// locale, decimal-places)
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Settings for one run after merging CLI flags over the config file.
struct Settings {
    analysis: AnalysisOptions,
    conversation: usize,
    report: ReportOptions,
    format_options: utils::NumberFormatOptions,
}

impl Settings {
    fn resolve(
        args: &AnalysisArgs,
        config: &config::Config,
        format_options: utils::NumberFormatOptions,
    ) -> Result<Self> {
        let messages_dir = match &args.dir {
            Some(dir) => dir.clone(),
            None => PathBuf::from(&config.analysis.messages_dir),
        };
        let messages_dir = if messages_dir.is_relative() {
            std::env::current_dir()
                .context("Could not determine the current directory")?
                .join(messages_dir)
        } else {
            messages_dir
        };

        let timezone_name = args
            .timezone
            .as_deref()
            .unwrap_or(&config.display.timezone);

        Ok(Self {
            analysis: AnalysisOptions {
                messages_dir,
                archive_file: config.analysis.archive_file.clone(),
                max_conversations: args
                    .max_conversations
                    .unwrap_or(config.analysis.max_conversations),
                message_threshold: args.threshold.unwrap_or(config.analysis.message_threshold),
            },
            conversation: args.conversation.unwrap_or(config.analysis.conversation),
            report: ReportOptions {
                histogram_bins: config.analysis.histogram_bins.max(1),
                top_words: config.analysis.top_words,
                timezone: utils::resolve_timezone(timezone_name)?,
            },
            format_options,
        })
    }
}

fn main() {
    let cli = Cli::parse();
    debug_log::init();

    // Load config file to get defaults
    let config = config::Config::load_or_default();

    // Create format options merging config defaults with CLI overrides
    let format_options = utils::NumberFormatOptions {
        use_comma: cli.number_comma || config.display.number_comma,
        use_human: cli.number_human || config.display.number_human,
        locale: cli.locale.unwrap_or(config.display.locale.clone()),
        decimal_places: cli
            .decimal_places
            .unwrap_or(config.display.decimal_places),
    };

    let result = match cli.command {
        None => Settings::resolve(&cli.analysis, &config, format_options).and_then(|settings| {
            if cli.json {
                run_stats(
                    &settings,
                    &StatsArgs {
                        all: false,
                        pretty: true,
                    },
                )
            } else {
                run_default(&settings, cli.plain)
            }
        }),
        Some(Commands::Stats(stats_args)) => {
            Settings::resolve(&cli.analysis, &config, format_options)
                .and_then(|settings| run_stats(&settings, &stats_args))
        }
        Some(Commands::Config(config_args)) => handle_config_subcommand(config_args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run_default(settings: &Settings, plain: bool) -> Result<()> {
    let analysis = pipeline::run_analysis(&settings.analysis, &mut io::stdout())?;
    let stats = analysis.select(settings.conversation)?;

    let mut reporter: Box<dyn Reporter> = if plain {
        Box::new(PlainReporter::new(io::stdout(), settings.format_options.clone()))
    } else {
        let title = format!(
            " {} ({} messages) ",
            stats.conversation_id, stats.raw_message_count
        );
        Box::new(tui::TuiReporter::new(title, settings.format_options.clone()))
    };

    report::render_report(reporter.as_mut(), stats, &settings.report)
        .context("Failed to render charts")
}

fn run_stats(settings: &Settings, args: &StatsArgs) -> Result<()> {
    // Progress goes to stderr so stdout stays valid JSON.
    let analysis: Analysis = pipeline::run_analysis(&settings.analysis, &mut io::stderr())?;
    let export = analysis.export(if args.all {
        None
    } else {
        Some(settings.conversation)
    })?;

    if args.pretty {
        let json = simd_json::to_string_pretty(&export)?;
        println!("{json}");
    } else {
        let json = simd_json::to_string(&export)?;
        println!("{json}");
    }

    Ok(())
}

fn handle_config_subcommand(config_args: ConfigArgs) -> Result<()> {
    match config_args.subcommand {
        ConfigSubcommands::Init { overwrite } => {
            config::create_default_config(overwrite).context("Error creating config")
        }
        ConfigSubcommands::Show => config::show_config().context("Error showing config"),
        ConfigSubcommands::Set { key, value } => {
            config::set_config_value(&key, &value).context("Error setting config")
        }
    }
}
