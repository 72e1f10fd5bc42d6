use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use threadline_core::logging::{self, sanitize_path};
use threadline_core::{Config, InboundEvent};
use threadline_transcript::{RecordingSink, TranscriptEngine};

/// Threadline - incremental chat transcript layout
#[derive(Parser, Debug)]
#[command(name = "threadline")]
#[command(about = "Replay chat events through the transcript engine", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to threadline.toml (default: ./threadline.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Local account id, used when no config file exists
    #[arg(short, long, value_name = "ACCOUNT")]
    account: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a JSON-lines event log through a fresh transcript
    Replay {
        /// Event log, one JSON event per line
        #[arg(required = true, value_name = "EVENTS")]
        events: PathBuf,

        /// What to print once all events are applied
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Outline)]
        format: OutputFormat,

        /// Width reported for embedded frames
        #[arg(long, value_name = "PX", default_value_t = 640)]
        frame_width: u32,
    },
    /// Print an example configuration
    ExampleConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Rendered markup
    Markup,
    /// One line per block, marker or presence block
    Outline,
    /// Every mutation sent to the view, as JSON lines
    Mutations,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::ExampleConfig = cli.command {
        print!("{}", Config::example());
        return Ok(());
    }

    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from("threadline.toml"));
    let config = load_config(&config_path, cli.account.as_deref())?;

    let mut logging_config = logging::LoggingConfig::from(config.logging.clone());
    if cli.verbose {
        logging_config = logging_config.with_level("debug");
    }
    let _guard = logging::init_logging(Some(logging_config)).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Replay { events, format, frame_width } => {
            let output = cmd_replay(&config, &events, format, frame_width, cli.verbose)?;
            println!("{}", output);
        }
        Commands::ExampleConfig => {}
    }

    Ok(())
}

/// Load config from file, or fall back to defaults for `account`
fn load_config(path: &Path, account: Option<&str>) -> Result<Config> {
    if path.exists() {
        eprintln!("{} Loading config from {}", "Info:".green().bold(), sanitize_path(path));
        let mut config =
            Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        if let Some(account) = account {
            config.account = account.to_string();
        }
        return Ok(config);
    }

    let Some(account) = account else {
        anyhow::bail!(
            "No config at {}. Pass --account or create one with `threadline example-config > threadline.toml`",
            sanitize_path(path)
        );
    };
    Ok(Config::for_account(account))
}

/// Replay an event log and render the result
fn cmd_replay(config: &Config, events: &Path, format: OutputFormat, frame_width: u32, verbose: bool) -> Result<String> {
    let input = std::fs::read_to_string(events)
        .with_context(|| format!("Failed to read events from {}", sanitize_path(events)))?;

    let sink = RecordingSink::new().with_frame_width(frame_width);
    let mut engine = TranscriptEngine::from_config(config, sink).context("Invalid display settings")?;

    let mut applied = 0usize;
    let mut skipped = 0usize;
    for parsed in InboundEvent::parse_lines(&input) {
        match parsed {
            Ok(event) => {
                engine.handle(event);
                applied += 1;
            }
            Err(e) => {
                eprintln!("{} {}", "Warning:".yellow().bold(), e);
                skipped += 1;
            }
        }
    }

    if verbose {
        eprintln!(
            "{} Applied {} event(s), skipped {}, {} message(s) in transcript",
            "Info:".blue().bold(),
            applied,
            skipped,
            engine.timeline().len()
        );
    }

    let output = match format {
        OutputFormat::Markup => engine.snapshot().context("Failed to render markup")?,
        OutputFormat::Outline => engine.outline(),
        OutputFormat::Mutations => {
            let lines = engine
                .sink()
                .mutations
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to encode mutations")?;
            lines.join("\n")
        }
    };

    Ok(output)
}
