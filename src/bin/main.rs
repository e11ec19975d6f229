//! NOARK5 to RDF CLI
//!
//! Command-line tool for converting NOARK5 XML documents to NTriples and
//! for generating config templates.

use std::path::{Path, PathBuf};
use std::thread;

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use noark5_rdf::logging::init_tracing;
use noark5_rdf::{
    convert_directory, convert_to_directory, write_template, Config, ConfigOverrides,
    ConvertError,
};

const DEFAULT_LOGLEVEL: &str = "INFO";
const DEFAULT_LOGFILE: &str = "noark5-rdf.log";
const GENERATOR_LOGFILE: &str = "generateconfig.log";

#[derive(Parser)]
#[command(name = "noark5-rdf")]
#[command(about = "Convert NOARK5 XML documents into NTriples RDF")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single XML document
    Convert(ConvertArgs),
    /// Convert every XML document in the input directory
    Batch(BatchArgs),
    /// Generate a config template by sampling an XML document
    GenerateConfig(GenerateArgs),
}

#[derive(Args)]
struct LogArgs {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR) [default: INFO]
    #[arg(short = 'l', long)]
    loglevel: Option<String>,

    /// Log file, in addition to stdout
    #[arg(short = 'f', long)]
    logfile: Option<PathBuf>,
}

#[derive(Args)]
struct ConvertArgs {
    /// XML document to convert
    #[arg(short, long)]
    input: PathBuf,

    /// Config file
    #[arg(short, long, default_value = "config/config.yaml")]
    config: PathBuf,

    /// Directory for the generated .nt files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[command(flatten)]
    log: LogArgs,
}

#[derive(Args)]
struct BatchArgs {
    /// Config file
    #[arg(short, long, default_value = "config/config.yaml")]
    config: PathBuf,

    /// Directory to read XML documents from
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory for the generated .nt files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory converted documents are moved to
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Poll the input directory every SECS seconds
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    #[command(flatten)]
    log: LogArgs,
}

#[derive(Args)]
struct GenerateArgs {
    /// XML document to sample
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the YAML template
    #[arg(short, long, default_value = "config.yaml")]
    output: PathBuf,

    #[command(flatten)]
    log: LogArgs,
}

/// Start logging; a failure here is reported but never fatal
fn start_logging(level: Option<&str>, logfile: &Path) {
    if let Err(e) = init_tracing(Some(level.unwrap_or(DEFAULT_LOGLEVEL)), Some(logfile)) {
        eprintln!("Could not initialize logging: {}", e);
    }
}

/// Load the config, apply command-line overrides and start logging
fn prepare(path: &Path, overrides: ConfigOverrides) -> Result<Config, ConvertError> {
    let mut config = Config::load(path)?;
    config.apply_overrides(&overrides);
    config.resolve_paths_from_env()?;

    let logfile = config
        .logfile
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGFILE));
    start_logging(config.loglevel.as_deref(), &logfile);

    // Config::load ran before a subscriber existed
    if !path.is_file() {
        warn!(
            "Could not find config file '{}'. Using defaults.",
            path.display()
        );
    }

    config.ensure_directories()?;
    Ok(config)
}

fn run_convert(args: ConvertArgs) -> Result<(), ConvertError> {
    let config = prepare(
        &args.config,
        ConfigOverrides {
            output_dir: args.output_dir,
            logfile: args.log.logfile,
            loglevel: args.log.loglevel,
            ..Default::default()
        },
    )?;

    let stats = convert_to_directory(&args.input, &config)?;
    eprintln!(
        "Converted {}: {} files, {} triples",
        args.input.display(),
        stats.files_written,
        stats.triples
    );
    Ok(())
}

fn run_batch(args: BatchArgs) -> Result<(), ConvertError> {
    let config = prepare(
        &args.config,
        ConfigOverrides {
            input_dir: args.input_dir,
            output_dir: args.output_dir,
            backup_dir: args.backup_dir,
            logfile: args.log.logfile,
            loglevel: args.log.loglevel,
            interval: args.interval,
        },
    )?;

    loop {
        let report = convert_directory(&config)?;
        info!(
            "Converted {} documents ({} failed), {} files, {} triples",
            report.converted.len(),
            report.failed.len(),
            report.stats.files_written,
            report.stats.triples
        );

        match config.poll_interval() {
            Some(interval) => {
                info!(
                    "Next scan of {} in {} seconds",
                    config.input_dir.display(),
                    interval.as_secs()
                );
                thread::sleep(interval);
            }
            None => return Ok(()),
        }
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), ConvertError> {
    let logfile = args
        .log
        .logfile
        .unwrap_or_else(|| PathBuf::from(GENERATOR_LOGFILE));
    start_logging(args.log.loglevel.as_deref(), &logfile);

    let config = write_template(&args.input, &args.output)?;
    eprintln!(
        "Wrote config template with {} object elements to {}",
        config.object_elements.len(),
        args.output.display()
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert(args) => run_convert(args),
        Commands::Batch(args) => run_batch(args),
        Commands::GenerateConfig(args) => run_generate(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
