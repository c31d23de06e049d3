use std::path::PathBuf;

use clap::{ArgAction, Parser};
use env_logger::Env;
use log::{LevelFilter, SetLoggerError};
use vocab_convert::{convert, Config, Error};

fn main() {
    if let Err(err) = run() {
        eprintln!("conversion failed: {}", err);
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Convert a Hugging Face BPE tokenizer into a SentencePiece model",
    long_about = None
)]
struct Args {
    #[arg(
        short,
        long,
        value_name = "DIR",
        required_unless_present = "config",
        help = "Directory containing tokenizer_config.json and tokenizer.json"
    )]
    input: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "PATH",
        required_unless_present = "config",
        help = "Path of the SentencePiece model to write"
    )]
    output: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "PATH",
        conflicts_with_all = ["input", "output"],
        help = "JSON conversion config file"
    )]
    config: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Also write a JSON manifest here")]
    manifest: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, action = ArgAction::Count)]
    quiet: u8,
}

fn run() -> Result<(), Error> {
    let args = Args::parse();
    if let Err(err) = init_logging(args.verbose, args.quiet) {
        log::warn!("logger already installed, keeping it: {err}");
    }

    let mut cfg = match (args.config, args.input, args.output) {
        (Some(path), _, _) => Config::from_path(path)?,
        (None, Some(input), Some(output)) => Config::new(input, output),
        _ => {
            return Err(Error::InvalidConfig(
                "either --config or both --input and --output are required".into(),
            ))
        }
    };
    if let Some(manifest) = args.manifest {
        cfg = cfg.with_manifest(manifest);
    }

    let summary = convert(&cfg)?;
    println!(
        "{} pieces ({} vocabulary, {} added) -> {}",
        summary.piece_count,
        summary.vocab_entries,
        summary.added_emitted,
        cfg.output.model.display()
    );
    Ok(())
}

fn log_level(verbose: u8, quiet: u8) -> Option<LevelFilter> {
    match (verbose, quiet) {
        (0, 0) => None,
        (_, 1) => Some(LevelFilter::Warn),
        (_, q) if q > 1 => Some(LevelFilter::Error),
        (1, _) => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    }
}

fn init_logging(verbose: u8, quiet: u8) -> Result<(), SetLoggerError> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    if let Some(level) = log_level(verbose, quiet) {
        builder.filter_level(level);
    }
    builder.try_init()
}
