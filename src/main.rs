use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use stock_merge::io::persist::{DirectoryPersist, local_now};
use stock_merge::io::source::FileSources;
use stock_merge::model::SourceKind;
use stock_merge::normalize::us::OrphanPolicy;
use stock_merge::sync::{self, MergeOptions};
use stock_merge::{MergeError, Result};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose).and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| MergeError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Merge(args) => execute_merge(args),
    }
}

fn execute_merge(args: MergeArgs) -> Result<()> {
    for (kind, path) in [(SourceKind::Cn, &args.cn), (SourceKind::Us, &args.us)] {
        match path {
            None => return Err(MergeError::NoSourceSelected(kind)),
            Some(path) if !path.exists() => {
                return Err(MergeError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("input file not found: {}", path.display()),
                )));
            }
            Some(_) => {}
        }
    }

    let sources = FileSources::new(args.cn.clone(), args.us.clone());
    let mut sink = DirectoryPersist::new(&args.output_dir);
    let options = MergeOptions {
        orphans: args.orphans.into(),
    };

    let report = sync::run(&sources, &mut sink, local_now(), options)?;

    for warning in &report.outcome.warnings {
        eprintln!("warning: {warning}");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.outcome.records)?);
    } else if args.print {
        print!("{}", report.outcome.text);
    }

    if let Some(path) = sink.written() {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Merge CN and US inventory exports into one sorted CSV."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize both exports and write the merged dataset.
    Merge(MergeArgs),
}

#[derive(clap::Args)]
struct MergeArgs {
    /// CN export (flat `item,quantity` rows).
    #[arg(long)]
    cn: Option<PathBuf>,

    /// US export (`Parent:Child` rows roll up into `Parent`).
    #[arg(long)]
    us: Option<PathBuf>,

    /// Directory the timestamped output file is written to.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Echo the merged CSV to stdout.
    #[arg(long)]
    print: bool,

    /// Echo the merged dataset as JSON to stdout.
    #[arg(long, conflicts_with = "print")]
    json: bool,

    /// How US child rows without a parent row are handled.
    #[arg(long, value_enum, default_value_t = OrphanMode::Drop)]
    orphans: OrphanMode,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OrphanMode {
    Drop,
    Retain,
}

impl From<OrphanMode> for OrphanPolicy {
    fn from(mode: OrphanMode) -> Self {
        match mode {
            OrphanMode::Drop => OrphanPolicy::Drop,
            OrphanMode::Retain => OrphanPolicy::Retain,
        }
    }
}
