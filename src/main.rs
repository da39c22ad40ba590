use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use log::info;

use dune_archive::interpreter::{AuditLog, Interpreter};
use dune_archive::{Archive, ArchiveConfig};

/// Runs a script of record store commands.
#[derive(Parser, Debug)]
#[command(name = "dune-archive", version, about)]
struct Cli {
    /// Script with one command per line
    input_file: PathBuf,

    /// Directory holding the catalog and page files
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// File receiving search results, malformed-line reports and fatal errors (truncated on start)
    #[arg(long, default_value = "output.txt")]
    output: PathBuf,

    /// CSV audit log, appended to
    #[arg(long, default_value = "log.csv")]
    log: PathBuf,

    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let mut output = File::create(&cli.output)
        .with_context(|| format!("creating output file {}", cli.output.display()))?;
    let audit = AuditLog::open(&cli.log)
        .with_context(|| format!("opening audit log {}", cli.log.display()))?;

    // Fatal startup errors are also the whole content of the output file
    if !cli.input_file.exists() {
        let message = format!("Input file '{}' not found", cli.input_file.display());
        writeln!(output, "Error: {}", message)?;
        bail!(message);
    }
    let input = File::open(&cli.input_file)
        .with_context(|| format!("opening input file {}", cli.input_file.display()))?;

    let archive = match Archive::open(ArchiveConfig::new(&cli.data_dir)) {
        Ok(archive) => archive,
        Err(e) => {
            writeln!(output, "Error initializing catalog: {}", e)?;
            return Err(e)
                .with_context(|| format!("initializing catalog in {}", cli.data_dir.display()));
        }
    };

    let mut interpreter = Interpreter::new(archive, BufWriter::new(output), audit);
    let summary = interpreter
        .run(BufReader::new(input))
        .with_context(|| format!("processing {}", cli.input_file.display()))?;

    info!(
        "Processed {}: {} succeeded, {} failed, {} malformed, {} skipped",
        cli.input_file.display(),
        summary.succeeded,
        summary.failed,
        summary.malformed,
        summary.skipped
    );
    Ok(())
}
