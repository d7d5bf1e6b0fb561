use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::info;

use fastq_collate::{collate_tree, utils, CollateError};

/// Collect lane-split FASTQ files from the working directory into
/// per-sample folders, concatenating lane fragments in lane order.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Output directory (defaults to $OUTDIR)
    #[arg(long, value_parser)]
    outdir: Option<PathBuf>,
}

fn try_main(cli: Cli) -> Result<()> {
    let outdir = cli
        .outdir
        .or_else(|| {
            env::var_os("OUTDIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .ok_or(CollateError::NoOutputDir)?;
    let outdir = utils::expand_and_resolve(outdir)?;

    let written = collate_tree(Path::new("."), &outdir)?;
    info!("wrote {} consolidated file(s) under {:?}", written, outdir);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = try_main(cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
