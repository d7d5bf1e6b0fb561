// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Collect lane-split FASTQ files into per-sample folders.
//!
//! Sequencers split one logical sample's reads across per-lane files.
//! This crate finds files following the `<prefix>_<sample>_L<lane>_R<read>`
//! naming convention, groups them by sample, read direction and extension,
//! and consolidates each group into a single file per sample, concatenating
//! lane fragments in ascending lane order.

use std::path::PathBuf;
use thiserror::Error;

pub mod collate;
pub mod filenames;
pub mod utils;

pub use collate::{collate_group, collate_tree};
pub use filenames::{GroupKey, LaneSplitFile, LaneSplitScan};

/// The designed failure modes of a collation run. I/O faults are not
/// classified; they propagate as plain `anyhow` errors and abort the run.
#[derive(Error, Debug)]
pub enum CollateError {
    #[error("OUTDIR is not set and --outdir was not provided")]
    NoOutputDir,

    #[error("no FASTQ files matched the expected pattern under {root:?}")]
    NoMatches { root: PathBuf },
}
