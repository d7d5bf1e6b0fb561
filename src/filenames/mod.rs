//! Utilities for finding groups of lane-split FASTQ files on disk.

pub mod lane_split;

pub use lane_split::{GroupKey, LaneSplitFile, LaneSplitScan};
