use anyhow::Result;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::utils::expand_and_resolve;

lazy_static! {
    static ref LANE_SPLIT_REGEX: Regex = Regex::new(
        r"(?i)^.+_(?P<sample>[^_]+)_L(?P<lane>\d+)_R(?P<read>[12])(?P<ext>\.f(?:ast)?q(?:\.gz)?)$"
    )
    .unwrap();
}

/// A parsed representation of a lane-split FASTQ file. The `find_groups`
/// method of `LaneSplitScan` will find files of the form
/// `Run42_A_L001_R1.fastq.gz`, with an optional `.gz` suffix.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct LaneSplitFile {
    pub sample: String,
    pub lane: usize,
    pub read: String,
    pub ext: String,
    pub path: PathBuf,
}

/// Parse a lane-split FASTQ filename to get the sample name, lane number,
/// read direction and extension. We expect a filename of the form
/// `<prefix>_<sample>_L001_R1.fastq`, matched case-insensitively. The
/// prefix anchors the suffix shape so that the sample token is whatever
/// immediately precedes the lane/read fields; it is not retained.
impl LaneSplitFile {
    /// Attempt to parse `path` as a lane-split FASTQ file.
    pub fn new(path: impl AsRef<Path>) -> Option<LaneSplitFile> {
        let filename = path.as_ref().file_name()?.to_str();

        if let Some(f) = filename {
            if let Some(cap) = LANE_SPLIT_REGEX.captures(f) {
                let sample = cap.name("sample").unwrap().as_str().to_string();
                let lane: usize = cap.name("lane").unwrap().as_str().parse().ok()?;
                let read = cap.name("read").unwrap().as_str().to_string();
                let ext = cap.name("ext").unwrap().as_str().to_string();

                return Some(LaneSplitFile {
                    sample,
                    lane,
                    read,
                    ext,
                    path: path.as_ref().into(),
                });
            }
        }

        None
    }

    /// The key shared by all lane fragments of one consolidated output file.
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            sample: self.sample.clone(),
            read: self.read.clone(),
            ext: self.ext.clone(),
        }
    }
}

/// Identifies one consolidated output file: entries with equal keys and
/// different lanes are fragments of the same logical file.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub sample: String,
    pub read: String,
    pub ext: String,
}

impl GroupKey {
    /// Filename of the consolidated output, `<sample>_R<read><ext>`.
    pub fn filename(&self) -> String {
        format!("{}_R{}{}", self.sample, self.read, self.ext)
    }
}

/// A pointer to a tree of lane-split FASTQ files on disk. `find_groups`
/// will locate every matching file under `root` and group the lane
/// fragments belonging to the same output file.
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq, Debug)]
pub struct LaneSplitScan {
    /// Root directory, searched recursively
    pub root: PathBuf,

    /// Directory subtree to leave out of the search, typically the
    /// output directory the consolidated files are written into
    pub exclude: Option<PathBuf>,
}

impl LaneSplitScan {
    /// Find all the lane-split FASTQ files under `root`, in traversal
    /// order. Sibling entries are visited sorted by file name, so the
    /// order is the same on every run for a fixed filesystem state.
    pub fn find_lane_fastqs(&self) -> Result<Vec<LaneSplitFile>> {
        let exclude = match &self.exclude {
            Some(p) => Some(expand_and_resolve(p)?),
            None => None,
        };

        let mut res = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_excluded(e, exclude.as_deref()));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(parsed) = LaneSplitFile::new(entry.path()) {
                debug!("matched lane-split file {:?}", entry.path());
                res.push(parsed);
            }
        }

        Ok(res)
    }

    /// Group the found files by (sample, read, extension). Within a group
    /// the entries keep their first-seen order; sorting fragments by lane
    /// is left to the consolidation step.
    pub fn find_groups(&self) -> Result<BTreeMap<GroupKey, Vec<LaneSplitFile>>> {
        let mut groups: BTreeMap<GroupKey, Vec<LaneSplitFile>> = BTreeMap::new();
        for f in self.find_lane_fastqs()? {
            groups.entry(f.group_key()).or_default().push(f);
        }
        Ok(groups)
    }
}

/// True when `entry` is the excluded directory itself or sits anywhere
/// below it. Pruning the directory entry keeps the walk from descending
/// into the subtree at all.
fn is_excluded(entry: &DirEntry, exclude: Option<&Path>) -> bool {
    match exclude {
        None => false,
        Some(excl) => match fs::canonicalize(entry.path()) {
            Ok(resolved) => resolved.starts_with(excl),
            // entries that cannot be resolved are kept; opening them
            // later surfaces the error
            Err(_) => false,
        },
    }
}
