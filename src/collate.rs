// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Consolidate groups of lane-split FASTQ files into one file per sample.

use anyhow::Result;
use itertools::Itertools;
use log::info;
use std::fs;
use std::path::Path;

use crate::filenames::{LaneSplitFile, LaneSplitScan};
use crate::utils;
use crate::CollateError;

/// Consolidate one group of lane fragments into `dest`, creating the
/// parent directory as needed.
///
/// A lone fragment is moved into place. Several fragments are
/// concatenated in ascending lane order and the sources removed once the
/// write completes. Fragments sharing a lane number keep their discovery
/// order (stable sort). No staging file is used; a crash mid-write leaves
/// a partial destination with the sources still on disk.
pub fn collate_group(files: Vec<LaneSplitFile>, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    if files.len() == 1 {
        utils::move_file(&files[0].path, dest)?;
        return Ok(());
    }

    let files: Vec<LaneSplitFile> = files.into_iter().sorted_by_key(|f| f.lane).collect();
    let sources: Vec<&Path> = files.iter().map(|f| f.path.as_path()).collect();
    utils::concat_files(&sources, dest)?;

    for f in &files {
        fs::remove_file(&f.path)?;
    }
    Ok(())
}

/// Scan `root` for lane-split FASTQ files, leaving the `outdir` subtree
/// out of the search, then consolidate every group into
/// `<outdir>/<sample>/<sample>_R<read><ext>`. Returns the number of
/// consolidated files written.
///
/// Groups are processed one after another; a failing group aborts the run
/// with earlier groups already consolidated and later ones untouched.
pub fn collate_tree(root: &Path, outdir: &Path) -> Result<usize> {
    fs::create_dir_all(outdir)?;
    let outdir = fs::canonicalize(outdir)?;

    let scan = LaneSplitScan {
        root: root.to_path_buf(),
        exclude: Some(outdir.clone()),
    };

    let groups = scan.find_groups()?;
    if groups.is_empty() {
        return Err(CollateError::NoMatches {
            root: root.to_path_buf(),
        }
        .into());
    }

    let n_groups = groups.len();
    for (key, files) in groups {
        let dest = outdir.join(&key.sample).join(key.filename());
        info!("collating {} fragment(s) into {:?}", files.len(), dest);
        collate_group(files, &dest)?;
    }
    Ok(n_groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_file(path: &Path, contents: &[u8]) {
        let mut f = File::create(path).unwrap();
        f.write_all(contents).unwrap();
    }

    fn entry(path: PathBuf) -> LaneSplitFile {
        LaneSplitFile::new(&path).unwrap_or_else(|| panic!("not a lane-split name: {:?}", path))
    }

    #[test]
    fn single_fragment_is_moved() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let src = tmp.path().join("run_A_L001_R1.fastq");
        write_file(&src, b"@r1\nACGT\n+\nFFFF\n");
        let src_copy = tmp.path().join("reference");
        fs::copy(&src, &src_copy)?;

        let dest = tmp.path().join("out/A/A_R1.fastq");
        collate_group(vec![entry(src.clone())], &dest)?;

        assert!(!src.exists());
        assert!(file_diff::diff(
            src_copy.to_str().unwrap(),
            dest.to_str().unwrap()
        ));
        Ok(())
    }

    #[test]
    fn fragments_concatenate_in_lane_order() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let l3 = tmp.path().join("run_A_L003_R1.fastq");
        let l1 = tmp.path().join("run_A_L001_R1.fastq");
        let l2 = tmp.path().join("run_A_L002_R1.fastq");
        write_file(&l3, b"lane3\n");
        write_file(&l1, b"lane1\n");
        write_file(&l2, b"lane2\n");

        let dest = tmp.path().join("out/A/A_R1.fastq");
        // discovery order 3, 1, 2; output must follow lane numbers
        collate_group(
            vec![entry(l3.clone()), entry(l1.clone()), entry(l2.clone())],
            &dest,
        )?;

        assert_eq!(fs::read(&dest)?, b"lane1\nlane2\nlane3\n".to_vec());
        assert!(!l1.exists());
        assert!(!l2.exists());
        assert!(!l3.exists());
        Ok(())
    }

    #[test]
    fn duplicate_lanes_keep_discovery_order() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        fs::create_dir_all(tmp.path().join("a"))?;
        fs::create_dir_all(tmp.path().join("b"))?;
        let first = tmp.path().join("a/run_A_L001_R1.fastq");
        let second = tmp.path().join("b/run_A_L001_R1.fastq");
        write_file(&first, b"seen-first\n");
        write_file(&second, b"seen-second\n");

        let dest = tmp.path().join("out/A/A_R1.fastq");
        collate_group(vec![entry(first), entry(second)], &dest)?;

        assert_eq!(fs::read(&dest)?, b"seen-first\nseen-second\n".to_vec());
        Ok(())
    }

    #[test]
    fn destination_size_is_sum_of_sources() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let l1 = tmp.path().join("run_A_L001_R2.fq.gz");
        let l2 = tmp.path().join("run_A_L002_R2.fq.gz");
        write_file(&l1, &[0u8; 100]);
        write_file(&l2, &[1u8; 37]);

        let dest = tmp.path().join("out/A/A_R2.fq.gz");
        collate_group(vec![entry(l1), entry(l2)], &dest)?;

        assert_eq!(fs::metadata(&dest)?.len(), 137);
        Ok(())
    }

    #[test]
    fn end_to_end() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path();
        let f1 = root.join("S1_A_L001_R1.fastq.gz");
        let f2 = root.join("S1_A_L002_R1.fastq.gz");
        write_file(&f1, b"lane-one");
        write_file(&f2, b"lane-two");

        let outdir = root.join("out");
        let n = collate_tree(root, &outdir)?;
        assert_eq!(n, 1);

        let dest = outdir.join("A/A_R1.fastq.gz");
        assert_eq!(fs::read(&dest)?, b"lane-onelane-two".to_vec());
        assert!(!f1.exists());
        assert!(!f2.exists());
        Ok(())
    }

    #[test]
    fn end_to_end_ignores_output_tree() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path();
        let outdir = root.join("out");
        fs::create_dir_all(outdir.join("B"))?;

        // a matching name already sitting inside the output tree must
        // not be picked up, even on a rerun
        write_file(&outdir.join("B/run_B_L001_R1.fastq"), b"already-done");
        write_file(&root.join("run_A_L001_R1.fastq"), b"fresh");

        collate_tree(root, &outdir)?;

        assert!(outdir.join("A/A_R1.fastq").exists());
        assert_eq!(
            fs::read(outdir.join("B/run_B_L001_R1.fastq"))?,
            b"already-done".to_vec()
        );
        Ok(())
    }

    #[test]
    fn empty_tree_reports_no_matches() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path();
        write_file(&root.join("notes.txt"), b"nothing to see");

        let err = collate_tree(root, &root.join("out")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CollateError>(),
            Some(CollateError::NoMatches { .. })
        ));
        Ok(())
    }
}
