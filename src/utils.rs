// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Utility methods.

use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Concatenate `sources` in order into a single file at `dest`.
/// An existing destination is truncated. Contents are copied as opaque
/// bytes; no delimiters are inserted between sources.
pub fn concat_files<P: AsRef<Path>>(sources: &[P], dest: impl AsRef<Path>) -> io::Result<()> {
    let dest_file = File::create(dest)?;
    let mut writer = BufWriter::new(dest_file);

    for source in sources {
        let mut reader = File::open(source)?;
        io::copy(&mut reader, &mut writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Move `src` to `dest`. Falls back to copy-and-delete when a plain
/// rename is not possible, e.g. when the two paths are on different
/// filesystems.
pub fn move_file(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> io::Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(src, dest)?;
            fs::remove_file(src)
        }
    }
}

/// Expand `~` and environment variables in `input` when it is valid
/// UTF-8, then make the path absolute. The path does not have to exist;
/// symlinks are only resolved when it does.
pub fn expand_and_resolve<P: AsRef<Path>>(input: P) -> Result<PathBuf> {
    let input = input.as_ref();
    let expanded: PathBuf = match input.to_str() {
        Some(s) => match shellexpand::full(s) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => input.to_path_buf(),
        },
        None => input.to_path_buf(),
    };

    if let Ok(absolute) = fs::canonicalize(&expanded) {
        return Ok(absolute);
    }
    let abs = if expanded.is_absolute() {
        expanded
    } else {
        env::current_dir()
            .context("Failed to get current directory")?
            .join(expanded)
    };
    Ok(abs)
}
