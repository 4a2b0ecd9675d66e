// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 meanforce contributors
//
// See LICENSE at the project root for full text.

//! Lookup of block files `<head>block.<n><tail>` in a data directory.

use crate::error::MfError;
use log::info;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TAIL: &str = ".fout.dat";

/// Removes a trailing slash and maps an empty path to `.`.
pub fn normalize_dir(dir: &str) -> PathBuf {
    if dir.is_empty() {
        return PathBuf::from(".");
    }
    match dir.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => PathBuf::from(stripped),
        _ => PathBuf::from(dir),
    }
}

/// Pattern of the block files found in a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPattern {
    pub head: String,
    pub tail: String,
    /// Largest block index seen.
    pub max_block: usize,
}

impl BlockPattern {
    /// Scans `dir` for file names ending in `tail` with a `block.<n>` part.
    ///
    /// The head is taken from the alphabetically first such name; the
    /// largest index is taken over all of them.
    ///
    /// # Errors
    ///
    /// I/O errors from listing the directory, or [`MfError::NoBlockFiles`]
    /// when nothing matches.
    pub fn scan(dir: &Path, tail: &str) -> Result<Self, MfError> {
        let pattern = format!(r"^(.*?)block\.(\d+){}$", regex::escape(tail));
        let re = Regex::new(&pattern)?;

        let mut names = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect::<Vec<_>>();
        names.sort();

        let mut head = None;
        let mut max_block = 0;
        for caps in names.iter().filter_map(|name| re.captures(name)) {
            if head.is_none() {
                head = Some(caps[1].to_string());
            }
            if let Ok(block) = caps[2].parse::<usize>() {
                max_block = max_block.max(block);
            }
        }

        let head = head.ok_or_else(|| MfError::NoBlockFiles(dir.to_path_buf()))?;
        info!("block {max_block}, head {head}");
        Ok(BlockPattern {
            head,
            tail: tail.to_string(),
            max_block,
        })
    }

    pub fn file_name(&self, block: usize) -> String {
        format!("{}block.{}{}", self.head, block, self.tail)
    }
}

/// Existing block files `1..=max_block` under `dir`, in block order.
pub fn discover_blocks(dir: &Path, tail: &str) -> Result<Vec<PathBuf>, MfError> {
    let pattern = BlockPattern::scan(dir, tail)?;
    Ok((1..=pattern.max_block)
        .map(|block| dir.join(pattern.file_name(block)))
        .filter(|path| path.is_file())
        .collect())
}
