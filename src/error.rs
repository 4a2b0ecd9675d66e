// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 meanforce contributors
//
// See LICENSE at the project root for full text.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MfError {
    #[error("{0}")]
    IoError(#[from] std::io::Error),
    #[error("cannot open {path:?}: {source}")]
    FileNotFound {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path:?}: corrupted in scanning atom {atom}")]
    CorruptedMassTable { path: PathBuf, atom: usize },
    #[error("mass {first} != mass {second}, {a} vs. {b}")]
    MassAsymmetry {
        first: usize,
        second: usize,
        a: f64,
        b: f64,
    },
    #[error("{path:?}: not enough atom lines in frame {frame} (expected {expected}, got {got})")]
    TruncatedFrame {
        path: PathBuf,
        frame: usize,
        expected: usize,
        got: usize,
    },
    #[error("no samples were accumulated")]
    EmptyAccumulator,
    #[error("total weight must be positive")]
    DegenerateWeight,
    #[error("the number of atoms must be even and positive, got {0}")]
    OddAtomCount(usize),
    #[error("missing token on line {line}")]
    MissingToken { line: usize },
    #[error("failed to parse float on line {line}: {source}")]
    ParseFloatError {
        line: usize,
        source: std::num::ParseFloatError,
    },
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("mass weighting requested without a topology file")]
    MissingTopology,
    #[error("no block files found under {0:?}")]
    NoBlockFiles(PathBuf),
    #[error("invalid file pattern: {0}")]
    PatternError(#[from] regex::Error),
    #[error("superposition failed: {0}")]
    Superposition(String),
}
