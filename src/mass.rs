// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 meanforce contributors
//
// See LICENSE at the project root for full text.

use crate::error::MfError;
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Deref;
use std::path::Path;

/// Paired atoms whose masses differ by more than this are reported.
pub const MASS_TOLERANCE: f64 = 0.001;

const ATOM_SECTION: &str = "!NATOM";

/// Per-atom masses, in the same order as the trajectory atoms.
#[derive(Debug, Clone, PartialEq)]
pub struct Masses(Vec<f64>);

impl Masses {
    pub fn new(masses: Vec<f64>) -> Self {
        Masses(masses)
    }

    /// Reads `natoms` masses from the atom section of a topology file.
    ///
    /// Lines before `!NATOM` are skipped; each of the following `natoms`
    /// lines carries the mass as its 8th whitespace-separated field.
    ///
    /// # Errors
    ///
    /// [`MfError::FileNotFound`] if the file cannot be opened,
    /// [`MfError::CorruptedMassTable`] if the section is missing, shorter
    /// than `natoms` lines, or has a line without a mass field.
    pub fn from_topology(path: &Path, natoms: usize) -> Result<Self, MfError> {
        let file = File::open(path).map_err(|source| MfError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read(BufReader::new(file), path, natoms)
    }

    fn read<R: BufRead>(mut reader: R, path: &Path, natoms: usize) -> Result<Self, MfError> {
        let corrupted = |atom| MfError::CorruptedMassTable {
            path: path.to_path_buf(),
            atom,
        };

        let mut line = String::new();
        let mut lineno = 0;
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(corrupted(0));
            }
            lineno += 1;
            if line.contains(ATOM_SECTION) {
                break;
            }
        }

        let mut masses = Vec::with_capacity(natoms);
        for atom in 0..natoms {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(corrupted(atom));
            }
            lineno += 1;
            let token = line
                .split_whitespace()
                .nth(7)
                .ok_or_else(|| corrupted(atom))?;
            let mass = token
                .parse::<f64>()
                .map_err(|source| MfError::ParseFloatError {
                    line: lineno,
                    source,
                })?;
            masses.push(mass);
        }
        Ok(Masses(masses))
    }

    /// Checks that atom `i` of the first half weighs the same as atom
    /// `i + n/2`.
    ///
    /// # Errors
    ///
    /// Returns the first mismatching pair as [`MfError::MassAsymmetry`].
    pub fn check_symmetry(&self) -> Result<(), MfError> {
        let ns = self.0.len() / 2;
        let (a, b) = self.0.split_at(ns);
        if let Some((i, (ma, mb))) = a
            .iter()
            .zip(b)
            .enumerate()
            .find(|(_, (ma, mb))| (*ma - *mb).abs() > MASS_TOLERANCE)
        {
            return Err(MfError::MassAsymmetry {
                first: i,
                second: i + ns,
                a: *ma,
                b: *mb,
            });
        }
        info!("mass is ok!");
        Ok(())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Deref for Masses {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
