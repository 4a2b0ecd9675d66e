// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 meanforce contributors
//
// See LICENSE at the project root for full text.

//! Runs the stream processor over a set of files.
//!
//! Statistics are cumulative: the accumulators are shared by all files of a
//! run, and the statistics stored with each file report cover every file
//! processed up to and including that one. The alignment is computed once,
//! from the first file that yields a complete frame.

use crate::discovery::{discover_blocks, DEFAULT_TAIL};
use crate::error::MfError;
use crate::geometry::{align_subunits, AlignmentResult};
use crate::kabsch::{Kabsch, Superpose};
use crate::mass::Masses;
use crate::moments::ForceStatistics;
use crate::series::FrameObserver;
use crate::trajectory::{FileSummary, StreamProcessor};
use log::{error, warn};
use std::fmt;
use std::path::PathBuf;

/// The trajectories to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSet {
    Single(PathBuf),
    List(Vec<PathBuf>),
    /// Every block file found in the directory.
    Directory(PathBuf),
}

impl InputSet {
    /// Expands the input into a list of paths, in processing order.
    pub fn resolve(&self, tail: &str) -> Result<Vec<PathBuf>, MfError> {
        match self {
            InputSet::Single(path) => Ok(vec![path.clone()]),
            InputSet::List(paths) => Ok(paths.clone()),
            InputSet::Directory(dir) => discover_blocks(dir, tail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Total number of atoms, both subunits included.
    pub natoms: usize,
    /// Weight centers and alignment by atomic mass.
    pub use_mass: bool,
    /// Topology file holding the masses.
    pub topology: Option<PathBuf>,
    /// Suffix of block files in directory mode.
    pub block_tail: String,
}

impl SessionConfig {
    pub fn new(natoms: usize) -> Self {
        SessionConfig {
            natoms,
            use_mass: false,
            topology: None,
            block_tail: DEFAULT_TAIL.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum FileStatus {
    Processed(FileSummary),
    /// The file was skipped, or stopped early, because of this error.
    Failed(MfError),
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Statistics over all files so far.
    pub cumulative: ForceStatistics,
}

#[derive(Debug, Default)]
pub struct SessionReport {
    pub files: Vec<FileReport>,
    pub alignment: Option<AlignmentResult>,
    pub statistics: ForceStatistics,
}

impl SessionReport {
    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Failed(_)))
            .count()
    }
}

/// One line of output: geometry followed by mean, standard deviation and
/// count of each quantity.
pub struct ReportLine<'a> {
    pub alignment: Option<&'a AlignmentResult>,
    pub statistics: &'a ForceStatistics,
}

impl fmt::Display for ReportLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(a) = self.alignment {
            write!(
                f,
                "dis {}, ang {}/{}, rmsd {} | ",
                a.separation(),
                a.angle,
                a.angle.to_degrees(),
                a.rmsd
            )?;
        }
        let [radial, torque, symmetric] = self.statistics.summaries();
        write!(
            f,
            "f {} {} {} | torq {} {} {} | symmtorq {} {} {}",
            radial.mean,
            radial.std_dev,
            radial.count,
            torque.mean,
            torque.std_dev,
            torque.count,
            symmetric.mean,
            symmetric.std_dev,
            symmetric.count
        )
    }
}

pub struct Session<S = Kabsch> {
    config: SessionConfig,
    masses: Option<Masses>,
    solver: S,
}

impl Session<Kabsch> {
    pub fn new(config: SessionConfig) -> Result<Self, MfError> {
        Self::with_solver(config, Kabsch)
    }
}

impl<S: Superpose> Session<S> {
    /// Loads the masses if requested. An asymmetric mass table is only
    /// warned about.
    ///
    /// # Errors
    ///
    /// Mass table errors, or [`MfError::MissingTopology`] if masses are
    /// requested without a topology file.
    pub fn with_solver(config: SessionConfig, solver: S) -> Result<Self, MfError> {
        let masses = if config.use_mass {
            let path = config.topology.as_ref().ok_or(MfError::MissingTopology)?;
            let masses = Masses::from_topology(path, config.natoms)?;
            if let Err(err) = masses.check_symmetry() {
                warn!("{err}");
            }
            Some(masses)
        } else {
            None
        };
        Ok(Session {
            config,
            masses,
            solver,
        })
    }

    pub fn masses(&self) -> Option<&Masses> {
        self.masses.as_ref()
    }

    pub fn run(
        &self,
        input: &InputSet,
        observer: &mut dyn FrameObserver,
    ) -> Result<SessionReport, MfError> {
        let files = input.resolve(&self.config.block_tail)?;
        self.run_files(&files, observer)
    }

    /// Streams `files` in order. A file that stops on a truncated or
    /// unparsable frame is still processed, and can supply the alignment. A
    /// file that fails is logged and recorded in its report; the frames it
    /// completed stay in the statistics.
    ///
    /// # Errors
    ///
    /// Only configuration errors; per-file errors never abort the run.
    pub fn run_files(
        &self,
        files: &[PathBuf],
        observer: &mut dyn FrameObserver,
    ) -> Result<SessionReport, MfError> {
        let masses = self.masses.as_ref().map(Masses::as_slice);
        let processor = StreamProcessor::new(self.config.natoms, masses)?;
        let mut report = SessionReport::default();

        for path in files {
            let status = match processor.process_file(path, &mut report.statistics, observer) {
                Ok(summary) => {
                    if report.alignment.is_none() {
                        if let Some(geometry) = &summary.outcome.geometry {
                            match align_subunits(&geometry.positions, masses, &self.solver) {
                                Ok(alignment) => report.alignment = Some(alignment),
                                Err(err) => error!("{}: alignment failed: {err}", path.display()),
                            }
                        }
                    }
                    FileStatus::Processed(summary)
                }
                Err(err) => {
                    error!("{}: {err}", path.display());
                    FileStatus::Failed(err)
                }
            };
            report.files.push(FileReport {
                path: path.clone(),
                status,
                cumulative: report.statistics,
            });
        }
        Ok(report)
    }
}
