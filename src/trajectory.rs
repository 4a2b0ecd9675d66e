// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 meanforce contributors
//
// See LICENSE at the project root for full text.

//! Streaming reader for force trajectories.
//!
//! A frame is a line starting with `timestep` followed by one line per atom:
//!
//! ```text
//! timestep 1000
//! 1  12.337  -3.101  40.126  0.0213  -1.30  0.552
//! ...
//! ```
//!
//! Field 0 is ignored, fields 1-3 are the position and fields 4-6 the force.
//! Positions do not change within a file, so they are parsed from the first
//! frame only and later frames just skip over them.

use crate::error::MfError;
use crate::forces::FrameForces;
use crate::geometry::{subunit_centers, Vec3};
use crate::moments::ForceStatistics;
use crate::series::FrameObserver;
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::SplitWhitespace;
use std::time::{Duration, Instant};

const FRAME_MARKER: &str = "timestep";

/// Positions and subunit centers captured from the first frame of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticGeometry {
    pub positions: Vec<Vec3>,
    pub centers: [Vec3; 2],
}

impl StaticGeometry {
    pub fn new(positions: Vec<Vec3>, masses: Option<&[f64]>) -> Result<Self, MfError> {
        let centers = subunit_centers(&positions, masses)?;
        Ok(StaticGeometry { positions, centers })
    }
}

/// How reading a file stopped.
#[derive(Debug)]
pub enum StreamEnd {
    /// End of input, or a line that does not start a frame.
    Done,
    /// A frame ended before all its atom lines were read. `frame` is the
    /// zero-based index of that frame within the file.
    Truncated {
        frame: usize,
        expected: usize,
        got: usize,
    },
    /// A line of frame `frame` could not be parsed. The frame is not counted.
    Malformed { frame: usize, error: MfError },
}

impl StreamEnd {
    fn malformed(frame: usize, error: MfError) -> Result<Self, MfError> {
        match error {
            MfError::MissingToken { .. } | MfError::ParseFloatError { .. } => {
                Ok(StreamEnd::Malformed { frame, error })
            }
            other => Err(other),
        }
    }
}

enum FrameRead {
    Complete,
    Truncated { got: usize },
    End,
}

/// Line-by-line frame reader. The force buffer is reused for every frame.
pub struct ForceStream<R> {
    reader: R,
    line: String,
    lineno: usize,
    forces: Vec<Vec3>,
}

impl<R: BufRead> ForceStream<R> {
    pub fn new(reader: R, natoms: usize) -> Self {
        ForceStream {
            reader,
            line: String::new(),
            lineno: 0,
            forces: vec![Vec3::zeros(); natoms],
        }
    }

    /// Forces of the last frame read.
    pub fn forces(&self) -> &[Vec3] {
        &self.forces
    }

    fn read_line(&mut self) -> Result<bool, MfError> {
        self.line.clear();
        let bytes = self.reader.read_line(&mut self.line)?;
        if bytes > 0 {
            self.lineno += 1;
        }
        Ok(bytes > 0)
    }

    /// Reads one frame. Positions are parsed into `positions` when given,
    /// otherwise skipped.
    fn next_frame(&mut self, mut positions: Option<&mut [Vec3]>) -> Result<FrameRead, MfError> {
        if !self.read_line()? || !self.line.starts_with(FRAME_MARKER) {
            return Ok(FrameRead::End);
        }

        for i in 0..self.forces.len() {
            if !self.read_line()? {
                return Ok(FrameRead::Truncated { got: i });
            }
            let lineno = self.lineno;
            let mut tokens = self.line.split_whitespace();
            tokens.next().ok_or(MfError::MissingToken { line: lineno })?;

            match positions.as_deref_mut() {
                Some(x) => x[i] = next_vector(&mut tokens, lineno)?,
                None => {
                    tokens.nth(2).ok_or(MfError::MissingToken { line: lineno })?;
                }
            }
            self.forces[i] = next_vector(&mut tokens, lineno)?;
        }
        Ok(FrameRead::Complete)
    }
}

fn next_float(tokens: &mut SplitWhitespace, line: usize) -> Result<f64, MfError> {
    tokens
        .next()
        .ok_or(MfError::MissingToken { line })?
        .parse()
        .map_err(|source| MfError::ParseFloatError { line, source })
}

fn next_vector(tokens: &mut SplitWhitespace, line: usize) -> Result<Vec3, MfError> {
    Ok(Vec3::new(
        next_float(tokens, line)?,
        next_float(tokens, line)?,
        next_float(tokens, line)?,
    ))
}

/// Result of streaming one input.
#[derive(Debug)]
pub struct StreamOutcome {
    /// `None` if no frame was complete.
    pub geometry: Option<StaticGeometry>,
    pub frames: usize,
    pub end: StreamEnd,
}

/// Per-file diagnostics.
#[derive(Debug)]
pub struct FileSummary {
    pub path: PathBuf,
    pub outcome: StreamOutcome,
    /// Accumulated frame count before and after this file.
    pub frames_before: u64,
    pub frames_after: u64,
    pub elapsed: Duration,
}

impl FileSummary {
    /// The truncation as an error value, for reporting.
    pub fn truncation(&self) -> Option<MfError> {
        match self.outcome.end {
            StreamEnd::Truncated {
                frame,
                expected,
                got,
            } => Some(MfError::TruncatedFrame {
                path: self.path.clone(),
                frame,
                expected,
                got,
            }),
            _ => None,
        }
    }

    /// The parse error that ended the file early, if any.
    pub fn malformed(&self) -> Option<&MfError> {
        match &self.outcome.end {
            StreamEnd::Malformed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Feeds the frames of a trajectory through the force reduction into the
/// accumulators.
pub struct StreamProcessor<'a> {
    natoms: usize,
    masses: Option<&'a [f64]>,
}

impl<'a> StreamProcessor<'a> {
    /// # Errors
    ///
    /// [`MfError::OddAtomCount`] unless `natoms` is even and positive,
    /// [`MfError::LengthMismatch`] if `masses` has the wrong length.
    pub fn new(natoms: usize, masses: Option<&'a [f64]>) -> Result<Self, MfError> {
        if natoms == 0 || natoms % 2 != 0 {
            return Err(MfError::OddAtomCount(natoms));
        }
        if let Some(m) = masses {
            if m.len() != natoms {
                return Err(MfError::LengthMismatch {
                    expected: natoms,
                    got: m.len(),
                });
            }
        }
        Ok(StreamProcessor { natoms, masses })
    }

    /// Streams every frame of `reader`.
    ///
    /// The first complete frame fixes the positions and subunit centers;
    /// after that only forces are parsed. Every complete frame is passed to
    /// `observer` and then pushed to `stats`. A truncated or unparsable frame
    /// ends the stream without being counted.
    ///
    /// # Errors
    ///
    /// I/O errors, errors from `observer`, and degenerate masses. `stats`
    /// keeps the frames completed before the error.
    pub fn process<R: BufRead>(
        &self,
        reader: R,
        stats: &mut ForceStatistics,
        observer: &mut dyn FrameObserver,
    ) -> Result<StreamOutcome, MfError> {
        let mut stream = ForceStream::new(reader, self.natoms);
        let truncated = |frame, got| StreamEnd::Truncated {
            frame,
            expected: self.natoms,
            got,
        };

        // capture phase
        let mut positions = vec![Vec3::zeros(); self.natoms];
        let end = match stream.next_frame(Some(positions.as_mut_slice())) {
            Ok(FrameRead::Complete) => None,
            Ok(FrameRead::Truncated { got }) => Some(truncated(0, got)),
            Ok(FrameRead::End) => Some(StreamEnd::Done),
            Err(err) => Some(StreamEnd::malformed(0, err)?),
        };
        if let Some(end) = end {
            return Ok(StreamOutcome {
                geometry: None,
                frames: 0,
                end,
            });
        }
        let geometry = StaticGeometry::new(positions, self.masses)?;

        // streaming phase
        let mut frames = 0;
        let end = loop {
            let forces = FrameForces::extract(
                &geometry.positions,
                stream.forces(),
                &geometry.centers,
            );
            observer.observe(&forces)?;
            stats.push(&forces);
            frames += 1;

            match stream.next_frame(None) {
                Ok(FrameRead::Complete) => {}
                Ok(FrameRead::Truncated { got }) => break truncated(frames, got),
                Ok(FrameRead::End) => break StreamEnd::Done,
                Err(err) => break StreamEnd::malformed(frames, err)?,
            }
        };

        Ok(StreamOutcome {
            geometry: Some(geometry),
            frames,
            end,
        })
    }

    /// Opens `path` and streams it through [`StreamProcessor::process`].
    ///
    /// # Errors
    ///
    /// [`MfError::FileNotFound`] if the file cannot be opened, otherwise the
    /// errors of [`StreamProcessor::process`].
    pub fn process_file(
        &self,
        path: &Path,
        stats: &mut ForceStatistics,
        observer: &mut dyn FrameObserver,
    ) -> Result<FileSummary, MfError> {
        let start = Instant::now();
        let frames_before = stats.frames();

        let file = File::open(path).map_err(|source| MfError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let outcome = self.process(BufReader::new(file), stats, observer)?;

        let summary = FileSummary {
            path: path.to_path_buf(),
            outcome,
            frames_before,
            frames_after: stats.frames(),
            elapsed: start.elapsed(),
        };
        if let Some(err) = summary.truncation() {
            warn!("{err}");
        }
        if let Some(err) = summary.malformed() {
            warn!("{}: stopped at frame {}: {err}", path.display(), summary.outcome.frames);
        }
        info!(
            "loaded {} in {:.3} seconds, {} -> {} frames",
            path.display(),
            summary.elapsed.as_secs_f64(),
            summary.frames_before,
            summary.frames_after
        );
        Ok(summary)
    }
}
