// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 meanforce contributors
//
// See LICENSE at the project root for full text.

use crate::error::MfError;
use crate::forces::FrameForces;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Receives the reduced quantities of every complete frame, in order.
pub trait FrameObserver {
    /// # Errors
    ///
    /// An error aborts the file being processed.
    fn observe(&mut self, forces: &FrameForces) -> Result<(), MfError>;
}

/// Observer that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl FrameObserver for Discard {
    fn observe(&mut self, _forces: &FrameForces) -> Result<(), MfError> {
        Ok(())
    }
}

/// Writes one line per frame: `index radial torque symmetric_torque`.
///
/// The index counts frames across every file streamed through the same
/// writer.
pub struct SeriesWriter<W: Write> {
    writer: W,
    index: u64,
}

impl SeriesWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self, MfError> {
        let file = File::create(path)?;
        Ok(SeriesWriter::new(BufWriter::new(file)))
    }
}

impl<W: Write> SeriesWriter<W> {
    pub fn new(writer: W) -> Self {
        SeriesWriter { writer, index: 0 }
    }

    pub fn frames(&self) -> u64 {
        self.index
    }

    pub fn flush(&mut self) -> Result<(), MfError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameObserver for SeriesWriter<W> {
    fn observe(&mut self, forces: &FrameForces) -> Result<(), MfError> {
        writeln!(
            self.writer,
            "{} {} {} {}",
            self.index, forces.radial, forces.torque, forces.symmetric_torque
        )?;
        self.index += 1;
        Ok(())
    }
}
