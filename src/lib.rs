pub mod circular;
pub mod discovery;
pub mod error;
pub mod forces;
pub mod geometry;
pub mod kabsch;
pub mod mass;
pub mod moments;
pub mod series;
pub mod session;
pub mod trajectory;

use error::MfError;
use moments::ForceStatistics;
use series::Discard;
use std::path::Path;
use trajectory::StreamProcessor;

/// Accumulate the force statistics of a single unweighted trajectory file
pub fn mean_force(path: &Path, natoms: usize) -> Result<ForceStatistics, MfError> {
    let processor = StreamProcessor::new(natoms, None)?;
    let mut stats = ForceStatistics::new();
    processor.process_file(path, &mut stats, &mut Discard)?;
    Ok(stats)
}
