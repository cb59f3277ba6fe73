//! Full per-locus results as a single JSON document.
//!

use crate::stronger::workflows::LocusResult;
use crate::utils::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Everything needed to reproduce a run's calls: the seed and the results in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: u64,
    pub results: Vec<LocusResult>,
}

pub fn write_json(path: &Path, report: &RunReport) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| format!("Failed to create JSON output {}: {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| format!("Failed to write JSON output {}: {}", path.display(), e))?;
    writer
        .flush()
        .map_err(|e| format!("Failed to write JSON output {}: {}", path.display(), e))
}

pub fn read_json(path: &Path) -> Result<RunReport> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open JSON report {}: {}", path.display(), e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Invalid JSON report {}: {}", path.display(), e))
}
