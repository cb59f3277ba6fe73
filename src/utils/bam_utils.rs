use crate::utils::Result;
use rust_htslib::bam::{self, Read};
use std::path::Path;

/// Opens the alignment file once up front so a bad path or missing index fails the run early.
pub fn check_bam_mapped(bam_path: &Path) -> Result<()> {
    let bam = bam::IndexedReader::from_path(bam_path)
        .map_err(|e| format!("Failed to create bam reader: {}", e))?;
    if bam.header().target_count() == 0 {
        return Err(format!("Input BAM is not mapped: {}", bam_path.display()));
    }
    Ok(())
}
