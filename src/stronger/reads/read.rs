//! Representation of a read aligned across a repeat locus.
//!

use super::cigar::Cigar;
use crate::utils::Result;
use rust_htslib::bam;
use std::str;

/// Quality value htslib reports when a record carries no base qualities.
const MISSING_QUAL: u8 = 0xff;

/// A single aligned read overlapping a locus.
#[derive(Debug, PartialEq, Clone)]
pub struct AlignedRead {
    /// Read name.
    pub id: String,
    /// Read bases, soft-clipped bases included.
    pub bases: Vec<u8>,
    /// PHRED base qualities; empty when the record has none.
    pub quals: Vec<u8>,
    /// Alignment of the read to the reference.
    pub cigar: Cigar,
}

impl AlignedRead {
    /// Creates an `AlignedRead` from an HTSlib record.
    ///
    /// # Arguments
    /// * `rec` - A mapped BAM record.
    ///
    /// # Returns
    /// Returns the read, or an error if the record name is not valid UTF-8.
    pub fn from_hts_rec(rec: &bam::Record) -> Result<AlignedRead> {
        let id = str::from_utf8(rec.qname())
            .map_err(|e| format!("Invalid read name: {}", e))?
            .to_string();
        let bases = rec.seq().as_bytes();
        let quals = rec.qual().to_vec();
        let quals = if quals.iter().all(|&q| q == MISSING_QUAL) {
            Vec::new()
        } else {
            quals
        };

        let cigar = Cigar {
            ref_pos: rec.pos(),
            ops: rec.cigar().take().to_vec(),
        };

        Ok(AlignedRead {
            id,
            bases,
            quals,
            cigar,
        })
    }

    /// Average PHRED quality over the read interval `[start, end)`.
    pub fn average_qual(&self, start: usize, end: usize) -> Option<f64> {
        if self.quals.is_empty() || start >= end || end > self.quals.len() {
            return None;
        }
        let total: u64 = self.quals[start..end].iter().map(|&q| q as u64).sum();
        Some(total as f64 / (end - start) as f64)
    }
}
