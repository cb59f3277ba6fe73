use crate::utils::Result;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// Half-open, 0-based interval on a contig.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct GenomicRegion {
    pub contig: String,
    pub start: u32,
    pub end: u32,
}

impl GenomicRegion {
    pub fn new(contig: impl Into<String>, start: u32, end: u32) -> Result<Self> {
        if start >= end {
            return Err(format!("Invalid region: start {} >= end {}", start, end));
        }

        Ok(Self {
            contig: contig.into(),
            start,
            end,
        })
    }

    /// Region extended by `flank_len` on both sides, checked against the contig length.
    pub fn with_flanks(&self, flank_len: u32, contig_len: u32) -> Result<(u32, u32)> {
        let start = self.start.checked_sub(flank_len).ok_or_else(|| {
            format!(
                "Region start '{}' with flank length '{}' underflows for contig '{}'",
                self.start, flank_len, self.contig
            )
        })?;

        let end = self
            .end
            .checked_add(flank_len)
            .filter(|end| *end <= contig_len)
            .ok_or_else(|| {
                format!(
                    "Region end '{}' with flank length '{}' exceeds contig '{}' bounds (0..{})",
                    self.end, flank_len, self.contig, contig_len
                )
            })?;

        Ok((start, end))
    }
}

impl fmt::Display for GenomicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

/// Finds the name a contig goes by in a file, adding or removing a `chr` prefix if needed.
pub fn resolve_contig_name<V>(contig: &str, lookup: &HashMap<String, V>) -> Option<String> {
    if lookup.contains_key(contig) {
        return Some(contig.to_string());
    }

    let alternative = match contig.strip_prefix("chr") {
        Some(stripped) => stripped.to_string(),
        None => format!("chr{}", contig),
    };

    lookup.contains_key(&alternative).then_some(alternative)
}
