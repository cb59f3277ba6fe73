//! Per-read repeat length evidence and the quality filter applied to it.
//!

use super::{anchor::find_flank_anchors, repeat_count::RepeatCounter, AlignedRead};
use crate::stronger::{
    config::{CopyNumberMode, ReadWeighting, RunConfig},
    locus::Locus,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Extra flank bases kept beyond the flank size to absorb small indels.
const FLANK_LEEWAY: usize = 10;

/// One read's estimate of the repeat copy number at a locus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadEvidence {
    pub read_id: String,
    pub copy_number: f64,
    /// Mean PHRED over the flank + repeat span; `None` if the read has no qualities.
    pub avg_phred: Option<f64>,
    /// Length-bias correction weight.
    pub weight: f64,
    pub targeted: bool,
}

#[derive(Debug, Default)]
pub struct ExtractedEvidence {
    pub evidence: Vec<ReadEvidence>,
    pub reads_seen: usize,
    pub reads_unusable: usize,
}

/// Builds one piece of evidence per read anchored on both flanks of the locus.
///
/// Reads that cannot be anchored are counted as unusable; reads sharing a name with
/// an earlier read are ignored.
pub fn extract_evidence(
    locus: &Locus,
    reads: &[AlignedRead],
    config: &RunConfig,
) -> ExtractedEvidence {
    let mut extracted = ExtractedEvidence::default();
    let mut seen_ids = HashSet::new();
    let flank_len = config.flank_len;
    let motif = locus.motif.as_bytes();
    let targeted = config.read_weighting == ReadWeighting::Targeted;

    for read in reads {
        if !seen_ids.insert(read.id.as_str()) {
            continue;
        }
        extracted.reads_seen += 1;

        let anchors = match find_flank_anchors(
            read,
            locus.region.start as i64,
            locus.region.end as i64,
            flank_len as i64,
        ) {
            Some(anchors) => anchors,
            None => {
                log::trace!("{}: read {} lacks flanking sequence", locus.id, read.id);
                extracted.reads_unusable += 1;
                continue;
            }
        };

        let (tr_start, tr_end) = anchors.tr_span();
        let tr_seq = &read.bases[tr_start..tr_end];

        // Keep only the outer part of each flank so misplaced repeat bases stay out
        let kept_flank = flank_len + FLANK_LEEWAY;
        let left_flank = &read.bases[anchors.left_flank_start..tr_start];
        let left_flank = &left_flank[..left_flank.len().min(kept_flank)];
        let right_flank = &read.bases[tr_end..anchors.right_flank_end];
        let right_flank = &right_flank[right_flank.len().saturating_sub(kept_flank)..];

        let mut counter = RepeatCounter::new(left_flank, tr_seq, right_flank, motif);
        let start_count = RepeatCounter::initial_guess(tr_seq.len(), motif.len());
        let count = match config.copy_number_mode {
            CopyNumberMode::Integer => counter.estimate_integer(start_count),
            CopyNumberMode::Fractional => counter.estimate_fractional(start_count),
        };

        let read_len = read.cigar.aligned_query_len();
        let tr_flank_len = tr_seq.len() + left_flank.len() + right_flank.len();

        extracted.evidence.push(ReadEvidence {
            read_id: read.id.clone(),
            copy_number: count.copy_number,
            avg_phred: read.average_qual(anchors.left_flank_start, anchors.right_flank_end),
            weight: length_bias_weight(read_len, tr_flank_len),
            targeted,
        });
    }

    extracted
}

/// Up-weights reads whose flank + repeat span takes up more of the read, since
/// fewer reads of a given length can span a longer allele.
fn length_bias_weight(read_len: usize, tr_flank_len: usize) -> f64 {
    let read_len = read_len as f64;
    let tr_flank_len = tr_flank_len as f64;
    let spanning_positions = (read_len - tr_flank_len + 1.0).max(1.0);
    (read_len + tr_flank_len - 2.0).max(1.0) / spanning_positions
}

/// Evidence that passed the quality filter, in read order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredEvidenceSet {
    evidence: Vec<ReadEvidence>,
    num_filtered: usize,
}

impl FilteredEvidenceSet {
    pub fn new(evidence: Vec<ReadEvidence>) -> Self {
        FilteredEvidenceSet {
            evidence,
            num_filtered: 0,
        }
    }

    /// Number of reads that passed the filter.
    pub fn num_passing(&self) -> usize {
        self.evidence.len()
    }

    pub fn num_filtered(&self) -> usize {
        self.num_filtered
    }

    pub fn into_evidence(self) -> Vec<ReadEvidence> {
        self.evidence
    }

    pub fn copy_numbers(&self) -> Vec<f64> {
        self.evidence.iter().map(|e| e.copy_number).collect()
    }

    /// Read weights scaled to average 1.
    pub fn normalized_weights(&self, weighting: ReadWeighting) -> Vec<f64> {
        let raw: Vec<f64> = match weighting {
            ReadWeighting::LengthCorrected => self.evidence.iter().map(|e| e.weight).collect(),
            ReadWeighting::Targeted => {
                let max_weight = self
                    .evidence
                    .iter()
                    .map(|e| e.weight)
                    .fold(f64::MIN_POSITIVE, f64::max);
                vec![max_weight; self.evidence.len()]
            }
        };
        let total: f64 = raw.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return vec![1.0; raw.len()];
        }
        let scale = raw.len() as f64 / total;
        raw.into_iter().map(|w| w * scale).collect()
    }
}

/// Keeps evidence whose average PHRED reaches `min_avg_phred`. Reads without base
/// qualities cannot be judged and are kept.
pub fn filter_evidence(evidence: Vec<ReadEvidence>, min_avg_phred: f64) -> FilteredEvidenceSet {
    let total = evidence.len();
    let kept: Vec<ReadEvidence> = evidence
        .into_iter()
        .filter(|e| e.avg_phred.map_or(true, |phred| phred >= min_avg_phred))
        .collect();
    FilteredEvidenceSet {
        num_filtered: total - kept.len(),
        evidence: kept,
    }
}
