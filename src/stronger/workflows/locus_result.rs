use crate::stronger::{genotype::Confidence, locus::Locus, reads::ReadEvidence};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog coordinates of a locus as they appear in the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocusInfo {
    pub id: String,
    pub contig: String,
    pub start: u32,
    pub end: u32,
    pub motif: String,
}

impl From<&Locus> for LocusInfo {
    fn from(locus: &Locus) -> Self {
        LocusInfo {
            id: locus.id.clone(),
            contig: locus.region.contig.clone(),
            start: locus.region.start,
            end: locus.region.end,
            motif: locus.motif.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlleleCall {
    pub copy_number: f64,
    pub support: usize,
    /// Indices into the locus evidence.
    pub reads: Vec<usize>,
    pub ci95: Confidence,
    pub ci99: Confidence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoCallReason {
    InsufficientDepth,
    /// Sex chromosome without a sex chromosome configuration.
    UnknownPloidy,
    ZeroPloidy,
    InvalidLocus(String),
    ProcessingFailure(String),
}

impl fmt::Display for NoCallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoCallReason::InsufficientDepth => write!(f, "insufficient depth"),
            NoCallReason::UnknownPloidy => write!(f, "unknown ploidy"),
            NoCallReason::ZeroPloidy => write!(f, "zero ploidy"),
            NoCallReason::InvalidLocus(msg) => write!(f, "invalid locus: {}", msg),
            NoCallReason::ProcessingFailure(msg) => write!(f, "processing failure: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Call {
    Genotyped { alleles: Vec<AlleleCall> },
    NoCall { reason: NoCallReason },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub reads_seen: usize,
    pub reads_unusable: usize,
    pub reads_filtered: usize,
    pub bootstrap_iterations: usize,
    pub converged: bool,
    pub unresolved_alleles: usize,
    pub unassigned_reads: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocusResult {
    /// Position of the locus in the catalog.
    pub index: usize,
    /// Absent when the catalog entry could not be loaded.
    pub locus: Option<LocusInfo>,
    pub ref_copy_number: Option<f64>,
    pub evidence: Vec<ReadEvidence>,
    pub call: Call,
    pub diagnostics: Diagnostics,
}

impl LocusResult {
    pub fn no_call(index: usize, locus: Option<LocusInfo>, reason: NoCallReason) -> Self {
        LocusResult {
            index,
            locus,
            ref_copy_number: None,
            evidence: Vec::new(),
            call: Call::NoCall { reason },
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn alleles(&self) -> &[AlleleCall] {
        match &self.call {
            Call::Genotyped { alleles } => alleles,
            Call::NoCall { .. } => &[],
        }
    }

    pub fn no_call_reason(&self) -> Option<&NoCallReason> {
        match &self.call {
            Call::Genotyped { .. } => None,
            Call::NoCall { reason } => Some(reason),
        }
    }

    /// Loci skipped for lack of ploidy information are left out of the output.
    pub fn is_reported(&self) -> bool {
        self.no_call_reason() != Some(&NoCallReason::UnknownPloidy)
    }
}
