mod anchor;
mod cigar;
mod evidence;
mod read;
mod repeat_count;
mod source;

pub use anchor::{find_flank_anchors, FlankAnchors};
pub use cigar::{Cigar, CigarOp, CigarOpExt};
pub use evidence::{
    extract_evidence, filter_evidence, ExtractedEvidence, FilteredEvidenceSet, ReadEvidence,
};
pub use read::AlignedRead;
pub use repeat_count::{RepeatCount, RepeatCounter};
pub use source::{BamReadSource, InMemoryReadSource, ReadSource};
