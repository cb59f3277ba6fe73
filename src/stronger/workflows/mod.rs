mod locus_result;
mod repeat;

pub use locus_result::{AlleleCall, Call, Diagnostics, LocusInfo, LocusResult, NoCallReason};
pub use repeat::analyze;
