//! Synthetic loci and reads shared by unit tests.

use crate::stronger::{
    config::RunConfig,
    locus::Locus,
    reads::{AlignedRead, Cigar, CigarOp, InMemoryReadSource, ReadEvidence},
};

pub const LEFT_FLANK: &str = "GATTACAGGCTTAACCGTTAGCAGTCCATG";
pub const RIGHT_FLANK: &str = "TTGACCATGGACTTCAAGGTCAGGCATTAC";
pub const LOCUS_START: u32 = 1000;
pub const REF_COPIES: usize = 10;

/// CAG repeat with ten reference copies at `contig:1000-1030`.
pub fn test_locus(contig: &str) -> Locus {
    Locus::new_for_test(
        contig,
        LOCUS_START,
        "CAG",
        (LEFT_FLANK, RIGHT_FLANK),
        &"CAG".repeat(REF_COPIES),
    )
}

/// Read spanning the test locus with `copies` CAG units, aligned with a single
/// insertion or deletion at the end of the repeat.
pub fn spanning_read(id: &str, copies: usize, qual: u8) -> AlignedRead {
    let tr = "CAG".repeat(copies);
    let ref_tr_len = 3 * REF_COPIES;
    let bases = format!("{}{}{}", LEFT_FLANK, tr, RIGHT_FLANK).into_bytes();
    let ops = if tr.len() >= ref_tr_len {
        vec![
            CigarOp::Match((LEFT_FLANK.len() + ref_tr_len) as u32),
            CigarOp::Ins((tr.len() - ref_tr_len) as u32),
            CigarOp::Match(RIGHT_FLANK.len() as u32),
        ]
    } else {
        vec![
            CigarOp::Match((LEFT_FLANK.len() + tr.len()) as u32),
            CigarOp::Del((ref_tr_len - tr.len()) as u32),
            CigarOp::Match(RIGHT_FLANK.len() as u32),
        ]
    };
    AlignedRead {
        id: id.to_string(),
        quals: vec![qual; bases.len()],
        bases,
        cigar: Cigar {
            ref_pos: LOCUS_START as i64 - LEFT_FLANK.len() as i64,
            ops,
        },
    }
}

/// Adds one high quality spanning read per entry of `copies` on `contig`.
pub fn add_reads(source: &mut InMemoryReadSource, contig: &str, copies: &[usize]) {
    for (i, &count) in copies.iter().enumerate() {
        source.add_read(contig, spanning_read(&format!("{}-read{}", contig, i), count, 30));
    }
}

/// Settings that fit the short flanks of the test locus.
pub fn test_config() -> RunConfig {
    RunConfig {
        flank_len: 20,
        num_bootstrap: 50,
        seed: 42,
        ..RunConfig::default()
    }
}

/// Evidence with the given copy numbers, good quality and unit weights.
pub fn evidence_for_test(copy_numbers: &[f64]) -> Vec<ReadEvidence> {
    copy_numbers
        .iter()
        .enumerate()
        .map(|(i, &copy_number)| ReadEvidence {
            read_id: format!("read{}", i),
            copy_number,
            avg_phred: Some(30.0),
            weight: 1.0,
            targeted: false,
        })
        .collect()
}
