pub type CigarOp = rust_htslib::bam::record::Cigar;

pub trait CigarOpExt {
    fn get_ref_len(&self) -> i64;
    fn get_query_len(&self) -> i64;
    fn is_aligned_match(&self) -> bool;
}

impl CigarOpExt for CigarOp {
    fn get_ref_len(&self) -> i64 {
        match self {
            CigarOp::Match(len)
            | CigarOp::RefSkip(len)
            | CigarOp::Del(len)
            | CigarOp::Equal(len)
            | CigarOp::Diff(len) => *len as i64,
            CigarOp::Ins(_) | CigarOp::SoftClip(_) | CigarOp::HardClip(_) | CigarOp::Pad(_) => 0,
        }
    }

    fn get_query_len(&self) -> i64 {
        match self {
            CigarOp::Match(len)
            | CigarOp::Equal(len)
            | CigarOp::Diff(len)
            | CigarOp::Ins(len)
            | CigarOp::SoftClip(len) => *len as i64,
            CigarOp::RefSkip(_) | CigarOp::Del(_) | CigarOp::HardClip(_) | CigarOp::Pad(_) => 0,
        }
    }

    fn is_aligned_match(&self) -> bool {
        matches!(
            self,
            CigarOp::Match(_) | CigarOp::Equal(_) | CigarOp::Diff(_)
        )
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Cigar {
    pub ref_pos: i64,
    pub ops: Vec<CigarOp>,
}

impl Cigar {
    /// Number of read bases in the alignment, soft clips excluded.
    pub fn aligned_query_len(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| !matches!(op, CigarOp::SoftClip(_)))
            .map(|op| op.get_query_len() as usize)
            .sum()
    }

    pub fn ref_len(&self) -> i64 {
        self.ops.iter().map(|op| op.get_ref_len()).sum()
    }

    /// Iterates over `(query_pos, ref_pos)` for aligned bases only, in alignment order.
    pub fn matched_pairs(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        let mut query_pos = 0_i64;
        let mut ref_pos = self.ref_pos;
        self.ops.iter().flat_map(move |op| {
            let (op_query_start, op_ref_start) = (query_pos, ref_pos);
            query_pos += op.get_query_len();
            ref_pos += op.get_ref_len();
            let len = if op.is_aligned_match() {
                op.get_ref_len()
            } else {
                0
            };
            (0..len).map(move |i| ((op_query_start + i) as usize, op_ref_start + i))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_query_len() {
        let cigar = Cigar {
            ref_pos: 0,
            ops: vec![
                CigarOp::SoftClip(4),
                CigarOp::Match(10),
                CigarOp::Ins(5),
                CigarOp::Del(3),
                CigarOp::SoftClip(2),
            ],
        };
        assert_eq!(cigar.aligned_query_len(), 15);
    }

    #[test]
    fn test_get_ref_len() {
        assert_eq!(CigarOp::Match(10).get_ref_len(), 10);
        assert_eq!(CigarOp::Ins(5).get_ref_len(), 0);
        assert_eq!(CigarOp::Del(3).get_ref_len(), 3);
        assert_eq!(CigarOp::SoftClip(2).get_ref_len(), 0);
    }

    #[test]
    fn test_get_query_len() {
        assert_eq!(CigarOp::Match(10).get_query_len(), 10);
        assert_eq!(CigarOp::Ins(5).get_query_len(), 5);
        assert_eq!(CigarOp::Del(3).get_query_len(), 0);
        assert_eq!(CigarOp::SoftClip(2).get_query_len(), 2);
    }

    #[test]
    fn test_matched_pairs_skip_gaps_and_clips() {
        let cigar = Cigar {
            ref_pos: 100,
            ops: vec![
                CigarOp::SoftClip(2),
                CigarOp::Match(2),
                CigarOp::Ins(1),
                CigarOp::Equal(1),
                CigarOp::Del(2),
                CigarOp::Diff(1),
                CigarOp::HardClip(5),
            ],
        };
        let pairs: Vec<(usize, i64)> = cigar.matched_pairs().collect();
        assert_eq!(pairs, vec![(2, 100), (3, 101), (5, 102), (6, 105)]);
    }
}
