use super::AlignedRead;

/// Read coordinates of the two flanks around a repeat; all ends are exclusive.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FlankAnchors {
    pub left_flank_start: usize,
    pub left_flank_end: usize,
    pub right_flank_start: usize,
    pub right_flank_end: usize,
}

impl FlankAnchors {
    pub fn tr_span(&self) -> (usize, usize) {
        (self.left_flank_end, self.right_flank_start)
    }
}

/// Locates both flanks of the repeat `[tr_start, tr_end)` in the read.
///
/// The read must have aligned bases reaching the outer edge of each flank. Gaps
/// between the flank and the repeat are attributed to the repeat, never to the flank.
pub fn find_flank_anchors(
    read: &AlignedRead,
    tr_start: i64,
    tr_end: i64,
    flank_len: i64,
) -> Option<FlankAnchors> {
    let left_flank_coord = tr_start - flank_len;
    let right_flank_coord = tr_end + flank_len;

    let mut left_flank_start = None;
    let mut left_flank_end = None;
    let mut right_flank_start = None;
    let mut right_flank_end = None;

    for (query_pos, ref_pos) in read.cigar.matched_pairs() {
        if ref_pos >= tr_end && right_flank_start.is_none() {
            right_flank_start = Some(query_pos);
        }

        if ref_pos <= left_flank_coord {
            left_flank_start = Some(query_pos);
        } else if ref_pos < tr_start {
            left_flank_end = Some(query_pos + 1);
        } else if ref_pos >= right_flank_coord {
            right_flank_end = Some(query_pos);
            break;
        }
    }

    let anchors = FlankAnchors {
        left_flank_start: left_flank_start?,
        left_flank_end: left_flank_end?,
        right_flank_start: right_flank_start?,
        right_flank_end: right_flank_end?,
    };

    let ordered = anchors.left_flank_start < anchors.left_flank_end
        && anchors.left_flank_end <= anchors.right_flank_start
        && anchors.right_flank_start < anchors.right_flank_end
        && anchors.right_flank_end <= read.bases.len();
    ordered.then_some(anchors)
}
