//! Estimates how many copies of a motif a sequence between two flanks holds.
//!
//! Candidate copy numbers are scored by aligning `left_flank + motif^n` against the
//! start of `left_flank + repeat + right_flank`, and `motif^n + right_flank` against its
//! end; the better of the two anchored alignments is the candidate's score. The best
//! candidate is found by hill-climbing from the length-based guess.

use bio::alignment::pairwise::{Aligner, Scoring, MIN_SCORE};
use std::collections::HashMap;

const MATCH_SCORE: i32 = 2;
const MISMATCH_PENALTY: i32 = 7;
const INDEL_PENALTY: i32 = 5;
/// Candidates checked on each side of the current best count.
const SEARCH_RADIUS: usize = 2;

fn match_fn(a: u8, b: u8) -> i32 {
    if a == b {
        MATCH_SCORE
    } else {
        -MISMATCH_PENALTY
    }
}

#[derive(Debug, Clone, Copy)]
enum Anchor {
    Start,
    End,
}

fn anchored_score(query: &[u8], db: &[u8], anchor: Anchor) -> i32 {
    let (yclip_prefix, yclip_suffix) = match anchor {
        Anchor::Start => (MIN_SCORE, 0),
        Anchor::End => (0, MIN_SCORE),
    };
    let scoring = Scoring {
        match_fn: match_fn as fn(u8, u8) -> i32,
        match_scores: Some((MATCH_SCORE, -MISMATCH_PENALTY)),
        gap_open: 0,
        gap_extend: -INDEL_PENALTY,
        xclip_prefix: MIN_SCORE,
        xclip_suffix: MIN_SCORE,
        yclip_prefix,
        yclip_suffix,
    };
    let mut aligner = Aligner::with_capacity_and_scoring(query.len(), db.len(), scoring);
    aligner.custom(query, db).score
}

/// Best copy number found for a sequence and its alignment score.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct RepeatCount {
    pub copy_number: f64,
    pub score: i32,
}

pub struct RepeatCounter<'a> {
    left_flank: &'a [u8],
    right_flank: &'a [u8],
    motif: &'a [u8],
    db: Vec<u8>,
    scores: HashMap<usize, i32>,
}

impl<'a> RepeatCounter<'a> {
    pub fn new(left_flank: &'a [u8], tr: &[u8], right_flank: &'a [u8], motif: &'a [u8]) -> Self {
        let db = [left_flank, tr, right_flank].concat();
        RepeatCounter {
            left_flank,
            right_flank,
            motif,
            db,
            scores: HashMap::new(),
        }
    }

    /// Length-based starting guess for a repeat of `tr_len` bases.
    pub fn initial_guess(tr_len: usize, motif_len: usize) -> usize {
        if motif_len == 0 {
            return 0;
        }
        (tr_len as f64 / motif_len as f64).round() as usize
    }

    fn score_repeat(&self, repeat: &[u8]) -> i32 {
        let forward = [self.left_flank, repeat].concat();
        let reverse = [repeat, self.right_flank].concat();
        let forward_score = anchored_score(&forward, &self.db, Anchor::Start);
        let reverse_score = anchored_score(&reverse, &self.db, Anchor::End);
        forward_score.max(reverse_score)
    }

    fn score_count(&mut self, count: usize) -> i32 {
        if let Some(&score) = self.scores.get(&count) {
            return score;
        }
        let score = self.score_repeat(&self.motif.repeat(count));
        self.scores.insert(count, score);
        score
    }

    /// Integer copy number with the highest score; ties go to the smaller count.
    pub fn estimate(&mut self, start_count: usize) -> (usize, i32) {
        let mut best_count = start_count;
        let mut best_score = self.score_count(start_count);

        loop {
            let low = best_count.saturating_sub(SEARCH_RADIUS);
            let high = best_count + SEARCH_RADIUS;
            let mut next = (best_count, best_score);
            for count in low..=high {
                let score = self.score_count(count);
                if score > next.1 || (score == next.1 && count < next.0) {
                    next = (count, score);
                }
            }
            if next.0 == best_count {
                return (best_count, best_score);
            }
            (best_count, best_score) = next;
        }
    }

    /// Copy number allowing a trailing partial motif, in steps of `1 / motif_len`.
    pub fn estimate_fractional(&mut self, start_count: usize) -> RepeatCount {
        let (count, score) = self.estimate(start_count);
        let motif_len = self.motif.len();
        let mut best = RepeatCount {
            copy_number: count as f64,
            score,
        };

        let mut bases = vec![count.saturating_sub(1)];
        if count > 0 {
            bases.push(count);
        }
        for base in bases {
            let full = self.motif.repeat(base);
            for partial_len in 1..motif_len {
                let repeat = [&full[..], &self.motif[..partial_len]].concat();
                let score = self.score_repeat(&repeat);
                if score > best.score {
                    best = RepeatCount {
                        copy_number: base as f64 + partial_len as f64 / motif_len as f64,
                        score,
                    };
                }
            }
        }

        best
    }

    pub fn estimate_integer(&mut self, start_count: usize) -> RepeatCount {
        let (count, score) = self.estimate(start_count);
        RepeatCount {
            copy_number: count as f64,
            score,
        }
    }
}
