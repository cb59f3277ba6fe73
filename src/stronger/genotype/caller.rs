use super::mixture::{fit_mixture, group_means, seed_groups};
use crate::stronger::{
    config::{CopyNumberMode, RunConfig},
    reads::FilteredEvidenceSet,
};
use itertools::Itertools;

/// An allele with the indices of the evidence assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct CalledAllele {
    pub copy_number: f64,
    pub reads: Vec<usize>,
}

impl CalledAllele {
    pub fn support(&self) -> usize {
        self.reads.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlleleCallSet {
    /// Alleles in ascending copy number order.
    pub alleles: Vec<CalledAllele>,
    pub converged: bool,
    /// Expected alleles that could not be called.
    pub unresolved_alleles: usize,
    /// Evidence that ended up in a dropped component.
    pub unassigned_reads: usize,
}

/// Clusters the evidence into at most `ploidy` alleles.
pub fn call_alleles(
    evidence: &FilteredEvidenceSet,
    ploidy: usize,
    config: &RunConfig,
) -> AlleleCallSet {
    let values = evidence.copy_numbers();
    let weights = evidence.normalized_weights(config.read_weighting);
    call_alleles_from_values(&values, &weights, ploidy, config)
}

pub(super) fn call_alleles_from_values(
    values: &[f64],
    weights: &[f64],
    ploidy: usize,
    config: &RunConfig,
) -> AlleleCallSet {
    let distinct = values
        .iter()
        .copied()
        .sorted_by(f64::total_cmp)
        .dedup()
        .count();
    let k = ploidy.min(distinct);

    let (means, converged) = match k {
        0 => (Vec::new(), true),
        1 if distinct == 1 => (vec![values[0]], true),
        _ => {
            let groups = seed_groups(values, k);
            let initial_means = group_means(values, weights, &groups);
            let fit = fit_mixture(values, weights, &initial_means, config.max_em_iterations);
            if !fit.converged {
                log::debug!(
                    "Mixture fit stopped after {} iterations without converging",
                    fit.iterations
                );
            }
            (fit.means, fit.converged)
        }
    };

    let (alleles, unassigned_reads) =
        resolve_alleles(values, &means, config.copy_number_mode, config.min_allele_reads);

    AlleleCallSet {
        unresolved_alleles: ploidy.saturating_sub(alleles.len()),
        alleles,
        converged,
        unassigned_reads,
    }
}

/// Turns component means into alleles: means are rounded (integer mode) or clamped,
/// coinciding components merge, every value joins its nearest allele, and alleles with
/// fewer than `min_allele_reads` values are dropped along with their values.
///
/// Returns the alleles and the number of dropped values.
pub(super) fn resolve_alleles(
    values: &[f64],
    means: &[f64],
    mode: CopyNumberMode,
    min_allele_reads: usize,
) -> (Vec<CalledAllele>, usize) {
    let candidates = means
        .iter()
        .filter(|m| m.is_finite())
        .map(|&m| match mode {
            CopyNumberMode::Integer => non_negative(m.round()),
            CopyNumberMode::Fractional => non_negative(m),
        })
        .sorted_by(f64::total_cmp)
        .dedup_by(|a, b| merge_key(*a, mode) == merge_key(*b, mode))
        .collect_vec();

    if candidates.is_empty() {
        return (Vec::new(), values.len());
    }

    let mut members = vec![Vec::new(); candidates.len()];
    for (read_index, &value) in values.iter().enumerate() {
        members[nearest_index(&candidates, value)].push(read_index);
    }

    let mut alleles = Vec::with_capacity(candidates.len());
    let mut unassigned = 0;
    for (copy_number, reads) in candidates.into_iter().zip(members) {
        if reads.len() >= min_allele_reads && !reads.is_empty() {
            alleles.push(CalledAllele { copy_number, reads });
        } else {
            unassigned += reads.len();
        }
    }

    (alleles, unassigned)
}

fn non_negative(copy_number: f64) -> f64 {
    if copy_number > 0.0 {
        copy_number
    } else {
        0.0
    }
}

fn merge_key(copy_number: f64, mode: CopyNumberMode) -> i64 {
    match mode {
        CopyNumberMode::Integer => copy_number.round() as i64,
        CopyNumberMode::Fractional => (copy_number * 10.0).round() as i64,
    }
}

/// Index of the candidate closest to `value`; ties go to the smaller candidate.
pub(super) fn nearest_index(candidates: &[f64], value: f64) -> usize {
    let mut best = 0;
    for (index, candidate) in candidates.iter().enumerate().skip(1) {
        if (value - candidate).abs() < (value - candidates[best]).abs() {
            best = index;
        }
    }
    best
}
