//! Percentile bootstrap intervals for called alleles.
//!
//! Each iteration resamples the evidence with replacement, refits the mixture from the
//! final allele copy numbers and resolves alleles exactly like the full-data call. Every
//! resolved bootstrap allele is matched to the nearest called allele, and each called
//! allele keeps its closest match per iteration.

use super::{
    caller::{nearest_index, resolve_alleles, CalledAllele},
    mixture::fit_mixture,
};
use crate::stronger::config::RunConfig;
use crate::utils::percentile_nearest_rank;
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};

/// Minimum number of matched iterations an allele needs for an interval.
const MIN_MATCHES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Interval { lower: f64, upper: f64 },
    /// Too few bootstrap iterations matched the allele.
    Undetermined,
}

impl Confidence {
    /// Interval covering `level` percent of the sorted bootstrap estimates.
    fn from_estimates(sorted: &[f64], level: f64) -> Confidence {
        let tail = (100.0 - level) / 2.0;
        match (
            percentile_nearest_rank(sorted, tail),
            percentile_nearest_rank(sorted, 100.0 - tail),
        ) {
            (Some(lower), Some(upper)) => Confidence::Interval { lower, upper },
            _ => Confidence::Undetermined,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapSummary {
    pub ci95: Vec<Confidence>,
    pub ci99: Vec<Confidence>,
    pub iterations: usize,
}

/// Estimates 95% and 99% intervals for every allele in `alleles`.
pub fn estimate_confidence(
    values: &[f64],
    weights: &[f64],
    alleles: &[CalledAllele],
    config: &RunConfig,
    rng: &mut StdRng,
) -> BootstrapSummary {
    let num_alleles = alleles.len();
    if num_alleles == 0 || values.is_empty() {
        return BootstrapSummary {
            ci95: Vec::new(),
            ci99: Vec::new(),
            iterations: 0,
        };
    }

    let called: Vec<f64> = alleles.iter().map(|a| a.copy_number).collect();
    let mut matches: Vec<Vec<f64>> = vec![Vec::new(); num_alleles];
    let mut sample_values = vec![0.0; values.len()];
    let mut sample_weights = vec![0.0; values.len()];
    let mut iterations = 0;

    for _ in 0..config.num_bootstrap {
        for (value, weight) in sample_values.iter_mut().zip(sample_weights.iter_mut()) {
            let pick = rng.random_range(0..values.len());
            *value = values[pick];
            *weight = weights[pick];
        }

        let fit = fit_mixture(
            &sample_values,
            &sample_weights,
            &called,
            config.max_em_iterations,
        );
        if fit.means.iter().any(|m| !m.is_finite()) {
            continue;
        }
        iterations += 1;

        let (resampled, _) = resolve_alleles(
            &sample_values,
            &fit.means,
            config.copy_number_mode,
            config.min_allele_reads,
        );

        let mut best: Vec<Option<f64>> = vec![None; num_alleles];
        for allele in resampled {
            let target = nearest_index(&called, allele.copy_number);
            let distance = (allele.copy_number - called[target]).abs();
            let closer = match best[target] {
                Some(current) => distance < (current - called[target]).abs(),
                None => true,
            };
            if closer {
                best[target] = Some(allele.copy_number);
            }
        }
        for (allele_matches, estimate) in matches.iter_mut().zip(best) {
            if let Some(estimate) = estimate {
                allele_matches.push(estimate);
            }
        }
    }

    let mut ci95 = Vec::with_capacity(num_alleles);
    let mut ci99 = Vec::with_capacity(num_alleles);
    for mut estimates in matches {
        if estimates.len() < MIN_MATCHES || 2 * estimates.len() < iterations {
            ci95.push(Confidence::Undetermined);
            ci99.push(Confidence::Undetermined);
            continue;
        }
        estimates.sort_by(f64::total_cmp);
        ci95.push(Confidence::from_estimates(&estimates, 95.0));
        ci99.push(Confidence::from_estimates(&estimates, 99.0));
    }

    BootstrapSummary {
        ci95,
        ci99,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stronger::genotype::caller::call_alleles_from_values;
    use rand::SeedableRng;

    const TWO_ALLELES: [f64; 10] = [9.0, 9.0, 10.0, 9.0, 15.0, 16.0, 15.0, 15.0, 16.0, 15.0];

    fn bootstrap(
        values: &[f64],
        config: &RunConfig,
        seed: u64,
    ) -> (Vec<CalledAllele>, BootstrapSummary) {
        let weights = vec![1.0; values.len()];
        let calls = call_alleles_from_values(values, &weights, 2, config);
        let mut rng = StdRng::seed_from_u64(seed);
        let summary = estimate_confidence(values, &weights, &calls.alleles, config, &mut rng);
        (calls.alleles, summary)
    }

    #[test]
    fn identical_values_give_degenerate_interval() {
        let (alleles, summary) = bootstrap(&[20.0; 6], &RunConfig::default(), 7);
        assert_eq!(alleles.len(), 1);
        assert_eq!(summary.iterations, 100);
        assert_eq!(
            summary.ci95,
            vec![Confidence::Interval {
                lower: 20.0,
                upper: 20.0
            }]
        );
        assert_eq!(summary.ci99, summary.ci95);
    }

    #[test]
    fn intervals_contain_called_alleles() {
        let (alleles, summary) = bootstrap(&TWO_ALLELES, &RunConfig::default(), 11);
        assert_eq!(summary.ci95.len(), 2);
        for (allele, ci) in alleles.iter().zip(&summary.ci95) {
            match ci {
                Confidence::Interval { lower, upper } => {
                    assert!(*lower <= allele.copy_number && allele.copy_number <= *upper);
                    assert_eq!(lower.fract(), 0.0);
                    assert_eq!(upper.fract(), 0.0);
                }
                Confidence::Undetermined => panic!("Expected an interval"),
            }
        }
    }

    #[test]
    fn ci99_is_at_least_as_wide_as_ci95() {
        let (_, summary) = bootstrap(&TWO_ALLELES, &RunConfig::default(), 3);
        for (ci95, ci99) in summary.ci95.iter().zip(&summary.ci99) {
            if let (
                Confidence::Interval { lower: l95, upper: u95 },
                Confidence::Interval { lower: l99, upper: u99 },
            ) = (ci95, ci99)
            {
                assert!(l99 <= l95 && u95 <= u99);
            }
        }
    }

    #[test]
    fn same_seed_same_intervals() {
        let config = RunConfig::default();
        assert_eq!(bootstrap(&TWO_ALLELES, &config, 5), bootstrap(&TWO_ALLELES, &config, 5));
    }

    #[test]
    fn no_iterations_gives_undetermined() {
        let config = RunConfig {
            num_bootstrap: 0,
            ..RunConfig::default()
        };
        let (alleles, summary) = bootstrap(&TWO_ALLELES, &config, 1);
        assert_eq!(alleles.len(), 2);
        assert_eq!(summary.iterations, 0);
        assert!(summary.ci95.iter().all(|ci| *ci == Confidence::Undetermined));
    }

    #[test]
    fn num_bootstrap_does_not_change_point_estimate() {
        let few = RunConfig {
            num_bootstrap: 5,
            ..RunConfig::default()
        };
        let many = RunConfig {
            num_bootstrap: 200,
            ..RunConfig::default()
        };
        assert_eq!(bootstrap(&TWO_ALLELES, &few, 9).0, bootstrap(&TWO_ALLELES, &many, 9).0);
    }
}
