//! Weighted one-dimensional Gaussian mixture fitted by expectation-maximization.
//!
//! Component means are seeded by cutting a Ward dendrogram of the observations into
//! `k` groups, so a fit depends only on its input and never on a random draw. Large
//! sets are seeded from an evenly spaced sample of their sorted values.

use itertools::Itertools;
use kodama::{linkage, Method};
use std::f64::consts::PI;

/// Smallest variance a component may shrink to; keeps tight clusters of identical
/// integer counts from collapsing the likelihood.
pub const MIN_VARIANCE: f64 = 0.25;
/// Convergence threshold on the change in weighted mean log-likelihood.
pub const LL_TOLERANCE: f64 = 1e-8;
/// Default iteration cap for EM.
pub const MAX_ITERATIONS: usize = 500;
/// Most observations a Ward linkage is computed over.
pub const MAX_LINKAGE_VALUES: usize = 500;

/// Fitted components; every vector has one entry per component.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureFit {
    pub means: Vec<f64>,
    pub mixing: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Splits the observations into at most `k` groups by Ward linkage.
///
/// Groups are returned as observation indices, ordered by their smallest value.
pub fn seed_groups(values: &[f64], k: usize) -> Vec<Vec<usize>> {
    let n = values.len();
    if n == 0 || k == 0 {
        return Vec::new();
    }
    if k == 1 || n == 1 {
        return vec![(0..n).collect()];
    }
    if k >= n {
        return (0..n)
            .map(|i| vec![i])
            .sorted_by(|a, b| cmp_values(values, a, b))
            .collect();
    }
    if n > MAX_LINKAGE_VALUES {
        return sampled_seed_groups(values, k);
    }

    let mut dists = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n - 1 {
        for j in i + 1..n {
            dists.push((values[i] - values[j]).abs());
        }
    }
    let dendrogram = linkage(&mut dists, n, Method::Ward);

    // Replay merges until k clusters remain; step i creates cluster n + i
    let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    members.resize(2 * n - 1, Vec::new());
    for (step_index, step) in dendrogram.steps().iter().take(n - k).enumerate() {
        let mut merged = std::mem::take(&mut members[step.cluster1]);
        merged.append(&mut std::mem::take(&mut members[step.cluster2]));
        members[n + step_index] = merged;
    }

    members
        .into_iter()
        .filter(|group| !group.is_empty())
        .map(|group| group.into_iter().sorted().collect_vec())
        .sorted_by(|a, b| cmp_values(values, a, b))
        .collect()
}

/// Groups a large set by linking an evenly spaced sample of its sorted values, then
/// assigning every observation to the nearest sample group center.
fn sampled_seed_groups(values: &[f64], k: usize) -> Vec<Vec<usize>> {
    let sorted = (0..values.len())
        .sorted_by(|&a, &b| values[a].total_cmp(&values[b]))
        .collect_vec();
    let step = values.len() as f64 / MAX_LINKAGE_VALUES as f64;
    let sample = (0..MAX_LINKAGE_VALUES)
        .map(|i| values[sorted[(i as f64 * step).floor() as usize]])
        .collect_vec();

    let centers = seed_groups(&sample, k)
        .iter()
        .map(|group| group.iter().map(|&i| sample[i]).sum::<f64>() / group.len() as f64)
        .sorted_by(f64::total_cmp)
        .collect_vec();

    let mut groups = vec![Vec::new(); centers.len()];
    for (i, &x) in values.iter().enumerate() {
        groups[nearest_center(&centers, x)].push(i);
    }
    groups.retain(|group| !group.is_empty());
    groups
}

fn nearest_center(centers: &[f64], value: f64) -> usize {
    let mut best = 0;
    for (index, center) in centers.iter().enumerate().skip(1) {
        if (value - center).abs() < (value - centers[best]).abs() {
            best = index;
        }
    }
    best
}

fn cmp_values(values: &[f64], a: &[usize], b: &[usize]) -> std::cmp::Ordering {
    let min_of = |group: &[usize]| {
        group
            .iter()
            .map(|&i| values[i])
            .fold(f64::INFINITY, f64::min)
    };
    min_of(a).total_cmp(&min_of(b))
}

/// Weighted means of each group.
pub fn group_means(values: &[f64], weights: &[f64], groups: &[Vec<usize>]) -> Vec<f64> {
    groups
        .iter()
        .map(|group| {
            let total_weight: f64 = group.iter().map(|&i| weights[i]).sum();
            if total_weight > 0.0 {
                group.iter().map(|&i| weights[i] * values[i]).sum::<f64>() / total_weight
            } else {
                group.iter().map(|&i| values[i]).sum::<f64>() / group.len() as f64
            }
        })
        .collect()
}

fn log_density(x: f64, mean: f64, variance: f64) -> f64 {
    -0.5 * (2.0 * PI * variance).ln() - (x - mean).powi(2) / (2.0 * variance)
}

fn log_sum_exp(terms: &[f64]) -> f64 {
    let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return max;
    }
    max + terms.iter().map(|t| (t - max).exp()).sum::<f64>().ln()
}

/// Runs EM from the given initial means until the weighted mean log-likelihood
/// stabilizes or `max_iterations` is reached.
///
/// Initial variances are the pooled weighted variance around the nearest initial
/// mean, and initial mixing proportions are equal.
pub fn fit_mixture(
    values: &[f64],
    weights: &[f64],
    initial_means: &[f64],
    max_iterations: usize,
) -> MixtureFit {
    let k = initial_means.len();
    let total_weight: f64 = weights.iter().sum();
    let mut means = initial_means.to_vec();
    let mut variances = vec![initial_variance(values, weights, &means); k];
    let mut mixing = vec![1.0 / k as f64; k];

    let mut responsibilities = vec![vec![0.0; k]; values.len()];
    let mut log_terms = vec![0.0; k];
    let mut previous_ll: Option<f64> = None;
    let mut converged = false;
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;

        // E-step
        let mut weighted_ll = 0.0;
        for (i, &x) in values.iter().enumerate() {
            for j in 0..k {
                log_terms[j] = if mixing[j] > 0.0 {
                    mixing[j].ln() + log_density(x, means[j], variances[j])
                } else {
                    f64::NEG_INFINITY
                };
            }
            let point_ll = log_sum_exp(&log_terms);
            for j in 0..k {
                responsibilities[i][j] = (log_terms[j] - point_ll).exp();
            }
            weighted_ll += weights[i] * point_ll;
        }
        let log_likelihood = weighted_ll / total_weight;

        // M-step
        for j in 0..k {
            let component_weight: f64 = values
                .iter()
                .enumerate()
                .map(|(i, _)| weights[i] * responsibilities[i][j])
                .sum();
            mixing[j] = component_weight / total_weight;
            if component_weight <= f64::EPSILON {
                continue;
            }
            means[j] = values
                .iter()
                .enumerate()
                .map(|(i, &x)| weights[i] * responsibilities[i][j] * x)
                .sum::<f64>()
                / component_weight;
            let spread = values
                .iter()
                .enumerate()
                .map(|(i, &x)| weights[i] * responsibilities[i][j] * (x - means[j]).powi(2))
                .sum::<f64>()
                / component_weight;
            variances[j] = spread.max(MIN_VARIANCE);
        }

        if let Some(previous) = previous_ll {
            if (log_likelihood - previous).abs() < LL_TOLERANCE {
                converged = true;
                break;
            }
        }
        previous_ll = Some(log_likelihood);
    }

    MixtureFit {
        means,
        mixing,
        iterations,
        converged,
    }
}

fn initial_variance(values: &[f64], weights: &[f64], means: &[f64]) -> f64 {
    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        return MIN_VARIANCE;
    }
    let spread: f64 = values
        .iter()
        .zip(weights)
        .map(|(&x, &w)| {
            let nearest = means
                .iter()
                .map(|m| (x - m).powi(2))
                .fold(f64::INFINITY, f64::min);
            w * nearest
        })
        .sum();
    (spread / total_weight).max(MIN_VARIANCE)
}
