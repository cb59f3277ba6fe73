use crate::stronger::genotype::MAX_ITERATIONS;
use crate::utils::SexChromosomes;
use serde::{Deserialize, Serialize};

/// How read copy numbers and allele calls are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyNumberMode {
    /// Whole motif copies; allele means are rounded to the nearest integer.
    Integer,
    /// Partial motif copies allowed; allele means are kept continuous.
    Fractional,
}

/// How much influence each read has on the allele means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadWeighting {
    /// Reads are weighted to correct for the bias against long alleles in long reads.
    LengthCorrected,
    /// Enrichment data: every read is raised to the largest weight in the set.
    Targeted,
}

/// Immutable settings for a run, shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub min_reads: usize,
    pub min_allele_reads: usize,
    pub min_avg_phred: f64,
    pub flank_len: usize,
    pub num_bootstrap: usize,
    pub sex_chroms: Option<SexChromosomes>,
    pub copy_number_mode: CopyNumberMode,
    pub read_weighting: ReadWeighting,
    /// Iteration cap for mixture fitting; a fit reaching it is flagged as not converged.
    pub max_em_iterations: usize,
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            min_reads: 4,
            min_allele_reads: 2,
            min_avg_phred: 13.0,
            flank_len: 70,
            num_bootstrap: 100,
            sex_chroms: None,
            copy_number_mode: CopyNumberMode::Integer,
            read_weighting: ReadWeighting::LengthCorrected,
            max_em_iterations: MAX_ITERATIONS,
            seed: 0,
        }
    }
}

/// Seed for the random generator of one locus, independent of worker count and scheduling.
pub fn derive_locus_seed(global_seed: u64, locus_index: usize) -> u64 {
    // SplitMix64 finalizer over the combined state
    let mut z = global_seed
        .wrapping_add((locus_index as u64).wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_thresholds() {
        let config = RunConfig::default();
        assert_eq!(config.min_reads, 4);
        assert_eq!(config.min_allele_reads, 2);
        assert_eq!(config.min_avg_phred, 13.0);
        assert_eq!(config.flank_len, 70);
        assert_eq!(config.num_bootstrap, 100);
        assert_eq!(config.copy_number_mode, CopyNumberMode::Integer);
        assert_eq!(config.read_weighting, ReadWeighting::LengthCorrected);
        assert_eq!(config.max_em_iterations, MAX_ITERATIONS);
    }

    #[test]
    fn locus_seed_is_deterministic() {
        assert_eq!(derive_locus_seed(42, 7), derive_locus_seed(42, 7));
    }

    #[test]
    fn locus_seeds_differ_between_loci_and_runs() {
        let seeds: HashSet<u64> = (0..1000).map(|i| derive_locus_seed(42, i)).collect();
        assert_eq!(seeds.len(), 1000);
        assert_ne!(derive_locus_seed(1, 0), derive_locus_seed(2, 0));
    }
}
