use super::{AlleleCall, Call, Diagnostics, LocusInfo, LocusResult, NoCallReason};
use crate::stronger::{
    config::{CopyNumberMode, RunConfig},
    genotype::{call_alleles, estimate_confidence},
    locus::Locus,
    reads::{extract_evidence, filter_evidence, ReadSource, RepeatCounter},
};
use crate::utils::Result;
use rand::rngs::StdRng;

/// Genotypes one locus: fetch reads, extract and filter evidence, call alleles and
/// bootstrap their intervals.
///
/// Evidence shortfalls become no-calls; only read source failures are returned as errors.
pub fn analyze<S: ReadSource + ?Sized>(
    index: usize,
    locus: &Locus,
    config: &RunConfig,
    source: &mut S,
    rng: &mut StdRng,
) -> Result<LocusResult> {
    let info = Some(LocusInfo::from(locus));
    let ploidy = match locus.ploidy {
        None => {
            log::debug!("{}: Skipping locus on sex chromosome of unknown ploidy", locus.id);
            return Ok(LocusResult::no_call(index, info, NoCallReason::UnknownPloidy));
        }
        Some(0) => return Ok(LocusResult::no_call(index, info, NoCallReason::ZeroPloidy)),
        Some(ploidy) => ploidy,
    };

    let ref_copy_number = reference_copy_number(locus, config.copy_number_mode);

    let flank_len = config.flank_len as i64;
    let reads = source.fetch(
        &locus.region.contig,
        locus.region.start as i64 - flank_len,
        locus.region.end as i64 + flank_len,
    )?;

    let extracted = extract_evidence(locus, &reads, config);
    let evidence = filter_evidence(extracted.evidence, config.min_avg_phred);
    log::debug!(
        "{}: {} reads seen, {} unusable, {} below quality threshold",
        locus.id,
        extracted.reads_seen,
        extracted.reads_unusable,
        evidence.num_filtered()
    );

    let mut diagnostics = Diagnostics {
        reads_seen: extracted.reads_seen,
        reads_unusable: extracted.reads_unusable,
        reads_filtered: evidence.num_filtered(),
        ..Diagnostics::default()
    };

    if evidence.num_passing() < config.min_reads {
        return Ok(LocusResult {
            index,
            locus: info,
            ref_copy_number: Some(ref_copy_number),
            evidence: evidence.into_evidence(),
            call: Call::NoCall {
                reason: NoCallReason::InsufficientDepth,
            },
            diagnostics,
        });
    }

    let calls = call_alleles(&evidence, ploidy, config);
    let values = evidence.copy_numbers();
    let weights = evidence.normalized_weights(config.read_weighting);
    let bootstrap = estimate_confidence(&values, &weights, &calls.alleles, config, rng);

    diagnostics.bootstrap_iterations = bootstrap.iterations;
    diagnostics.converged = calls.converged;
    diagnostics.unresolved_alleles = calls.unresolved_alleles;
    diagnostics.unassigned_reads = calls.unassigned_reads;
    if !calls.converged {
        log::warn!("{}: Allele mixture did not fully converge", locus.id);
    }

    let alleles = calls
        .alleles
        .into_iter()
        .zip(bootstrap.ci95)
        .zip(bootstrap.ci99)
        .map(|((allele, ci95), ci99)| AlleleCall {
            copy_number: allele.copy_number,
            support: allele.support(),
            reads: allele.reads,
            ci95,
            ci99,
        })
        .collect();

    Ok(LocusResult {
        index,
        locus: info,
        ref_copy_number: Some(ref_copy_number),
        evidence: evidence.into_evidence(),
        call: Call::Genotyped { alleles },
        diagnostics,
    })
}

/// Copy number of the reference repeat, scored the same way as reads.
fn reference_copy_number(locus: &Locus, mode: CopyNumberMode) -> f64 {
    let motif = locus.motif.as_bytes();
    let mut counter = RepeatCounter::new(
        locus.left_flank.as_bytes(),
        locus.tr.as_bytes(),
        locus.right_flank.as_bytes(),
        motif,
    );
    let start_count = RepeatCounter::initial_guess(locus.tr.len(), motif.len());
    let count = match mode {
        CopyNumberMode::Integer => counter.estimate_integer(start_count),
        CopyNumberMode::Fractional => counter.estimate_fractional(start_count),
    };
    count.copy_number
}
