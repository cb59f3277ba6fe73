//! Fans loci out to a worker pool and gathers their results in catalog order.

use crate::stronger::{
    config::{derive_locus_seed, RunConfig},
    locus::{Locus, LocusTask},
    reads::ReadSource,
    workflows::{analyze, LocusInfo, LocusResult, NoCallReason},
};
use crate::utils::Result;
use crossbeam_channel::{bounded, Receiver};
use rand::{rngs::StdRng, SeedableRng};
use rayon::{
    iter::{ParallelBridge, ParallelIterator},
    ThreadPoolBuilder,
};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    thread,
};

pub const CHANNEL_BUFFER_SIZE: usize = 2048;

/// Genotypes every task received on `tasks` using `num_workers` threads.
///
/// Each worker opens its own read source with `open_source`. Failures are confined to
/// the locus they happen in and reported as no-calls. Results are sorted by catalog index.
pub fn run_loci<S, F>(
    tasks: Receiver<LocusTask>,
    config: &RunConfig,
    num_workers: usize,
    open_source: F,
) -> Result<Vec<LocusResult>>
where
    S: ReadSource,
    F: Fn() -> Result<S> + Send + Sync,
{
    log::debug!("Initializing thread pool with {} threads...", num_workers);
    let pool = initialize_thread_pool(num_workers)?;

    let (sender_result, receiver_result) = bounded(CHANNEL_BUFFER_SIZE);
    let collector_thread =
        thread::spawn(move || receiver_result.into_iter().collect::<Vec<LocusResult>>());

    pool.install(|| {
        tasks.into_iter().par_bridge().for_each_init(
            || open_source(),
            |source, (index, task)| {
                let result = process_task(index, task, config, source);
                if let Err(e) = sender_result.send(result) {
                    log::error!("Failed to send locus result to collector thread: {}", e);
                }
            },
        );
    });

    drop(sender_result);
    let mut results = collector_thread
        .join()
        .map_err(|_| "Result collector thread panicked".to_string())?;
    log::trace!("Collector thread finished");

    results.sort_by_key(|result| result.index);
    Ok(results)
}

fn process_task<S: ReadSource>(
    index: usize,
    task: Result<Locus>,
    config: &RunConfig,
    source: &mut Result<S>,
) -> LocusResult {
    let locus = match task {
        Ok(locus) => locus,
        Err(e) => {
            log::warn!("Skipping catalog entry {}: {}", index, e);
            return LocusResult::no_call(index, None, NoCallReason::InvalidLocus(e));
        }
    };

    let source = match source {
        Ok(source) => source,
        Err(e) => {
            log::error!("{}: Read source unavailable: {}", locus.id, e);
            return LocusResult::no_call(
                index,
                Some(LocusInfo::from(&locus)),
                NoCallReason::ProcessingFailure(e.clone()),
            );
        }
    };

    let mut rng = StdRng::seed_from_u64(derive_locus_seed(config.seed, index));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        analyze(index, &locus, config, source, &mut rng)
    }));

    let failure = match outcome {
        Ok(Ok(result)) => return result,
        Ok(Err(e)) => e,
        Err(payload) => panic_message(payload),
    };
    log::error!("Error analyzing locus {}: {}", locus.id, failure);
    LocusResult::no_call(
        index,
        Some(LocusInfo::from(&locus)),
        NoCallReason::ProcessingFailure(failure),
    )
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("stronger-{}", i))
        .start_handler(|_thread_index| {
            log::trace!("Initialized thread {:?}", std::thread::current().id());
        })
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stronger::{
        fixtures::{add_reads, test_config, test_locus},
        reads::{AlignedRead, InMemoryReadSource},
    };

    /// Fails on `chr3` and panics on `chr4`.
    #[derive(Clone)]
    struct FlakySource(InMemoryReadSource);

    impl ReadSource for FlakySource {
        fn fetch(&mut self, contig: &str, start: i64, end: i64) -> Result<Vec<AlignedRead>> {
            match contig {
                "chr3" => Err("truncated file".to_string()),
                "chr4" => panic!("corrupt record"),
                _ => self.0.fetch(contig, start, end),
            }
        }
    }

    fn reads_source() -> InMemoryReadSource {
        let mut source = InMemoryReadSource::new();
        add_reads(&mut source, "chr1", &[9, 9, 10, 9, 15, 16, 15, 15, 16, 15]);
        add_reads(&mut source, "chr2", &[12, 12, 12]);
        add_reads(&mut source, "chr5", &[7, 7, 8, 7, 7, 21, 22, 21, 21]);
        add_reads(&mut source, "chr6", &[30; 6]);
        source
    }

    fn run(contigs: &[&str], num_workers: usize, config: &RunConfig) -> Vec<LocusResult> {
        let (sender, receiver) = bounded(CHANNEL_BUFFER_SIZE);
        for (index, contig) in contigs.iter().enumerate() {
            sender.send((index, Ok(test_locus(contig)))).unwrap();
        }
        drop(sender);
        let source = FlakySource(reads_source());
        run_loci(receiver, config, num_workers, || Ok(source.clone())).unwrap()
    }

    #[test]
    fn results_follow_catalog_order() {
        let contigs = ["chr6", "chr1", "chr5", "chr2", "chr1", "chr6"];
        let results = run(&contigs, 3, &test_config());
        let indices: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        for (result, contig) in results.iter().zip(contigs) {
            assert_eq!(result.locus.as_ref().unwrap().contig, contig);
        }
    }

    #[test]
    fn worker_count_does_not_change_results() {
        let contigs = ["chr1", "chr5", "chr6", "chr2", "chr1", "chr5", "chr6", "chr1"];
        let config = test_config();
        let single = run(&contigs, 1, &config);
        let parallel = run(&contigs, 4, &config);
        assert_eq!(single, parallel);
    }

    #[test]
    fn failing_loci_do_not_stop_the_run() {
        let contigs = ["chr1", "chr3", "chr4", "chr6"];
        let results = run(&contigs, 2, &test_config());
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].alleles().len(), 2);
        assert_eq!(
            results[1].no_call_reason(),
            Some(&NoCallReason::ProcessingFailure("truncated file".to_string()))
        );
        assert_eq!(
            results[2].no_call_reason(),
            Some(&NoCallReason::ProcessingFailure("corrupt record".to_string()))
        );
        assert_eq!(results[3].alleles().len(), 1);
    }

    #[test]
    fn invalid_catalog_entries_become_no_calls() {
        let (sender, receiver) = bounded(CHANNEL_BUFFER_SIZE);
        sender.send((0, Ok(test_locus("chr6")))).unwrap();
        sender.send((1, Err("Error at BED line 2: bad".to_string()))).unwrap();
        drop(sender);
        let source = reads_source();
        let results = run_loci(receiver, &test_config(), 2, || Ok(source.clone())).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[1].locus.is_none());
        assert_eq!(
            results[1].no_call_reason(),
            Some(&NoCallReason::InvalidLocus("Error at BED line 2: bad".to_string()))
        );
    }

    #[test]
    fn unavailable_source_is_reported_per_locus() {
        let (sender, receiver) = bounded(CHANNEL_BUFFER_SIZE);
        sender.send((0, Ok(test_locus("chr1")))).unwrap();
        drop(sender);
        let results = run_loci(receiver, &test_config(), 1, || {
            Err::<InMemoryReadSource, _>("cannot open".to_string())
        })
        .unwrap();
        assert_eq!(
            results[0].no_call_reason(),
            Some(&NoCallReason::ProcessingFailure("cannot open".to_string()))
        );
    }

    #[test]
    fn different_seeds_keep_point_estimates() {
        let contigs = ["chr1", "chr5"];
        let first = run(&contigs, 2, &test_config());
        let config = RunConfig {
            seed: 7,
            ..test_config()
        };
        let second = run(&contigs, 2, &config);
        for (a, b) in first.iter().zip(&second) {
            let a: Vec<f64> = a.alleles().iter().map(|x| x.copy_number).collect();
            let b: Vec<f64> = b.alleles().iter().map(|x| x.copy_number).collect();
            assert_eq!(a, b);
        }
    }
}
