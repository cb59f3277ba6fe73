use crate::cli::CallArgs;
use crate::stronger::{
    locus::stream_loci_into_channel,
    reads::BamReadSource,
    scheduler::{run_loci, CHANNEL_BUFFER_SIZE},
    workflows::LocusResult,
    writers::{write_json, RunReport, TsvWriter},
};
use crate::utils::{check_bam_mapped, open_catalog_reader, open_genome_reader, Result};
use crossbeam_channel::bounded;
use rand::Rng;
use std::{io, path::Path, thread};

pub fn call(args: CallArgs) -> Result<()> {
    check_bam_mapped(&args.reads_path)?;
    open_genome_reader(&args.genome_path)?;
    let catalog_reader = open_catalog_reader(&args.loci_path)?;

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    log::info!("Random seed: {}", seed);
    let config = args.run_config(seed);

    let (sender_locus, receiver_locus) = bounded(CHANNEL_BUFFER_SIZE);
    let genome_path = args.genome_path.clone();
    let flank_len = config.flank_len;
    let sex_chroms = config.sex_chroms.clone();
    let locus_stream_thread = thread::spawn(move || {
        stream_loci_into_channel(
            catalog_reader,
            &genome_path,
            flank_len,
            sex_chroms.as_ref(),
            sender_locus,
        )
    });

    let reads_path = args.reads_path.clone();
    let results = run_loci(receiver_locus, &config, args.num_processes, || {
        BamReadSource::open(&reads_path)
    })?;

    match locus_stream_thread.join() {
        Ok(Ok(num_loci)) => log::trace!("Locus stream thread finished after {} loci", num_loci),
        Ok(Err(e)) => return Err(format!("Locus streaming failed: {}", e)),
        Err(_) => return Err("Locus stream thread panicked".to_string()),
    }

    let results: Vec<LocusResult> = results.into_iter().filter(|r| r.is_reported()).collect();
    let num_called = results.iter().filter(|r| r.no_call_reason().is_none()).count();
    log::info!(
        "Genotyped {} loci, {} no-calls",
        num_called,
        results.len() - num_called
    );

    if !args.no_tsv {
        let stdout = io::stdout();
        let mut tsv_writer = TsvWriter::new(stdout.lock());
        for result in &results {
            tsv_writer.write(result)?;
        }
        tsv_writer.flush()?;
    }

    if let Some(json_path) = &args.json_path {
        write_json(Path::new(json_path), &RunReport { seed, results })?;
    }

    Ok(())
}
