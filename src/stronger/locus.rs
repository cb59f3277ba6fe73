use crate::utils::{
    open_genome_reader, ploidy_for_contig, resolve_contig_name, CatalogReader, GenomicRegion,
    Result, SexChromosomes,
};
use crossbeam_channel::Sender;
use rust_htslib::faidx;
use std::{collections::HashMap, io::BufRead, path::Path};

/// A repeat region from the catalog, with the reference sequence around it.
#[derive(Debug, Clone)]
pub struct Locus {
    pub id: String,
    pub region: GenomicRegion,
    pub motif: String,
    pub left_flank: String,
    pub tr: String,
    pub right_flank: String,
    /// `None` when the contig is a sex chromosome and no configuration was given.
    pub ploidy: Option<usize>,
}

/// A catalog position paired with either a loaded locus or the reason it could not be loaded.
pub type LocusTask = (usize, Result<Locus>);

impl Locus {
    pub fn new(
        genome_reader: &faidx::Reader,
        chrom_lookup: &HashMap<String, u32>,
        line: &str,
        flank_len: usize,
        sex_chroms: Option<&SexChromosomes>,
    ) -> Result<Self> {
        let (region, motif) = parse_catalog_line(line)?;

        let ref_contig = resolve_contig_name(&region.contig, chrom_lookup).ok_or_else(|| {
            format!(
                "FASTA reference does not contain chromosome '{}' in BED file",
                &region.contig
            )
        })?;
        let contig_len = chrom_lookup[&ref_contig];
        region.with_flanks(flank_len as u32, contig_len)?;

        let ploidy = ploidy_for_contig(&region.contig, sex_chroms);
        let (left_flank, tr, right_flank) =
            get_tr_and_flanks(genome_reader, &ref_contig, &region, flank_len)?;

        Ok(Locus {
            id: region.to_string(),
            region,
            motif,
            left_flank,
            tr,
            right_flank,
            ploidy,
        })
    }

    #[cfg(test)]
    pub fn new_for_test(
        contig: &str,
        start: u32,
        motif: &str,
        flanks: (&str, &str),
        tr: &str,
    ) -> Self {
        let region = GenomicRegion::new(contig, start, start + tr.len() as u32).unwrap();
        Locus {
            id: region.to_string(),
            region,
            motif: motif.to_string(),
            left_flank: flanks.0.to_string(),
            tr: tr.to_string(),
            right_flank: flanks.1.to_string(),
            ploidy: ploidy_for_contig(contig, None),
        }
    }
}

/// Parses `contig start end [...] motif`; the motif is always the last column.
pub fn parse_catalog_line(line: &str) -> Result<(GenomicRegion, String)> {
    const MIN_FIELD_COUNT: usize = 4;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELD_COUNT {
        return Err(format!(
            "Expected at least {} fields in the format 'chrom start end ... motif', found {}: {}",
            MIN_FIELD_COUNT,
            fields.len(),
            line
        ));
    }

    let parse_coord = |value: &str| {
        value
            .parse::<u32>()
            .map_err(|_| format!("Invalid coordinate '{}' in line: {}", value, line))
    };
    let start = parse_coord(fields[1])?;
    let end = parse_coord(fields[2])?;
    let region = GenomicRegion::new(fields[0], start, end)?;

    let motif = fields[fields.len() - 1].to_uppercase();
    if motif.is_empty() || !motif.bytes().all(|b| b"ACGTN".contains(&b)) {
        return Err(format!("Invalid motif '{}' in line: {}", motif, line));
    }

    Ok((region, motif))
}

fn is_catalog_record(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

pub fn create_chrom_lookup(reader: &faidx::Reader) -> Result<HashMap<String, u32>> {
    let num_seqs = reader.n_seqs() as usize;
    let mut map = HashMap::with_capacity(num_seqs);
    for i in 0..num_seqs {
        let name = reader.seq_name(i as i32).map_err(|e| e.to_string())?;
        let len = reader.fetch_seq_len(&name);
        let len_u32 = u32::try_from(len).map_err(|_| {
            format!(
                "Sequence length for '{}' is negative and cannot be converted to u32",
                &name
            )
        })?;
        map.insert(name, len_u32);
    }
    Ok(map)
}

/// Streams catalog records, in catalog order, as `(index, locus)` pairs.
///
/// Entries that cannot be loaded are forwarded as errors so they are reported per locus.
/// Returns the number of records sent, or an error if the catalog itself could not be read.
pub fn stream_loci_into_channel(
    catalog_reader: CatalogReader,
    genome_path: &Path,
    flank_len: usize,
    sex_chroms: Option<&SexChromosomes>,
    sender: Sender<LocusTask>,
) -> Result<usize> {
    let genome_reader = open_genome_reader(genome_path)?;
    let chrom_lookup = create_chrom_lookup(&genome_reader)?;

    let mut index = 0;
    for (line_number, result_line) in catalog_reader.lines().enumerate() {
        let line =
            result_line.map_err(|e| format!("Error at BED line {}: {}", line_number + 1, e))?;
        if !is_catalog_record(&line) {
            continue;
        }

        let locus = Locus::new(&genome_reader, &chrom_lookup, &line, flank_len, sex_chroms)
            .map_err(|e| format!("Error at BED line {}: {}", line_number + 1, e));

        if sender.send((index, locus)).is_err() {
            return Err("Locus receiver disconnected".to_string());
        }
        index += 1;
    }

    Ok(index)
}

fn get_tr_and_flanks(
    genome: &faidx::Reader,
    ref_contig: &str,
    region: &GenomicRegion,
    flank_len: usize,
) -> Result<(String, String, String)> {
    // faidx end coordinates are inclusive
    let fetch_seq = |start: usize, end: usize| -> Result<String> {
        if end <= start {
            return Err(format!(
                "Empty reference interval {}:{}-{}",
                ref_contig, start, end
            ));
        }
        genome
            .fetch_seq_string(ref_contig, start, end - 1)
            .map_err(|e| {
                format!(
                    "Error fetching sequence for region {}:{}-{}: {}",
                    ref_contig, start, end, e
                )
            })
            .map(|seq| seq.to_uppercase())
    };

    let start = region.start as usize;
    let end = region.end as usize;
    let left_flank = fetch_seq(start - flank_len, start)?;
    let tr = fetch_seq(start, end)?;
    let right_flank = fetch_seq(end, end + flank_len)?;

    if left_flank.len() < flank_len || right_flank.len() < flank_len {
        return Err(format!("Reference flanks too short for region {}", region));
    }

    Ok((left_flank, tr, right_flank))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_line() {
        let (region, motif) = parse_catalog_line("chr4\t3074876\t3074933\tCAG").unwrap();
        assert_eq!(region, GenomicRegion::new("chr4", 3074876, 3074933).unwrap());
        assert_eq!(motif, "CAG");
    }

    #[test]
    fn parse_motif_from_last_column() {
        let (_, motif) = parse_catalog_line("chrX 100 130 HTT 3 cag").unwrap();
        assert_eq!(motif, "CAG");
    }

    #[test]
    fn parse_too_few_fields_err() {
        assert!(parse_catalog_line("chr1\t100\t200").is_err());
    }

    #[test]
    fn parse_invalid_coordinates_err() {
        assert!(parse_catalog_line("chr1\tabc\t200\tCA").is_err());
        assert!(parse_catalog_line("chr1\t-5\t200\tCA").is_err());
        assert_eq!(
            parse_catalog_line("chr1\t200\t100\tCA"),
            Err("Invalid region: start 200 >= end 100".to_string())
        );
    }

    #[test]
    fn parse_invalid_motif_err() {
        assert!(parse_catalog_line("chr1\t100\t200\tCAZ").is_err());
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        assert!(!is_catalog_record(""));
        assert!(!is_catalog_record("   "));
        assert!(!is_catalog_record("#contig\tstart\tend\tmotif"));
        assert!(is_catalog_record("chr1\t100\t200\tCA"));
    }
}
