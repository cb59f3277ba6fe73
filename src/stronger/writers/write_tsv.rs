//! Tab-separated summary with one line per genotyped or no-call locus.
//!

use crate::stronger::{
    genotype::Confidence,
    workflows::{AlleleCall, LocusResult},
};
use crate::utils::Result;
use itertools::Itertools;
use std::io::Write;

const MISSING: &str = ".";

pub struct TsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TsvWriter<W> {
    pub fn new(output: W) -> TsvWriter<W> {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .from_writer(output);
        TsvWriter { writer }
    }

    /// Writes the line for one locus. Catalog entries that failed to load have no
    /// coordinates and are left out.
    pub fn write(&mut self, result: &LocusResult) -> Result<()> {
        let locus = match &result.locus {
            Some(locus) => locus,
            None => return Ok(()),
        };

        let read_copy_numbers = if result.evidence.is_empty() {
            MISSING.to_string()
        } else {
            result
                .evidence
                .iter()
                .map(|e| e.copy_number)
                .sorted_by(f64::total_cmp)
                .map(format_copy_number)
                .join(",")
        };

        let alleles = result.alleles();
        let (call, ci95) = if alleles.is_empty() {
            (MISSING.to_string(), MISSING.to_string())
        } else {
            (
                alleles.iter().map(|a| format_copy_number(a.copy_number)).join("|"),
                alleles.iter().map(format_ci95).join("|"),
            )
        };

        let ref_copy_number = result
            .ref_copy_number
            .map_or_else(|| MISSING.to_string(), format_copy_number);

        self.writer
            .write_record([
                locus.contig.clone(),
                locus.start.to_string(),
                locus.end.to_string(),
                locus.motif.clone(),
                ref_copy_number,
                read_copy_numbers,
                call,
                ci95,
            ])
            .map_err(|e| format!("Failed to write TSV record for {}: {}", locus.id, e))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| format!("Failed to flush TSV output: {}", e))
    }
}

/// Whole numbers print without decimals, fractional ones with two.
fn format_copy_number(copy_number: f64) -> String {
    if copy_number.fract() == 0.0 {
        format!("{}", copy_number)
    } else {
        format!("{:.2}", copy_number)
    }
}

fn format_ci95(allele: &AlleleCall) -> String {
    match allele.ci95 {
        Confidence::Interval { lower, upper } => format!(
            "{}-{}",
            format_copy_number(lower),
            format_copy_number(upper)
        ),
        Confidence::Undetermined => MISSING.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stronger::{
        fixtures::evidence_for_test,
        workflows::{Call, Diagnostics, LocusInfo, NoCallReason},
    };

    fn info() -> LocusInfo {
        LocusInfo {
            id: "chr4:1000-1030".to_string(),
            contig: "chr4".to_string(),
            start: 1000,
            end: 1030,
            motif: "CAG".to_string(),
        }
    }

    fn allele(copy_number: f64, ci95: Confidence) -> AlleleCall {
        AlleleCall {
            copy_number,
            support: 2,
            reads: vec![0, 1],
            ci95,
            ci99: ci95,
        }
    }

    fn to_tsv(results: &[LocusResult]) -> String {
        let mut buffer = Vec::new();
        {
            let mut writer = TsvWriter::new(&mut buffer);
            for result in results {
                writer.write(result).unwrap();
            }
            writer.flush().unwrap();
        }
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn genotyped_locus_line() {
        let result = LocusResult {
            index: 0,
            locus: Some(info()),
            ref_copy_number: Some(10.0),
            evidence: evidence_for_test(&[15.0, 9.0, 16.0, 9.0]),
            call: Call::Genotyped {
                alleles: vec![
                    allele(9.0, Confidence::Interval { lower: 9.0, upper: 10.0 }),
                    allele(15.0, Confidence::Undetermined),
                ],
            },
            diagnostics: Diagnostics::default(),
        };
        assert_eq!(
            to_tsv(&[result]),
            "chr4\t1000\t1030\tCAG\t10\t9,9,15,16\t9|15\t9-10|.\n"
        );
    }

    #[test]
    fn no_call_line() {
        let mut result = LocusResult::no_call(1, Some(info()), NoCallReason::InsufficientDepth);
        result.ref_copy_number = Some(10.0);
        result.evidence = evidence_for_test(&[12.0]);
        assert_eq!(to_tsv(&[result]), "chr4\t1000\t1030\tCAG\t10\t12\t.\t.\n");
    }

    #[test]
    fn invalid_catalog_entry_is_skipped() {
        let result = LocusResult::no_call(2, None, NoCallReason::InvalidLocus("bad".to_string()));
        assert_eq!(to_tsv(&[result]), "");
    }

    #[test]
    fn fractional_copy_numbers_use_two_decimals() {
        assert_eq!(format_copy_number(10.0), "10");
        assert_eq!(format_copy_number(10.0 + 2.0 / 3.0), "10.67");
        assert_eq!(format_copy_number(0.5), "0.50");
    }
}
