use super::AlignedRead;
use crate::utils::{resolve_contig_name, Result};
use rust_htslib::bam::{self, Read, Record};
use std::{collections::HashMap, path::Path};

/// Anything that can produce the primary alignments overlapping a reference interval.
pub trait ReadSource {
    /// Returns reads overlapping `[start, end)` on `contig`. A contig the source does
    /// not know yields no reads.
    fn fetch(&mut self, contig: &str, start: i64, end: i64) -> Result<Vec<AlignedRead>>;
}

/// Indexed BAM/CRAM file; each worker opens its own.
pub struct BamReadSource {
    reader: bam::IndexedReader,
    contig_tids: HashMap<String, u32>,
}

impl BamReadSource {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = bam::IndexedReader::from_path(path)
            .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
        let header = reader.header();
        let contig_tids = (0..header.target_count())
            .filter_map(|tid| {
                std::str::from_utf8(header.tid2name(tid))
                    .ok()
                    .map(|name| (name.to_string(), tid))
            })
            .collect();
        Ok(BamReadSource {
            reader,
            contig_tids,
        })
    }
}

impl ReadSource for BamReadSource {
    fn fetch(&mut self, contig: &str, start: i64, end: i64) -> Result<Vec<AlignedRead>> {
        let tid = match resolve_contig_name(contig, &self.contig_tids) {
            Some(name) => self.contig_tids[&name],
            None => {
                log::debug!("Contig {} is absent from the alignments", contig);
                return Ok(Vec::new());
            }
        };

        self.reader
            .fetch((tid, start.max(0), end))
            .map_err(|e| format!("Fetch error for {}:{}-{}: {}", contig, start, end, e))?;

        let mut reads = Vec::new();
        let mut record = Record::new();
        while let Some(result) = self.reader.read(&mut record) {
            result.map_err(|e| e.to_string())?;
            if record.is_unmapped() || record.is_secondary() || record.is_supplementary() {
                continue;
            }
            reads.push(AlignedRead::from_hts_rec(&record)?);
        }
        Ok(reads)
    }
}

/// Reads held in memory, keyed by contig.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReadSource {
    reads: HashMap<String, Vec<AlignedRead>>,
}

impl InMemoryReadSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_read(&mut self, contig: &str, read: AlignedRead) {
        self.reads.entry(contig.to_string()).or_default().push(read);
    }
}

impl ReadSource for InMemoryReadSource {
    fn fetch(&mut self, contig: &str, start: i64, end: i64) -> Result<Vec<AlignedRead>> {
        let reads = match resolve_contig_name(contig, &self.reads) {
            Some(name) => &self.reads[&name],
            None => return Ok(Vec::new()),
        };
        Ok(reads
            .iter()
            .filter(|read| {
                let read_start = read.cigar.ref_pos;
                let read_end = read_start + read.cigar.ref_len();
                read_start < end && start < read_end
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stronger::reads::cigar::{Cigar, CigarOp};

    fn read(id: &str, ref_pos: i64, len: u32) -> AlignedRead {
        AlignedRead {
            id: id.to_string(),
            bases: vec![b'A'; len as usize],
            quals: Vec::new(),
            cigar: Cigar {
                ref_pos,
                ops: vec![CigarOp::Match(len)],
            },
        }
    }

    #[test]
    fn in_memory_fetch_returns_overlapping_reads() {
        let mut source = InMemoryReadSource::new();
        source.add_read("chr1", read("a", 100, 50));
        source.add_read("chr1", read("b", 200, 50));
        source.add_read("chr2", read("c", 100, 50));

        let ids: Vec<String> = source
            .fetch("chr1", 140, 210)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        let ids: Vec<String> = source
            .fetch("chr1", 150, 200)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert!(ids.is_empty());
    }

    #[test]
    fn in_memory_fetch_reconciles_chr_prefix() {
        let mut source = InMemoryReadSource::new();
        source.add_read("1", read("a", 100, 50));
        assert_eq!(source.fetch("chr1", 100, 120).unwrap().len(), 1);
        assert!(source.fetch("chr3", 100, 120).unwrap().is_empty());
    }
}
