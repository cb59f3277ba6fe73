mod bam_utils;
mod math;
mod readers;
mod region;
mod sex_chroms;
mod util;

pub use bam_utils::check_bam_mapped;
pub use math::percentile_nearest_rank;
pub use readers::{open_catalog_reader, open_genome_reader, CatalogReader};
pub use region::{resolve_contig_name, GenomicRegion};
pub use sex_chroms::{ploidy_for_contig, SexChromosomes};
pub use util::{handle_error_and_exit, Result};
