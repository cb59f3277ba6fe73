use std::str::FromStr;

const DEFAULT_PLOIDY: usize = 2;

/// Sex chromosome complement of the sample, e.g. `XX`, `XY` or `XXY`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SexChromosomes {
    num_x: usize,
    num_y: usize,
}

impl SexChromosomes {
    pub fn num_x(&self) -> usize {
        self.num_x
    }

    pub fn num_y(&self) -> usize {
        self.num_y
    }
}

impl FromStr for SexChromosomes {
    type Err = String;

    fn from_str(encoding: &str) -> Result<Self, Self::Err> {
        if encoding.is_empty() {
            return Err("Sex chromosome configuration cannot be empty".to_string());
        }

        let mut num_x = 0;
        let mut num_y = 0;
        for chrom in encoding.chars() {
            match chrom {
                'X' => num_x += 1,
                'Y' => num_y += 1,
                _ => {
                    return Err(format!(
                        "Invalid sex chromosome '{}' in '{}': expected only X and Y",
                        chrom, encoding
                    ))
                }
            }
        }

        Ok(Self { num_x, num_y })
    }
}

enum ContigKind {
    Mitochondrial,
    X,
    Y,
    Autosome,
}

fn classify_contig(contig: &str) -> ContigKind {
    match contig {
        "M" | "chrM" | "MT" | "chrMT" => ContigKind::Mitochondrial,
        "X" | "chrX" => ContigKind::X,
        "Y" | "chrY" => ContigKind::Y,
        _ => ContigKind::Autosome,
    }
}

/// Number of alleles expected on a contig. `None` means the ploidy cannot be
/// determined (a sex chromosome without a sex chromosome configuration).
pub fn ploidy_for_contig(contig: &str, sex_chroms: Option<&SexChromosomes>) -> Option<usize> {
    match (classify_contig(contig), sex_chroms) {
        (ContigKind::Mitochondrial, _) => Some(1),
        (ContigKind::Autosome, _) => Some(DEFAULT_PLOIDY),
        (ContigKind::X, Some(sex_chroms)) => Some(sex_chroms.num_x()),
        (ContigKind::Y, Some(sex_chroms)) => Some(sex_chroms.num_y()),
        (ContigKind::X | ContigKind::Y, None) => None,
    }
}
