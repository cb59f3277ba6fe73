use crate::stronger::{
    config::{CopyNumberMode, ReadWeighting, RunConfig},
    genotype::MAX_ITERATIONS,
};
use crate::utils::{Result, SexChromosomes};
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="stronger",
          version=&**FULL_VERSION,
          about="Short tandem repeat genotyping from long-read alignments",
          long_about = None,
          disable_help_subcommand = true,
          after_help = "This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.",
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Genotype tandem repeat loci")]
    Call(CallArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("call")))]
#[command(arg_required_else_help(true))]
pub struct CallArgs {
    #[clap(required = true)]
    #[clap(help = "Indexed BAM or CRAM file with aligned long reads")]
    #[clap(value_name = "READS")]
    #[arg(value_parser = check_file_exists)]
    pub reads_path: PathBuf,

    #[clap(required = true)]
    #[clap(long = "loci")]
    #[clap(help = "BED file with repeat coordinates; the motif is the last column")]
    #[clap(value_name = "LOCI")]
    #[arg(value_parser = check_file_exists)]
    pub loci_path: PathBuf,

    #[clap(required = true)]
    #[clap(long = "ref")]
    #[clap(help = "Path to indexed reference genome FASTA")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub genome_path: PathBuf,

    #[clap(short = 'p')]
    #[clap(long = "processes")]
    #[clap(help = "Number of worker threads")]
    #[clap(value_name = "PROCESSES")]
    #[clap(default_value = "1")]
    #[arg(value_parser = processes_in_range)]
    pub num_processes: usize,

    #[clap(short = 'x')]
    #[clap(long = "sex-chr")]
    #[clap(value_name = "SEX_CHR")]
    #[clap(help = "Sex chromosome complement (e.g. XX or XY); X and Y loci are skipped without it")]
    #[arg(value_parser = parse_sex_chromosomes)]
    pub sex_chroms: Option<SexChromosomes>,

    #[clap(short = 'j')]
    #[clap(long = "json")]
    #[clap(value_name = "JSON")]
    #[clap(help = "Write full results to this JSON file")]
    #[arg(value_parser = check_prefix_path)]
    pub json_path: Option<String>,

    #[clap(long = "no-tsv")]
    #[clap(help = "Do not print the TSV summary to stdout")]
    pub no_tsv: bool,

    #[clap(long = "seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Random seed; a seed is generated and reported when omitted")]
    pub seed: Option<u64>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "min-reads")]
    #[clap(value_name = "MIN_READS")]
    #[clap(help = "Minimum number of passing reads to call a locus")]
    #[clap(default_value = "4")]
    pub min_reads: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "min-allele-reads")]
    #[clap(value_name = "MIN_ALLELE_READS")]
    #[clap(help = "Minimum number of reads supporting a called allele")]
    #[clap(default_value = "2")]
    pub min_allele_reads: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "min-avg-phred")]
    #[clap(value_name = "PHRED")]
    #[clap(help = "Minimum average base quality over the flanks and repeat")]
    #[clap(default_value = "13")]
    #[arg(value_parser = ensure_non_negative_float)]
    pub min_avg_phred: f64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "flank-size")]
    #[clap(value_name = "FLANK_SIZE")]
    #[clap(help = "Length of flanking sequence required on each side of the repeat")]
    #[clap(default_value = "70")]
    #[arg(value_parser = flank_size_in_range)]
    pub flank_len: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(short = 't')]
    #[clap(long = "targeted")]
    #[clap(help = "Reads come from a targeted (enrichment) protocol")]
    pub targeted: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(short = 'f')]
    #[clap(long = "fractional")]
    #[clap(help = "Allow partial motif copies in read and allele copy numbers")]
    pub fractional: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(short = 'b')]
    #[clap(long = "num-bootstrap")]
    #[clap(value_name = "NUM_BOOTSTRAP")]
    #[clap(help = "Number of bootstrap iterations for confidence intervals")]
    #[clap(default_value = "100")]
    pub num_bootstrap: usize,
}

impl CallArgs {
    /// Settings for the run; `seed` is the one actually used.
    pub fn run_config(&self, seed: u64) -> RunConfig {
        RunConfig {
            min_reads: self.min_reads,
            min_allele_reads: self.min_allele_reads,
            min_avg_phred: self.min_avg_phred,
            flank_len: self.flank_len,
            num_bootstrap: self.num_bootstrap,
            sex_chroms: self.sex_chroms.clone(),
            copy_number_mode: if self.fractional {
                CopyNumberMode::Fractional
            } else {
                CopyNumberMode::Integer
            },
            read_weighting: if self.targeted {
                ReadWeighting::Targeted
            } else {
                ReadWeighting::LengthCorrected
            },
            max_em_iterations: MAX_ITERATIONS,
            seed,
        }
    }
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn processes_in_range(s: &str) -> Result<usize> {
    let processes: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid number of processes", s))?;
    if processes >= 1 {
        Ok(processes)
    } else {
        Err("Number of processes must be at least 1".into())
    }
}

fn flank_size_in_range(s: &str) -> Result<usize> {
    let flank_len: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid flank size", s))?;
    if flank_len >= 1 {
        Ok(flank_len)
    } else {
        Err("Flank size must be at least 1".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn parse_sex_chromosomes(s: &str) -> Result<SexChromosomes> {
    s.trim().to_uppercase().parse()
}

fn ensure_non_negative_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !value.is_finite() || value < 0.0 {
        Err(format!("The value must be non-negative, got: {}", value))
    } else {
        Ok(value)
    }
}
