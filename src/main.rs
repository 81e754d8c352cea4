//! TblTransfer CLI entry point
//!
//! Transfers NCBI feature table annotations onto a related genome assembly.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tbl_transfer::core::{ChainIndex, CoordinateMapper, SequenceLengths};
use tbl_transfer::formats::{self, HeaderStyle, TransferOptions};

/// Log verbosity (CLI enum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
#[command(name = "tbl-transfer")]
#[command(about = "Transfer NCBI feature table annotations onto a related genome assembly")]
#[command(version)]
#[command(author = "TblTransfer Contributors")]
struct Cli {
    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long = "loglevel", global = true, default_value = "info")]
    loglevel: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transfer a feature table from the reference genome to a new genome
    Transfer {
        /// Input sequence of reference genome (FASTA)
        ref_fasta: PathBuf,
        /// Input reference annotations (NCBI TBL format)
        ref_tbl: PathBuf,
        /// Input sequence of new genome (FASTA)
        alt_fasta: PathBuf,
        /// Output file with transferred annotations
        out_tbl: PathBuf,
        /// Chain file aligning the reference genome to the new genome
        #[arg(short = 'c', long)]
        chain: PathBuf,
        /// Truncate features that are partly out of bounds instead of dropping them
        /// (features completely out of bounds are always dropped)
        #[arg(long = "oob-clip")]
        oob_clip: bool,
        /// Write headers as '>Feature gb|ID|' instead of '>Feature ID'
        #[arg(long = "keep-accession-wrapper")]
        keep_accession_wrapper: bool,
        /// Number of threads (records are processed in parallel above 1)
        #[arg(short = 't', long, default_value = "1")]
        threads: usize,
    },
    /// Print the id and length of every sequence in a FASTA file
    ChromSizes {
        /// Input FASTA file
        fasta: PathBuf,
    },
}

fn init_logging(level: LogLevel) {
    let filter: log::LevelFilter = level.into();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter.as_str()))
        .init();
}

fn load_lengths(path: &Path, role: &str) -> anyhow::Result<SequenceLengths> {
    let lengths = SequenceLengths::from_fasta(path)
        .with_context(|| format!("Failed to read {} FASTA {:?}", role, path))?;
    log::info!("Loaded {} {} sequences from {:?}", lengths.len(), role, path);
    Ok(lengths)
}

fn load_chain(chain_path: &Path) -> anyhow::Result<CoordinateMapper> {
    let start = Instant::now();
    eprintln!("Loading chain file: {:?}", chain_path);

    let index = ChainIndex::from_chain_file(chain_path)
        .map_err(|e| anyhow::anyhow!("Failed to load chain file: {}", e))?;
    log::info!("Chain index holds {} aligned blocks", index.total_blocks());

    eprintln!("Chain file loaded in {:.2}s", start.elapsed().as_secs_f64());
    Ok(CoordinateMapper::new(index))
}

/// Warn where the chain disagrees with the FASTA files about sequence lengths
fn check_sizes(index: &ChainIndex, reference: &SequenceLengths, alternate: &SequenceLengths) {
    let declared = [
        ("reference", &index.reference_sizes, reference),
        ("alternate", &index.alternate_sizes, alternate),
    ];
    for (role, sizes, fasta) in declared {
        for (id, size) in sizes {
            match fasta.get(id) {
                Some(length) if length != *size => log::warn!(
                    "Chain declares {} sequence {} with length {}, FASTA has {}",
                    role,
                    id,
                    size,
                    length
                ),
                None => log::warn!("Chain {} sequence {} is missing from the FASTA", role, id),
                _ => {}
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.loglevel);
    let start = Instant::now();

    match cli.command {
        Commands::Transfer {
            ref_fasta,
            ref_tbl,
            alt_fasta,
            out_tbl,
            chain,
            oob_clip,
            keep_accession_wrapper,
            threads,
        } => {
            let reference = load_lengths(&ref_fasta, "reference")?;
            let alternate = load_lengths(&alt_fasta, "alternate")?;
            let mapper = load_chain(&chain)?;
            check_sizes(mapper.index(), &reference, &alternate);

            let header_style = if keep_accession_wrapper {
                HeaderStyle::Wrapped
            } else {
                HeaderStyle::Bare
            };
            let options = TransferOptions::default()
                .with_clip(oob_clip)
                .with_header_style(header_style)
                .with_threads(threads);

            eprintln!("Transferring feature table: {:?} -> {:?}", ref_tbl, out_tbl);
            let stats = formats::convert_tbl(
                &ref_tbl,
                &out_tbl,
                &mapper,
                &alternate,
                Some(&reference),
                options,
            )
            .with_context(|| format!("Failed to transfer {:?}", ref_tbl))?;

            eprintln!("\n=== Transfer Statistics ===");
            eprintln!("Records:         {}", stats.records);
            eprintln!("Features:        {}", stats.features);
            eprintln!("Retained:        {}", stats.retained);
            eprintln!("  - Clipped:     {}", stats.clipped);
            eprintln!("Dropped:         {}", stats.dropped);
            eprintln!("Qualifiers dropped with features: {}", stats.qualifiers_dropped);
            eprintln!("protein_id removed: {}", stats.protein_ids_removed);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::ChromSizes { fasta } => {
            let lengths = load_lengths(&fasta, "input")?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for (id, length) in lengths.iter() {
                writeln!(out, "{}\t{}", id, length)?;
            }
        }
    }

    Ok(())
}
