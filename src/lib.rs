//! TblTransfer - transfer feature table annotations between genome assemblies
//!
//! Moves NCBI feature table (`.tbl`) annotations defined on a reference
//! assembly onto a related alternate assembly, using a base-level
//! correspondence between the two sequences.
//!
//! # Features
//!
//! - Strand-aware endpoint rounding across alignment gaps
//! - Drop or clip (`<1` / `>LEN`) features that overhang the aligned region
//! - Qualifiers follow their feature; `protein_id` qualifiers are never copied
//! - Chain-file backed translation with gzip/bzip2 support
//! - Optional per-record parallelism with rayon
//!
//! # Example
//!
//! ```ignore
//! use tbl_transfer::{convert_tbl, CoordinateMapper, SequenceLengths, TransferOptions};
//!
//! let mapper = CoordinateMapper::from_chain_file("ref_to_alt.chain")?;
//! let alt_lengths = SequenceLengths::from_fasta("alt.fasta")?;
//!
//! let options = TransferOptions::default().with_clip(true);
//! let stats = convert_tbl("ref.tbl", "alt.tbl", &mapper, &alt_lengths, None, options)?;
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use self::core::{
    Bias, ChainFile, ChainIndex, ChainParseError, CoordinateMapper, CoordinateTranslator,
    Endpoint, FastaError, IdentityTranslator, MappingError, OutOfBounds, Remap, SequenceLengths,
    Strand, TransferError, parse_chain_bytes, parse_chain_file,
};
pub use formats::tbl::{convert_tbl, ConversionStats, HeaderStyle, TblTransfer, TransferOptions};
