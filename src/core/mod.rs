//! Core coordinate transfer functionality
//!
//! This module contains the chain file parser, the alignment index, the
//! translator capability and the feature remapping policy.

mod chain;
pub mod error;
mod fasta;
mod index;
pub mod io;
mod mapper;
pub mod remap;
mod translate;

pub use chain::{
    parse_chain_bytes, parse_chain_file, parse_chain_reader, ChainBlock, ChainFile, ChainHeader,
    ChainParseError, ChainParseErrorKind, SequencePairing,
};
pub use error::{FastaError, MappingError, MappingResult, TransferError, TransferResult};
pub use fasta::SequenceLengths;
pub use index::{AlignedBlock, BlockInterval, ChainIndex};
pub use io::{detect_compression, open_reader, CompressionFormat, LineIterator, DEFAULT_BUFFER_SIZE};
pub use mapper::{CoordinateMapper, Strand};
pub use remap::{remap_interval, Endpoint, OutOfBounds, Remap};
pub use translate::{Bias, CoordinateTranslator, IdentityTranslator};
