//! Chain file parsing
//!
//! Parses UCSC chain files describing the base-level correspondence between
//! the reference assembly and the alternate assembly.
//!
//! # Chain File Format
//!
//! ```text
//! chain score tName tSize tStrand tStart tEnd qName qSize qStrand qStart qEnd id
//! size dt dq
//! size dt dq
//! size
//! ```
//!
//! - Header line starts with "chain"
//! - Data lines contain: size (aligned block), dt (reference gap), dq (alternate gap)
//! - Last data line has only size (no gaps)
//!
//! UCSC calls the first sequence "target" and the second "query". Annotations
//! are transferred from the first to the second, so here the UCSC target is
//! the *reference* and the UCSC query is the *alternate*.

use crate::core::io::open_reader;
use crate::core::Strand;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// Error type for chain file parsing
///
/// Provides detailed error information including line numbers and
/// descriptive messages for debugging chain file issues.
#[derive(Debug, Clone)]
pub struct ChainParseError {
    /// Human-readable error message
    pub message: String,
    /// Line number where the error occurred (1-based)
    pub line_number: Option<usize>,
    /// The kind of error that occurred
    pub kind: ChainParseErrorKind,
    /// The problematic content (if available)
    pub content: Option<String>,
}

/// Specific kinds of chain parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainParseErrorKind {
    /// Invalid chain header format
    InvalidHeader,
    /// Invalid data line format
    InvalidDataLine,
    /// Invalid strand character (must be '+' or '-')
    InvalidStrand,
    /// Failed to parse a numeric value
    InvalidNumber,
    /// Coordinate validation error (e.g., start > end)
    InvalidCoordinates,
    /// I/O error during reading
    IoError,
}

impl std::fmt::Display for ChainParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "Line {}: {}", line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ChainParseError {}

impl ChainParseError {
    /// Create an error with full context
    pub fn with_context(
        message: impl Into<String>,
        line_number: usize,
        kind: ChainParseErrorKind,
        content: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            line_number: Some(line_number),
            kind,
            content,
        }
    }

    /// Create an invalid header error
    pub fn invalid_header(message: impl Into<String>, line_number: usize, content: &str) -> Self {
        Self::with_context(
            message,
            line_number,
            ChainParseErrorKind::InvalidHeader,
            Some(content.chars().take(100).collect()),
        )
    }

    /// Create an invalid data line error
    pub fn invalid_data_line(message: impl Into<String>, line_number: usize, content: &str) -> Self {
        Self::with_context(
            message,
            line_number,
            ChainParseErrorKind::InvalidDataLine,
            Some(content.chars().take(100).collect()),
        )
    }

    /// Create an invalid strand error
    pub fn invalid_strand(strand: char, line_number: usize) -> Self {
        Self::with_context(
            format!("Invalid strand character '{}', expected '+' or '-'", strand),
            line_number,
            ChainParseErrorKind::InvalidStrand,
            None,
        )
    }

    /// Create an invalid number error
    pub fn invalid_number(field: &str, value: &str, line_number: usize) -> Self {
        Self::with_context(
            format!("Invalid {} value '{}': expected a non-negative integer", field, value),
            line_number,
            ChainParseErrorKind::InvalidNumber,
            None,
        )
    }

    /// Create an invalid coordinates error
    pub fn invalid_coordinates(message: impl Into<String>, line_number: usize) -> Self {
        Self::with_context(message, line_number, ChainParseErrorKind::InvalidCoordinates, None)
    }

    /// Check the error kind
    pub fn is_kind(&self, kind: ChainParseErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<std::io::Error> for ChainParseError {
    fn from(e: std::io::Error) -> Self {
        Self {
            message: format!("IO error: {}", e),
            line_number: None,
            kind: ChainParseErrorKind::IoError,
            content: None,
        }
    }
}

/// Parsed chain header
#[derive(Debug, Clone)]
pub struct ChainHeader {
    pub score: u64,
    /// Reference sequence (UCSC "target")
    pub reference_name: String,
    pub reference_size: u64,
    pub reference_strand: Strand,
    pub reference_start: u64,
    pub reference_end: u64,
    /// Alternate sequence (UCSC "query")
    pub alternate_name: String,
    pub alternate_size: u64,
    pub alternate_strand: Strand,
    pub alternate_start: u64,
    pub alternate_end: u64,
    pub chain_id: String,
}

fn parse_u64(value: &str, field: &str, line_number: usize) -> Result<u64, ChainParseError> {
    value
        .parse::<u64>()
        .map_err(|_| ChainParseError::invalid_number(field, value, line_number))
}

fn parse_strand(value: &str, line_number: usize) -> Result<Strand, ChainParseError> {
    let c = value.chars().next().unwrap_or('?');
    Strand::from_char(c).ok_or_else(|| ChainParseError::invalid_strand(c, line_number))
}

impl ChainHeader {
    /// Parse a chain header line
    ///
    /// Format: chain score tName tSize tStrand tStart tEnd qName qSize qStrand qStart qEnd id
    pub fn parse(line: &str, line_number: usize) -> Result<Self, ChainParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.len() < 12 {
            return Err(ChainParseError::invalid_header(
                format!("Expected 12+ fields, got {}", fields.len()),
                line_number,
                line,
            ));
        }

        if fields[0] != "chain" {
            return Err(ChainParseError::invalid_header(
                format!("Expected 'chain' keyword, got '{}'", fields[0]),
                line_number,
                line,
            ));
        }

        let score = parse_u64(fields[1], "score", line_number)?;

        let reference_name = fields[2].to_string();
        let reference_size = parse_u64(fields[3], "reference size", line_number)?;
        let reference_strand = parse_strand(fields[4], line_number)?;
        let reference_start = parse_u64(fields[5], "reference start", line_number)?;
        let reference_end = parse_u64(fields[6], "reference end", line_number)?;

        if reference_start > reference_end {
            return Err(ChainParseError::invalid_coordinates(
                format!("Reference start ({}) > reference end ({})", reference_start, reference_end),
                line_number,
            ));
        }
        if reference_end > reference_size {
            return Err(ChainParseError::invalid_coordinates(
                format!("Reference end ({}) > reference size ({})", reference_end, reference_size),
                line_number,
            ));
        }

        let alternate_name = fields[7].to_string();
        let alternate_size = parse_u64(fields[8], "alternate size", line_number)?;
        let alternate_strand = parse_strand(fields[9], line_number)?;
        let alternate_start = parse_u64(fields[10], "alternate start", line_number)?;
        let alternate_end = parse_u64(fields[11], "alternate end", line_number)?;

        if alternate_start > alternate_end {
            return Err(ChainParseError::invalid_coordinates(
                format!("Alternate start ({}) > alternate end ({})", alternate_start, alternate_end),
                line_number,
            ));
        }
        if alternate_end > alternate_size {
            return Err(ChainParseError::invalid_coordinates(
                format!("Alternate end ({}) > alternate size ({})", alternate_end, alternate_size),
                line_number,
            ));
        }

        // Chain ID is optional (field 12)
        let chain_id = fields.get(12).map(|s| s.to_string()).unwrap_or_default();

        Ok(Self {
            score,
            reference_name,
            reference_size,
            reference_strand,
            reference_start,
            reference_end,
            alternate_name,
            alternate_size,
            alternate_strand,
            alternate_start,
            alternate_end,
            chain_id,
        })
    }
}

/// A single ungapped aligned block
///
/// All coordinates are 0-based half-open and on the forward strand of their
/// sequence; `alternate_strand` records whether the block runs backwards
/// along the alternate sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBlock {
    pub reference_id: String,
    pub reference_start: u64,
    pub reference_end: u64,
    pub alternate_id: String,
    pub alternate_start: u64,
    pub alternate_end: u64,
    pub alternate_strand: Strand,
}

/// Reference/alternate sequence pair declared by one chain header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePairing {
    pub reference_id: String,
    pub alternate_id: String,
    pub score: u64,
}

/// Data line in a chain file (size, dt, dq)
#[derive(Debug, Clone, Copy)]
struct DataLine {
    /// Aligned block size (ungapped)
    size: u64,
    /// Gap in the reference sequence (UCSC "dt")
    reference_gap: u64,
    /// Gap in the alternate sequence (UCSC "dq")
    alternate_gap: u64,
}

impl DataLine {
    /// Parse a data line (middle line with 3 fields or last line with 1 field)
    fn parse(line: &str, line_number: usize) -> Result<Self, ChainParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();

        let (size, reference_gap, alternate_gap) = match fields.len() {
            1 => (parse_u64(fields[0], "block size", line_number)?, 0, 0),
            3 => (
                parse_u64(fields[0], "block size", line_number)?,
                parse_u64(fields[1], "reference gap (dt)", line_number)?,
                parse_u64(fields[2], "alternate gap (dq)", line_number)?,
            ),
            n => {
                return Err(ChainParseError::invalid_data_line(
                    format!("Expected 1 or 3 fields, got {}", n),
                    line_number,
                    line,
                ))
            }
        };

        if size == 0 {
            return Err(ChainParseError::invalid_data_line(
                "Block size must be greater than 0",
                line_number,
                line,
            ));
        }

        Ok(Self {
            size,
            reference_gap,
            alternate_gap,
        })
    }
}

/// Result of parsing a chain file
#[derive(Debug, Clone, Default)]
pub struct ChainFile {
    /// All aligned blocks
    pub blocks: Vec<ChainBlock>,
    /// One entry per chain, in file order
    pub pairings: Vec<SequencePairing>,
    /// Reference sequence sizes declared by chain headers
    pub reference_sizes: HashMap<String, u64>,
    /// Alternate sequence sizes declared by chain headers
    pub alternate_sizes: HashMap<String, u64>,
}

impl ChainFile {
    /// Create a new empty ChainFile
    pub fn new() -> Self {
        Self::default()
    }
}

/// Flip an interval onto the forward strand when its chain runs on the minus strand
fn oriented(strand: Strand, size: u64, pos: u64, len: u64) -> (u64, u64) {
    match strand {
        Strand::Plus => (pos, pos + len),
        Strand::Minus => (size - (pos + len), size - pos),
    }
}

/// Parse a chain file from a reader
pub fn parse_chain_reader<R: BufRead>(reader: R) -> Result<ChainFile, ChainParseError> {
    let mut result = ChainFile::new();
    let mut current_header: Option<ChainHeader> = None;
    let mut reference_pos: u64 = 0;
    let mut alternate_pos: u64 = 0;

    for (idx, line_result) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line_result?;
        let trimmed = line.trim();

        // Empty line marks end of chain block
        if trimmed.is_empty() || trimmed.starts_with('#') {
            current_header = None;
            continue;
        }

        if trimmed.starts_with("chain") {
            let header = ChainHeader::parse(trimmed, line_number)?;

            result
                .reference_sizes
                .insert(header.reference_name.clone(), header.reference_size);
            result
                .alternate_sizes
                .insert(header.alternate_name.clone(), header.alternate_size);
            result.pairings.push(SequencePairing {
                reference_id: header.reference_name.clone(),
                alternate_id: header.alternate_name.clone(),
                score: header.score,
            });

            reference_pos = header.reference_start;
            alternate_pos = header.alternate_start;
            current_header = Some(header);
        } else if let Some(ref header) = current_header {
            let data = DataLine::parse(trimmed, line_number)?;

            if reference_pos + data.size > header.reference_end
                || alternate_pos + data.size > header.alternate_end
            {
                return Err(ChainParseError::invalid_coordinates(
                    "Aligned block extends past the end declared in the chain header",
                    line_number,
                ));
            }

            let (reference_start, reference_end) = oriented(
                header.reference_strand,
                header.reference_size,
                reference_pos,
                data.size,
            );
            let (alternate_start, alternate_end) = oriented(
                header.alternate_strand,
                header.alternate_size,
                alternate_pos,
                data.size,
            );

            // A minus-strand reference is equivalent to a forward reference
            // aligned to the opposite alternate strand.
            let alternate_strand = if header.reference_strand == header.alternate_strand {
                Strand::Plus
            } else {
                Strand::Minus
            };

            result.blocks.push(ChainBlock {
                reference_id: header.reference_name.clone(),
                reference_start,
                reference_end,
                alternate_id: header.alternate_name.clone(),
                alternate_start,
                alternate_end,
                alternate_strand,
            });

            reference_pos += data.size + data.reference_gap;
            alternate_pos += data.size + data.alternate_gap;
        } else {
            return Err(ChainParseError::invalid_data_line(
                "Data line outside of a chain",
                line_number,
                trimmed,
            ));
        }
    }

    Ok(result)
}

/// Parse a chain file from a path
///
/// Gzip and bzip2 compressed files are detected automatically.
pub fn parse_chain_file(path: &Path) -> Result<ChainFile, ChainParseError> {
    let reader = open_reader(path)?;
    parse_chain_reader(reader)
}

/// Parse a chain file from bytes (for testing)
pub fn parse_chain_bytes(data: &[u8]) -> Result<ChainFile, ChainParseError> {
    parse_chain_reader(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain_header() {
        let line = "chain 1000 KJ660346.2 18959 + 0 18959 MN908947.3 18940 + 5 18940 1";
        let header = ChainHeader::parse(line, 1).unwrap();

        assert_eq!(header.score, 1000);
        assert_eq!(header.reference_name, "KJ660346.2");
        assert_eq!(header.reference_size, 18959);
        assert_eq!(header.reference_strand, Strand::Plus);
        assert_eq!(header.reference_end, 18959);
        assert_eq!(header.alternate_name, "MN908947.3");
        assert_eq!(header.alternate_size, 18940);
        assert_eq!(header.alternate_start, 5);
        assert_eq!(header.chain_id, "1");
    }

    #[test]
    fn test_parse_chain_header_too_few_fields() {
        let err = ChainHeader::parse("chain 1000 ref 100 + 0 100", 4).unwrap_err();
        assert!(err.is_kind(ChainParseErrorKind::InvalidHeader));
        assert_eq!(err.line_number, Some(4));
    }

    #[test]
    fn test_parse_chain_header_bad_strand() {
        let err = ChainHeader::parse("chain 1 ref 100 x 0 100 alt 100 + 0 100 1", 1).unwrap_err();
        assert!(err.is_kind(ChainParseErrorKind::InvalidStrand));
    }

    #[test]
    fn test_parse_chain_header_end_past_size() {
        let err = ChainHeader::parse("chain 1 ref 100 + 0 101 alt 100 + 0 100 1", 1).unwrap_err();
        assert!(err.is_kind(ChainParseErrorKind::InvalidCoordinates));
    }

    #[test]
    fn test_parse_blocks_with_gaps() {
        let data = b"\
chain 500 ref 1000 + 100 400 alt 1000 + 0 290 1
100 50 40
150

";
        let chain = parse_chain_bytes(data).unwrap();
        assert_eq!(chain.blocks.len(), 2);
        assert_eq!(chain.pairings.len(), 1);
        assert_eq!(chain.reference_sizes["ref"], 1000);

        let first = &chain.blocks[0];
        assert_eq!((first.reference_start, first.reference_end), (100, 200));
        assert_eq!((first.alternate_start, first.alternate_end), (0, 100));

        let second = &chain.blocks[1];
        assert_eq!((second.reference_start, second.reference_end), (250, 400));
        assert_eq!((second.alternate_start, second.alternate_end), (140, 290));
        assert_eq!(second.alternate_strand, Strand::Plus);
    }

    #[test]
    fn test_parse_minus_strand_alternate() {
        let data = b"chain 10 ref 100 + 0 10 alt 50 - 0 10 1\n10\n";
        let chain = parse_chain_bytes(data).unwrap();
        let block = &chain.blocks[0];
        assert_eq!(block.alternate_strand, Strand::Minus);
        assert_eq!((block.alternate_start, block.alternate_end), (40, 50));
    }

    #[test]
    fn test_data_line_outside_chain() {
        let err = parse_chain_bytes(b"100 0 0\n").unwrap_err();
        assert!(err.is_kind(ChainParseErrorKind::InvalidDataLine));
        assert_eq!(err.line_number, Some(1));
    }

    #[test]
    fn test_zero_size_block() {
        let err = parse_chain_bytes(b"chain 1 ref 10 + 0 10 alt 10 + 0 10 1\n0\n").unwrap_err();
        assert!(err.is_kind(ChainParseErrorKind::InvalidDataLine));
        assert_eq!(err.line_number, Some(2));
    }

    #[test]
    fn test_block_past_header_end() {
        let err = parse_chain_bytes(b"chain 1 ref 100 + 0 10 alt 100 + 0 10 1\n20\n").unwrap_err();
        assert!(err.is_kind(ChainParseErrorKind::InvalidCoordinates));
    }
}
