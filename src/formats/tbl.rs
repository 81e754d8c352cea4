//! NCBI feature table (TBL) adapter
//!
//! Transfers a five-column feature table from the reference assembly onto
//! the alternate assembly in a single forward scan.
//!
//! ```text
//! >Feature gb|KJ660346.2|
//! 56\t18615\tgene
//! \t\t\tgene\tL
//! 56\t18615\tCDS
//! \t\t\tproduct\tRNA-dependent RNA polymerase
//! \t\t\tprotein_id\tgb|AHX26154.1|
//! ```
//!
//! Header lines are rewritten to the translated sequence id, coordinate
//! lines are remapped (see [`crate::core::remap`]), and qualifier lines
//! follow the fate of the feature they belong to. `protein_id` qualifiers
//! are never carried over since protein accessions belong to the reference
//! submission.

use crate::core::io::{open_reader, LineIterator, DEFAULT_BUFFER_SIZE};
use crate::core::{
    remap_interval, CoordinateTranslator, Endpoint, OutOfBounds, Remap, SequenceLengths,
    Strand, TransferError, TransferResult,
};
use rayon::prelude::*;
use std::borrow::Cow;
use std::io::{self, BufRead, BufWriter, Write};
use std::ops::Range;
use std::path::Path;

/// First character of a record header line
pub const RECORD_MARKER: char = '>';

/// Prefix of a feature block header, including the separating space
pub const FEATURE_MARKER: &str = ">Feature ";

/// Opening delimiter of a GenBank-namespaced accession (`gb|ACCESSION|`)
pub const ACCESSION_PREFIX: &str = "gb|";

/// Closing delimiter of a GenBank-namespaced accession
pub const ACCESSION_SUFFIX: &str = "|";

/// Leading character of qualifier lines
pub const INDENT: char = '\t';

/// Column separator of coordinate lines
pub const COLUMN_SEPARATOR: char = '\t';

/// Qualifier key that is never transferred
pub const PROTEIN_ID_QUALIFIER: &str = "protein_id";

/// Structural kind of a feature table line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Header,
    Coordinate,
    Qualifier,
}

impl LineKind {
    /// Classify a line with its terminator already stripped
    pub fn classify(line: &str) -> Self {
        if line.is_empty() {
            LineKind::Blank
        } else if line.starts_with(RECORD_MARKER) {
            LineKind::Header
        } else if line.starts_with(INDENT) {
            LineKind::Qualifier
        } else {
            LineKind::Coordinate
        }
    }
}

/// `>Feature gb|ACCESSION|`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLine<'a> {
    /// Accession with the namespace wrapper removed
    pub accession: &'a str,
}

impl<'a> HeaderLine<'a> {
    pub fn parse(line: &'a str, line_number: usize) -> TransferResult<Self> {
        let rest = line.strip_prefix(FEATURE_MARKER).ok_or_else(|| {
            TransferError::format("record header is not a '>Feature' block", line_number, line)
        })?;

        let accession = rest
            .trim()
            .strip_prefix(ACCESSION_PREFIX)
            .and_then(|s| s.strip_suffix(ACCESSION_SUFFIX))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                TransferError::format(
                    format!(
                        "accession is not a GenBank reference of the form {}ACCESSION{}",
                        ACCESSION_PREFIX, ACCESSION_SUFFIX
                    ),
                    line_number,
                    line,
                )
            })?;

        Ok(Self { accession })
    }
}

/// `start\tend[\tfeature-type[\t...]]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateLine<'a> {
    pub start: u64,
    pub end: u64,
    /// Everything after the second column, untouched
    pub rest: Option<&'a str>,
}

impl<'a> CoordinateLine<'a> {
    pub fn parse(line: &'a str, line_number: usize) -> TransferResult<Self> {
        let mut columns = line.splitn(3, COLUMN_SEPARATOR);
        let start_col = columns.next().unwrap_or_default();
        let end_col = columns.next().ok_or_else(|| {
            TransferError::format(
                "feature line needs at least start and end columns",
                line_number,
                line,
            )
        })?;

        let parse_column = |value: &str, name: &str| -> TransferResult<u64> {
            value.trim().parse::<u64>().map_err(|_| {
                TransferError::format(
                    format!("{} column '{}' is not an integer", name, value),
                    line_number,
                    line,
                )
            })
        };

        Ok(Self {
            start: parse_column(start_col, "start")?,
            end: parse_column(end_col, "end")?,
            rest: columns.next(),
        })
    }

    /// Orientation encoded by the endpoint order
    pub fn strand(&self) -> Strand {
        Strand::from_endpoints(self.start, self.end)
    }

    /// Render the line with new endpoints and the original trailing columns
    pub fn render(&self, start: Endpoint, end: Endpoint) -> String {
        match self.rest {
            Some(rest) => format!(
                "{}{sep}{}{sep}{}",
                start,
                end,
                rest,
                sep = COLUMN_SEPARATOR
            ),
            None => format!("{}{}{}", start, COLUMN_SEPARATOR, end),
        }
    }
}

/// A classified and parsed feature table line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TblLine<'a> {
    Blank,
    Header(HeaderLine<'a>),
    Coordinate(CoordinateLine<'a>),
    Qualifier(&'a str),
}

impl<'a> TblLine<'a> {
    pub fn parse(line: &'a str, line_number: usize) -> TransferResult<Self> {
        Ok(match LineKind::classify(line) {
            LineKind::Blank => TblLine::Blank,
            LineKind::Header => TblLine::Header(HeaderLine::parse(line, line_number)?),
            LineKind::Coordinate => TblLine::Coordinate(CoordinateLine::parse(line, line_number)?),
            LineKind::Qualifier => TblLine::Qualifier(line),
        })
    }
}

/// Fate of the current feature, inherited by its qualifier lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureState {
    Retained,
    Dropped,
}

impl From<&Remap> for FeatureState {
    fn from(remap: &Remap) -> Self {
        if remap.is_retained() {
            FeatureState::Retained
        } else {
            FeatureState::Dropped
        }
    }
}

#[derive(Debug, Clone)]
struct RecordContext {
    reference_id: String,
    alternate_id: String,
    feature: Option<FeatureState>,
}

/// Mutable scan state: the active record and the active feature's fate
///
/// A header starts a new record and clears any feature state; a coordinate
/// line sets the state that all following qualifier lines inherit.
#[derive(Debug, Clone, Default)]
pub struct TransferContext {
    record: Option<RecordContext>,
}

impl TransferContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a record, forgetting the previous record and feature
    pub fn begin_record(&mut self, reference_id: impl Into<String>, alternate_id: impl Into<String>) {
        self.record = Some(RecordContext {
            reference_id: reference_id.into(),
            alternate_id: alternate_id.into(),
            feature: None,
        });
    }

    /// Enter a feature of the active record; ignored outside a record
    pub fn begin_feature(&mut self, state: FeatureState) {
        if let Some(record) = self.record.as_mut() {
            record.feature = Some(state);
        }
    }

    pub fn in_record(&self) -> bool {
        self.record.is_some()
    }

    pub fn reference_id(&self) -> Option<&str> {
        self.record.as_ref().map(|r| r.reference_id.as_str())
    }

    pub fn alternate_id(&self) -> Option<&str> {
        self.record.as_ref().map(|r| r.alternate_id.as_str())
    }

    /// State governing the next qualifier line, if a feature is active
    pub fn feature_state(&self) -> Option<FeatureState> {
        self.record.as_ref().and_then(|r| r.feature)
    }
}

/// How rewritten header lines name the alternate sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderStyle {
    /// `>Feature ALTID`
    #[default]
    Bare,
    /// `>Feature gb|ALTID|`
    Wrapped,
}

impl HeaderStyle {
    pub fn render(&self, alternate_id: &str) -> String {
        match self {
            HeaderStyle::Bare => format!("{}{}", FEATURE_MARKER, alternate_id),
            HeaderStyle::Wrapped => format!(
                "{}{}{}{}",
                FEATURE_MARKER, ACCESSION_PREFIX, alternate_id, ACCESSION_SUFFIX
            ),
        }
    }
}

/// Transfer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    pub out_of_bounds: OutOfBounds,
    pub header_style: HeaderStyle,
    /// Worker threads; records are processed in parallel above 1
    pub threads: usize,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            out_of_bounds: OutOfBounds::Drop,
            header_style: HeaderStyle::Bare,
            threads: 1,
        }
    }
}

impl TransferOptions {
    pub fn with_clip(mut self, clip: bool) -> Self {
        self.out_of_bounds = OutOfBounds::from_clip(clip);
        self
    }

    pub fn with_header_style(mut self, header_style: HeaderStyle) -> Self {
        self.header_style = header_style;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

/// Conversion statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub records: usize,
    pub features: usize,
    pub retained: usize,
    /// Retained features with an open boundary (subset of `retained`)
    pub clipped: usize,
    pub dropped: usize,
    /// Qualifier lines removed along with their dropped feature
    pub qualifiers_dropped: usize,
    pub protein_ids_removed: usize,
    pub blank_lines: usize,
}

impl ConversionStats {
    pub fn merge(&mut self, other: &ConversionStats) {
        self.records += other.records;
        self.features += other.features;
        self.retained += other.retained;
        self.clipped += other.clipped;
        self.dropped += other.dropped;
        self.qualifiers_dropped += other.qualifiers_dropped;
        self.protein_ids_removed += other.protein_ids_removed;
        self.blank_lines += other.blank_lines;
    }
}

/// Feature table transfer engine
pub struct TblTransfer<'a, T: CoordinateTranslator + ?Sized> {
    translator: &'a T,
    alternate_lengths: &'a SequenceLengths,
    reference_lengths: Option<&'a SequenceLengths>,
    options: TransferOptions,
    context: TransferContext,
    stats: ConversionStats,
}

impl<'a, T: CoordinateTranslator + ?Sized> TblTransfer<'a, T> {
    pub fn new(
        translator: &'a T,
        alternate_lengths: &'a SequenceLengths,
        options: TransferOptions,
    ) -> Self {
        Self {
            translator,
            alternate_lengths,
            reference_lengths: None,
            options,
            context: TransferContext::new(),
            stats: ConversionStats::default(),
        }
    }

    /// Reject header accessions that are not sequences of the reference assembly
    pub fn with_reference_lengths(mut self, reference_lengths: &'a SequenceLengths) -> Self {
        self.reference_lengths = Some(reference_lengths);
        self
    }

    pub fn context(&self) -> &TransferContext {
        &self.context
    }

    pub fn stats(&self) -> &ConversionStats {
        &self.stats
    }

    pub fn into_stats(self) -> ConversionStats {
        self.stats
    }

    /// Same inputs, fresh context and statistics
    fn fork(&self) -> Self {
        Self {
            translator: self.translator,
            alternate_lengths: self.alternate_lengths,
            reference_lengths: self.reference_lengths,
            options: self.options,
            context: TransferContext::new(),
            stats: ConversionStats::default(),
        }
    }

    /// Process one line; returns the output line, or None if suppressed
    pub fn process_line<'l>(
        &mut self,
        line: &'l str,
        line_number: usize,
    ) -> TransferResult<Option<Cow<'l, str>>> {
        match TblLine::parse(line, line_number)? {
            TblLine::Blank => {
                self.stats.blank_lines += 1;
                Ok(None)
            }
            TblLine::Header(header) => {
                let rewritten = self.handle_header(header, line, line_number)?;
                Ok(Some(Cow::Owned(rewritten)))
            }
            TblLine::Coordinate(coords) => {
                let rewritten = self.handle_coordinate(coords, line, line_number)?;
                Ok(rewritten.map(Cow::Owned))
            }
            TblLine::Qualifier(text) => {
                let keep = self.handle_qualifier(text, line_number)?;
                Ok(keep.then_some(Cow::Borrowed(text)))
            }
        }
    }

    fn handle_header(
        &mut self,
        header: HeaderLine<'_>,
        line: &str,
        line_number: usize,
    ) -> TransferResult<String> {
        let accession = header.accession;

        if let Some(reference) = self.reference_lengths {
            if !reference.contains(accession) {
                return Err(TransferError::ForeignAccession {
                    line: line_number,
                    id: accession.to_string(),
                });
            }
        }

        let alternate_id = self
            .translator
            .translate_id(accession)
            .map_err(|e| TransferError::from_mapping(e, line_number, line))?;

        log::debug!("Record {} -> {} (line {})", accession, alternate_id, line_number);

        let rewritten = self.options.header_style.render(&alternate_id);
        self.context.begin_record(accession, alternate_id);
        self.stats.records += 1;
        Ok(rewritten)
    }

    fn handle_coordinate(
        &mut self,
        coords: CoordinateLine<'_>,
        line: &str,
        line_number: usize,
    ) -> TransferResult<Option<String>> {
        let (reference_id, alternate_id) =
            match (self.context.reference_id(), self.context.alternate_id()) {
                (Some(reference_id), Some(alternate_id)) => (reference_id, alternate_id),
                _ => {
                    return Err(TransferError::format(
                        "feature line outside of a '>Feature' record",
                        line_number,
                        line,
                    ))
                }
            };

        let remap = remap_interval(
            self.translator,
            reference_id,
            alternate_id,
            coords.start,
            coords.end,
            self.options.out_of_bounds,
            self.alternate_lengths,
        )
        .map_err(|e| TransferError::from_mapping(e, line_number, line))?;

        self.stats.features += 1;
        self.context.begin_feature(FeatureState::from(&remap));

        match remap.endpoints() {
            Some((start, end)) => {
                self.stats.retained += 1;
                if matches!(remap, Remap::Clipped { .. }) {
                    self.stats.clipped += 1;
                    log::debug!("Clipped feature at line {}: {} {}", line_number, start, end);
                }
                Ok(Some(coords.render(start, end)))
            }
            None => {
                self.stats.dropped += 1;
                log::debug!("Dropped feature at line {} ({:?})", line_number, remap);
                Ok(None)
            }
        }
    }

    fn handle_qualifier(&mut self, line: &str, line_number: usize) -> TransferResult<bool> {
        if !self.context.in_record() {
            return Err(TransferError::format(
                "qualifier line outside of a '>Feature' record",
                line_number,
                line,
            ));
        }

        // Lines ahead of the record's first feature are kept
        match self.context.feature_state().unwrap_or(FeatureState::Retained) {
            FeatureState::Dropped => {
                self.stats.qualifiers_dropped += 1;
                Ok(false)
            }
            FeatureState::Retained if line.contains(PROTEIN_ID_QUALIFIER) => {
                self.stats.protein_ids_removed += 1;
                Ok(false)
            }
            FeatureState::Retained => Ok(true),
        }
    }

    /// Stream a whole document from `reader` to `writer`
    pub fn transfer<R: BufRead, W: Write>(&mut self, reader: R, writer: &mut W) -> TransferResult<()> {
        let mut lines = LineIterator::new(reader);
        while let Some(next) = lines.next_line() {
            let (line_number, line) = next?;
            if let Some(text) = self.process_line(line, line_number)? {
                writer.write_all(text.as_bytes())?;
                writer.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    /// Transfer an in-memory document, processing records in parallel
    ///
    /// Each record gets its own context; output keeps input order and the
    /// first failing line (in document order) is reported.
    pub fn transfer_records<W: Write>(&mut self, lines: &[String], writer: &mut W) -> TransferResult<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.threads.max(1))
            .build()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        let chunks = split_records(lines);
        let template = &*self;

        let results: Vec<TransferResult<(Vec<String>, ConversionStats)>> = pool.install(|| {
            chunks
                .par_iter()
                .map(|range| -> TransferResult<(Vec<String>, ConversionStats)> {
                    let mut worker = template.fork();
                    let mut out = Vec::with_capacity(range.len());
                    for (offset, line) in lines[range.clone()].iter().enumerate() {
                        if let Some(text) = worker.process_line(line, range.start + offset + 1)? {
                            out.push(text.into_owned());
                        }
                    }
                    Ok((out, worker.stats))
                })
                .collect()
        });

        for result in results {
            let (out, stats) = result?;
            for text in out {
                writer.write_all(text.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            self.stats.merge(&stats);
        }
        Ok(())
    }
}

/// Split a document into line ranges, one per record
///
/// Every header starts a new range; lines before the first header form a
/// range of their own.
pub fn split_records(lines: &[String]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (idx, line) in lines.iter().enumerate() {
        if idx > start && LineKind::classify(line) == LineKind::Header {
            ranges.push(start..idx);
            start = idx;
        }
    }
    if start < lines.len() {
        ranges.push(start..lines.len());
    }
    ranges
}

/// Transfer a feature table file onto the alternate assembly
///
/// The output is written to a temporary file next to `output` and moved into
/// place only when the whole document transferred, so a fatal error leaves
/// no partial table behind.
///
/// # Arguments
/// * `input` - Reference feature table (may be gzip/bzip2 compressed)
/// * `output` - Output feature table path
/// * `translator` - Reference to alternate coordinate translator
/// * `alternate_lengths` - Alternate assembly sequence lengths
/// * `reference_lengths` - Reference assembly sequence lengths, to validate headers
/// * `options` - Transfer settings
///
/// # Returns
/// Conversion statistics
pub fn convert_tbl<T, P, Q>(
    input: P,
    output: Q,
    translator: &T,
    alternate_lengths: &SequenceLengths,
    reference_lengths: Option<&SequenceLengths>,
    options: TransferOptions,
) -> TransferResult<ConversionStats>
where
    T: CoordinateTranslator + ?Sized,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let output = output.as_ref();
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = tempfile::NamedTempFile::new_in(dir)?;

    let mut transfer = TblTransfer::new(translator, alternate_lengths, options);
    if let Some(reference) = reference_lengths {
        transfer = transfer.with_reference_lengths(reference);
    }

    {
        let reader = open_reader(input.as_ref())?;
        let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, temp.as_file());
        if options.threads > 1 {
            let lines = reader.lines().collect::<io::Result<Vec<String>>>()?;
            transfer.transfer_records(&lines, &mut writer)?;
        } else {
            transfer.transfer(reader, &mut writer)?;
        }
        writer.flush()?;
    }

    temp.persist(output).map_err(|e| e.error)?;

    let stats = transfer.into_stats();
    log::info!(
        "Transferred {} records: {} of {} features retained ({} clipped), {} dropped",
        stats.records,
        stats.retained,
        stats.features,
        stats.clipped,
        stats.dropped
    );
    Ok(stats)
}
