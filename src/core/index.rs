//! Interval index for biased position lookups
//!
//! Uses rust-lapper for O(log n + k) containment queries, plus a sorted
//! block list per sequence pair for nearest-block searches across gaps.

use crate::core::chain::{parse_chain_file, ChainFile, ChainParseError};
use crate::core::{Bias, Strand};
use rust_lapper::{Interval, Lapper};
use std::collections::HashMap;
use std::path::Path;

/// Value stored in each interval - alternate-side coordinates of the block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedBlock {
    /// Alternate start position (0-based, forward strand)
    pub alternate_start: u64,
    /// Alternate end position (exclusive)
    pub alternate_end: u64,
    /// Whether the block runs backwards along the alternate sequence
    pub alternate_strand: Strand,
}

/// Type alias for block intervals (reference coordinates, 0-based half-open)
pub type BlockInterval = Interval<u64, AlignedBlock>;

/// Blocks aligning one reference sequence to one alternate sequence
struct PairIndex {
    lapper: Lapper<u64, AlignedBlock>,
    /// Length of the longest block, bounds the backwards scan for round-down
    max_len: u64,
    /// Reference span covered by the blocks, [first start, furthest stop)
    span: (u64, u64),
}

impl PairIndex {
    fn new(intervals: Vec<BlockInterval>) -> Self {
        let max_len = intervals.iter().map(|iv| iv.stop - iv.start).max().unwrap_or(0);
        let span = (
            intervals.iter().map(|iv| iv.start).min().unwrap_or(0),
            intervals.iter().map(|iv| iv.stop).max().unwrap_or(0),
        );
        Self {
            lapper: Lapper::new(intervals),
            max_len,
            span,
        }
    }

    /// Map a 0-based reference position, rounding across gaps by `bias`
    ///
    /// Rounding only crosses gaps between blocks; positions outside the
    /// aligned span are unmapped whatever the bias.
    fn translate(&self, pos: u64, bias: Bias) -> Option<u64> {
        if pos < self.span.0 || pos >= self.span.1 {
            return None;
        }

        if let Some(iv) = self.lapper.find(pos, pos + 1).next() {
            return Some(map_within(iv, pos));
        }

        let intervals = &self.lapper.intervals;
        // First block starting after pos; nothing before it contains pos
        let after = intervals.partition_point(|iv| iv.start <= pos);

        match bias {
            Bias::RoundUp => intervals.get(after).map(|iv| map_within(iv, iv.start)),
            Bias::RoundDown => {
                let mut best: Option<&BlockInterval> = None;
                for iv in intervals[..after].iter().rev() {
                    if let Some(b) = best {
                        if iv.start + self.max_len <= b.stop {
                            break;
                        }
                    }
                    if best.map_or(true, |b| iv.stop > b.stop) {
                        best = Some(iv);
                    }
                }
                best.map(|iv| map_within(iv, iv.stop - 1))
            }
        }
    }
}

/// Map a 0-based reference position known to lie inside `iv`
#[inline]
fn map_within(iv: &BlockInterval, pos: u64) -> u64 {
    let offset = pos - iv.start;
    match iv.val.alternate_strand {
        Strand::Plus => iv.val.alternate_start + offset,
        Strand::Minus => iv.val.alternate_end - 1 - offset,
    }
}

/// Alignment index organized by reference sequence, then alternate sequence
pub struct ChainIndex {
    maps: HashMap<String, HashMap<String, PairIndex>>,
    /// Reference id -> alternate id of its highest-scoring chain
    primary: HashMap<String, (String, u64)>,
    /// Reference sequence sizes declared by the chain file
    pub reference_sizes: HashMap<String, u64>,
    /// Alternate sequence sizes declared by the chain file
    pub alternate_sizes: HashMap<String, u64>,
}

impl ChainIndex {
    /// Build index from a chain file
    ///
    /// Automatically handles gzip and bzip2 compression.
    pub fn from_chain_file<P: AsRef<Path>>(path: P) -> Result<Self, ChainParseError> {
        let chain_file = parse_chain_file(path.as_ref())?;
        Ok(Self::from_chain_data(chain_file))
    }

    /// Build index from parsed chain data
    pub fn from_chain_data(chain_file: ChainFile) -> Self {
        let mut grouped: HashMap<String, HashMap<String, Vec<BlockInterval>>> = HashMap::new();

        for block in chain_file.blocks {
            grouped
                .entry(block.reference_id)
                .or_default()
                .entry(block.alternate_id)
                .or_default()
                .push(Interval {
                    start: block.reference_start,
                    stop: block.reference_end,
                    val: AlignedBlock {
                        alternate_start: block.alternate_start,
                        alternate_end: block.alternate_end,
                        alternate_strand: block.alternate_strand,
                    },
                });
        }

        let maps = grouped
            .into_iter()
            .map(|(reference, by_alternate)| {
                let pairs = by_alternate
                    .into_iter()
                    .map(|(alternate, intervals)| (alternate, PairIndex::new(intervals)))
                    .collect();
                (reference, pairs)
            })
            .collect();

        let mut primary: HashMap<String, (String, u64)> = HashMap::new();
        for pairing in chain_file.pairings {
            match primary.get(&pairing.reference_id) {
                Some((_, score)) if *score >= pairing.score => {}
                _ => {
                    primary.insert(pairing.reference_id, (pairing.alternate_id, pairing.score));
                }
            }
        }

        Self {
            maps,
            primary,
            reference_sizes: chain_file.reference_sizes,
            alternate_sizes: chain_file.alternate_sizes,
        }
    }

    /// Alternate sequence paired with `reference_id` by its best chain
    pub fn primary_alternate(&self, reference_id: &str) -> Option<&str> {
        self.primary.get(reference_id).map(|(alt, _)| alt.as_str())
    }

    /// Translate a 1-based reference position onto `alternate_id`
    ///
    /// Positions inside an aligned block map by offset. Positions in a gap
    /// round to the nearest aligned base below (`RoundDown`) or above
    /// (`RoundUp`). Returns None outside the aligned span of the pair, for
    /// position 0, and for unknown sequence pairs.
    pub fn translate(
        &self,
        reference_id: &str,
        alternate_id: &str,
        position: u64,
        bias: Bias,
    ) -> Option<u64> {
        let pos = position.checked_sub(1)?;
        let pair = self.maps.get(reference_id)?.get(alternate_id)?;
        pair.translate(pos, bias).map(|p| p + 1)
    }

    /// Get total number of aligned blocks
    pub fn total_blocks(&self) -> usize {
        self.maps
            .values()
            .flat_map(|pairs| pairs.values())
            .map(|p| p.lapper.len())
            .sum()
    }
}
