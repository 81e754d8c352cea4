//! Feature interval remapping policy
//!
//! Decides what becomes of one feature interval on the alternate assembly:
//! kept with translated endpoints, kept with an open boundary, or dropped.
//!
//! Each endpoint rounds away from the feature's interior when its base has
//! no direct counterpart, so partially aligned features keep their full
//! extent rather than shrinking:
//!
//! | orientation | start bias  | end bias    |
//! |-------------|-------------|-------------|
//! | forward     | `RoundDown` | `RoundUp`   |
//! | reverse     | `RoundUp`   | `RoundDown` |

use crate::core::error::{MappingError, MappingResult};
use crate::core::{Bias, CoordinateTranslator, SequenceLengths, Strand};
use std::fmt;

/// Marker for a boundary extending past the start of the sequence
pub const OPEN_START_MARKER: char = '<';

/// Marker for a boundary extending past the end of the sequence
pub const OPEN_END_MARKER: char = '>';

/// Handling of features that overhang the aligned region on one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfBounds {
    /// Drop partially out-of-bounds features
    #[default]
    Drop,
    /// Keep them, truncated at the sequence boundary with an open marker
    Clip,
}

impl OutOfBounds {
    /// Policy from the clip flag
    pub fn from_clip(clip: bool) -> Self {
        if clip {
            OutOfBounds::Clip
        } else {
            OutOfBounds::Drop
        }
    }
}

/// One endpoint of a remapped feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Translated 1-based position
    Exact(u64),
    /// Open boundary at the first base, written `<1`
    OpenStart,
    /// Open boundary at the last base of a sequence of the given length,
    /// written `>LEN`
    OpenEnd(u64),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Exact(pos) => write!(f, "{}", pos),
            Endpoint::OpenStart => write!(f, "{}1", OPEN_START_MARKER),
            Endpoint::OpenEnd(len) => write!(f, "{}{}", OPEN_END_MARKER, len),
        }
    }
}

/// Outcome of remapping one feature interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remap {
    /// Both endpoints translated
    Mapped { start: u64, end: u64 },
    /// One endpoint replaced by an open boundary
    Clipped { start: Endpoint, end: Endpoint },
    /// Neither endpoint translated
    Unaligned,
    /// One endpoint translated and clipping is disabled
    Overhang,
}

impl Remap {
    /// Whether the feature survives the transfer
    pub fn is_retained(&self) -> bool {
        matches!(self, Remap::Mapped { .. } | Remap::Clipped { .. })
    }

    /// Endpoints to write, if retained
    pub fn endpoints(&self) -> Option<(Endpoint, Endpoint)> {
        match *self {
            Remap::Mapped { start, end } => Some((Endpoint::Exact(start), Endpoint::Exact(end))),
            Remap::Clipped { start, end } => Some((start, end)),
            Remap::Unaligned | Remap::Overhang => None,
        }
    }
}

/// Biases for the (start, end) endpoints of a feature
pub fn endpoint_biases(strand: Strand) -> (Bias, Bias) {
    match strand {
        Strand::Plus => (Bias::RoundDown, Bias::RoundUp),
        Strand::Minus => (Bias::RoundUp, Bias::RoundDown),
    }
}

/// Remap a feature interval written as (start, end) on `reference_id`
///
/// `alternate_id` is the sequence the record was translated to; its length
/// is looked up in `lengths` only when an open end boundary is needed.
///
/// A missing endpoint is replaced by the marker of its column, whatever
/// the feature's orientation: an unmapped start becomes `<1` (5' partial)
/// and an unmapped end becomes `>LEN` (3' partial).
pub fn remap_interval<T: CoordinateTranslator + ?Sized>(
    translator: &T,
    reference_id: &str,
    alternate_id: &str,
    start: u64,
    end: u64,
    policy: OutOfBounds,
    lengths: &SequenceLengths,
) -> MappingResult<Remap> {
    let strand = Strand::from_endpoints(start, end);
    let (start_bias, end_bias) = endpoint_biases(strand);

    let mapped_start = translator.translate_position(reference_id, start, start_bias);
    let mapped_end = translator.translate_position(reference_id, end, end_bias);

    let (start, end) = match (mapped_start, mapped_end) {
        (Some(start), Some(end)) => return Ok(Remap::Mapped { start, end }),
        (None, None) => return Ok(Remap::Unaligned),
        _ if policy == OutOfBounds::Drop => return Ok(Remap::Overhang),
        pair => pair,
    };

    let start = start.map_or(Endpoint::OpenStart, Endpoint::Exact);
    let end = match end {
        Some(pos) => Endpoint::Exact(pos),
        None => lengths
            .get(alternate_id)
            .map(Endpoint::OpenEnd)
            .ok_or_else(|| MappingError::UnknownLength(alternate_id.to_string()))?,
    };

    Ok(Remap::Clipped { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Translator answering from a fixed table of (position, bias) pairs
    struct TableTranslator(HashMap<(u64, Bias), u64>);

    impl TableTranslator {
        fn new(entries: &[(u64, Bias, u64)]) -> Self {
            Self(entries.iter().map(|&(p, b, m)| ((p, b), m)).collect())
        }
    }

    impl CoordinateTranslator for TableTranslator {
        fn translate_id(&self, reference_id: &str) -> MappingResult<String> {
            Ok(reference_id.to_string())
        }

        fn translate_position(&self, _: &str, position: u64, bias: Bias) -> Option<u64> {
            self.0.get(&(position, bias)).copied()
        }
    }

    fn lengths() -> SequenceLengths {
        [("alt".to_string(), 580u64)].into_iter().collect()
    }

    #[test]
    fn test_forward_feature_uses_outward_biases() {
        let t = TableTranslator::new(&[(100, Bias::RoundDown, 95), (200, Bias::RoundUp, 210)]);
        let r = remap_interval(&t, "ref", "alt", 100, 200, OutOfBounds::Drop, &lengths()).unwrap();
        assert_eq!(r, Remap::Mapped { start: 95, end: 210 });
    }

    #[test]
    fn test_reverse_feature_swaps_biases() {
        let t = TableTranslator::new(&[(200, Bias::RoundUp, 190), (100, Bias::RoundDown, 90)]);
        let r = remap_interval(&t, "ref", "alt", 200, 100, OutOfBounds::Drop, &lengths()).unwrap();
        assert_eq!(r, Remap::Mapped { start: 190, end: 90 });
    }

    #[test]
    fn test_both_unmapped_is_dropped_even_when_clipping() {
        let t = TableTranslator::new(&[]);
        let r = remap_interval(&t, "ref", "alt", 10, 20, OutOfBounds::Clip, &lengths()).unwrap();
        assert_eq!(r, Remap::Unaligned);
        assert!(!r.is_retained());
    }

    #[test]
    fn test_overhang_without_clip_is_dropped() {
        let t = TableTranslator::new(&[(500, Bias::RoundDown, 480)]);
        let r = remap_interval(&t, "ref", "alt", 500, 600, OutOfBounds::Drop, &lengths()).unwrap();
        assert_eq!(r, Remap::Overhang);
        assert_eq!(r.endpoints(), None);
    }

    #[test]
    fn test_forward_right_overhang_clips_to_length() {
        let t = TableTranslator::new(&[(500, Bias::RoundDown, 480)]);
        let r = remap_interval(&t, "ref", "alt", 500, 600, OutOfBounds::Clip, &lengths()).unwrap();
        let (start, end) = r.endpoints().unwrap();
        assert_eq!(start.to_string(), "480");
        assert_eq!(end.to_string(), ">580");
    }

    #[test]
    fn test_forward_left_overhang_clips_to_one() {
        let t = TableTranslator::new(&[(20, Bias::RoundUp, 12)]);
        let r = remap_interval(&t, "ref", "alt", 1, 20, OutOfBounds::Clip, &lengths()).unwrap();
        assert_eq!(
            r,
            Remap::Clipped {
                start: Endpoint::OpenStart,
                end: Endpoint::Exact(12)
            }
        );
    }

    #[test]
    fn test_reverse_overhangs_use_column_markers() {
        let t = TableTranslator::new(&[(100, Bias::RoundDown, 90)]);
        let r = remap_interval(&t, "ref", "alt", 700, 100, OutOfBounds::Clip, &lengths()).unwrap();
        assert_eq!(
            r,
            Remap::Clipped {
                start: Endpoint::OpenStart,
                end: Endpoint::Exact(90)
            }
        );

        let t = TableTranslator::new(&[(300, Bias::RoundUp, 280)]);
        let r = remap_interval(&t, "ref", "alt", 300, 2, OutOfBounds::Clip, &lengths()).unwrap();
        assert_eq!(
            r,
            Remap::Clipped {
                start: Endpoint::Exact(280),
                end: Endpoint::OpenEnd(580)
            }
        );
    }

    #[test]
    fn test_missing_length_is_an_error() {
        let t = TableTranslator::new(&[(500, Bias::RoundDown, 480)]);
        let err = remap_interval(&t, "ref", "other", 500, 600, OutOfBounds::Clip, &lengths())
            .unwrap_err();
        assert_eq!(err, MappingError::UnknownLength("other".into()));
    }

    #[test]
    fn test_single_base_feature_is_forward() {
        let t = TableTranslator::new(&[(50, Bias::RoundDown, 40), (50, Bias::RoundUp, 41)]);
        let r = remap_interval(&t, "ref", "alt", 50, 50, OutOfBounds::Drop, &lengths()).unwrap();
        assert_eq!(r, Remap::Mapped { start: 40, end: 41 });
    }

    #[test]
    fn test_out_of_bounds_from_clip() {
        assert_eq!(OutOfBounds::from_clip(true), OutOfBounds::Clip);
        assert_eq!(OutOfBounds::from_clip(false), OutOfBounds::Drop);
        assert_eq!(OutOfBounds::default(), OutOfBounds::Drop);
    }
}
