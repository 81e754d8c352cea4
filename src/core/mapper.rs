//! Chain-backed coordinate translation
//!
//! Translates reference positions onto the alternate assembly using a
//! chain file:
//! 1. The reference sequence is paired with the alternate sequence of its
//!    highest-scoring chain
//! 2. Positions inside an aligned block map by offset
//! 3. Positions in an alignment gap round to the neighbouring aligned base
//!    in the requested direction

use crate::core::error::{MappingError, MappingResult};
use crate::core::{Bias, ChainIndex, ChainParseError, CoordinateTranslator};
use std::path::Path;

/// Strand orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    /// Strand field of a chain header (`+` / `-`)
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Strand::Plus),
            '-' => Some(Strand::Minus),
            _ => None,
        }
    }

    /// Orientation of a feature from its written endpoints
    ///
    /// Feature tables encode strand by endpoint order; equal endpoints count
    /// as forward.
    ///
    /// # Examples
    /// ```
    /// use tbl_transfer::core::Strand;
    /// assert_eq!(Strand::from_endpoints(100, 200), Strand::Plus);
    /// assert_eq!(Strand::from_endpoints(200, 100), Strand::Minus);
    /// assert_eq!(Strand::from_endpoints(150, 150), Strand::Plus);
    /// ```
    pub fn from_endpoints(start: u64, end: u64) -> Self {
        if end >= start {
            Strand::Plus
        } else {
            Strand::Minus
        }
    }
}

/// Coordinate translator using a chain index
pub struct CoordinateMapper {
    index: ChainIndex,
}

impl CoordinateMapper {
    pub fn new(index: ChainIndex) -> Self {
        Self { index }
    }

    /// Load a (possibly compressed) chain file
    pub fn from_chain_file<P: AsRef<Path>>(path: P) -> Result<Self, ChainParseError> {
        Ok(Self::new(ChainIndex::from_chain_file(path)?))
    }

    /// Get a reference to the underlying index
    pub fn index(&self) -> &ChainIndex {
        &self.index
    }
}

impl CoordinateTranslator for CoordinateMapper {
    fn translate_id(&self, reference_id: &str) -> MappingResult<String> {
        self.index
            .primary_alternate(reference_id)
            .map(str::to_string)
            .ok_or_else(|| MappingError::UnknownSequence(reference_id.to_string()))
    }

    fn translate_position(&self, reference_id: &str, position: u64, bias: Bias) -> Option<u64> {
        let alternate_id = self.index.primary_alternate(reference_id)?;
        self.index.translate(reference_id, alternate_id, position, bias)
    }
}
