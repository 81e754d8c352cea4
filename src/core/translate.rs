//! Coordinate translator capability
//!
//! The transfer engine only needs two questions answered: which alternate
//! sequence corresponds to a reference sequence, and where a reference base
//! lands on it. Anything that can answer them implements
//! [`CoordinateTranslator`].

use crate::core::error::{MappingError, MappingResult};
use crate::core::SequenceLengths;

/// Rounding direction for a base with no direct counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bias {
    /// Round to the nearest aligned base with a lower reference coordinate
    RoundDown,
    /// Round to the nearest aligned base with a higher reference coordinate
    RoundUp,
}

/// Read-only translation from reference to alternate coordinates
///
/// Implementations must be safe to share across threads; the engine may
/// process independent records in parallel against one translator.
pub trait CoordinateTranslator: Sync {
    /// Alternate sequence id corresponding to `reference_id`
    fn translate_id(&self, reference_id: &str) -> MappingResult<String>;

    /// Translate a 1-based reference position, or None if it has no
    /// alternate counterpart in the `bias` direction
    fn translate_position(&self, reference_id: &str, position: u64, bias: Bias) -> Option<u64>;
}

impl<T: CoordinateTranslator + ?Sized> CoordinateTranslator for &T {
    fn translate_id(&self, reference_id: &str) -> MappingResult<String> {
        (**self).translate_id(reference_id)
    }

    fn translate_position(&self, reference_id: &str, position: u64, bias: Bias) -> Option<u64> {
        (**self).translate_position(reference_id, position, bias)
    }
}

impl<T: CoordinateTranslator + ?Sized + Send> CoordinateTranslator for Box<T> {
    fn translate_id(&self, reference_id: &str) -> MappingResult<String> {
        (**self).translate_id(reference_id)
    }

    fn translate_position(&self, reference_id: &str, position: u64, bias: Bias) -> Option<u64> {
        (**self).translate_position(reference_id, position, bias)
    }
}

/// Translator mapping every sequence and base onto itself
///
/// With a domain attached, only listed sequences translate and only
/// positions `1..=length` map.
#[derive(Debug, Clone, Default)]
pub struct IdentityTranslator {
    domain: Option<SequenceLengths>,
}

impl IdentityTranslator {
    /// Unrestricted identity
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity restricted to the given sequences and lengths
    pub fn with_domain(domain: SequenceLengths) -> Self {
        Self {
            domain: Some(domain),
        }
    }
}

impl CoordinateTranslator for IdentityTranslator {
    fn translate_id(&self, reference_id: &str) -> MappingResult<String> {
        match &self.domain {
            Some(domain) if !domain.contains(reference_id) => {
                Err(MappingError::UnknownSequence(reference_id.to_string()))
            }
            _ => Ok(reference_id.to_string()),
        }
    }

    fn translate_position(&self, reference_id: &str, position: u64, _bias: Bias) -> Option<u64> {
        if position == 0 {
            return None;
        }
        match &self.domain {
            Some(domain) => {
                let length = domain.get(reference_id)?;
                (position <= length).then_some(position)
            }
            None => Some(position),
        }
    }
}
