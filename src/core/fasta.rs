//! Sequence-length lookup
//!
//! Builds the id -> length table of an assembly from its FASTA file. The
//! table is filled completely before any annotation is processed and is
//! read-only afterwards.

use crate::core::error::FastaError;
use crate::core::io::open_reader;
use bio::io::fasta;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Sequence lengths of one assembly, in FASTA order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceLengths {
    order: Vec<String>,
    lengths: HashMap<String, u64>,
}

impl SequenceLengths {
    /// Read a (possibly compressed) FASTA file
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self, FastaError> {
        Self::from_reader(open_reader(path)?)
    }

    /// Read FASTA records from any reader
    ///
    /// Sequence ids are the first whitespace-delimited word of each header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FastaError> {
        let mut out = Self::default();
        for record in fasta::Reader::new(reader).records() {
            let record = record?;
            out.insert(record.id(), record.seq().len() as u64)?;
        }
        Ok(out)
    }

    fn insert(&mut self, id: &str, length: u64) -> Result<(), FastaError> {
        if self.lengths.insert(id.to_string(), length).is_some() {
            return Err(FastaError::DuplicateSequence(id.to_string()));
        }
        self.order.push(id.to_string());
        Ok(())
    }

    /// Length of a sequence
    pub fn get(&self, id: &str) -> Option<u64> {
        self.lengths.get(id).copied()
    }

    /// Check if a sequence is present
    pub fn contains(&self, id: &str) -> bool {
        self.lengths.contains_key(id)
    }

    /// Number of sequences
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate over (id, length) in FASTA order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.order.iter().map(|id| (id.as_str(), self.lengths[id]))
    }
}

/// Later duplicates overwrite earlier lengths but keep the first position.
impl FromIterator<(String, u64)> for SequenceLengths {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut out = Self::default();
        for (id, length) in iter {
            if out.lengths.insert(id.clone(), length).is_none() {
                out.order.push(id);
            }
        }
        out
    }
}
