//! Validated amino-acid sequences.
//!
//! A [`Sequence`] holds uppercase residue codes only. The accepted alphabet is
//! the 20 standard amino acids, the ambiguity codes `B`, `Z`, `J` and `X`,
//! the rare residues `U` and `O`, and the terminator `*`. Whitespace in the
//! raw input is skipped so that wrapped text can be pasted directly.

use std::fmt;

use crate::{ComparatorError, Result};

/// Residue codes accepted by [`Sequence::parse`], in canonical order.
pub const ALPHABET: &[u8; 27] = b"ARNDCQEGHILKMFPSTWYVBZJXUO*";

/// Marker used for gaps in aligned output. Never part of a [`Sequence`].
pub const GAP: u8 = b'-';

pub fn is_residue(code: u8) -> bool {
    ALPHABET.contains(&code.to_ascii_uppercase())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    data: Vec<u8>,
}

impl Sequence {
    /// Parses raw text into a sequence.
    ///
    /// Fails with [`ComparatorError::EmptySequence`] when no residues remain
    /// after dropping whitespace, and with [`ComparatorError::InvalidResidue`]
    /// naming the first offending character and its 1-based position in `raw`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut data = Vec::with_capacity(raw.len());

        for (idx, ch) in raw.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            if !ch.is_ascii() || !is_residue(ch as u8) {
                return Err(ComparatorError::InvalidResidue {
                    residue: ch,
                    position: idx + 1,
                });
            }
            data.push((ch as u8).to_ascii_uppercase());
        }

        if data.is_empty() {
            return Err(ComparatorError::EmptySequence);
        }

        Ok(Self { data })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Residue counts in [`ALPHABET`] order, skipping absent residues.
    pub fn composition(&self) -> Vec<(char, usize)> {
        let mut counts = [0usize; ALPHABET.len()];
        for &code in &self.data {
            if let Some(idx) = ALPHABET.iter().position(|&a| a == code) {
                counts[idx] += 1;
            }
        }
        ALPHABET
            .iter()
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            .map(|(&code, count)| (code as char, count))
            .collect()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Residues are ASCII by construction
        f.write_str(&String::from_utf8_lossy(&self.data))
    }
}

impl std::str::FromStr for Sequence {
    type Err = ComparatorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let seq = Sequence::parse("  mv ls\nKA\t").unwrap();
        assert_eq!(seq.as_bytes(), b"MVLSKA");
        assert_eq!(seq.len(), 6);
        assert_eq!(seq.to_string(), "MVLSKA");
    }

    #[test]
    fn accepts_ambiguity_and_stop_codes() {
        let seq = Sequence::parse("BZJXUO*").unwrap();
        assert_eq!(seq.len(), 7);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(Sequence::parse(""), Err(ComparatorError::EmptySequence)));
        assert!(matches!(Sequence::parse(" \n\t "), Err(ComparatorError::EmptySequence)));
    }

    #[test]
    fn reports_position_in_raw_input() {
        // Whitespace still counts towards the reported position
        match Sequence::parse("MV L1S") {
            Err(ComparatorError::InvalidResidue { residue, position }) => {
                assert_eq!(residue, '1');
                assert_eq!(position, 5);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_gap_marker_and_non_ascii() {
        assert!(matches!(
            Sequence::parse("MV-LS"),
            Err(ComparatorError::InvalidResidue { residue: '-', position: 3 })
        ));
        assert!(matches!(
            Sequence::parse("Mé"),
            Err(ComparatorError::InvalidResidue { residue: 'é', position: 2 })
        ));
    }

    #[test]
    fn composition_counts_residues() {
        let seq = Sequence::parse("AAWKA").unwrap();
        assert_eq!(seq.composition(), vec![('A', 3), ('K', 1), ('W', 1)]);
    }
}
