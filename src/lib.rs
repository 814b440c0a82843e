//! Protein sequence comparison engine.
//!
//! Raw sequence text goes in, an optimal pairwise alignment and a
//! similarity/difference report come out:
//!
//! ```
//! use protein_comparator::{compare, CompareOptions};
//!
//! let options = CompareOptions::new("identity", -2, -1, "global");
//! let report = compare("MVLS", "MVHS", &options).unwrap();
//! assert_eq!(report.score, 2);
//! assert_eq!(format!("{:.2}", report.percent_identity), "75.00");
//! ```
//!
//! The pipeline is [`Sequence::parse`] → [`ScoringPolicy`] → [`align()`] →
//! [`summarize`], driven by [`Comparator`]. Batches of pairs run on a worker
//! pool via [`Comparator::compare_pairs`].

use std::fmt;

use thiserror::Error;

pub mod align;
pub mod alignment_mode;
pub mod batch;
pub mod comparator;
pub mod config;
mod matrices;
pub mod report;
pub mod scoring;
pub mod sequence;
pub mod traceback;

pub use align::{align, align_with_limit, DEFAULT_MAX_CELLS};
pub use alignment_mode::AlignmentMode;
pub use batch::PairwiseResult;
pub use comparator::{compare, CompareError, CompareOptions, Comparator, Input, Stage};
pub use config::EngineConfig;
pub use report::{summarize, ComparisonReport, GapKind, GapRun};
pub use scoring::{MatrixRegistry, ScoringPolicy, SubstitutionMatrix};
pub use sequence::Sequence;
pub use traceback::{Alignment, CellState, TracebackOperation};

pub type Result<T> = std::result::Result<T, ComparatorError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComparatorError {
    #[error("sequence is empty")]
    EmptySequence,
    #[error("invalid residue '{residue}' at position {position}")]
    InvalidResidue { residue: char, position: usize },
    #[error("unknown substitution matrix: {0}")]
    UnknownMatrix(String),
    #[error("invalid alignment mode: {0} (expected 'global' or 'local')")]
    InvalidMode(String),
    #[error("{name} penalty must not be positive, got {value}")]
    InvalidGapPenalty { name: &'static str, value: i32 },
    #[error("alignment too large: {cells} cells exceeds the limit of {limit}")]
    AlignmentTooLarge { cells: u128, limit: usize },
    #[error("alignment too large: score bound {bound} exceeds {limit}")]
    ScoreOverflow { bound: i64, limit: i64 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Error taxonomy exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidSequence,
    UnknownMatrix,
    InvalidMode,
    InvalidGapPenalty,
    AlignmentTooLarge,
    InvalidConfig,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidSequence => "InvalidSequenceError",
            ErrorKind::UnknownMatrix => "UnknownMatrixError",
            ErrorKind::InvalidMode => "InvalidModeError",
            ErrorKind::InvalidGapPenalty => "InvalidGapPenaltyError",
            ErrorKind::AlignmentTooLarge => "AlignmentTooLargeError",
            ErrorKind::InvalidConfig => "InvalidConfigError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ComparatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ComparatorError::EmptySequence | ComparatorError::InvalidResidue { .. } => {
                ErrorKind::InvalidSequence
            }
            ComparatorError::UnknownMatrix(_) => ErrorKind::UnknownMatrix,
            ComparatorError::InvalidMode(_) => ErrorKind::InvalidMode,
            ComparatorError::InvalidGapPenalty { .. } => ErrorKind::InvalidGapPenalty,
            ComparatorError::AlignmentTooLarge { .. } | ComparatorError::ScoreOverflow { .. } => {
                ErrorKind::AlignmentTooLarge
            }
            ComparatorError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// 1-based character position of the offending input, when there is one.
    pub fn position(&self) -> Option<usize> {
        match self {
            ComparatorError::InvalidResidue { position, .. } => Some(*position),
            _ => None,
        }
    }
}
