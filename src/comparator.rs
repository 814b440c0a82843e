//! The single entry point used by front-ends.
//!
//! [`Comparator::compare`] runs validation, scoring, alignment and reporting
//! in that order and stops at the first failure. The failing stage is kept
//! alongside the untouched underlying error in [`CompareError`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use thiserror::Error;

use crate::align::align_with_limit;
use crate::config::EngineConfig;
use crate::report::{summarize, ComparisonReport};
use crate::scoring::{MatrixRegistry, ScoringPolicy};
use crate::sequence::Sequence;
use crate::traceback::Alignment;
use crate::{ComparatorError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validation,
    Scoring,
    Alignment,
    /// Never produced: building a report cannot fail.
    Reporting,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::Scoring => "scoring",
            Stage::Alignment => "alignment",
            Stage::Reporting => "reporting",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which raw input a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    A,
    B,
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::A => f.write_str("sequence A"),
            Input::B => f.write_str("sequence B"),
        }
    }
}

fn for_input(input: &Option<Input>) -> String {
    input.map(|i| format!(" for {i}")).unwrap_or_default()
}

/// A failed comparison: the stage that failed and its error, unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{stage} failed{}: {source}", for_input(.input))]
pub struct CompareError {
    pub stage: Stage,
    pub input: Option<Input>,
    pub source: ComparatorError,
}

impl CompareError {
    pub fn new(stage: Stage, source: ComparatorError) -> Self {
        Self {
            stage,
            input: None,
            source,
        }
    }

    fn validation(input: Input, source: ComparatorError) -> Self {
        Self {
            stage: Stage::Validation,
            input: Some(input),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    pub fn position(&self) -> Option<usize> {
        self.source.position()
    }
}

/// Per-call scoring options, in the textual form a form or CLI supplies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareOptions {
    pub matrix: String,
    pub gap_open: i32,
    pub gap_extend: i32,
    pub mode: String,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            matrix: "blosum62".to_string(),
            gap_open: -11,
            gap_extend: -1,
            mode: "global".to_string(),
        }
    }
}

impl CompareOptions {
    pub fn new(matrix: &str, gap_open: i32, gap_extend: i32, mode: &str) -> Self {
        Self {
            matrix: matrix.to_string(),
            gap_open,
            gap_extend,
            mode: mode.to_string(),
        }
    }
}

/// Runs comparisons against an explicit configuration and matrix registry.
///
/// Holds no per-call state, so one instance can serve any number of threads.
#[derive(Debug, Clone)]
pub struct Comparator {
    config: EngineConfig,
    registry: Arc<MatrixRegistry>,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Comparator {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, MatrixRegistry::builtin())
    }

    pub fn with_registry(config: EngineConfig, registry: MatrixRegistry) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &MatrixRegistry {
        &self.registry
    }

    /// Builds the scoring policy for `options`; failures are tagged with the
    /// scoring stage.
    pub fn policy(&self, options: &CompareOptions) -> Result<ScoringPolicy, CompareError> {
        ScoringPolicy::build_with(
            &self.registry,
            &options.matrix,
            options.gap_open,
            options.gap_extend,
            &options.mode,
        )
        .map_err(|e| CompareError::new(Stage::Scoring, e))
    }

    pub fn compare(
        &self,
        raw_a: &str,
        raw_b: &str,
        options: &CompareOptions,
    ) -> Result<ComparisonReport, CompareError> {
        self.compare_with_alignment(raw_a, raw_b, options)
            .map(|(_, report)| report)
    }

    /// Like [`Comparator::compare`], also handing back the alignment.
    pub fn compare_with_alignment(
        &self,
        raw_a: &str,
        raw_b: &str,
        options: &CompareOptions,
    ) -> Result<(Alignment, ComparisonReport), CompareError> {
        let (seq_a, seq_b) = validate(raw_a, raw_b)?;
        let policy = self.policy(options)?;
        self.run(&seq_a, &seq_b, &policy)
    }

    /// Scoring, alignment and reporting for sequences parsed by the caller.
    pub fn compare_sequences(
        &self,
        seq_a: &Sequence,
        seq_b: &Sequence,
        options: &CompareOptions,
    ) -> Result<ComparisonReport, CompareError> {
        let policy = self.policy(options)?;
        self.run(seq_a, seq_b, &policy).map(|(_, report)| report)
    }

    /// Alignment and reporting stages for already validated input.
    pub(crate) fn run(
        &self,
        seq_a: &Sequence,
        seq_b: &Sequence,
        policy: &ScoringPolicy,
    ) -> Result<(Alignment, ComparisonReport), CompareError> {
        let started = Instant::now();
        let alignment = align_with_limit(seq_a, seq_b, policy, self.config.max_cells())
            .map_err(|e| CompareError::new(Stage::Alignment, e))?;
        let report = summarize(&alignment);
        debug!(
            "compared {} x {} residues in {:?}: score {}, identity {:.2}%",
            seq_a.len(),
            seq_b.len(),
            started.elapsed(),
            report.score,
            report.percent_identity
        );
        Ok((alignment, report))
    }
}

/// Parses both raw inputs, A first.
pub(crate) fn validate(raw_a: &str, raw_b: &str) -> Result<(Sequence, Sequence), CompareError> {
    let seq_a = Sequence::parse(raw_a).map_err(|e| CompareError::validation(Input::A, e))?;
    let seq_b = Sequence::parse(raw_b).map_err(|e| CompareError::validation(Input::B, e))?;
    Ok((seq_a, seq_b))
}

/// Compares two raw sequences with the default configuration and the
/// built-in matrices.
pub fn compare(
    raw_a: &str,
    raw_b: &str,
    options: &CompareOptions,
) -> Result<ComparisonReport, CompareError> {
    Comparator::default().compare(raw_a, raw_b, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_mode::AlignmentMode;

    fn simple(mode: &str) -> CompareOptions {
        CompareOptions::new("identity", -2, -1, mode)
    }

    #[test]
    fn compare_global_example() {
        let report = compare("MVLS", "MVHS", &simple("global")).unwrap();
        assert_eq!(report.aligned_a, "MVLS");
        assert_eq!(report.aligned_b, "MVHS");
        assert_eq!(report.score, 2);
        assert_eq!(report.percent_identity, 75.0);
    }

    #[test]
    fn compare_local_example() {
        let report = compare("AAAA", "AA", &simple("local")).unwrap();
        assert_eq!(report.mode, AlignmentMode::Local);
        assert_eq!(report.aligned_a, "AA");
        assert_eq!(report.aligned_b, "AA");
        assert_eq!(report.score, 2);
        assert_eq!(report.percent_identity, 100.0);
    }

    #[test]
    fn validation_errors_name_input_and_position() {
        let err = compare("MVLS", "MV9S", &simple("global")).unwrap_err();
        assert_eq!(err.stage, Stage::Validation);
        assert_eq!(err.input, Some(Input::B));
        assert_eq!(err.kind(), ErrorKind::InvalidSequence);
        assert_eq!(err.position(), Some(3));
        assert_eq!(
            err.to_string(),
            "validation failed for sequence B: invalid residue '9' at position 3"
        );
    }

    #[test]
    fn validation_runs_before_scoring() {
        let err = compare("", "MV", &CompareOptions::new("nope", -2, -1, "global")).unwrap_err();
        assert_eq!(err.stage, Stage::Validation);
        assert_eq!(err.source, ComparatorError::EmptySequence);
    }

    #[test]
    fn scoring_errors_are_tagged() {
        let err = compare("MV", "MV", &CompareOptions::new("nope", -2, -1, "global")).unwrap_err();
        assert_eq!(err.stage, Stage::Scoring);
        assert_eq!(err.kind(), ErrorKind::UnknownMatrix);

        let options = CompareOptions::new("identity", -2, -1, "diagonal");
        let err = compare("MV", "MV", &options).unwrap_err();
        assert_eq!(err.stage, Stage::Scoring);
        assert_eq!(err.kind(), ErrorKind::InvalidMode);
        assert_eq!(err.input, None);
    }

    #[test]
    fn alignment_guard_is_tagged() {
        let config = EngineConfig::new().with_max_cells(10).unwrap();
        let comparator = Comparator::new(config);
        let err = comparator.compare("MVLSA", "MVLSA", &simple("global")).unwrap_err();
        assert_eq!(err.stage, Stage::Alignment);
        assert_eq!(err.kind(), ErrorKind::AlignmentTooLarge);
        assert!(matches!(
            err.source,
            ComparatorError::AlignmentTooLarge { cells: 25, limit: 10 }
        ));
    }

    #[test]
    fn compare_with_alignment_returns_both() {
        let comparator = Comparator::default();
        let (alignment, report) = comparator
            .compare_with_alignment("mkvlaw", "MKAW", &simple("global"))
            .unwrap();
        assert_eq!(alignment.score(), report.score);
        assert_eq!(alignment.aligned_a(), "MKVLAW");
        assert_eq!(report.deletions, 2);
    }

    #[test]
    fn empty_local_alignment_still_reports() {
        let report = compare("WWW", "CCC", &simple("local")).unwrap();
        assert_eq!(report.length, 0);
        assert_eq!(report.score, 0);
        assert_eq!(Stage::Reporting.to_string(), "reporting");
    }

    #[test]
    fn parsed_sequences_match_raw_comparison() {
        let comparator = Comparator::default();
        let (seq_a, seq_b) = validate("mvls", "MV HS").unwrap();
        let report = comparator.compare_sequences(&seq_a, &seq_b, &simple("global")).unwrap();
        assert_eq!(report, comparator.compare("MVLS", "MVHS", &simple("global")).unwrap());

        let options = CompareOptions::new("identity", -2, -1, "sideways");
        let err = comparator.compare_sequences(&seq_a, &seq_b, &options).unwrap_err();
        assert_eq!(err.stage, Stage::Scoring);
    }

    #[test]
    fn default_options_use_blosum62() {
        let report = compare("HEAGAWGHEE", "PAWHEAE", &CompareOptions::default()).unwrap();
        assert_eq!(report.mode, AlignmentMode::Global);
        assert_eq!(report.aligned_a.len(), report.aligned_b.len());
    }
}
