//! Similarity/difference report derived from an [`Alignment`].
//!
//! Everything here is a pure function of the alignment; building a report
//! never fails. Positions are 0-based alignment columns and runs are
//! half-open ranges, with consecutive columns of the same kind merged.

use std::fmt;
use std::ops::Range;

use crate::alignment_mode::AlignmentMode;
use crate::sequence::GAP;
use crate::traceback::{Alignment, TracebackOperation};

/// Columns per block in the textual diff.
pub const DIFF_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapKind {
    /// Residues present in B only.
    Insertion,
    /// Residues present in A only.
    Deletion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapRun {
    pub kind: GapKind,
    pub columns: Range<usize>,
}

impl GapRun {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub mode: AlignmentMode,
    pub score: i32,
    /// Aligned columns.
    pub length: usize,
    pub identities: usize,
    /// Identical plus positively scored substitutions.
    pub similarities: usize,
    /// Columns pairing two different residues.
    pub mismatches: usize,
    pub insertions: usize,
    pub deletions: usize,
    pub percent_identity: f64,
    pub percent_similarity: f64,
    pub percent_gaps: f64,
    pub mismatch_runs: Vec<Range<usize>>,
    pub gap_runs: Vec<GapRun>,
    /// Run-length encoded columns using `=`, `X`, `I` and `D`.
    pub cigar: String,
    pub range_a: Range<usize>,
    pub range_b: Range<usize>,
    pub aligned_a: String,
    pub aligned_b: String,
    /// `|` identical, `:` similar, `.` mismatch, space for gaps.
    pub midline: String,
}

impl ComparisonReport {
    pub fn gap_columns(&self) -> usize {
        self.insertions + self.deletions
    }

    pub fn insertion_runs(&self) -> impl Iterator<Item = &Range<usize>> {
        self.gap_runs
            .iter()
            .filter(|run| run.kind == GapKind::Insertion)
            .map(|run| &run.columns)
    }

    pub fn deletion_runs(&self) -> impl Iterator<Item = &Range<usize>> {
        self.gap_runs
            .iter()
            .filter(|run| run.kind == GapKind::Deletion)
            .map(|run| &run.columns)
    }

    /// Blocked three-line rendering of the alignment, `width` columns per
    /// block. Row labels carry the 1-based residue number of each line's
    /// first residue.
    pub fn diff(&self, width: usize) -> String {
        let width = width.max(1);
        let a: Vec<char> = self.aligned_a.chars().collect();
        let b: Vec<char> = self.aligned_b.chars().collect();
        let mid: Vec<char> = self.midline.chars().collect();

        let mut out = String::new();
        let (mut pos_a, mut pos_b) = (self.range_a.start, self.range_b.start);
        let mut start = 0;
        while start < a.len() {
            let end = (start + width).min(a.len());
            let block_a: String = a[start..end].iter().collect();
            let block_b: String = b[start..end].iter().collect();
            let block_mid: String = mid[start..end].iter().collect();

            out.push_str(&format!("A {:>6} {}\n", pos_a + 1, block_a));
            out.push_str(&format!("  {:>6} {}\n", "", block_mid));
            out.push_str(&format!("B {:>6} {}\n", pos_b + 1, block_b));

            pos_a += block_a.chars().filter(|&c| c != GAP as char).count();
            pos_b += block_b.chars().filter(|&c| c != GAP as char).count();
            start = end;
            if start < a.len() {
                out.push('\n');
            }
        }
        out
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode:       {}", self.mode)?;
        writeln!(f, "Score:      {}", self.score)?;
        writeln!(f, "Length:     {}", self.length)?;
        writeln!(
            f,
            "Identity:   {}/{} ({:.2}%)",
            self.identities, self.length, self.percent_identity
        )?;
        writeln!(
            f,
            "Similarity: {}/{} ({:.2}%)",
            self.similarities, self.length, self.percent_similarity
        )?;
        writeln!(
            f,
            "Gaps:       {}/{} ({:.2}%)",
            self.gap_columns(),
            self.length,
            self.percent_gaps
        )?;
        writeln!(f, "CIGAR:      {}", self.cigar)?;
        if self.mode == AlignmentMode::Local {
            writeln!(
                f,
                "Region:     A {}..{}, B {}..{}",
                self.range_a.start, self.range_a.end, self.range_b.start, self.range_b.end
            )?;
        }
        writeln!(f)?;
        f.write_str(&self.diff(DIFF_WIDTH))
    }
}

/// Derives the report for `alignment`.
pub fn summarize(alignment: &Alignment) -> ComparisonReport {
    let ops = alignment.operations();
    let count = |wanted: &[TracebackOperation]| {
        ops.iter().filter(|op| wanted.contains(*op)).count()
    };

    let identities = count(&[TracebackOperation::Match]);
    let similar = count(&[TracebackOperation::Similar]);
    let mismatches = similar + count(&[TracebackOperation::Mismatch]);
    let insertions = count(&[TracebackOperation::Insertion]);
    let deletions = count(&[TracebackOperation::Deletion]);
    let length = ops.len();

    let mut gap_runs: Vec<GapRun> = runs(ops, |op| *op == TracebackOperation::Insertion)
        .into_iter()
        .map(|columns| GapRun {
            kind: GapKind::Insertion,
            columns,
        })
        .chain(
            runs(ops, |op| *op == TracebackOperation::Deletion)
                .into_iter()
                .map(|columns| GapRun {
                    kind: GapKind::Deletion,
                    columns,
                }),
        )
        .collect();
    gap_runs.sort_by_key(|run| run.columns.start);

    ComparisonReport {
        mode: alignment.mode(),
        score: alignment.score(),
        length,
        identities,
        similarities: identities + similar,
        mismatches,
        insertions,
        deletions,
        percent_identity: percent(identities, length),
        percent_similarity: percent(identities + similar, length),
        percent_gaps: percent(insertions + deletions, length),
        mismatch_runs: runs(ops, TracebackOperation::is_substitution),
        gap_runs,
        cigar: cigar(ops),
        range_a: alignment.range_a(),
        range_b: alignment.range_b(),
        aligned_a: alignment.aligned_a().to_string(),
        aligned_b: alignment.aligned_b().to_string(),
        midline: ops.iter().map(|op| midline_char(*op)).collect(),
    }
}

/// `part / whole` as a percentage rounded to two decimals; 0 when empty.
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let raw = part as f64 * 100.0 / whole as f64;
    (raw * 100.0).round() / 100.0
}

fn runs<F>(ops: &[TracebackOperation], pred: F) -> Vec<Range<usize>>
where
    F: Fn(&TracebackOperation) -> bool,
{
    let mut out: Vec<Range<usize>> = Vec::new();
    for (idx, op) in ops.iter().enumerate() {
        if !pred(op) {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.end == idx => last.end = idx + 1,
            _ => out.push(idx..idx + 1),
        }
    }
    out
}

fn cigar_symbol(op: TracebackOperation) -> char {
    match op {
        TracebackOperation::Match => '=',
        TracebackOperation::Similar | TracebackOperation::Mismatch => 'X',
        TracebackOperation::Insertion => 'I',
        TracebackOperation::Deletion => 'D',
    }
}

fn cigar(ops: &[TracebackOperation]) -> String {
    let mut encoded: Vec<(char, usize)> = Vec::new();
    for &op in ops {
        let symbol = cigar_symbol(op);
        match encoded.last_mut() {
            Some(last) if last.0 == symbol => last.1 += 1,
            _ => encoded.push((symbol, 1)),
        }
    }
    encoded
        .into_iter()
        .map(|(symbol, len)| format!("{len}{symbol}"))
        .collect()
}

fn midline_char(op: TracebackOperation) -> char {
    match op {
        TracebackOperation::Match => '|',
        TracebackOperation::Similar => ':',
        TracebackOperation::Mismatch => '.',
        TracebackOperation::Insertion | TracebackOperation::Deletion => ' ',
    }
}
