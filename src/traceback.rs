use std::ops::Range;

use crate::alignment_mode::AlignmentMode;
use crate::scoring::ScoringPolicy;
use crate::sequence::GAP;

/// Which of the three DP matrices owns a cell.
///
/// `GapA` consumes a residue of A against a gap (vertical move), `GapB` a
/// residue of B against a gap (horizontal move). The declaration order is
/// the tie-break order: match wins over gap-in-A, which wins over gap-in-B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Match = 0,
    GapA = 1,
    GapB = 2,
}

/// One aligned column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracebackOperation {
    /// Identical residues.
    Match,
    /// Different residues with a positive substitution score.
    Similar,
    Mismatch,
    /// Residue present in B only.
    Insertion,
    /// Residue present in A only.
    Deletion,
}

impl TracebackOperation {
    pub fn is_gap(&self) -> bool {
        matches!(self, TracebackOperation::Insertion | TracebackOperation::Deletion)
    }

    pub fn is_substitution(&self) -> bool {
        matches!(self, TracebackOperation::Similar | TracebackOperation::Mismatch)
    }
}

/// Optimal alignment of two sequences.
///
/// `aligned_a` and `aligned_b` have equal length and never both carry a gap
/// in the same column. `range_a`/`range_b` are the half-open 0-based regions
/// of the inputs covered by the alignment; in global mode they span the whole
/// sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    score: i32,
    aligned_a: String,
    aligned_b: String,
    operations: Vec<TracebackOperation>,
    range_a: Range<usize>,
    range_b: Range<usize>,
    mode: AlignmentMode,
}

impl Alignment {
    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn aligned_a(&self) -> &str {
        &self.aligned_a
    }

    pub fn aligned_b(&self) -> &str {
        &self.aligned_b
    }

    pub fn operations(&self) -> &[TracebackOperation] {
        &self.operations
    }

    pub fn range_a(&self) -> Range<usize> {
        self.range_a.clone()
    }

    pub fn range_b(&self) -> Range<usize> {
        self.range_b.clone()
    }

    pub fn mode(&self) -> AlignmentMode {
        self.mode
    }

    /// Number of aligned columns.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Only possible for a local alignment with no positive-scoring pair.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

const MATCH_FROM_MASK: u8 = 0b0000_0011;
const GAP_A_EXTENDS: u8 = 0b0000_0100;
const GAP_B_EXTENDS: u8 = 0b0000_1000;
const LOCAL_START: u8 = 0b0001_0000;

/// Packed predecessor tags, one byte per DP cell, row-major.
///
/// Bits 0-1 hold the state feeding the match cell, bit 2 is set when the
/// gap-in-A cell extends an existing gap, bit 3 likewise for gap-in-B, and
/// bit 4 marks a local alignment starting at this match cell.
pub(crate) struct TracebackMatrix {
    data: Vec<u8>,
    rows: usize,
    cols: usize,
}

impl TracebackMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0; rows * cols],
            rows,
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.data[row * self.cols + col] = value;
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.cols + col]
    }

    pub fn pack(
        match_from: CellState,
        gap_a_extends: bool,
        gap_b_extends: bool,
        local_start: bool,
    ) -> u8 {
        let mut tag = match_from as u8;
        if gap_a_extends {
            tag |= GAP_A_EXTENDS;
        }
        if gap_b_extends {
            tag |= GAP_B_EXTENDS;
        }
        if local_start {
            tag |= LOCAL_START;
        }
        tag
    }

    fn match_from(tag: u8) -> CellState {
        match tag & MATCH_FROM_MASK {
            0 => CellState::Match,
            1 => CellState::GapA,
            _ => CellState::GapB,
        }
    }

    fn gap_a_from(tag: u8) -> CellState {
        if tag & GAP_A_EXTENDS != 0 {
            CellState::GapA
        } else {
            CellState::Match
        }
    }

    fn gap_b_from(tag: u8) -> CellState {
        if tag & GAP_B_EXTENDS != 0 {
            CellState::GapB
        } else {
            CellState::Match
        }
    }

    fn starts_local(tag: u8) -> bool {
        tag & LOCAL_START != 0
    }
}

/// Cell and state where traceback begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Terminal {
    pub state: CellState,
    pub i: usize,
    pub j: usize,
    pub score: i32,
}

pub(crate) struct Traceback<'a> {
    matrix: &'a TracebackMatrix,
    seq_a: &'a [u8],
    seq_b: &'a [u8],
    policy: &'a ScoringPolicy,
}

impl<'a> Traceback<'a> {
    pub fn new(
        matrix: &'a TracebackMatrix,
        seq_a: &'a [u8],
        seq_b: &'a [u8],
        policy: &'a ScoringPolicy,
    ) -> Self {
        Self {
            matrix,
            seq_a,
            seq_b,
            policy,
        }
    }

    /// Walks the tags back from `end`.
    ///
    /// Global walks stop at `(0, 0)`; local walks stop after the match cell
    /// flagged as the start of the alignment. A local terminal with score 0
    /// yields an empty alignment.
    pub fn reconstruct_alignment(&self, end: Terminal) -> Alignment {
        let mode = self.policy.mode();
        let mut aligned_a = Vec::new();
        let mut aligned_b = Vec::new();
        let mut operations = Vec::new();

        let mut state = end.state;
        let (mut i, mut j) = (end.i, end.j);
        let empty = mode == AlignmentMode::Local && end.score == 0;

        while !empty && (i > 0 || j > 0) {
            let tag = self.matrix.get(i, j);
            match state {
                CellState::Match => {
                    let (x, y) = (self.seq_a[i - 1], self.seq_b[j - 1]);
                    aligned_a.push(x);
                    aligned_b.push(y);
                    operations.push(self.classify(x, y));
                    state = TracebackMatrix::match_from(tag);
                    i -= 1;
                    j -= 1;
                    if mode == AlignmentMode::Local && TracebackMatrix::starts_local(tag) {
                        break;
                    }
                }
                CellState::GapA => {
                    aligned_a.push(self.seq_a[i - 1]);
                    aligned_b.push(GAP);
                    operations.push(TracebackOperation::Deletion);
                    state = TracebackMatrix::gap_a_from(tag);
                    i -= 1;
                }
                CellState::GapB => {
                    aligned_a.push(GAP);
                    aligned_b.push(self.seq_b[j - 1]);
                    operations.push(TracebackOperation::Insertion);
                    state = TracebackMatrix::gap_b_from(tag);
                    j -= 1;
                }
            }
        }

        // Built backwards
        aligned_a.reverse();
        aligned_b.reverse();
        operations.reverse();

        let (start_i, start_j) = if empty { (end.i, end.j) } else { (i, j) };

        Alignment {
            score: end.score,
            aligned_a: String::from_utf8_lossy(&aligned_a).into_owned(),
            aligned_b: String::from_utf8_lossy(&aligned_b).into_owned(),
            operations,
            range_a: start_i..end.i,
            range_b: start_j..end.j,
            mode,
        }
    }

    fn classify(&self, x: u8, y: u8) -> TracebackOperation {
        if x == y {
            TracebackOperation::Match
        } else if self.policy.score(x, y) > 0 {
            TracebackOperation::Similar
        } else {
            TracebackOperation::Mismatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_packing() {
        let tag = TracebackMatrix::pack(CellState::GapB, true, false, true);
        assert_eq!(TracebackMatrix::match_from(tag), CellState::GapB);
        assert_eq!(TracebackMatrix::gap_a_from(tag), CellState::GapA);
        assert_eq!(TracebackMatrix::gap_b_from(tag), CellState::Match);
        assert!(TracebackMatrix::starts_local(tag));

        let plain = TracebackMatrix::pack(CellState::Match, false, true, false);
        assert_eq!(TracebackMatrix::match_from(plain), CellState::Match);
        assert_eq!(TracebackMatrix::gap_b_from(plain), CellState::GapB);
        assert!(!TracebackMatrix::starts_local(plain));
    }

    #[test]
    fn matrix_is_row_major() {
        let mut matrix = TracebackMatrix::new(3, 4);
        matrix.set(1, 2, 7);
        assert_eq!(matrix.get(1, 2), 7);
        assert_eq!(matrix.data[6], 7);
        assert_eq!((matrix.rows(), matrix.cols()), (3, 4));
    }

    #[test]
    fn operation_predicates() {
        assert!(TracebackOperation::Insertion.is_gap());
        assert!(TracebackOperation::Deletion.is_gap());
        assert!(!TracebackOperation::Similar.is_gap());
        assert!(TracebackOperation::Similar.is_substitution());
        assert!(!TracebackOperation::Match.is_substitution());
    }
}
