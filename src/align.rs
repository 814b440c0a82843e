//! Affine-gap dynamic programming aligner.
//!
//! Global mode is Needleman-Wunsch and local mode is Smith-Waterman, both
//! over three matrices (Gotoh):
//!
//! ```text
//! M(i,j)  = s(A[i], B[j]) + max(M(i-1,j-1), GA(i-1,j-1), GB(i-1,j-1))
//! GA(i,j) = max(M(i-1,j) + open, GA(i-1,j) + extend)
//! GB(i,j) = max(M(i,j-1) + open, GB(i,j-1) + extend)
//! ```
//!
//! Scores are kept for two rows at a time; the full `(n+1) x (m+1)` grid only
//! stores one packed predecessor byte per cell. Ties always resolve in the
//! order match, gap-in-A, gap-in-B, so identical input gives identical output.

use log::{debug, trace, warn};

use crate::alignment_mode::AlignmentMode;
use crate::scoring::ScoringPolicy;
use crate::sequence::Sequence;
use crate::traceback::{Alignment, CellState, Terminal, Traceback, TracebackMatrix};
use crate::{ComparatorError, Result};

/// Default ceiling on `n * m`, the product of the two sequence lengths.
pub const DEFAULT_MAX_CELLS: usize = 25_000_000;

/// Largest score magnitude an alignment may reach.
pub const SCORE_LIMIT: i64 = (i32::MAX / 4) as i64;

// Far below any reachable score, and far enough above i32::MIN that adding a
// bounded penalty cannot wrap.
const NEG_INF: i32 = i32::MIN / 2;

/// Aligns `seq_a` against `seq_b` with the default cell ceiling.
pub fn align(seq_a: &Sequence, seq_b: &Sequence, policy: &ScoringPolicy) -> Result<Alignment> {
    align_with_limit(seq_a, seq_b, policy, DEFAULT_MAX_CELLS)
}

/// Aligns `seq_a` against `seq_b`, refusing jobs above `max_cells`.
///
/// The guard runs before anything is allocated. Either a complete optimal
/// alignment is returned or an error; nothing partial.
pub fn align_with_limit(
    seq_a: &Sequence,
    seq_b: &Sequence,
    policy: &ScoringPolicy,
    max_cells: usize,
) -> Result<Alignment> {
    let (a, b) = (seq_a.as_bytes(), seq_b.as_bytes());
    check_dimensions(a.len(), b.len(), policy, max_cells)?;

    let matrix = AlignmentMatrix::fill(a, b, policy);
    trace!(
        "filled {}x{} {} matrix, terminal {:?}",
        matrix.trace.rows(),
        matrix.trace.cols(),
        policy.mode(),
        matrix.terminal
    );

    let alignment =
        Traceback::new(&matrix.trace, a, b, policy).reconstruct_alignment(matrix.terminal);
    debug!(
        "aligned {} x {} residues ({}, {}): score {}, {} columns",
        a.len(),
        b.len(),
        policy.mode(),
        policy.matrix(),
        alignment.score(),
        alignment.len()
    );
    Ok(alignment)
}

fn check_dimensions(n: usize, m: usize, policy: &ScoringPolicy, max_cells: usize) -> Result<()> {
    let cells = n as u128 * m as u128;
    if cells > max_cells as u128 {
        warn!("refusing {} x {} alignment: {} cells over limit {}", n, m, cells, max_cells);
        return Err(ComparatorError::AlignmentTooLarge {
            cells,
            limit: max_cells,
        });
    }

    // Every column moves the score by at most `max_step`
    let bound = (n as i64 + m as i64) * i64::from(policy.max_step().max(1));
    if bound > SCORE_LIMIT {
        warn!("refusing {} x {} alignment: score bound {} overflows", n, m, bound);
        return Err(ComparatorError::ScoreOverflow {
            bound,
            limit: SCORE_LIMIT,
        });
    }
    Ok(())
}

/// Highest of the three candidates, preferring earlier states on ties.
fn best_of(m: i32, ga: i32, gb: i32) -> (i32, CellState) {
    let mut best = (m, CellState::Match);
    if ga > best.0 {
        best = (ga, CellState::GapA);
    }
    if gb > best.0 {
        best = (gb, CellState::GapB);
    }
    best
}

/// Three score rows for one DP row.
#[derive(Clone)]
struct Row {
    m: Vec<i32>,
    ga: Vec<i32>,
    gb: Vec<i32>,
}

impl Row {
    fn filled(cols: usize, value: i32) -> Self {
        Self {
            m: vec![value; cols],
            ga: vec![value; cols],
            gb: vec![value; cols],
        }
    }
}

/// DP state for one alignment run: predecessor tags plus the terminal cell.
struct AlignmentMatrix {
    trace: TracebackMatrix,
    terminal: Terminal,
}

impl AlignmentMatrix {
    fn fill(a: &[u8], b: &[u8], policy: &ScoringPolicy) -> Self {
        match policy.mode() {
            AlignmentMode::Global => Self::fill_global(a, b, policy),
            AlignmentMode::Local => Self::fill_local(a, b, policy),
        }
    }

    fn fill_global(a: &[u8], b: &[u8], policy: &ScoringPolicy) -> Self {
        let (rows, cols) = (a.len() + 1, b.len() + 1);
        let (open, extend) = (policy.gap_open(), policy.gap_extend());
        let mut trace = TracebackMatrix::new(rows, cols);

        // Row 0: only gap-in-B is reachable
        let mut prev = Row::filled(cols, NEG_INF);
        prev.m[0] = 0;
        for j in 1..cols {
            prev.gb[j] = if j == 1 { open } else { prev.gb[j - 1] + extend };
            let tag = TracebackMatrix::pack(CellState::Match, false, j > 1, false);
            trace.set(0, j, tag);
        }

        let mut cur = Row::filled(cols, NEG_INF);
        let mut gap_a_boundary = open;
        for i in 1..rows {
            // Column 0: only gap-in-A is reachable
            cur.m[0] = NEG_INF;
            cur.ga[0] = gap_a_boundary;
            cur.gb[0] = NEG_INF;
            trace.set(i, 0, TracebackMatrix::pack(CellState::Match, i > 1, false, false));
            gap_a_boundary += extend;

            let x = a[i - 1];
            for j in 1..cols {
                let (diag, match_from) = best_of(prev.m[j - 1], prev.ga[j - 1], prev.gb[j - 1]);
                cur.m[j] = diag + policy.score(x, b[j - 1]);

                let (ga_open, ga_extend) = (prev.m[j] + open, prev.ga[j] + extend);
                cur.ga[j] = ga_open.max(ga_extend);

                let (gb_open, gb_extend) = (cur.m[j - 1] + open, cur.gb[j - 1] + extend);
                cur.gb[j] = gb_open.max(gb_extend);

                let tag = TracebackMatrix::pack(
                    match_from,
                    ga_extend > ga_open,
                    gb_extend > gb_open,
                    false,
                );
                trace.set(i, j, tag);
            }
            std::mem::swap(&mut prev, &mut cur);
        }

        let last = cols - 1;
        let (score, state) = best_of(prev.m[last], prev.ga[last], prev.gb[last]);
        Self {
            trace,
            terminal: Terminal {
                state,
                i: rows - 1,
                j: last,
                score,
            },
        }
    }

    fn fill_local(a: &[u8], b: &[u8], policy: &ScoringPolicy) -> Self {
        let (rows, cols) = (a.len() + 1, b.len() + 1);
        let (open, extend) = (policy.gap_open(), policy.gap_extend());
        let mut trace = TracebackMatrix::new(rows, cols);

        // Boundaries and clamped cells are all zero
        let mut prev = Row::filled(cols, 0);
        let mut cur = Row::filled(cols, 0);
        let mut terminal = Terminal {
            state: CellState::Match,
            i: 0,
            j: 0,
            score: 0,
        };

        for i in 1..rows {
            let x = a[i - 1];
            for j in 1..cols {
                let (diag, match_from) = best_of(prev.m[j - 1], prev.ga[j - 1], prev.gb[j - 1]);
                cur.m[j] = (diag + policy.score(x, b[j - 1])).max(0);

                let (ga_open, ga_extend) = (prev.m[j] + open, prev.ga[j] + extend);
                cur.ga[j] = ga_open.max(ga_extend).max(0);

                let (gb_open, gb_extend) = (cur.m[j - 1] + open, cur.gb[j - 1] + extend);
                cur.gb[j] = gb_open.max(gb_extend).max(0);

                // A zero-valued predecessor means the alignment starts here
                let tag = TracebackMatrix::pack(
                    match_from,
                    ga_extend > ga_open,
                    gb_extend > gb_open,
                    diag == 0,
                );
                trace.set(i, j, tag);

                let (value, state) = best_of(cur.m[j], cur.ga[j], cur.gb[j]);
                if value > terminal.score {
                    terminal = Terminal {
                        state,
                        i,
                        j,
                        score: value,
                    };
                }
            }
            std::mem::swap(&mut prev, &mut cur);
        }

        Self { trace, terminal }
    }
}
