//! Substitution matrices and the scoring policy handed to the aligner.
//!
//! A [`ScoringPolicy`] bundles a [`SubstitutionMatrix`], the affine gap
//! penalties and the [`AlignmentMode`]. Policies are immutable and cheap to
//! share across threads; matrices live behind an `Arc` so one table can back
//! any number of policies.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::alignment_mode::AlignmentMode;
use crate::matrices::{AA_DIM, AA_ORDER, BLOSUM45, BLOSUM62, BLOSUM80, PAM250};
use crate::{ComparatorError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Table {
    /// Compares canonical residue letters directly.
    Simple { match_score: i32, mismatch: i32 },
    /// Flattened `AA_DIM x AA_DIM` lookup in `AA_ORDER`.
    Lookup(Arc<[i32]>),
}

/// A symmetric residue-pair score table, total over the sequence alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionMatrix {
    name: String,
    table: Table,
    max_abs: i32,
}

impl SubstitutionMatrix {
    /// `+1` for identical residues, `-1` otherwise.
    pub fn identity() -> Self {
        Self::simple("identity", 1, -1)
    }

    pub fn blosum62() -> Self {
        Self::lookup("blosum62", &BLOSUM62)
    }

    pub fn blosum45() -> Self {
        Self::lookup("blosum45", &BLOSUM45)
    }

    pub fn blosum80() -> Self {
        Self::lookup("blosum80", &BLOSUM80)
    }

    pub fn pam250() -> Self {
        Self::lookup("pam250", &PAM250)
    }

    pub fn simple(name: &str, match_score: i32, mismatch: i32) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            table: Table::Simple { match_score, mismatch },
            max_abs: match_score.abs().max(mismatch.abs()),
        }
    }

    /// Builds a matrix from a flattened 24x24 table in
    /// `A R N D C Q E G H I L K M F P S T W Y V B Z X *` order.
    pub fn from_table(name: &str, scores: Vec<i32>) -> Result<Self> {
        if scores.len() != AA_DIM * AA_DIM {
            return Err(ComparatorError::InvalidConfig(format!(
                "matrix '{}' has {} entries, expected {}",
                name,
                scores.len(),
                AA_DIM * AA_DIM
            )));
        }
        for i in 0..AA_DIM {
            for j in (i + 1)..AA_DIM {
                if scores[i * AA_DIM + j] != scores[j * AA_DIM + i] {
                    return Err(ComparatorError::InvalidConfig(format!(
                        "matrix '{}' is not symmetric at ({}, {})",
                        name, AA_ORDER[i] as char, AA_ORDER[j] as char
                    )));
                }
            }
        }
        Ok(Self::lookup(name, &scores))
    }

    fn lookup(name: &str, scores: &[i32]) -> Self {
        let max_abs = scores.iter().map(|s| s.abs()).max().unwrap_or(0);
        Self {
            name: name.to_ascii_lowercase(),
            table: Table::Lookup(Arc::from(scores)),
            max_abs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Largest absolute value any residue pair can score.
    pub fn max_abs_score(&self) -> i32 {
        self.max_abs
    }

    /// Score for aligning residue `a` against residue `b`. Case-insensitive.
    pub fn score(&self, a: u8, b: u8) -> i32 {
        match &self.table {
            Table::Simple { match_score, mismatch } => {
                if a.eq_ignore_ascii_case(&b) {
                    *match_score
                } else {
                    *mismatch
                }
            }
            Table::Lookup(scores) => scores[aa_index(a) * AA_DIM + aa_index(b)],
        }
    }
}

impl fmt::Display for SubstitutionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Row of `X` in the lookup tables.
const X_INDEX: usize = 22;

/// Lookup-table row for every byte, either case.
///
/// `J`, `U` and `O` have no row of their own and borrow the closest code
/// (`X`, `C` and `K`). Anything unrecognised scores as `X`.
const AA_ROWS: [u8; 256] = residue_rows();

const fn residue_rows() -> [u8; 256] {
    let mut rows = [X_INDEX as u8; 256];
    let mut i = 0;
    while i < AA_DIM {
        let code = AA_ORDER[i];
        rows[code as usize] = i as u8;
        rows[code.to_ascii_lowercase() as usize] = i as u8;
        i += 1;
    }
    let aliases = [(b'J', b'X'), (b'U', b'C'), (b'O', b'K')];
    let mut k = 0;
    while k < aliases.len() {
        let (alias, code) = aliases[k];
        rows[alias as usize] = rows[code as usize];
        rows[alias.to_ascii_lowercase() as usize] = rows[code as usize];
        k += 1;
    }
    rows
}

fn aa_index(code: u8) -> usize {
    AA_ROWS[code as usize] as usize
}

/// Named substitution matrices available to a comparator.
///
/// The registry is an ordinary value: build one, optionally register custom
/// matrices, and pass it to [`crate::Comparator`]. Lookups are
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct MatrixRegistry {
    matrices: HashMap<String, Arc<SubstitutionMatrix>>,
}

impl MatrixRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// identity, blosum62, blosum45, blosum80 and pam250.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for matrix in [
            SubstitutionMatrix::identity(),
            SubstitutionMatrix::blosum62(),
            SubstitutionMatrix::blosum45(),
            SubstitutionMatrix::blosum80(),
            SubstitutionMatrix::pam250(),
        ] {
            registry.register(matrix);
        }
        registry
    }

    /// Adds or replaces a matrix under its own name.
    pub fn register(&mut self, matrix: SubstitutionMatrix) -> Arc<SubstitutionMatrix> {
        let matrix = Arc::new(matrix);
        self.matrices.insert(matrix.name().to_string(), Arc::clone(&matrix));
        matrix
    }

    pub fn get(&self, name: &str) -> Result<Arc<SubstitutionMatrix>> {
        self.matrices
            .get(&name.trim().to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| ComparatorError::UnknownMatrix(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.matrices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Substitution matrix, affine gap penalties and alignment mode.
///
/// Both penalties are non-positive. The first gapped column costs
/// `gap_open`, each further column of the same gap costs `gap_extend`;
/// `gap_extend == 0` gives a linear gap model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringPolicy {
    matrix: Arc<SubstitutionMatrix>,
    gap_open: i32,
    gap_extend: i32,
    mode: AlignmentMode,
}

impl ScoringPolicy {
    pub fn new(
        matrix: Arc<SubstitutionMatrix>,
        gap_open: i32,
        gap_extend: i32,
        mode: AlignmentMode,
    ) -> Result<Self> {
        if gap_open > 0 {
            return Err(ComparatorError::InvalidGapPenalty {
                name: "gap open",
                value: gap_open,
            });
        }
        if gap_extend > 0 {
            return Err(ComparatorError::InvalidGapPenalty {
                name: "gap extend",
                value: gap_extend,
            });
        }
        Ok(Self {
            matrix,
            gap_open,
            gap_extend,
            mode,
        })
    }

    /// Builds a policy from textual options against the built-in matrices.
    pub fn build(matrix_name: &str, gap_open: i32, gap_extend: i32, mode: &str) -> Result<Self> {
        Self::build_with(&MatrixRegistry::builtin(), matrix_name, gap_open, gap_extend, mode)
    }

    /// Same as [`ScoringPolicy::build`] with an explicit registry.
    pub fn build_with(
        registry: &MatrixRegistry,
        matrix_name: &str,
        gap_open: i32,
        gap_extend: i32,
        mode: &str,
    ) -> Result<Self> {
        let matrix = registry.get(matrix_name)?;
        let mode = mode.parse::<AlignmentMode>()?;
        Self::new(matrix, gap_open, gap_extend, mode)
    }

    pub fn score(&self, a: u8, b: u8) -> i32 {
        self.matrix.score(a, b)
    }

    pub fn gap_open(&self) -> i32 {
        self.gap_open
    }

    pub fn gap_extend(&self) -> i32 {
        self.gap_extend
    }

    pub fn mode(&self) -> AlignmentMode {
        self.mode
    }

    pub fn matrix(&self) -> &SubstitutionMatrix {
        &self.matrix
    }

    /// Largest absolute contribution a single alignment column can make.
    pub fn max_step(&self) -> i32 {
        self.matrix
            .max_abs_score()
            .max(self.gap_open.saturating_abs())
            .max(self.gap_extend.saturating_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::ALPHABET;

    fn all_tables() -> Vec<SubstitutionMatrix> {
        vec![
            SubstitutionMatrix::blosum62(),
            SubstitutionMatrix::blosum45(),
            SubstitutionMatrix::blosum80(),
            SubstitutionMatrix::pam250(),
        ]
    }

    #[test]
    fn builtin_tables_are_symmetric_over_alphabet() {
        for matrix in all_tables() {
            for &a in ALPHABET {
                for &b in ALPHABET {
                    let (x, y) = (a as char, b as char);
                    assert_eq!(matrix.score(a, b), matrix.score(b, a), "{} {}{}", matrix, x, y);
                }
            }
        }
    }

    #[test]
    fn blosum62_known_values() {
        let m = SubstitutionMatrix::blosum62();
        assert_eq!(m.score(b'W', b'W'), 11);
        assert_eq!(m.score(b'A', b'A'), 4);
        assert_eq!(m.score(b'L', b'I'), 2);
        assert_eq!(m.score(b'l', b'i'), 2);
        assert_eq!(m.score(b'*', b'A'), -4);
        assert_eq!(m.max_abs_score(), 11);
    }

    #[test]
    fn rare_residues_borrow_neighbours() {
        let m = SubstitutionMatrix::blosum62();
        assert_eq!(m.score(b'U', b'U'), m.score(b'C', b'C'));
        assert_eq!(m.score(b'O', b'R'), m.score(b'K', b'R'));
        assert_eq!(m.score(b'J', b'A'), m.score(b'X', b'A'));
    }

    #[test]
    fn residue_rows_follow_table_order() {
        for (row, &code) in AA_ORDER.iter().enumerate() {
            assert_eq!(aa_index(code), row);
            assert_eq!(aa_index(code.to_ascii_lowercase()), row);
        }
        assert_eq!(AA_ORDER[X_INDEX], b'X');
        assert_eq!(aa_index(b'j'), X_INDEX);
        assert_eq!(aa_index(b'U'), aa_index(b'C'));
        assert_eq!(aa_index(b'o'), aa_index(b'K'));
        assert_eq!(aa_index(b'#'), X_INDEX);
        assert_eq!(aa_index(0xFF), X_INDEX);
    }

    #[test]
    fn identity_matrix_scores() {
        let m = SubstitutionMatrix::identity();
        assert_eq!(m.score(b'M', b'M'), 1);
        assert_eq!(m.score(b'M', b'm'), 1);
        assert_eq!(m.score(b'L', b'H'), -1);
        assert_eq!(m.score(b'J', b'X'), -1);
    }

    #[test]
    fn from_table_validates_shape_and_symmetry() {
        assert!(matches!(
            SubstitutionMatrix::from_table("short", vec![0; 10]),
            Err(ComparatorError::InvalidConfig(_))
        ));
        let mut scores = vec![0; AA_DIM * AA_DIM];
        scores[1] = 3;
        assert!(matches!(
            SubstitutionMatrix::from_table("skewed", scores.clone()),
            Err(ComparatorError::InvalidConfig(_))
        ));
        scores[AA_DIM] = 3;
        let m = SubstitutionMatrix::from_table("Custom", scores).unwrap();
        assert_eq!(m.name(), "custom");
        assert_eq!(m.score(b'A', b'R'), 3);
    }

    #[test]
    fn registry_lookup_is_case_insensitive() {
        let registry = MatrixRegistry::builtin();
        assert_eq!(registry.get("BLOSUM62").unwrap().name(), "blosum62");
        assert_eq!(
            registry.names(),
            vec!["blosum45", "blosum62", "blosum80", "identity", "pam250"]
        );
        assert!(matches!(
            registry.get("blosum100"),
            Err(ComparatorError::UnknownMatrix(ref n)) if n == "blosum100"
        ));
    }

    #[test]
    fn registry_accepts_custom_matrices() {
        let mut registry = MatrixRegistry::builtin();
        registry.register(SubstitutionMatrix::simple("strict", 5, -4));
        let policy = ScoringPolicy::build_with(&registry, "strict", -8, -2, "local").unwrap();
        assert_eq!(policy.score(b'A', b'A'), 5);
        assert_eq!(policy.mode(), AlignmentMode::Local);
    }

    #[test]
    fn build_validates_each_option() {
        assert!(matches!(
            ScoringPolicy::build("nope", -2, -1, "global"),
            Err(ComparatorError::UnknownMatrix(_))
        ));
        assert!(matches!(
            ScoringPolicy::build("identity", 2, -1, "global"),
            Err(ComparatorError::InvalidGapPenalty { name: "gap open", value: 2 })
        ));
        assert!(matches!(
            ScoringPolicy::build("identity", -2, 1, "global"),
            Err(ComparatorError::InvalidGapPenalty { name: "gap extend", value: 1 })
        ));
        assert!(matches!(
            ScoringPolicy::build("identity", -2, -1, "sideways"),
            Err(ComparatorError::InvalidMode(_))
        ));
    }

    #[test]
    fn zero_gap_extend_is_accepted() {
        let policy = ScoringPolicy::build("identity", -3, 0, "global").unwrap();
        assert_eq!(policy.gap_open(), -3);
        assert_eq!(policy.gap_extend(), 0);
        assert_eq!(policy.max_step(), 3);
    }

    #[test]
    fn policy_is_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ScoringPolicy>();
        assert_send_sync::<MatrixRegistry>();
    }
}
