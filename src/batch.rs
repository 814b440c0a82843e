//! Batch comparisons on a pool of worker threads.
//!
//! Pairs are fed through a bounded work queue to `EngineConfig::workers`
//! threads. Each pair is an independent comparison; one failure never aborts
//! the others, and results come back in input order.

use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, trace};

use crate::comparator::{validate, CompareError, CompareOptions, Comparator};
use crate::report::ComparisonReport;
use crate::scoring::ScoringPolicy;

/// Outcome of one pair in [`Comparator::compare_all`]; `first` and `second`
/// index the input slice, with `first < second`.
#[derive(Debug, Clone)]
pub struct PairwiseResult {
    pub first: usize,
    pub second: usize,
    pub result: Result<ComparisonReport, CompareError>,
}

struct WorkItem<'a> {
    index: usize,
    raw_a: &'a str,
    raw_b: &'a str,
}

struct WorkResult {
    index: usize,
    result: Result<ComparisonReport, CompareError>,
}

impl Comparator {
    /// Compares every pair with the same options. The scoring policy is
    /// built once; if that fails, each pair that passes validation reports
    /// the scoring error.
    pub fn compare_pairs<A, B>(
        &self,
        pairs: &[(A, B)],
        options: &CompareOptions,
    ) -> Vec<Result<ComparisonReport, CompareError>>
    where
        A: AsRef<str> + Sync,
        B: AsRef<str> + Sync,
    {
        if pairs.is_empty() {
            return Vec::new();
        }

        let policy = self.policy(options);
        let workers = self.config().workers().min(pairs.len());
        debug!("comparing {} pairs on {} workers", pairs.len(), workers);

        let (work_tx, work_rx) = bounded(workers * 2);
        let (result_tx, result_rx) = unbounded();
        let mut results = Vec::with_capacity(pairs.len());

        thread::scope(|scope| {
            for id in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let policy = &policy;
                scope.spawn(move || self.batch_worker(id, policy, work_rx, result_tx));
            }
            drop(work_rx);
            drop(result_tx);

            for (index, (raw_a, raw_b)) in pairs.iter().enumerate() {
                let item = WorkItem {
                    index,
                    raw_a: raw_a.as_ref(),
                    raw_b: raw_b.as_ref(),
                };
                if work_tx.send(item).is_err() {
                    break;
                }
            }
            drop(work_tx);

            results.extend(result_rx.iter());
        });

        results.sort_by_key(|r: &WorkResult| r.index);
        results.into_iter().map(|r| r.result).collect()
    }

    /// Compares every unordered pair `(i, j)`, `i < j`, of `sequences`.
    pub fn compare_all<S>(&self, sequences: &[S], options: &CompareOptions) -> Vec<PairwiseResult>
    where
        S: AsRef<str> + Sync,
    {
        let n = sequences.len();
        let indices: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();
        let pairs: Vec<(&str, &str)> = indices
            .iter()
            .map(|&(i, j)| (sequences[i].as_ref(), sequences[j].as_ref()))
            .collect();

        self.compare_pairs(&pairs, options)
            .into_iter()
            .zip(indices)
            .map(|(result, (first, second))| PairwiseResult {
                first,
                second,
                result,
            })
            .collect()
    }

    fn batch_worker(
        &self,
        id: usize,
        policy: &Result<ScoringPolicy, CompareError>,
        work_rx: Receiver<WorkItem<'_>>,
        result_tx: Sender<WorkResult>,
    ) {
        let mut done = 0usize;
        while let Ok(work) = work_rx.recv() {
            let result = validate(work.raw_a, work.raw_b).and_then(|(seq_a, seq_b)| {
                let policy = policy.as_ref().map_err(Clone::clone)?;
                self.run(&seq_a, &seq_b, policy).map(|(_, report)| report)
            });
            if result_tx
                .send(WorkResult {
                    index: work.index,
                    result,
                })
                .is_err()
            {
                break;
            }
            done += 1;
        }
        trace!("batch worker {} finished after {} pairs", id, done);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Stage;
    use crate::config::EngineConfig;
    use crate::ErrorKind;

    fn comparator(workers: usize) -> Comparator {
        Comparator::new(EngineConfig::new().with_workers(workers).unwrap())
    }

    fn identity() -> CompareOptions {
        CompareOptions::new("identity", -2, -1, "global")
    }

    #[test]
    fn results_keep_input_order() {
        let pairs: Vec<(String, String)> = (1..=12)
            .map(|n| ("W".repeat(n), "W".repeat(n)))
            .collect();
        let results = comparator(4).compare_pairs(&pairs, &identity());
        assert_eq!(results.len(), 12);
        for (n, result) in (1..=12).zip(&results) {
            assert_eq!(result.as_ref().unwrap().score, n as i32);
        }
    }

    #[test]
    fn failures_stay_with_their_pair() {
        let pairs = [("MVLS", "MVHS"), ("MV1S", "MVHS"), ("MK", "")];
        let results = comparator(2).compare_pairs(&pairs, &identity());
        assert_eq!(results[0].as_ref().unwrap().score, 2);
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.stage, Stage::Validation);
        assert_eq!(err.position(), Some(3));
        assert_eq!(results[2].as_ref().unwrap_err().kind(), ErrorKind::InvalidSequence);
    }

    #[test]
    fn policy_error_reported_per_pair() {
        let pairs = [("MV", "MV"), ("M?", "MV")];
        let options = CompareOptions::new("blosum99", -2, -1, "global");
        let results = comparator(2).compare_pairs(&pairs, &options);
        assert_eq!(results[0].as_ref().unwrap_err().stage, Stage::Scoring);
        assert_eq!(results[1].as_ref().unwrap_err().stage, Stage::Validation);
    }

    #[test]
    fn matches_sequential_comparisons() {
        let pairs = [
            ("HEAGAWGHEE", "PAWHEAE"),
            ("MKVLAW", "MKAW"),
            ("GGMV", "MV"),
        ];
        let options = CompareOptions::default();
        let single = Comparator::default();
        let batched = comparator(3).compare_pairs(&pairs, &options);
        for ((a, b), result) in pairs.iter().zip(batched) {
            assert_eq!(result.unwrap(), single.compare(a, b, &options).unwrap());
        }
    }

    #[test]
    fn compare_all_covers_each_pair_once() {
        let sequences = ["MVLS", "MVHS", "MKAW", "WWWW"];
        let results = comparator(3).compare_all(&sequences, &identity());
        let indices: Vec<(usize, usize)> = results.iter().map(|r| (r.first, r.second)).collect();
        assert_eq!(indices, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert_eq!(results[0].result.as_ref().unwrap().score, 2);
    }

    #[test]
    fn empty_batches() {
        let none: [(&str, &str); 0] = [];
        assert!(comparator(2).compare_pairs(&none, &identity()).is_empty());
        assert!(comparator(2).compare_all(&["MV"], &identity()).is_empty());
    }
}
