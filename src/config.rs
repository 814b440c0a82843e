use std::thread;

use crate::align::DEFAULT_MAX_CELLS;
use crate::{ComparatorError, Result};

/// Resource limits shared by every comparison a [`crate::Comparator`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    max_cells: usize,
    workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cells: DEFAULT_MAX_CELLS,
            workers: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ceiling on `len_a * len_b` per alignment.
    pub fn with_max_cells(mut self, max_cells: usize) -> Result<Self> {
        if max_cells == 0 {
            return Err(ComparatorError::InvalidConfig(
                "max cells must be greater than 0".to_string(),
            ));
        }
        self.max_cells = max_cells;
        Ok(self)
    }

    /// Threads used by batch comparisons.
    pub fn with_workers(mut self, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(ComparatorError::InvalidConfig(
                "worker count must be greater than 0".to_string(),
            ));
        }
        self.workers = workers;
        Ok(self)
    }

    pub fn max_cells(&self) -> usize {
        self.max_cells
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = EngineConfig::default();
        assert_eq!(config.max_cells(), DEFAULT_MAX_CELLS);
        assert!(config.workers() >= 1);
    }

    #[test]
    fn builder_rejects_zero() {
        assert!(matches!(
            EngineConfig::new().with_max_cells(0),
            Err(ComparatorError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::new().with_workers(0),
            Err(ComparatorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn builder_sets_values() {
        let config = EngineConfig::new()
            .with_max_cells(1_000)
            .and_then(|c| c.with_workers(3))
            .unwrap();
        assert_eq!(config.max_cells(), 1_000);
        assert_eq!(config.workers(), 3);
    }
}
