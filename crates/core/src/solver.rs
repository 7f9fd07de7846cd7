//! Partition routing, solver selection, and parallel dispatch.
//!
//! Rows are grouped by `(slot, campus)` and each partition is solved
//! independently on a fixed-size worker pool. Small partitions go to the
//! exact packer; large ones, and any partition the exact packer fails on,
//! go to the greedy packer. Per-partition state never crosses workers;
//! results are reduced into the report after every worker has finished,
//! in key order rather than completion order.

use crate::assignment::Assignment;
use crate::error::{Error, Result};
use crate::exact;
use crate::greedy;
use crate::instance::Instance;
use crate::report::{self, MergeReport, PartitionSolution};
use crate::row::{PartitionKey, Row};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration for one optimization run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizeConfig {
    /// Largest partition size still routed to the exact solver.
    /// 0 forces the greedy packer everywhere.
    pub threshold: u32,

    /// Wall-clock budget for one exact solve, in seconds.
    pub time_limit_secs: u32,

    /// Worker pool size (0 = number of hardware threads).
    pub workers: usize,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            threshold: 80,
            time_limit_secs: 30,
            workers: 0,
        }
    }
}

impl OptimizeConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the exact-solver size threshold.
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the exact-solver time limit in seconds.
    pub fn with_time_limit_secs(mut self, secs: u32) -> Self {
        self.time_limit_secs = secs;
        self
    }

    /// Sets the worker pool size (0 = hardware threads).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Which path produced a partition's assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverKind {
    /// Degenerate partition, no solver invoked.
    Identity,
    /// Exact packer.
    Exact,
    /// Greedy packer, routed by size.
    Greedy,
    /// Greedy packer, after the exact packer failed.
    GreedyFallback,
}

impl std::fmt::Display for SolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::Exact => write!(f, "exact"),
            Self::Greedy => write!(f, "greedy"),
            Self::GreedyFallback => write!(f, "greedy-fallback"),
        }
    }
}

/// Room-merge optimizer over partitioned input.
pub struct Optimizer {
    config: OptimizeConfig,
    cancelled: Arc<AtomicBool>,
}

impl Optimizer {
    /// Creates an optimizer with the given configuration.
    pub fn new(config: OptimizeConfig) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Requests cancellation; checked at partition boundaries.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Optimizes all rows and assembles the report.
    pub fn solve(&self, rows: &[Row]) -> Result<MergeReport> {
        let partitions = group_rows(rows);
        log::info!(
            "optimizing {} rows across {} partitions",
            rows.len(),
            partitions.len()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build worker pool: {e}")))?;

        let entries: Vec<(PartitionKey, Vec<Row>)> = partitions.into_iter().collect();
        let outcomes: Vec<Result<PartitionSolution>> = pool.install(|| {
            entries
                .par_iter()
                .map(|(key, rows)| {
                    if self.cancelled.load(Ordering::Relaxed) {
                        return Err(Error::Canceled);
                    }
                    catch_unwind(AssertUnwindSafe(|| self.solve_partition(key, rows)))
                        .unwrap_or_else(|payload| {
                            Err(Error::Internal(format!(
                                "worker crashed while solving partition {key}: {}",
                                panic_message(payload.as_ref())
                            )))
                        })
                })
                .collect()
        });

        let mut solutions = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            solutions.push(outcome?);
        }
        Ok(report::assemble(solutions))
    }

    /// Solves one partition, applying routing and fallback.
    fn solve_partition(&self, key: &PartitionKey, rows: &[Row]) -> Result<PartitionSolution> {
        let instance = Instance::from_rows(rows)?;
        let n = instance.len();

        let (assignment, solver) = if n <= 1 {
            (Assignment::identity(n), SolverKind::Identity)
        } else if n as u64 <= u64::from(self.config.threshold) {
            match exact::solve(&instance, self.config.time_limit_secs, &key.to_string()) {
                Ok(assignment) => (assignment, SolverKind::Exact),
                Err(Error::Solver {
                    partition,
                    status,
                    message,
                }) => {
                    log::warn!(
                        "exact solver failed for partition {partition} ({status}): {message}; \
                         falling back to greedy"
                    );
                    (greedy::solve(&instance), SolverKind::GreedyFallback)
                }
                Err(other) => return Err(other),
            }
        } else {
            log::debug!(
                "partition {key}: {n} rooms exceed threshold {}, using greedy",
                self.config.threshold
            );
            (greedy::solve(&instance), SolverKind::Greedy)
        };

        // A heuristic result violating the feasibility invariants has no
        // further fallback; treat it as a crate bug.
        assignment
            .validate(&instance)
            .map_err(|violation| Error::Internal(format!("partition {key}: {violation}")))?;

        log::info!(
            "partition {key}: {} -> {} rooms ({})",
            n,
            assignment.open_count(),
            solver
        );

        Ok(PartitionSolution {
            key: key.clone(),
            instance,
            assignment,
            solver,
        })
    }
}

/// Optimizes rows with the given configuration. Convenience wrapper around
/// [`Optimizer`].
pub fn optimize(rows: &[Row], config: &OptimizeConfig) -> Result<MergeReport> {
    Optimizer::new(config.clone()).solve(rows)
}

/// Groups rows by `(slot, campus)`; the map's ordering is the report order.
fn group_rows(rows: &[Row]) -> BTreeMap<PartitionKey, Vec<Row>> {
    let mut partitions: BTreeMap<PartitionKey, Vec<Row>> = BTreeMap::new();
    for row in rows {
        partitions
            .entry(PartitionKey::of(row))
            .or_default()
            .push(row.clone());
    }
    partitions
}

/// Best-effort extraction of a panic payload message.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OptimizeConfig::default();
        assert_eq!(config.threshold, 80);
        assert_eq!(config.time_limit_secs, 30);
        assert_eq!(config.workers, 0);
    }

    #[test]
    fn test_config_builder() {
        let config = OptimizeConfig::new()
            .with_threshold(10)
            .with_time_limit_secs(5)
            .with_workers(2);
        assert_eq!(config.threshold, 10);
        assert_eq!(config.time_limit_secs, 5);
        assert_eq!(config.workers, 2);
    }

    #[test]
    fn test_group_rows_sorts_by_slot_then_campus() {
        let rows = vec![
            Row::new("X", "A", 1, 10, "S2"),
            Row::new("Y", "B", 1, 10, "S1").with_campus("B"),
            Row::new("Z", "C", 1, 10, "S1"),
        ];
        let grouped = group_rows(&rows);
        let keys: Vec<String> = grouped.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["S1/ALL", "S1/B", "S2/ALL"]);
    }

    #[test]
    fn test_rows_without_campus_share_one_group() {
        let rows = vec![
            Row::new("X", "A", 1, 10, "S1"),
            Row::new("Y", "B", 1, 10, "S1"),
        ];
        let grouped = group_rows(&rows);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.values().next().unwrap().len(), 2);
    }

    #[test]
    fn test_cancel_before_solve() {
        let optimizer = Optimizer::new(OptimizeConfig::default());
        optimizer.cancel();
        let rows = vec![Row::new("R1", "MATH", 10, 50, "S1")];
        let err = optimizer.solve(&rows).unwrap_err();
        assert!(matches!(err, Error::Canceled));
    }

    #[test]
    fn test_solver_kind_display() {
        assert_eq!(format!("{}", SolverKind::Exact), "exact");
        assert_eq!(format!("{}", SolverKind::GreedyFallback), "greedy-fallback");
    }
}
