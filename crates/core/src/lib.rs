//! # Roompack Core
//!
//! Room-merging optimization engine for exam scheduling: given exam-room
//! bookings, consolidate student cohorts into as few rooms as possible
//! without exceeding seat capacities and without co-locating two cohorts of
//! the same subject.
//!
//! ## Components
//!
//! - **Row / Instance**: [`Row`] is one booking as handed over by
//!   ingestion; [`Instance`] is the validated numeric form of one
//!   `(slot, campus)` partition.
//! - **Greedy packer**: [`greedy::solve`] runs a portfolio of
//!   best/first/worst-fit passes and keeps the best feasible assignment.
//! - **Exact packer**: [`exact::solve`] formulates the partition as a
//!   binary program and delegates branch-and-bound to HiGHS under a
//!   wall-clock budget.
//! - **Dispatcher**: [`Optimizer`] partitions the input, routes each
//!   partition by size, falls back to the greedy packer on exact-solver
//!   failure, and solves partitions on a fixed-size worker pool.
//! - **Report**: [`MergeReport`] with kept/removed rooms, per-room merge
//!   lineage, and aggregate savings.
//!
//! ## Example
//!
//! ```no_run
//! use roompack_core::{optimize, OptimizeConfig, Row};
//!
//! let rows = vec![
//!     Row::new("R101", "MATH", 25, 60, "2026-06-01_AM"),
//!     Row::new("R102", "PHYS", 20, 60, "2026-06-01_AM"),
//! ];
//! let report = optimize(&rows, &OptimizeConfig::default())?;
//! println!("saved {} rooms", report.overall.rooms_saved);
//! # Ok::<(), roompack_core::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: serialization support for rows, configuration, and reports.

pub mod assignment;
pub mod error;
pub mod exact;
pub mod greedy;
pub mod instance;
pub mod report;
pub mod row;
pub mod solver;

// Re-exports
pub use assignment::Assignment;
pub use error::{Error, Result};
pub use exact::SolveStatus;
pub use greedy::{FitRule, SourceOrder, Strategy};
pub use instance::Instance;
pub use report::{
    KeptRoom, MergeReport, MergedSource, OverallSummary, PartitionDetail, PartitionSolution,
    RemovedRoom,
};
pub use row::{PartitionKey, Row, DEFAULT_CAMPUS};
pub use solver::{optimize, OptimizeConfig, Optimizer, SolverKind};
