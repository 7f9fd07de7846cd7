//! Per-partition problem instances.
//!
//! An [`Instance`] is the numeric form of one partition: parallel arrays
//! indexed by the canonical room index (input order). Solvers communicate
//! exclusively in terms of that index; names and subjects are carried along
//! for reporting.

use crate::error::{Error, Result};
use crate::row::Row;
use std::collections::HashSet;

/// Canonical subject form used for disjointness comparisons.
///
/// The original spelling is kept for reporting; only comparisons go through
/// this normalization.
pub fn canonical_subject(subject: &str) -> String {
    subject.trim().to_uppercase()
}

/// Solver input derived from one partition.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Room names, canonical order.
    pub names: Vec<String>,
    /// Subjects as spelled in the input.
    pub subjects: Vec<String>,
    /// Canonicalized subjects, comparison only.
    pub subject_keys: Vec<String>,
    /// Students seated per room.
    pub students: Vec<u32>,
    /// Seat capacity per room.
    pub capacity: Vec<u32>,
}

impl Instance {
    /// Builds an instance from a partition's rows, validating each one.
    ///
    /// Rejects non-positive capacities, negative student counts, empty
    /// identifiers, and duplicate room ids. Input order becomes the
    /// canonical room ordering.
    pub fn from_rows(rows: &[Row]) -> Result<Self> {
        let mut names = Vec::with_capacity(rows.len());
        let mut subjects = Vec::with_capacity(rows.len());
        let mut subject_keys = Vec::with_capacity(rows.len());
        let mut students = Vec::with_capacity(rows.len());
        let mut capacity = Vec::with_capacity(rows.len());
        let mut seen = HashSet::new();

        for row in rows {
            let invalid = |reason: String| Error::InvalidInput {
                room: row.room_id.clone(),
                reason,
            };

            if row.room_id.trim().is_empty() {
                return Err(invalid("room id is empty".to_string()));
            }
            if row.subject_id.trim().is_empty() {
                return Err(invalid("subject id is empty".to_string()));
            }
            if row.capacity <= 0 {
                return Err(invalid(format!(
                    "capacity must be positive (got {})",
                    row.capacity
                )));
            }
            if row.students < 0 {
                return Err(invalid(format!(
                    "students must be non-negative (got {})",
                    row.students
                )));
            }
            if !seen.insert(row.room_id.clone()) {
                return Err(invalid("duplicate room id within partition".to_string()));
            }

            let students_u32 = u32::try_from(row.students)
                .map_err(|_| invalid(format!("students out of range (got {})", row.students)))?;
            let capacity_u32 = u32::try_from(row.capacity)
                .map_err(|_| invalid(format!("capacity out of range (got {})", row.capacity)))?;

            names.push(row.room_id.clone());
            subjects.push(row.subject_id.clone());
            subject_keys.push(canonical_subject(&row.subject_id));
            students.push(students_u32);
            capacity.push(capacity_u32);
        }

        Ok(Self {
            names,
            subjects,
            subject_keys,
            students,
            capacity,
        })
    }

    /// Number of rooms.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when the instance has no rooms.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True when room `i` seats more students than it has capacity for.
    ///
    /// Such rooms stay self-hosted: they can neither migrate nor accept
    /// guests, because the formulation does not split cohorts.
    pub fn is_overfull(&self, i: usize) -> bool {
        self.students[i] > self.capacity[i]
    }

    /// Total students across the instance.
    pub fn total_students(&self) -> u64 {
        self.students.iter().map(|&s| u64::from(s)).sum()
    }
}
