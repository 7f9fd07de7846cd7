//! Assignment vectors and their feasibility invariants.
//!
//! An assignment maps every source room to the destination hosting it; a
//! self-mapping means the room stays open. Both solvers return this form,
//! keyed by the instance's canonical room index.

use crate::instance::Instance;
use std::collections::HashMap;

/// Maps each source room index to its destination room index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    targets: Vec<usize>,
}

impl Assignment {
    /// The identity assignment: every room hosts itself.
    pub fn identity(len: usize) -> Self {
        Self {
            targets: (0..len).collect(),
        }
    }

    /// Wraps a raw target vector.
    pub fn from_vec(targets: Vec<usize>) -> Self {
        Self { targets }
    }

    /// Destination hosting source room `i`.
    pub fn target(&self, i: usize) -> usize {
        self.targets[i]
    }

    /// Raw target slice.
    pub fn as_slice(&self) -> &[usize] {
        &self.targets
    }

    /// Number of rooms covered.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True when the assignment covers no rooms.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Sorted indices of rooms that remain open (host at least one source).
    pub fn open_rooms(&self) -> Vec<usize> {
        let mut open: Vec<usize> = self
            .targets
            .iter()
            .enumerate()
            .filter(|&(i, &j)| i == j)
            .map(|(i, _)| i)
            .collect();
        open.sort_unstable();
        open
    }

    /// Number of open rooms (the objective value).
    pub fn open_count(&self) -> usize {
        self.targets
            .iter()
            .enumerate()
            .filter(|&(i, &j)| i == j)
            .count()
    }

    /// Sorted indices of rooms merged away into another destination.
    pub fn removed_rooms(&self) -> Vec<usize> {
        self.targets
            .iter()
            .enumerate()
            .filter(|&(i, &j)| i != j)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of rooms saved relative to the instance size.
    pub fn saved(&self) -> usize {
        self.len() - self.open_count()
    }

    /// Spare seats summed over open rooms; negative when a destination is
    /// overfull. Used as the first tie-break between equally good solutions.
    pub fn total_remaining(&self, instance: &Instance) -> i64 {
        let mut load: HashMap<usize, u64> = HashMap::new();
        for (i, &j) in self.targets.iter().enumerate() {
            *load.entry(j).or_insert(0) += u64::from(instance.students[i]);
        }
        load.iter()
            .map(|(&j, &l)| i64::from(instance.capacity[j]) - l as i64)
            .sum()
    }

    /// Checks every feasibility invariant against the instance.
    ///
    /// Returns a description of the first violation found:
    /// - every target is in range,
    /// - destinations host themselves (`assign[assign[i]] == assign[i]`),
    /// - no destination exceeds its capacity,
    /// - no subject appears twice in one destination.
    ///
    /// Overfull rooms are exempt from the capacity check only when they are
    /// self-hosted singletons, which is the one feasible state for them.
    pub fn validate(&self, instance: &Instance) -> std::result::Result<(), String> {
        let n = instance.len();
        if self.targets.len() != n {
            return Err(format!(
                "assignment covers {} rooms, instance has {}",
                self.targets.len(),
                n
            ));
        }

        for (i, &j) in self.targets.iter().enumerate() {
            if j >= n {
                return Err(format!("room {i} assigned to out-of-range destination {j}"));
            }
            if self.targets[j] != j {
                return Err(format!(
                    "room {i} assigned to {j}, which is itself assigned to {}",
                    self.targets[j]
                ));
            }
        }

        let mut hosted: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, &j) in self.targets.iter().enumerate() {
            hosted[j].push(i);
        }

        for (j, sources) in hosted.iter().enumerate() {
            if sources.is_empty() {
                continue;
            }
            let load: u64 = sources
                .iter()
                .map(|&i| u64::from(instance.students[i]))
                .sum();
            let overfull_singleton = sources.as_slice() == [j] && instance.is_overfull(j);
            if load > u64::from(instance.capacity[j]) && !overfull_singleton {
                return Err(format!(
                    "destination {j} holds {load} students over capacity {}",
                    instance.capacity[j]
                ));
            }

            let mut subjects = std::collections::HashSet::new();
            for &i in sources {
                if !subjects.insert(instance.subject_keys[i].as_str()) {
                    return Err(format!(
                        "destination {j} hosts subject '{}' more than once",
                        instance.subject_keys[i]
                    ));
                }
            }
        }

        Ok(())
    }
}
