//! Multi-strategy constructive bin-packing heuristic.
//!
//! Runs a fixed portfolio of placement rules over differently ordered
//! sources and keeps the best outcome. Each pass starts from the identity
//! assignment, so the result is never worse than leaving every room open,
//! and the whole packer is O(strategies * N^2).

use crate::assignment::Assignment;
use crate::instance::Instance;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Placement rule applied when scoring candidate destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitRule {
    /// Tightest fit: minimize the space left after the merge.
    BestFit,
    /// First candidate in index order.
    FirstFit,
    /// Loosest fit: maximize the space left after the merge.
    WorstFit,
}

/// Order in which sources attempt to migrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrder {
    /// Smallest cohorts first.
    StudentsAscending,
    /// Largest cohorts first.
    StudentsDescending,
    /// Largest rooms first.
    CapacityDescending,
}

/// One heuristic pass: a placement rule plus a source ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    /// Placement rule for this pass.
    pub rule: FitRule,
    /// Source ordering for this pass.
    pub order: SourceOrder,
}

impl Strategy {
    /// The full portfolio, executed in this order.
    pub const ALL: [Strategy; 5] = [
        Strategy {
            rule: FitRule::BestFit,
            order: SourceOrder::StudentsAscending,
        },
        Strategy {
            rule: FitRule::BestFit,
            order: SourceOrder::StudentsDescending,
        },
        Strategy {
            rule: FitRule::FirstFit,
            order: SourceOrder::StudentsDescending,
        },
        Strategy {
            rule: FitRule::WorstFit,
            order: SourceOrder::StudentsDescending,
        },
        Strategy {
            rule: FitRule::BestFit,
            order: SourceOrder::CapacityDescending,
        },
    ];

    /// Short label for logging.
    pub fn name(&self) -> &'static str {
        match (self.rule, self.order) {
            (FitRule::BestFit, SourceOrder::StudentsAscending) => "best-fit/students-asc",
            (FitRule::BestFit, SourceOrder::StudentsDescending) => "best-fit/students-desc",
            (FitRule::FirstFit, SourceOrder::StudentsDescending) => "first-fit/students-desc",
            (FitRule::WorstFit, SourceOrder::StudentsDescending) => "worst-fit/students-desc",
            (FitRule::BestFit, SourceOrder::CapacityDescending) => "best-fit/capacity-desc",
            _ => "custom",
        }
    }
}

/// Solves the instance with every strategy and returns the best assignment.
///
/// Winner selection: fewest open rooms, then lowest spare capacity over open
/// rooms, then the lexicographically smallest target vector, so the result
/// is fully deterministic for a given instance.
pub fn solve(instance: &Instance) -> Assignment {
    let mut best: Option<(usize, i64, Assignment)> = None;

    for strategy in Strategy::ALL {
        let candidate = run_strategy(instance, strategy);
        let open = candidate.open_count();
        let remaining = candidate.total_remaining(instance);
        log::debug!(
            "strategy {} left {} of {} rooms open",
            strategy.name(),
            open,
            instance.len()
        );

        let better = match &best {
            None => true,
            Some((best_open, best_remaining, best_assignment)) => {
                (open, remaining, candidate.as_slice())
                    < (*best_open, *best_remaining, best_assignment.as_slice())
            }
        };
        if better {
            best = Some((open, remaining, candidate));
        }
    }

    best.map(|(_, _, assignment)| assignment)
        .unwrap_or_else(|| Assignment::identity(instance.len()))
}

/// Runs one strategy from the identity assignment.
///
/// A source migrates at most once and only while it hosts nobody else;
/// destinations that have accepted a guest stay open where they are. This
/// keeps every destination self-hosted throughout the pass. Overfull rooms
/// never move and, having no spare seats, never accept.
fn run_strategy(instance: &Instance, strategy: Strategy) -> Assignment {
    let n = instance.len();
    let mut targets: Vec<usize> = (0..n).collect();
    let mut load: Vec<u64> = instance.students.iter().map(|&s| u64::from(s)).collect();
    let mut hosted_subjects: Vec<HashSet<&str>> = instance
        .subject_keys
        .iter()
        .map(|key| {
            let mut set = HashSet::new();
            set.insert(key.as_str());
            set
        })
        .collect();
    let mut has_guests = vec![false; n];

    for src in source_order(instance, strategy.order) {
        if targets[src] != src || has_guests[src] || instance.is_overfull(src) {
            continue;
        }
        let students = load[src];
        let subject = instance.subject_keys[src].as_str();

        let mut chosen: Option<(usize, u64)> = None; // (destination, space left)
        for dst in 0..n {
            if dst == src || targets[dst] != dst {
                continue;
            }
            let total = load[dst] + students;
            if total > u64::from(instance.capacity[dst]) {
                continue;
            }
            if hosted_subjects[dst].contains(subject) {
                continue;
            }
            let space = u64::from(instance.capacity[dst]) - total;

            let take = match (strategy.rule, &chosen) {
                (_, None) => true,
                (FitRule::FirstFit, Some(_)) => false,
                (FitRule::BestFit, Some((_, best_space))) => space < *best_space,
                (FitRule::WorstFit, Some((_, best_space))) => space > *best_space,
            };
            if take {
                chosen = Some((dst, space));
                if strategy.rule == FitRule::FirstFit {
                    break;
                }
            }
        }

        if let Some((dst, _)) = chosen {
            targets[src] = dst;
            load[dst] += students;
            hosted_subjects[dst].insert(subject);
            has_guests[dst] = true;
        }
    }

    Assignment::from_vec(targets)
}

/// Source iteration order for a strategy. Stable sorts keep canonical order
/// between equal keys.
fn source_order(instance: &Instance, order: SourceOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..instance.len()).collect();
    match order {
        SourceOrder::StudentsAscending => indices.sort_by_key(|&i| instance.students[i]),
        SourceOrder::StudentsDescending => indices.sort_by_key(|&i| Reverse(instance.students[i])),
        SourceOrder::CapacityDescending => indices.sort_by_key(|&i| Reverse(instance.capacity[i])),
    }
    indices
}
