//! Report assembly from per-partition assignments.

use crate::assignment::Assignment;
use crate::instance::Instance;
use crate::row::PartitionKey;
use crate::solver::SolverKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One solved partition, before folding into the report.
#[derive(Debug, Clone)]
pub struct PartitionSolution {
    /// Partition identity.
    pub key: PartitionKey,
    /// Instance the assignment refers to.
    pub instance: Instance,
    /// Final assignment for the partition.
    pub assignment: Assignment,
    /// Path that produced the assignment.
    pub solver: SolverKind,
}

/// A cohort merged into a kept room.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MergedSource {
    /// Source room name.
    pub room: String,
    /// Subject of the merged cohort.
    pub subject: String,
    /// Students brought along.
    pub students: u32,
}

/// A room that stays open, with its merge lineage.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeptRoom {
    /// Room name.
    pub room: String,
    /// Subject of the hosting cohort.
    pub subject: String,
    /// Total students seated after merging, the host's own included.
    pub students: u32,
    /// Seat capacity.
    pub capacity: u32,
    /// Cohorts merged in from other rooms.
    pub merged_sources: Vec<MergedSource>,
}

/// A room merged away.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RemovedRoom {
    /// Room name.
    pub room: String,
    /// Subject the room hosted.
    pub subject: String,
    /// Students relocated.
    pub students: u32,
    /// Seat capacity the room had.
    pub capacity: u32,
    /// Name of the destination room.
    pub merged_to: String,
}

/// Per-partition slice of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartitionDetail {
    /// Slot identifier.
    pub slot: String,
    /// Campus group.
    pub campus: String,
    /// Rooms before merging.
    pub initial: usize,
    /// Rooms after merging.
    #[cfg_attr(feature = "serde", serde(rename = "final"))]
    pub final_rooms: usize,
    /// Rooms saved.
    pub saved: usize,
    /// Which solver path produced this partition's result.
    pub solver: String,
    /// Open rooms in canonical index order.
    pub kept_rooms: Vec<KeptRoom>,
    /// Merged-away rooms in canonical index order.
    pub removed_rooms: Vec<RemovedRoom>,
}

/// Aggregate totals across all partitions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverallSummary {
    /// Total rooms before merging.
    pub initial_rooms: usize,
    /// Total rooms after merging.
    pub final_rooms: usize,
    /// Total rooms saved.
    pub rooms_saved: usize,
    /// `100 * rooms_saved / initial_rooms`, rounded to 2 decimals.
    pub efficiency_percent: f64,
}

/// Structured result of one optimization run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MergeReport {
    /// Aggregate totals.
    pub overall: OverallSummary,
    /// Per-partition details in `(slot, campus)` order.
    pub details: Vec<PartitionDetail>,
}

/// Folds solved partitions into the final report. Input order is preserved;
/// the dispatcher hands partitions over already sorted by key.
pub fn assemble(solutions: Vec<PartitionSolution>) -> MergeReport {
    let mut initial_rooms = 0;
    let mut final_rooms = 0;
    let mut details = Vec::with_capacity(solutions.len());

    for solution in solutions {
        let detail = partition_detail(&solution);
        initial_rooms += detail.initial;
        final_rooms += detail.final_rooms;
        details.push(detail);
    }

    let rooms_saved = initial_rooms - final_rooms;
    MergeReport {
        overall: OverallSummary {
            initial_rooms,
            final_rooms,
            rooms_saved,
            efficiency_percent: efficiency_percent(rooms_saved, initial_rooms),
        },
        details,
    }
}

fn partition_detail(solution: &PartitionSolution) -> PartitionDetail {
    let instance = &solution.instance;
    let assignment = &solution.assignment;
    let n = instance.len();

    let mut hosted: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        hosted[assignment.target(i)].push(i);
    }

    let kept_rooms: Vec<KeptRoom> = assignment
        .open_rooms()
        .into_iter()
        .map(|j| {
            let sources = &hosted[j];
            let students = sources
                .iter()
                .map(|&i| u64::from(instance.students[i]))
                .sum::<u64>() as u32;
            KeptRoom {
                room: instance.names[j].clone(),
                subject: instance.subjects[j].clone(),
                students,
                capacity: instance.capacity[j],
                merged_sources: sources
                    .iter()
                    .filter(|&&i| i != j)
                    .map(|&i| MergedSource {
                        room: instance.names[i].clone(),
                        subject: instance.subjects[i].clone(),
                        students: instance.students[i],
                    })
                    .collect(),
            }
        })
        .collect();

    let removed_rooms: Vec<RemovedRoom> = assignment
        .removed_rooms()
        .into_iter()
        .map(|i| RemovedRoom {
            room: instance.names[i].clone(),
            subject: instance.subjects[i].clone(),
            students: instance.students[i],
            capacity: instance.capacity[i],
            merged_to: instance.names[assignment.target(i)].clone(),
        })
        .collect();

    let final_rooms = kept_rooms.len();
    PartitionDetail {
        slot: solution.key.slot.clone(),
        campus: solution.key.campus.clone(),
        initial: n,
        final_rooms,
        saved: n - final_rooms,
        solver: solution.solver.to_string(),
        kept_rooms,
        removed_rooms,
    }
}

/// Savings ratio as a percentage with 2-decimal rounding; 0 when there was
/// nothing to optimize.
fn efficiency_percent(saved: usize, initial: usize) -> f64 {
    if initial == 0 {
        return 0.0;
    }
    (saved as f64 / initial as f64 * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;

    fn solution(
        slot: &str,
        rows: &[(&str, &str, i64, i64)],
        targets: Vec<usize>,
    ) -> PartitionSolution {
        let rows: Vec<Row> = rows
            .iter()
            .map(|&(id, subject, students, capacity)| {
                Row::new(id, subject, students, capacity, slot)
            })
            .collect();
        let instance = Instance::from_rows(&rows).unwrap();
        PartitionSolution {
            key: PartitionKey::of(&rows[0]),
            instance,
            assignment: Assignment::from_vec(targets),
            solver: SolverKind::Greedy,
        }
    }

    #[test]
    fn test_assemble_merge_lineage() {
        let report = assemble(vec![solution(
            "S1",
            &[("R1", "MATH", 10, 50), ("R2", "PHYS", 20, 50)],
            vec![0, 0],
        )]);

        assert_eq!(report.overall.initial_rooms, 2);
        assert_eq!(report.overall.final_rooms, 1);
        assert_eq!(report.overall.rooms_saved, 1);
        assert_eq!(report.overall.efficiency_percent, 50.0);

        let detail = &report.details[0];
        assert_eq!(detail.slot, "S1");
        assert_eq!(detail.campus, "ALL");
        assert_eq!(detail.kept_rooms.len(), 1);
        assert_eq!(detail.removed_rooms.len(), 1);

        let kept = &detail.kept_rooms[0];
        assert_eq!(kept.room, "R1");
        assert_eq!(kept.students, 30);
        assert_eq!(kept.merged_sources.len(), 1);
        assert_eq!(kept.merged_sources[0].room, "R2");

        let removed = &detail.removed_rooms[0];
        assert_eq!(removed.room, "R2");
        assert_eq!(removed.merged_to, "R1");
    }

    #[test]
    fn test_kept_and_removed_partition_the_rooms() {
        let report = assemble(vec![solution(
            "S1",
            &[
                ("R1", "A", 10, 50),
                ("R2", "B", 20, 50),
                ("R3", "C", 30, 50),
            ],
            vec![0, 0, 2],
        )]);
        let detail = &report.details[0];
        let mut all: Vec<&str> = detail
            .kept_rooms
            .iter()
            .map(|k| k.room.as_str())
            .chain(detail.removed_rooms.iter().map(|r| r.room.as_str()))
            .collect();
        all.sort_unstable();
        assert_eq!(all, vec!["R1", "R2", "R3"]);
    }

    #[test]
    fn test_efficiency_rounding() {
        assert_eq!(efficiency_percent(0, 0), 0.0);
        assert_eq!(efficiency_percent(1, 2), 50.0);
        assert_eq!(efficiency_percent(1, 3), 33.33);
        assert_eq!(efficiency_percent(2, 3), 66.67);
    }

    #[test]
    fn test_empty_report() {
        let report = assemble(Vec::new());
        assert_eq!(report.overall.initial_rooms, 0);
        assert_eq!(report.overall.efficiency_percent, 0.0);
        assert!(report.details.is_empty());
    }
}
