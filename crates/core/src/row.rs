//! Source-row representation consumed by the optimizer.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Campus group used for rows that carry no explicit campus.
pub const DEFAULT_CAMPUS: &str = "ALL";

/// One exam-room booking as handed over by the ingestion layer.
///
/// Numeric fields are signed so that malformed input is representable here
/// and rejected by the instance builder instead of failing during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Row {
    /// Room identifier, unique within its partition.
    pub room_id: String,
    /// Subject hosted in the room.
    pub subject_id: String,
    /// Number of students seated in the room.
    pub students: i64,
    /// Physical seat capacity of the room.
    pub capacity: i64,
    /// Opaque slot identifier (date + time + shift composite).
    pub slot_key: String,
    /// Campus the room belongs to; `None` joins the shared default group.
    #[cfg_attr(feature = "serde", serde(default))]
    pub campus: Option<String>,
}

impl Row {
    /// Creates a row without an explicit campus.
    pub fn new(
        room_id: impl Into<String>,
        subject_id: impl Into<String>,
        students: i64,
        capacity: i64,
        slot_key: impl Into<String>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            subject_id: subject_id.into(),
            students,
            capacity,
            slot_key: slot_key.into(),
            campus: None,
        }
    }

    /// Sets the campus.
    pub fn with_campus(mut self, campus: impl Into<String>) -> Self {
        self.campus = Some(campus.into());
        self
    }

    /// Campus group this row is partitioned under.
    pub fn campus_group(&self) -> &str {
        self.campus.as_deref().unwrap_or(DEFAULT_CAMPUS)
    }
}

/// Identifies one independently solved partition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartitionKey {
    /// Slot identifier shared by the partition's rows.
    pub slot: String,
    /// Campus group shared by the partition's rows.
    pub campus: String,
}

impl PartitionKey {
    /// Creates a key from a row's slot and campus group.
    pub fn of(row: &Row) -> Self {
        Self {
            slot: row.slot_key.clone(),
            campus: row.campus_group().to_string(),
        }
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.slot, self.campus)
    }
}
