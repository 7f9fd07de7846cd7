//! Input-file ingestion.
//!
//! The core consumes [`Row`] values; this module produces them from a CSV
//! file with tolerant, case-insensitive column matching, or from a JSON
//! array of rows. When a date column is present the slot key becomes the
//! `date_shift` composite, so one slot never spans two exam days.

use anyhow::{bail, Context, Result};
use roompack_core::Row;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const ROOM_COLUMNS: &[&str] = &["room", "room id", "room_id", "roomid", "f_tenphmoi"];
const SHIFT_COLUMNS: &[&str] = &["shift", "time", "key", "giothi_bd"];
const SUBJECT_COLUMNS: &[&str] = &["subject", "course", "course id", "course_id", "f_mamh"];
const STUDENTS_COLUMNS: &[&str] = &[
    "students",
    "student count",
    "allocated students",
    "f_soluong",
];
const CAPACITY_COLUMNS: &[&str] = &[
    "capacity",
    "exam capacity",
    "room exam capacity",
    "suc_chua",
];
const CAMPUS_COLUMNS: &[&str] = &["campus", "coso"];
const DATE_COLUMNS: &[&str] = &["date", "exam date", "date_only", "ngaythi"];

/// Reads rows from a CSV or JSON file, chosen by extension.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => read_json(path),
        _ => read_csv(path),
    }
}

fn read_json(path: &Path) -> Result<Vec<Row>> {
    let file =
        File::open(path).with_context(|| format!("cannot open input {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not a JSON array of rows", path.display()))
}

fn read_csv(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("cannot open input {}", path.display()))?;
    let columns = Columns::locate(reader.headers()?)?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let record = record.with_context(|| format!("line {line}: malformed CSV record"))?;
        rows.push(columns.row_from(&record, line)?);
    }
    Ok(rows)
}

/// Resolved column indices for one input file.
struct Columns {
    room: usize,
    shift: usize,
    subject: usize,
    students: usize,
    capacity: usize,
    campus: Option<usize>,
    date: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self> {
        let required = [
            ("room", find_column(headers, ROOM_COLUMNS)),
            ("shift", find_column(headers, SHIFT_COLUMNS)),
            ("subject", find_column(headers, SUBJECT_COLUMNS)),
            ("students", find_column(headers, STUDENTS_COLUMNS)),
            ("capacity", find_column(headers, CAPACITY_COLUMNS)),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, index)| index.is_none())
            .map(|&(name, _)| name)
            .collect();
        if !missing.is_empty() {
            let available: Vec<&str> = headers.iter().collect();
            bail!(
                "missing required columns {missing:?}; available columns: {available:?}"
            );
        }

        Ok(Self {
            room: required[0].1.unwrap(),
            shift: required[1].1.unwrap(),
            subject: required[2].1.unwrap(),
            students: required[3].1.unwrap(),
            capacity: required[4].1.unwrap(),
            campus: find_column(headers, CAMPUS_COLUMNS),
            date: find_column(headers, DATE_COLUMNS),
        })
    }

    fn row_from(&self, record: &csv::StringRecord, line: usize) -> Result<Row> {
        let field = |index: usize| record.get(index).unwrap_or("").trim();

        let students: i64 = field(self.students)
            .parse()
            .with_context(|| format!("line {line}: students is not an integer"))?;
        let capacity: i64 = field(self.capacity)
            .parse()
            .with_context(|| format!("line {line}: capacity is not an integer"))?;

        let shift = field(self.shift);
        let slot_key = match self.date.map(field) {
            Some(date) if !date.is_empty() => format!("{date}_{shift}"),
            _ => shift.to_string(),
        };

        let mut row = Row::new(
            field(self.room),
            field(self.subject),
            students,
            capacity,
            slot_key,
        );
        if let Some(campus) = self.campus.map(field) {
            if !campus.is_empty() {
                row = row.with_campus(campus);
            }
        }
        Ok(row)
    }
}

/// Case-insensitive header lookup over a candidate list.
fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| candidates.contains(&header.trim().to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> Result<Vec<Row>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes());
        let columns = Columns::locate(reader.headers()?)?;
        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            rows.push(columns.row_from(&record?, index + 2)?);
        }
        Ok(rows)
    }

    #[test]
    fn test_parses_standard_headers() {
        let rows = parse(
            "Room,Shift,Subject,Students,Capacity\n\
             R1,S1,MATH,10,50\n\
             R2,S1,PHYS,20,50\n",
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].room_id, "R1");
        assert_eq!(rows[0].slot_key, "S1");
        assert_eq!(rows[0].students, 10);
        assert_eq!(rows[0].campus, None);
    }

    #[test]
    fn test_date_column_builds_composite_slot() {
        let rows = parse(
            "room,date,shift,subject,students,capacity\n\
             R1,2026-06-01,AM,MATH,10,50\n",
        )
        .unwrap();
        assert_eq!(rows[0].slot_key, "2026-06-01_AM");
    }

    #[test]
    fn test_campus_column_is_optional() {
        let rows = parse(
            "room,shift,subject,students,capacity,campus\n\
             R1,S1,MATH,10,50,North\n\
             R2,S1,PHYS,20,50,\n",
        )
        .unwrap();
        assert_eq!(rows[0].campus.as_deref(), Some("North"));
        assert_eq!(rows[1].campus, None);
    }

    #[test]
    fn test_legacy_headers_match() {
        let rows = parse(
            "F_TENPHMOI,GIOTHI_BD,F_MAMH,F_SOLUONG,SUC_CHUA\n\
             A101,07:00,CS101,30,60\n",
        )
        .unwrap();
        assert_eq!(rows[0].room_id, "A101");
        assert_eq!(rows[0].subject_id, "CS101");
    }

    #[test]
    fn test_missing_column_is_reported() {
        let err = parse("room,shift,subject,students\nR1,S1,MATH,10\n").unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_non_numeric_students_is_reported_with_line() {
        let err = parse(
            "room,shift,subject,students,capacity\n\
             R1,S1,MATH,ten,50\n",
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }
}
