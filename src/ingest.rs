//! CSV roster ingestion.
//!
//! Every problem with a single cell or row becomes a warning; only failing to
//! open or read the file is an error. Out-of-range scores are turned into
//! absent values, never clamped.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::record::{StudentRecord, UNKNOWN_SECTION};

/// A single row as it appears in the roster CSV.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RosterRow {
    student_id: String,
    last_name: String,
    first_name: String,
    section: String,
    quiz1: String,
    quiz2: String,
    quiz3: String,
    quiz4: String,
    quiz5: String,
    midterm: String,
    #[serde(rename = "final")]
    final_exam: String,
    attendance_percent: String,
}

/// Records that were read successfully plus every warning raised on the way.
#[derive(Debug, Default)]
pub struct Roster {
    pub records: Vec<StudentRecord>,
    pub warnings: Vec<String>,
}

impl Roster {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// Reads a roster CSV from `path`.
pub fn read_roster(path: impl AsRef<Path>) -> Result<Roster> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("failed to open roster '{}'", path.display()))?;
    let roster = parse_roster(file)?;
    info!(
        path = %path.display(),
        records = roster.records.len(),
        warnings = roster.warnings.len(),
        "Roster loaded"
    );
    Ok(roster)
}

/// Parses roster CSV data with a header row.
pub fn parse_roster<R: Read>(reader: R) -> Result<Roster> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut roster = Roster::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (i, result) in rdr.deserialize::<RosterRow>().enumerate() {
        // header is row 1
        let row_num = i + 2;
        let row = match result {
            Ok(row) => row,
            Err(e) if e.is_io_error() => {
                return Err(e).context("failed to read roster data");
            }
            Err(e) => {
                roster.warn(format!("Row {row_num}: unreadable row skipped: {e}"));
                continue;
            }
        };

        if row.student_id.is_empty() {
            roster.warn(format!("Row {row_num}: missing student_id, row skipped"));
            continue;
        }
        if !seen.insert(row.student_id.clone()) {
            roster.warn(format!(
                "Row {row_num}: duplicate student_id '{}', row skipped",
                row.student_id
            ));
            continue;
        }

        let record = row_to_record(row, row_num, &mut roster);
        let (record, range_warnings) = record.normalized();
        for w in range_warnings {
            roster.warn(format!("Row {row_num}: {w}"));
        }
        roster.records.push(record);
    }

    debug!(records = roster.records.len(), "Roster parsed");
    Ok(roster)
}

fn row_to_record(row: RosterRow, row_num: usize, roster: &mut Roster) -> StudentRecord {
    let mut cell = |name: &str, value: &str| -> Option<f64> {
        if value.is_empty() {
            return None;
        }
        match value.parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => {
                roster.warn(format!(
                    "Row {row_num}: invalid {name} value '{value}', treated as absent"
                ));
                None
            }
        }
    };

    let quizzes = [
        cell("quiz1", &row.quiz1),
        cell("quiz2", &row.quiz2),
        cell("quiz3", &row.quiz3),
        cell("quiz4", &row.quiz4),
        cell("quiz5", &row.quiz5),
    ];
    let midterm = cell("midterm", &row.midterm);
    let final_exam = cell("final", &row.final_exam);
    let attendance = cell("attendance_percent", &row.attendance_percent);

    let section = if row.section.is_empty() {
        UNKNOWN_SECTION
    } else {
        row.section.as_str()
    };

    StudentRecord::new(&row.student_id, section)
        .with_name(&row.first_name, &row.last_name)
        .with_quizzes(quizzes)
        .with_exams(midterm, final_exam)
        .with_attendance(attendance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    const HEADER: &str = "student_id,last_name,first_name,section,quiz1,quiz2,quiz3,quiz4,quiz5,midterm,final,attendance_percent\n";

    #[test]
    fn test_parse_valid_rows() {
        let data = format!(
            "{HEADER}S001, Lovelace ,Ada,A,80,85,90,85,80,85,88,95\nS002,Turing,Alan,B,70,,75,,,65,72,\n"
        );
        let roster = parse_roster(data.as_bytes()).unwrap();

        assert!(roster.warnings.is_empty());
        assert_eq!(roster.records.len(), 2);

        let ada = &roster.records[0];
        assert_eq!(ada.student_id, "S001");
        assert_eq!(ada.last_name, "Lovelace");
        assert_eq!(ada.quizzes, [Some(80.0), Some(85.0), Some(90.0), Some(85.0), Some(80.0)]);
        assert_eq!(ada.final_exam, Some(88.0));

        let alan = &roster.records[1];
        assert_eq!(alan.quizzes, [Some(70.0), None, Some(75.0), None, None]);
        assert_eq!(alan.attendance_percent, None);
    }

    #[test]
    fn test_out_of_range_becomes_absent_with_warning() {
        let data = format!("{HEADER}S001,Doe,Jane,A,80,,,,,150,88,95\n");
        let roster = parse_roster(data.as_bytes()).unwrap();

        assert_eq!(roster.records.len(), 1);
        assert_eq!(roster.records[0].midterm, None);
        assert_eq!(roster.records[0].final_exam, Some(88.0));
        assert_eq!(roster.warnings.len(), 1);
        assert!(roster.warnings[0].starts_with("Row 2:"));
        assert!(roster.warnings[0].contains("midterm"));
    }

    #[test]
    fn test_unparsable_value_becomes_absent_with_warning() {
        let data = format!("{HEADER}S001,Doe,Jane,A,abc,,,,,70,88,95\n");
        let roster = parse_roster(data.as_bytes()).unwrap();

        assert_eq!(roster.records[0].quizzes[0], None);
        assert_eq!(roster.records[0].midterm, Some(70.0));
        assert!(roster.warnings[0].contains("invalid quiz1 value 'abc'"));
    }

    #[test]
    fn test_missing_id_and_duplicates_are_skipped() {
        let data = format!(
            "{HEADER},Doe,Jane,A,,,,,,70,80,90\nS001,Doe,John,A,,,,,,70,80,90\nS001,Roe,Rick,B,,,,,,60,60,60\n"
        );
        let roster = parse_roster(data.as_bytes()).unwrap();

        assert_eq!(roster.records.len(), 1);
        assert_eq!(roster.records[0].first_name, "John");
        assert_eq!(roster.warnings.len(), 2);
        assert!(roster.warnings[0].contains("Row 2: missing student_id"));
        assert!(roster.warnings[1].contains("Row 4: duplicate student_id 'S001'"));
    }

    #[test]
    fn test_blank_section_is_unknown() {
        let data = format!("{HEADER}S001,Doe,Jane,,,,,,,70,80,90\n");
        let roster = parse_roster(data.as_bytes()).unwrap();
        assert_eq!(roster.records[0].section, UNKNOWN_SECTION);
    }

    #[test]
    fn test_missing_columns_are_absent() {
        let data = "student_id,section,midterm,final\nS001,A,70,80\n";
        let roster = parse_roster(data.as_bytes()).unwrap();

        let record = &roster.records[0];
        assert_eq!(record.midterm, Some(70.0));
        assert_eq!(record.final_exam, Some(80.0));
        assert_eq!(record.quizzes, [None; 5]);
        assert_eq!(record.attendance_percent, None);
    }

    #[test]
    fn test_read_roster_from_file() {
        let path = env::temp_dir().join("grade_rater_test_roster.csv");
        fs::write(&path, format!("{HEADER}S001,Doe,Jane,A,80,,,,,70,80,90\n")).unwrap();

        let roster = read_roster(&path).unwrap();
        assert_eq!(roster.records.len(), 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_roster_missing_file() {
        assert!(read_roster("no/such/roster.csv").is_err());
    }
}
