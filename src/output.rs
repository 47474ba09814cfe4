//! Report rendering and export for graded rosters.
//!
//! Console reports go through `tracing` events; exports are CSV per section,
//! an at-risk CSV and a JSON summary.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::analyzers::report::{CourseReport, OutlierReport, ReportEntry};
use crate::analyzers::types::{SectionComparison, StatisticalSummary};
use crate::record::StudentRecord;

/// Full CSV row for a graded record.
#[derive(Serialize)]
struct RecordRow<'a> {
    student_id: &'a str,
    last_name: &'a str,
    first_name: &'a str,
    section: &'a str,
    quiz1: Option<f64>,
    quiz2: Option<f64>,
    quiz3: Option<f64>,
    quiz4: Option<f64>,
    quiz5: Option<f64>,
    midterm: Option<f64>,
    #[serde(rename = "final")]
    final_exam: Option<f64>,
    attendance_percent: Option<f64>,
    quiz_average: Option<f64>,
    final_grade: Option<f64>,
    letter_grade: Option<&'a str>,
    improvement: Option<f64>,
}

impl<'a> From<&'a StudentRecord> for RecordRow<'a> {
    fn from(r: &'a StudentRecord) -> Self {
        let [quiz1, quiz2, quiz3, quiz4, quiz5] = r.quizzes;
        RecordRow {
            student_id: &r.student_id,
            last_name: &r.last_name,
            first_name: &r.first_name,
            section: &r.section,
            quiz1,
            quiz2,
            quiz3,
            quiz4,
            quiz5,
            midterm: r.midterm,
            final_exam: r.final_exam,
            attendance_percent: r.attendance_percent,
            quiz_average: r.quiz_average,
            final_grade: r.final_grade,
            letter_grade: r.letter_grade.as_deref(),
            improvement: r.improvement,
        }
    }
}

/// Reduced CSV row for the at-risk list.
#[derive(Serialize)]
struct AtRiskRow<'a> {
    student_id: &'a str,
    last_name: &'a str,
    first_name: &'a str,
    section: &'a str,
    final_grade: Option<f64>,
    letter_grade: Option<&'a str>,
    attendance_percent: Option<f64>,
}

impl<'a> From<&'a StudentRecord> for AtRiskRow<'a> {
    fn from(r: &'a StudentRecord) -> Self {
        AtRiskRow {
            student_id: &r.student_id,
            last_name: &r.last_name,
            first_name: &r.first_name,
            section: &r.section,
            final_grade: r.final_grade,
            letter_grade: r.letter_grade.as_deref(),
            attendance_percent: r.attendance_percent,
        }
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn log_stats(label: &str, summary: &StatisticalSummary) {
    info!(
        "{label:<10} count={:<4} mean={:.2} median={:.2} std={:.2} min={:.2} max={:.2}",
        summary.count, summary.mean, summary.median, summary.std_dev, summary.min, summary.max
    );
}

/// Logs the overall statistics and the letter distribution.
pub fn log_summary(report: &CourseReport) {
    info!(students = report.students, "Course summary");
    match &report.overall {
        Some(summary) => log_stats("overall", summary),
        None => warn!("No valid grades to compute statistics"),
    }
    for (letter, count) in report.distribution.iter() {
        info!(
            "{letter:<4} {count:>4} ({:.1}%)",
            report.distribution.percentage(letter)
        );
    }
}

/// Logs one line per section in first-seen order.
pub fn log_section_comparison(comparison: &SectionComparison) {
    info!(field = %comparison.field, "Section comparison");
    for section in &comparison.sections {
        match &section.summary {
            Some(summary) => log_stats(&section.section, summary),
            None => info!(
                "{:<10} count=0    no {} values",
                section.section, comparison.field
            ),
        }
    }
}

/// Logs a titled list of students with their final grades.
pub fn log_student_list(title: &str, entries: &[ReportEntry]) {
    info!(count = entries.len(), "{title}");
    for e in entries {
        info!(
            "{:<10} {:<25} {:<10} {:<8} {}",
            e.student_id,
            e.name,
            e.section,
            fmt_opt(e.final_grade),
            e.letter_grade.as_deref().unwrap_or("N/A")
        );
    }
}

pub fn log_outliers(outliers: Option<&OutlierReport>) {
    let Some(outliers) = outliers else {
        return;
    };
    if outliers.students.is_empty() {
        debug!("No grade outliers");
        return;
    }
    let grades: Vec<String> = outliers
        .students
        .iter()
        .map(|e| fmt_opt(e.final_grade))
        .collect();
    info!(
        lower_fence = outliers.lower_fence,
        upper_fence = outliers.upper_fence,
        "Found {} outlier grades (IQR method): {}",
        grades.len(),
        grades.join(", ")
    );
}

/// Logs the report as pretty-printed JSON.
pub fn log_json(report: &CourseReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn write_rows<T, I>(path: &Path, rows: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;

    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = count, "CSV written");
    Ok(count)
}

/// Writes every record to a CSV file with headers.
///
/// Returns `false` without touching the filesystem when `records` is empty.
pub fn export_records(path: impl AsRef<Path>, records: &[StudentRecord]) -> Result<bool> {
    let refs: Vec<&StudentRecord> = records.iter().collect();
    export_record_refs(path.as_ref(), &refs)
}

fn export_record_refs(path: &Path, records: &[&StudentRecord]) -> Result<bool> {
    if records.is_empty() {
        info!(path = %path.display(), "No records to export");
        return Ok(false);
    }
    let count = write_rows(path, records.iter().map(|r| RecordRow::from(*r)))?;
    info!(path = %path.display(), count, "Exported records");
    Ok(true)
}

/// Writes the reduced at-risk column set.
pub fn export_at_risk(path: impl AsRef<Path>, records: &[&StudentRecord]) -> Result<bool> {
    let path = path.as_ref();
    if records.is_empty() {
        info!(path = %path.display(), "No at-risk students to export");
        return Ok(false);
    }
    let count = write_rows(path, records.iter().map(|r| AtRiskRow::from(*r)))?;
    info!(path = %path.display(), count, "Exported at-risk list");
    Ok(true)
}

/// File-system safe stem for a section label.
fn section_file_name(section: &str) -> String {
    let safe: String = section
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("section_{safe}")
}

/// Writes one `section_<label>.csv` per section, in first-seen order.
///
/// Labels that sanitize to the same file name get a numeric suffix
/// (`section_B_2_2.csv`) so no section overwrites another.
/// Returns the number of files written.
pub fn export_by_section(dir: impl AsRef<Path>, records: &[StudentRecord]) -> Result<usize> {
    let dir = dir.as_ref();
    let mut sections: Vec<(&str, Vec<&StudentRecord>)> = Vec::new();
    for record in records {
        match sections.iter_mut().find(|(s, _)| *s == record.section) {
            Some((_, members)) => members.push(record),
            None => sections.push((&record.section, vec![record])),
        }
    }

    let mut used: HashSet<String> = HashSet::new();
    let mut written = 0;
    for (section, members) in &sections {
        let base = section_file_name(section);
        let mut file_name = format!("{base}.csv");
        let mut n = 2;
        while !used.insert(file_name.clone()) {
            file_name = format!("{base}_{n}.csv");
            n += 1;
        }
        if n > 2 {
            warn!(section = *section, file = %file_name, "Section file name already taken, using suffix");
        }
        if export_record_refs(&dir.join(&file_name), members)? {
            written += 1;
        }
    }
    Ok(written)
}

/// Writes the report as pretty-printed JSON, creating parent directories.
pub fn write_report_json(path: impl AsRef<Path>, report: &CourseReport) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(report)?;
    fs::write(path, body).with_context(|| format!("failed to write '{}'", path.display()))?;
    info!(path = %path.display(), "Report written");
    Ok(())
}
