use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzers::grade::GradeScale;
use crate::analyzers::roster::{
    grade_distribution, identify_at_risk, identify_excelling, section_comparison, top_performers,
};
use crate::analyzers::stats::{compute_stats, find_outliers};
use crate::analyzers::types::{GradeDistribution, SectionComparison, StatisticalSummary};
use crate::record::{Field, StudentRecord};

/// Grade cut-offs used to flag students.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Thresholds {
    /// Final grades strictly below this are at risk.
    pub at_risk: f64,
    /// Final grades at or above this are excelling.
    #[serde(default = "default_excellence")]
    pub excellence: f64,
}

fn default_excellence() -> f64 {
    90.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            at_risk: 60.0,
            excellence: default_excellence(),
        }
    }
}

/// One student as listed in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub student_id: String,
    pub name: String,
    pub section: String,
    pub final_grade: Option<f64>,
    pub letter_grade: Option<String>,
}

impl From<&StudentRecord> for ReportEntry {
    fn from(r: &StudentRecord) -> Self {
        ReportEntry {
            student_id: r.student_id.clone(),
            name: r.full_name(),
            section: r.section.clone(),
            final_grade: r.final_grade,
            letter_grade: r.letter_grade.clone(),
        }
    }
}

/// IQR outliers of the final grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub lower_fence: f64,
    pub upper_fence: f64,
    pub students: Vec<ReportEntry>,
}

/// Everything the engine derives from a graded roster, ready to render or
/// serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseReport {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub students: usize,
    /// `None` when no student has a final grade.
    pub overall: Option<StatisticalSummary>,
    pub distribution: GradeDistribution,
    pub sections: SectionComparison,
    pub outliers: Option<OutlierReport>,
    pub at_risk_threshold: f64,
    pub at_risk: Vec<ReportEntry>,
    pub excellence_threshold: f64,
    pub excelling: Vec<ReportEntry>,
    pub top_performers: Vec<ReportEntry>,
}

/// Builds a [`CourseReport`] from already graded records.
///
/// An empty roster (or one where nobody has a final grade) is not an error:
/// the overall summary and outliers are simply `None`.
pub fn build_report(
    records: &[StudentRecord],
    scale: &GradeScale,
    thresholds: &Thresholds,
    top_n: usize,
    generated_at: DateTime<Utc>,
) -> CourseReport {
    let entries = |rs: Vec<&StudentRecord>| -> Vec<ReportEntry> {
        rs.into_iter().map(ReportEntry::from).collect()
    };

    // both fail only when nobody has a final grade
    let overall = compute_stats(records, Field::FinalGrade).ok();

    let outliers = find_outliers(records, Field::FinalGrade)
        .ok()
        .map(|set| OutlierReport {
            lower_fence: set.lower_fence,
            upper_fence: set.upper_fence,
            students: entries(set.records),
        });

    CourseReport {
        schema_version: 1,
        generated_at,
        students: records.len(),
        overall,
        distribution: grade_distribution(records, scale),
        sections: section_comparison(records, Field::FinalGrade),
        outliers,
        at_risk_threshold: thresholds.at_risk,
        at_risk: entries(identify_at_risk(records, thresholds.at_risk)),
        excellence_threshold: thresholds.excellence,
        excelling: entries(identify_excelling(records, thresholds.excellence)),
        top_performers: entries(top_performers(records, Field::FinalGrade, top_n)),
    }
}
