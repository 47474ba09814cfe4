//! Value structures produced by the statistics engine and handed to reporting.

use serde::Serialize;

use crate::record::{Field, StudentRecord};

/// Label used for students without a computed letter grade.
pub const ABSENT_LABEL: &str = "N/A";

/// Central tendency and dispersion of the present values of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticalSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; 0 when `count <= 1`.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Records whose value lies outside `[lower_fence, upper_fence]`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierSet<'a> {
    pub field: Field,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Outlying records in input order.
    pub records: Vec<&'a StudentRecord>,
}

impl OutlierSet<'_> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| self.field.value(r))
            .collect()
    }
}

/// Count of students per letter, in grade-scale order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeDistribution {
    pub(crate) counts: Vec<(String, usize)>,
    pub(crate) absent: usize,
    pub(crate) total: usize,
}

impl GradeDistribution {
    pub fn count(&self, letter: &str) -> usize {
        if letter == ABSENT_LABEL {
            return self.absent;
        }
        self.counts
            .iter()
            .find(|(l, _)| l == letter)
            .map_or(0, |(_, c)| *c)
    }

    /// Students without a computed letter grade.
    pub fn absent(&self) -> usize {
        self.absent
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Share of the roster holding `letter`, in percent. 0 for an empty roster.
    pub fn percentage(&self, letter: &str) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.count(letter) as f64 / self.total as f64) * 100.0
        }
    }

    /// Iterates `(letter, count)` in scale order, followed by the absent bucket
    /// when at least one student has no grade.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        let absent = (self.absent > 0).then_some((ABSENT_LABEL, self.absent));
        self.counts
            .iter()
            .map(|(l, c)| (l.as_str(), *c))
            .chain(absent)
    }
}

/// Statistics for one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionStats {
    pub section: String,
    /// Number of records in the section, with or without a value.
    pub students: usize,
    /// `None` when no record in the section has a present value.
    pub summary: Option<StatisticalSummary>,
}

/// Per-section summaries in first-seen section order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionComparison {
    pub field: Field,
    pub sections: Vec<SectionStats>,
}

impl SectionComparison {
    pub fn get(&self, section: &str) -> Option<&SectionStats> {
        self.sections.iter().find(|s| s.section == section)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.sections.iter().map(|s| s.section.as_str())
    }
}
