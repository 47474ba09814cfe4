//! Whole-roster views: letter distribution, at-risk and excelling students,
//! per-section comparison and rankings.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::analyzers::grade::GradeScale;
use crate::analyzers::stats::summarize;
use crate::analyzers::types::{GradeDistribution, SectionComparison, SectionStats};
use crate::record::{Field, StudentRecord};

/// Counts students per letter in `scale` order.
///
/// Students without a letter grade, or whose letter is not part of `scale`,
/// are counted in the absent bucket.
pub fn grade_distribution(records: &[StudentRecord], scale: &GradeScale) -> GradeDistribution {
    let mut counts: Vec<(String, usize)> = scale.letters().map(|l| (l.to_string(), 0)).collect();
    let mut absent = 0;

    for record in records {
        let slot = match record.letter_grade.as_deref() {
            Some(letter) => counts.iter_mut().find(|(l, _)| l == letter),
            None => None,
        };
        match slot {
            Some((_, count)) => *count += 1,
            None => absent += 1,
        }
    }

    GradeDistribution {
        counts,
        absent,
        total: records.len(),
    }
}

fn by_grade_then_id(a: &StudentRecord, b: &StudentRecord, grade: Field, descending: bool) -> Ordering {
    // callers filter out absent grades first
    let (va, vb) = (grade.value(a).unwrap_or(f64::NAN), grade.value(b).unwrap_or(f64::NAN));
    let by_value = if descending {
        vb.total_cmp(&va)
    } else {
        va.total_cmp(&vb)
    };
    by_value.then_with(|| a.student_id.cmp(&b.student_id))
}

/// Students whose final grade is present and strictly below `threshold`,
/// lowest grade first, ties by identifier.
pub fn identify_at_risk(records: &[StudentRecord], threshold: f64) -> Vec<&StudentRecord> {
    let mut at_risk: Vec<&StudentRecord> = records
        .iter()
        .filter(|r| r.final_grade.is_some_and(|g| g < threshold))
        .collect();
    at_risk.sort_by(|a, b| by_grade_then_id(a, b, Field::FinalGrade, false));

    debug!(threshold, at_risk = at_risk.len(), "At-risk students identified");
    at_risk
}

/// Students whose final grade is present and at least `threshold`,
/// highest grade first, ties by identifier.
pub fn identify_excelling(records: &[StudentRecord], threshold: f64) -> Vec<&StudentRecord> {
    let mut excelling: Vec<&StudentRecord> = records
        .iter()
        .filter(|r| r.final_grade.is_some_and(|g| g >= threshold))
        .collect();
    excelling.sort_by(|a, b| by_grade_then_id(a, b, Field::FinalGrade, true));
    excelling
}

/// Summarizes `field` per section, sections in the order they first appear.
///
/// A section whose records all lack `field` gets a `None` summary rather
/// than failing the whole comparison.
pub fn section_comparison(records: &[StudentRecord], field: Field) -> SectionComparison {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, usize, Vec<f64>)> = Vec::new();

    for record in records {
        let i = *index.entry(record.section.as_str()).or_insert_with(|| {
            groups.push((record.section.as_str(), 0, Vec::new()));
            groups.len() - 1
        });
        let (_, students, values) = &mut groups[i];
        *students += 1;
        if let Some(v) = field.value(record) {
            values.push(v);
        }
    }

    let sections = groups
        .into_iter()
        .map(|(section, students, values)| SectionStats {
            section: section.to_string(),
            students,
            summary: summarize(&values, field).ok(),
        })
        .collect();

    SectionComparison { field, sections }
}

/// The `n` records with the highest present `field`, descending, ties by
/// identifier. Returns fewer than `n` when fewer records have a value.
pub fn top_performers(records: &[StudentRecord], field: Field, n: usize) -> Vec<&StudentRecord> {
    let mut ranked: Vec<&StudentRecord> = records
        .iter()
        .filter(|r| field.value(r).is_some())
        .collect();
    ranked.sort_by(|a, b| by_grade_then_id(a, b, field, true));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::ABSENT_LABEL;

    #[test]
    fn test_grade_distribution_follows_scale_order() {
        let records = vec![
            graded("s1", "A", Some(95.0), Some("A")),
            graded("s2", "A", Some(55.0), Some("F")),
            graded("s3", "A", Some(58.0), Some("F")),
            graded("s4", "A", Some(82.0), Some("B")),
        ];
        let dist = grade_distribution(&records, &GradeScale::default());

        let entries: Vec<_> = dist.iter().collect();
        assert_eq!(entries, [("A", 1), ("B", 1), ("C", 0), ("D", 0), ("F", 2)]);
        assert_eq!(dist.absent(), 0);
        assert_eq!(dist.total(), 4);
        assert_eq!(dist.percentage("F"), 50.0);
    }

    #[test]
    fn test_grade_distribution_counts_absent() {
        let records = vec![
            graded("s1", "A", Some(95.0), Some("A")),
            graded("s2", "A", None, None),
            graded("s3", "A", Some(70.0), Some("Z")),
        ];
        let dist = grade_distribution(&records, &GradeScale::default());

        assert_eq!(dist.count("A"), 1);
        assert_eq!(dist.count(ABSENT_LABEL), 2);
        assert_eq!(dist.iter().last(), Some((ABSENT_LABEL, 2)));
    }

    #[test]
    fn test_grade_distribution_empty_roster() {
        let dist = grade_distribution(&[], &GradeScale::default());
        assert_eq!(dist.total(), 0);
        assert_eq!(dist.percentage("A"), 0.0);
        assert_eq!(dist.iter().count(), 5);
    }

    #[test]
    fn test_identify_at_risk_orders_by_grade_then_id() {
        let records = vec![
            graded("s3", "A", Some(55.0), Some("F")),
            graded("s1", "A", Some(72.0), Some("C")),
            graded("s2", "A", Some(40.0), Some("F")),
            graded("s0", "A", Some(55.0), Some("F")),
            graded("s4", "A", None, None),
            graded("s5", "A", Some(60.0), Some("D")),
        ];
        let at_risk = identify_at_risk(&records, 60.0);
        assert_eq!(ids(&at_risk), ["s2", "s0", "s3"]);
    }

    #[test]
    fn test_identify_excelling() {
        let records = vec![
            graded("s1", "A", Some(90.0), Some("A")),
            graded("s2", "A", Some(97.0), Some("A")),
            graded("s3", "A", Some(89.0), Some("B")),
            graded("s4", "A", None, None),
        ];
        assert_eq!(ids(&identify_excelling(&records, 90.0)), ["s2", "s1"]);
    }

    #[test]
    fn test_section_comparison_first_seen_order() {
        let records = vec![
            graded("s1", "B", Some(80.0), Some("B")),
            graded("s2", "A", Some(70.0), Some("C")),
            graded("s3", "C", None, None),
            graded("s4", "B", Some(90.0), Some("A")),
            graded("s5", "A", Some(60.0), Some("D")),
        ];
        let comparison = section_comparison(&records, Field::FinalGrade);

        assert_eq!(comparison.labels().collect::<Vec<_>>(), ["B", "A", "C"]);
        let b = comparison.get("B").unwrap();
        assert_eq!(b.students, 2);
        assert_eq!(b.summary.as_ref().unwrap().mean, 85.0);
        let c = comparison.get("C").unwrap();
        assert_eq!(c.students, 1);
        assert_eq!(c.summary, None);
    }

    #[test]
    fn test_section_comparison_empty_roster() {
        assert!(section_comparison(&[], Field::Final).sections.is_empty());
    }

    #[test]
    fn test_top_performers_tie_break_by_id() {
        let records: Vec<_> = [("e", 95.0), ("d", 70.0), ("c", 88.0), ("b", 60.0), ("a", 95.0)]
            .iter()
            .map(|(id, f)| StudentRecord::new(id, "A").with_exams(Some(50.0), Some(*f)))
            .collect();

        let top = top_performers(&records, Field::Final, 3);
        assert_eq!(ids(&top), ["a", "e", "c"]);
    }

    #[test]
    fn test_top_performers_fewer_than_n() {
        let records = vec![
            graded("s1", "A", Some(80.0), Some("B")),
            graded("s2", "A", None, None),
        ];
        let top = top_performers(&records, Field::FinalGrade, 10);
        assert_eq!(ids(&top), ["s1"]);
        assert!(top_performers(&records, Field::FinalGrade, 0).is_empty());
    }

    // Helper functions for tests
    fn graded(id: &str, section: &str, grade: Option<f64>, letter: Option<&str>) -> StudentRecord {
        StudentRecord {
            final_grade: grade,
            letter_grade: letter.map(str::to_string),
            ..StudentRecord::new(id, section)
        }
    }

    fn ids<'a>(records: &[&'a StudentRecord]) -> Vec<&'a str> {
        records.iter().map(|r| r.student_id.as_str()).collect()
    }
}
