//! Per-record grade computation.
//!
//! All functions are pure; weights and the grade scale are always passed in.

use serde::Deserialize;
use tracing::debug;

use crate::analyzers::grade::{GradeScale, letter_grade};
use crate::error::{EngineError, Result};
use crate::record::{MAX_QUIZZES, StudentRecord, in_score_range};

/// Weights applied to each grade component.
///
/// The weights are expected to sum to 1.0 but this is not enforced here;
/// callers that load them from configuration warn when they do not.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WeightConfig {
    pub quizzes: f64,
    pub midterm: f64,
    #[serde(rename = "final")]
    pub final_exam: f64,
    pub attendance: f64,
}

impl WeightConfig {
    pub fn total(&self) -> f64 {
        self.quizzes + self.midterm + self.final_exam + self.attendance
    }

    /// Rejects negative or non-finite weights.
    pub fn validate(&self) -> Result<()> {
        for (name, w) in [
            ("quizzes", self.quizzes),
            ("midterm", self.midterm),
            ("final", self.final_exam),
            ("attendance", self.attendance),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(EngineError::Validation(format!(
                    "weight '{name}' must be a non-negative number, got {w}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            quizzes: 0.20,
            midterm: 0.30,
            final_exam: 0.40,
            attendance: 0.10,
        }
    }
}

fn check_score(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !in_score_range(v) => Err(EngineError::Validation(format!(
            "{name} out of range (0-100): {v}"
        ))),
        _ => Ok(()),
    }
}

/// Mean of the present quiz scores, or `None` when every score is absent.
///
/// Absent scores are skipped, never counted as zero.
pub fn compute_quiz_average(scores: &[Option<f64>]) -> Result<Option<f64>> {
    if scores.len() > MAX_QUIZZES {
        return Err(EngineError::Validation(format!(
            "at most {MAX_QUIZZES} quiz scores are supported, got {}",
            scores.len()
        )));
    }

    let mut sum = 0.0;
    let mut count = 0usize;
    for (i, score) in scores.iter().enumerate() {
        check_score(&format!("quiz{}", i + 1), *score)?;
        if let Some(v) = score {
            sum += v;
            count += 1;
        }
    }

    if count == 0 {
        return Ok(None);
    }
    Ok(Some(sum / count as f64))
}

/// Weighted final grade: `Σ weight_i * value_i` over the present components.
///
/// Midterm and final are required; if either is absent the result is `None`.
/// An absent quiz average or attendance simply contributes nothing. The
/// remaining weights are NOT renormalized: a student missing attendance gets
/// at most `1 - weights.attendance` of the full scale. Callers who want
/// renormalization must adjust the weights before calling.
pub fn compute_final_grade(
    quiz_avg: Option<f64>,
    midterm: Option<f64>,
    final_exam: Option<f64>,
    attendance: Option<f64>,
    weights: &WeightConfig,
) -> Result<Option<f64>> {
    weights.validate()?;
    check_score("quiz average", quiz_avg)?;
    check_score("midterm", midterm)?;
    check_score("final", final_exam)?;
    check_score("attendance", attendance)?;

    let (Some(midterm), Some(final_exam)) = (midterm, final_exam) else {
        return Ok(None);
    };

    let mut grade = midterm * weights.midterm + final_exam * weights.final_exam;
    if let Some(q) = quiz_avg {
        grade += q * weights.quizzes;
    }
    if let Some(a) = attendance {
        grade += a * weights.attendance;
    }

    Ok(Some(grade))
}

/// Point change from midterm to final, `None` unless both are present.
pub fn compute_improvement(midterm: Option<f64>, final_exam: Option<f64>) -> Option<f64> {
    Some(final_exam? - midterm?)
}

/// Returns a copy of `record` with every derived field computed.
pub fn grade_record(
    record: &StudentRecord,
    weights: &WeightConfig,
    scale: &GradeScale,
) -> Result<StudentRecord> {
    let with_id = |e: EngineError| match e {
        EngineError::Validation(msg) => {
            EngineError::Validation(format!("student {}: {msg}", record.student_id))
        }
        other => other,
    };

    let quiz_average = compute_quiz_average(&record.quizzes).map_err(with_id)?;
    let final_grade = compute_final_grade(
        quiz_average,
        record.midterm,
        record.final_exam,
        record.attendance_percent,
        weights,
    )
    .map_err(with_id)?;

    Ok(StudentRecord {
        quiz_average,
        final_grade,
        letter_grade: letter_grade(final_grade, scale).map(str::to_string),
        improvement: compute_improvement(record.midterm, record.final_exam),
        ..record.clone()
    })
}

/// Grades every record in `records`, preserving order.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn grade_roster(
    records: &[StudentRecord],
    weights: &WeightConfig,
    scale: &GradeScale,
) -> Result<Vec<StudentRecord>> {
    let graded = records
        .iter()
        .map(|r| grade_record(r, weights, scale))
        .collect::<Result<Vec<_>>>()?;

    let ungraded = graded.iter().filter(|r| r.final_grade.is_none()).count();
    debug!(graded = graded.len() - ungraded, ungraded, "Roster graded");

    Ok(graded)
}
