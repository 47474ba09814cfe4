//! Student records and the numeric fields the statistics engine can select.

use serde::Serialize;
use std::fmt;

/// Maximum number of quiz slots a record carries.
pub const MAX_QUIZZES: usize = 5;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Section label used when a record does not name one.
pub const UNKNOWN_SECTION: &str = "Unknown";

/// Returns true if `value` is a finite score within `[0, 100]`.
pub fn in_score_range(value: f64) -> bool {
    value.is_finite() && (SCORE_MIN..=SCORE_MAX).contains(&value)
}

/// One student's raw scores plus the fields derived by the grade calculator.
///
/// Every score is optional: `None` means the value is absent, which is never
/// the same thing as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentRecord {
    pub student_id: String,
    pub last_name: String,
    pub first_name: String,
    pub section: String,

    // raw scores
    pub quizzes: [Option<f64>; MAX_QUIZZES],
    pub midterm: Option<f64>,
    pub final_exam: Option<f64>,
    pub attendance_percent: Option<f64>,

    // derived by the calculator
    pub quiz_average: Option<f64>,
    pub final_grade: Option<f64>,
    pub letter_grade: Option<String>,
    pub improvement: Option<f64>,
}

impl StudentRecord {
    pub fn new(student_id: &str, section: &str) -> Self {
        StudentRecord {
            student_id: student_id.to_string(),
            section: section.to_string(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, first_name: &str, last_name: &str) -> Self {
        self.first_name = first_name.to_string();
        self.last_name = last_name.to_string();
        self
    }

    /// Fills quiz slots in order. Scores past [`MAX_QUIZZES`] are ignored.
    pub fn with_quizzes<I>(mut self, scores: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        self.quizzes = [None; MAX_QUIZZES];
        for (slot, score) in self.quizzes.iter_mut().zip(scores) {
            *slot = score;
        }
        self
    }

    pub fn with_exams(mut self, midterm: Option<f64>, final_exam: Option<f64>) -> Self {
        self.midterm = midterm;
        self.final_exam = final_exam;
        self
    }

    pub fn with_attendance(mut self, attendance_percent: Option<f64>) -> Self {
        self.attendance_percent = attendance_percent;
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Replaces every raw score outside `[0, 100]` with `None`.
    ///
    /// Returns the cleaned record together with one warning per value that was
    /// dropped. Values are never clamped.
    pub fn normalized(mut self) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let id = self.student_id.clone();

        let mut check = |name: String, slot: &mut Option<f64>| {
            if let Some(v) = *slot {
                if !in_score_range(v) {
                    warnings.push(format!(
                        "student {id}: {name} out of range (0-100): {v}, treated as absent"
                    ));
                    *slot = None;
                }
            }
        };

        for (i, quiz) in self.quizzes.iter_mut().enumerate() {
            check(format!("quiz{}", i + 1), quiz);
        }
        check("midterm".to_string(), &mut self.midterm);
        check("final".to_string(), &mut self.final_exam);
        check("attendance_percent".to_string(), &mut self.attendance_percent);

        (self, warnings)
    }
}

/// Numeric field of a [`StudentRecord`] that statistics can be computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    QuizAverage,
    Midterm,
    Final,
    Attendance,
    FinalGrade,
    Improvement,
}

impl Field {
    /// Reads this field from `record`, `None` if absent.
    pub fn value(self, record: &StudentRecord) -> Option<f64> {
        match self {
            Field::QuizAverage => record.quiz_average,
            Field::Midterm => record.midterm,
            Field::Final => record.final_exam,
            Field::Attendance => record.attendance_percent,
            Field::FinalGrade => record.final_grade,
            Field::Improvement => record.improvement,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::QuizAverage => "quiz_average",
            Field::Midterm => "midterm",
            Field::Final => "final",
            Field::Attendance => "attendance_percent",
            Field::FinalGrade => "final_grade",
            Field::Improvement => "improvement",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
