use crate::analyzers::types::ABSENT_LABEL;
use crate::error::{EngineError, Result};

/// Ordered mapping from letter to minimum numeric threshold.
///
/// Thresholds are strictly descending. The last bucket also catches every
/// grade below its own threshold.
///
/// | Range       | Grade (default scale) |
/// |-------------|-------|
/// | >= 90       | A     |
/// | >= 80       | B     |
/// | >= 70       | C     |
/// | >= 60       | D     |
/// | < 60        | F     |
#[derive(Debug, Clone, PartialEq)]
pub struct GradeScale {
    buckets: Vec<(String, f64)>,
}

impl GradeScale {
    /// Builds a scale from buckets already ordered from highest to lowest threshold.
    pub fn new<I, S>(buckets: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let buckets: Vec<(String, f64)> = buckets
            .into_iter()
            .map(|(letter, threshold)| (letter.into(), threshold))
            .collect();

        if buckets.is_empty() {
            return Err(EngineError::Validation(
                "grade scale must contain at least one letter".into(),
            ));
        }

        for (i, (letter, threshold)) in buckets.iter().enumerate() {
            if letter.is_empty() {
                return Err(EngineError::Validation(
                    "grade scale letters must not be empty".into(),
                ));
            }
            if letter == ABSENT_LABEL {
                return Err(EngineError::Validation(format!(
                    "'{ABSENT_LABEL}' is reserved for absent grades"
                )));
            }
            if !threshold.is_finite() {
                return Err(EngineError::Validation(format!(
                    "threshold for '{letter}' is not a finite number"
                )));
            }
            if buckets[..i].iter().any(|(other, _)| other == letter) {
                return Err(EngineError::Validation(format!(
                    "letter '{letter}' appears more than once in the grade scale"
                )));
            }
            if let Some((prev_letter, prev)) = i.checked_sub(1).map(|j| &buckets[j]) {
                if threshold >= prev {
                    return Err(EngineError::Validation(format!(
                        "thresholds must be strictly descending: '{letter}' ({threshold}) follows '{prev_letter}' ({prev})"
                    )));
                }
            }
        }

        Ok(Self { buckets })
    }

    /// Builds a scale from buckets in any order by sorting thresholds descending.
    pub fn from_unordered<I, S>(buckets: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut buckets: Vec<(String, f64)> = buckets
            .into_iter()
            .map(|(letter, threshold)| (letter.into(), threshold))
            .collect();
        buckets.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self::new(buckets)
    }

    /// Iterates over `(letter, threshold)` from the highest threshold down.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.buckets.iter().map(|(l, t)| (l.as_str(), *t))
    }

    pub fn letters(&self) -> impl Iterator<Item = &str> + '_ {
        self.buckets.iter().map(|(l, _)| l.as_str())
    }

    pub fn contains(&self, letter: &str) -> bool {
        self.letters().any(|l| l == letter)
    }

    /// Letter of the terminal bucket.
    pub fn lowest_letter(&self) -> &str {
        // `new` rejects empty scales
        self.buckets.last().map_or("", |(l, _)| l.as_str())
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        Self {
            buckets: vec![
                ("A".into(), 90.0),
                ("B".into(), 80.0),
                ("C".into(), 70.0),
                ("D".into(), 60.0),
                ("F".into(), 0.0),
            ],
        }
    }
}

/// Converts a numeric grade into a letter from `scale`.
///
/// Intervals are closed below and open above, so a grade equal to a threshold
/// gets that threshold's letter. Returns `None` for an absent grade.
pub fn letter_grade(numeric_grade: Option<f64>, scale: &GradeScale) -> Option<&str> {
    let grade = numeric_grade?;
    let letter = scale
        .iter()
        .find(|&(_, threshold)| grade >= threshold)
        .map_or_else(|| scale.lowest_letter(), |(letter, _)| letter);
    Some(letter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        let scale = GradeScale::default();
        assert_eq!(letter_grade(Some(100.0), &scale), Some("A"));
        assert_eq!(letter_grade(Some(90.0), &scale), Some("A"));
        assert_eq!(letter_grade(Some(89.999), &scale), Some("B"));
        assert_eq!(letter_grade(Some(80.0), &scale), Some("B"));
        assert_eq!(letter_grade(Some(79.99), &scale), Some("C"));
        assert_eq!(letter_grade(Some(70.0), &scale), Some("C"));
        assert_eq!(letter_grade(Some(65.0), &scale), Some("D"));
        assert_eq!(letter_grade(Some(60.0), &scale), Some("D"));
        assert_eq!(letter_grade(Some(55.0), &scale), Some("F"));
        assert_eq!(letter_grade(Some(0.0), &scale), Some("F"));
    }

    #[test]
    fn test_absent_grade_has_no_letter() {
        assert_eq!(letter_grade(None, &GradeScale::default()), None);
    }

    #[test]
    fn test_below_every_threshold_falls_into_lowest_bucket() {
        let scale = GradeScale::new([("Pass", 50.0), ("Fail", 20.0)]).unwrap();
        assert_eq!(letter_grade(Some(10.0), &scale), Some("Fail"));
        assert_eq!(letter_grade(Some(20.0), &scale), Some("Fail"));
        assert_eq!(letter_grade(Some(50.0), &scale), Some("Pass"));
    }

    #[test]
    fn test_new_rejects_bad_scales() {
        let empty: [(&str, f64); 0] = [];
        assert!(GradeScale::new(empty).is_err());
        assert!(GradeScale::new([("A", 80.0), ("B", 90.0)]).is_err());
        assert!(GradeScale::new([("A", 80.0), ("B", 80.0)]).is_err());
        assert!(GradeScale::new([("A", 90.0), ("A", 80.0)]).is_err());
        assert!(GradeScale::new([("", 90.0)]).is_err());
        assert!(GradeScale::new([("A", f64::NAN)]).is_err());
    }

    #[test]
    fn test_absent_label_is_not_a_letter() {
        let err = GradeScale::new([("P", 50.0), (ABSENT_LABEL, 0.0)]).unwrap_err();
        assert!(matches!(err, EngineError::Validation(msg) if msg.contains("reserved")));
        assert!(GradeScale::from_unordered([(ABSENT_LABEL, 0.0)]).is_err());
    }

    #[test]
    fn test_from_unordered_sorts_descending() {
        let scale =
            GradeScale::from_unordered([("D", 60.0), ("A", 90.0), ("F", 0.0), ("C", 70.0), ("B", 80.0)])
                .unwrap();
        assert_eq!(scale, GradeScale::default());
        assert_eq!(scale.letters().collect::<Vec<_>>(), ["A", "B", "C", "D", "F"]);
        assert_eq!(scale.lowest_letter(), "F");
        assert!(scale.contains("C"));
        assert!(!scale.contains("E"));
    }
}
