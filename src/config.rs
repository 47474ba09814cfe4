//! Course configuration loaded from a JSON file.
//!
//! ```json
//! {
//!   "weights": {"quizzes": 0.2, "midterm": 0.3, "final": 0.4, "attendance": 0.1},
//!   "thresholds": {"at_risk": 60.0, "excellence": 90.0},
//!   "grade_scale": {"A": 90, "B": 80, "C": 70, "D": 60, "F": 0},
//!   "paths": {"input_folder": "data", "output_folder": "output"}
//! }
//! ```

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::analyzers::calculator::WeightConfig;
use crate::analyzers::grade::GradeScale;
use crate::analyzers::report::Thresholds;

/// Tolerance when checking that the weights add up to 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Paths {
    #[serde(default = "default_input_folder")]
    pub input_folder: PathBuf,
    #[serde(default = "default_output_folder")]
    pub output_folder: PathBuf,
}

fn default_input_folder() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_folder() -> PathBuf {
    PathBuf::from("output")
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            input_folder: default_input_folder(),
            output_folder: default_output_folder(),
        }
    }
}

impl Paths {
    /// Roster CSV expected inside the input folder.
    pub fn input_file(&self) -> PathBuf {
        self.input_folder.join("input.csv")
    }
}

#[derive(Deserialize)]
struct RawConfig {
    weights: WeightConfig,
    thresholds: Thresholds,
    grade_scale: HashMap<String, f64>,
    #[serde(default)]
    paths: Paths,
}

/// Validated configuration handed to the engine piece by piece.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub weights: WeightConfig,
    pub thresholds: Thresholds,
    pub grade_scale: GradeScale,
    pub paths: Paths,
}

impl Config {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("invalid config '{}'", path.display()))?;
        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(content)?;

        raw.weights.validate()?;
        let total = raw.weights.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            warn!(
                total,
                "Weights do not sum to 1.0; final grades are a literal weighted sum"
            );
        }

        for (name, value) in [
            ("at_risk", raw.thresholds.at_risk),
            ("excellence", raw.thresholds.excellence),
        ] {
            if !value.is_finite() {
                bail!("threshold '{name}' must be a finite number");
            }
        }

        let grade_scale = GradeScale::from_unordered(raw.grade_scale)?;

        Ok(Self {
            weights: raw.weights,
            thresholds: raw.thresholds,
            grade_scale,
            paths: raw.paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    const SAMPLE: &str = r#"{
        "weights": {"quizzes": 0.2, "midterm": 0.3, "final": 0.4, "attendance": 0.1},
        "thresholds": {"at_risk": 60.0, "excellence": 92.5},
        "grade_scale": {"C": 70, "A": 90, "F": 0, "B": 80, "D": 60},
        "paths": {"input_folder": "in", "output_folder": "out"}
    }"#;

    #[test]
    fn test_from_json() {
        let config = Config::from_json(SAMPLE).unwrap();

        assert_eq!(config.weights, WeightConfig::default());
        assert_eq!(config.thresholds.at_risk, 60.0);
        assert_eq!(config.thresholds.excellence, 92.5);
        assert_eq!(config.grade_scale, GradeScale::default());
        assert_eq!(config.paths.input_file(), PathBuf::from("in").join("input.csv"));
        assert_eq!(config.paths.output_folder, PathBuf::from("out"));
    }

    #[test]
    fn test_optional_sections_default() {
        let config = Config::from_json(
            r#"{
                "weights": {"quizzes": 0.25, "midterm": 0.25, "final": 0.25, "attendance": 0.25},
                "thresholds": {"at_risk": 55},
                "grade_scale": {"P": 50, "F": 0}
            }"#,
        )
        .unwrap();

        assert_eq!(config.thresholds.excellence, 90.0);
        assert_eq!(config.paths, Paths::default());
        assert_eq!(config.grade_scale.letters().collect::<Vec<_>>(), ["P", "F"]);
    }

    #[test]
    fn test_weights_not_summing_to_one_are_accepted() {
        let config = Config::from_json(
            r#"{
                "weights": {"quizzes": 0.5, "midterm": 0.5, "final": 0.5, "attendance": 0.5},
                "thresholds": {"at_risk": 60},
                "grade_scale": {"A": 90, "F": 0}
            }"#,
        )
        .unwrap();
        assert_eq!(config.weights.total(), 2.0);
    }

    #[test]
    fn test_rejects_negative_weight() {
        let result = Config::from_json(
            r#"{
                "weights": {"quizzes": -0.2, "midterm": 0.5, "final": 0.6, "attendance": 0.1},
                "thresholds": {"at_risk": 60},
                "grade_scale": {"A": 90, "F": 0}
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_duplicate_thresholds() {
        let result = Config::from_json(
            r#"{
                "weights": {"quizzes": 0.2, "midterm": 0.3, "final": 0.4, "attendance": 0.1},
                "thresholds": {"at_risk": 60},
                "grade_scale": {"A": 90, "B": 90, "F": 0}
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_missing_weights() {
        assert!(Config::from_json(r#"{"thresholds": {"at_risk": 60}, "grade_scale": {}}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = env::temp_dir().join("grade_rater_test_config.json");
        fs::write(&path, SAMPLE).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.grade_scale.lowest_letter(), "F");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}
