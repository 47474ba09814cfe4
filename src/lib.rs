pub mod analyzers;
pub mod config;
pub mod error;
pub mod ingest;
pub mod output;
pub mod record;

pub use analyzers::calculator::{
    WeightConfig, compute_final_grade, compute_improvement, compute_quiz_average, grade_record,
    grade_roster,
};
pub use analyzers::grade::{GradeScale, letter_grade};
pub use analyzers::report::{CourseReport, Thresholds, build_report};
pub use analyzers::roster::{
    grade_distribution, identify_at_risk, identify_excelling, section_comparison, top_performers,
};
pub use analyzers::stats::{
    OutlierMethod, compute_percentile, compute_stats, find_outliers, find_outliers_with,
};
pub use analyzers::types::{
    GradeDistribution, OutlierSet, SectionComparison, SectionStats, StatisticalSummary,
};
pub use error::EngineError;
pub use record::{Field, StudentRecord};
