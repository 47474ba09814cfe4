//! Descriptive statistics, percentiles and outlier detection over one field
//! of a roster.

use tracing::debug;

use crate::analyzers::types::{OutlierSet, StatisticalSummary};
use crate::analyzers::utility::{mean, median_sorted, percentile_sorted, sample_stddev, sorted};
use crate::error::{EngineError, Result};
use crate::record::{Field, StudentRecord};

/// Multiplier applied to the IQR to place the outlier fences.
pub const IQR_FENCE_FACTOR: f64 = 1.5;

/// Default z-score beyond which a value is an outlier.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;

/// How [`find_outliers_with`] places its fences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlierMethod {
    /// `Q1 - 1.5 * IQR` and `Q3 + 1.5 * IQR`.
    Iqr,
    /// `mean ± threshold * σ`, σ being the sample standard deviation.
    ZScore { threshold: f64 },
}

/// Present values of `field`, in record order.
pub fn present_values(records: &[StudentRecord], field: Field) -> Vec<f64> {
    records.iter().filter_map(|r| field.value(r)).collect()
}

pub(crate) fn summarize(values: &[f64], field: Field) -> Result<StatisticalSummary> {
    let sorted = sorted(values);
    let (Some(mean), Some(median)) = (mean(values), median_sorted(&sorted)) else {
        return Err(EngineError::EmptyDataset(field.name().to_string()));
    };

    Ok(StatisticalSummary {
        count: values.len(),
        mean,
        median,
        std_dev: sample_stddev(values, mean),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
    })
}

/// Summarizes the present values of `field`. Absent values are skipped.
///
/// # Errors
///
/// [`EngineError::EmptyDataset`] if no record has a value for `field`.
pub fn compute_stats(records: &[StudentRecord], field: Field) -> Result<StatisticalSummary> {
    summarize(&present_values(records, field), field)
}

fn check_percentile(p: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&p) {
        return Err(EngineError::InvalidPercentile(p));
    }
    Ok(())
}

/// Value at percentile `p` of `field`, by linear interpolation between the
/// nearest order statistics.
///
/// # Errors
///
/// [`EngineError::InvalidPercentile`] if `p` is outside `[0, 100]` (or NaN),
/// [`EngineError::EmptyDataset`] if no record has a value for `field`.
pub fn compute_percentile(records: &[StudentRecord], field: Field, p: f64) -> Result<f64> {
    check_percentile(p)?;
    let sorted = sorted(&present_values(records, field));
    percentile_sorted(&sorted, p).ok_or_else(|| EngineError::EmptyDataset(field.name().to_string()))
}

/// IQR outliers of `field`. See [`find_outliers_with`].
pub fn find_outliers(records: &[StudentRecord], field: Field) -> Result<OutlierSet<'_>> {
    find_outliers_with(records, field, OutlierMethod::Iqr)
}

/// Records whose `field` value lies strictly outside the fences of `method`.
///
/// Records with an absent value are never outliers.
///
/// # Errors
///
/// [`EngineError::EmptyDataset`] if no record has a value for `field`,
/// [`EngineError::Validation`] for a negative or non-finite z-score threshold.
#[tracing::instrument(skip(records), fields(records = records.len()))]
pub fn find_outliers_with(
    records: &[StudentRecord],
    field: Field,
    method: OutlierMethod,
) -> Result<OutlierSet<'_>> {
    let values = present_values(records, field);
    let empty = || EngineError::EmptyDataset(field.name().to_string());

    let (lower_fence, upper_fence) = match method {
        OutlierMethod::Iqr => {
            let sorted = sorted(&values);
            let q1 = percentile_sorted(&sorted, 25.0).ok_or_else(empty)?;
            let q3 = percentile_sorted(&sorted, 75.0).ok_or_else(empty)?;
            let iqr = q3 - q1;
            (q1 - IQR_FENCE_FACTOR * iqr, q3 + IQR_FENCE_FACTOR * iqr)
        }
        OutlierMethod::ZScore { threshold } => {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(EngineError::Validation(format!(
                    "z-score threshold must be a non-negative number, got {threshold}"
                )));
            }
            let summary = summarize(&values, field)?;
            if summary.std_dev == 0.0 {
                // no spread, nothing can stand out
                (f64::NEG_INFINITY, f64::INFINITY)
            } else {
                let spread = threshold * summary.std_dev;
                (summary.mean - spread, summary.mean + spread)
            }
        }
    };

    let outliers: Vec<&StudentRecord> = records
        .iter()
        .filter(|r| field.value(r).is_some_and(|v| v < lower_fence || v > upper_fence))
        .collect();

    debug!(
        lower_fence,
        upper_fence,
        outliers = outliers.len(),
        "Outlier fences computed"
    );

    Ok(OutlierSet {
        field,
        lower_fence,
        upper_fence,
        records: outliers,
    })
}
