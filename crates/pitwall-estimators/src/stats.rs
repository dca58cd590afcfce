//! Small-sample statistics used by the estimators.

/// Below this many samples outlier rejection is skipped.
pub const MIN_SAMPLES_FOR_OUTLIER_FILTER: usize = 3;

/// Default rejection threshold, in population standard deviations.
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 1.0;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population (divide-by-n) standard deviation.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|value| {
            let diff = value - mean;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

/// Median; the mean of the two middle values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let low = sorted.get(middle.checked_sub(1)?)?;
        let high = sorted.get(middle)?;
        Some((low + high) / 2.0)
    } else {
        sorted.get(middle).copied()
    }
}

/// Keep values within `threshold` standard deviations of the mean.
///
/// Fewer than [`MIN_SAMPLES_FOR_OUTLIER_FILTER`] samples pass through untouched.
/// If every value would be rejected the input is returned unchanged.
pub fn filter_outliers(values: &[f64], threshold: f64) -> Vec<f64> {
    if values.len() < MIN_SAMPLES_FOR_OUTLIER_FILTER {
        return values.to_vec();
    }
    let (Some(mean), Some(std_dev)) = (mean(values), population_std_dev(values)) else {
        return values.to_vec();
    };

    let limit = std_dev * threshold;
    let kept: Vec<f64> = values
        .iter()
        .copied()
        .filter(|value| (value - mean).abs() <= limit)
        .collect();

    if kept.is_empty() { values.to_vec() } else { kept }
}

/// Outlier-filtered median, or 0 for an empty window.
pub fn robust_pace(values: &[f64], threshold: f64) -> f64 {
    match values {
        [] => 0.0,
        [only] => *only,
        _ => median(&filter_outliers(values, threshold)).unwrap_or(0.0),
    }
}
