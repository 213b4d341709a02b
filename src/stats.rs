//! Summary statistics over neighbor shells.

/// `[min, max, mean, std]` of `values`, with `ddof` delta degrees of freedom in the std.
///
/// Empty input, or input no longer than `ddof`, gives a zero std; empty input gives all zeros.
#[must_use]
pub fn summarize(values: &[f64], ddof: usize) -> [f64; 4] {
    if values.is_empty() {
        return [0.0; 4];
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = mean(values);
    [min, max, mean, std(values, mean, ddof)]
}

#[inline]
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().sum::<f64>() / n
}

/// Standard deviation around a known `mean`
#[must_use]
pub fn std(values: &[f64], mean: f64, ddof: usize) -> f64 {
    if values.len() <= ddof {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let dof = (values.len() - ddof) as f64;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / dof).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_summarize_population_and_sample() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let pop = summarize(&values, 0);
        assert_eq!(&pop[..3], &[1.0, 4.0, 2.5]);
        assert_relative_eq!(pop[3], 1.25f64.sqrt(), epsilon = 1e-12);
        let sample = summarize(&values, 1);
        assert_relative_eq!(sample[3], (5.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_summarize_degenerate() {
        assert_eq!(summarize(&[], 0), [0.0; 4]);
        assert_eq!(summarize(&[3.0], 1), [3.0, 3.0, 3.0, 0.0]);
    }
}
