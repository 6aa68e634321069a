use crate::analyzers::types::VariableSummary;
use crate::error::{AnalysisError, Result};

fn require(values: &[f64], required: usize) -> Result<()> {
    if values.len() < required {
        return Err(AnalysisError::InsufficientData {
            subject: "values".to_string(),
            found: values.len(),
            required,
        });
    }
    Ok(())
}

/// Computes the arithmetic mean. Fails on empty input.
pub fn mean(values: &[f64]) -> Result<f64> {
    require(values, 1)?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Computes the sample standard deviation (n - 1 denominator) given a
/// pre-computed mean. Fails with fewer than two values.
pub fn stddev(values: &[f64], mean: f64) -> Result<f64> {
    require(values, 2)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    Ok(variance.sqrt())
}

/// Standard error of the mean, `stddev / sqrt(n)`. Fails with fewer than two values.
pub fn standard_error(values: &[f64]) -> Result<f64> {
    let m = mean(values)?;
    Ok(stddev(values, m)? / (values.len() as f64).sqrt())
}

/// Count, mean, standard deviation and standard error of `values`, with
/// `subject` naming the data in errors.
pub fn summarize(subject: &str, values: &[f64]) -> Result<VariableSummary> {
    let m = mean(values).map_err(|e| e.about(subject))?;
    let sd = stddev(values, m).map_err(|e| e.about(subject))?;
    Ok(VariableSummary {
        count: values.len(),
        mean: m,
        stddev: sd,
        stderr: standard_error(values).map_err(|e| e.about(subject))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[2.0, 4.0, 9.0]).unwrap(), 5.0);
    }

    #[test]
    fn test_mean_empty_fails() {
        assert!(matches!(
            mean(&[]),
            Err(AnalysisError::InsufficientData { found: 0, required: 1, .. })
        ));
    }

    #[test]
    fn test_sample_stddev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = stddev(&values, 5.0).unwrap();
        assert!((sd - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_standard_error_is_stddev_over_sqrt_n() {
        let values = [5.0, 3.0, 7.0, 6.0];
        let m = mean(&values).unwrap();
        let expected = stddev(&values, m).unwrap() / 2.0;
        assert!((standard_error(&values).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_standard_error_single_value_fails() {
        assert_eq!(
            standard_error(&[4.0]),
            Err(AnalysisError::InsufficientData {
                subject: "values".into(),
                found: 1,
                required: 2
            })
        );
    }

    #[test]
    fn test_summarize_names_subject() {
        let err = summarize("Salt of AAA", &[1.0]).unwrap_err();
        assert!(err.to_string().contains("Salt of AAA"));

        let summary = summarize("Betyg of AAA", &[7.0, 5.0]).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean, 6.0);
        assert!((summary.stddev - 2f64.sqrt()).abs() < 1e-12);
        assert!((summary.stderr - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_summarize_stderr_matches_standard_error() {
        let values = [3.0, 4.0, 4.0, 6.0, 8.0];
        let summary = summarize("Knaprig of BBB", &values).unwrap();
        assert_eq!(summary.stderr, standard_error(&values).unwrap());
    }
}
