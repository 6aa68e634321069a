use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::analyzers::types::Regression;
use crate::analyzers::utility::mean;
use crate::error::{AnalysisError, Result};

/// Fits `y = intercept + slope * x` by ordinary least squares.
///
/// The p-value is two-sided for the null hypothesis of zero slope, using a
/// Student t distribution with `n - 2` degrees of freedom. With exactly two
/// points the fit is exact: p is 0, or 1 when both y values are equal.
///
/// # Errors
///
/// - [`AnalysisError::MismatchedLengths`] if `x` and `y` differ in length
/// - [`AnalysisError::InsufficientData`] with fewer than two points
/// - [`AnalysisError::DegenerateRegression`] if every x is the same
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<Regression> {
    if x.len() != y.len() {
        return Err(AnalysisError::MismatchedLengths {
            x: x.len(),
            y: y.len(),
        });
    }
    let n = x.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            subject: "regression".to_string(),
            found: n,
            required: 2,
        });
    }

    if x.iter().all(|v| *v == x[0]) {
        return Err(AnalysisError::DegenerateRegression("regression".to_string()));
    }

    let x_mean = mean(x)?;
    let y_mean = mean(y)?;

    let mut ssxm = 0.0;
    let mut ssym = 0.0;
    let mut ssxym = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        ssxm += dx * dx;
        ssym += dy * dy;
        ssxym += dx * dy;
    }

    let rvalue = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };
    let slope = ssxym / ssxm;
    let intercept = y_mean - slope * x_mean;

    let (pvalue, slope_stderr) = if n == 2 {
        (if y[0] == y[1] { 1.0 } else { 0.0 }, 0.0)
    } else {
        let df = (n - 2) as f64;
        let slope_stderr = ((1.0 - rvalue * rvalue) * ssym / ssxm / df).sqrt();
        let pvalue = if rvalue.abs() >= 1.0 {
            0.0
        } else {
            let t = rvalue * (df / ((1.0 - rvalue) * (1.0 + rvalue))).sqrt();
            let dist = StudentsT::new(0.0, 1.0, df)
                .map_err(|e| AnalysisError::Distribution(e.to_string()))?;
            2.0 * dist.sf(t.abs())
        };
        (pvalue, slope_stderr)
    };

    Ok(Regression {
        n,
        slope,
        intercept,
        rvalue,
        pvalue,
        slope_stderr,
    })
}
