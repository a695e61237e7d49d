//! Ordinary least squares.
//!
//! Solves the normal equations with `nalgebra` and reports the usual summary
//! statistics (standard errors, t and p values, R², F test, information
//! criteria). Degenerate inputs are rejected with a specific
//! `AnalysisError` instead of producing NaN.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use std::f64::consts::PI;
use std::fmt;

use super::is_constant;
use crate::model::AnalysisError;

const ROUTINE: &str = "ols";

/// Coefficients and residual sum of squares of a least-squares solve.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    pub coefficients: DVector<f64>,
    /// Diagonal of (X'X)⁻¹, for standard errors.
    pub inverse_diagonal: DVector<f64>,
    pub ssr: f64,
    pub nobs: usize,
}

/// Solve `y = X·β + ε`. `design` must already contain any constant column.
pub fn least_squares(design: &DMatrix<f64>, y: &DVector<f64>) -> Result<LeastSquares, AnalysisError> {
    let (nobs, k) = design.shape();
    if y.len() != nobs {
        return Err(AnalysisError::Degenerate {
            routine: ROUTINE,
            reason: format!("design has {} rows but dependent has {}", nobs, y.len()),
        });
    }
    if nobs <= k {
        return Err(AnalysisError::InsufficientData {
            routine: ROUTINE,
            needed: k + 1,
            available: nobs,
        });
    }

    // Numerical rank, with a cutoff relative to the largest singular value
    let svd = design.clone().svd(false, false);
    let cutoff = svd.singular_values.max() * nobs.max(k) as f64 * f64::EPSILON;
    if svd.rank(cutoff) < k {
        return Err(AnalysisError::Degenerate {
            routine: ROUTINE,
            reason: "design matrix is rank deficient (a regressor has zero variance or is collinear)".into(),
        });
    }

    let xt = design.transpose();
    let xtx_inv = (&xt * design).try_inverse().ok_or_else(|| AnalysisError::Degenerate {
        routine: ROUTINE,
        reason: "design matrix is singular (a regressor has zero variance or is collinear)".into(),
    })?;

    let coefficients = &xtx_inv * (&xt * y);
    let residuals = y - design * &coefficients;
    let ssr = residuals.dot(&residuals);

    if !ssr.is_finite() || coefficients.iter().any(|b| !b.is_finite()) {
        return Err(AnalysisError::Degenerate {
            routine: ROUTINE,
            reason: "solution is not finite".into(),
        });
    }

    Ok(LeastSquares {
        coefficients,
        inverse_diagonal: xtx_inv.diagonal(),
        ssr,
        nobs,
    })
}

/// Fitted model with the statistics of a regression summary table.
///
/// Coefficient vectors are ordered `[const, x1, x2, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub t_values: Vec<f64>,
    pub p_values: Vec<f64>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub ssr: f64,
    pub nobs: usize,
    pub df_model: usize,
    pub df_resid: usize,
}

impl OlsFit {
    pub fn intercept(&self) -> f64 {
        self.coefficients[0]
    }

    /// Coefficient of the first regressor.
    pub fn slope(&self) -> f64 {
        self.coefficients[1]
    }

    /// Render a summary table using `names` for the regressors after `const`.
    pub fn summary(&self, title: &str, names: &[&str]) -> String {
        let mut out = String::new();
        let rule = "=".repeat(72);
        let thin = "-".repeat(72);
        out.push_str(&format!("{}\n{}\n{}\n", title, rule, "Results: Ordinary least squares"));
        out.push_str(&format!(
            "No. Observations: {:<18} R-squared:          {:.4}\n",
            self.nobs, self.r_squared
        ));
        out.push_str(&format!(
            "Df Model:         {:<18} Adj. R-squared:     {:.4}\n",
            self.df_model, self.adj_r_squared
        ));
        out.push_str(&format!(
            "Df Residuals:     {:<18} F-statistic:        {:.4}\n",
            self.df_resid, self.f_statistic
        ));
        out.push_str(&format!(
            "Log-Likelihood:   {:<18.4} Prob (F-statistic): {:.4e}\n",
            self.log_likelihood, self.f_p_value
        ));
        out.push_str(&format!(
            "AIC:              {:<18.4} BIC:                {:.4}\n",
            self.aic, self.bic
        ));
        out.push_str(&format!("{}\n", thin));
        out.push_str(&format!(
            "{:<24} {:>11} {:>11} {:>10} {:>10}\n",
            "", "Coef.", "Std.Err.", "t", "P>|t|"
        ));
        out.push_str(&format!("{}\n", thin));
        for (i, coef) in self.coefficients.iter().enumerate() {
            let name = if i == 0 {
                "const".to_string()
            } else {
                names
                    .get(i - 1)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| format!("x{}", i))
            };
            out.push_str(&format!(
                "{:<24} {:>11.4} {:>11.4} {:>10.4} {:>10.4}\n",
                name, coef, self.std_errors[i], self.t_values[i], self.p_values[i]
            ));
        }
        out.push_str(&rule);
        out
    }
}

impl fmt::Display for OlsFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary("OLS", &[]))
    }
}

/// Simple regression of `y` on `x` with an intercept.
pub fn fit(x: &[f64], y: &[f64]) -> Result<OlsFit, AnalysisError> {
    if x.len() != y.len() {
        return Err(AnalysisError::Degenerate {
            routine: ROUTINE,
            reason: format!("predictor has {} values but dependent has {}", x.len(), y.len()),
        });
    }
    let design = DMatrix::from_fn(x.len(), 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    fit_matrix(&design, &DVector::from_column_slice(y))
}

/// Full OLS fit. `design` must include the constant as its first column.
pub fn fit_matrix(design: &DMatrix<f64>, y: &DVector<f64>) -> Result<OlsFit, AnalysisError> {
    if y.len() > 1 && is_constant(y.as_slice()) {
        return Err(AnalysisError::Degenerate {
            routine: ROUTINE,
            reason: "dependent variable has zero variance".into(),
        });
    }
    for (j, column) in design.column_iter().enumerate().skip(1) {
        let values: Vec<f64> = column.iter().copied().collect();
        if values.len() > 1 && is_constant(&values) {
            return Err(AnalysisError::Degenerate {
                routine: ROUTINE,
                reason: format!("regressor {} has zero variance", j),
            });
        }
    }

    let solved = least_squares(design, y)?;
    let nobs = solved.nobs;
    let k = design.ncols();
    let df_resid = nobs - k;
    let df_model = k - 1;

    let mean = y.mean();
    let sst: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();

    let sigma2 = solved.ssr / df_resid as f64;
    let t_dist = StudentsT::new(0.0, 1.0, df_resid as f64).map_err(|e| AnalysisError::Degenerate {
        routine: ROUTINE,
        reason: format!("t distribution: {}", e),
    })?;

    let mut std_errors = Vec::with_capacity(k);
    let mut t_values = Vec::with_capacity(k);
    let mut p_values = Vec::with_capacity(k);
    for j in 0..k {
        let beta = solved.coefficients[j];
        let se = (sigma2 * solved.inverse_diagonal[j]).max(0.0).sqrt();
        let (t, p) = if se > 0.0 {
            let t = beta / se;
            (t, 2.0 * t_dist.sf(t.abs()))
        } else if beta == 0.0 {
            (0.0, 1.0)
        } else {
            // Exact fit: the coefficient is known without error
            (beta.signum() * f64::INFINITY, 0.0)
        };
        std_errors.push(se);
        t_values.push(t);
        p_values.push(p);
    }

    let r_squared = 1.0 - solved.ssr / sst;
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (nobs - 1) as f64 / df_resid as f64;

    let (f_statistic, f_p_value) = if df_model == 0 {
        (0.0, 1.0)
    } else if solved.ssr == 0.0 {
        (f64::INFINITY, 0.0)
    } else {
        let f_stat = ((sst - solved.ssr) / df_model as f64) / sigma2;
        let f_dist = FisherSnedecor::new(df_model as f64, df_resid as f64).map_err(|e| {
            AnalysisError::Degenerate {
                routine: ROUTINE,
                reason: format!("F distribution: {}", e),
            }
        })?;
        (f_stat, f_dist.sf(f_stat))
    };

    let n = nobs as f64;
    let log_likelihood = -n / 2.0 * ((2.0 * PI).ln() + (solved.ssr / n).ln() + 1.0);
    let aic = -2.0 * log_likelihood + 2.0 * k as f64;
    let bic = -2.0 * log_likelihood + n.ln() * k as f64;

    Ok(OlsFit {
        coefficients: solved.coefficients.iter().copied().collect(),
        std_errors,
        t_values,
        p_values,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value,
        log_likelihood,
        aic,
        bic,
        ssr: solved.ssr,
        nobs,
        df_model,
        df_resid,
    })
}
