// Thin wrappers over statrs so callers only see AnalysisError
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use crate::error::{AnalysisError, AnalysisResult};

/// Upper-tail probability P(F > f) for an F(df1, df2) variate.
pub fn f_survival(f: f64, df1: f64, df2: f64) -> AnalysisResult<f64> {
    if f.is_infinite() && f > 0.0 {
        return Ok(0.0);
    }
    if f <= 0.0 {
        return Ok(1.0);
    }
    let dist = FisherSnedecor::new(df1, df2).map_err(|e| AnalysisError::Distribution(e.to_string()))?;
    Ok(dist.sf(f))
}

/// Two-tailed Student-t critical value at `confidence` with `df` degrees of freedom.
pub fn t_critical(confidence: f64, df: f64) -> AnalysisResult<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(AnalysisError::InvalidParameter { name: "confidence", value: confidence });
    }
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| AnalysisError::Distribution(e.to_string()))?;
    Ok(dist.inverse_cdf(1.0 - (1.0 - confidence) / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_critical_matches_tables() {
        // t(0.975, 4) = 2.776, t(0.975, 30) = 2.042
        assert!((t_critical(0.95, 4.0).unwrap() - 2.776).abs() < 1e-3);
        assert!((t_critical(0.95, 30.0).unwrap() - 2.042).abs() < 1e-3);
    }

    #[test]
    fn f_survival_edges() {
        assert_eq!(f_survival(0.0, 2.0, 6.0).unwrap(), 1.0);
        assert_eq!(f_survival(f64::INFINITY, 2.0, 6.0).unwrap(), 0.0);
        // F(0.95; 2, 6) = 5.143
        assert!((f_survival(5.143, 2.0, 6.0).unwrap() - 0.05).abs() < 1e-3);
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        assert!(matches!(t_critical(1.0, 4.0), Err(AnalysisError::InvalidParameter { .. })));
        assert!(matches!(t_critical(0.0, 4.0), Err(AnalysisError::InvalidParameter { .. })));
    }

    #[test]
    fn rejects_bad_degrees_of_freedom() {
        assert!(matches!(f_survival(2.0, 0.0, 6.0), Err(AnalysisError::Distribution(_))));
    }
}
