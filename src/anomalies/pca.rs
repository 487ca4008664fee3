//! PCA subspace anomaly scoring.
//!
//! Follows the subspace method from "Large-Scale System Problems Detection by
//! Mining Console Logs" (Xu et al., 2009): project each window's weighted,
//! standardized event signature onto the residual of the dominant principal
//! subspace, score it by the squared prediction error, and flag it against a
//! chi-squared critical value.

use super::linalg::{jacobi_svd, standardize, tfidf_weight};
use crate::config::DetectorConfig;
use crate::error::{Error, Result};
use crate::features::EventCountMatrix;
use ndarray::Array2;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Total-variance floor below which the standardized matrix is treated as
/// carrying no signal (uniform input); a single nominal component is kept.
const VARIANCE_FLOOR: f64 = 1e-12;

/// The count matrix with anomaly scores and flags appended, plus the fitted
/// subspace parameters.
#[derive(Debug, Clone)]
pub struct ScoredMatrix {
    pub matrix: EventCountMatrix,
    /// Squared prediction error per window, same order as the matrix rows
    pub anomaly_scores: Vec<f64>,
    /// `anomaly_scores[i] > threshold`
    pub is_anomaly: Vec<bool>,
    /// Number of principal components kept (k)
    pub components: usize,
    /// Chi-squared critical value Q_alpha at df = n_templates - k
    pub threshold: f64,
    /// Per-component explained variance ratios, descending
    pub explained: Vec<f64>,
}

impl ScoredMatrix {
    pub fn n_anomalies(&self) -> usize {
        self.is_anomaly.iter().filter(|&&a| a).count()
    }
}

/// Batch subspace detector. Pure and deterministic: scoring the same matrix
/// with the same configuration twice yields bit-identical results.
pub struct SubspaceDetector {
    config: DetectorConfig,
}

impl SubspaceDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Score every window of the count matrix and flag anomalies.
    pub fn score(&self, matrix: EventCountMatrix) -> Result<ScoredMatrix> {
        let n_windows = matrix.n_windows();
        let n_templates = matrix.n_templates();
        if n_windows == 0 || n_templates == 0 {
            return Err(Error::EmptyMatrix);
        }
        if n_windows < 2 {
            return Err(Error::Numerical(
                "subspace estimation requires at least two windows".to_string(),
            ));
        }

        let weighted = tfidf_weight(&matrix.to_f64());
        let scaled = standardize(&weighted);
        if scaled.iter().any(|v| !v.is_finite()) {
            return Err(Error::Numerical(
                "standardized matrix contains non-finite values".to_string(),
            ));
        }

        let (singular_values, v) = jacobi_svd(&scaled)?;
        let (k, explained) = self.select_components(&singular_values, n_templates)?;

        let degrees = n_templates - k;
        let chi2 = ChiSquared::new(degrees as f64)
            .map_err(|e| Error::Numerical(format!("chi-squared(df={degrees}): {e}")))?;
        let threshold = chi2.inverse_cdf(1.0 - self.config.alpha);

        let anomaly_scores = residual_scores(&scaled, &v, k);
        if anomaly_scores.iter().any(|s| !s.is_finite()) {
            return Err(Error::Numerical(
                "anomaly scores contain non-finite values".to_string(),
            ));
        }
        let is_anomaly: Vec<bool> = anomaly_scores.iter().map(|&s| s > threshold).collect();

        tracing::info!(
            windows = n_windows,
            templates = n_templates,
            components = k,
            threshold,
            anomalies = is_anomaly.iter().filter(|&&a| a).count(),
            "scored event count matrix"
        );

        Ok(ScoredMatrix {
            matrix,
            anomaly_scores,
            is_anomaly,
            components: k,
            threshold,
            explained,
        })
    }

    /// Smallest k whose cumulative explained variance reaches the configured
    /// threshold. k = n_templates leaves no anomaly space and is rejected.
    fn select_components(
        &self,
        singular_values: &[f64],
        n_templates: usize,
    ) -> Result<(usize, Vec<f64>)> {
        let total: f64 = singular_values.iter().map(|s| s * s).sum();
        if total <= VARIANCE_FLOOR {
            // Uniform input: no variance anywhere, keep one nominal component.
            return Ok((1, vec![0.0; n_templates]));
        }

        let explained: Vec<f64> = singular_values.iter().map(|s| s * s / total).collect();
        let mut cumulative = 0.0;
        let mut k = n_templates;
        for (i, ratio) in explained.iter().enumerate() {
            cumulative += ratio;
            if cumulative >= self.config.variance_threshold {
                k = i + 1;
                break;
            }
        }
        if k >= n_templates {
            return Err(Error::Config(format!(
                "variance_threshold {} selects all {} components; the anomaly space is empty",
                self.config.variance_threshold, n_templates
            )));
        }
        Ok((k, explained))
    }
}

/// SPE per row: squared norm of `y - P(P^T y)` where P holds the top-k right
/// singular vectors. Equivalent to applying the projector `I - P P^T` without
/// materializing it.
fn residual_scores(scaled: &Array2<f64>, v: &Array2<f64>, k: usize) -> Vec<f64> {
    let (n, f) = scaled.dim();
    let mut scores = Vec::with_capacity(n);
    for row in scaled.rows() {
        let mut residual: Vec<f64> = row.to_vec();
        for c in 0..k {
            let mut proj = 0.0;
            for j in 0..f {
                proj += row[j] * v[[j, c]];
            }
            for j in 0..f {
                residual[j] -= proj * v[[j, c]];
            }
        }
        scores.push(residual.iter().map(|r| r * r).sum());
    }
    scores
}
