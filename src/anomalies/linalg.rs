//! Numeric kernels for the subspace detector: smoothed TF-IDF weighting,
//! population standardization, and a one-sided Jacobi SVD.
//!
//! The formulas are fixed contracts: `idf(t) = ln((1+N)/(1+df(t))) + 1` with
//! L2 row normalization, and ddof=0 standard deviation with epsilon 1e-8.
//! Substituting a library default (unsmoothed idf, sample std) changes the
//! scores, so these are written out explicitly.

use crate::error::{Error, Result};
use ndarray::{Array1, Array2};

/// Epsilon added to column standard deviations so constant columns stay finite.
pub(crate) const SCALE_EPS: f64 = 1e-8;

const JACOBI_MAX_SWEEPS: usize = 64;
const JACOBI_TOL: f64 = 1e-12;

/// TF-IDF weighting over the count matrix: each window is a document, each
/// template a term. Rows are L2-normalized afterwards; all-zero rows stay zero.
pub(crate) fn tfidf_weight(counts: &Array2<f64>) -> Array2<f64> {
    let (n_windows, n_templates) = counts.dim();
    let mut idf = Array1::<f64>::zeros(n_templates);
    for (j, column) in counts.columns().into_iter().enumerate() {
        let df = column.iter().filter(|&&c| c > 0.0).count() as f64;
        idf[j] = ((1.0 + n_windows as f64) / (1.0 + df)).ln() + 1.0;
    }

    let mut weighted = counts * &idf;
    for mut row in weighted.rows_mut() {
        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
    weighted
}

/// Column-wise standardization with population (ddof=0) standard deviation.
pub(crate) fn standardize(x: &Array2<f64>) -> Array2<f64> {
    let n = x.nrows() as f64;
    let mut out = x.clone();
    for mut column in out.columns_mut() {
        let mean = column.sum() / n;
        let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let scale = var.sqrt() + SCALE_EPS;
        column.mapv_inplace(|v| (v - mean) / scale);
    }
    out
}

/// One-sided (Hestenes) Jacobi SVD: returns singular values in descending
/// order and the matching right singular vectors as the columns of `v`.
///
/// Works directly on the data matrix, so rank-deficient and
/// fewer-rows-than-columns inputs are handled without ever forming the
/// covariance matrix.
pub(crate) fn jacobi_svd(x: &Array2<f64>) -> Result<(Vec<f64>, Array2<f64>)> {
    let (n, f) = x.dim();
    let mut a = x.clone();
    let mut v = Array2::<f64>::eye(f);

    let mut converged = false;
    for _sweep in 0..JACOBI_MAX_SWEEPS {
        let mut off = 0.0f64;
        for p in 0..f.saturating_sub(1) {
            for q in (p + 1)..f {
                let mut alpha = 0.0;
                let mut beta = 0.0;
                let mut gamma = 0.0;
                for i in 0..n {
                    let ap = a[[i, p]];
                    let aq = a[[i, q]];
                    alpha += ap * ap;
                    beta += aq * aq;
                    gamma += ap * aq;
                }
                let denom = (alpha * beta).sqrt();
                if denom == 0.0 {
                    continue;
                }
                off = off.max(gamma.abs() / denom);
                if gamma.abs() < 1e-14 * denom {
                    continue;
                }
                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;
                for i in 0..n {
                    let ap = a[[i, p]];
                    let aq = a[[i, q]];
                    a[[i, p]] = c * ap - s * aq;
                    a[[i, q]] = s * ap + c * aq;
                }
                for i in 0..f {
                    let vp = v[[i, p]];
                    let vq = v[[i, q]];
                    v[[i, p]] = c * vp - s * vq;
                    v[[i, q]] = s * vp + c * vq;
                }
            }
        }
        if off < JACOBI_TOL {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(Error::Numerical(format!(
            "Jacobi SVD did not converge within {JACOBI_MAX_SWEEPS} sweeps"
        )));
    }

    let mut order: Vec<(f64, usize)> = (0..f)
        .map(|j| {
            let norm = (0..n).map(|i| a[[i, j]] * a[[i, j]]).sum::<f64>().sqrt();
            (norm, j)
        })
        .collect();
    order.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let singular_values: Vec<f64> = order.iter().map(|(norm, _)| *norm).collect();
    let mut sorted_v = Array2::<f64>::zeros((f, f));
    for (dst, (_, src)) in order.iter().enumerate() {
        for i in 0..f {
            sorted_v[[i, dst]] = v[[i, *src]];
        }
    }
    Ok((singular_values, sorted_v))
}
