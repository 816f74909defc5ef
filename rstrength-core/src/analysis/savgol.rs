//! Savitzky–Golay smoothing.
//!
//! Each interior point is replaced by the value at the window center of a
//! least-squares polynomial fitted over a sliding odd-length window. Because
//! the fit is linear in the samples, interior smoothing is a convolution with
//! a fixed weight vector computed once per (window, degree).
//!
//! Edges use a single polynomial fitted to the first (last) full window and
//! evaluated at the leading (trailing) `window / 2` positions, so the output
//! has exactly the input length and no point is dropped or padded.

use crate::config::SmoothingConfig;
use crate::error::{AnalysisError, Stage};
use tracing::debug;

/// A configured smoothing filter.
#[derive(Debug, Clone, PartialEq)]
pub struct SavitzkyGolay {
    window: usize,
    degree: usize,
    weights: Vec<f64>,
}

impl SavitzkyGolay {
    /// Build a filter. `window` must be odd and strictly larger than `degree`.
    pub fn new(window: usize, degree: usize) -> Result<Self, AnalysisError> {
        if window % 2 == 0 || window <= degree {
            return Err(AnalysisError::Config(format!(
                "smoothing window {window} must be odd and larger than degree {degree}"
            )));
        }
        let weights = center_weights(window, degree).ok_or_else(|| {
            AnalysisError::Config(format!("singular fit for window {window}, degree {degree}"))
        })?;
        Ok(Self {
            window,
            degree,
            weights,
        })
    }

    /// Pick the filter for a series of `len` points under `config`'s policy.
    ///
    /// A policy window larger than the series is clamped to the largest odd
    /// window that fits, which must still exceed the degree. A policy window
    /// that fits but does not exceed the degree (the short bucket) keeps its
    /// size and fits degree `window - 1` instead.
    pub fn for_length(len: usize, config: &SmoothingConfig) -> Result<Self, AnalysisError> {
        let policy = config.window_for(len);
        let (window, degree) = if policy > len {
            let clamped = if len % 2 == 1 { len } else { len.saturating_sub(1) };
            if clamped <= config.degree {
                let required = min_odd_window(config.degree);
                return Err(AnalysisError::insufficient(Stage::Smoothing, required, len));
            }
            (clamped, config.degree)
        } else {
            (policy, config.degree.min(policy - 1))
        };
        debug!(len, window, degree, "smoothing window selected");
        Self::new(window, degree)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Smooth `values`. Output has the same length as the input.
    ///
    /// Each window is fitted relative to one of its own samples, so a window
    /// of equal values reproduces that value exactly.
    pub fn smooth(&self, values: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        let n = values.len();
        if n < self.window {
            return Err(AnalysisError::insufficient(Stage::Smoothing, self.window, n));
        }
        let half = self.window / 2;
        let mut out = vec![0.0; n];

        for i in half..(n - half) {
            let center = values[i];
            let delta: f64 = self
                .weights
                .iter()
                .zip(&values[(i - half)..=(i + half)])
                .map(|(w, v)| w * (v - center))
                .sum();
            out[i] = center + delta;
        }

        // Positions are centered on each edge window's middle sample.
        let offsets: Vec<f64> = (0..self.window).map(|k| k as f64 - half as f64).collect();
        let head = &values[..self.window];
        if let Some(coeffs) = fit_relative(&offsets, head, self.degree) {
            for (i, slot) in out.iter_mut().enumerate().take(half) {
                *slot = head[half] + evaluate(&coeffs, offsets[i]);
            }
        }
        let tail = &values[(n - self.window)..];
        if let Some(coeffs) = fit_relative(&offsets, tail, self.degree) {
            for k in (self.window - half)..self.window {
                out[n - self.window + k] = tail[half] + evaluate(&coeffs, offsets[k]);
            }
        }
        Ok(out)
    }
}

/// Smooth one series with the policy window for its length.
pub fn smooth_series(values: &[f64], config: &SmoothingConfig) -> Result<Vec<f64>, AnalysisError> {
    SavitzkyGolay::for_length(values.len(), config)?.smooth(values)
}

fn min_odd_window(degree: usize) -> usize {
    let w = degree + 1;
    if w % 2 == 1 {
        w
    } else {
        w + 1
    }
}

/// Convolution weights that yield the fitted value at the window center.
///
/// With design matrix `A[j][k] = x_j^k`, the fitted center value is
/// `e0ᵀ (AᵀA)⁻¹ Aᵀ y`; solving `(AᵀA) z = e0` once gives `w_j = Σ_k z_k x_j^k`.
fn center_weights(window: usize, degree: usize) -> Option<Vec<f64>> {
    let half = (window / 2) as f64;
    let xs: Vec<f64> = (0..window).map(|j| j as f64 - half).collect();
    let gram = gram_matrix(&xs, degree);
    let mut e0 = vec![0.0; degree + 1];
    e0[0] = 1.0;
    let z = solve_linear(gram, e0)?;
    Some(xs.iter().map(|&x| evaluate(&z, x)).collect())
}

/// Fit `ys` minus its middle sample; the caller adds that sample back.
fn fit_relative(xs: &[f64], ys: &[f64], degree: usize) -> Option<Vec<f64>> {
    let anchor = ys[ys.len() / 2];
    let shifted: Vec<f64> = ys.iter().map(|y| y - anchor).collect();
    fit_polynomial(xs, &shifted, degree)
}

/// Least-squares polynomial coefficients (constant term first).
fn fit_polynomial(xs: &[f64], ys: &[f64], degree: usize) -> Option<Vec<f64>> {
    let gram = gram_matrix(xs, degree);
    let rhs: Vec<f64> = (0..=degree)
        .map(|k| xs.iter().zip(ys).map(|(x, y)| x.powi(k as i32) * y).sum())
        .collect();
    solve_linear(gram, rhs)
}

fn gram_matrix(xs: &[f64], degree: usize) -> Vec<Vec<f64>> {
    (0..=degree)
        .map(|r| {
            (0..=degree)
                .map(|c| xs.iter().map(|x| x.powi((r + c) as i32)).sum())
                .collect()
        })
        .collect()
}

/// Horner evaluation of a polynomial with constant term first.
fn evaluate(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Gaussian elimination with partial pivoting. `None` if singular.
fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
