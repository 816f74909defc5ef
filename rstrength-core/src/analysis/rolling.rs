//! Trailing moving average and gap filling.
//!
//! `rolling_mean` is the simple moving average: value at `i` is the mean of
//! `values[i+1-period..=i]`, undefined (`None`) for the first `period - 1`
//! points and for any window containing a non-finite value.

/// Trailing simple moving average.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    assert!(period >= 1, "rolling period must be >= 1");
    let n = values.len();
    let mut result = vec![None; n];
    if n < period {
        return result;
    }

    // Roll a running sum; rescan the window whenever a non-finite value is in play.
    let mut sum: f64 = values[..period].iter().sum();
    let mut dirty = values[..period].iter().any(|v| !v.is_finite());
    if !dirty {
        result[period - 1] = Some(sum / period as f64);
    }

    for i in period..n {
        let leaving = values[i - period];
        let entering = values[i];
        if dirty || !leaving.is_finite() || !entering.is_finite() {
            let window = &values[(i + 1 - period)..=i];
            dirty = window.iter().any(|v| !v.is_finite());
            sum = window.iter().sum();
            if dirty {
                continue;
            }
        } else {
            sum = sum - leaving + entering;
        }
        result[i] = Some(sum / period as f64);
    }

    result
}

/// Forward-fill then backward-fill missing values.
///
/// Returns `None` when every value is missing.
pub fn fill_forward_backward(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let first = values.iter().flatten().next().copied()?;

    let mut filled = Vec::with_capacity(values.len());
    // Leading gap takes the first defined value (the backward fill).
    let mut last = first;
    for v in values {
        if let Some(x) = v {
            last = *x;
        }
        filled.push(last);
    }
    Some(filled)
}
