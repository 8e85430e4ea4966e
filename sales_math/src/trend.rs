//! Piecewise-linear trend helpers
//!
//! Times are expected on the model scale, i.e. the history mapped onto `[0, 1]`.

use crate::{MathError, Result};

/// Place up to `n` changepoints evenly inside the first `range` share of `t`.
///
/// Changepoints sit on observed times, never on the first point, so the
/// returned vector can be shorter than `n` for short histories.
pub fn changepoint_locations(t: &[f64], n: usize, range: f64) -> Result<Vec<f64>> {
    if !(0.0..=1.0).contains(&range) {
        return Err(MathError::InvalidInput(format!(
            "Changepoint range must be within [0, 1], got {}",
            range
        )));
    }
    if n == 0 || t.len() < 3 {
        return Ok(Vec::new());
    }

    let hist_size = ((t.len() as f64) * range).floor() as usize;
    if hist_size < 2 {
        return Ok(Vec::new());
    }
    let n = n.min(hist_size - 1);

    let mut locations = Vec::with_capacity(n);
    for i in 0..n {
        let idx = ((i + 1) as f64 * (hist_size - 1) as f64 / (n + 1) as f64).round() as usize;
        let cp = t[idx.max(1).min(t.len() - 1)];
        if locations.last().map_or(true, |&last: &f64| cp > last) {
            locations.push(cp);
        }
    }
    Ok(locations)
}

/// Changepoint indicator rows: entry `j` is 1 when `t >= changepoints[j]`
pub fn changepoint_matrix(t: &[f64], changepoints: &[f64]) -> Vec<Vec<f64>> {
    t.iter()
        .map(|&ti| {
            changepoints
                .iter()
                .map(|&cp| if ti >= cp { 1.0 } else { 0.0 })
                .collect()
        })
        .collect()
}

/// Evaluate `(k + a(t)·δ)·t + (m + a(t)·(-s·δ))` for every `t`
pub fn piecewise_linear(k: f64, m: f64, delta: &[f64], t: &[f64], changepoints: &[f64]) -> Vec<f64> {
    t.iter()
        .map(|&ti| {
            let mut rate = k;
            let mut offset = m;
            for (&d, &cp) in delta.iter().zip(changepoints) {
                if ti >= cp {
                    rate += d;
                    offset -= cp * d;
                }
            }
            rate * ti + offset
        })
        .collect()
}
