//! Moving averages over daily sales
//!
//! - `SimpleMovingAverage`: streaming window mean
//! - `rolling_mean`: trailing window mean over a whole slice

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) over a fixed window
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl SimpleMovingAverage {
    /// Create a new Simple Moving Average with the specified window
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(MathError::InvalidInput(
                "Window must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            window,
            values: VecDeque::with_capacity(window),
            sum: 0.0,
        })
    }

    /// Push a new value, evicting the oldest once the window is full
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.window {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }
    }

    /// Current mean; requires a full window
    pub fn value(&self) -> Result<f64> {
        if self.values.len() < self.window {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for SMA calculation. Need {} values, have {}.",
                self.window,
                self.values.len()
            )));
        }

        Ok(self.sum / self.window as f64)
    }

    /// Window length
    pub fn window(&self) -> usize {
        self.window
    }
}

/// Trailing mean for every position; `None` until the window fills
pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    let mut sma = SimpleMovingAverage::new(window)?;
    Ok(values
        .iter()
        .map(|&v| {
            sma.update(v);
            sma.value().ok()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sma_calculation() {
        let mut sma = SimpleMovingAverage::new(3).unwrap();

        sma.update(10.0);
        sma.update(20.0);
        assert!(sma.value().is_err());

        sma.update(30.0);
        assert_relative_eq!(sma.value().unwrap(), 20.0);

        sma.update(40.0);
        assert_relative_eq!(sma.value().unwrap(), 30.0);
    }

    #[test]
    fn test_rolling_mean() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(out, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(SimpleMovingAverage::new(0).is_err());
        assert!(rolling_mean(&[1.0], 0).is_err());
    }
}
