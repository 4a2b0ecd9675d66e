// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 meanforce contributors
//
// See LICENSE at the project root for full text.

//! Single-pass moments of a scalar stream.
//!
//! [`Moments`] keeps the raw count, sum and sum of squares. This is the
//! textbook estimator and it loses precision when the mean is large compared
//! to the spread; for restraint forces fluctuating around a small mean over a
//! few million frames the loss is well below the statistical error.

use crate::error::MfError;
use crate::forces::FrameForces;
use std::ops::{Add, AddAssign};

/// Count, sum and sum of squares of a scalar quantity.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Moments {
    pub count: u64,
    pub sum: f64,
    pub sum_squares: f64,
}

impl Moments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_squares += value * value;
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean of the values pushed so far, NaN when empty.
    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    /// Population variance (divisor = count), NaN when empty.
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.sum_squares / self.count as f64 - mean * mean
    }

    /// Population standard deviation. Round-off can push the variance of a
    /// constant stream slightly below zero, which is clamped here.
    pub fn std_dev(&self) -> f64 {
        self.variance().max(0.0).sqrt()
    }

    /// Returns `(mean, variance)`.
    ///
    /// # Errors
    ///
    /// Returns [`MfError::EmptyAccumulator`] if nothing was pushed.
    pub fn finalize(&self) -> Result<(f64, f64), MfError> {
        if self.is_empty() {
            return Err(MfError::EmptyAccumulator);
        }
        Ok((self.mean(), self.variance()))
    }
}

impl Add for Moments {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            sum_squares: self.sum_squares + other.sum_squares,
        }
    }
}

impl AddAssign for Moments {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

/// Summary of one quantity, as printed after every file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
    pub count: u64,
}

impl From<&Moments> for Summary {
    fn from(moments: &Moments) -> Self {
        Summary {
            mean: moments.mean(),
            std_dev: moments.std_dev(),
            count: moments.count,
        }
    }
}

/// Moments of the three per-frame quantities.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ForceStatistics {
    pub radial: Moments,
    pub torque: Moments,
    pub symmetric_torque: Moments,
}

impl ForceStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, forces: &FrameForces) {
        self.radial.push(forces.radial);
        self.torque.push(forces.torque);
        self.symmetric_torque.push(forces.symmetric_torque);
    }

    /// Number of frames seen. All three accumulators advance together.
    pub fn frames(&self) -> u64 {
        self.radial.count
    }

    pub fn merge(&mut self, other: &ForceStatistics) {
        self.radial += other.radial;
        self.torque += other.torque;
        self.symmetric_torque += other.symmetric_torque;
    }

    pub fn summaries(&self) -> [Summary; 3] {
        [
            Summary::from(&self.radial),
            Summary::from(&self.torque),
            Summary::from(&self.symmetric_torque),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn two_pass(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        (mean, var)
    }

    #[test]
    fn matches_two_pass() {
        let values = [0.31, -1.7, 2.25, 4.0, -0.125, 3.5, 0.0, 1e-3];
        let mut moments = Moments::new();
        for &v in &values {
            moments.push(v);
        }
        let (mean, var) = moments.finalize().unwrap();
        let (ref_mean, ref_var) = two_pass(&values);
        assert_eq!(moments.count, values.len() as u64);
        assert_approx_eq!(mean, ref_mean, 1e-12);
        assert_approx_eq!(var, ref_var, 1e-12);
    }

    #[test]
    fn population_variance() {
        let mut moments = Moments::new();
        for v in [1.0, 2.0, 3.0] {
            moments.push(v);
        }
        let (mean, var) = moments.finalize().unwrap();
        assert_approx_eq!(mean, 2.0);
        assert_approx_eq!(var, 2.0 / 3.0, 1e-6);
    }

    #[test]
    fn single_value() {
        let mut moments = Moments::new();
        moments.push(-3.25);
        let (mean, var) = moments.finalize().unwrap();
        assert_approx_eq!(mean, -3.25);
        assert_approx_eq!(var, 0.0);
        assert_approx_eq!(moments.std_dev(), 0.0);
    }

    #[test]
    fn empty_accumulator() {
        let moments = Moments::new();
        assert!(matches!(moments.finalize(), Err(MfError::EmptyAccumulator)));
        assert!(moments.mean().is_nan());
        assert!(moments.variance().is_nan());
    }

    #[test]
    fn pooled_equals_single_stream() {
        let (a, b) = ([1.0, 5.0, -2.0], [0.5, 7.5]);
        let mut first = Moments::new();
        let mut second = Moments::new();
        let mut all = Moments::new();
        a.iter().for_each(|&v| first.push(v));
        b.iter().for_each(|&v| second.push(v));
        a.iter().chain(b.iter()).for_each(|&v| all.push(v));

        first += second;
        assert_eq!(first.count, 5);
        assert_approx_eq!(first.mean(), all.mean());
        assert_approx_eq!(first.variance(), all.variance());
    }

    #[test]
    fn statistics_advance_together() {
        let mut stats = ForceStatistics::new();
        stats.push(&FrameForces {
            radial: 1.0,
            torque: 2.0,
            symmetric_torque: 1.0,
        });
        stats.push(&FrameForces {
            radial: 3.0,
            torque: 4.0,
            symmetric_torque: 2.0,
        });
        assert_eq!(stats.frames(), 2);
        let [radial, torque, symmetric] = stats.summaries();
        assert_approx_eq!(radial.mean, 2.0);
        assert_approx_eq!(radial.std_dev, 1.0);
        assert_approx_eq!(torque.mean, 3.0);
        assert_approx_eq!(symmetric.mean, 1.5);
        assert_eq!(symmetric.count, 2);
    }
}
