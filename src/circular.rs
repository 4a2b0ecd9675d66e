// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 meanforce contributors
//
// See LICENSE at the project root for full text.

//! Averaging of in-plane angle differences.
//!
//! Differences of `atan2` angles live on a circle, so they are first moved
//! onto the branch closest to a reference angle and only then averaged.

use crate::error::MfError;
use crate::geometry::{check_weights, Vec3};
use std::f64::consts::{PI, TAU};

/// Wraps `angle - reference` into `(-pi, pi]`.
///
/// `reference + wrap_to_reference(angle, reference)` is the representative
/// of `angle` closest to `reference`.
pub fn wrap_to_reference(angle: f64, reference: f64) -> f64 {
    PI - (PI - (angle - reference)).rem_euclid(TAU)
}

/// Weighted mean angle of `y[i]` relative to `x[i]` about the z axis.
///
/// Each point is measured in the x-y plane from the center of its own set.
/// The weight of pair `i` is the sum of the squared planar distances of both
/// points, times `weights[i]` if given.
///
/// # Errors
///
/// Returns [`MfError::LengthMismatch`] if the sets or `weights` differ in
/// length, and
/// [`MfError::DegenerateWeight`] if every pair has zero weight.
pub fn circular_mean(
    x: &[Vec3],
    y: &[Vec3],
    weights: Option<&[f64]>,
    centers: &[Vec3; 2],
    reference: f64,
) -> Result<f64, MfError> {
    if x.len() != y.len() {
        return Err(MfError::LengthMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    check_weights(weights, x.len())?;
    let [xc, yc] = centers;

    let mut sum = 0.0;
    let mut total = 0.0;
    for (i, (xi, yi)) in x.iter().zip(y).enumerate() {
        let (x0, x1) = (xi.x - xc.x, xi.y - xc.y);
        let (y0, y1) = (yi.x - yc.x, yi.y - yc.y);
        let diff = y1.atan2(y0) - x1.atan2(x0);

        let mut w = x0 * x0 + x1 * x1 + y0 * y0 + y1 * y1;
        if let Some(m) = weights {
            w *= m[i];
        }
        sum += w * wrap_to_reference(diff, reference);
        total += w;
    }

    if total <= 0.0 {
        return Err(MfError::DegenerateWeight);
    }
    Ok(reference + sum / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn ring(n: usize, radius: f64, phase: f64) -> Vec<Vec3> {
        (0..n)
            .map(|i| {
                let t = phase + TAU * i as f64 / n as f64;
                Vec3::new(radius * t.cos(), radius * t.sin(), i as f64)
            })
            .collect()
    }

    #[test]
    fn wrap_stays_in_half_open_interval() {
        for k in -20..=20 {
            let angle = k as f64 * 0.37;
            for reference in [-3.0, -PI, 0.0, 1.0, PI] {
                let w = wrap_to_reference(angle, reference);
                assert!(w > -PI && w <= PI, "{angle} {reference} -> {w}");
                let turns = (angle - reference - w) / TAU;
                assert_approx_eq!(turns, turns.round(), 1e-9);
            }
        }
    }

    #[test]
    fn wrap_picks_branch_near_reference() {
        let reference = PI - 0.01;
        let diff = -PI + 0.01;
        let wrapped = reference + wrap_to_reference(diff, reference);
        assert_approx_eq!(wrapped, PI + 0.01, 1e-12);
        assert!((wrapped - reference).abs() < 0.03);
    }

    #[test]
    fn boundary_maps_to_plus_pi() {
        assert_approx_eq!(wrap_to_reference(PI, 0.0), PI, 1e-12);
        assert_approx_eq!(wrap_to_reference(-PI, 0.0), PI, 1e-12);
    }

    #[test]
    fn mean_of_rotated_ring() {
        let x = ring(8, 1.5, 0.0);
        let y = ring(8, 1.5, 0.8);
        let centers = [Vec3::zeros(), Vec3::zeros()];
        let angle = circular_mean(&x, &y, None, &centers, 0.75).unwrap();
        assert_approx_eq!(angle, 0.8, 1e-12);
    }

    #[test]
    fn mean_across_the_cut() {
        // Every pair differs by almost pi; raw atan2 differences jump
        // between +pi and -pi depending on the quadrant.
        let twist = PI - 0.02;
        let x = ring(6, 1.0, 0.1);
        let y = ring(6, 1.0, 0.1 + twist);
        let centers = [Vec3::zeros(), Vec3::zeros()];
        let angle = circular_mean(&x, &y, None, &centers, PI - 0.05).unwrap();
        assert_approx_eq!(angle, twist, 1e-12);
    }

    #[test]
    fn weights_scale_pairs() {
        let centers = [Vec3::zeros(), Vec3::zeros()];
        let x = vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
        let y = vec![
            Vec3::new(0.1f64.cos(), 0.1f64.sin(), 0.0),
            Vec3::new(0.4f64.cos(), 0.4f64.sin(), 0.0),
        ];
        let angle = circular_mean(&x, &y, Some(&[3.0, 1.0][..]), &centers, 0.0).unwrap();
        assert_approx_eq!(angle, (3.0 * 0.1 + 0.4) / 4.0, 1e-12);
    }

    #[test]
    fn all_points_at_center() {
        let x = vec![Vec3::zeros(); 3];
        let centers = [Vec3::zeros(), Vec3::zeros()];
        assert!(matches!(
            circular_mean(&x, &x, None, &centers, 0.0),
            Err(MfError::DegenerateWeight)
        ));
    }

    #[test]
    fn short_weights() {
        let x = ring(4, 1.0, 0.0);
        let centers = [Vec3::zeros(), Vec3::zeros()];
        assert!(matches!(
            circular_mean(&x, &x, Some(&[1.0][..]), &centers, 0.0),
            Err(MfError::LengthMismatch { expected: 4, got: 1 })
        ));
    }
}
