// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 meanforce contributors
//
// See LICENSE at the project root for full text.

use crate::error::MfError;
use crate::geometry::{center_of_mass, check_weights, Vec3};
use nalgebra::{Matrix3, SVD};

/// Rigid transformation taking one point set onto another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Superposition {
    /// `rotation * x + translation` is the fitted image of `x`.
    pub rotation: Matrix3<f64>,
    pub translation: Vec3,
    pub rmsd: f64,
}

/// A solver for the weighted least-squares rigid superposition problem.
pub trait Superpose {
    /// Finds the rotation and translation minimizing
    /// `sum_i w_i |R x_i + t - y_i|^2`.
    ///
    /// # Errors
    ///
    /// Returns an error if the point sets differ in length, the weights are
    /// degenerate or the decomposition fails.
    fn superpose(
        &self,
        x: &[Vec3],
        y: &[Vec3],
        weights: Option<&[f64]>,
    ) -> Result<Superposition, MfError>;
}

/// Kabsch algorithm on the weighted covariance matrix.
#[derive(Debug, Default, Clone, Copy)]
pub struct Kabsch;

impl Superpose for Kabsch {
    fn superpose(
        &self,
        x: &[Vec3],
        y: &[Vec3],
        weights: Option<&[f64]>,
    ) -> Result<Superposition, MfError> {
        if x.len() != y.len() {
            return Err(MfError::LengthMismatch {
                expected: x.len(),
                got: y.len(),
            });
        }
        check_weights(weights, x.len())?;
        let weight = |i: usize| weights.map_or(1.0, |w| w[i]);

        let xc = center_of_mass(x, weights)?;
        let yc = center_of_mass(y, weights)?;

        let mut covariance = Matrix3::<f64>::zeros();
        for (i, (xi, yi)) in x.iter().zip(y).enumerate() {
            covariance += weight(i) * (xi - xc) * (yi - yc).transpose();
        }

        let svd = SVD::new(covariance, true, true);
        let u = svd
            .u
            .ok_or_else(|| MfError::Superposition("SVD failed to produce U".to_string()))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| MfError::Superposition("SVD failed to produce V^T".to_string()))?;

        // keep a proper rotation
        let mut reflection = Matrix3::<f64>::identity();
        if (v_t.transpose() * u.transpose()).determinant() < 0.0 {
            reflection[(2, 2)] = -1.0;
        }
        let rotation = v_t.transpose() * reflection * u.transpose();
        let translation = yc - rotation * xc;

        let mut sum = 0.0;
        let mut total = 0.0;
        for (i, (xi, yi)) in x.iter().zip(y).enumerate() {
            let w = weight(i);
            sum += w * (rotation * xi + translation - yi).norm_squared();
            total += w;
        }

        Ok(Superposition {
            rotation,
            translation,
            rmsd: (sum / total).sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use nalgebra::Rotation3;

    fn cloud() -> Vec<Vec3> {
        vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::new(-1.0, -1.0, 0.5),
            Vec3::new(2.0, -0.5, -1.0),
        ]
    }

    #[test]
    fn recovers_rigid_motion() {
        let x = cloud();
        let rot = Rotation3::from_axis_angle(&Vec3::z_axis(), 0.7);
        let shift = Vec3::new(10.0, -2.0, 0.5);
        let y: Vec<Vec3> = x.iter().map(|p| rot * p + shift).collect();

        let fit = Kabsch.superpose(&x, &y, None).unwrap();
        assert_approx_eq!(fit.rmsd, 0.0, 1e-9);
        for (a, b) in fit.rotation.iter().zip(rot.matrix().iter()) {
            assert_approx_eq!(*a, *b, 1e-9);
        }
        assert_approx_eq!(fit.translation.x, 10.0, 1e-9);
        assert_approx_eq!(fit.translation.y, -2.0, 1e-9);
        assert_approx_eq!(fit.translation.z, 0.5, 1e-9);
    }

    #[test]
    fn never_returns_a_reflection() {
        let x = cloud();
        let y: Vec<Vec3> = x.iter().map(|p| Vec3::new(p.x, p.y, -p.z)).collect();
        let fit = Kabsch.superpose(&x, &y, None).unwrap();
        assert_approx_eq!(fit.rotation.determinant(), 1.0, 1e-9);
        assert!(fit.rmsd > 0.1);
    }

    #[test]
    fn weighted_rmsd() {
        let x = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
        let fit = Kabsch.superpose(&x, &x, Some(&[2.0, 3.0][..])).unwrap();
        assert_approx_eq!(fit.rmsd, 0.0, 1e-12);
    }

    #[test]
    fn length_mismatch() {
        let x = cloud();
        let err = Kabsch.superpose(&x, &x[..2], None).unwrap_err();
        assert!(matches!(err, MfError::LengthMismatch { expected: 5, got: 2 }));
    }

    #[test]
    fn short_weights() {
        let x = cloud();
        let err = Kabsch.superpose(&x, &x, Some(&[1.0; 3][..])).unwrap_err();
        assert!(matches!(err, MfError::LengthMismatch { expected: 5, got: 3 }));
    }
}
