// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 meanforce contributors
//
// See LICENSE at the project root for full text.

use crate::circular::circular_mean;
use crate::error::MfError;
use crate::kabsch::Superpose;
use log::{debug, info};
use nalgebra::{Matrix3, Vector3};
use std::f64::consts::PI;

pub type Vec3 = Vector3<f64>;

/// Refined angles below this are shifted by a full turn.
const NEGATIVE_ANGLE_CUTOFF: f64 = -0.08;

/// Fails with [`MfError::LengthMismatch`] unless `weights` has one entry
/// per point.
pub(crate) fn check_weights(weights: Option<&[f64]>, points: usize) -> Result<(), MfError> {
    match weights {
        Some(w) if w.len() != points => Err(MfError::LengthMismatch {
            expected: points,
            got: w.len(),
        }),
        _ => Ok(()),
    }
}

/// Weighted average of `positions`. Every atom weighs 1.0 when `weights`
/// is `None`.
///
/// # Errors
///
/// Returns [`MfError::LengthMismatch`] if `weights` does not match
/// `positions`, and [`MfError::DegenerateWeight`] if the total weight is not
/// positive, which includes an empty slice.
pub fn center_of_mass(positions: &[Vec3], weights: Option<&[f64]>) -> Result<Vec3, MfError> {
    check_weights(weights, positions.len())?;
    let mut center = Vec3::zeros();
    let mut total = 0.0;
    for (i, x) in positions.iter().enumerate() {
        let w = weights.map_or(1.0, |m| m[i]);
        center += w * x;
        total += w;
    }
    if total <= 0.0 {
        return Err(MfError::DegenerateWeight);
    }
    center /= total;
    debug!(
        "{}, mtot {}: {} {} {}",
        positions.len(),
        total,
        center.x,
        center.y,
        center.z
    );
    Ok(center)
}

/// Centers of the two halves of `positions`, each weighted by the matching
/// half of `masses`.
pub fn subunit_centers(positions: &[Vec3], masses: Option<&[f64]>) -> Result<[Vec3; 2], MfError> {
    check_weights(masses, positions.len())?;
    let ns = positions.len() / 2;
    let (a, b) = positions.split_at(ns);
    let (ma, mb) = match masses {
        Some(m) => (Some(&m[..ns]), Some(&m[ns..])),
        None => (None, None),
    };
    Ok([center_of_mass(a, ma)?, center_of_mass(b, mb)?])
}

/// Rigid-body relation between the two subunits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentResult {
    pub centers: [Vec3; 2],
    pub rotation: Matrix3<f64>,
    pub translation: Vec3,
    pub rmsd: f64,
    /// Rough angle read off the rotation matrix.
    pub reference_angle: f64,
    /// Refined angle of B relative to A about the z axis, in radians.
    pub angle: f64,
}

impl AlignmentResult {
    /// Distance between the subunits along x, taken from the translation.
    pub fn separation(&self) -> f64 {
        self.translation.x
    }
}

/// Superposes subunit A onto subunit B and measures the twist between them.
///
/// Only the first `ns` subunit-A masses are used as weights, matching the
/// pairing of atom `i` with atom `i + ns`.
pub fn align_subunits<S: Superpose + ?Sized>(
    positions: &[Vec3],
    masses: Option<&[f64]>,
    solver: &S,
) -> Result<AlignmentResult, MfError> {
    check_weights(masses, positions.len())?;
    let ns = positions.len() / 2;
    let (a, b) = positions.split_at(ns);
    let centers = subunit_centers(positions, masses)?;
    let weights = masses.map(|m| &m[..ns]);

    let fit = solver.superpose(a, b, weights)?;
    let r = &fit.rotation;
    let reference_angle = (r[(1, 0)] - r[(0, 1)]).atan2(r[(0, 0)] + r[(1, 1)]);

    let mut angle = circular_mean(a, b, weights, &centers, reference_angle)?;
    info!(
        "angle modified from {}({}) to {}({})",
        reference_angle,
        reference_angle.to_degrees(),
        angle,
        angle.to_degrees()
    );
    if angle < NEGATIVE_ANGLE_CUTOFF {
        angle += 2.0 * PI;
    }

    Ok(AlignmentResult {
        centers,
        rotation: fit.rotation,
        translation: fit.translation,
        rmsd: fit.rmsd,
        reference_angle,
        angle,
    })
}
