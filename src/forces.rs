// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 meanforce contributors
//
// See LICENSE at the project root for full text.

//! Per-frame reduction of atomic forces.
//!
//! Atoms `0..np/2` form subunit A, `np/2..np` subunit B. Both functions are
//! called once per frame and do not allocate.

use crate::geometry::Vec3;

/// Scalars extracted from one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameForces {
    pub radial: f64,
    pub torque: f64,
    pub symmetric_torque: f64,
}

impl FrameForces {
    pub fn extract(positions: &[Vec3], forces: &[Vec3], centers: &[Vec3; 2]) -> Self {
        let (torque, symmetric_torque) = torque(positions, forces, centers);
        FrameForces {
            radial: radial_force(forces),
            torque,
            symmetric_torque,
        }
    }
}

/// Half the difference between the x force on B and the x force on A.
pub fn radial_force(forces: &[Vec3]) -> f64 {
    let ns = forces.len() / 2;
    let (a, b) = forces.split_at(ns);
    let fa: f64 = a.iter().map(|f| f.x).sum();
    let fb: f64 = b.iter().map(|f| f.x).sum();
    (fb - fa) / 2.0
}

/// Torque about the z axis, each atom relative to the center of its own
/// subunit, with the contribution of A sign-flipped.
///
/// Returns `(torque, symmetric_torque)`: the two-subunit total and the
/// subunit B part alone, both halved.
pub fn torque(positions: &[Vec3], forces: &[Vec3], centers: &[Vec3; 2]) -> (f64, f64) {
    let ns = forces.len() / 2;
    let a = -subunit_torque(&positions[..ns], &forces[..ns], &centers[0]);
    let b = subunit_torque(&positions[ns..], &forces[ns..], &centers[1]);
    ((a + b) / 2.0, b / 2.0)
}

fn subunit_torque(positions: &[Vec3], forces: &[Vec3], center: &Vec3) -> f64 {
    positions
        .iter()
        .zip(forces)
        .map(|(x, f)| {
            let dx = x.x - center.x;
            let dy = x.y - center.y;
            dx * f.y - dy * f.x
        })
        .sum()
}
