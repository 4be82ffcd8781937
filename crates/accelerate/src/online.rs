// This code is part of Fairrank.
//
// (C) Copyright Fairrank Contributors 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

use std::f64::consts::FRAC_PI_2;

use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use fairrank_ranking::regions::{Boundary, BoundaryKind, SatisfactoryRegions};
use fairrank_ranking::SweepError;

/// Closest-satisfactory-direction query against a sweep's boundary list.
///
/// The caller's weights come back unchanged when their direction already
/// lies inside a satisfactory region; otherwise the nearer of the two
/// bracketing boundary angles is returned at the caller's magnitude.
pub fn two_d_online_inner(
    boundaries: &[Boundary],
    w1: f64,
    w2: f64,
) -> Result<(f64, f64), SweepError> {
    if w1 < 0.0 || w2 < 0.0 || (w1 == 0.0 && w2 == 0.0) {
        return Err(SweepError::InvalidWeights { w1, w2 });
    }
    if boundaries.len() < 2 {
        return Err(SweepError::NoSatisfactoryRegions);
    }
    let r = w1.hypot(w2);
    let theta = if w1 == 0.0 { FRAC_PI_2 } else { w2.atan2(w1) };

    // Bracket theta: low is the largest index whose angle is <= theta
    // (clamped into range), high the one after it.
    let (mut low, mut high) = (0, boundaries.len() - 1);
    while high - low > 1 {
        let mid = (low + high) / 2;
        if boundaries[mid].theta < theta {
            low = mid;
        } else {
            high = mid;
        }
    }

    if boundaries[low].kind == BoundaryKind::Start
        && boundaries[low].theta <= theta
        && theta < boundaries[high].theta
    {
        return Ok((w1, w2));
    }

    let snapped = if theta - boundaries[low].theta < boundaries[high].theta - theta {
        boundaries[low].theta
    } else {
        boundaries[high].theta
    };
    Ok((r * snapped.cos(), r * snapped.sin()))
}

/// Online phase: report the caller's weights when they already induce a
/// satisfactory ranking, or the closest satisfactory direction at the same
/// magnitude.
#[pyfunction]
pub fn two_d_online(regions: &SatisfactoryRegions, w1: f64, w2: f64) -> PyResult<(f64, f64)> {
    Ok(two_d_online_inner(regions.boundaries(), w1, w2)?)
}

pub fn online_mod(m: &Bound<PyModule>) -> PyResult<()> {
    m.add_wrapped(wrap_pyfunction!(two_d_online))?;
    Ok(())
}
