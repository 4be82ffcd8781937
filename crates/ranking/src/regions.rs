// This code is part of Fairrank.
//
// (C) Copyright Fairrank Contributors 2024
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

use itertools::Itertools;
use pyo3::exceptions::PyIndexError;
use pyo3::prelude::*;

/// Whether a boundary opens or closes a satisfactory region.  The integer
/// values are the wire convention of the boundary tuples: 0 starts a
/// region, 1 ends it.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryKind {
    Start = 0,
    End = 1,
}

/// An angular boundary of a satisfactory region, in radians.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boundary {
    #[pyo3(get)]
    pub theta: f64,
    #[pyo3(get)]
    pub kind: BoundaryKind,
}

impl Boundary {
    pub fn start(theta: f64) -> Self {
        Boundary {
            theta,
            kind: BoundaryKind::Start,
        }
    }

    pub fn end(theta: f64) -> Self {
        Boundary {
            theta,
            kind: BoundaryKind::End,
        }
    }
}

/// The durable artifact of a sweep: region boundaries in ascending angular
/// order, kinds alternating Start/End.
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct SatisfactoryRegions {
    boundaries: Vec<Boundary>,
}

impl SatisfactoryRegions {
    pub fn new(boundaries: Vec<Boundary>) -> Self {
        SatisfactoryRegions { boundaries }
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// True when a query direction inside `[start, end)` of some region
    /// would satisfy the oracle, i.e. when any region exists at all.
    pub fn has_regions(&self) -> bool {
        self.boundaries.len() >= 2
    }

    /// The midpoint angle of every (Start, End) interval, in order.
    pub fn midpoints(&self) -> Vec<f64> {
        self.boundaries
            .iter()
            .tuples()
            .map(|(start, end)| 0.5 * (start.theta + end.theta))
            .collect()
    }

    /// Whether `theta` lies inside some satisfactory interval `[start, end)`.
    pub fn contains_angle(&self, theta: f64) -> bool {
        self.boundaries
            .iter()
            .tuples()
            .any(|(start, end)| start.theta <= theta && theta < end.theta)
    }
}

#[pymethods]
impl SatisfactoryRegions {
    fn __len__(&self) -> usize {
        self.boundaries.len()
    }

    fn __getitem__(&self, index: usize) -> PyResult<(f64, u8)> {
        self.boundaries
            .get(index)
            .map(|boundary| (boundary.theta, boundary.kind as u8))
            .ok_or_else(|| PyIndexError::new_err(format!("boundary index {index} out of range")))
    }

    /// The boundaries as (theta, kind) tuples with Start = 0 and End = 1,
    /// the shape the plotting front-end consumes.
    fn as_tuples(&self) -> Vec<(f64, u8)> {
        self.boundaries
            .iter()
            .map(|boundary| (boundary.theta, boundary.kind as u8))
            .collect()
    }

    #[pyo3(name = "midpoints")]
    fn py_midpoints(&self) -> Vec<f64> {
        self.midpoints()
    }

    #[pyo3(name = "has_regions")]
    fn py_has_regions(&self) -> bool {
        self.has_regions()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_abs_diff_eq;

    use super::*;

    fn regions() -> SatisfactoryRegions {
        SatisfactoryRegions::new(vec![
            Boundary::start(0.0),
            Boundary::end(0.2),
            Boundary::start(1.0),
            Boundary::end(FRAC_PI_2),
        ])
    }

    #[test]
    fn midpoints_pair_start_with_end() {
        let midpoints = regions().midpoints();
        assert_eq!(midpoints.len(), 2);
        assert_abs_diff_eq!(midpoints[0], 0.1);
        assert_abs_diff_eq!(midpoints[1], 0.5 * (1.0 + FRAC_PI_2));
    }

    #[test]
    fn contains_angle_is_half_open() {
        let regions = regions();
        assert!(regions.contains_angle(0.0));
        assert!(regions.contains_angle(0.1));
        assert!(!regions.contains_angle(0.2));
        assert!(!regions.contains_angle(0.5));
        assert!(regions.contains_angle(1.2));
    }

    #[test]
    fn empty_result_has_no_regions() {
        assert!(!SatisfactoryRegions::default().has_regions());
        assert!(regions().has_regions());
    }
}
