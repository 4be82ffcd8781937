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

use pyo3::exceptions::PyValueError;
use pyo3::PyErr;
use thiserror::Error;

/// Errors surfaced by the sweep and the online locator.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("dataset must contain at least two items, got {0}")]
    EmptyDataset(usize),
    #[error("online query requires the boundary list of a sweep that found at least one satisfactory region")]
    NoSatisfactoryRegions,
    #[error("weights must be non-negative and not both zero, got ({w1}, {w2})")]
    InvalidWeights { w1: f64, w2: f64 },
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Errors raised while constructing or evaluating a fairness oracle.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("{name} must lie in {range}, got {value}")]
    InvalidFraction {
        name: &'static str,
        range: &'static str,
        value: f64,
    },
    #[error("group label {0:?} does not occur in the dataset")]
    UnknownLabel(String),
    #[error(transparent)]
    Python(#[from] PyErr),
}

impl From<SweepError> for PyErr {
    fn from(err: SweepError) -> PyErr {
        match err {
            SweepError::Oracle(err) => err.into(),
            err => PyValueError::new_err(err.to_string()),
        }
    }
}

impl From<OracleError> for PyErr {
    fn from(err: OracleError) -> PyErr {
        match err {
            OracleError::Python(err) => err,
            err => PyValueError::new_err(err.to_string()),
        }
    }
}
