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

use std::time::Instant;

use numpy::{IntoPyArray, PyArray1};
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;
use rand::prelude::*;
use rand_pcg::Pcg64Mcg;
use rayon::prelude::*;
use smallvec::smallvec;

use fairrank_ranking::dataset::Dataset;
use fairrank_ranking::interner::LabelInterner;
use fairrank_ranking::item::Item;
use fairrank_ranking::oracle::{FairnessOracle, OracleArg, PyPredicate};
use fairrank_ranking::{GroupLabel, IdType, ItemId, SweepError};

use crate::getenv_use_multiple_threads;
use crate::sweep::two_d_array_sweep_inner;

/// Preprocessing cost of one dataset prefix.
#[derive(Clone, Copy, Debug)]
pub struct BatchReport {
    pub n: usize,
    pub seconds: f64,
    pub intersections: usize,
}

/// The prefix sizes the experiment sweeps: every multiple of `batch` below
/// the full length, then the full length itself.
fn batch_sizes(n: usize, batch: usize) -> Vec<usize> {
    let batch = batch.max(1);
    let mut sizes: Vec<usize> = (1..)
        .map(|step| step * batch)
        .take_while(|&size| size < n)
        .collect();
    sizes.push(n);
    sizes
}

/// Time the preprocessing sweep over growing prefixes of `items`.
///
/// Each batch owns a fresh copy of its prefix and a reset clone of the
/// oracle, so batches are independent of each other and may run on
/// separate threads.
pub fn run_experiment_inner<O>(
    items: &[Item],
    oracle: &O,
    batch: usize,
    run_in_parallel: bool,
) -> Result<Vec<BatchReport>, SweepError>
where
    O: FairnessOracle + Clone + Sync,
{
    let sizes = batch_sizes(items.len(), batch);
    let run_batch = |&size: &usize| -> Result<BatchReport, SweepError> {
        let mut oracle = oracle.clone();
        oracle.reset();
        let prefix = items[..size].to_vec();
        let start = Instant::now();
        let (_, stats) = two_d_array_sweep_inner(prefix, &mut oracle)?;
        Ok(BatchReport {
            n: size,
            seconds: start.elapsed().as_secs_f64(),
            intersections: stats.intersections,
        })
    };
    if run_in_parallel {
        sizes.par_iter().map(run_batch).collect()
    } else {
        sizes.iter().map(run_batch).collect()
    }
}

/// Seeded synthetic items for empirical complexity studies: coordinates
/// uniform in [0, 1), one group label uniform over `groups` codes.
pub fn synthetic_items(n: usize, groups: IdType, seed: u64) -> Vec<Item> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let groups = groups.max(1);
    (0..n)
        .map(|index| {
            let x: f64 = rng.gen();
            let y: f64 = rng.gen();
            let group = GroupLabel::new(rng.gen_range(0..groups));
            Item::new(ItemId::new(index as IdType), x, y, smallvec![group])
        })
        .collect()
}

/// Replicates the preprocessing study of the original experiments: runtime
/// and intersection counts as the dataset prefix grows.
///
/// Returns:
///     (sizes, seconds, intersections): three aligned arrays, one entry per
///     swept prefix, ready for plotting.
#[pyfunction]
#[pyo3(signature = (dataset, oracle, batch=200, run_in_parallel=None))]
pub fn run_experiment<'py>(
    py: Python<'py>,
    dataset: &Dataset,
    oracle: OracleArg,
    batch: usize,
    run_in_parallel: Option<bool>,
) -> PyResult<(
    Bound<'py, PyArray1<usize>>,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<usize>>,
)> {
    let items = dataset.attributes();
    let many = batch_sizes(items.len(), batch).len() > 1;
    let reports = match &oracle {
        OracleArg::Cap(cap) => {
            let oracle = cap.borrow(py).clone();
            let parallel = run_in_parallel.unwrap_or_else(|| getenv_use_multiple_threads() && many);
            run_experiment_inner(items, &oracle, batch, parallel)
        }
        OracleArg::Bracketed(bracketed) => {
            let oracle = bracketed.borrow(py).clone();
            let parallel = run_in_parallel.unwrap_or_else(|| getenv_use_multiple_threads() && many);
            run_experiment_inner(items, &oracle, batch, parallel)
        }
        OracleArg::Predicate(callable) => {
            // Python callables hold the GIL, so their batches run serially.
            let oracle = PyPredicate::new(py, callable.clone_ref(py), dataset)?;
            run_experiment_inner(items, &oracle, batch, false)
        }
    }?;
    let sizes: Vec<usize> = reports.iter().map(|report| report.n).collect();
    let seconds: Vec<f64> = reports.iter().map(|report| report.seconds).collect();
    let intersections: Vec<usize> = reports.iter().map(|report| report.intersections).collect();
    Ok((
        sizes.into_pyarray_bound(py),
        seconds.into_pyarray_bound(py),
        intersections.into_pyarray_bound(py),
    ))
}

/// A seeded synthetic dataset with `groups` distinct labels in slot 0,
/// convenient for demos and complexity studies.
#[pyfunction]
#[pyo3(signature = (n, groups=2, seed=0))]
pub fn synthetic_dataset(n: usize, groups: IdType, seed: u64) -> Dataset {
    let items = synthetic_items(n, groups, seed);
    let mut labels = LabelInterner::new();
    for code in 0..groups.max(1) {
        labels.intern(&code.to_string());
    }
    Dataset::new(items, labels)
}

pub fn experiment_mod(m: &Bound<PyModule>) -> PyResult<()> {
    m.add_wrapped(wrap_pyfunction!(run_experiment))?;
    m.add_wrapped(wrap_pyfunction!(synthetic_dataset))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use fairrank_ranking::oracle::ProtectedGroupCap;

    use super::*;

    #[test]
    fn batch_schedule_covers_the_full_set() {
        assert_eq!(batch_sizes(500, 200), vec![200, 400, 500]);
        assert_eq!(batch_sizes(600, 200), vec![200, 400, 600]);
        assert_eq!(batch_sizes(150, 200), vec![150]);
        // A zero batch is clamped to one rather than looping forever.
        assert_eq!(batch_sizes(3, 0), vec![1, 2, 3]);
    }

    #[test]
    fn reports_align_with_the_schedule() {
        let items = synthetic_items(25, 2, 7);
        let oracle = ProtectedGroupCap::new(GroupLabel(0), 0, 0.3, 0.6).unwrap();
        let reports = run_experiment_inner(&items, &oracle, 10, false).unwrap();
        let sizes: Vec<usize> = reports.iter().map(|report| report.n).collect();
        assert_eq!(sizes, vec![10, 20, 25]);
        for report in &reports {
            assert!(report.intersections <= report.n * (report.n - 1) / 2);
            assert!(report.seconds >= 0.0);
        }
    }

    #[test]
    fn parallel_and_serial_agree_on_intersections() {
        let items = synthetic_items(30, 3, 11);
        let oracle = ProtectedGroupCap::new(GroupLabel(1), 0, 0.5, 0.5).unwrap();
        let serial = run_experiment_inner(&items, &oracle, 12, false).unwrap();
        let parallel = run_experiment_inner(&items, &oracle, 12, true).unwrap();
        let serial: Vec<usize> = serial.iter().map(|report| report.intersections).collect();
        let parallel: Vec<usize> = parallel.iter().map(|report| report.intersections).collect();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn synthetic_items_are_deterministic_per_seed() {
        let a = synthetic_items(8, 2, 42);
        let b = synthetic_items(8, 2, 42);
        assert_eq!(a, b);
        let c = synthetic_items(8, 2, 43);
        assert_ne!(a, c);
    }
}
