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

use itertools::Itertools;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use fairrank_ranking::dataset::Dataset;
use fairrank_ranking::item::{Item, Ranking};
use fairrank_ranking::oracle::{FairnessOracle, OracleArg, PyPredicate};
use fairrank_ranking::regions::{Boundary, SatisfactoryRegions};
use fairrank_ranking::SweepError;

use crate::event_queue::{Event, EventQueue};

/// Counters gathered while sweeping.
#[pyclass]
#[derive(Clone, Copy, Debug, Default)]
pub struct SweepStats {
    /// Valid adjacent exchanges performed (the "intersections count").
    #[pyo3(get)]
    pub intersections: usize,
    /// Popped events rejected by the identity check.
    #[pyo3(get)]
    pub stale_events: usize,
}

/// The exchange angle of an adjacent pair, when the pair can swap inside
/// the sweep domain.  `left` currently outranks `right`; the two tie where
/// w1*left.x + w2*left.y = w1*right.x + w2*right.y, at slope
/// (right.x - left.x) / (left.y - right.y).  Pairs with left.y >= right.y
/// never exchange in [0, pi/2]; equal y is an exact comparison, which also
/// keeps the division well-defined.
fn exchange_angle(left: &Item, right: &Item) -> Option<f64> {
    if left.y >= right.y {
        return None;
    }
    let theta = ((right.x - left.x) / (left.y - right.y)).atan();
    (0.0..=FRAC_PI_2).contains(&theta).then_some(theta)
}

/// Push the event for the pair at positions (index, index + 1), when one
/// exists.
fn push_pair_event(queue: &mut EventQueue, ordering: &Ranking, index: usize) {
    if index + 1 >= ordering.len() {
        return;
    }
    let (left, right) = (ordering.get(index), ordering.get(index + 1));
    if let Some(theta) = exchange_angle(left, right) {
        queue.push(Event {
            theta,
            index,
            left: left.id,
            right: right.id,
        });
    }
}

/// Validate a popped event against the live ordering; on a match, perform
/// the swap and refresh the two pairs whose membership changed.  Returns
/// false for stale events, which do not advance the sweep.
fn apply_event(
    ordering: &mut Ranking,
    queue: &mut EventQueue,
    event: &Event,
    stats: &mut SweepStats,
) -> bool {
    let index = event.index;
    if index + 1 >= ordering.len()
        || ordering.get(index).id != event.left
        || ordering.get(index + 1).id != event.right
    {
        stats.stale_events += 1;
        return false;
    }
    ordering.swap_adjacent(index);
    stats.intersections += 1;
    if let Some(previous) = index.checked_sub(1) {
        push_pair_event(queue, ordering, previous);
    }
    push_pair_event(queue, ordering, index + 1);
    true
}

/// Rotational plane sweep over theta in [0, pi/2].
///
/// Enumerates every adjacent-pair ordering exchange in angular order,
/// evaluates the oracle after each valid swap, and records the angular
/// boundaries of the satisfactory regions.  The boundary list comes out
/// ascending in theta with alternating Start/End kinds; a region still
/// open when the events run out is closed at pi/2.
pub fn two_d_array_sweep_inner(
    items: Vec<Item>,
    oracle: &mut dyn FairnessOracle,
) -> Result<(SatisfactoryRegions, SweepStats), SweepError> {
    if items.len() < 2 {
        return Err(SweepError::EmptyDataset(items.len()));
    }
    let mut ordering = Ranking::new(items);
    ordering.sort_descending_by_x();

    let mut queue = EventQueue::new();
    for ((index, left), (_, right)) in ordering.as_slice().iter().enumerate().tuple_windows() {
        if let Some(theta) = exchange_angle(left, right) {
            queue.push(Event {
                theta,
                index,
                left: left.id,
                right: right.id,
            });
        }
    }

    let mut boundaries: Vec<Boundary> = Vec::new();
    let mut stats = SweepStats::default();

    // Phase 1: advance until the ordering first becomes satisfactory.
    let mut flag = oracle.evaluate(ordering.as_slice())?;
    if flag {
        boundaries.push(Boundary::start(0.0));
    }
    while !flag {
        let Some(event) = queue.pop() else {
            // No satisfactory direction exists in [0, pi/2].
            return Ok((SatisfactoryRegions::new(boundaries), stats));
        };
        if !apply_event(&mut ordering, &mut queue, &event, &mut stats) {
            continue;
        }
        flag = oracle.evaluate(ordering.as_slice())?;
        if flag {
            boundaries.push(Boundary::start(event.theta));
        }
    }

    // Phase 2: record every satisfactory/unsatisfactory transition.
    while let Some(event) = queue.pop() {
        if !apply_event(&mut ordering, &mut queue, &event, &mut stats) {
            continue;
        }
        let now = oracle.evaluate(ordering.as_slice())?;
        if flag && !now {
            boundaries.push(Boundary::end(event.theta));
        } else if !flag && now {
            boundaries.push(Boundary::start(event.theta));
        }
        flag = now;
    }
    if flag {
        boundaries.push(Boundary::end(FRAC_PI_2));
    }
    Ok((SatisfactoryRegions::new(boundaries), stats))
}

/// Run the offline sweep for `dataset` under `oracle`.
///
/// Returns:
///     (SatisfactoryRegions, SweepStats): the sorted region boundaries and
///     the counters gathered while sweeping.
#[pyfunction]
pub fn two_d_array_sweep(
    py: Python,
    dataset: &Dataset,
    oracle: OracleArg,
) -> PyResult<(SatisfactoryRegions, SweepStats)> {
    let items = dataset.attributes().to_vec();
    let result = match &oracle {
        OracleArg::Cap(cap) => {
            let mut oracle = cap.borrow_mut(py);
            two_d_array_sweep_inner(items, &mut *oracle)
        }
        OracleArg::Bracketed(bracketed) => {
            let mut oracle = bracketed.borrow_mut(py);
            two_d_array_sweep_inner(items, &mut *oracle)
        }
        OracleArg::Predicate(callable) => {
            let mut oracle = PyPredicate::new(py, callable.clone_ref(py), dataset)?;
            two_d_array_sweep_inner(items, &mut oracle)
        }
    };
    Ok(result?)
}

pub fn sweep_mod(m: &Bound<PyModule>) -> PyResult<()> {
    m.add_wrapped(wrap_pyfunction!(two_d_array_sweep))?;
    m.add_class::<SweepStats>()?;
    Ok(())
}
