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

use std::cmp::Ordering;

use pyo3::prelude::*;
use smallvec::SmallVec;

use crate::{GroupLabel, IdType, ItemId};

/// A single ranked record: two scoring coordinates plus the interned group
/// labels the fairness oracles inspect.  Items are immutable once a sweep
/// starts; only `x` and `y` participate in ordering arithmetic.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: ItemId,
    #[pyo3(get)]
    pub x: f64,
    #[pyo3(get)]
    pub y: f64,
    pub groups: SmallVec<[GroupLabel; 2]>,
}

impl Item {
    pub fn new(id: ItemId, x: f64, y: f64, groups: SmallVec<[GroupLabel; 2]>) -> Self {
        Item { id, x, y, groups }
    }

    /// Score under the weight vector (w1, w2).
    #[inline]
    pub fn score(&self, w1: f64, w2: f64) -> f64 {
        w1 * self.x + w2 * self.y
    }

    /// The group label stored at positional `slot`, as agreed between the
    /// dataset and the oracle.
    #[inline]
    pub fn group(&self, slot: usize) -> Option<GroupLabel> {
        self.groups.get(slot).copied()
    }
}

#[pymethods]
impl Item {
    #[getter]
    fn id(&self) -> IdType {
        self.id.0
    }

    fn groups(&self) -> Vec<IdType> {
        self.groups.iter().map(|group| group.0).collect()
    }

    fn __repr__(&self) -> String {
        format!("Item(id={}, x={}, y={})", self.id.0, self.x, self.y)
    }
}

/// Single owner of the mutable ordering the sweep engine rearranges.
/// Position 0 is the best rank.  The engine mutates it through
/// `swap_adjacent` only; oracles see the read-only `as_slice` view.
#[derive(Clone, Debug, Default)]
pub struct Ranking {
    items: Vec<Item>,
}

impl Ranking {
    pub fn new(items: Vec<Item>) -> Self {
        Ranking { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> &Item {
        &self.items[index]
    }

    /// Exchange the items at positions `index` and `index + 1`.
    #[inline]
    pub fn swap_adjacent(&mut self, index: usize) {
        self.items.swap(index, index + 1);
    }

    pub fn as_slice(&self) -> &[Item] {
        &self.items
    }

    /// Sort descending by x.  This is the ranking at theta = 0, direction
    /// (1, 0); the sort is stable so ties keep their prior order.
    pub fn sort_descending_by_x(&mut self) {
        self.items
            .sort_by(|a, b| b.x.partial_cmp(&a.x).unwrap_or(Ordering::Equal));
    }
}

/// The ranking of `items` under the direction (cos theta, sin theta),
/// ties broken by input order.  Used to cross-check the incremental
/// ordering maintained by the sweep.
pub fn rank_at_angle(items: &[Item], theta: f64) -> Ranking {
    let (w1, w2) = (theta.cos(), theta.sin());
    let mut items = items.to_vec();
    items.sort_by(|a, b| {
        b.score(w1, w2)
            .partial_cmp(&a.score(w1, w2))
            .unwrap_or(Ordering::Equal)
    });
    Ranking::new(items)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use smallvec::smallvec;

    use super::*;

    fn item(id: IdType, x: f64, y: f64) -> Item {
        Item::new(ItemId::new(id), x, y, smallvec![])
    }

    #[test]
    fn swap_adjacent_exchanges_positions() {
        let mut ranking = Ranking::new(vec![item(0, 2.0, 0.0), item(1, 0.0, 2.0)]);
        ranking.swap_adjacent(0);
        assert_eq!(ranking.get(0).id, ItemId::new(1));
        assert_eq!(ranking.get(1).id, ItemId::new(0));
    }

    #[test]
    fn rank_at_zero_matches_descending_x() {
        let items = vec![item(0, 1.0, 5.0), item(1, 3.0, 0.0), item(2, 2.0, 1.0)];
        let ranking = rank_at_angle(&items, 0.0);
        let ids: Vec<IdType> = ranking.as_slice().iter().map(|i| i.id.0).collect();
        assert_eq!(ids, vec![1, 2, 0]);
    }

    #[test]
    fn rank_at_half_pi_orders_by_y() {
        let items = vec![item(0, 1.0, 5.0), item(1, 3.0, 0.0), item(2, 2.0, 1.0)];
        let ranking = rank_at_angle(&items, FRAC_PI_2);
        let ids: Vec<IdType> = ranking.as_slice().iter().map(|i| i.id.0).collect();
        assert_eq!(ids, vec![0, 2, 1]);
    }

    #[test]
    fn ties_keep_input_order() {
        let items = vec![item(0, 1.0, 1.0), item(1, 1.0, 1.0), item(2, 1.0, 1.0)];
        let ranking = rank_at_angle(&items, 0.3);
        let ids: Vec<IdType> = ranking.as_slice().iter().map(|i| i.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
