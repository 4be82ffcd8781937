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

use hashbrown::HashMap;
use indexmap::IndexMap;
use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::{PyList, PyTuple};

use crate::dataset::Dataset;
use crate::error::OracleError;
use crate::item::Item;
use crate::GroupLabel;

/// A fairness oracle: a deterministic predicate over the current ranking.
///
/// `top_k` style oracles memoise values derived from the ranking's length;
/// `reset` drops that memo.  The sweep never calls `reset` itself -- the
/// caller does, whenever the dataset portion changes.
pub trait FairnessOracle {
    fn evaluate(&mut self, ranking: &[Item]) -> Result<bool, OracleError>;

    fn reset(&mut self) {}
}

fn check_fraction(
    name: &'static str,
    range: &'static str,
    value: f64,
    valid: bool,
) -> Result<(), OracleError> {
    if valid {
        Ok(())
    } else {
        Err(OracleError::InvalidFraction { name, range, value })
    }
}

/// The FM1 fairness model: the share of one protected group within the
/// top-k prefix of the ranking may not exceed `max_protected_fraction`.
#[pyclass]
#[derive(Clone, Debug)]
pub struct ProtectedGroupCap {
    protected: GroupLabel,
    slot: usize,
    top_k_fraction: f64,
    max_protected_fraction: f64,
    top_k: Option<usize>,
}

impl ProtectedGroupCap {
    pub fn new(
        protected: GroupLabel,
        slot: usize,
        top_k_fraction: f64,
        max_protected_fraction: f64,
    ) -> Result<Self, OracleError> {
        check_fraction(
            "top_k_fraction",
            "(0, 1]",
            top_k_fraction,
            top_k_fraction > 0.0 && top_k_fraction <= 1.0,
        )?;
        check_fraction(
            "max_protected_fraction",
            "[0, 1]",
            max_protected_fraction,
            (0.0..=1.0).contains(&max_protected_fraction),
        )?;
        Ok(ProtectedGroupCap {
            protected,
            slot,
            top_k_fraction,
            max_protected_fraction,
            top_k: None,
        })
    }
}

impl FairnessOracle for ProtectedGroupCap {
    fn evaluate(&mut self, ranking: &[Item]) -> Result<bool, OracleError> {
        if ranking.is_empty() {
            return Ok(true);
        }
        let top_k = *self
            .top_k
            .get_or_insert(((ranking.len() as f64 * self.top_k_fraction) as usize).max(1));
        let max_allowed = top_k as f64 * self.max_protected_fraction;
        let mut protected = 0usize;
        for item in &ranking[..top_k.min(ranking.len())] {
            if item.group(self.slot) == Some(self.protected) {
                protected += 1;
                if protected as f64 > max_allowed {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn reset(&mut self) {
        self.top_k = None;
    }
}

#[pymethods]
impl ProtectedGroupCap {
    #[new]
    #[pyo3(signature = (dataset, protected_value, slot=0, top_k_fraction=0.3, max_protected_fraction=0.6))]
    fn py_new(
        dataset: &Dataset,
        protected_value: &str,
        slot: usize,
        top_k_fraction: f64,
        max_protected_fraction: f64,
    ) -> PyResult<Self> {
        let protected = dataset
            .group_code(protected_value)
            .ok_or_else(|| OracleError::UnknownLabel(protected_value.to_string()))?;
        Ok(Self::new(
            protected,
            slot,
            top_k_fraction,
            max_protected_fraction,
        )?)
    }

    #[pyo3(name = "reset")]
    fn py_reset(&mut self) {
        FairnessOracle::reset(self);
    }
}

/// Multi-attribute interval constraints: for every constrained label slot,
/// each group's observed share of the top-k prefix must lie inside its
/// [min_frac, max_frac] bracket.  Groups absent from the top-k count as
/// share 0 and must still satisfy their bracket.
#[pyclass]
#[derive(Clone, Debug)]
pub struct BracketedConstraints {
    constraints: IndexMap<usize, IndexMap<GroupLabel, (f64, f64)>>,
    top_k_fraction: f64,
    top_k: Option<usize>,
}

impl BracketedConstraints {
    pub fn new(
        constraints: IndexMap<usize, IndexMap<GroupLabel, (f64, f64)>>,
        top_k_fraction: f64,
    ) -> Result<Self, OracleError> {
        check_fraction(
            "top_k_fraction",
            "(0, 1]",
            top_k_fraction,
            top_k_fraction > 0.0 && top_k_fraction <= 1.0,
        )?;
        for brackets in constraints.values() {
            for &(min_frac, max_frac) in brackets.values() {
                check_fraction(
                    "min_frac",
                    "[0, 1]",
                    min_frac,
                    (0.0..=1.0).contains(&min_frac),
                )?;
                check_fraction(
                    "max_frac",
                    "[min_frac, 1]",
                    max_frac,
                    max_frac >= min_frac && max_frac <= 1.0,
                )?;
            }
        }
        Ok(BracketedConstraints {
            constraints,
            top_k_fraction,
            top_k: None,
        })
    }
}

impl FairnessOracle for BracketedConstraints {
    fn evaluate(&mut self, ranking: &[Item]) -> Result<bool, OracleError> {
        if ranking.is_empty() {
            return Ok(true);
        }
        let top_k = *self
            .top_k
            .get_or_insert(((ranking.len() as f64 * self.top_k_fraction) as usize).max(1));
        let head = &ranking[..top_k.min(ranking.len())];
        for (&slot, brackets) in &self.constraints {
            let mut counts: HashMap<GroupLabel, usize> = HashMap::with_capacity(brackets.len());
            for item in head {
                if let Some(group) = item.group(slot) {
                    *counts.entry(group).or_insert(0) += 1;
                }
            }
            for (group, &(min_frac, max_frac)) in brackets {
                let share = counts.get(group).copied().unwrap_or(0) as f64 / head.len() as f64;
                if share < min_frac || share > max_frac {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn reset(&mut self) {
        self.top_k = None;
    }
}

#[pymethods]
impl BracketedConstraints {
    #[new]
    #[pyo3(signature = (dataset, constraints, top_k_fraction=0.3))]
    fn py_new(
        dataset: &Dataset,
        constraints: IndexMap<usize, IndexMap<String, (f64, f64)>>,
        top_k_fraction: f64,
    ) -> PyResult<Self> {
        let mut resolved = IndexMap::with_capacity(constraints.len());
        for (slot, brackets) in constraints {
            let mut codes = IndexMap::with_capacity(brackets.len());
            for (label, bracket) in brackets {
                let code = dataset
                    .group_code(&label)
                    .ok_or(OracleError::UnknownLabel(label))?;
                codes.insert(code, bracket);
            }
            resolved.insert(slot, codes);
        }
        Ok(Self::new(resolved, top_k_fraction)?)
    }

    #[pyo3(name = "reset")]
    fn py_reset(&mut self) {
        FairnessOracle::reset(self);
    }
}

/// Adapter for caller-supplied native predicates.
pub struct PredicateOracle<F> {
    predicate: F,
}

impl<F> PredicateOracle<F>
where
    F: FnMut(&[Item]) -> bool,
{
    pub fn new(predicate: F) -> Self {
        PredicateOracle { predicate }
    }
}

impl<F> FairnessOracle for PredicateOracle<F>
where
    F: FnMut(&[Item]) -> bool,
{
    fn evaluate(&mut self, ranking: &[Item]) -> Result<bool, OracleError> {
        Ok((self.predicate)(ranking))
    }
}

/// Bridges a Python callable oracle.  The ranking is presented the way the
/// original oracles consume it: a list of per-item (x, y, label, ...)
/// tuples, prebuilt once per item since items never change mid-sweep.
#[derive(Clone)]
pub struct PyPredicate {
    callable: PyObject,
    // Indexed by item id; valid because datasets assign ids 0..n in row order.
    rows: Vec<Py<PyTuple>>,
}

impl PyPredicate {
    pub fn new(py: Python, callable: PyObject, dataset: &Dataset) -> PyResult<Self> {
        let rows = dataset
            .attributes()
            .iter()
            .map(|item| {
                let mut values: Vec<PyObject> = Vec::with_capacity(2 + item.groups.len());
                values.push(item.x.into_py(py));
                values.push(item.y.into_py(py));
                for group in &item.groups {
                    match dataset.label(*group) {
                        Some(label) => values.push(label.into_py(py)),
                        None => values.push(group.0.into_py(py)),
                    }
                }
                PyTuple::new_bound(py, values).unbind()
            })
            .collect();
        Ok(PyPredicate { callable, rows })
    }
}

impl FairnessOracle for PyPredicate {
    fn evaluate(&mut self, ranking: &[Item]) -> Result<bool, OracleError> {
        Python::with_gil(|py| {
            let rows = PyList::new_bound(
                py,
                ranking.iter().map(|item| self.rows[item.id.index()].clone_ref(py)),
            );
            self.callable.call1(py, (rows,))?.extract::<bool>(py)
        })
        .map_err(OracleError::from)
    }
}

/// The oracle argument accepted by the Python-facing entry points: one of
/// the built-in oracle classes, or any callable taking the ranking.
pub enum OracleArg {
    Cap(Py<ProtectedGroupCap>),
    Bracketed(Py<BracketedConstraints>),
    Predicate(PyObject),
}

impl<'py> FromPyObject<'py> for OracleArg {
    fn extract_bound(ob: &Bound<'py, PyAny>) -> PyResult<Self> {
        if let Ok(cap) = ob.extract::<Py<ProtectedGroupCap>>() {
            return Ok(OracleArg::Cap(cap));
        }
        if let Ok(bracketed) = ob.extract::<Py<BracketedConstraints>>() {
            return Ok(OracleArg::Bracketed(bracketed));
        }
        if !ob.is_callable() {
            return Err(PyTypeError::new_err(
                "oracle must be a built-in oracle class or a callable",
            ));
        }
        Ok(OracleArg::Predicate(ob.clone().unbind()))
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;
    use crate::{IdType, ItemId};

    fn item(id: IdType, x: f64, group: GroupLabel) -> Item {
        Item::new(ItemId::new(id), x, 0.0, smallvec![group])
    }

    const BLUE: GroupLabel = GroupLabel(0);
    const ORANGE: GroupLabel = GroupLabel(1);

    #[test]
    fn cap_counts_protected_share_of_head() {
        // top_k = max(1, floor(4 * 0.5)) = 2; at most half of it protected.
        let mut oracle = ProtectedGroupCap::new(BLUE, 0, 0.5, 0.5).unwrap();
        let fair = vec![
            item(0, 4.0, BLUE),
            item(1, 3.0, ORANGE),
            item(2, 2.0, BLUE),
            item(3, 1.0, BLUE),
        ];
        assert!(oracle.evaluate(&fair).unwrap());
        let unfair = vec![
            item(0, 4.0, BLUE),
            item(1, 3.0, BLUE),
            item(2, 2.0, ORANGE),
            item(3, 1.0, ORANGE),
        ];
        assert!(!oracle.evaluate(&unfair).unwrap());
    }

    #[test]
    fn cap_memoises_top_k_until_reset() {
        let mut oracle = ProtectedGroupCap::new(BLUE, 0, 0.5, 0.0).unwrap();
        let four = vec![
            item(0, 4.0, ORANGE),
            item(1, 3.0, ORANGE),
            item(2, 2.0, BLUE),
            item(3, 1.0, BLUE),
        ];
        assert!(oracle.evaluate(&four).unwrap());
        assert_eq!(oracle.top_k, Some(2));
        // Without a reset the memoised top_k sticks, as in the original.
        let two = vec![item(0, 2.0, ORANGE), item(1, 1.0, BLUE)];
        assert!(!oracle.evaluate(&two).unwrap());
        oracle.reset();
        assert_eq!(oracle.top_k, None);
        let mut fresh = oracle.clone();
        assert!(fresh.evaluate(&two[..1].to_vec()).unwrap());
    }

    #[test]
    fn cap_rejects_bad_fractions() {
        assert!(ProtectedGroupCap::new(BLUE, 0, 0.0, 0.5).is_err());
        assert!(ProtectedGroupCap::new(BLUE, 0, 1.5, 0.5).is_err());
        assert!(ProtectedGroupCap::new(BLUE, 0, 0.5, -0.1).is_err());
    }

    #[test]
    fn brackets_bound_every_group() {
        let mut brackets = IndexMap::new();
        brackets.insert(BLUE, (0.4, 0.6));
        brackets.insert(ORANGE, (0.4, 0.6));
        let mut constraints = IndexMap::new();
        constraints.insert(0usize, brackets);
        let mut oracle = BracketedConstraints::new(constraints, 1.0).unwrap();

        let balanced = vec![
            item(0, 4.0, BLUE),
            item(1, 3.0, ORANGE),
            item(2, 2.0, BLUE),
            item(3, 1.0, ORANGE),
        ];
        assert!(oracle.evaluate(&balanced).unwrap());

        let skewed = vec![
            item(0, 4.0, BLUE),
            item(1, 3.0, BLUE),
            item(2, 2.0, BLUE),
            item(3, 1.0, ORANGE),
        ];
        assert!(!oracle.evaluate(&skewed).unwrap());
    }

    #[test]
    fn brackets_fail_when_group_missing_from_head() {
        let mut brackets = IndexMap::new();
        brackets.insert(ORANGE, (0.5, 1.0));
        let mut constraints = IndexMap::new();
        constraints.insert(0usize, brackets);
        let mut oracle = BracketedConstraints::new(constraints, 0.5).unwrap();
        // top_k = 2 and the head is all blue: orange's share is 0 < 0.5.
        let ranking = vec![
            item(0, 4.0, BLUE),
            item(1, 3.0, BLUE),
            item(2, 2.0, ORANGE),
            item(3, 1.0, ORANGE),
        ];
        assert!(!oracle.evaluate(&ranking).unwrap());
    }

    #[test]
    fn brackets_reject_inverted_interval() {
        let mut brackets = IndexMap::new();
        brackets.insert(BLUE, (0.8, 0.2));
        let mut constraints = IndexMap::new();
        constraints.insert(0usize, brackets);
        assert!(BracketedConstraints::new(constraints, 0.5).is_err());
    }

    #[test]
    fn predicate_oracle_wraps_closures() {
        let mut oracle = PredicateOracle::new(|ranking: &[Item]| ranking[0].id == ItemId::new(7));
        let ranking = vec![item(7, 1.0, BLUE), item(8, 0.5, ORANGE)];
        assert!(oracle.evaluate(&ranking).unwrap());
        let ranking = vec![item(8, 1.0, BLUE), item(7, 0.5, ORANGE)];
        assert!(!oracle.evaluate(&ranking).unwrap());
    }
}
