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

use ndarray::ArrayView2;
use numpy::PyReadonlyArray2;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use smallvec::SmallVec;

use crate::interner::LabelInterner;
use crate::item::Item;
use crate::{GroupLabel, IdType, ItemId};

/// The dataset collaborator: scoring attributes plus opaque group labels,
/// with the prefix restriction the experiment harness uses to sweep growing
/// portions of the same data.  How rows were obtained (CSV parsing, column
/// projection, sampling) is the front-end's business; this type only holds
/// the result.
#[pyclass]
#[derive(Clone, Debug)]
pub struct Dataset {
    items: Vec<Item>,
    labels: LabelInterner,
    portion: Option<usize>,
}

impl Dataset {
    pub fn new(items: Vec<Item>, labels: LabelInterner) -> Self {
        Dataset {
            items,
            labels,
            portion: None,
        }
    }

    /// The active items: the full set, or the `set_portion` prefix.
    pub fn attributes(&self) -> &[Item] {
        let len = self.portion.unwrap_or(self.items.len()).min(self.items.len());
        &self.items[..len]
    }

    /// Restrict the active items to the first `n`.  Values beyond the full
    /// length behave like Python slicing and mean "everything".
    pub fn set_portion(&mut self, n: usize) {
        self.portion = Some(n.min(self.items.len()));
    }

    pub fn clear_portion(&mut self) {
        self.portion = None;
    }

    pub fn group_code(&self, label: &str) -> Option<GroupLabel> {
        self.labels.get(label)
    }

    pub fn label(&self, code: GroupLabel) -> Option<&str> {
        self.labels.label(code)
    }
}

/// Items from an n x 2 attribute view plus optional per-row label strings,
/// interning labels as they are first seen.  Ids are assigned in row order,
/// which the Python-callable oracle bridge relies on.
fn items_from_array(
    view: ArrayView2<'_, f64>,
    groups: Option<&[Vec<String>]>,
    labels: &mut LabelInterner,
) -> Vec<Item> {
    view.outer_iter()
        .enumerate()
        .map(|(index, row)| {
            let codes: SmallVec<[GroupLabel; 2]> = match groups {
                Some(groups) => groups[index]
                    .iter()
                    .map(|label| labels.intern(label))
                    .collect(),
                None => SmallVec::new(),
            };
            Item::new(ItemId::new(index as IdType), row[0], row[1], codes)
        })
        .collect()
}

#[pymethods]
impl Dataset {
    /// Build a dataset from an n x 2 array of scoring attributes and,
    /// optionally, one list of group-label strings per row.  The positional
    /// order of each row's labels is the slot numbering oracles use.
    #[new]
    #[pyo3(signature = (attributes, groups=None))]
    fn py_new(
        attributes: PyReadonlyArray2<f64>,
        groups: Option<Vec<Vec<String>>>,
    ) -> PyResult<Self> {
        let view = attributes.as_array();
        if view.ncols() != 2 {
            return Err(PyValueError::new_err(format!(
                "attributes must have exactly 2 columns, got {}",
                view.ncols()
            )));
        }
        if let Some(groups) = &groups {
            if groups.len() != view.nrows() {
                return Err(PyValueError::new_err(format!(
                    "got {} rows of attributes but {} rows of group labels",
                    view.nrows(),
                    groups.len()
                )));
            }
        }
        let mut labels = LabelInterner::new();
        let items = items_from_array(view, groups.as_deref(), &mut labels);
        Ok(Dataset::new(items, labels))
    }

    fn __len__(&self) -> usize {
        self.attributes().len()
    }

    #[pyo3(name = "attributes")]
    fn py_attributes(&self) -> Vec<Item> {
        self.attributes().to_vec()
    }

    #[pyo3(name = "set_portion")]
    fn py_set_portion(&mut self, n: usize) {
        self.set_portion(n);
    }

    #[pyo3(name = "clear_portion")]
    fn py_clear_portion(&mut self) {
        self.clear_portion();
    }

    /// The interned code of a group-label string, or None if the label
    /// never occurs in the dataset.
    #[pyo3(name = "group_code")]
    fn py_group_code(&self, label: &str) -> Option<IdType> {
        self.group_code(label).map(|code| code.0)
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;

    fn sample() -> Dataset {
        let mut labels = LabelInterner::new();
        let blue = labels.intern("blue");
        let orange = labels.intern("orange");
        let items = vec![
            Item::new(ItemId::new(0), 3.0, 1.0, smallvec![blue]),
            Item::new(ItemId::new(1), 2.0, 2.0, smallvec![orange]),
            Item::new(ItemId::new(2), 1.0, 3.0, smallvec![blue]),
        ];
        Dataset::new(items, labels)
    }

    #[test]
    fn portion_restricts_to_prefix() {
        let mut dataset = sample();
        assert_eq!(dataset.attributes().len(), 3);
        dataset.set_portion(2);
        assert_eq!(dataset.attributes().len(), 2);
        assert_eq!(dataset.attributes()[1].id, ItemId::new(1));
        dataset.clear_portion();
        assert_eq!(dataset.attributes().len(), 3);
    }

    #[test]
    fn oversized_portion_means_everything() {
        let mut dataset = sample();
        dataset.set_portion(10);
        assert_eq!(dataset.attributes().len(), 3);
    }

    #[test]
    fn group_codes_resolve() {
        let dataset = sample();
        let blue = dataset.group_code("blue").unwrap();
        assert_eq!(dataset.label(blue), Some("blue"));
        assert!(dataset.group_code("green").is_none());
    }
}
