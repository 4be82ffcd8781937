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

pub mod dataset;
pub mod interner;
pub mod item;
pub mod oracle;
pub mod regions;

mod error;

pub use error::{OracleError, SweepError};

use pyo3::prelude::*;

pub type IdType = u32;

/// Identity of an item within its dataset.  Items are compared by id in the
/// stale-event check, never by coordinates, so duplicate (x, y) pairs stay
/// distinguishable.
#[derive(Copy, Clone, Debug, Hash, Ord, PartialOrd, Eq, PartialEq)]
pub struct ItemId(pub IdType);

/// Interned code of a group-label string.  Oracles compare codes; the
/// owning dataset's interner maps them back to strings.
#[derive(Copy, Clone, Debug, Hash, Ord, PartialOrd, Eq, PartialEq)]
pub struct GroupLabel(pub IdType);

impl ItemId {
    #[inline]
    pub fn new(id: IdType) -> Self {
        ItemId(id)
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl GroupLabel {
    #[inline]
    pub fn new(code: IdType) -> Self {
        GroupLabel(code)
    }
}

impl From<IdType> for ItemId {
    fn from(value: IdType) -> Self {
        ItemId(value)
    }
}

impl From<ItemId> for IdType {
    fn from(value: ItemId) -> Self {
        value.0
    }
}

impl From<IdType> for GroupLabel {
    fn from(value: IdType) -> Self {
        GroupLabel(value)
    }
}

impl From<GroupLabel> for IdType {
    fn from(value: GroupLabel) -> Self {
        value.0
    }
}

pub fn ranking_mod(m: &Bound<PyModule>) -> PyResult<()> {
    m.add_class::<item::Item>()?;
    m.add_class::<dataset::Dataset>()?;
    m.add_class::<oracle::ProtectedGroupCap>()?;
    m.add_class::<oracle::BracketedConstraints>()?;
    m.add_class::<regions::BoundaryKind>()?;
    m.add_class::<regions::Boundary>()?;
    m.add_class::<regions::SatisfactoryRegions>()?;
    Ok(())
}
