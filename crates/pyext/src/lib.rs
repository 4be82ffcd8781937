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

use pyo3::prelude::*;

use fairrank_accelerate::experiment::experiment_mod;
use fairrank_accelerate::online::online_mod;
use fairrank_accelerate::sweep::sweep_mod;
use fairrank_ranking::ranking_mod;

fn add_submodule(
    m: &Bound<PyModule>,
    constructor: fn(&Bound<PyModule>) -> PyResult<()>,
    name: &str,
) -> PyResult<()> {
    let submodule = PyModule::new_bound(m.py(), name)?;
    constructor(&submodule)?;
    m.add_submodule(&submodule)
}

#[pymodule]
fn _fairrank(m: &Bound<PyModule>) -> PyResult<()> {
    add_submodule(m, ranking_mod, "ranking")?;
    add_submodule(m, sweep_mod, "sweep")?;
    add_submodule(m, online_mod, "online")?;
    add_submodule(m, experiment_mod, "experiment")?;
    Ok(())
}
