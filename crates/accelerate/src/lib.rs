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

use std::env;

pub mod event_queue;
pub mod experiment;
pub mod online;
pub mod sweep;

/// Whether the process-level default allows fanning work out across
/// threads.  `FAIRRANK_IN_PARALLEL` is set to `TRUE` by front-ends that
/// already run inside an outer process pool; `FAIRRANK_FORCE_THREADS`
/// overrides that and forces threading anyway.
#[inline]
pub fn getenv_use_multiple_threads() -> bool {
    let parallel_context = env::var("FAIRRANK_IN_PARALLEL")
        .unwrap_or_else(|_| "FALSE".to_string())
        .to_uppercase()
        == "TRUE";
    let force_threads = env::var("FAIRRANK_FORCE_THREADS")
        .unwrap_or_else(|_| "FALSE".to_string())
        .to_uppercase()
        == "TRUE";
    !parallel_context || force_threads
}
