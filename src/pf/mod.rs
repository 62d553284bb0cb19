// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>
mod path;
mod ssa;

pub use path::{concat, instantiate, merge, shift_after, uninstantiate, PathFormula};
pub use ssa::{name_at, split_versioned, SsaMap, FIRST_VERSION};
