// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

mod analyze;

pub use analyze::{analyze, useful_blocks, CexOptions, Direction, TraceInfo, TraceStep, Witness};
