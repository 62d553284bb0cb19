// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

mod engine;

pub use engine::{formula_entails, AbstractionEngine, AbstractionKind, AbstractionOptions};
