// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

pub mod abs;
pub mod art;
pub mod bdd;
pub mod cache;
pub mod cex;
pub mod error;
pub mod ir;
pub mod pf;
pub mod prec;
pub mod refine;
pub mod smt;

pub use error::{EngineError, Result};
pub use refine::Verdict;
