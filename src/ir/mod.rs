// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>
mod analysis;
mod axioms;
mod context;
mod eval;
mod expr;
mod serialize;
mod traversal;

pub use analysis::{collect_applications, collect_atoms, collect_symbols, contains_application};
pub use axioms::congruence_axioms;
pub use context::{Context, StringRef};
pub use eval::{eval, eval_bool, Value};
pub use expr::{Args, Expr, ExprRef, Type};
pub use serialize::serialize_expr;
pub use traversal::{bottom_up, transform_expr};
