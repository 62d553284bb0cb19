// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

mod easy;
mod interpolate;
mod parse;
mod serialize;
mod session;

pub use easy::{SmtSession, SmtSessionOptions};
pub use interpolate::ItpPipe;
pub use parse::{parse_smt_expr, parse_values};
pub use serialize::{
    apply_const_name, collect_declarations, convert_expr, convert_tpe, escape_smt_identifier,
    write_smt,
};
pub use session::{
    with_frame, AllSat, Group, InterpolatingSession, ProverSession, Purpose, SmtSolverCmd,
    CVC5_CMD, MATHSAT_CMD, Z3_CMD,
};
