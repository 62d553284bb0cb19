// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::error::Result;
use crate::ir::{Context, ExprRef};

#[derive(Debug, Clone, Copy)]
pub struct SmtSolverCmd {
    pub name: &'static str,
    pub args: &'static [&'static str],
    pub supports_uf: bool,
    pub supports_interpolation: bool,
}

pub const MATHSAT_CMD: SmtSolverCmd = SmtSolverCmd {
    name: "mathsat",
    args: &[],
    supports_uf: true,
    supports_interpolation: true,
};

pub const Z3_CMD: SmtSolverCmd = SmtSolverCmd {
    name: "z3",
    args: &["-smt2", "-in"],
    supports_uf: true,
    supports_interpolation: false,
};

pub const CVC5_CMD: SmtSolverCmd = SmtSolverCmd {
    name: "cvc5",
    args: &["--incremental", "--lang", "smt2"],
    supports_uf: true,
    supports_interpolation: false,
};

/// What a session is opened for. Only affects solver options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    CartesianAbstraction,
    CounterexampleAnalysis,
    EntailmentCheck,
}

/// Result of all-SAT enumeration over a fixed atom vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllSat {
    /// enumeration terminated with this many models
    Models(usize),
    /// the model limit was exceeded, callers must over-approximate
    Unbounded,
}

/// An incremental solver session used for abstraction and feasibility queries.
pub trait ProverSession {
    fn push(&mut self) -> Result<()>;
    fn pop(&mut self) -> Result<()>;
    /// Current assertion stack depth, for balance checks.
    fn depth(&self) -> usize;
    fn assert_formula(&mut self, ctx: &Context, e: ExprRef) -> Result<()>;
    fn is_unsat(&mut self) -> Result<bool>;
    /// Enumerates all models of the current assertions projected onto `atoms`.
    /// `on_model` receives one truth vector per model, aligned with `atoms`.
    fn all_sat(
        &mut self,
        ctx: &Context,
        atoms: &[ExprRef],
        on_model: &mut dyn FnMut(&[bool]),
    ) -> Result<AllSat>;
}

/// An assertion group handle of an interpolating session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Group(u32);

impl Group {
    pub fn new(id: u32) -> Self {
        Group(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Session against an interpolating solver. Formulas are asserted into named
/// groups so that interpolants can be requested for any trace cut.
pub trait InterpolatingSession {
    fn add_formula(&mut self, ctx: &Context, e: ExprRef) -> Result<Group>;
    fn is_unsat(&mut self) -> Result<bool>;
    /// The interpolant for partition A = `a_groups`, B = the rest. Only valid
    /// after `is_unsat` returned true.
    fn interpolant(&mut self, ctx: &mut Context, a_groups: &[Group]) -> Result<ExprRef>;
    /// Model values for the given symbols. Only valid after `is_unsat`
    /// returned false.
    fn witness_values(
        &mut self,
        ctx: &mut Context,
        symbols: &[ExprRef],
    ) -> Result<Vec<(ExprRef, ExprRef)>>;
    fn reset(&mut self) -> Result<()>;
}

/// Runs `body` between a push and a pop. The pop happens on every exit path,
/// which keeps the assertion stack balanced by construction.
pub fn with_frame<S: ProverSession + ?Sized, T>(
    session: &mut S,
    body: impl FnOnce(&mut S) -> Result<T>,
) -> Result<T> {
    session.push()?;
    let result = body(session);
    // the pop runs even when the body failed; a failed pop wins since it
    // means the session state itself can no longer be trusted
    session.pop()?;
    result
}
