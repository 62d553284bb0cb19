// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::error::{EngineError, Result};
use crate::ir::{Context, ExprRef};
use crate::smt::serialize::{collect_declarations, convert_expr, convert_tpe, escape_smt_identifier};
use crate::smt::session::{AllSat, ProverSession, Purpose, SmtSolverCmd};
use easy_smt as smt;
use log::debug;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct SmtSessionOptions {
    /// If true, the communication with the SMT solver will be logged into a `replay.smt` file.
    pub save_smt_replay: bool,
    /// All-SAT enumeration gives up after this many models and reports `Unbounded`.
    pub all_sat_model_limit: usize,
}

impl Default for SmtSessionOptions {
    fn default() -> Self {
        Self {
            save_smt_replay: false,
            all_sat_model_limit: 128,
        }
    }
}

/// Incremental solver session over a `easy-smt` child process.
pub struct SmtSession {
    smt_ctx: smt::Context,
    opts: SmtSessionOptions,
    /// names declared per assertion frame, popped together with the frame
    declared: Vec<HashSet<String>>,
}

impl SmtSession {
    pub fn new(cmd: &SmtSolverCmd, purpose: Purpose, opts: SmtSessionOptions) -> Result<Self> {
        let replay_file = if opts.save_smt_replay {
            Some(std::fs::File::create("replay.smt")?)
        } else {
            None
        };
        let mut smt_ctx = smt::ContextBuilder::new()
            .solver(cmd.name, cmd.args)
            .replay_file(replay_file)
            .build()?;
        let logic = if cmd.supports_uf { "QF_UFLIA" } else { "QF_LIA" };
        smt_ctx.set_logic(logic)?;
        debug!("started {} session for {purpose:?}", cmd.name);
        Ok(Self {
            smt_ctx,
            opts,
            declared: vec![HashSet::new()],
        })
    }

    fn is_declared(&self, name: &str) -> bool {
        self.declared.iter().any(|frame| frame.contains(name))
    }

    fn declare_constants(&mut self, ctx: &Context, e: ExprRef) -> Result<()> {
        for (name, tpe) in collect_declarations(ctx, e) {
            if !self.is_declared(&name) {
                let sort = convert_tpe(&self.smt_ctx, tpe);
                self.smt_ctx
                    .declare_const(escape_smt_identifier(&name).into_owned(), sort)?;
                self.declared.last_mut().unwrap().insert(name);
            }
        }
        Ok(())
    }

    fn all_sat_inner(
        &mut self,
        ctx: &Context,
        atoms: &[ExprRef],
        on_model: &mut dyn FnMut(&[bool]),
    ) -> Result<AllSat> {
        let atom_exprs: Vec<smt::SExpr> = atoms
            .iter()
            .map(|a| convert_expr(&self.smt_ctx, ctx, *a))
            .collect();
        let mut model_count = 0usize;
        let mut truth = vec![false; atoms.len()];
        loop {
            match self.smt_ctx.check()? {
                smt::Response::Unsat => return Ok(AllSat::Models(model_count)),
                smt::Response::Unknown => {
                    return Err(EngineError::Unknown("all-sat enumeration".to_string()))
                }
                smt::Response::Sat => {}
            }
            if atoms.is_empty() {
                // satisfiable with nothing to project onto
                on_model(&truth);
                return Ok(AllSat::Models(1));
            }
            model_count += 1;
            if model_count > self.opts.all_sat_model_limit {
                debug!("all-sat model limit exceeded");
                return Ok(AllSat::Unbounded);
            }
            let values = self.smt_ctx.get_value(atom_exprs.clone())?;
            let mut blocking = Vec::with_capacity(atoms.len());
            for (ii, (atom, value)) in values.into_iter().enumerate() {
                let positive = match self.smt_ctx.get(value) {
                    smt::SExprData::Atom("true") => true,
                    smt::SExprData::Atom("false") => false,
                    _ => {
                        return Err(EngineError::MalformedResponse(format!(
                            "expected a boolean value, got: {}",
                            self.smt_ctx.display(value)
                        )))
                    }
                };
                truth[ii] = positive;
                blocking.push(if positive {
                    self.smt_ctx.not(atom)
                } else {
                    atom
                });
            }
            on_model(&truth);
            let clause = self.smt_ctx.or_many(blocking);
            self.smt_ctx.assert(clause)?;
        }
    }
}

impl ProverSession for SmtSession {
    fn push(&mut self) -> Result<()> {
        self.smt_ctx.push_many(1)?;
        self.declared.push(HashSet::new());
        Ok(())
    }

    fn pop(&mut self) -> Result<()> {
        assert!(self.declared.len() > 1, "unbalanced pop");
        self.smt_ctx.pop_many(1)?;
        self.declared.pop();
        Ok(())
    }

    fn depth(&self) -> usize {
        self.declared.len() - 1
    }

    fn assert_formula(&mut self, ctx: &Context, e: ExprRef) -> Result<()> {
        self.declare_constants(ctx, e)?;
        let converted = convert_expr(&self.smt_ctx, ctx, e);
        self.smt_ctx.assert(converted)?;
        Ok(())
    }

    fn is_unsat(&mut self) -> Result<bool> {
        match self.smt_ctx.check()? {
            smt::Response::Unsat => Ok(true),
            smt::Response::Sat => Ok(false),
            smt::Response::Unknown => Err(EngineError::Unknown("check-sat".to_string())),
        }
    }

    fn all_sat(
        &mut self,
        ctx: &Context,
        atoms: &[ExprRef],
        on_model: &mut dyn FnMut(&[bool]),
    ) -> Result<AllSat> {
        // blocking clauses must not leak into the surrounding frame
        self.push()?;
        for atom in atoms {
            self.declare_constants(ctx, *atom)?;
        }
        let result = self.all_sat_inner(ctx, atoms, on_model);
        let popped = self.pop();
        match result {
            Ok(value) => {
                popped?;
                Ok(value)
            }
            err => err,
        }
    }
}
