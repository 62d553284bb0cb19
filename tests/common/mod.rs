// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! Brute-force solver oracles for hermetic tests. They decide satisfiability
//! by enumerating small integer assignments instead of talking to an external
//! SMT process, so test results do not depend on an installed solver.

use predabs::error::Result;
use predabs::ir::{collect_symbols, eval_bool, Context, Expr, ExprRef};
use predabs::smt::{AllSat, Group, InterpolatingSession, ProverSession};
use std::collections::HashMap;

pub const DOMAIN: std::ops::RangeInclusive<i64> = -3..=3;

fn symbol_names(ctx: &Context, formulas: &[ExprRef]) -> Vec<String> {
    let mut names = Vec::new();
    for f in formulas {
        for sym in collect_symbols(ctx, *f) {
            if let Expr::Symbol { name, .. } = ctx.get(sym) {
                let name = ctx.get_str(*name).to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names
}

/// All assignments over `DOMAIN` that satisfy every formula.
pub fn enumerate_models(ctx: &Context, formulas: &[ExprRef]) -> Vec<HashMap<String, i64>> {
    enumerate_models_over(ctx, formulas, &symbol_names(ctx, formulas))
}

fn enumerate_models_over(
    ctx: &Context,
    formulas: &[ExprRef],
    names: &[String],
) -> Vec<HashMap<String, i64>> {
    let mut out = Vec::new();
    let mut env = HashMap::new();
    enumerate_rec(ctx, formulas, names, &mut env, &mut out);
    out
}

fn enumerate_rec(
    ctx: &Context,
    formulas: &[ExprRef],
    names: &[String],
    env: &mut HashMap<String, i64>,
    out: &mut Vec<HashMap<String, i64>>,
) {
    match names.split_first() {
        None => {
            if formulas.iter().all(|f| eval_bool(ctx, *f, env)) {
                out.push(env.clone());
            }
        }
        Some((name, rest)) => {
            for value in DOMAIN {
                env.insert(name.clone(), value);
                enumerate_rec(ctx, formulas, rest, env, out);
            }
            env.remove(name);
        }
    }
}

/// A `ProverSession` that decides every query by enumeration.
/// `num_queries` counts the check-sat equivalents for cache transparency tests.
pub struct BruteProver {
    ctx: Context,
    frames: Vec<Vec<ExprRef>>,
    pub num_queries: usize,
    pub model_limit: usize,
}

impl Default for BruteProver {
    fn default() -> Self {
        Self {
            ctx: Context::default(),
            frames: vec![Vec::new()],
            num_queries: 0,
            model_limit: 1000,
        }
    }
}

impl BruteProver {
    fn asserted(&self) -> Vec<ExprRef> {
        self.frames.iter().flatten().copied().collect()
    }
}

impl ProverSession for BruteProver {
    fn push(&mut self) -> Result<()> {
        self.frames.push(Vec::new());
        Ok(())
    }

    fn pop(&mut self) -> Result<()> {
        assert!(self.frames.len() > 1, "unbalanced pop");
        self.frames.pop();
        Ok(())
    }

    fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    fn assert_formula(&mut self, ctx: &Context, e: ExprRef) -> Result<()> {
        self.ctx = ctx.clone();
        self.frames.last_mut().unwrap().push(e);
        Ok(())
    }

    fn is_unsat(&mut self) -> Result<bool> {
        self.num_queries += 1;
        Ok(enumerate_models(&self.ctx, &self.asserted()).is_empty())
    }

    fn all_sat(
        &mut self,
        ctx: &Context,
        atoms: &[ExprRef],
        on_model: &mut dyn FnMut(&[bool]),
    ) -> Result<AllSat> {
        self.num_queries += 1;
        self.ctx = ctx.clone();
        let asserted = self.asserted();
        // the atoms may mention variables the assertions do not
        let mut all = asserted.clone();
        all.extend_from_slice(atoms);
        let names = symbol_names(&self.ctx, &all);
        let envs = enumerate_models_over(&self.ctx, &asserted, &names);
        let mut seen: Vec<Vec<bool>> = Vec::new();
        for env in envs {
            let truth: Vec<bool> = atoms
                .iter()
                .map(|a| eval_bool(&self.ctx, *a, &env))
                .collect();
            if !seen.contains(&truth) {
                if seen.len() >= self.model_limit {
                    return Ok(AllSat::Unbounded);
                }
                on_model(&truth);
                seen.push(truth);
            }
        }
        Ok(AllSat::Models(seen.len()))
    }
}

/// An `InterpolatingSession` that decides satisfiability by enumeration and
/// returns scripted interpolants, keyed by cut position (the index after the
/// last A group).
pub struct BruteItp {
    ctx: Context,
    formulas: Vec<ExprRef>,
    pub interpolants: HashMap<usize, ExprRef>,
}

impl Default for BruteItp {
    fn default() -> Self {
        Self {
            ctx: Context::default(),
            formulas: Vec::new(),
            interpolants: HashMap::new(),
        }
    }
}

impl InterpolatingSession for BruteItp {
    fn add_formula(&mut self, ctx: &Context, e: ExprRef) -> Result<Group> {
        self.ctx = ctx.clone();
        self.formulas.push(e);
        Ok(Group::new(self.formulas.len() as u32 - 1))
    }

    fn is_unsat(&mut self) -> Result<bool> {
        Ok(enumerate_models(&self.ctx, &self.formulas).is_empty())
    }

    fn interpolant(&mut self, ctx: &mut Context, a_groups: &[Group]) -> Result<ExprRef> {
        let cut = a_groups.last().expect("empty A partition").id() as usize + 1;
        Ok(match self.interpolants.get(&cut) {
            Some(itp) => *itp,
            None => ctx.tru(),
        })
    }

    fn witness_values(
        &mut self,
        ctx: &mut Context,
        symbols: &[ExprRef],
    ) -> Result<Vec<(ExprRef, ExprRef)>> {
        let env = enumerate_models(&self.ctx, &self.formulas)
            .into_iter()
            .next()
            .expect("witness_values on an unsatisfiable trace");
        let mut out = Vec::with_capacity(symbols.len());
        for sym in symbols {
            let name = match ctx.get(*sym) {
                Expr::Symbol { name, .. } => ctx.get_str(*name).to_string(),
                _ => panic!("expected a symbol"),
            };
            let value = ctx.int_lit(env[&name]);
            out.push((*sym, value));
        }
        Ok(out)
    }

    fn reset(&mut self) -> Result<()> {
        self.formulas.clear();
        Ok(())
    }
}
