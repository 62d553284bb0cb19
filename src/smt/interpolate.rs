// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! Interpolating solver session over a raw SMT-LIB2 pipe. `easy-smt` does not
//! expose interpolation, so we talk to the solver process directly, using the
//! MathSAT dialect of named interpolation groups.

use crate::error::{EngineError, Result};
use crate::ir::{Context, ExprRef};
use crate::smt::parse::{parse_smt_expr, parse_values};
use crate::smt::serialize::{collect_declarations, escape_smt_identifier, smt_tpe_name, write_smt};
use crate::smt::session::{Group, InterpolatingSession, SmtSolverCmd};
use log::debug;
use std::collections::HashSet;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub struct ItpPipe {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_group: u32,
    declared: HashSet<String>,
}

impl ItpPipe {
    pub fn new(cmd: &SmtSolverCmd) -> Result<Self> {
        assert!(
            cmd.supports_interpolation,
            "{} does not support interpolation",
            cmd.name
        );
        let mut child = Command::new(cmd.name)
            .args(cmd.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdin = child.stdin.take().expect("child stdin is piped");
        let stdout = BufReader::new(child.stdout.take().expect("child stdout is piped"));
        let mut session = Self {
            child,
            stdin,
            stdout,
            next_group: 0,
            declared: HashSet::new(),
        };
        session.init()?;
        Ok(session)
    }

    fn init(&mut self) -> Result<()> {
        self.send("(set-option :produce-interpolants true)")?;
        self.send("(set-option :produce-models true)")?;
        self.send("(set-logic QF_UFLIA)")?;
        Ok(())
    }

    fn send(&mut self, line: &str) -> Result<()> {
        debug!("itp > {line}");
        writeln!(self.stdin, "{line}")?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Reads one response: either a single atom or a balanced s-expression
    /// that may span multiple lines.
    fn read_response(&mut self) -> Result<String> {
        let mut out = String::new();
        let mut depth = 0i64;
        let mut in_quote = false;
        let mut started = false;
        loop {
            let mut line = String::new();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(EngineError::MalformedResponse(
                    "solver closed the pipe".to_string(),
                ));
            }
            for cc in line.chars() {
                match cc {
                    '|' => in_quote = !in_quote,
                    '(' if !in_quote => {
                        depth += 1;
                        started = true;
                    }
                    ')' if !in_quote => depth -= 1,
                    _ => {}
                }
            }
            out.push_str(&line);
            let complete = if started {
                depth == 0
            } else {
                !out.trim().is_empty()
            };
            if complete {
                let out = out.trim().to_string();
                debug!("itp < {out}");
                return Ok(out);
            }
        }
    }

    fn declare_constants(&mut self, ctx: &Context, e: ExprRef) -> Result<()> {
        for (name, tpe) in collect_declarations(ctx, e) {
            if self.declared.insert(name.clone()) {
                let escaped = escape_smt_identifier(&name);
                self.send(&format!(
                    "(declare-fun {} () {})",
                    escaped,
                    smt_tpe_name(tpe)
                ))?;
            }
        }
        Ok(())
    }
}

impl InterpolatingSession for ItpPipe {
    fn add_formula(&mut self, ctx: &Context, e: ExprRef) -> Result<Group> {
        self.declare_constants(ctx, e)?;
        let group = Group::new(self.next_group);
        self.next_group += 1;
        let mut line = String::from("(assert (! ");
        write_smt(&mut line, ctx, e);
        line.push_str(&format!(" :interpolation-group g{}))", group.id()));
        self.send(&line)?;
        Ok(group)
    }

    fn is_unsat(&mut self) -> Result<bool> {
        self.send("(check-sat)")?;
        match self.read_response()?.as_str() {
            "unsat" => Ok(true),
            "sat" => Ok(false),
            other => Err(EngineError::Unknown(format!("check-sat returned {other}"))),
        }
    }

    fn interpolant(&mut self, ctx: &mut Context, a_groups: &[Group]) -> Result<ExprRef> {
        let names: Vec<String> = a_groups.iter().map(|g| format!("g{}", g.id())).collect();
        self.send(&format!("(get-interpolant ({}))", names.join(" ")))?;
        let response = self.read_response()?;
        if response.starts_with("(error") {
            return Err(EngineError::MalformedResponse(response));
        }
        parse_smt_expr(ctx, &response)
    }

    fn witness_values(
        &mut self,
        ctx: &mut Context,
        symbols: &[ExprRef],
    ) -> Result<Vec<(ExprRef, ExprRef)>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let mut line = "(get-value (".to_string();
        for (ii, sym) in symbols.iter().enumerate() {
            if ii > 0 {
                line.push(' ');
            }
            write_smt(&mut line, ctx, *sym);
        }
        line.push_str("))");
        self.send(&line)?;
        let response = self.read_response()?;
        if response.starts_with("(error") {
            return Err(EngineError::MalformedResponse(response));
        }
        let values = parse_values(ctx, &response)?;
        if values.len() != symbols.len() {
            return Err(EngineError::MalformedResponse(format!(
                "expected {} values, got {}",
                symbols.len(),
                values.len()
            )));
        }
        Ok(symbols
            .iter()
            .copied()
            .zip(values.into_iter().map(|(_, v)| v))
            .collect())
    }

    fn reset(&mut self) -> Result<()> {
        self.send("(reset)")?;
        self.declared.clear();
        self.next_group = 0;
        self.init()
    }
}

impl Drop for ItpPipe {
    fn drop(&mut self) {
        let _ = self.send("(exit)");
        let _ = self.child.wait();
    }
}
