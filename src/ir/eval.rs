// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! Concrete evaluation of expressions under an integer assignment. Used to
//! check witnesses and by the brute-force test oracles.

use crate::ir::{bottom_up, Context, Expr, ExprRef};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
}

impl Value {
    fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(_) => panic!("expected a boolean value"),
        }
    }

    fn as_int(&self) -> i64 {
        match self {
            Value::Int(i) => *i,
            Value::Bool(_) => panic!("expected an integer value"),
        }
    }
}

/// Evaluates `expr` under `env`. Panics on unbound symbols and uninterpreted
/// applications, the caller must provide a complete assignment.
pub fn eval(ctx: &Context, expr: ExprRef, env: &HashMap<String, i64>) -> Value {
    bottom_up(ctx, expr, |ctx, e, children: &[Value]| match e {
        Expr::Symbol { name, .. } => {
            let name = ctx.get_str(*name);
            let value = env
                .get(name)
                .unwrap_or_else(|| panic!("no value for symbol {name}"));
            Value::Int(*value)
        }
        Expr::BoolLiteral(b) => Value::Bool(*b),
        Expr::IntLiteral(i) => Value::Int(*i),
        Expr::Not(_) => Value::Bool(!children[0].as_bool()),
        Expr::And(..) => Value::Bool(children[0].as_bool() && children[1].as_bool()),
        Expr::Or(..) => Value::Bool(children[0].as_bool() || children[1].as_bool()),
        Expr::Implies(..) => Value::Bool(!children[0].as_bool() || children[1].as_bool()),
        Expr::Equal(..) => Value::Bool(children[0] == children[1]),
        Expr::Greater(..) => Value::Bool(children[0].as_int() > children[1].as_int()),
        Expr::GreaterEqual(..) => Value::Bool(children[0].as_int() >= children[1].as_int()),
        Expr::Neg(_) => Value::Int(-children[0].as_int()),
        Expr::Add(..) => Value::Int(children[0].as_int() + children[1].as_int()),
        Expr::Sub(..) => Value::Int(children[0].as_int() - children[1].as_int()),
        Expr::Mul(..) => Value::Int(children[0].as_int() * children[1].as_int()),
        Expr::Ite { .. } => {
            if children[0].as_bool() {
                children[1]
            } else {
                children[2]
            }
        }
        Expr::Apply { .. } => panic!("cannot evaluate an uninterpreted application"),
    })
}

/// Evaluates a boolean expression, panicking if it is integer typed.
pub fn eval_bool(ctx: &Context, expr: ExprRef, env: &HashMap<String, i64>) -> bool {
    eval(ctx, expr, env).as_bool()
}
