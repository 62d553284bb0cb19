// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ir::{collect_applications, collect_symbols, Context, Expr, ExprRef, StringRef, Type};
use easy_smt as smt;
use std::borrow::Cow;
use std::fmt::Write;

pub fn convert_tpe(smt_ctx: &smt::Context, tpe: Type) -> smt::SExpr {
    match tpe {
        Type::Bool => smt_ctx.bool_sort(),
        Type::Int => smt_ctx.atom("Int"),
    }
}

/// Converts an expression to the solver representation. `Apply` nodes are
/// lowered to their Ackermann constants, see [`apply_const_name`].
pub fn convert_expr(smt_ctx: &smt::Context, ctx: &Context, expr_ref: ExprRef) -> smt::SExpr {
    match ctx.get(expr_ref) {
        Expr::Symbol { name, .. } => {
            let name_str = ctx.get_str(*name);
            smt_ctx.atom(escape_smt_identifier(name_str))
        }
        Expr::BoolLiteral(true) => smt_ctx.true_(),
        Expr::BoolLiteral(false) => smt_ctx.false_(),
        Expr::IntLiteral(value) => {
            if *value < 0 {
                let abs = smt_ctx.numeral(value.unsigned_abs());
                smt_ctx.list(vec![smt_ctx.atom("-"), abs])
            } else {
                smt_ctx.numeral(*value as u64)
            }
        }
        Expr::Not(e) => {
            let e = convert_expr(smt_ctx, ctx, *e);
            smt_ctx.not(e)
        }
        Expr::And(a, b) => {
            let (a, b) = convert_binop(smt_ctx, ctx, a, b);
            smt_ctx.and(a, b)
        }
        Expr::Or(a, b) => {
            let (a, b) = convert_binop(smt_ctx, ctx, a, b);
            smt_ctx.or(a, b)
        }
        Expr::Implies(a, b) => {
            let (a, b) = convert_binop(smt_ctx, ctx, a, b);
            smt_ctx.imp(a, b)
        }
        Expr::Equal(a, b) => {
            let (a, b) = convert_binop(smt_ctx, ctx, a, b);
            smt_ctx.eq(a, b)
        }
        Expr::Greater(a, b) => convert_simple_binop(smt_ctx, ctx, ">", a, b),
        Expr::GreaterEqual(a, b) => convert_simple_binop(smt_ctx, ctx, ">=", a, b),
        Expr::Neg(e) => {
            let e = convert_expr(smt_ctx, ctx, *e);
            smt_ctx.list(vec![smt_ctx.atom("-"), e])
        }
        Expr::Add(a, b) => convert_simple_binop(smt_ctx, ctx, "+", a, b),
        Expr::Sub(a, b) => convert_simple_binop(smt_ctx, ctx, "-", a, b),
        Expr::Mul(a, b) => convert_simple_binop(smt_ctx, ctx, "*", a, b),
        Expr::Ite { cond, tru, fals } => {
            let cond = convert_expr(smt_ctx, ctx, *cond);
            let tru = convert_expr(smt_ctx, ctx, *tru);
            let fals = convert_expr(smt_ctx, ctx, *fals);
            smt_ctx.ite(cond, tru, fals)
        }
        Expr::Apply { func, .. } => {
            let name = apply_const_name(ctx, *func, expr_ref);
            smt_ctx.atom(escape_smt_identifier(&name).into_owned())
        }
    }
}

fn convert_binop(
    smt_ctx: &smt::Context,
    ctx: &Context,
    a: &ExprRef,
    b: &ExprRef,
) -> (smt::SExpr, smt::SExpr) {
    (
        convert_expr(smt_ctx, ctx, *a),
        convert_expr(smt_ctx, ctx, *b),
    )
}

fn convert_simple_binop(
    smt_ctx: &smt::Context,
    ctx: &Context,
    op: &str,
    a: &ExprRef,
    b: &ExprRef,
) -> smt::SExpr {
    let (a, b) = convert_binop(smt_ctx, ctx, a, b);
    smt_ctx.list(vec![smt_ctx.atom(op), a, b])
}

/// Ackermann constant standing in for a function application. The interned
/// expression id makes the name deterministic, so the lowering and the
/// congruence axiom generation always agree on which constant a node gets.
pub fn apply_const_name(ctx: &Context, func: StringRef, app: ExprRef) -> String {
    format!("{}.{}", ctx.get_str(func), app.index())
}

/// All constants a formula mentions after lowering: its symbols plus the
/// Ackermann constants of its applications.
pub fn collect_declarations(ctx: &Context, expr: ExprRef) -> Vec<(String, Type)> {
    let mut out = Vec::new();
    for sym in collect_symbols(ctx, expr) {
        match ctx.get(sym) {
            Expr::Symbol { name, tpe } => out.push((ctx.get_str(*name).to_string(), *tpe)),
            _ => unreachable!(),
        }
    }
    for app in collect_applications(ctx, expr) {
        match ctx.get(app) {
            Expr::Apply { func, tpe, .. } => {
                out.push((apply_const_name(ctx, *func, app), *tpe))
            }
            _ => unreachable!(),
        }
    }
    out
}

/// Writes the expression as SMT-LIB2 text. Used by the interpolating pipe
/// which talks to the solver process directly.
pub fn write_smt(out: &mut String, ctx: &Context, expr_ref: ExprRef) {
    match ctx.get(expr_ref) {
        Expr::Symbol { name, .. } => {
            let _ = write!(out, "{}", escape_smt_identifier(ctx.get_str(*name)));
        }
        Expr::BoolLiteral(value) => {
            let _ = write!(out, "{}", value);
        }
        Expr::IntLiteral(value) => {
            if *value < 0 {
                let _ = write!(out, "(- {})", value.unsigned_abs());
            } else {
                let _ = write!(out, "{}", value);
            }
        }
        Expr::Not(e) => write_smt_op(out, ctx, "not", &[*e]),
        Expr::And(a, b) => write_smt_op(out, ctx, "and", &[*a, *b]),
        Expr::Or(a, b) => write_smt_op(out, ctx, "or", &[*a, *b]),
        Expr::Implies(a, b) => write_smt_op(out, ctx, "=>", &[*a, *b]),
        Expr::Equal(a, b) => write_smt_op(out, ctx, "=", &[*a, *b]),
        Expr::Greater(a, b) => write_smt_op(out, ctx, ">", &[*a, *b]),
        Expr::GreaterEqual(a, b) => write_smt_op(out, ctx, ">=", &[*a, *b]),
        Expr::Neg(e) => write_smt_op(out, ctx, "-", &[*e]),
        Expr::Add(a, b) => write_smt_op(out, ctx, "+", &[*a, *b]),
        Expr::Sub(a, b) => write_smt_op(out, ctx, "-", &[*a, *b]),
        Expr::Mul(a, b) => write_smt_op(out, ctx, "*", &[*a, *b]),
        Expr::Ite { cond, tru, fals } => write_smt_op(out, ctx, "ite", &[*cond, *tru, *fals]),
        Expr::Apply { func, .. } => {
            let name = apply_const_name(ctx, *func, expr_ref);
            let _ = write!(out, "{}", escape_smt_identifier(&name));
        }
    }
}

fn write_smt_op(out: &mut String, ctx: &Context, op: &str, args: &[ExprRef]) {
    out.push('(');
    out.push_str(op);
    for arg in args {
        out.push(' ');
        write_smt(out, ctx, *arg);
    }
    out.push(')');
}

pub fn smt_tpe_name(tpe: Type) -> &'static str {
    match tpe {
        Type::Bool => "Bool",
        Type::Int => "Int",
    }
}

/// See <simple_symbol> definition in the Concrete Syntax Appendix of the SMTLib Spec
fn is_simple_smt_identifier(id: &str) -> bool {
    if id.is_empty() {
        return false; // needs to be non-empty
    }
    let mut is_first = true;
    for cc in id.chars() {
        if !cc.is_ascii() {
            return false; // all allowed characters are ASCII characters
        }
        let ac = cc as u8;
        let is_alpha = ac.is_ascii_uppercase() || ac.is_ascii_lowercase();
        let is_num = ac.is_ascii_digit();
        let is_other_allowed_char = matches!(
            ac,
            b'+' | b'-'
                | b'/'
                | b'*'
                | b'='
                | b'%'
                | b'?'
                | b'!'
                | b'.'
                | b'$'
                | b'_'
                | b'~'
                | b'&'
                | b'^'
                | b'<'
                | b'>'
                | b'@'
        );
        if !(is_alpha | is_num | is_other_allowed_char) {
            return false;
        }
        if is_num && is_first {
            return false; // the first character is not allowed ot be a digit
        }
        is_first = false;
    }
    true // passed all checks
}

pub fn escape_smt_identifier(id: &str) -> Cow<'_, str> {
    if is_simple_smt_identifier(id) {
        Cow::Borrowed(id)
    } else {
        let escaped = format!("|{}|", id);
        Cow::Owned(escaped)
    }
}
