// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ir::{bottom_up, Context, Expr, ExprRef};

/// Renders an expression as human readable text for logging and debug dumps.
pub fn serialize_expr(ctx: &Context, expr: ExprRef) -> String {
    bottom_up(ctx, expr, |ctx, e, children: &[String]| match e {
        Expr::Symbol { name, .. } => ctx.get_str(*name).to_string(),
        Expr::BoolLiteral(b) => b.to_string(),
        Expr::IntLiteral(v) => v.to_string(),
        Expr::Not(_) => format!("!{}", children[0]),
        Expr::And(..) => format!("({} && {})", children[0], children[1]),
        Expr::Or(..) => format!("({} || {})", children[0], children[1]),
        Expr::Implies(..) => format!("({} -> {})", children[0], children[1]),
        Expr::Equal(..) => format!("({} == {})", children[0], children[1]),
        Expr::Greater(..) => format!("({} > {})", children[0], children[1]),
        Expr::GreaterEqual(..) => format!("({} >= {})", children[0], children[1]),
        Expr::Neg(_) => format!("-{}", children[0]),
        Expr::Add(..) => format!("({} + {})", children[0], children[1]),
        Expr::Sub(..) => format!("({} - {})", children[0], children[1]),
        Expr::Mul(..) => format!("({} * {})", children[0], children[1]),
        Expr::Ite { .. } => format!(
            "({} ? {} : {})",
            children[0], children[1], children[2]
        ),
        Expr::Apply { func, .. } => {
            format!("{}({})", ctx.get_str(*func), children.join(", "))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_simple() {
        let mut ctx = Context::default();
        let x = ctx.int_symbol("x");
        let one = ctx.int_lit(1);
        let sum = ctx.add(x, one);
        let e = ctx.greater_or_equal(sum, x);
        assert_eq!(serialize_expr(&ctx, e), "((x + 1) >= x)");
    }
}
