// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! Parses solver responses back into IR: interpolants from `get-interpolant`
//! and model values from `get-value`.

use crate::error::{EngineError, Result};
use crate::ir::{Context, ExprRef, Type};

#[derive(Debug, PartialEq)]
enum SExprTree {
    Atom(String),
    List(Vec<SExprTree>),
}

fn malformed(msg: impl Into<String>) -> EngineError {
    EngineError::MalformedResponse(msg.into())
}

fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(cc) = chars.next() {
        match cc {
            '(' => tokens.push("(".to_string()),
            ')' => tokens.push(")".to_string()),
            '|' => {
                // quoted symbol, may contain whitespace and parentheses
                let mut atom = String::new();
                for inner in chars.by_ref() {
                    if inner == '|' {
                        break;
                    }
                    atom.push(inner);
                }
                tokens.push(atom);
            }
            c if c.is_whitespace() => {}
            c => {
                let mut atom = String::new();
                atom.push(c);
                while let Some(&next) = chars.peek() {
                    if next == '(' || next == ')' || next.is_whitespace() {
                        break;
                    }
                    atom.push(next);
                    chars.next();
                }
                tokens.push(atom);
            }
        }
    }
    Ok(tokens)
}

fn read_tree(tokens: &[String], pos: &mut usize) -> Result<SExprTree> {
    match tokens.get(*pos) {
        None => Err(malformed("unexpected end of solver response")),
        Some(tok) if tok == "(" => {
            *pos += 1;
            let mut children = Vec::new();
            loop {
                match tokens.get(*pos) {
                    None => return Err(malformed("unbalanced parenthesis in solver response")),
                    Some(tok) if tok == ")" => {
                        *pos += 1;
                        return Ok(SExprTree::List(children));
                    }
                    Some(_) => children.push(read_tree(tokens, pos)?),
                }
            }
        }
        Some(tok) if tok == ")" => Err(malformed("unexpected closing parenthesis")),
        Some(tok) => {
            *pos += 1;
            Ok(SExprTree::Atom(tok.clone()))
        }
    }
}

fn parse_tree(input: &str) -> Result<SExprTree> {
    let tokens = tokenize(input)?;
    let mut pos = 0;
    let tree = read_tree(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(malformed(format!("trailing tokens in: {input}")));
    }
    Ok(tree)
}

/// Parses a single boolean SMT-LIB expression, e.g. an interpolant.
pub fn parse_smt_expr(ctx: &mut Context, input: &str) -> Result<ExprRef> {
    let tree = parse_tree(input.trim())?;
    convert(ctx, &tree, Type::Bool)
}

fn convert(ctx: &mut Context, tree: &SExprTree, expected: Type) -> Result<ExprRef> {
    match tree {
        SExprTree::Atom(a) => convert_atom(ctx, a, expected),
        SExprTree::List(items) => {
            let (op, args) = match items.split_first() {
                Some((SExprTree::Atom(op), args)) if !args.is_empty() => (op.as_str(), args),
                _ => return Err(malformed(format!("expected an application: {tree:?}"))),
            };
            match (op, args.len()) {
                ("not", 1) => {
                    let e = convert(ctx, &args[0], Type::Bool)?;
                    Ok(ctx.not(e))
                }
                ("-", 1) => {
                    let e = convert(ctx, &args[0], Type::Int)?;
                    Ok(negated(ctx, e))
                }
                ("and", _) => {
                    let operands = convert_all(ctx, args, Type::Bool)?;
                    Ok(ctx.and_many(operands))
                }
                ("or", _) => {
                    let operands = convert_all(ctx, args, Type::Bool)?;
                    Ok(ctx.or_many(operands))
                }
                ("=>", 2) => {
                    let a = convert(ctx, &args[0], Type::Bool)?;
                    let b = convert(ctx, &args[1], Type::Bool)?;
                    Ok(ctx.implies(a, b))
                }
                ("=", 2) => {
                    let operand_tpe = infer_operand_type(&args[0], &args[1]);
                    let a = convert(ctx, &args[0], operand_tpe)?;
                    let b = convert(ctx, &args[1], operand_tpe)?;
                    Ok(ctx.equal(a, b))
                }
                ("distinct", 2) => {
                    let operand_tpe = infer_operand_type(&args[0], &args[1]);
                    let a = convert(ctx, &args[0], operand_tpe)?;
                    let b = convert(ctx, &args[1], operand_tpe)?;
                    let eq = ctx.equal(a, b);
                    Ok(ctx.not(eq))
                }
                (">", 2) | (">=", 2) | ("<", 2) | ("<=", 2) => {
                    let a = convert(ctx, &args[0], Type::Int)?;
                    let b = convert(ctx, &args[1], Type::Int)?;
                    Ok(match op {
                        ">" => ctx.greater(a, b),
                        ">=" => ctx.greater_or_equal(a, b),
                        "<" => ctx.less(a, b),
                        _ => ctx.less_or_equal(a, b),
                    })
                }
                ("+", _) | ("*", _) => {
                    let operands = convert_all(ctx, args, Type::Int)?;
                    let mut iter = operands.into_iter();
                    let first = iter.next().unwrap();
                    Ok(iter.fold(first, |acc, e| match op {
                        "+" => ctx.add(acc, e),
                        _ => ctx.mul(acc, e),
                    }))
                }
                ("-", _) => {
                    let operands = convert_all(ctx, args, Type::Int)?;
                    let mut iter = operands.into_iter();
                    let first = iter.next().unwrap();
                    Ok(iter.fold(first, |acc, e| ctx.sub(acc, e)))
                }
                ("ite", 3) => {
                    let cond = convert(ctx, &args[0], Type::Bool)?;
                    let tru = convert(ctx, &args[1], expected)?;
                    let fals = convert(ctx, &args[2], expected)?;
                    Ok(ctx.ite(cond, tru, fals))
                }
                _ => Err(malformed(format!("unsupported operator: {op}"))),
            }
        }
    }
}

fn convert_all(ctx: &mut Context, trees: &[SExprTree], tpe: Type) -> Result<Vec<ExprRef>> {
    trees.iter().map(|t| convert(ctx, t, tpe)).collect()
}

fn convert_atom(ctx: &mut Context, atom: &str, expected: Type) -> Result<ExprRef> {
    match atom {
        "true" => Ok(ctx.tru()),
        "false" => Ok(ctx.fals()),
        _ => {
            if let Ok(value) = atom.parse::<i64>() {
                return Ok(ctx.int_lit(value));
            }
            match expected {
                Type::Bool => Ok(ctx.bool_symbol(atom)),
                Type::Int => Ok(ctx.int_symbol(atom)),
            }
        }
    }
}

/// The sort of a comparison operand. Atoms default to Int since our formulas
/// only ever declare integer constants, the boolean structure lives in the
/// connectives.
fn infer_operand_type(a: &SExprTree, b: &SExprTree) -> Type {
    let is_bool = |t: &SExprTree| match t {
        SExprTree::Atom(a) => a == "true" || a == "false",
        SExprTree::List(items) => matches!(
            items.first(),
            Some(SExprTree::Atom(op))
                if matches!(op.as_str(), "not" | "and" | "or" | "=>" | "=" | "distinct" | ">" | ">=" | "<" | "<=")
        ),
    };
    if is_bool(a) || is_bool(b) {
        Type::Bool
    } else {
        Type::Int
    }
}

fn negated(ctx: &mut Context, e: ExprRef) -> ExprRef {
    use crate::ir::Expr;
    if let Expr::IntLiteral(value) = ctx.get(e) {
        let value = *value;
        ctx.int_lit(-value)
    } else {
        ctx.negate(e)
    }
}

/// Parses a `get-value` response `((name value) ...)` into name/value pairs.
pub fn parse_values(ctx: &mut Context, input: &str) -> Result<Vec<(String, ExprRef)>> {
    let tree = parse_tree(input.trim())?;
    let entries = match tree {
        SExprTree::List(entries) => entries,
        _ => return Err(malformed(format!("expected a value list: {input}"))),
    };
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            SExprTree::List(pair) if pair.len() == 2 => {
                let name = match &pair[0] {
                    SExprTree::Atom(name) => name.clone(),
                    other => return Err(malformed(format!("expected a name: {other:?}"))),
                };
                let tpe = match &pair[1] {
                    SExprTree::Atom(a) if a == "true" || a == "false" => Type::Bool,
                    _ => Type::Int,
                };
                let value = convert(ctx, &pair[1], tpe)?;
                out.push((name, value));
            }
            other => return Err(malformed(format!("expected a name/value pair: {other:?}"))),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::serialize_expr;

    #[test]
    fn parse_interpolant() {
        let mut ctx = Context::default();
        let e = parse_smt_expr(&mut ctx, "(and (<= x@1 0) (not (= y@2 1)))").unwrap();
        assert_eq!(serialize_expr(&ctx, e), "((0 >= x@1) && !(y@2 == 1))");
    }

    #[test]
    fn parse_negative_numbers() {
        let mut ctx = Context::default();
        let e = parse_smt_expr(&mut ctx, "(>= x@1 (- 5))").unwrap();
        assert_eq!(serialize_expr(&ctx, e), "(x@1 >= -5)");
    }

    #[test]
    fn parse_quoted_symbols() {
        let mut ctx = Context::default();
        let e = parse_smt_expr(&mut ctx, "(> |my var@1| 0)").unwrap();
        assert_eq!(serialize_expr(&ctx, e), "(my var@1 > 0)");
    }

    #[test]
    fn parse_model_values() {
        let mut ctx = Context::default();
        let values = parse_values(&mut ctx, "((x@1 5) (x@2 (- 3)) (b@1 true))").unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0].0, "x@1");
        assert_eq!(values[0].1, ctx.int_lit(5));
        assert_eq!(values[1].1, ctx.int_lit(-3));
        assert_eq!(values[2].1, ctx.tru());
    }

    #[test]
    fn reject_garbage() {
        let mut ctx = Context::default();
        assert!(parse_smt_expr(&mut ctx, "(and (<= x@1").is_err());
        assert!(parse_smt_expr(&mut ctx, "(frobnicate x)").is_err());
    }
}
