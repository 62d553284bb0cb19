// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ir::context::StringRef;
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};
use std::num::NonZeroU32;

#[derive(PartialEq, Eq, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct ExprRef(NonZeroU32);

impl Debug for ExprRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // we need a custom implementation in order to show the zero based index
        write!(f, "ExprRef({})", self.index())
    }
}

impl ExprRef {
    pub(crate) fn from_index(index: usize) -> Self {
        ExprRef(NonZeroU32::new((index + 1) as u32).unwrap())
    }

    pub(crate) fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Uninterpreted function arguments. Most applications encode unary or
/// binary operators that the linear theory cannot express.
pub type Args = SmallVec<[ExprRef; 2]>;

/// Represents a quantifier-free boolean or integer expression.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum Expr {
    // nullary
    Symbol {
        name: StringRef,
        tpe: Type,
    },
    BoolLiteral(bool),
    IntLiteral(i64),
    // boolean connectives
    Not(ExprRef),
    And(ExprRef, ExprRef),
    Or(ExprRef, ExprRef),
    Implies(ExprRef, ExprRef),
    // comparisons (both sorts for `Equal`, integers otherwise)
    Equal(ExprRef, ExprRef),
    Greater(ExprRef, ExprRef),
    GreaterEqual(ExprRef, ExprRef),
    // integer arithmetic
    Neg(ExprRef),
    Add(ExprRef, ExprRef),
    Sub(ExprRef, ExprRef),
    Mul(ExprRef, ExprRef),
    // ternary
    Ite {
        cond: ExprRef,
        tru: ExprRef,
        fals: ExprRef,
    },
    // uninterpreted function application
    Apply {
        func: StringRef,
        args: Args,
        tpe: Type,
    },
}

impl Expr {
    pub fn symbol(name: StringRef, tpe: Type) -> Expr {
        Expr::Symbol { name, tpe }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Expr::Symbol { .. })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::BoolLiteral(_) | Expr::IntLiteral(_))
    }

    pub fn get_symbol_name_ref(&self) -> Option<StringRef> {
        match self {
            Expr::Symbol { name, .. } => Some(*name),
            _ => None,
        }
    }

    pub fn for_each_child(&self, mut visit: impl FnMut(&ExprRef)) {
        match self {
            Expr::Symbol { .. } | Expr::BoolLiteral(_) | Expr::IntLiteral(_) => {}
            Expr::Not(e) | Expr::Neg(e) => visit(e),
            Expr::And(a, b)
            | Expr::Or(a, b)
            | Expr::Implies(a, b)
            | Expr::Equal(a, b)
            | Expr::Greater(a, b)
            | Expr::GreaterEqual(a, b)
            | Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b) => {
                visit(a);
                visit(b);
            }
            Expr::Ite { cond, tru, fals } => {
                visit(cond);
                visit(tru);
                visit(fals);
            }
            Expr::Apply { args, .. } => {
                for a in args.iter() {
                    visit(a);
                }
            }
        }
    }

    pub fn num_children(&self) -> usize {
        match self {
            Expr::Symbol { .. } | Expr::BoolLiteral(_) | Expr::IntLiteral(_) => 0,
            Expr::Not(_) | Expr::Neg(_) => 1,
            Expr::And(..)
            | Expr::Or(..)
            | Expr::Implies(..)
            | Expr::Equal(..)
            | Expr::Greater(..)
            | Expr::GreaterEqual(..)
            | Expr::Add(..)
            | Expr::Sub(..)
            | Expr::Mul(..) => 2,
            Expr::Ite { .. } => 3,
            Expr::Apply { args, .. } => args.len(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Type {
    Bool,
    Int,
}

impl Type {
    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int)
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ir_type_size() {
        assert_eq!(std::mem::size_of::<ExprRef>(), 4);
        // tag plus the largest field (the inline SmallVec of an Apply)
        assert!(std::mem::size_of::<Expr>() <= 40);
    }
}
