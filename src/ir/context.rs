// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ir::expr::{Args, Expr, ExprRef, Type};
use std::fmt::{Debug, Formatter};
use std::num::NonZeroU16;

#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct StringRef(NonZeroU16);

impl Debug for StringRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringRef({})", self.index())
    }
}

impl StringRef {
    fn from_index(index: usize) -> Self {
        Self(NonZeroU16::new((index + 1) as u16).unwrap())
    }

    fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Context which is used to create all expressions. Expressions are interned such that
/// reference equivalence implies structural equivalence. All caches in this crate rely
/// on that identity guarantee for their keys.
#[derive(Clone, Default)]
pub struct Context {
    strings: indexmap::IndexSet<String>,
    exprs: indexmap::IndexSet<Expr>,
}

/// Adding and removing nodes.
impl Context {
    pub fn get(&self, reference: ExprRef) -> &Expr {
        self.exprs.get_index(reference.index()).expect("Invalid ExprRef!")
    }

    pub(crate) fn add_expr(&mut self, value: Expr) -> ExprRef {
        let (index, _) = self.exprs.insert_full(value);
        ExprRef::from_index(index)
    }

    pub fn get_str(&self, reference: StringRef) -> &str {
        self.strings.get_index(reference.index()).expect("Invalid StringRef!")
    }

    pub fn string(&mut self, value: std::borrow::Cow<str>) -> StringRef {
        if let Some(index) = self.strings.get_index_of(value.as_ref()) {
            StringRef::from_index(index)
        } else {
            let (index, _) = self.strings.insert_full(value.into_owned());
            StringRef::from_index(index)
        }
    }

    pub fn tpe(&self, e: ExprRef) -> Type {
        match self.get(e) {
            Expr::Symbol { tpe, .. } => *tpe,
            Expr::BoolLiteral(_) => Type::Bool,
            Expr::IntLiteral(_) => Type::Int,
            Expr::Not(_)
            | Expr::And(..)
            | Expr::Or(..)
            | Expr::Implies(..)
            | Expr::Equal(..)
            | Expr::Greater(..)
            | Expr::GreaterEqual(..) => Type::Bool,
            Expr::Neg(_) | Expr::Add(..) | Expr::Sub(..) | Expr::Mul(..) => Type::Int,
            Expr::Ite { tru, .. } => self.tpe(*tru),
            Expr::Apply { tpe, .. } => *tpe,
        }
    }
}

/// Convenience methods to construct IR nodes.
impl Context {
    pub fn symbol(&mut self, name: StringRef, tpe: Type) -> ExprRef {
        self.add_expr(Expr::symbol(name, tpe))
    }

    pub fn bool_symbol(&mut self, name: &str) -> ExprRef {
        let name_ref = self.string(name.into());
        self.symbol(name_ref, Type::Bool)
    }

    pub fn int_symbol(&mut self, name: &str) -> ExprRef {
        let name_ref = self.string(name.into());
        self.symbol(name_ref, Type::Int)
    }

    pub fn tru(&mut self) -> ExprRef {
        self.add_expr(Expr::BoolLiteral(true))
    }

    pub fn fals(&mut self) -> ExprRef {
        self.add_expr(Expr::BoolLiteral(false))
    }

    pub fn int_lit(&mut self, value: i64) -> ExprRef {
        self.add_expr(Expr::IntLiteral(value))
    }

    pub fn not(&mut self, e: ExprRef) -> ExprRef {
        if self.is_true(e) {
            return self.fals();
        }
        if self.is_false(e) {
            return self.tru();
        }
        if let Expr::Not(inner) = self.get(e) {
            return *inner;
        }
        self.add_expr(Expr::Not(e))
    }

    pub fn and(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        if self.is_true(a) {
            return b;
        }
        if self.is_true(b) {
            return a;
        }
        if self.is_false(a) || self.is_false(b) {
            return self.fals();
        }
        if a == b {
            return a;
        }
        self.add_expr(Expr::And(a, b))
    }

    pub fn or(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        if self.is_false(a) {
            return b;
        }
        if self.is_false(b) {
            return a;
        }
        if self.is_true(a) || self.is_true(b) {
            return self.tru();
        }
        if a == b {
            return a;
        }
        self.add_expr(Expr::Or(a, b))
    }

    pub fn implies(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.add_expr(Expr::Implies(a, b))
    }

    pub fn equal(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        debug_assert_eq!(self.tpe(a), self.tpe(b));
        if a == b {
            self.tru()
        } else {
            self.add_expr(Expr::Equal(a, b))
        }
    }

    pub fn ite(&mut self, cond: ExprRef, tru: ExprRef, fals: ExprRef) -> ExprRef {
        debug_assert!(self.tpe(cond).is_bool());
        debug_assert_eq!(self.tpe(tru), self.tpe(fals));
        if self.is_true(cond) {
            return tru;
        }
        if self.is_false(cond) {
            return fals;
        }
        if tru == fals {
            return tru;
        }
        self.add_expr(Expr::Ite { cond, tru, fals })
    }

    pub fn greater(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.add_expr(Expr::Greater(a, b))
    }

    pub fn greater_or_equal(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.add_expr(Expr::GreaterEqual(a, b))
    }

    pub fn less(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.greater(b, a)
    }

    pub fn less_or_equal(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.greater_or_equal(b, a)
    }

    pub fn negate(&mut self, e: ExprRef) -> ExprRef {
        self.add_expr(Expr::Neg(e))
    }

    pub fn add(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.add_expr(Expr::Add(a, b))
    }

    pub fn sub(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.add_expr(Expr::Sub(a, b))
    }

    pub fn mul(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.add_expr(Expr::Mul(a, b))
    }

    pub fn apply(&mut self, func: StringRef, args: Args, tpe: Type) -> ExprRef {
        self.add_expr(Expr::Apply { func, args, tpe })
    }

    /// Conjunction of an arbitrary number of operands. Empty input yields `true`.
    pub fn and_many(&mut self, exprs: impl IntoIterator<Item = ExprRef>) -> ExprRef {
        let mut out = self.tru();
        for e in exprs {
            out = self.and(out, e);
        }
        out
    }

    /// Disjunction of an arbitrary number of operands. Empty input yields `false`.
    pub fn or_many(&mut self, exprs: impl IntoIterator<Item = ExprRef>) -> ExprRef {
        let mut out = self.fals();
        for e in exprs {
            out = self.or(out, e);
        }
        out
    }

    pub fn is_true(&self, e: ExprRef) -> bool {
        matches!(self.get(e), Expr::BoolLiteral(true))
    }

    pub fn is_false(&self, e: ExprRef) -> bool {
        matches!(self.get(e), Expr::BoolLiteral(false))
    }
}
