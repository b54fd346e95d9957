// Copyright 2026 The CellML Engine Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashSet;

use crate::common::Ident;

/// The operator of a MathML `apply` element, one discriminant per
/// operator the content-markup subset of CellML admits.  Keeping these
/// in a single flat enum makes the code generator's dispatch a dense
/// match instead of a visitor hierarchy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MathOp {
    // top-level and relational equality are distinct node types: the
    // tree builder produces Eq only for the outermost `=` of a statement
    Eq,
    EqEq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    Root,
    Abs,
    Exp,
    Ln,
    Log,
    Floor,
    Ceiling,
    Min,
    Max,
    Rem,
    Factorial,
    And,
    Or,
    Xor,
    Not,
    Diff,
    Bvar,
    Degree,
    Logbase,
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Sinh,
    Cosh,
    Tanh,
    Sech,
    Csch,
    Coth,
    Asin,
    Acos,
    Atan,
    Asec,
    Acsc,
    Acot,
    Asinh,
    Acosh,
    Atanh,
    Asech,
    Acsch,
    Acoth,
    Piecewise,
    Piece,
    Otherwise,
}

/// A MathML content tree as delivered by the external tree builder.
/// Finite and tree-shaped, traversed depth-first.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Apply(MathOp, Vec<Expr>),
    /// Variable reference, resolved against the enclosing component.
    Ci(Ident),
    /// Numeric literal: source lexeme, parsed value, optional units name.
    Cn(String, f64, Option<Ident>),
    True,
    False,
    Pi,
    E,
    Inf,
    Nan,
}

/// Shape of a `diff` application, used by the equation classifier.
#[derive(Clone, Debug, PartialEq)]
pub enum Derivative<'a> {
    /// d(state)/d(voi) with degree 1
    First { voi: &'a str, state: &'a str },
    /// nested `diff` or a `degree` other than 1; `state` is the
    /// innermost differentiated variable when one can be found
    HigherOrder { state: Option<&'a str> },
    /// `diff` applied to something other than a plain variable
    OfExpression,
}

impl Expr {
    /// Depth-first preorder traversal.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        f(self);
        if let Expr::Apply(_, args) = self {
            for arg in args.iter() {
                arg.walk(f);
            }
        }
    }

    /// The names of all variables referenced by this tree, in first
    /// encounter order (kept stable for deterministic diagnostics).
    pub fn variable_names(&self) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut names: Vec<&str> = Vec::new();
        self.walk(&mut |e| {
            if let Expr::Ci(name) = e {
                if seen.insert(name.as_str()) {
                    names.push(name.as_str());
                }
            }
        });
        names
    }

    /// Matches `Apply(diff, [Apply(bvar, ...), operand])` and reports
    /// whether it is a well-formed first derivative.
    pub fn as_derivative(&self) -> Option<Derivative<'_>> {
        let (op, args) = match self {
            Expr::Apply(op, args) => (op, args),
            _ => return None,
        };
        if *op != MathOp::Diff || args.len() != 2 {
            return None;
        }

        let bvar_args = match &args[0] {
            Expr::Apply(MathOp::Bvar, bvar_args) => bvar_args,
            _ => return Some(Derivative::OfExpression),
        };
        let voi = bvar_args.iter().find_map(|e| match e {
            Expr::Ci(name) => Some(name.as_str()),
            _ => None,
        })?;

        let degree_is_one = bvar_args
            .iter()
            .filter_map(|e| match e {
                Expr::Apply(MathOp::Degree, degree_args) => degree_args.first(),
                _ => None,
            })
            .all(|d| matches!(d, Expr::Cn(_, value, _) if *value == 1.0));

        match &args[1] {
            Expr::Ci(state) => {
                if degree_is_one {
                    Some(Derivative::First { voi, state })
                } else {
                    Some(Derivative::HigherOrder {
                        state: Some(state.as_str()),
                    })
                }
            }
            inner @ Expr::Apply(MathOp::Diff, _) => {
                let state = match inner.as_derivative() {
                    Some(Derivative::First { state, .. }) => Some(state),
                    Some(Derivative::HigherOrder { state }) => state,
                    _ => None,
                };
                Some(Derivative::HigherOrder { state })
            }
            _ => Some(Derivative::OfExpression),
        }
    }

    /// Basic constant folding over numeric leaves: a literal, or a unary
    /// minus/plus chain over one.  Anything symbolic returns None.
    pub fn fold_constant(&self) -> Option<f64> {
        match self {
            Expr::Cn(_, value, _) => Some(*value),
            Expr::Apply(MathOp::Minus, args) if args.len() == 1 => {
                args[0].fold_constant().map(|v| -v)
            }
            Expr::Apply(MathOp::Plus, args) if args.len() == 1 => args[0].fold_constant(),
            _ => None,
        }
    }
}
