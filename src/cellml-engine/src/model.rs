// Copyright 2026 The CellML Engine Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Equation classification: walks each component's MathML statements and
//! splits them into ODEs and algebraic assignments, resolving every
//! variable reference against the enclosing component.

use crate::ast::{Derivative, Expr, MathOp};
use crate::common::{Issue, IssueCode, IssueKind};
use crate::datamodel::Model;
use crate::variable::{Registry, VarId};

#[derive(Clone, Debug, PartialEq)]
pub enum EquationKind {
    /// d(state)/d(voi) = rhs
    Ode { state: VarId, voi: VarId },
    /// lhs = rhs
    Assign { lhs: VarId },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Equation {
    pub component_index: usize,
    pub kind: EquationKind,
    pub rhs: Expr,
    /// every variable referenced anywhere in the equation
    pub references: Vec<VarId>,
    /// variables referenced by the right-hand side only
    pub rhs_references: Vec<VarId>,
}

/// Classify every top-level `eq` application of every component.
/// Malformed equations are reported and skipped; the rest of the model
/// still gets classified.
pub fn classify_equations(
    model: &Model,
    registry: &Registry,
    issues: &mut Vec<Issue>,
) -> Vec<Equation> {
    let mut equations = Vec::new();

    for (component_index, component) in model.components.iter().enumerate() {
        if component.import.is_some() {
            if !component.math.is_empty() {
                issues.push(Issue::new(
                    IssueKind::Import,
                    IssueCode::ImportedMath,
                    format!(
                        "Imported component '{}' of model '{}' carries local math, which is ignored.",
                        component.name, model.name
                    ),
                ));
            }
            continue;
        }

        for statement in component.math.iter() {
            if let Some(equation) =
                classify_statement(statement, model, component_index, registry, issues)
            {
                equations.push(equation);
            }
        }
    }

    equations
}

fn classify_statement(
    statement: &Expr,
    model: &Model,
    component_index: usize,
    registry: &Registry,
    issues: &mut Vec<Issue>,
) -> Option<Equation> {
    let component = &model.components[component_index];

    let (lhs, rhs) = match statement {
        Expr::Apply(MathOp::Eq, sides) if sides.len() == 2 => (&sides[0], &sides[1]),
        _ => {
            issues.push(Issue::new(
                IssueKind::Generator,
                IssueCode::NotAnEquation,
                format!(
                    "The math of component '{}' of model '{}' contains a top-level element that is not an equation.",
                    component.name, model.name
                ),
            ));
            return None;
        }
    };

    // every `ci` must name a variable of the enclosing component
    let mut references = Vec::new();
    let mut missing = false;
    for name in statement.variable_names() {
        match registry.get(&component.name, name) {
            Some(id) => references.push(id),
            None => {
                missing = true;
                issues.push(Issue::new(
                    IssueKind::Generator,
                    IssueCode::UndefinedVariable,
                    format!(
                        "Variable '{}' in component '{}' of model '{}' is referenced in an equation, but it is not defined anywhere.",
                        name, component.name, model.name
                    ),
                ));
            }
        }
    }
    if missing {
        return None;
    }

    let (kind, rhs) = match (lhs.as_derivative(), rhs.as_derivative()) {
        (Some(Derivative::First { .. }), Some(Derivative::First { .. })) => {
            issues.push(Issue::new(
                IssueKind::Generator,
                IssueCode::UnsupportedEquationForm,
                format!(
                    "An equation in component '{}' of model '{}' equates two differential terms, which is not supported.",
                    component.name, model.name
                ),
            ));
            return None;
        }
        (Some(derivative), _) => (ode_kind(derivative, component_index, model, registry, issues)?, rhs),
        (_, Some(derivative)) => (ode_kind(derivative, component_index, model, registry, issues)?, lhs),
        (None, None) => {
            if contains_diff(lhs) || contains_diff(rhs) {
                issues.push(Issue::new(
                    IssueKind::Generator,
                    IssueCode::UnsupportedEquationForm,
                    format!(
                        "An equation in component '{}' of model '{}' uses a differential term inside an expression, which is not supported.",
                        component.name, model.name
                    ),
                ));
                return None;
            }
            match lhs {
                Expr::Ci(name) => {
                    // resolution can't fail: the undefined-name pass above
                    // covered every ci in the statement
                    let lhs_id = registry.get(&component.name, name)?;
                    (EquationKind::Assign { lhs: lhs_id }, rhs)
                }
                _ => {
                    issues.push(Issue::new(
                        IssueKind::Generator,
                        IssueCode::UnsupportedEquationForm,
                        format!(
                            "An equation in component '{}' of model '{}' computes its left-hand side by constraint; the left-hand side must be a single variable reference.",
                            component.name, model.name
                        ),
                    ));
                    return None;
                }
            }
        }
    };

    if contains_diff(rhs) {
        issues.push(Issue::new(
            IssueKind::Generator,
            IssueCode::UnsupportedEquationForm,
            format!(
                "An equation in component '{}' of model '{}' uses a differential term inside an expression, which is not supported.",
                component.name, model.name
            ),
        ));
        return None;
    }

    Some(Equation {
        component_index,
        kind,
        rhs: rhs.clone(),
        references,
        rhs_references: rhs
            .variable_names()
            .into_iter()
            .filter_map(|name| registry.get(&component.name, name))
            .collect(),
    })
}

fn ode_kind(
    derivative: Derivative,
    component_index: usize,
    model: &Model,
    registry: &Registry,
    issues: &mut Vec<Issue>,
) -> Option<EquationKind> {
    let component = &model.components[component_index];
    match derivative {
        Derivative::First { voi, state } => {
            let state = registry.get(&component.name, state)?;
            let voi = registry.get(&component.name, voi)?;
            Some(EquationKind::Ode { state, voi })
        }
        Derivative::HigherOrder { state } => {
            let description = match state {
                Some(state) => format!(
                    "The differential equation for variable '{}' in component '{}' of model '{}' must be of the first order.",
                    state, component.name, model.name
                ),
                None => format!(
                    "A differential equation in component '{}' of model '{}' must be of the first order.",
                    component.name, model.name
                ),
            };
            issues.push(Issue::new(
                IssueKind::Generator,
                IssueCode::NotFirstOrder,
                description,
            ));
            None
        }
        Derivative::OfExpression => {
            issues.push(Issue::new(
                IssueKind::Generator,
                IssueCode::UnsupportedEquationForm,
                format!(
                    "A differential term in component '{}' of model '{}' is applied to an expression; only single variables can be differentiated.",
                    component.name, model.name
                ),
            ));
            None
        }
    }
}

fn contains_diff(expr: &Expr) -> bool {
    let mut found = false;
    expr.walk(&mut |e| {
        if matches!(e, Expr::Apply(MathOp::Diff, _)) {
            found = true;
        }
    });
    found
}
