// Copyright 2026 The CellML Engine Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::result;

use lazy_static::lazy_static;
use regex::Regex;
use unicode_xid::UnicodeXID;

pub type Ident = String;

/// The entity family an issue is attached to, mirroring the sections of a
/// CellML document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IssueKind {
    Xml,
    Model,
    Component,
    Variable,
    Units,
    Connection,
    Encapsulation,
    Import,
    Generator,
}

#[cfg(not(tarpaulin_include))]
impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            IssueKind::Xml => "xml",
            IssueKind::Model => "model",
            IssueKind::Component => "component",
            IssueKind::Variable => "variable",
            IssueKind::Units => "units",
            IssueKind::Connection => "connection",
            IssueKind::Encapsulation => "encapsulation",
            IssueKind::Import => "import",
            IssueKind::Generator => "generator",
        };
        write!(f, "{}", name)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IssueCode {
    BadName,
    BadInitialValue,
    UnknownUnits,
    DuplicateUnits,
    BadUnitPrefix,
    UnknownConnectionVariable,
    IllegalConnection,
    SelfConnection,
    HierarchyCrossingConnection,
    UnitsMismatch,
    DoubleInitialisation,
    ImportedMath,
    NotAnEquation,
    UnsupportedEquationForm,
    NotFirstOrder,
    UndefinedVariable,
    VoiInitialised,
    MultipleVois,
    AlgebraicLoop,
    NotInitialised,
    NotComputed,
    ComputedMoreThanOnce,
}

impl IssueCode {
    /// Fatal codes make the model INVALID: no code is emitted and the
    /// query counts collapse to zero.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IssueCode::BadName
                | IssueCode::BadInitialValue
                | IssueCode::UnitsMismatch
                | IssueCode::DoubleInitialisation
                | IssueCode::NotAnEquation
                | IssueCode::UnsupportedEquationForm
                | IssueCode::NotFirstOrder
                | IssueCode::UndefinedVariable
                | IssueCode::VoiInitialised
                | IssueCode::MultipleVois
                | IssueCode::AlgebraicLoop
        )
    }

    /// Constraint-level codes leave the model structurally sound but
    /// under- or over-determined; emission is suppressed and the model
    /// type reports the constraint problem instead.
    pub fn is_underconstraint(&self) -> bool {
        matches!(self, IssueCode::NotInitialised | IssueCode::NotComputed)
    }

    pub fn is_overconstraint(&self) -> bool {
        matches!(self, IssueCode::ComputedMoreThanOnce)
    }
}

#[cfg(not(tarpaulin_include))]
impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            IssueCode::BadName => "bad_name",
            IssueCode::BadInitialValue => "bad_initial_value",
            IssueCode::UnknownUnits => "unknown_units",
            IssueCode::DuplicateUnits => "duplicate_units",
            IssueCode::BadUnitPrefix => "bad_unit_prefix",
            IssueCode::UnknownConnectionVariable => "unknown_connection_variable",
            IssueCode::IllegalConnection => "illegal_connection",
            IssueCode::SelfConnection => "self_connection",
            IssueCode::HierarchyCrossingConnection => "hierarchy_crossing_connection",
            IssueCode::UnitsMismatch => "units_mismatch",
            IssueCode::DoubleInitialisation => "double_initialisation",
            IssueCode::ImportedMath => "imported_math",
            IssueCode::NotAnEquation => "not_an_equation",
            IssueCode::UnsupportedEquationForm => "unsupported_equation_form",
            IssueCode::NotFirstOrder => "not_first_order",
            IssueCode::UndefinedVariable => "undefined_variable",
            IssueCode::VoiInitialised => "voi_initialised",
            IssueCode::MultipleVois => "multiple_vois",
            IssueCode::AlgebraicLoop => "algebraic_loop",
            IssueCode::NotInitialised => "not_initialised",
            IssueCode::NotComputed => "not_computed",
            IssueCode::ComputedMoreThanOnce => "computed_more_than_once",
        };
        write!(f, "{}", name)
    }
}

/// A single entry in the diagnostic channel.  Issues are append-only
/// during analysis and ordered first by phase, then by source order of
/// the entity that triggered them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub code: IssueCode,
    pub description: String,
}

impl Issue {
    pub fn new(kind: IssueKind, code: IssueCode, description: String) -> Self {
        Issue {
            kind,
            code,
            description,
        }
    }
}

#[cfg(not(tarpaulin_include))]
impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{{{}: {}}}", self.kind, self.code, self.description)
    }
}

impl std::error::Error for Issue {}

pub type Result<T> = result::Result<T, Issue>;

/// A CellML identifier: an NCName without a leading dot or digit.  This
/// is the validity check for component, variable and units names.
pub fn is_cellml_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = match chars.next() {
        Some(c) => c == '_' || UnicodeXID::is_xid_start(c),
        None => return false,
    };
    valid_start
        && chars.all(|c| c == '_' || c == '-' || c == '.' || UnicodeXID::is_xid_continue(c))
        && !name.contains(':')
}

lazy_static! {
    static ref REAL_NUMBER_RE: Regex =
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").unwrap();
    static ref INTEGER_RE: Regex = Regex::new(r"^[+-]?\d+$").unwrap();
}

/// Whether `s` is a CellML real-number attribute value (the form taken
/// by initial values and numeric literals).
pub fn is_real_number_string(s: &str) -> bool {
    REAL_NUMBER_RE.is_match(s)
}

pub fn is_integer_string(s: &str) -> bool {
    INTEGER_RE.is_match(s)
}

/// Topologically order `runlist` with respect to `dependencies`, using a
/// postorder traversal so dependencies come before their dependents.
/// Returns the node at which a cycle was detected, if any.
pub fn topo_sort(
    runlist: &[usize],
    dependencies: &HashMap<usize, BTreeSet<usize>>,
) -> result::Result<Vec<usize>, usize> {
    fn add(
        dependencies: &HashMap<usize, BTreeSet<usize>>,
        result: &mut Vec<usize>,
        done: &mut BTreeSet<usize>,
        processing: &mut BTreeSet<usize>,
        node: usize,
    ) -> result::Result<(), usize> {
        if done.contains(&node) {
            return Ok(());
        }
        if !processing.insert(node) {
            return Err(node);
        }
        if let Some(deps) = dependencies.get(&node) {
            for dep in deps.iter() {
                add(dependencies, result, done, processing, *dep)?;
            }
        }
        processing.remove(&node);
        done.insert(node);
        result.push(node);
        Ok(())
    }

    let mut result: Vec<usize> = Vec::with_capacity(runlist.len());
    let mut done: BTreeSet<usize> = BTreeSet::new();
    let mut processing: BTreeSet<usize> = BTreeSet::new();

    for node in runlist.iter() {
        add(dependencies, &mut result, &mut done, &mut processing, *node)?;
    }

    Ok(result)
}
