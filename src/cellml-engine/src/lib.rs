// Copyright 2026 The CellML Engine Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Semantic analysis and code generation for CellML 2.0 models.
//!
//! The pipeline starts from a parsed model graph ([`datamodel::Model`]),
//! resolves variable equivalences into classes, classifies every
//! equation, analyzes the resulting system and finally emits C or
//! Python source through a [`Profile`].  [`Generator`] drives the whole
//! thing and exposes the query surface over the analyzed system.

#![forbid(unsafe_code)]

pub mod analyzer;
pub mod ast;
pub mod common;
pub mod datamodel;
mod generator;
mod model;
mod profile;
#[cfg(test)]
mod testutils;
pub mod units;
mod variable;

pub use self::analyzer::{AnalyzedVariable, ModelType, VariableRole};
pub use self::common::{Issue, IssueCode, IssueKind, Result};
pub use self::generator::Generator;
pub use self::model::{Equation, EquationKind};
pub use self::profile::{Profile, ProfileKind};
pub use self::variable::{EquivalenceClass, Registry, Resolver};
