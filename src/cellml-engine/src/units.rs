// Copyright 2026 The CellML Engine Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Units name resolution.  This layer only answers "does this units name
//! resolve" — conversion arithmetic lives outside the core.

use std::collections::HashSet;

use crate::common::{is_integer_string, Ident, Issue, IssueCode, IssueKind};
use crate::datamodel::Model;

/// The built-in units of the CellML specification: the SI base and
/// derived named units plus `dimensionless`.
pub const BUILTIN_UNITS: &[&str] = &[
    "ampere",
    "becquerel",
    "candela",
    "celsius",
    "coulomb",
    "dimensionless",
    "farad",
    "gram",
    "gray",
    "henry",
    "hertz",
    "joule",
    "katal",
    "kelvin",
    "kilogram",
    "liter",
    "litre",
    "lumen",
    "lux",
    "meter",
    "metre",
    "mole",
    "newton",
    "ohm",
    "pascal",
    "radian",
    "second",
    "siemens",
    "sievert",
    "steradian",
    "tesla",
    "volt",
    "watt",
    "weber",
];

pub const SI_PREFIXES: &[&str] = &[
    "yotta", "zetta", "exa", "peta", "tera", "giga", "mega", "kilo", "hecto", "deka", "deci",
    "centi", "milli", "micro", "nano", "pico", "femto", "atto", "zepto", "yocto",
];

/// Resolves units names against the built-in table plus the model's own
/// units definitions.
#[derive(Debug, Default, PartialEq)]
pub struct Context {
    names: HashSet<Ident>,
}

impl Context {
    /// Build the resolution context for `model`, validating its units
    /// definitions along the way.  Definition problems are advisory:
    /// they are reported but the name still enters the context so later
    /// lookups don't cascade.
    pub fn new(model: &Model, issues: &mut Vec<Issue>) -> Context {
        let mut names: HashSet<Ident> = BUILTIN_UNITS.iter().map(|n| n.to_string()).collect();

        for units in model.units.iter() {
            if !names.insert(units.name.clone()) {
                issues.push(Issue::new(
                    IssueKind::Units,
                    IssueCode::DuplicateUnits,
                    format!(
                        "Units '{}' in model '{}' is defined more than once or shadows a built-in unit.",
                        units.name, model.name
                    ),
                ));
            }
        }

        let ctx = Context { names };

        for units in model.units.iter() {
            for unit in units.units.iter() {
                if !ctx.resolves(&unit.units) {
                    issues.push(Issue::new(
                        IssueKind::Units,
                        IssueCode::UnknownUnits,
                        format!(
                            "Unit '{}' in units '{}' of model '{}' does not resolve to a built-in unit or a units definition.",
                            unit.units, units.name, model.name
                        ),
                    ));
                }
                if let Some(prefix) = &unit.prefix {
                    if !is_valid_prefix(prefix) {
                        issues.push(Issue::new(
                            IssueKind::Units,
                            IssueCode::BadUnitPrefix,
                            format!(
                                "Prefix '{}' of unit '{}' in units '{}' of model '{}' is not an SI prefix or an integer.",
                                prefix, unit.units, units.name, model.name
                            ),
                        ));
                    }
                }
            }
        }

        ctx
    }

    pub fn resolves(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    SI_PREFIXES.contains(&prefix) || is_integer_string(prefix)
}
