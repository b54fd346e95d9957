// Copyright 2026 The CellML Engine Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Variable identity across components: a registry assigning dense
//! integer ids to every variable in the model, and a union-find over
//! those ids resolving declared equivalences into equivalence classes
//! with merged attributes.

use std::collections::HashMap;

use crate::common::{is_cellml_identifier, Ident, Issue, IssueCode, IssueKind};
use crate::datamodel::{InitialValue, InterfaceKind, Model, VariableRef};
use crate::units;

pub type VarId = usize;

#[derive(Clone, Debug, PartialEq)]
pub struct VarRecord {
    pub component: Ident,
    pub component_index: usize,
    pub name: Ident,
    pub units: Option<Ident>,
    pub initial_value: Option<InitialValue>,
    pub interface: InterfaceKind,
}

/// Dense integer ids for every variable, assigned by a single pass in
/// (component order, variable order).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Registry {
    vars: Vec<VarRecord>,
    by_key: HashMap<(Ident, Ident), VarId>,
}

impl Registry {
    pub fn new(model: &Model) -> Registry {
        let mut vars = Vec::new();
        let mut by_key = HashMap::new();
        for (ci, component) in model.components.iter().enumerate() {
            for variable in component.variables.iter() {
                let id = vars.len();
                vars.push(VarRecord {
                    component: component.name.clone(),
                    component_index: ci,
                    name: variable.name.clone(),
                    units: variable.units.clone(),
                    initial_value: variable.initial_value.clone(),
                    interface: variable.interface,
                });
                by_key.insert((component.name.clone(), variable.name.clone()), id);
            }
        }
        Registry { vars, by_key }
    }

    pub fn get(&self, component: &str, name: &str) -> Option<VarId> {
        self.by_key
            .get(&(component.to_string(), name.to_string()))
            .copied()
    }

    pub fn var(&self, id: VarId) -> &VarRecord {
        &self.vars[id]
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &VarRecord)> {
        self.vars.iter().enumerate()
    }
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> UnionFind {
        UnionFind {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, id: usize) -> usize {
        let mut root = id;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // path compression
        let mut cur = id;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// The transitive closure of one set of equivalent variables.
#[derive(Clone, Debug, PartialEq)]
pub struct EquivalenceClass {
    /// member ids sorted by (component name, variable name)
    pub members: Vec<VarId>,
    /// the lexicographically first member; drives naming in generated
    /// code and diagnostics
    pub representative: VarId,
    /// merged units name; all members that declare units must agree
    pub units: Option<Ident>,
    /// merged initial value; at most one member may set one
    pub initial_value: Option<InitialValue>,
    /// the member that carried the merged initial value
    pub initialized_by: Option<VarId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Resolver {
    pub classes: Vec<EquivalenceClass>,
    class_of: Vec<usize>,
}

impl Resolver {
    pub fn new(
        model: &Model,
        registry: &Registry,
        units_ctx: &units::Context,
        issues: &mut Vec<Issue>,
    ) -> Resolver {
        check_names(model, issues);
        check_variables(model, registry, units_ctx, issues);

        let mut uf = UnionFind::new(registry.len());
        for equivalence in model.equivalences.iter() {
            let a = resolve_endpoint(&equivalence.first, model, registry, issues);
            let b = resolve_endpoint(&equivalence.second, model, registry, issues);
            let (a, b) = match (a, b) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            check_connection(model, registry, a, b, issues);
            uf.union(a, b);
        }

        // group members under their root, keyed by smallest member id so
        // class order follows source order
        let mut grouped: HashMap<usize, Vec<VarId>> = HashMap::new();
        for id in 0..registry.len() {
            grouped.entry(uf.find(id)).or_default().push(id);
        }
        let mut roots: Vec<usize> = grouped.keys().copied().collect();
        roots.sort_by_key(|root| grouped[root].iter().copied().min());

        let mut classes = Vec::with_capacity(roots.len());
        let mut class_of = vec![0usize; registry.len()];
        for root in roots {
            let mut members = grouped.remove(&root).unwrap_or_default();
            members.sort_by(|a, b| {
                let ra = registry.var(*a);
                let rb = registry.var(*b);
                (&ra.component, &ra.name).cmp(&(&rb.component, &rb.name))
            });
            let representative = members[0];
            for member in members.iter() {
                class_of[*member] = classes.len();
            }
            let units = merge_units(&members, registry, issues);
            let initialized_by = merge_initial_value(&members, registry, issues);
            classes.push(EquivalenceClass {
                members,
                representative,
                units,
                initial_value: initialized_by.and_then(|id| registry.var(id).initial_value.clone()),
                initialized_by,
            });
        }

        Resolver { classes, class_of }
    }

    pub fn class_of(&self, id: VarId) -> usize {
        self.class_of[id]
    }

    pub fn class(&self, index: usize) -> &EquivalenceClass {
        &self.classes[index]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

fn check_names(model: &Model, issues: &mut Vec<Issue>) {
    for component in model.components.iter() {
        if !is_cellml_identifier(&component.name) {
            issues.push(Issue::new(
                IssueKind::Component,
                IssueCode::BadName,
                format!(
                    "Component name '{}' in model '{}' is not a valid CellML identifier.",
                    component.name, model.name
                ),
            ));
        }
    }
}

fn check_variables(
    model: &Model,
    registry: &Registry,
    units_ctx: &units::Context,
    issues: &mut Vec<Issue>,
) {
    for (_, record) in registry.iter() {
        if !is_cellml_identifier(&record.name) {
            issues.push(Issue::new(
                IssueKind::Variable,
                IssueCode::BadName,
                format!(
                    "Variable name '{}' in component '{}' of model '{}' is not a valid CellML identifier.",
                    record.name, record.component, model.name
                ),
            ));
        }
        if let Some(units) = &record.units {
            if !units_ctx.resolves(units) {
                issues.push(Issue::new(
                    IssueKind::Units,
                    IssueCode::UnknownUnits,
                    format!(
                        "Variable '{}' in component '{}' of model '{}' has units '{}' which do not resolve to a built-in unit or a units definition.",
                        record.name, record.component, model.name, units
                    ),
                ));
            }
        }
        if let Some(InitialValue::Reference(target)) = &record.initial_value {
            if registry.get(&record.component, target).is_none() {
                issues.push(Issue::new(
                    IssueKind::Variable,
                    IssueCode::BadInitialValue,
                    format!(
                        "Variable '{}' in component '{}' of model '{}' has an initial value '{}' which is not a real number or the name of a variable in the same component.",
                        record.name, record.component, model.name, target
                    ),
                ));
            }
        }
    }
}

fn resolve_endpoint(
    endpoint: &VariableRef,
    model: &Model,
    registry: &Registry,
    issues: &mut Vec<Issue>,
) -> Option<VarId> {
    match registry.get(&endpoint.component, &endpoint.variable) {
        Some(id) => Some(id),
        None => {
            issues.push(Issue::new(
                IssueKind::Connection,
                IssueCode::UnknownConnectionVariable,
                format!(
                    "Variable '{}' in component '{}' of model '{}' is mapped by a connection, but it is not defined in the model.",
                    endpoint.variable, endpoint.component, model.name
                ),
            ));
            None
        }
    }
}

/// Interface legality for one declared equivalence.  Violations are
/// advisory: they are reported but the edge still takes part in the
/// union.
fn check_connection(
    model: &Model,
    registry: &Registry,
    a: VarId,
    b: VarId,
    issues: &mut Vec<Issue>,
) {
    let va = registry.var(a);
    let vb = registry.var(b);

    if va.component == vb.component {
        issues.push(Issue::new(
            IssueKind::Connection,
            IssueCode::SelfConnection,
            format!(
                "Variable '{}' and variable '{}' in component '{}' of model '{}' cannot be mapped to each other; connections must join distinct components.",
                va.name, vb.name, va.component, model.name
            ),
        ));
        return;
    }

    if model.are_siblings(&va.component, &vb.component) {
        if !(va.interface.exposes_public() && vb.interface.exposes_public()) {
            issues.push(Issue::new(
                IssueKind::Connection,
                IssueCode::IllegalConnection,
                format!(
                    "Variable '{}' in component '{}' and variable '{}' in component '{}' are equivalent, but their interface types do not allow a connection between sibling components.",
                    va.name, va.component, vb.name, vb.component
                ),
            ));
        }
    } else if model.is_encapsulation_parent_of(&va.component, &vb.component)
        || model.is_encapsulation_parent_of(&vb.component, &va.component)
    {
        let (parent, child) = if model.is_encapsulation_parent_of(&va.component, &vb.component) {
            (va, vb)
        } else {
            (vb, va)
        };
        if !(parent.interface.exposes_private() && child.interface.exposes_public()) {
            issues.push(Issue::new(
                IssueKind::Connection,
                IssueCode::IllegalConnection,
                format!(
                    "Variable '{}' in component '{}' and variable '{}' in component '{}' are equivalent, but their interface types do not allow a connection between a component and its encapsulated child.",
                    parent.name, parent.component, child.name, child.component
                ),
            ));
        }
    } else {
        // components unrelated in the encapsulation forest; surfaced for
        // triage, analysis continues
        issues.push(Issue::new(
            IssueKind::Encapsulation,
            IssueCode::HierarchyCrossingConnection,
            format!(
                "Variable '{}' in component '{}' and variable '{}' in component '{}' are equivalent, but their components are neither siblings nor in an encapsulation relationship.",
                va.name, va.component, vb.name, vb.component
            ),
        ));
    }
}

fn merge_units(members: &[VarId], registry: &Registry, issues: &mut Vec<Issue>) -> Option<Ident> {
    let mut merged: Option<(VarId, &Ident)> = None;
    for member in members.iter() {
        let record = registry.var(*member);
        let units = match &record.units {
            Some(units) => units,
            None => continue,
        };
        match merged {
            None => merged = Some((*member, units)),
            Some((first, first_units)) => {
                if first_units != units {
                    let fr = registry.var(first);
                    issues.push(Issue::new(
                        IssueKind::Units,
                        IssueCode::UnitsMismatch,
                        format!(
                            "Variable '{}' in component '{}' and variable '{}' in component '{}' are equivalent and cannot therefore be declared in units '{}' and '{}'.",
                            fr.name, fr.component, record.name, record.component, first_units, units
                        ),
                    ));
                    return Some(first_units.clone());
                }
            }
        }
    }
    merged.map(|(_, units)| units.clone())
}

fn merge_initial_value(
    members: &[VarId],
    registry: &Registry,
    issues: &mut Vec<Issue>,
) -> Option<VarId> {
    let mut initialised: Option<VarId> = None;
    for member in members.iter() {
        let record = registry.var(*member);
        if record.initial_value.is_none() {
            continue;
        }
        match initialised {
            None => initialised = Some(*member),
            Some(first) => {
                let fr = registry.var(first);
                issues.push(Issue::new(
                    IssueKind::Generator,
                    IssueCode::DoubleInitialisation,
                    format!(
                        "Variable '{}' in component '{}' and variable '{}' in component '{}' are equivalent and cannot therefore both be initialised.",
                        fr.name, fr.component, record.name, record.component
                    ),
                ));
                break;
            }
        }
    }
    initialised
}
