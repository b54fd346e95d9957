// Copyright 2026 The CellML Engine Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The read view of a structurally valid CellML model, as handed over by
//! the external parser.  The analyzer treats everything here as
//! immutable; mutation invalidates any analysis already performed.

use std::collections::HashMap;

use crate::ast::Expr;
use crate::common::{is_real_number_string, Ident};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum InterfaceKind {
    #[default]
    None,
    Public,
    Private,
    PublicAndPrivate,
}

impl InterfaceKind {
    /// Whether this side of an equivalence may bind to a sibling (or the
    /// environment).
    pub fn exposes_public(&self) -> bool {
        matches!(self, InterfaceKind::Public | InterfaceKind::PublicAndPrivate)
    }

    /// Whether this side of an equivalence may bind to an encapsulated
    /// child.
    pub fn exposes_private(&self) -> bool {
        matches!(
            self,
            InterfaceKind::Private | InterfaceKind::PublicAndPrivate
        )
    }
}

/// An initial value attribute: either a real-number literal or the name
/// of another variable in the same component.
#[derive(Clone, Debug, PartialEq)]
pub enum InitialValue {
    Literal(String),
    Reference(Ident),
}

impl InitialValue {
    pub fn parse(attribute: &str) -> InitialValue {
        if is_real_number_string(attribute) {
            InitialValue::Literal(attribute.to_string())
        } else {
            InitialValue::Reference(attribute.to_string())
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: Ident,
    pub units: Option<Ident>,
    pub initial_value: Option<InitialValue>,
    pub interface: InterfaceKind,
}

impl Variable {
    pub fn new(name: &str, units: &str) -> Variable {
        Variable {
            name: name.to_string(),
            units: if units.is_empty() {
                None
            } else {
                Some(units.to_string())
            },
            initial_value: None,
            interface: InterfaceKind::default(),
        }
    }
}

/// An import reference carried on a component.  Imports are recognized
/// and preserved, never fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct Import {
    pub source: String,
    pub reference: Ident,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub name: Ident,
    pub variables: Vec<Variable>,
    /// the top-level children of the component's `math` element
    pub math: Vec<Expr>,
    pub import: Option<Import>,
}

impl Component {
    pub fn new(name: &str) -> Component {
        Component {
            name: name.to_string(),
            variables: Vec::new(),
            math: Vec::new(),
            import: None,
        }
    }

    pub fn get_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// One term of a units definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    /// name of the referenced units
    pub units: Ident,
    /// SI prefix name or signed integer string
    pub prefix: Option<String>,
    pub exponent: f64,
    pub multiplier: f64,
    pub offset: f64,
}

impl Unit {
    pub fn new(units: &str) -> Unit {
        Unit {
            units: units.to_string(),
            prefix: None,
            exponent: 1.0,
            multiplier: 1.0,
            offset: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Units {
    pub name: Ident,
    pub units: Vec<Unit>,
    pub base: bool,
}

impl Units {
    pub fn new(name: &str) -> Units {
        Units {
            name: name.to_string(),
            units: Vec::new(),
            base: false,
        }
    }
}

/// A (component, variable) pair naming one endpoint of an equivalence.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableRef {
    pub component: Ident,
    pub variable: Ident,
}

impl VariableRef {
    pub fn new(component: &str, variable: &str) -> VariableRef {
        VariableRef {
            component: component.to_string(),
            variable: variable.to_string(),
        }
    }
}

/// An unordered pair of variables declared to name the same physical
/// quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct Equivalence {
    pub first: VariableRef,
    pub second: VariableRef,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Model {
    pub name: Ident,
    pub components: Vec<Component>,
    pub units: Vec<Units>,
    pub equivalences: Vec<Equivalence>,
    // encapsulation is stored as twin maps keyed by component name; the
    // owning direction is parent -> child only
    child_to_parent: HashMap<Ident, Ident>,
    parent_to_children: HashMap<Ident, Vec<Ident>>,
}

impl Model {
    pub fn new(name: &str) -> Model {
        Model {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn get_component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Record `child` as encapsulated inside `parent`.  Returns false
    /// (and leaves the forest unchanged) if the child already has a
    /// parent; a component has at most one.
    pub fn add_encapsulation_edge(&mut self, parent: &str, child: &str) -> bool {
        if self.child_to_parent.contains_key(child) {
            return false;
        }
        self.child_to_parent
            .insert(child.to_string(), parent.to_string());
        self.parent_to_children
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
        true
    }

    pub fn encapsulation_parent(&self, child: &str) -> Option<&str> {
        self.child_to_parent.get(child).map(|s| s.as_str())
    }

    pub fn encapsulation_children(&self, parent: &str) -> &[Ident] {
        self.parent_to_children
            .get(parent)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Two components are siblings when they share an encapsulation
    /// parent; top-level components are siblings of each other.
    pub fn are_siblings(&self, a: &str, b: &str) -> bool {
        self.encapsulation_parent(a) == self.encapsulation_parent(b)
    }

    pub fn is_encapsulation_parent_of(&self, parent: &str, child: &str) -> bool {
        self.encapsulation_parent(child) == Some(parent)
    }
}
