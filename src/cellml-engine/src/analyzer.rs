// Copyright 2026 The CellML Engine Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! System analysis: assigns every equivalence class a role, detects
//! under/over/unsuitably constrained systems, orders the algebraic
//! equations for evaluation and lowers everything to slot-addressed
//! statements ready for emission.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::ast::{Expr, MathOp};
use crate::common::{topo_sort, Ident, Issue, IssueCode, IssueKind};
use crate::datamodel::{InitialValue, Model};
use crate::model::{Equation, EquationKind};
use crate::variable::{Registry, Resolver, VarId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModelType {
    Unknown,
    Algebraic,
    Ode,
    Invalid,
    Underconstrained,
    Overconstrained,
    UnsuitablyConstrained,
}

impl ModelType {
    /// Whether code can be emitted for a model of this type.
    pub fn is_executable(&self) -> bool {
        matches!(self, ModelType::Algebraic | ModelType::Ode)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VariableRole {
    VariableOfIntegration,
    State,
    Constant,
    ComputedConstant,
    Algebraic,
    External,
}

/// Metadata for one slot of the generated state or variable array.  The
/// name, component and units are those of the class's canonical
/// representative.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzedVariable {
    pub name: Ident,
    pub component: Ident,
    pub units: Ident,
    pub role: VariableRole,
    pub class: usize,
    pub index: usize,
}

/// Where a value lives in the generated code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Voi,
    State(usize),
    Rate(usize),
    Variable(usize),
}

/// A MathML expression lowered onto array slots.
#[derive(Clone, Debug, PartialEq)]
pub enum LoweredExpr {
    Apply(MathOp, Vec<LoweredExpr>),
    Slot(Target),
    Const(f64),
    True,
    False,
    Pi,
    E,
    Inf,
    Nan,
}

/// One assignment statement of the generated code.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub target: Target,
    pub rhs: LoweredExpr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzedSystem {
    pub model_type: ModelType,
    pub voi: Option<AnalyzedVariable>,
    pub states: Vec<AnalyzedVariable>,
    pub variables: Vec<AnalyzedVariable>,
    /// body of initializeConstants
    pub initialisations: Vec<Statement>,
    /// body of computeComputedConstants
    pub computed_constants: Vec<Statement>,
    /// algebraic equations the rates depend on, evaluation order
    pub rate_support: Vec<Statement>,
    /// one rate assignment per state, state order
    pub rates: Vec<Statement>,
    /// every algebraic equation, evaluation order (computeVariables)
    pub algebraic: Vec<Statement>,
}

impl AnalyzedSystem {
    fn empty(model_type: ModelType) -> AnalyzedSystem {
        AnalyzedSystem {
            model_type,
            voi: None,
            states: Vec::new(),
            variables: Vec::new(),
            initialisations: Vec::new(),
            computed_constants: Vec::new(),
            rate_support: Vec::new(),
            rates: Vec::new(),
            algebraic: Vec::new(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Tier {
    /// right-hand side folds to a literal; assigned with the constants
    Folded,
    /// depends only on constants; evaluated once after initialisation
    Computed,
    /// depends on the VoI, a state or another algebraic value
    Dynamic,
}

pub fn analyze(
    model: &Model,
    registry: &Registry,
    resolver: &Resolver,
    equations: &[Equation],
    issues: &mut Vec<Issue>,
) -> AnalyzedSystem {
    // 1. variable of integration
    let mut voi_class: Option<usize> = None;
    let mut bvar_classes: HashSet<usize> = HashSet::new();
    let mut extra_vois: HashSet<usize> = HashSet::new();
    for equation in equations.iter() {
        if let EquationKind::Ode { voi, .. } = equation.kind {
            let class = resolver.class_of(voi);
            bvar_classes.insert(class);
            match voi_class {
                None => voi_class = Some(class),
                Some(existing) if existing != class => {
                    if extra_vois.insert(class) {
                        let a = registry.var(resolver.class(existing).representative);
                        let b = registry.var(resolver.class(class).representative);
                        issues.push(Issue::new(
                            IssueKind::Generator,
                            IssueCode::MultipleVois,
                            format!(
                                "Variable '{}' in component '{}' and variable '{}' in component '{}' cannot both be a variable of integration.",
                                a.name, a.component, b.name, b.component
                            ),
                        ));
                    }
                }
                _ => {}
            }
        }
    }
    if let Some(class_index) = voi_class {
        let class = resolver.class(class_index);
        if class.initial_value.is_some() {
            let member = class.initialized_by.unwrap_or(class.representative);
            let record = registry.var(member);
            issues.push(Issue::new(
                IssueKind::Generator,
                IssueCode::VoiInitialised,
                format!(
                    "Variable '{}' in component '{}' of model '{}' cannot be both a variable of integration and initialised.",
                    record.name, record.component, model.name
                ),
            ));
        }
    }

    // 2. states
    let mut state_classes: Vec<usize> = Vec::new();
    let mut ode_of_state: HashMap<usize, usize> = HashMap::new();
    for (i, equation) in equations.iter().enumerate() {
        if let EquationKind::Ode { state, .. } = equation.kind {
            let class = resolver.class_of(state);
            let record = registry.var(state);
            if Some(class) == voi_class {
                issues.push(Issue::new(
                    IssueKind::Generator,
                    IssueCode::UnsupportedEquationForm,
                    format!(
                        "Variable '{}' in component '{}' of model '{}' is used both as the variable of integration and as a state variable.",
                        record.name, record.component, model.name
                    ),
                ));
                continue;
            }
            if ode_of_state.contains_key(&class) {
                issues.push(Issue::new(
                    IssueKind::Generator,
                    IssueCode::ComputedMoreThanOnce,
                    format!(
                        "Variable '{}' in component '{}' of model '{}' is computed more than once.",
                        record.name, record.component, model.name
                    ),
                ));
                continue;
            }
            ode_of_state.insert(class, i);
            state_classes.push(class);
            if resolver.class(class).initial_value.is_none() {
                issues.push(Issue::new(
                    IssueKind::Generator,
                    IssueCode::NotInitialised,
                    format!(
                        "Variable '{}' in component '{}' of model '{}' is used in an ODE, but it is not initialised.",
                        record.name, record.component, model.name
                    ),
                ));
            }
        }
    }

    // 3. the bipartite relation: which equations compute which classes
    let algebraic_eqs: Vec<usize> = equations
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e.kind, EquationKind::Assign { .. }))
        .map(|(i, _)| i)
        .collect();
    let mut computed_by: HashMap<usize, Vec<usize>> = HashMap::new();
    for &i in algebraic_eqs.iter() {
        if let EquationKind::Assign { lhs } = equations[i].kind {
            computed_by.entry(resolver.class_of(lhs)).or_default().push(i);
        }
    }

    let mut overdetermined_reported: HashSet<usize> = HashSet::new();
    for &i in algebraic_eqs.iter() {
        if let EquationKind::Assign { lhs } = equations[i].kind {
            let class = resolver.class_of(lhs);
            let definitions = computed_by[&class].len()
                + usize::from(ode_of_state.contains_key(&class))
                + usize::from(Some(class) == voi_class);
            if definitions > 1 && overdetermined_reported.insert(class) {
                let record = registry.var(resolver.class(class).representative);
                issues.push(Issue::new(
                    IssueKind::Generator,
                    IssueCode::ComputedMoreThanOnce,
                    format!(
                        "Variable '{}' in component '{}' of model '{}' is computed more than once.",
                        record.name, record.component, model.name
                    ),
                ));
            } else if resolver.class(class).initial_value.is_some()
                && !ode_of_state.contains_key(&class)
                && overdetermined_reported.insert(class)
            {
                let record = registry.var(resolver.class(class).representative);
                issues.push(Issue::new(
                    IssueKind::Generator,
                    IssueCode::ComputedMoreThanOnce,
                    format!(
                        "Variable '{}' in component '{}' of model '{}' is both initialised and computed by an equation.",
                        record.name, record.component, model.name
                    ),
                ));
            }
        }
    }

    // 4. underdetermined classes; anything that acted as a bvar is
    // exempt so a two-VoI model reports exactly the VoI conflict
    for (class_index, class) in resolver.classes.iter().enumerate() {
        let is_voi = bvar_classes.contains(&class_index);
        let is_state = ode_of_state.contains_key(&class_index);
        let is_computed = computed_by.contains_key(&class_index);
        if !is_voi && !is_state && !is_computed && class.initial_value.is_none() {
            let record = registry.var(class.representative);
            issues.push(Issue::new(
                IssueKind::Generator,
                IssueCode::NotComputed,
                format!(
                    "Variable '{}' in component '{}' of model '{}' is not computed.",
                    record.name, record.component, model.name
                ),
            ));
        }
    }

    // 5. evaluation order over the algebraic equations
    let mut deps: HashMap<usize, BTreeSet<usize>> = HashMap::new();
    for &i in algebraic_eqs.iter() {
        let entry = deps.entry(i).or_default();
        for &referenced in equations[i].rhs_references.iter() {
            let class = resolver.class_of(referenced);
            if Some(class) == voi_class || ode_of_state.contains_key(&class) {
                // known values at evaluation time; dependency chains break here
                continue;
            }
            if let Some(computers) = computed_by.get(&class) {
                entry.insert(computers[0]);
            }
        }
    }
    let order = match topo_sort(&algebraic_eqs, &deps) {
        Ok(order) => order,
        Err(node) => {
            if let EquationKind::Assign { lhs } = equations[node].kind {
                let record = registry.var(lhs);
                issues.push(Issue::new(
                    IssueKind::Generator,
                    IssueCode::AlgebraicLoop,
                    format!(
                        "Variable '{}' in component '{}' of model '{}' is computed through a cycle of algebraic equations.",
                        record.name, record.component, model.name
                    ),
                ));
            }
            Vec::new()
        }
    };

    // 6. constant tiers for the ordered algebraic equations
    let declared_constant = |class_index: usize| {
        resolver.class(class_index).initial_value.is_some()
            && Some(class_index) != voi_class
            && !ode_of_state.contains_key(&class_index)
            && !computed_by.contains_key(&class_index)
    };
    let mut tier_of_class: HashMap<usize, Tier> = HashMap::new();
    for &i in order.iter() {
        if let EquationKind::Assign { lhs } = equations[i].kind {
            let class = resolver.class_of(lhs);
            let tier = if equations[i].rhs.fold_constant().is_some() {
                Tier::Folded
            } else {
                let constant_inputs = equations[i].rhs_references.iter().all(|&referenced| {
                    let rc = resolver.class_of(referenced);
                    declared_constant(rc)
                        || matches!(tier_of_class.get(&rc), Some(Tier::Folded | Tier::Computed))
                });
                if constant_inputs {
                    Tier::Computed
                } else {
                    Tier::Dynamic
                }
            };
            tier_of_class.insert(class, tier);
        }
    }

    // 7. initial values that reference another variable must resolve to
    // a constant, without cycles
    check_initial_references(
        model,
        registry,
        resolver,
        &declared_constant,
        issues,
    );

    // 8. model type
    let has_fatal = issues.iter().any(|i| i.code.is_fatal());
    let under = issues.iter().any(|i| i.code.is_underconstraint());
    let over = issues.iter().any(|i| i.code.is_overconstraint());
    let has_ode = !state_classes.is_empty()
        || equations
            .iter()
            .any(|e| matches!(e.kind, EquationKind::Ode { .. }));
    let model_type = if has_fatal {
        ModelType::Invalid
    } else if under && over {
        ModelType::UnsuitablyConstrained
    } else if over {
        ModelType::Overconstrained
    } else if under {
        ModelType::Underconstrained
    } else if registry.is_empty() && equations.is_empty() {
        ModelType::Unknown
    } else if has_ode {
        ModelType::Ode
    } else {
        ModelType::Algebraic
    };
    if !model_type.is_executable() {
        return AnalyzedSystem::empty(model_type);
    }

    // 9. slot assignment
    let mut slot_of_class: HashMap<usize, Target> = HashMap::new();
    let analyzed = |class_index: usize, role: VariableRole, index: usize| {
        let class = resolver.class(class_index);
        let record = registry.var(class.representative);
        AnalyzedVariable {
            name: record.name.clone(),
            component: record.component.clone(),
            units: class.units.clone().unwrap_or_default(),
            role,
            class: class_index,
            index,
        }
    };

    let voi = voi_class.map(|class_index| {
        slot_of_class.insert(class_index, Target::Voi);
        analyzed(class_index, VariableRole::VariableOfIntegration, 0)
    });

    let mut states = Vec::with_capacity(state_classes.len());
    for (i, &class_index) in state_classes.iter().enumerate() {
        slot_of_class.insert(class_index, Target::State(i));
        states.push(analyzed(class_index, VariableRole::State, i));
    }

    let mut variables = Vec::new();
    let mut push_variable = |class_index: usize,
                             role: VariableRole,
                             slot_of_class: &mut HashMap<usize, Target>,
                             variables: &mut Vec<AnalyzedVariable>| {
        let index = variables.len();
        slot_of_class.insert(class_index, Target::Variable(index));
        variables.push(analyzed(class_index, role, index));
    };
    for class_index in 0..resolver.class_count() {
        if declared_constant(class_index) {
            push_variable(
                class_index,
                VariableRole::Constant,
                &mut slot_of_class,
                &mut variables,
            );
        }
    }
    for (tier, role) in [
        (Tier::Folded, VariableRole::Constant),
        (Tier::Computed, VariableRole::ComputedConstant),
        (Tier::Dynamic, VariableRole::Algebraic),
    ] {
        for &i in order.iter() {
            if let EquationKind::Assign { lhs } = equations[i].kind {
                let class = resolver.class_of(lhs);
                if tier_of_class.get(&class) == Some(&tier) {
                    push_variable(class, role, &mut slot_of_class, &mut variables);
                }
            }
        }
    }

    // 10. lowered statements
    let lower_eq = |i: usize| {
        let component = &model.components[equations[i].component_index].name;
        lower(&equations[i].rhs, component, registry, resolver, &slot_of_class)
    };

    let mut initialisations = Vec::new();
    let mut pending_references: Vec<(Target, usize, VarId, Ident)> = Vec::new();
    let mut initialised_classes: HashSet<usize> = HashSet::new();
    {
        let mut init_slot = |class_index: usize, target: Target| {
            let class = resolver.class(class_index);
            match &class.initial_value {
                Some(InitialValue::Literal(text)) => {
                    let value = text.parse::<f64>().unwrap_or(f64::NAN);
                    initialisations.push(Statement {
                        target,
                        rhs: LoweredExpr::Const(value),
                    });
                    initialised_classes.insert(class_index);
                }
                Some(InitialValue::Reference(name)) => {
                    let member = class.initialized_by.unwrap_or(class.representative);
                    pending_references.push((target, class_index, member, name.clone()));
                }
                None => {}
            }
        };
        for (i, &class_index) in state_classes.iter().enumerate() {
            init_slot(class_index, Target::State(i));
        }
        for variable in variables.iter() {
            if variable.role == VariableRole::Constant {
                init_slot(variable.class, Target::Variable(variable.index));
            }
        }
    }
    // folded equations are constants assigned during initialisation
    for &i in order.iter() {
        if let EquationKind::Assign { lhs } = equations[i].kind {
            let class = resolver.class_of(lhs);
            if tier_of_class.get(&class) == Some(&Tier::Folded) {
                if let (Some(&target), Some(value)) = (
                    slot_of_class.get(&class),
                    equations[i].rhs.fold_constant(),
                ) {
                    initialisations.push(Statement {
                        target,
                        rhs: LoweredExpr::Const(value),
                    });
                    initialised_classes.insert(class);
                }
            }
        }
    }
    // reference initial values, each emitted once its referent is set
    while !pending_references.is_empty() {
        let mut progressed = false;
        pending_references.retain(|(target, class_index, member, name)| {
            let record = registry.var(*member);
            let referenced = registry
                .get(&record.component, name)
                .map(|id| resolver.class_of(id));
            match referenced {
                Some(rc) if initialised_classes.contains(&rc) => {
                    if let Some(&slot) = slot_of_class.get(&rc) {
                        initialisations.push(Statement {
                            target: *target,
                            rhs: LoweredExpr::Slot(slot),
                        });
                    }
                    initialised_classes.insert(*class_index);
                    progressed = true;
                    false
                }
                _ => true,
            }
        });
        if !progressed {
            // unresolvable references were already reported as fatal
            break;
        }
    }

    let mut computed_constants = Vec::new();
    let mut algebraic = Vec::new();
    for &i in order.iter() {
        if let EquationKind::Assign { lhs } = equations[i].kind {
            let class = resolver.class_of(lhs);
            let target = match slot_of_class.get(&class) {
                Some(&target) => target,
                None => continue,
            };
            match tier_of_class.get(&class) {
                Some(Tier::Computed) => computed_constants.push(Statement {
                    target,
                    rhs: lower_eq(i),
                }),
                Some(Tier::Dynamic) => algebraic.push(Statement {
                    target,
                    rhs: lower_eq(i),
                }),
                _ => {}
            }
        }
    }

    // the subset of dynamic equations the rates transitively depend on
    let mut needed: BTreeSet<usize> = BTreeSet::new();
    {
        let mut frontier: Vec<usize> = Vec::new();
        for equation in equations.iter() {
            if let EquationKind::Ode { .. } = equation.kind {
                for &referenced in equation.rhs_references.iter() {
                    let class = resolver.class_of(referenced);
                    if let Some(computers) = computed_by.get(&class) {
                        frontier.push(computers[0]);
                    }
                }
            }
        }
        while let Some(i) = frontier.pop() {
            if needed.insert(i) {
                if let Some(eq_deps) = deps.get(&i) {
                    frontier.extend(eq_deps.iter().copied());
                }
            }
        }
    }
    let rate_support: Vec<Statement> = order
        .iter()
        .filter(|i| needed.contains(i))
        .filter_map(|&i| {
            if let EquationKind::Assign { lhs } = equations[i].kind {
                let class = resolver.class_of(lhs);
                if tier_of_class.get(&class) == Some(&Tier::Dynamic) {
                    return slot_of_class.get(&class).map(|&target| Statement {
                        target,
                        rhs: lower_eq(i),
                    });
                }
            }
            None
        })
        .collect();

    let mut rates = Vec::with_capacity(state_classes.len());
    for (i, class_index) in state_classes.iter().enumerate() {
        let equation_index = ode_of_state[class_index];
        rates.push(Statement {
            target: Target::Rate(i),
            rhs: lower_eq(equation_index),
        });
    }

    AnalyzedSystem {
        model_type,
        voi,
        states,
        variables,
        initialisations,
        computed_constants,
        rate_support,
        rates,
        algebraic,
    }
}

fn check_initial_references(
    model: &Model,
    registry: &Registry,
    resolver: &Resolver,
    declared_constant: &dyn Fn(usize) -> bool,
    issues: &mut Vec<Issue>,
) {
    for (class_index, class) in resolver.classes.iter().enumerate() {
        let name = match &class.initial_value {
            Some(InitialValue::Reference(name)) => name,
            _ => continue,
        };
        let member = class.initialized_by.unwrap_or(class.representative);
        let record = registry.var(member);
        let referenced = match registry.get(&record.component, name) {
            Some(id) => id,
            // nonexistent reference targets were reported when the
            // registry was validated
            None => continue,
        };

        // follow the chain of reference initial values looking for a
        // class that is not a constant, or a cycle
        let mut seen: HashSet<usize> = HashSet::new();
        seen.insert(class_index);
        let mut current = resolver.class_of(referenced);
        loop {
            if !seen.insert(current) {
                issues.push(Issue::new(
                    IssueKind::Variable,
                    IssueCode::BadInitialValue,
                    format!(
                        "Variable '{}' in component '{}' of model '{}' has an initial value that is defined through a cycle of variable references.",
                        record.name, record.component, model.name
                    ),
                ));
                break;
            }
            let current_class = resolver.class(current);
            match &current_class.initial_value {
                Some(InitialValue::Reference(next_name)) => {
                    let next_member = current_class
                        .initialized_by
                        .unwrap_or(current_class.representative);
                    let next_record = registry.var(next_member);
                    match registry.get(&next_record.component, next_name) {
                        Some(id) => current = resolver.class_of(id),
                        None => break,
                    }
                }
                Some(InitialValue::Literal(_)) => {
                    if !declared_constant(current) {
                        issues.push(Issue::new(
                            IssueKind::Variable,
                            IssueCode::BadInitialValue,
                            format!(
                                "Variable '{}' in component '{}' of model '{}' has an initial value that references variable '{}', which is not a constant.",
                                record.name, record.component, model.name, name
                            ),
                        ));
                    }
                    break;
                }
                None => {
                    issues.push(Issue::new(
                        IssueKind::Variable,
                        IssueCode::BadInitialValue,
                        format!(
                            "Variable '{}' in component '{}' of model '{}' has an initial value that references variable '{}', which is not a constant.",
                            record.name, record.component, model.name, name
                        ),
                    ));
                    break;
                }
            }
        }
    }
}

fn lower(
    expr: &Expr,
    component: &str,
    registry: &Registry,
    resolver: &Resolver,
    slots: &HashMap<usize, Target>,
) -> LoweredExpr {
    match expr {
        Expr::Apply(op, args) => LoweredExpr::Apply(
            *op,
            args.iter()
                .map(|arg| lower(arg, component, registry, resolver, slots))
                .collect(),
        ),
        Expr::Ci(name) => {
            let slot = registry
                .get(component, name)
                .map(|id| resolver.class_of(id))
                .and_then(|class| slots.get(&class).copied());
            match slot {
                Some(target) => LoweredExpr::Slot(target),
                // only reachable for models that are not emitted
                None => LoweredExpr::Const(f64::NAN),
            }
        }
        Expr::Cn(_, value, _) => LoweredExpr::Const(*value),
        Expr::True => LoweredExpr::True,
        Expr::False => LoweredExpr::False,
        Expr::Pi => LoweredExpr::Pi,
        Expr::E => LoweredExpr::E,
        Expr::Inf => LoweredExpr::Inf,
        Expr::Nan => LoweredExpr::Nan,
    }
}
