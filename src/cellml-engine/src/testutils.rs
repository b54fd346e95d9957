// Copyright 2026 The CellML Engine Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Test-only helpers for building model graphs and MathML trees, plus
//! the larger model fixtures shared across the test suite.

use crate::analyzer::{analyze, AnalyzedSystem};
use crate::ast::{Expr, MathOp};
use crate::common::Issue;
use crate::datamodel::{
    Component, Equivalence, InitialValue, InterfaceKind, Model, Unit, Units, Variable, VariableRef,
};
use crate::model::classify_equations;
use crate::units;
use crate::variable::{Registry, Resolver};

pub fn ci(name: &str) -> Expr {
    Expr::Ci(name.to_string())
}

pub fn cn(text: &str) -> Expr {
    Expr::Cn(text.to_string(), text.parse().unwrap(), None)
}

pub fn apply(op: MathOp, args: Vec<Expr>) -> Expr {
    Expr::Apply(op, args)
}

pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
    apply(MathOp::Eq, vec![lhs, rhs])
}

/// d(state)/d(voi), the shape the tree builder produces for a
/// first-derivative application.
pub fn ode_lhs(voi: &str, state: &str) -> Expr {
    apply(
        MathOp::Diff,
        vec![apply(MathOp::Bvar, vec![ci(voi)]), ci(state)],
    )
}

pub fn var(name: &str, units: &str) -> Variable {
    Variable::new(name, units)
}

pub fn var_init(name: &str, units: &str, initial: &str) -> Variable {
    let mut v = Variable::new(name, units);
    v.initial_value = Some(InitialValue::parse(initial));
    v
}

fn var_interface(name: &str, units: &str, interface: InterfaceKind) -> Variable {
    let mut v = Variable::new(name, units);
    v.interface = interface;
    v
}

fn var_init_interface(
    name: &str,
    units: &str,
    initial: &str,
    interface: InterfaceKind,
) -> Variable {
    let mut v = var_init(name, units, initial);
    v.interface = interface;
    v
}

pub fn component(name: &str, variables: Vec<Variable>, math: Vec<Expr>) -> Component {
    let mut c = Component::new(name);
    c.variables = variables;
    c.math = math;
    c
}

pub fn model_with(components: Vec<Component>) -> Model {
    let mut m = Model::new("m");
    m.components = components;
    m
}

fn connect(model: &mut Model, c1: &str, v1: &str, c2: &str, v2: &str) {
    model.equivalences.push(Equivalence {
        first: VariableRef::new(c1, v1),
        second: VariableRef::new(c2, v2),
    });
}

/// Run the full analysis pipeline and return the analyzed system plus
/// the accumulated diagnostics.
pub fn analyze_model(model: &Model) -> (AnalyzedSystem, Vec<Issue>) {
    let registry = Registry::new(model);
    let mut issues = Vec::new();
    let units_ctx = units::Context::new(model, &mut issues);
    let resolver = Resolver::new(model, &registry, &units_ctx, &mut issues);
    let equations = classify_equations(model, &registry, &mut issues);
    let system = analyze(model, &registry, &resolver, &equations, &mut issues);
    (system, issues)
}

/// dx/dt = 1; a = 3*b; b = 2*t — one state, two dependent algebraic
/// variables.
pub fn dependent_eqns_model() -> Model {
    model_with(vec![component(
        "my_component",
        vec![
            var("time", "second"),
            var_init("x", "dimensionless", "0"),
            var("a", "second"),
            var("b", "second"),
        ],
        vec![
            eq(ode_lhs("time", "x"), cn("1")),
            eq(ci("a"), apply(MathOp::Times, vec![cn("3"), ci("b")])),
            eq(ci("b"), apply(MathOp::Times, vec![cn("2"), ci("time")])),
        ],
    )])
}

fn hh_units() -> Vec<Units> {
    let term = |reference: &str, prefix: Option<&str>, exponent: f64| {
        let mut unit = Unit::new(reference);
        unit.prefix = prefix.map(|p| p.to_string());
        unit.exponent = exponent;
        unit
    };
    let units = |name: &str, terms: Vec<Unit>| {
        let mut u = Units::new(name);
        u.units = terms;
        u
    };
    vec![
        units("millisecond", vec![term("second", Some("milli"), 1.0)]),
        units("per_millisecond", vec![term("second", Some("milli"), -1.0)]),
        units("millivolt", vec![term("volt", Some("milli"), 1.0)]),
        units(
            "microA_per_cm2",
            vec![
                term("ampere", Some("micro"), 1.0),
                term("metre", Some("centi"), -2.0),
            ],
        ),
        units(
            "microF_per_cm2",
            vec![
                term("farad", Some("micro"), 1.0),
                term("metre", Some("centi"), -2.0),
            ],
        ),
        units(
            "milliS_per_cm2",
            vec![
                term("siemens", Some("milli"), 1.0),
                term("metre", Some("centi"), -2.0),
            ],
        ),
    ]
}

/// The Hodgkin–Huxley 1952 squid axon model: four states (V, m, h, n),
/// a stimulus piecewise, three gate components encapsulated inside
/// their channels, and variables threaded through the hierarchy by
/// equivalences.
pub fn hodgkin_huxley_model() -> Model {
    use InterfaceKind::{Public, PublicAndPrivate};
    let private = InterfaceKind::Private;

    let mut m = Model::new("hodgkin_huxley_squid_axon_model_1952");
    m.units = hh_units();

    let environment = component(
        "environment",
        vec![var_interface("time", "millisecond", Public)],
        vec![],
    );

    let membrane = component(
        "membrane",
        vec![
            var_init_interface("V", "millivolt", "-75", Public),
            var_interface("time", "millisecond", Public),
            var_init("Cm", "microF_per_cm2", "1"),
            var_init_interface("E_R", "millivolt", "-75", Public),
            var_interface("i_Na", "microA_per_cm2", Public),
            var_interface("i_K", "microA_per_cm2", Public),
            var_interface("i_L", "microA_per_cm2", Public),
            var("i_Stim", "microA_per_cm2"),
        ],
        vec![
            // stimulus of -20 uA/cm2 between 10ms and 10.5ms
            eq(
                ci("i_Stim"),
                apply(
                    MathOp::Piecewise,
                    vec![
                        apply(
                            MathOp::Piece,
                            vec![
                                cn("-20"),
                                apply(
                                    MathOp::And,
                                    vec![
                                        apply(MathOp::Geq, vec![ci("time"), cn("10")]),
                                        apply(MathOp::Leq, vec![ci("time"), cn("10.5")]),
                                    ],
                                ),
                            ],
                        ),
                        apply(MathOp::Otherwise, vec![cn("0")]),
                    ],
                ),
            ),
            eq(
                ode_lhs("time", "V"),
                apply(
                    MathOp::Divide,
                    vec![
                        apply(
                            MathOp::Minus,
                            vec![apply(
                                MathOp::Plus,
                                vec![
                                    apply(MathOp::Minus, vec![ci("i_Stim")]),
                                    ci("i_Na"),
                                    ci("i_K"),
                                    ci("i_L"),
                                ],
                            )],
                        ),
                        ci("Cm"),
                    ],
                ),
            ),
        ],
    );

    let leakage = component(
        "leakage_current",
        vec![
            var_init("g_L", "milliS_per_cm2", "0.3"),
            var("E_L", "millivolt"),
            var_interface("i_L", "microA_per_cm2", Public),
            var_interface("V", "millivolt", Public),
            var_interface("E_R", "millivolt", Public),
        ],
        vec![
            eq(
                ci("E_L"),
                apply(MathOp::Plus, vec![ci("E_R"), cn("10.613")]),
            ),
            eq(
                ci("i_L"),
                apply(
                    MathOp::Times,
                    vec![
                        ci("g_L"),
                        apply(MathOp::Minus, vec![ci("V"), ci("E_L")]),
                    ],
                ),
            ),
        ],
    );

    let sodium_channel = component(
        "sodium_channel",
        vec![
            var_interface("i_Na", "microA_per_cm2", Public),
            var_interface("V", "millivolt", PublicAndPrivate),
            var_interface("time", "millisecond", PublicAndPrivate),
            var_init("g_Na", "milliS_per_cm2", "120"),
            var("E_Na", "millivolt"),
            var_interface("E_R", "millivolt", Public),
            var_interface("m", "dimensionless", private),
            var_interface("h", "dimensionless", private),
        ],
        vec![
            eq(ci("E_Na"), apply(MathOp::Plus, vec![ci("E_R"), cn("115")])),
            eq(
                ci("i_Na"),
                apply(
                    MathOp::Times,
                    vec![
                        ci("g_Na"),
                        apply(MathOp::Power, vec![ci("m"), cn("3")]),
                        ci("h"),
                        apply(MathOp::Minus, vec![ci("V"), ci("E_Na")]),
                    ],
                ),
            ),
        ],
    );

    // alpha(V)*(1 - gate) - beta(V)*gate
    let gate_rate = |gate: &str, alpha: &str, beta: &str| {
        apply(
            MathOp::Minus,
            vec![
                apply(
                    MathOp::Times,
                    vec![ci(alpha), apply(MathOp::Minus, vec![cn("1"), ci(gate)])],
                ),
                apply(MathOp::Times, vec![ci(beta), ci(gate)]),
            ],
        )
    };
    let shifted = |offset: &str| apply(MathOp::Plus, vec![ci("V"), cn(offset)]);
    let exp_of = |e: Expr| apply(MathOp::Exp, vec![e]);
    let neg = |e: Expr| apply(MathOp::Minus, vec![e]);

    let m_gate = component(
        "sodium_channel_m_gate",
        vec![
            var_init_interface("m", "dimensionless", "0.05", Public),
            var("alpha_m", "per_millisecond"),
            var("beta_m", "per_millisecond"),
            var_interface("V", "millivolt", Public),
            var_interface("time", "millisecond", Public),
        ],
        vec![
            // alpha_m = -0.1*(V+50)/(exp(-(V+50)/10) - 1)
            eq(
                ci("alpha_m"),
                apply(
                    MathOp::Divide,
                    vec![
                        apply(MathOp::Times, vec![cn("-0.1"), shifted("50")]),
                        apply(
                            MathOp::Minus,
                            vec![
                                exp_of(apply(
                                    MathOp::Divide,
                                    vec![neg(shifted("50")), cn("10")],
                                )),
                                cn("1"),
                            ],
                        ),
                    ],
                ),
            ),
            // beta_m = 4*exp(-(V+75)/18)
            eq(
                ci("beta_m"),
                apply(
                    MathOp::Times,
                    vec![
                        cn("4"),
                        exp_of(apply(MathOp::Divide, vec![neg(shifted("75")), cn("18")])),
                    ],
                ),
            ),
            eq(ode_lhs("time", "m"), gate_rate("m", "alpha_m", "beta_m")),
        ],
    );

    let h_gate = component(
        "sodium_channel_h_gate",
        vec![
            var_init_interface("h", "dimensionless", "0.6", Public),
            var("alpha_h", "per_millisecond"),
            var("beta_h", "per_millisecond"),
            var_interface("V", "millivolt", Public),
            var_interface("time", "millisecond", Public),
        ],
        vec![
            // alpha_h = 0.07*exp(-(V+75)/20)
            eq(
                ci("alpha_h"),
                apply(
                    MathOp::Times,
                    vec![
                        cn("0.07"),
                        exp_of(apply(MathOp::Divide, vec![neg(shifted("75")), cn("20")])),
                    ],
                ),
            ),
            // beta_h = 1/(exp(-(V+45)/10) + 1)
            eq(
                ci("beta_h"),
                apply(
                    MathOp::Divide,
                    vec![
                        cn("1"),
                        apply(
                            MathOp::Plus,
                            vec![
                                exp_of(apply(
                                    MathOp::Divide,
                                    vec![neg(shifted("45")), cn("10")],
                                )),
                                cn("1"),
                            ],
                        ),
                    ],
                ),
            ),
            eq(ode_lhs("time", "h"), gate_rate("h", "alpha_h", "beta_h")),
        ],
    );

    let potassium_channel = component(
        "potassium_channel",
        vec![
            var_interface("i_K", "microA_per_cm2", Public),
            var_interface("V", "millivolt", PublicAndPrivate),
            var_interface("time", "millisecond", PublicAndPrivate),
            var_init("g_K", "milliS_per_cm2", "36"),
            var("E_K", "millivolt"),
            var_interface("E_R", "millivolt", Public),
            var_interface("n", "dimensionless", private),
        ],
        vec![
            eq(
                ci("E_K"),
                apply(MathOp::Minus, vec![ci("E_R"), cn("12")]),
            ),
            eq(
                ci("i_K"),
                apply(
                    MathOp::Times,
                    vec![
                        ci("g_K"),
                        apply(MathOp::Power, vec![ci("n"), cn("4")]),
                        apply(MathOp::Minus, vec![ci("V"), ci("E_K")]),
                    ],
                ),
            ),
        ],
    );

    let n_gate = component(
        "potassium_channel_n_gate",
        vec![
            var_init_interface("n", "dimensionless", "0.325", Public),
            var("alpha_n", "per_millisecond"),
            var("beta_n", "per_millisecond"),
            var_interface("V", "millivolt", Public),
            var_interface("time", "millisecond", Public),
        ],
        vec![
            // alpha_n = -0.01*(V+65)/(exp(-(V+65)/10) - 1)
            eq(
                ci("alpha_n"),
                apply(
                    MathOp::Divide,
                    vec![
                        apply(MathOp::Times, vec![cn("-0.01"), shifted("65")]),
                        apply(
                            MathOp::Minus,
                            vec![
                                exp_of(apply(
                                    MathOp::Divide,
                                    vec![neg(shifted("65")), cn("10")],
                                )),
                                cn("1"),
                            ],
                        ),
                    ],
                ),
            ),
            // beta_n = 0.125*exp((V+75)/80)
            eq(
                ci("beta_n"),
                apply(
                    MathOp::Times,
                    vec![
                        cn("0.125"),
                        exp_of(apply(MathOp::Divide, vec![shifted("75"), cn("80")])),
                    ],
                ),
            ),
            eq(ode_lhs("time", "n"), gate_rate("n", "alpha_n", "beta_n")),
        ],
    );

    m.components = vec![
        environment,
        membrane,
        leakage,
        sodium_channel,
        m_gate,
        h_gate,
        potassium_channel,
        n_gate,
    ];

    m.add_encapsulation_edge("sodium_channel", "sodium_channel_m_gate");
    m.add_encapsulation_edge("sodium_channel", "sodium_channel_h_gate");
    m.add_encapsulation_edge("potassium_channel", "potassium_channel_n_gate");

    connect(&mut m, "environment", "time", "membrane", "time");
    connect(&mut m, "environment", "time", "sodium_channel", "time");
    connect(&mut m, "environment", "time", "potassium_channel", "time");
    connect(&mut m, "sodium_channel", "time", "sodium_channel_m_gate", "time");
    connect(&mut m, "sodium_channel", "time", "sodium_channel_h_gate", "time");
    connect(&mut m, "potassium_channel", "time", "potassium_channel_n_gate", "time");

    connect(&mut m, "membrane", "V", "leakage_current", "V");
    connect(&mut m, "membrane", "V", "sodium_channel", "V");
    connect(&mut m, "membrane", "V", "potassium_channel", "V");
    connect(&mut m, "sodium_channel", "V", "sodium_channel_m_gate", "V");
    connect(&mut m, "sodium_channel", "V", "sodium_channel_h_gate", "V");
    connect(&mut m, "potassium_channel", "V", "potassium_channel_n_gate", "V");

    connect(&mut m, "membrane", "E_R", "leakage_current", "E_R");
    connect(&mut m, "membrane", "E_R", "sodium_channel", "E_R");
    connect(&mut m, "membrane", "E_R", "potassium_channel", "E_R");

    connect(&mut m, "membrane", "i_Na", "sodium_channel", "i_Na");
    connect(&mut m, "membrane", "i_K", "potassium_channel", "i_K");
    connect(&mut m, "membrane", "i_L", "leakage_current", "i_L");

    connect(&mut m, "sodium_channel", "m", "sodium_channel_m_gate", "m");
    connect(&mut m, "sodium_channel", "h", "sodium_channel_h_gate", "h");
    connect(&mut m, "potassium_channel", "n", "potassium_channel_n_gate", "n");

    m
}

fn noble_units() -> Vec<Units> {
    let term = |reference: &str, prefix: Option<&str>, exponent: f64| {
        let mut unit = Unit::new(reference);
        unit.prefix = prefix.map(|p| p.to_string());
        unit.exponent = exponent;
        unit
    };
    let units = |name: &str, terms: Vec<Unit>| {
        let mut u = Units::new(name);
        u.units = terms;
        u
    };
    vec![
        units("millisecond", vec![term("second", Some("milli"), 1.0)]),
        units("per_millisecond", vec![term("second", Some("milli"), -1.0)]),
        units("millivolt", vec![term("volt", Some("milli"), 1.0)]),
        units("microS", vec![term("siemens", Some("micro"), 1.0)]),
        units("nanoA", vec![term("ampere", Some("nano"), 1.0)]),
        units("microF", vec![term("farad", Some("micro"), 1.0)]),
    ]
}

/// The Noble 1962 Purkinje fibre model: the same four states as
/// Hodgkin–Huxley (V, m, h, n) but a different current structure — a
/// voltage-dependent anomalous rectifier alongside the gated potassium
/// conductance, an inline background sodium conductance, and no
/// computed constants at all (17 variables: 5 constants, 12 algebraic).
pub fn noble_1962_model() -> Model {
    use InterfaceKind::{Public, PublicAndPrivate};
    let private = InterfaceKind::Private;

    let mut m = Model::new("noble_model_1962");
    m.units = noble_units();

    let shifted = |offset: &str| apply(MathOp::Plus, vec![ci("V"), cn(offset)]);
    // -V - offset
    let neg_shifted = |offset: &str| {
        apply(
            MathOp::Minus,
            vec![apply(MathOp::Minus, vec![ci("V")]), cn(offset)],
        )
    };
    let exp_of = |e: Expr| apply(MathOp::Exp, vec![e]);
    let gate_rate = |gate: &str, alpha: &str, beta: &str| {
        apply(
            MathOp::Minus,
            vec![
                apply(
                    MathOp::Times,
                    vec![ci(alpha), apply(MathOp::Minus, vec![cn("1"), ci(gate)])],
                ),
                apply(MathOp::Times, vec![ci(beta), ci(gate)]),
            ],
        )
    };

    let environment = component(
        "environment",
        vec![var_interface("time", "millisecond", Public)],
        vec![],
    );

    let membrane = component(
        "membrane",
        vec![
            var_init_interface("V", "millivolt", "-87", Public),
            var_init("Cm", "microF", "12"),
            var_interface("time", "millisecond", Public),
            var_interface("i_Na", "nanoA", Public),
            var_interface("i_K", "nanoA", Public),
            var_interface("i_Leak", "nanoA", Public),
        ],
        vec![eq(
            ode_lhs("time", "V"),
            apply(
                MathOp::Divide,
                vec![
                    apply(
                        MathOp::Minus,
                        vec![apply(
                            MathOp::Plus,
                            vec![ci("i_Na"), ci("i_K"), ci("i_Leak")],
                        )],
                    ),
                    ci("Cm"),
                ],
            ),
        )],
    );

    let sodium_channel = component(
        "sodium_channel",
        vec![
            var_interface("i_Na", "nanoA", Public),
            var_init("g_Na_max", "microS", "400000"),
            var("g_Na", "microS"),
            var_init("E_Na", "millivolt", "40"),
            var_interface("m", "dimensionless", private),
            var_interface("h", "dimensionless", private),
            var_interface("V", "millivolt", PublicAndPrivate),
            var_interface("time", "millisecond", PublicAndPrivate),
        ],
        vec![
            // g_Na = m^3*h*g_Na_max
            eq(
                ci("g_Na"),
                apply(
                    MathOp::Times,
                    vec![
                        apply(MathOp::Power, vec![ci("m"), cn("3")]),
                        ci("h"),
                        ci("g_Na_max"),
                    ],
                ),
            ),
            // i_Na = (g_Na + 140)*(V - E_Na)
            eq(
                ci("i_Na"),
                apply(
                    MathOp::Times,
                    vec![
                        apply(MathOp::Plus, vec![ci("g_Na"), cn("140")]),
                        apply(MathOp::Minus, vec![ci("V"), ci("E_Na")]),
                    ],
                ),
            ),
        ],
    );

    let m_gate = component(
        "sodium_channel_m_gate",
        vec![
            var_init_interface("m", "dimensionless", "0.01", Public),
            var("alpha_m", "per_millisecond"),
            var("beta_m", "per_millisecond"),
            var_interface("V", "millivolt", Public),
            var_interface("time", "millisecond", Public),
        ],
        vec![
            // alpha_m = 100*(-V-48)/(exp((-V-48)/15) - 1)
            eq(
                ci("alpha_m"),
                apply(
                    MathOp::Divide,
                    vec![
                        apply(MathOp::Times, vec![cn("100"), neg_shifted("48")]),
                        apply(
                            MathOp::Minus,
                            vec![
                                exp_of(apply(
                                    MathOp::Divide,
                                    vec![neg_shifted("48"), cn("15")],
                                )),
                                cn("1"),
                            ],
                        ),
                    ],
                ),
            ),
            // beta_m = 120*(V+8)/(exp((V+8)/5) - 1)
            eq(
                ci("beta_m"),
                apply(
                    MathOp::Divide,
                    vec![
                        apply(MathOp::Times, vec![cn("120"), shifted("8")]),
                        apply(
                            MathOp::Minus,
                            vec![
                                exp_of(apply(MathOp::Divide, vec![shifted("8"), cn("5")])),
                                cn("1"),
                            ],
                        ),
                    ],
                ),
            ),
            eq(ode_lhs("time", "m"), gate_rate("m", "alpha_m", "beta_m")),
        ],
    );

    let h_gate = component(
        "sodium_channel_h_gate",
        vec![
            var_init_interface("h", "dimensionless", "0.8", Public),
            var("alpha_h", "per_millisecond"),
            var("beta_h", "per_millisecond"),
            var_interface("V", "millivolt", Public),
            var_interface("time", "millisecond", Public),
        ],
        vec![
            // alpha_h = 170*exp((-V-90)/20)
            eq(
                ci("alpha_h"),
                apply(
                    MathOp::Times,
                    vec![
                        cn("170"),
                        exp_of(apply(MathOp::Divide, vec![neg_shifted("90"), cn("20")])),
                    ],
                ),
            ),
            // beta_h = 1000/(1 + exp((-V-42)/10))
            eq(
                ci("beta_h"),
                apply(
                    MathOp::Divide,
                    vec![
                        cn("1000"),
                        apply(
                            MathOp::Plus,
                            vec![
                                cn("1"),
                                exp_of(apply(
                                    MathOp::Divide,
                                    vec![neg_shifted("42"), cn("10")],
                                )),
                            ],
                        ),
                    ],
                ),
            ),
            eq(ode_lhs("time", "h"), gate_rate("h", "alpha_h", "beta_h")),
        ],
    );

    let potassium_channel = component(
        "potassium_channel",
        vec![
            var_interface("i_K", "nanoA", Public),
            var("g_K1", "microS"),
            var("g_K2", "microS"),
            var_interface("n", "dimensionless", private),
            var_interface("V", "millivolt", PublicAndPrivate),
            var_interface("time", "millisecond", PublicAndPrivate),
        ],
        vec![
            // the anomalous rectifier: g_K1 = 1200*exp((-V-90)/50) + 15*exp((V+90)/60)
            eq(
                ci("g_K1"),
                apply(
                    MathOp::Plus,
                    vec![
                        apply(
                            MathOp::Times,
                            vec![
                                cn("1200"),
                                exp_of(apply(
                                    MathOp::Divide,
                                    vec![neg_shifted("90"), cn("50")],
                                )),
                            ],
                        ),
                        apply(
                            MathOp::Times,
                            vec![
                                cn("15"),
                                exp_of(apply(MathOp::Divide, vec![shifted("90"), cn("60")])),
                            ],
                        ),
                    ],
                ),
            ),
            // g_K2 = 1200*n^4
            eq(
                ci("g_K2"),
                apply(
                    MathOp::Times,
                    vec![cn("1200"), apply(MathOp::Power, vec![ci("n"), cn("4")])],
                ),
            ),
            // i_K = (g_K1 + g_K2)*(V + 100)
            eq(
                ci("i_K"),
                apply(
                    MathOp::Times,
                    vec![
                        apply(MathOp::Plus, vec![ci("g_K1"), ci("g_K2")]),
                        shifted("100"),
                    ],
                ),
            ),
        ],
    );

    let n_gate = component(
        "potassium_channel_n_gate",
        vec![
            var_init_interface("n", "dimensionless", "0.01", Public),
            var("alpha_n", "per_millisecond"),
            var("beta_n", "per_millisecond"),
            var_interface("V", "millivolt", Public),
            var_interface("time", "millisecond", Public),
        ],
        vec![
            // alpha_n = 0.1*(-V-50)/(exp((-V-50)/10) - 1)
            eq(
                ci("alpha_n"),
                apply(
                    MathOp::Divide,
                    vec![
                        apply(MathOp::Times, vec![cn("0.1"), neg_shifted("50")]),
                        apply(
                            MathOp::Minus,
                            vec![
                                exp_of(apply(
                                    MathOp::Divide,
                                    vec![neg_shifted("50"), cn("10")],
                                )),
                                cn("1"),
                            ],
                        ),
                    ],
                ),
            ),
            // beta_n = 2*exp((-V-90)/80)
            eq(
                ci("beta_n"),
                apply(
                    MathOp::Times,
                    vec![
                        cn("2"),
                        exp_of(apply(MathOp::Divide, vec![neg_shifted("90"), cn("80")])),
                    ],
                ),
            ),
            eq(ode_lhs("time", "n"), gate_rate("n", "alpha_n", "beta_n")),
        ],
    );

    let leakage = component(
        "leakage_current",
        vec![
            var_interface("i_Leak", "nanoA", Public),
            var_init("g_L", "microS", "75"),
            var_init("E_L", "millivolt", "-60"),
            var_interface("V", "millivolt", Public),
        ],
        vec![eq(
            ci("i_Leak"),
            apply(
                MathOp::Times,
                vec![ci("g_L"), apply(MathOp::Minus, vec![ci("V"), ci("E_L")])],
            ),
        )],
    );

    m.components = vec![
        environment,
        membrane,
        sodium_channel,
        m_gate,
        h_gate,
        potassium_channel,
        n_gate,
        leakage,
    ];

    m.add_encapsulation_edge("sodium_channel", "sodium_channel_m_gate");
    m.add_encapsulation_edge("sodium_channel", "sodium_channel_h_gate");
    m.add_encapsulation_edge("potassium_channel", "potassium_channel_n_gate");

    connect(&mut m, "environment", "time", "membrane", "time");
    connect(&mut m, "environment", "time", "sodium_channel", "time");
    connect(&mut m, "environment", "time", "potassium_channel", "time");
    connect(&mut m, "sodium_channel", "time", "sodium_channel_m_gate", "time");
    connect(&mut m, "sodium_channel", "time", "sodium_channel_h_gate", "time");
    connect(&mut m, "potassium_channel", "time", "potassium_channel_n_gate", "time");

    connect(&mut m, "membrane", "V", "sodium_channel", "V");
    connect(&mut m, "membrane", "V", "potassium_channel", "V");
    connect(&mut m, "membrane", "V", "leakage_current", "V");
    connect(&mut m, "sodium_channel", "V", "sodium_channel_m_gate", "V");
    connect(&mut m, "sodium_channel", "V", "sodium_channel_h_gate", "V");
    connect(&mut m, "potassium_channel", "V", "potassium_channel_n_gate", "V");

    connect(&mut m, "membrane", "i_Na", "sodium_channel", "i_Na");
    connect(&mut m, "membrane", "i_K", "potassium_channel", "i_K");
    connect(&mut m, "membrane", "i_Leak", "leakage_current", "i_Leak");

    connect(&mut m, "sodium_channel", "m", "sodium_channel_m_gate", "m");
    connect(&mut m, "sodium_channel", "h", "sodium_channel_h_gate", "h");
    connect(&mut m, "potassium_channel", "n", "potassium_channel_n_gate", "n");

    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{ModelType, VariableRole};
    use crate::generator::Generator;
    use crate::profile::{Profile, ProfileKind};

    #[test]
    fn test_hodgkin_huxley_analysis() {
        let model = hodgkin_huxley_model();
        let (system, issues) = analyze_model(&model);
        assert!(issues.is_empty(), "{:?}", issues);
        assert_eq!(ModelType::Ode, system.model_type);
        assert_eq!(4, system.states.len());
        assert_eq!(18, system.variables.len());

        let voi = system.voi.as_ref().unwrap();
        assert_eq!("time", voi.name);
        assert_eq!("environment", voi.component);
        assert_eq!("millisecond", voi.units);

        let state_names: Vec<&str> = system.states.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(vec!["V", "m", "h", "n"], state_names);

        let count = |role: VariableRole| {
            system
                .variables
                .iter()
                .filter(|v| v.role == role)
                .count()
        };
        assert_eq!(5, count(VariableRole::Constant));
        assert_eq!(3, count(VariableRole::ComputedConstant));
        assert_eq!(10, count(VariableRole::Algebraic));

        // constants come first, in source order
        let constant_names: Vec<&str> = system.variables[..5]
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(vec!["Cm", "E_R", "g_L", "g_Na", "g_K"], constant_names);

        // nine initial values: four states and five constants
        assert_eq!(9, system.initialisations.len());
        assert_eq!(3, system.computed_constants.len());
        assert_eq!(10, system.algebraic.len());
        // every algebraic equation feeds a rate in this model
        assert_eq!(10, system.rate_support.len());
        assert_eq!(4, system.rates.len());
    }

    #[test]
    fn test_hodgkin_huxley_emission() {
        let model = hodgkin_huxley_model();
        let mut generator = Generator::with_profile(Profile::new(ProfileKind::Python));
        generator.process_model(&model);
        assert_eq!(0, generator.error_count());
        assert_eq!(4, generator.state_count());
        assert_eq!(18, generator.variable_count());

        let code = generator.code();
        assert!(code.starts_with(
            "# The content of this file was generated using the Python profile of"
        ));
        assert!(code.contains("STATE_COUNT = 4"));
        assert!(code.contains("VARIABLE_COUNT = 18"));
        // membrane equation: rates[0] = -(-variables[8]+variables[10]+variables[15]+variables[9])/variables[0]
        assert!(code.contains("rates[0] = "));
        // the stimulus piecewise lowers to a conditional expression
        assert!(code.contains(" if voi >= 10.0 and voi <= 10.5 else "));
        // gate kinetics use pow via the profile
        assert!(code.contains("pow(states[1], 3.0)"));

        let mut generator_c = Generator::with_profile(Profile::new(ProfileKind::C));
        generator_c.process_model(&model);
        let c_code = generator_c.code();
        assert!(c_code.contains("const size_t STATE_COUNT = 4;"));
        assert!(c_code.contains("const size_t VARIABLE_COUNT = 18;"));
        assert!(c_code.contains(")?-20.0:0.0;"));

        // emission is deterministic across repeated calls
        assert_eq!(code, generator.code());
        assert_eq!(c_code, generator_c.code());
    }

    #[test]
    fn test_noble_1962_analysis() {
        let model = noble_1962_model();
        let (system, issues) = analyze_model(&model);
        assert!(issues.is_empty(), "{:?}", issues);
        assert_eq!(ModelType::Ode, system.model_type);
        assert_eq!(4, system.states.len());
        assert_eq!(17, system.variables.len());

        let voi = system.voi.as_ref().unwrap();
        assert_eq!("time", voi.name);
        assert_eq!("environment", voi.component);

        let state_names: Vec<&str> = system.states.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(vec!["V", "m", "h", "n"], state_names);

        let count = |role: VariableRole| {
            system
                .variables
                .iter()
                .filter(|v| v.role == role)
                .count()
        };
        assert_eq!(5, count(VariableRole::Constant));
        // unlike Hodgkin-Huxley, every reversal/conductance parameter is
        // a plain constant, so nothing is hoisted
        assert_eq!(0, count(VariableRole::ComputedConstant));
        assert_eq!(12, count(VariableRole::Algebraic));

        let constant_names: Vec<&str> = system.variables[..5]
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(
            vec!["Cm", "g_Na_max", "E_Na", "g_L", "E_L"],
            constant_names
        );

        assert_eq!(9, system.initialisations.len());
        assert!(system.computed_constants.is_empty());
        assert_eq!(12, system.algebraic.len());
        assert_eq!(12, system.rate_support.len());
        assert_eq!(4, system.rates.len());
    }

    #[test]
    fn test_noble_1962_emission() {
        let model = noble_1962_model();
        let mut generator = Generator::with_profile(Profile::new(ProfileKind::Python));
        generator.process_model(&model);
        assert_eq!(0, generator.error_count());
        assert_eq!(4, generator.state_count());
        assert_eq!(17, generator.variable_count());

        let code = generator.code();
        assert!(code.contains("STATE_COUNT = 4"));
        assert!(code.contains("VARIABLE_COUNT = 17"));
        assert!(code.contains("pow(states[1], 3.0)"));
        assert!(code.contains("pow(states[3], 4.0)"));

        let mut generator_c = Generator::with_profile(Profile::new(ProfileKind::C));
        generator_c.process_model(&model);
        let c_code = generator_c.code();
        assert!(c_code.contains("const size_t STATE_COUNT = 4;"));
        assert!(c_code.contains("const size_t VARIABLE_COUNT = 17;"));

        assert_eq!(code, generator.code());
        assert_eq!(c_code, generator_c.code());
    }

    #[test]
    fn test_hodgkin_huxley_query_surface() {
        let model = hodgkin_huxley_model();
        let mut generator = Generator::new();
        generator.process_model(&model);
        assert_eq!(ModelType::Ode, generator.model_type());
        assert!(generator.state(0).is_some());
        assert!(generator.state(4).is_none());
        assert!(generator.variable(17).is_some());
        assert!(generator.variable(18).is_none());
        assert_eq!("V", generator.state(0).unwrap().name);
        assert_eq!(VariableRole::State, generator.state(0).unwrap().role);
    }
}
