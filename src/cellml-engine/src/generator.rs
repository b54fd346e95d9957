// Copyright 2026 The CellML Engine Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Code emission: turns an analyzed system into profile-parameterized
//! source text, and hosts the driver object tying the whole pipeline
//! together.

use float_cmp::approx_eq;

use crate::analyzer::{
    analyze, AnalyzedSystem, AnalyzedVariable, LoweredExpr, ModelType, Statement, Target,
    VariableRole,
};
use crate::ast::MathOp;
use crate::common::Issue;
use crate::datamodel::Model;
use crate::model::classify_equations;
use crate::profile::{Profile, ProfileKind};
use crate::units;
use crate::variable::{Registry, Resolver};

/// The analyzer/generator driver.  `process_model` runs the analysis
/// pipeline once; `code` and `set_profile` then re-emit in O(1) over the
/// cached system.
#[derive(Clone, Debug, Default)]
pub struct Generator {
    profile: Profile,
    issues: Vec<Issue>,
    system: Option<AnalyzedSystem>,
}

impl Generator {
    pub fn new() -> Generator {
        Generator::with_profile(Profile::new(ProfileKind::C))
    }

    pub fn with_profile(profile: Profile) -> Generator {
        Generator {
            profile,
            issues: Vec::new(),
            system: None,
        }
    }

    /// Run the full analysis pipeline over `model`.  Any previously
    /// cached analysis is replaced.
    pub fn process_model(&mut self, model: &Model) {
        let mut issues = Vec::new();
        let registry = Registry::new(model);
        let units_ctx = units::Context::new(model, &mut issues);
        let resolver = Resolver::new(model, &registry, &units_ctx, &mut issues);
        let equations = classify_equations(model, &registry, &mut issues);
        let system = analyze(model, &registry, &resolver, &equations, &mut issues);
        self.issues = issues;
        self.system = Some(system);
    }

    pub fn model_type(&self) -> ModelType {
        self.system
            .as_ref()
            .map(|s| s.model_type)
            .unwrap_or(ModelType::Unknown)
    }

    pub fn state_count(&self) -> usize {
        self.system.as_ref().map(|s| s.states.len()).unwrap_or(0)
    }

    pub fn variable_count(&self) -> usize {
        self.system.as_ref().map(|s| s.variables.len()).unwrap_or(0)
    }

    pub fn variable_of_integration(&self) -> Option<&AnalyzedVariable> {
        self.system.as_ref().and_then(|s| s.voi.as_ref())
    }

    pub fn state(&self, i: usize) -> Option<&AnalyzedVariable> {
        self.system.as_ref().and_then(|s| s.states.get(i))
    }

    pub fn variable(&self, i: usize) -> Option<&AnalyzedVariable> {
        self.system.as_ref().and_then(|s| s.variables.get(i))
    }

    pub fn error(&self, i: usize) -> Option<&Issue> {
        self.issues.get(i)
    }

    pub fn error_count(&self) -> usize {
        self.issues.len()
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Swap the emission profile.  The cached analysis is kept; only
    /// emission is affected.
    pub fn set_profile(&mut self, profile: Profile) {
        self.profile = profile;
    }

    /// Emit source code for the processed model, or an empty string when
    /// the model cannot be emitted.
    pub fn code(&self) -> String {
        let system = match &self.system {
            Some(system) if system.model_type.is_executable() => system,
            _ => return String::new(),
        };
        Emitter {
            profile: &self.profile,
            system,
        }
        .emit()
    }
}

struct Emitter<'a> {
    profile: &'a Profile,
    system: &'a AnalyzedSystem,
}

// precedence ranks carried up the emission recursion; higher binds
// tighter (the conditional expression is 0, atoms and calls are ATOM)
const PREC_CONDITIONAL: u8 = 0;
const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_NOT: u8 = 3;
const PREC_CMP: u8 = 4;
const PREC_ADD: u8 = 5;
const PREC_MUL: u8 = 6;
const PREC_UNARY_MINUS: u8 = 7;
const PREC_POWER: u8 = 8;
const ATOM: u8 = 9;

impl Emitter<'_> {
    fn emit(&self) -> String {
        let p = self.profile;
        let system = self.system;

        let mut out = String::new();
        out.push_str(&self.stamp(&p.header_string));
        out.push_str(&p.includes_string);
        out.push_str(&self.stamp(&p.version_constant_string));
        out.push_str(&p.state_count_string.replace("[COUNT]", &system.states.len().to_string()));
        out.push_str(
            &p.variable_count_string
                .replace("[COUNT]", &system.variables.len().to_string()),
        );
        out.push_str(&p.variable_info_type_string);

        out.push_str(&p.voi_info_string.replace("[ENTRY]", &self.voi_entry()));
        out.push_str(
            &p.state_info_string
                .replace("[ENTRIES]", &self.info_entries(&system.states)),
        );
        out.push_str(
            &p.variable_info_string
                .replace("[ENTRIES]", &self.info_entries(&system.variables)),
        );

        out.push_str(
            &p.create_states_array_string
                .replace("[COUNT]", &system.states.len().to_string()),
        );
        out.push_str(
            &p.create_variables_array_string
                .replace("[COUNT]", &system.variables.len().to_string()),
        );
        out.push_str(&p.delete_array_string);

        out.push_str(
            &p.initialize_constants_string
                .replace("[CODE]", &self.body(&system.initialisations)),
        );
        out.push_str(
            &p.compute_computed_constants_string
                .replace("[CODE]", &self.body(&system.computed_constants)),
        );
        let rate_statements: Vec<Statement> = system
            .rate_support
            .iter()
            .chain(system.rates.iter())
            .cloned()
            .collect();
        out.push_str(
            &p.compute_rates_string
                .replace("[CODE]", &self.body(&rate_statements)),
        );
        out.push_str(
            &p.compute_variables_string
                .replace("[CODE]", &self.body(&system.algebraic)),
        );

        out
    }

    fn stamp(&self, template: &str) -> String {
        template
            .replace("[NAME]", &self.profile.name)
            .replace("[VERSION]", &self.profile.version)
    }

    fn voi_entry(&self) -> String {
        match &self.system.voi {
            Some(voi) => self.info_entry(voi),
            None => self
                .profile
                .variable_info_entry_string
                .replace("[NAME]", "")
                .replace("[UNITS]", "")
                .replace("[COMPONENT]", "")
                .replace("[TYPE]", role_tag(VariableRole::VariableOfIntegration)),
        }
    }

    fn info_entry(&self, variable: &AnalyzedVariable) -> String {
        self.profile
            .variable_info_entry_string
            .replace("[NAME]", &variable.name)
            .replace("[UNITS]", &variable.units)
            .replace("[COMPONENT]", &variable.component)
            .replace("[TYPE]", role_tag(variable.role))
    }

    fn info_entries(&self, variables: &[AnalyzedVariable]) -> String {
        if variables.is_empty() {
            return String::new();
        }
        let entries: Vec<String> = variables
            .iter()
            .map(|v| format!("    {}", self.info_entry(v)))
            .collect();
        format!("{}\n", entries.join(",\n"))
    }

    fn body(&self, statements: &[Statement]) -> String {
        if statements.is_empty() {
            return self.profile.empty_body_string.clone();
        }
        statements
            .iter()
            .map(|statement| {
                let code = format!(
                    "{}{}{}",
                    self.slot(statement.target),
                    self.profile.eq_string,
                    self.expr(&statement.rhs).0
                );
                self.profile.statement_string.replace("[CODE]", &code)
            })
            .collect()
    }

    fn slot(&self, target: Target) -> String {
        let p = self.profile;
        let indexed = |array: &str, index: usize| {
            format!(
                "{}{}{}{}",
                array, p.open_array_string, index, p.close_array_string
            )
        };
        match target {
            Target::Voi => p.voi_string.clone(),
            Target::State(i) => indexed(&p.states_array_string, i),
            Target::Rate(i) => indexed(&p.rates_array_string, i),
            Target::Variable(i) => indexed(&p.variables_array_string, i),
        }
    }

    fn call(&self, name: &str, args: &[String]) -> (String, u8) {
        (format!("{}({})", name, args.join(", ")), ATOM)
    }

    fn fn_call(&self, name: &str, args: &[LoweredExpr]) -> (String, u8) {
        let args: Vec<String> = args.iter().map(|a| self.expr(a).0).collect();
        self.call(name, &args)
    }

    /// Fold nested binary calls for the n-ary min/max operators.
    fn nested_call(&self, name: &str, args: &[LoweredExpr]) -> (String, u8) {
        match args {
            [] => self.call(name, &[]),
            [only] => self.call(name, &[self.expr(only).0]),
            [first, rest @ ..] => {
                let rest = if rest.len() == 1 {
                    self.expr(&rest[0]).0
                } else {
                    self.nested_call(name, rest).0
                };
                self.call(name, &[self.expr(first).0, rest])
            }
        }
    }

    fn nary(&self, op: &str, prec: u8, args: &[LoweredExpr]) -> (String, u8) {
        let parts: Vec<String> = args
            .iter()
            .map(|arg| {
                let (text, child_prec) = self.expr(arg);
                paren_if(text, child_prec < prec)
            })
            .collect();
        (parts.join(op), prec)
    }

    /// Left-associative binary operator with a non-associative right
    /// operand (`-`, `/`): the right side is parenthesized on equal
    /// precedence as well.
    fn non_assoc(&self, op: &str, prec: u8, args: &[LoweredExpr]) -> (String, u8) {
        let mut parts: Vec<String> = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let (text, child_prec) = self.expr(arg);
            let needs = if i == 0 {
                child_prec < prec
            } else {
                child_prec <= prec
            };
            parts.push(paren_if(text, needs));
        }
        (parts.join(op), prec)
    }

    /// Comparison operators: both operands parenthesized on equal
    /// precedence so no target language chains them.
    fn comparison(&self, op: &str, args: &[LoweredExpr]) -> (String, u8) {
        let parts: Vec<String> = args
            .iter()
            .map(|arg| {
                let (text, child_prec) = self.expr(arg);
                paren_if(text, child_prec <= PREC_CMP)
            })
            .collect();
        (parts.join(op), PREC_CMP)
    }

    fn power(&self, args: &[LoweredExpr]) -> (String, u8) {
        let p = self.profile;
        let (base, exponent) = match args {
            [base, exponent] => (base, exponent),
            _ => return self.fn_call(&p.power_string, args),
        };
        if !p.has_power_operator {
            if let Some(square) = &p.square_string {
                if matches!(exponent, LoweredExpr::Const(v) if approx_eq!(f64, *v, 2.0)) {
                    return self.call(square, &[self.expr(base).0]);
                }
            }
            return self.call(&p.power_string, &[self.expr(base).0, self.expr(exponent).0]);
        }
        let (base_text, base_prec) = self.expr(base);
        let (exponent_text, exponent_prec) = self.expr(exponent);
        (
            format!(
                "{}{}{}",
                paren_if(base_text, base_prec <= PREC_POWER),
                p.power_string,
                paren_if(exponent_text, exponent_prec <= PREC_POWER)
            ),
            PREC_POWER,
        )
    }

    fn root(&self, args: &[LoweredExpr]) -> (String, u8) {
        let p = self.profile;
        match args {
            [x] => self.call(&p.sqrt_string, &[self.expr(x).0]),
            [LoweredExpr::Apply(MathOp::Degree, degree), x] => {
                let degree_value = degree.first().and_then(fold_lowered);
                match degree_value {
                    Some(n) if approx_eq!(f64, n, 2.0) => self.call(&p.sqrt_string, &[self.expr(x).0]),
                    Some(n) => self.call(
                        &p.power_string,
                        &[
                            self.expr(x).0,
                            format!("1.0{}{}", p.divide_string, fmt_double(n)),
                        ],
                    ),
                    None => {
                        let degree_text = degree
                            .first()
                            .map(|d| {
                                let (text, prec) = self.expr(d);
                                paren_if(text, prec <= PREC_MUL)
                            })
                            .unwrap_or_default();
                        self.call(
                            &p.power_string,
                            &[
                                self.expr(x).0,
                                format!("1.0{}{}", p.divide_string, degree_text),
                            ],
                        )
                    }
                }
            }
            _ => self.fn_call(&p.sqrt_string, args),
        }
    }

    fn xor(&self, args: &[LoweredExpr]) -> (String, u8) {
        let p = self.profile;
        let (a, b) = match args {
            [a, b] => (a, b),
            _ => return self.fn_call(&p.xor_string, args),
        };
        if p.has_xor_operator {
            let (a_text, a_prec) = self.expr(a);
            let (b_text, b_prec) = self.expr(b);
            return (
                format!(
                    "{}{}{}",
                    paren_if(a_text, a_prec <= PREC_OR),
                    p.xor_string,
                    paren_if(b_text, b_prec <= PREC_OR)
                ),
                PREC_OR,
            );
        }
        if !p.xor_function_string.is_empty() {
            return self.call(&p.xor_function_string, &[self.expr(a).0, self.expr(b).0]);
        }
        // no operator and no function: truth-test both sides and compare
        let truth = |side: &LoweredExpr| {
            self.comparison(
                &p.neq_string,
                &[side.clone(), LoweredExpr::Const(0.0)],
            )
            .0
        };
        (
            format!("({}){}({})", truth(a), p.neq_string, truth(b)),
            PREC_CMP,
        )
    }

    fn piecewise(&self, args: &[LoweredExpr]) -> (String, u8) {
        let p = self.profile;
        let mut otherwise = p.nan_string.clone();
        for arg in args.iter() {
            if let LoweredExpr::Apply(MathOp::Otherwise, children) = arg {
                if let Some(value) = children.first() {
                    otherwise = self.expr(value).0;
                }
            }
        }
        let mut result = otherwise;
        for arg in args.iter().rev() {
            if let LoweredExpr::Apply(MathOp::Piece, children) = arg {
                if let [value, condition] = children.as_slice() {
                    result = p
                        .piecewise_if_string
                        .replace("[CONDITION]", &self.expr(condition).0)
                        .replace("[IF_STATEMENT]", &self.expr(value).0)
                        .replace("[ELSE_STATEMENT]", &result);
                }
            }
        }
        (result, PREC_CONDITIONAL)
    }

    fn expr(&self, e: &LoweredExpr) -> (String, u8) {
        let p = self.profile;
        match e {
            LoweredExpr::Slot(target) => (self.slot(*target), ATOM),
            LoweredExpr::Const(v) => {
                let text = fmt_double(*v);
                let prec = if *v < 0.0 { PREC_UNARY_MINUS } else { ATOM };
                (text, prec)
            }
            LoweredExpr::True => (p.true_string.clone(), ATOM),
            LoweredExpr::False => (p.false_string.clone(), ATOM),
            LoweredExpr::Pi => (p.pi_string.clone(), ATOM),
            LoweredExpr::E => (p.e_string.clone(), ATOM),
            LoweredExpr::Inf => (p.inf_string.clone(), ATOM),
            LoweredExpr::Nan => (p.nan_string.clone(), ATOM),
            LoweredExpr::Apply(op, args) => match op {
                MathOp::Eq | MathOp::EqEq => self.comparison(&p.eqeq_string, args),
                MathOp::Neq => self.comparison(&p.neq_string, args),
                MathOp::Lt => self.comparison(&p.lt_string, args),
                MathOp::Leq => self.comparison(&p.leq_string, args),
                MathOp::Gt => self.comparison(&p.gt_string, args),
                MathOp::Geq => self.comparison(&p.geq_string, args),
                MathOp::And => self.nary(&p.and_string, PREC_AND, args),
                MathOp::Or => self.nary(&p.or_string, PREC_OR, args),
                MathOp::Not => {
                    let operand = args
                        .first()
                        .map(|arg| {
                            let (text, prec) = self.expr(arg);
                            paren_if(text, prec < ATOM)
                        })
                        .unwrap_or_default();
                    (format!("{}{}", p.not_string, operand), PREC_NOT)
                }
                MathOp::Xor => self.xor(args),
                MathOp::Plus => match &args[..] {
                    [only] => self.expr(only),
                    _ => self.nary(&p.plus_string, PREC_ADD, args),
                },
                MathOp::Minus => match &args[..] {
                    [only] => {
                        let (text, prec) = self.expr(only);
                        (
                            format!(
                                "{}{}",
                                p.minus_string,
                                paren_if(text, prec < PREC_UNARY_MINUS)
                            ),
                            PREC_UNARY_MINUS,
                        )
                    }
                    _ => self.non_assoc(&p.minus_string, PREC_ADD, args),
                },
                MathOp::Times => self.nary(&p.times_string, PREC_MUL, args),
                MathOp::Divide => self.non_assoc(&p.divide_string, PREC_MUL, args),
                MathOp::Power => self.power(args),
                MathOp::Root => self.root(args),
                MathOp::Abs => self.fn_call(&p.abs_string, args),
                MathOp::Exp => self.fn_call(&p.exp_string, args),
                MathOp::Ln => self.fn_call(&p.ln_string, args),
                MathOp::Log => match &args[..] {
                    [LoweredExpr::Apply(MathOp::Logbase, base), x] => {
                        let x_text = self.call(&p.ln_string, &[self.expr(x).0]).0;
                        let base_text = base
                            .first()
                            .map(|b| self.call(&p.ln_string, &[self.expr(b).0]).0)
                            .unwrap_or_default();
                        (
                            format!("{}{}{}", x_text, p.divide_string, base_text),
                            PREC_MUL,
                        )
                    }
                    _ => self.fn_call(&p.log_string, args),
                },
                MathOp::Floor => self.fn_call(&p.floor_string, args),
                MathOp::Ceiling => self.fn_call(&p.ceiling_string, args),
                MathOp::Min => self.nested_call(&p.min_string, args),
                MathOp::Max => self.nested_call(&p.max_string, args),
                MathOp::Rem => self.fn_call(&p.rem_string, args),
                MathOp::Factorial => self.fn_call(&p.factorial_string, args),
                MathOp::Sin => self.fn_call(&p.sin_string, args),
                MathOp::Cos => self.fn_call(&p.cos_string, args),
                MathOp::Tan => self.fn_call(&p.tan_string, args),
                MathOp::Sec => self.fn_call(&p.sec_string, args),
                MathOp::Csc => self.fn_call(&p.csc_string, args),
                MathOp::Cot => self.fn_call(&p.cot_string, args),
                MathOp::Sinh => self.fn_call(&p.sinh_string, args),
                MathOp::Cosh => self.fn_call(&p.cosh_string, args),
                MathOp::Tanh => self.fn_call(&p.tanh_string, args),
                MathOp::Sech => self.fn_call(&p.sech_string, args),
                MathOp::Csch => self.fn_call(&p.csch_string, args),
                MathOp::Coth => self.fn_call(&p.coth_string, args),
                MathOp::Asin => self.fn_call(&p.asin_string, args),
                MathOp::Acos => self.fn_call(&p.acos_string, args),
                MathOp::Atan => self.fn_call(&p.atan_string, args),
                MathOp::Asec => self.fn_call(&p.asec_string, args),
                MathOp::Acsc => self.fn_call(&p.acsc_string, args),
                MathOp::Acot => self.fn_call(&p.acot_string, args),
                MathOp::Asinh => self.fn_call(&p.asinh_string, args),
                MathOp::Acosh => self.fn_call(&p.acosh_string, args),
                MathOp::Atanh => self.fn_call(&p.atanh_string, args),
                MathOp::Asech => self.fn_call(&p.asech_string, args),
                MathOp::Acsch => self.fn_call(&p.acsch_string, args),
                MathOp::Acoth => self.fn_call(&p.acoth_string, args),
                MathOp::Piecewise => self.piecewise(args),
                // structural operators only appear beneath the nodes
                // handled above
                MathOp::Diff
                | MathOp::Bvar
                | MathOp::Degree
                | MathOp::Logbase
                | MathOp::Piece
                | MathOp::Otherwise => (String::new(), ATOM),
            },
        }
    }
}

fn role_tag(role: VariableRole) -> &'static str {
    match role {
        VariableRole::VariableOfIntegration => "VARIABLE_OF_INTEGRATION",
        VariableRole::State => "STATE",
        VariableRole::Constant => "CONSTANT",
        VariableRole::ComputedConstant => "COMPUTED_CONSTANT",
        VariableRole::Algebraic => "ALGEBRAIC",
        VariableRole::External => "EXTERNAL",
    }
}

fn paren_if(text: String, needed: bool) -> String {
    if needed {
        format!("({})", text)
    } else {
        text
    }
}

fn fold_lowered(e: &LoweredExpr) -> Option<f64> {
    match e {
        LoweredExpr::Const(v) => Some(*v),
        _ => None,
    }
}

/// Format a double the way the generated code spells literals: whole
/// values keep a trailing `.0`, magnitudes below 1e-4 or at least 1e17
/// switch to exponential form (`1.0e-05`), everything else prints
/// shortest round-trip.
fn fmt_double(v: f64) -> String {
    if !v.is_finite() {
        return format!("{}", v);
    }
    if v == v.trunc() && v.abs() < 1e17 {
        return format!("{:.1}", v);
    }
    let magnitude = v.abs();
    if magnitude >= 1e17 || magnitude < 1e-4 {
        let shortest = format!("{:e}", v);
        let (mantissa, exponent) = match shortest.split_once('e') {
            Some(parts) => parts,
            None => return shortest,
        };
        let mantissa = if mantissa.contains('.') {
            mantissa.to_string()
        } else {
            format!("{}.0", mantissa)
        };
        let exponent: i32 = exponent.parse().unwrap_or(0);
        if exponent < 0 {
            format!("{}e-{:02}", mantissa, -exponent)
        } else {
            format!("{}e+{:02}", mantissa, exponent)
        }
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
pub(crate) fn expression_code(profile: &Profile, expr: &LoweredExpr) -> String {
    let system = AnalyzedSystem {
        model_type: ModelType::Algebraic,
        voi: None,
        states: Vec::new(),
        variables: Vec::new(),
        initialisations: Vec::new(),
        computed_constants: Vec::new(),
        rate_support: Vec::new(),
        rates: Vec::new(),
        algebraic: Vec::new(),
    };
    Emitter {
        profile,
        system: &system,
    }
    .expr(expr)
    .0
}
