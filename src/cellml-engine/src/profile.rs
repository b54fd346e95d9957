// Copyright 2026 The CellML Engine Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Generator profiles: plain value records of operator spellings,
//! function names, skeleton templates and capability flags.  The two
//! built-in profiles target C and Python; a caller may mutate a fresh
//! profile before handing it to the generator.
//!
//! Templates carry `[BRACKETED]` placeholders that the generator
//! substitutes at emission time.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProfileKind {
    C,
    Python,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    // identity stamped into generated headers
    pub name: String,
    pub version: String,

    // capability flags
    pub has_conditional_operator: bool,
    pub has_power_operator: bool,
    pub has_xor_operator: bool,

    // operators
    pub eq_string: String,
    pub eqeq_string: String,
    pub neq_string: String,
    pub lt_string: String,
    pub leq_string: String,
    pub gt_string: String,
    pub geq_string: String,
    pub and_string: String,
    pub or_string: String,
    pub not_string: String,
    /// infix spelling, used when `has_xor_operator`
    pub xor_string: String,
    /// function spelling; when empty (and no xor operator) the generator
    /// expands xor structurally from `!=`
    pub xor_function_string: String,
    pub plus_string: String,
    pub minus_string: String,
    pub times_string: String,
    pub divide_string: String,
    /// infix operator when `has_power_operator`, function name otherwise
    pub power_string: String,
    /// spelling for `power(x, 2)` when the target has no power operator
    pub square_string: Option<String>,
    pub sqrt_string: String,

    // functions
    pub abs_string: String,
    pub exp_string: String,
    pub ln_string: String,
    pub log_string: String,
    pub floor_string: String,
    pub ceiling_string: String,
    pub min_string: String,
    pub max_string: String,
    pub rem_string: String,
    pub factorial_string: String,
    pub sin_string: String,
    pub cos_string: String,
    pub tan_string: String,
    pub sec_string: String,
    pub csc_string: String,
    pub cot_string: String,
    pub sinh_string: String,
    pub cosh_string: String,
    pub tanh_string: String,
    pub sech_string: String,
    pub csch_string: String,
    pub coth_string: String,
    pub asin_string: String,
    pub acos_string: String,
    pub atan_string: String,
    pub asec_string: String,
    pub acsc_string: String,
    pub acot_string: String,
    pub asinh_string: String,
    pub acosh_string: String,
    pub atanh_string: String,
    pub asech_string: String,
    pub acsch_string: String,
    pub acoth_string: String,

    // constants
    pub true_string: String,
    pub false_string: String,
    pub pi_string: String,
    pub e_string: String,
    pub inf_string: String,
    pub nan_string: String,

    // value references
    pub voi_string: String,
    pub states_array_string: String,
    pub rates_array_string: String,
    pub variables_array_string: String,
    pub open_array_string: String,
    pub close_array_string: String,

    // statements
    /// one generated statement; placeholder: [CODE]
    pub statement_string: String,
    /// body of a function with nothing to compute
    pub empty_body_string: String,
    /// conditional expression; placeholders: [CONDITION], [IF_STATEMENT],
    /// [ELSE_STATEMENT]
    pub piecewise_if_string: String,

    // code skeleton; placeholders: [NAME], [VERSION], [COUNT], [ENTRY],
    // [ENTRIES], [CODE]
    pub header_string: String,
    pub includes_string: String,
    pub version_constant_string: String,
    pub state_count_string: String,
    pub variable_count_string: String,
    pub variable_info_type_string: String,
    pub voi_info_string: String,
    pub state_info_string: String,
    pub variable_info_string: String,
    /// one info record; placeholders: [NAME], [UNITS], [COMPONENT], [TYPE]
    pub variable_info_entry_string: String,
    pub create_states_array_string: String,
    pub create_variables_array_string: String,
    pub delete_array_string: String,
    pub initialize_constants_string: String,
    pub compute_computed_constants_string: String,
    pub compute_rates_string: String,
    pub compute_variables_string: String,
}

impl Profile {
    pub fn new(kind: ProfileKind) -> Profile {
        match kind {
            ProfileKind::C => Profile::c(),
            ProfileKind::Python => Profile::python(),
        }
    }

    fn c() -> Profile {
        Profile {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),

            has_conditional_operator: true,
            has_power_operator: false,
            has_xor_operator: false,

            eq_string: " = ".to_string(),
            eqeq_string: " == ".to_string(),
            neq_string: " != ".to_string(),
            lt_string: " < ".to_string(),
            leq_string: " <= ".to_string(),
            gt_string: " > ".to_string(),
            geq_string: " >= ".to_string(),
            and_string: " && ".to_string(),
            or_string: " || ".to_string(),
            not_string: "!".to_string(),
            xor_string: "xor".to_string(),
            xor_function_string: String::new(),
            plus_string: "+".to_string(),
            minus_string: "-".to_string(),
            times_string: "*".to_string(),
            divide_string: "/".to_string(),
            power_string: "pow".to_string(),
            square_string: None,
            sqrt_string: "sqrt".to_string(),

            abs_string: "fabs".to_string(),
            exp_string: "exp".to_string(),
            ln_string: "log".to_string(),
            log_string: "log10".to_string(),
            floor_string: "floor".to_string(),
            ceiling_string: "ceil".to_string(),
            min_string: "fmin".to_string(),
            max_string: "fmax".to_string(),
            rem_string: "fmod".to_string(),
            factorial_string: "factorial".to_string(),
            sin_string: "sin".to_string(),
            cos_string: "cos".to_string(),
            tan_string: "tan".to_string(),
            sec_string: "sec".to_string(),
            csc_string: "csc".to_string(),
            cot_string: "cot".to_string(),
            sinh_string: "sinh".to_string(),
            cosh_string: "cosh".to_string(),
            tanh_string: "tanh".to_string(),
            sech_string: "sech".to_string(),
            csch_string: "csch".to_string(),
            coth_string: "coth".to_string(),
            asin_string: "asin".to_string(),
            acos_string: "acos".to_string(),
            atan_string: "atan".to_string(),
            asec_string: "asec".to_string(),
            acsc_string: "acsc".to_string(),
            acot_string: "acot".to_string(),
            asinh_string: "asinh".to_string(),
            acosh_string: "acosh".to_string(),
            atanh_string: "atanh".to_string(),
            asech_string: "asech".to_string(),
            acsch_string: "acsch".to_string(),
            acoth_string: "acoth".to_string(),

            true_string: "1.0".to_string(),
            false_string: "0.0".to_string(),
            pi_string: "3.14159265358979323846".to_string(),
            e_string: "2.71828182845904523536".to_string(),
            inf_string: "INFINITY".to_string(),
            nan_string: "NAN".to_string(),

            voi_string: "voi".to_string(),
            states_array_string: "states".to_string(),
            rates_array_string: "rates".to_string(),
            variables_array_string: "variables".to_string(),
            open_array_string: "[".to_string(),
            close_array_string: "]".to_string(),

            statement_string: "    [CODE];\n".to_string(),
            empty_body_string: String::new(),
            piecewise_if_string: "([CONDITION])?[IF_STATEMENT]:[ELSE_STATEMENT]".to_string(),

            header_string:
                "/* The content of this file was generated using the C profile of [NAME] [VERSION]. */\n\n"
                    .to_string(),
            includes_string: "#include <math.h>\n#include <stddef.h>\n#include <stdlib.h>\n\n"
                .to_string(),
            version_constant_string: "const char VERSION[] = \"[VERSION]\";\n\n".to_string(),
            state_count_string: "const size_t STATE_COUNT = [COUNT];\n".to_string(),
            variable_count_string: "const size_t VARIABLE_COUNT = [COUNT];\n\n".to_string(),
            variable_info_type_string:
                "typedef enum {\n    VARIABLE_OF_INTEGRATION,\n    STATE,\n    CONSTANT,\n    COMPUTED_CONSTANT,\n    ALGEBRAIC\n} VariableType;\n\ntypedef struct {\n    char *name;\n    char *units;\n    int type;\n} VariableInfo;\n\n"
                    .to_string(),
            voi_info_string: "const VariableInfo VOI_INFO = [ENTRY];\n\n".to_string(),
            state_info_string: "const VariableInfo STATE_INFO[] = {\n[ENTRIES]};\n\n".to_string(),
            variable_info_string: "const VariableInfo VARIABLE_INFO[] = {\n[ENTRIES]};\n\n"
                .to_string(),
            variable_info_entry_string: "{\"[NAME]\", \"[UNITS]\", [TYPE]}".to_string(),
            create_states_array_string:
                "double *createStatesArray(void)\n{\n    return (double *) malloc(STATE_COUNT*sizeof(double));\n}\n\n"
                    .to_string(),
            create_variables_array_string:
                "double *createVariablesArray(void)\n{\n    return (double *) malloc(VARIABLE_COUNT*sizeof(double));\n}\n\n"
                    .to_string(),
            delete_array_string: "void deleteArray(double *array)\n{\n    free(array);\n}\n\n"
                .to_string(),
            initialize_constants_string:
                "void initializeConstants(double *states, double *variables)\n{\n[CODE]}\n\n"
                    .to_string(),
            compute_computed_constants_string:
                "void computeComputedConstants(double *variables)\n{\n[CODE]}\n\n".to_string(),
            compute_rates_string:
                "void computeRates(double voi, double *states, double *rates, double *variables)\n{\n[CODE]}\n\n"
                    .to_string(),
            compute_variables_string:
                "void computeVariables(double voi, double *states, double *rates, double *variables)\n{\n[CODE]}\n"
                    .to_string(),
        }
    }

    fn python() -> Profile {
        Profile {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),

            has_conditional_operator: false,
            has_power_operator: false,
            has_xor_operator: false,

            eq_string: " = ".to_string(),
            eqeq_string: " == ".to_string(),
            neq_string: " != ".to_string(),
            lt_string: " < ".to_string(),
            leq_string: " <= ".to_string(),
            gt_string: " > ".to_string(),
            geq_string: " >= ".to_string(),
            and_string: " and ".to_string(),
            or_string: " or ".to_string(),
            not_string: "not ".to_string(),
            xor_string: "xor".to_string(),
            xor_function_string: String::new(),
            plus_string: "+".to_string(),
            minus_string: "-".to_string(),
            times_string: "*".to_string(),
            divide_string: "/".to_string(),
            power_string: "pow".to_string(),
            square_string: None,
            sqrt_string: "sqrt".to_string(),

            abs_string: "fabs".to_string(),
            exp_string: "exp".to_string(),
            ln_string: "log".to_string(),
            log_string: "log10".to_string(),
            floor_string: "floor".to_string(),
            ceiling_string: "ceil".to_string(),
            min_string: "min".to_string(),
            max_string: "max".to_string(),
            rem_string: "fmod".to_string(),
            factorial_string: "factorial".to_string(),
            sin_string: "sin".to_string(),
            cos_string: "cos".to_string(),
            tan_string: "tan".to_string(),
            sec_string: "sec".to_string(),
            csc_string: "csc".to_string(),
            cot_string: "cot".to_string(),
            sinh_string: "sinh".to_string(),
            cosh_string: "cosh".to_string(),
            tanh_string: "tanh".to_string(),
            sech_string: "sech".to_string(),
            csch_string: "csch".to_string(),
            coth_string: "coth".to_string(),
            asin_string: "asin".to_string(),
            acos_string: "acos".to_string(),
            atan_string: "atan".to_string(),
            asec_string: "asec".to_string(),
            acsc_string: "acsc".to_string(),
            acot_string: "acot".to_string(),
            asinh_string: "asinh".to_string(),
            acosh_string: "acosh".to_string(),
            atanh_string: "atanh".to_string(),
            asech_string: "asech".to_string(),
            acsch_string: "acsch".to_string(),
            acoth_string: "acoth".to_string(),

            true_string: "1.0".to_string(),
            false_string: "0.0".to_string(),
            pi_string: "pi".to_string(),
            e_string: "e".to_string(),
            inf_string: "inf".to_string(),
            nan_string: "nan".to_string(),

            voi_string: "voi".to_string(),
            states_array_string: "states".to_string(),
            rates_array_string: "rates".to_string(),
            variables_array_string: "variables".to_string(),
            open_array_string: "[".to_string(),
            close_array_string: "]".to_string(),

            statement_string: "    [CODE]\n".to_string(),
            empty_body_string: "    pass\n".to_string(),
            piecewise_if_string: "[IF_STATEMENT] if [CONDITION] else [ELSE_STATEMENT]".to_string(),

            header_string:
                "# The content of this file was generated using the Python profile of [NAME] [VERSION].\n\n"
                    .to_string(),
            includes_string: "from math import *\n\n\n".to_string(),
            version_constant_string: "VERSION = \"[VERSION]\"\n\n".to_string(),
            state_count_string: "STATE_COUNT = [COUNT]\n".to_string(),
            variable_count_string: "VARIABLE_COUNT = [COUNT]\n\n".to_string(),
            variable_info_type_string: String::new(),
            voi_info_string: "VOI_INFO = [ENTRY]\n\n".to_string(),
            state_info_string: "STATE_INFO = [\n[ENTRIES]]\n\n".to_string(),
            variable_info_string: "VARIABLE_INFO = [\n[ENTRIES]]\n\n\n".to_string(),
            variable_info_entry_string:
                "{\"name\": \"[NAME]\", \"units\": \"[UNITS]\", \"component\": \"[COMPONENT]\"}"
                    .to_string(),
            create_states_array_string:
                "def create_states_array():\n    return [nan]*[COUNT]\n\n\n".to_string(),
            create_variables_array_string:
                "def create_variables_array():\n    return [nan]*[COUNT]\n\n\n".to_string(),
            delete_array_string: String::new(),
            initialize_constants_string:
                "def initialize_constants(states, variables):\n[CODE]\n\n".to_string(),
            compute_computed_constants_string:
                "def compute_computed_constants(variables):\n[CODE]\n\n".to_string(),
            compute_rates_string:
                "def compute_rates(voi, states, rates, variables):\n[CODE]\n\n".to_string(),
            compute_variables_string:
                "def compute_variables(voi, states, rates, variables):\n[CODE]".to_string(),
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Profile::new(ProfileKind::C)
    }
}
