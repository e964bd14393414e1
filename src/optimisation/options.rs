//! Options passed through to HiGHS.
//!
//! HiGHS aborts the program if it is given an option it does not recognise or a value of the wrong
//! type, so options are checked against the table below before they reach the solver.
use anyhow::{Result, bail, ensure};
use indexmap::IndexMap;
use serde::Deserialize;

/// A value for a solver option given in the scenario file
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SolverOptionValue {
    /// A boolean option, e.g. `output_flag = false`
    Bool(bool),
    /// An integer option, e.g. `threads = 1`
    Int(i32),
    /// A floating-point option, e.g. `mip_rel_gap = 0.01`
    Float(f64),
    /// A string option, e.g. `solver = "ipm"`
    Str(String),
}

/// Solver options, keyed by HiGHS option name
pub type SolverOptions = IndexMap<String, SolverOptionValue>;

/// The type of a HiGHS option and the values it accepts
#[derive(Clone, Copy, Debug)]
enum OptionKind {
    Bool,
    Int { min: i32, max: i32 },
    Float { min: f64, max: f64 },
    /// A string option. An empty list means any string is accepted.
    Str(&'static [&'static str]),
}

const OFF_CHOOSE_ON: &[&str] = &["off", "choose", "on"];
const NON_NEGATIVE_INT: OptionKind = OptionKind::Int {
    min: 0,
    max: i32::MAX,
};
const NON_NEGATIVE_FLOAT: OptionKind = OptionKind::Float {
    min: 0.0,
    max: f64::INFINITY,
};
const TOLERANCE: OptionKind = OptionKind::Float {
    min: 1e-12,
    max: f64::INFINITY,
};

/// The HiGHS options which can be set from a scenario
const KNOWN_OPTIONS: &[(&str, OptionKind)] = &[
    ("presolve", OptionKind::Str(OFF_CHOOSE_ON)),
    (
        "solver",
        OptionKind::Str(&["choose", "simplex", "ipm", "pdlp"]),
    ),
    ("parallel", OptionKind::Str(OFF_CHOOSE_ON)),
    ("run_crossover", OptionKind::Str(OFF_CHOOSE_ON)),
    ("ranging", OptionKind::Str(&["off", "on"])),
    ("time_limit", NON_NEGATIVE_FLOAT),
    ("threads", NON_NEGATIVE_INT),
    ("random_seed", NON_NEGATIVE_INT),
    ("output_flag", OptionKind::Bool),
    ("log_to_console", OptionKind::Bool),
    ("log_file", OptionKind::Str(&[])),
    ("write_solution_to_file", OptionKind::Bool),
    ("solution_file", OptionKind::Str(&[])),
    ("allow_unbounded_or_infeasible", OptionKind::Bool),
    ("primal_feasibility_tolerance", TOLERANCE),
    ("dual_feasibility_tolerance", TOLERANCE),
    ("ipm_optimality_tolerance", TOLERANCE),
    ("mip_feasibility_tolerance", TOLERANCE),
    (
        "objective_bound",
        OptionKind::Float {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        },
    ),
    ("simplex_strategy", OptionKind::Int { min: 0, max: 4 }),
    ("simplex_scale_strategy", OptionKind::Int { min: 0, max: 5 }),
    ("simplex_iteration_limit", NON_NEGATIVE_INT),
    ("ipm_iteration_limit", NON_NEGATIVE_INT),
    ("mip_max_nodes", NON_NEGATIVE_INT),
    ("mip_rel_gap", NON_NEGATIVE_FLOAT),
    ("mip_abs_gap", NON_NEGATIVE_FLOAT),
];

fn option_kind(name: &str) -> Option<OptionKind> {
    KNOWN_OPTIONS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, kind)| *kind)
}

/// Check a solver option, returning the value in the form HiGHS expects.
///
/// Integers are accepted for floating-point options (e.g. `time_limit = 300`).
pub fn check_solver_option(name: &str, value: &SolverOptionValue) -> Result<SolverOptionValue> {
    let Some(kind) = option_kind(name) else {
        bail!("Unknown solver option: {name}");
    };

    let checked = match (kind, value) {
        (OptionKind::Bool, SolverOptionValue::Bool(_)) => value.clone(),
        (OptionKind::Int { min, max }, SolverOptionValue::Int(value)) => {
            ensure!(
                (min..=max).contains(value),
                "Solver option {name} must be between {min} and {max}"
            );
            SolverOptionValue::Int(*value)
        }
        (OptionKind::Float { min, max }, SolverOptionValue::Int(value)) => {
            check_float(name, f64::from(*value), min, max)?
        }
        (OptionKind::Float { min, max }, SolverOptionValue::Float(value)) => {
            check_float(name, *value, min, max)?
        }
        (OptionKind::Str(allowed), SolverOptionValue::Str(value)) => {
            ensure!(
                !value.contains('\0'),
                "Solver option {name} contains a null character"
            );
            ensure!(
                allowed.is_empty() || allowed.contains(&value.as_str()),
                "Invalid value for solver option {name}: {value} (expected one of: {})",
                allowed.join(", ")
            );
            SolverOptionValue::Str(value.clone())
        }
        (kind, _) => bail!(
            "Solver option {name} must be {}",
            match kind {
                OptionKind::Bool => "true or false",
                OptionKind::Int { .. } => "an integer",
                OptionKind::Float { .. } => "a number",
                OptionKind::Str(_) => "a string",
            }
        ),
    };

    Ok(checked)
}

fn check_float(name: &str, value: f64, min: f64, max: f64) -> Result<SolverOptionValue> {
    ensure!(
        value >= min && value <= max,
        "Solver option {name} must be between {min} and {max}"
    );
    Ok(SolverOptionValue::Float(value))
}

/// Check all of the given solver options
pub fn check_solver_options(options: &SolverOptions) -> Result<SolverOptions> {
    options
        .iter()
        .map(|(name, value)| Ok((name.clone(), check_solver_option(name, value)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;

    #[test]
    fn options_from_toml() {
        let options: SolverOptions =
            toml::from_str("presolve = \"off\"\nthreads = 1\nmip_rel_gap = 0.5\noutput_flag = true")
                .unwrap();
        assert_eq!(
            options["presolve"],
            SolverOptionValue::Str("off".to_string())
        );
        assert_eq!(options["threads"], SolverOptionValue::Int(1));
        assert_eq!(options["mip_rel_gap"], SolverOptionValue::Float(0.5));
        assert_eq!(options["output_flag"], SolverOptionValue::Bool(true));
        assert_eq!(check_solver_options(&options).unwrap(), options);
    }

    #[rstest]
    #[case("mip_rel_gap", SolverOptionValue::Int(1), SolverOptionValue::Float(1.0))]
    #[case("time_limit", SolverOptionValue::Int(300), SolverOptionValue::Float(300.0))]
    #[case("threads", SolverOptionValue::Int(4), SolverOptionValue::Int(4))]
    #[case(
        "solver",
        SolverOptionValue::Str("ipm".into()),
        SolverOptionValue::Str("ipm".into())
    )]
    fn valid_option(
        #[case] name: &str,
        #[case] value: SolverOptionValue,
        #[case] expected: SolverOptionValue,
    ) {
        assert_eq!(check_solver_option(name, &value).unwrap(), expected);
    }

    #[rstest]
    #[case(
        "not_a_highs_option",
        SolverOptionValue::Int(1),
        "Unknown solver option: not_a_highs_option"
    )]
    #[case(
        "threads",
        SolverOptionValue::Str("four".into()),
        "Solver option threads must be an integer"
    )]
    #[case(
        "threads",
        SolverOptionValue::Float(1.5),
        "Solver option threads must be an integer"
    )]
    #[case(
        "output_flag",
        SolverOptionValue::Int(0),
        "Solver option output_flag must be true or false"
    )]
    #[case(
        "presolve",
        SolverOptionValue::Bool(false),
        "Solver option presolve must be a string"
    )]
    #[case(
        "presolve",
        SolverOptionValue::Str("maybe".into()),
        "Invalid value for solver option presolve: maybe (expected one of: off, choose, on)"
    )]
    #[case(
        "simplex_strategy",
        SolverOptionValue::Int(9),
        "Solver option simplex_strategy must be between 0 and 4"
    )]
    #[case(
        "mip_rel_gap",
        SolverOptionValue::Float(-0.1),
        "Solver option mip_rel_gap must be between 0 and inf"
    )]
    fn invalid_option(
        #[case] name: &str,
        #[case] value: SolverOptionValue,
        #[case] message: &str,
    ) {
        assert_error!(check_solver_option(name, &value), message);
    }
}
