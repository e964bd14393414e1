//! The linear programme built up by the model modules.
//!
//! Modules add named families of variables, expressions and constraints, each member of which is
//! identified by a [`ComponentIndex`]. Other modules look components up by name, which is what lets
//! one module consume the components registered by another. Once all modules have contributed,
//! the problem is handed to HiGHS and the solution can be read back through the same names.
use anyhow::{Context, Result, ensure};
use highs::{HighsModelStatus, HighsStatus, RowProblem as Problem, Sense};
use indexmap::IndexMap;
use log::debug;
use std::error::Error;
use std::fmt;

mod expression;
pub use expression::{LinExpr, Var};
mod index;
pub use index::{ComponentIndex, IndexValue};
mod options;
pub use options::{SolverOptionValue, SolverOptions, check_solver_options};

/// Tolerance used when checking constraints which contain no variables
const CONSTANT_CONSTRAINT_TOLERANCE: f64 = 1e-9;

/// A family of variables, e.g. `Provide_Power_MW`
pub type VariableFamily = IndexMap<ComponentIndex, Var>;

/// A family of expressions, e.g. `Power_Provision_MW`
pub type ExpressionFamily = IndexMap<ComponentIndex, LinExpr>;

/// A family of constraints, mapping each member to its row in the problem
pub type ConstraintFamily = IndexMap<ComponentIndex, usize>;

/// Lower and upper bounds for a variable
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Lower bound (may be `-inf`)
    pub lower: f64,
    /// Upper bound (may be `inf`)
    pub upper: f64,
}

impl Bounds {
    /// Bounds for a variable which must be zero or positive
    pub fn non_negative() -> Self {
        Self::new(0.0, f64::INFINITY)
    }

    /// Bounds for an unbounded variable
    pub fn free() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Bounds between `lower` and `upper`
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }
}

/// The relation between the two sides of a constraint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    /// Left-hand side less than or equal to right-hand side
    LessOrEqual,
    /// Left-hand side greater than or equal to right-hand side
    GreaterOrEqual,
    /// Both sides equal
    Equal,
}

/// A linear constraint of the form `expr (<=|>=|=) rhs`
#[derive(Clone, Debug)]
pub struct Constraint {
    expr: LinExpr,
    relation: Relation,
    rhs: f64,
}

impl Constraint {
    /// `lhs <= rhs`
    pub fn le(lhs: LinExpr, rhs: impl Into<LinExpr>) -> Self {
        Self::new(lhs, Relation::LessOrEqual, rhs.into())
    }

    /// `lhs >= rhs`
    pub fn ge(lhs: LinExpr, rhs: impl Into<LinExpr>) -> Self {
        Self::new(lhs, Relation::GreaterOrEqual, rhs.into())
    }

    /// `lhs == rhs`
    pub fn eq(lhs: LinExpr, rhs: impl Into<LinExpr>) -> Self {
        Self::new(lhs, Relation::Equal, rhs.into())
    }

    /// Move everything to the left-hand side, leaving a constant on the right
    fn new(lhs: LinExpr, relation: Relation, rhs: LinExpr) -> Self {
        let mut expr = lhs - rhs;
        let constant = expr.constant_value();
        expr.add_constant(-constant);
        Self {
            expr,
            relation,
            rhs: -constant,
        }
    }

    /// The row bounds once the constant has been moved to the right
    fn row_bounds(&self) -> (f64, f64) {
        match self.relation {
            Relation::LessOrEqual => (f64::NEG_INFINITY, self.rhs),
            Relation::GreaterOrEqual => (self.rhs, f64::INFINITY),
            Relation::Equal => (self.rhs, self.rhs),
        }
    }

    /// Whether a constraint with no variables holds (i.e. `0 relation rhs`)
    fn trivially_satisfied(&self) -> bool {
        let (lower, upper) = self.row_bounds();
        lower <= CONSTANT_CONSTRAINT_TOLERANCE && upper >= -CONSTANT_CONSTRAINT_TOLERANCE
    }
}

#[derive(Clone, Debug)]
struct Row {
    lower: f64,
    upper: f64,
    terms: Vec<(Var, f64)>,
}

/// The optimisation problem for one instance of a scenario
#[derive(Default)]
pub struct ModelInstance {
    columns: Vec<Bounds>,
    rows: Vec<Row>,
    variables: IndexMap<String, VariableFamily>,
    expressions: IndexMap<String, ExpressionFamily>,
    constraints: IndexMap<String, ConstraintFamily>,
    objective: LinExpr,
}

impl ModelInstance {
    /// Create an empty problem
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of variables in the problem
    pub fn num_variables(&self) -> usize {
        self.columns.len()
    }

    /// The number of constraints in the problem
    pub fn num_constraints(&self) -> usize {
        self.rows.len()
    }

    /// Add a family of variables.
    ///
    /// # Panics
    ///
    /// If a variable family with this name already exists or an index is repeated.
    pub fn add_variables<I>(&mut self, name: &str, members: I)
    where
        I: IntoIterator<Item = (ComponentIndex, Bounds)>,
    {
        assert!(
            !self.variables.contains_key(name),
            "Variable {name} added twice"
        );

        let mut family = VariableFamily::new();
        for (index, bounds) in members {
            let var = Var(self.columns.len());
            self.columns.push(bounds);
            let existing = family.insert(index, var);
            assert!(existing.is_none(), "Duplicate index for variable {name}");
        }
        self.variables.insert(name.to_string(), family);
    }

    /// Look up a variable family by name
    pub fn variables(&self, name: &str) -> Result<&VariableFamily> {
        self.variables
            .get(name)
            .with_context(|| format!("Variable {name} has not been added to the model"))
    }

    /// Look up a single variable
    pub fn var(&self, name: &str, index: &ComponentIndex) -> Result<Var> {
        self.variables(name)?
            .get(index)
            .copied()
            .with_context(|| format!("Variable {name} is not defined at index {index}"))
    }

    /// Add a family of expressions.
    ///
    /// # Panics
    ///
    /// If an expression family with this name already exists or an index is repeated.
    pub fn add_expressions<I>(&mut self, name: &str, members: I)
    where
        I: IntoIterator<Item = (ComponentIndex, LinExpr)>,
    {
        assert!(
            !self.expressions.contains_key(name),
            "Expression {name} added twice"
        );

        let mut family = ExpressionFamily::new();
        for (index, expr) in members {
            let existing = family.insert(index, expr);
            assert!(existing.is_none(), "Duplicate index for expression {name}");
        }
        self.expressions.insert(name.to_string(), family);
    }

    /// Add a scalar expression
    pub fn add_scalar_expression(&mut self, name: &str, expr: LinExpr) {
        self.add_expressions(name, [(ComponentIndex::scalar(), expr)]);
    }

    /// Whether an expression family with the given name exists
    pub fn has_expressions(&self, name: &str) -> bool {
        self.expressions.contains_key(name)
    }

    /// Look up an expression family by name
    pub fn expressions(&self, name: &str) -> Result<&ExpressionFamily> {
        self.expressions
            .get(name)
            .with_context(|| format!("Expression {name} has not been added to the model"))
    }

    /// Look up a single expression
    pub fn expr(&self, name: &str, index: &ComponentIndex) -> Result<&LinExpr> {
        self.expressions(name)?
            .get(index)
            .with_context(|| format!("Expression {name} is not defined at index {index}"))
    }

    /// Look up an expression, treating a missing index as zero.
    ///
    /// The family itself must exist.
    pub fn expr_or_zero(&self, name: &str, index: &ComponentIndex) -> Result<LinExpr> {
        Ok(self.expressions(name)?.get(index).cloned().unwrap_or_default())
    }

    /// Add a family of constraints.
    ///
    /// Constraints whose left-hand side contains no variables are not added to the problem, but an
    /// error is returned if such a constraint cannot hold.
    ///
    /// # Panics
    ///
    /// If a constraint family with this name already exists or an index is repeated.
    pub fn add_constraints<I>(&mut self, name: &str, members: I) -> Result<()>
    where
        I: IntoIterator<Item = (ComponentIndex, Constraint)>,
    {
        assert!(
            !self.constraints.contains_key(name),
            "Constraint {name} added twice"
        );

        // Nothing is added to the problem unless every member can be
        let mut family = ConstraintFamily::new();
        let mut rows = Vec::new();
        for (index, constraint) in members {
            let terms = constraint.expr.merged_terms();
            if terms.is_empty() {
                ensure!(
                    constraint.trivially_satisfied(),
                    "Constraint {name} at index {index} contains no variables and cannot be met"
                );
                continue;
            }

            let (lower, upper) = constraint.row_bounds();
            let existing = family.insert(index, self.rows.len() + rows.len());
            assert!(existing.is_none(), "Duplicate index for constraint {name}");
            rows.push(Row {
                lower,
                upper,
                terms,
            });
        }
        self.rows.extend(rows);
        self.constraints.insert(name.to_string(), family);

        Ok(())
    }

    /// Look up a constraint family by name
    pub fn constraints(&self, name: &str) -> Result<&ConstraintFamily> {
        self.constraints
            .get(name)
            .with_context(|| format!("Constraint {name} has not been added to the model"))
    }

    /// Set the expression to be minimised
    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    /// Iterate over the names of all variable families
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Iterate over the names of all constraint families
    pub fn constraint_names(&self) -> impl Iterator<Item = &str> {
        self.constraints.keys().map(String::as_str)
    }

    /// Solve the problem with HiGHS.
    ///
    /// # Arguments
    ///
    /// * `options` - Options passed to the solver
    /// * `quiet` - Whether to suppress the solver's console output
    pub fn solve(&self, options: &SolverOptions, quiet: bool) -> Result<Solution, ModelError> {
        let mut problem = Problem::default();

        // The objective coefficients must be known when columns are added
        let mut costs = vec![0.0; self.columns.len()];
        for (var, coeff) in self.objective.merged_terms() {
            costs[var.0] = coeff;
        }
        let cols: Vec<highs::Col> = self
            .columns
            .iter()
            .zip(costs)
            .map(|(bounds, cost)| problem.add_column(cost, bounds.lower..=bounds.upper))
            .collect();

        for row in &self.rows {
            problem.add_row(
                row.lower..=row.upper,
                row.terms.iter().map(|(var, coeff)| (cols[var.0], *coeff)),
            );
        }
        debug!(
            "Solving problem with {} variables and {} constraints",
            self.columns.len(),
            self.rows.len()
        );

        let mut model = problem.optimise(Sense::Minimise);
        if quiet {
            model.set_option("output_flag", false);
        }
        // HiGHS panics on options it does not accept
        let options = check_solver_options(options)
            .map_err(|err| ModelError::InvalidOption(format!("{err:#}")))?;
        for (option, value) in &options {
            match value {
                SolverOptionValue::Bool(value) => model.set_option(option.as_str(), *value),
                SolverOptionValue::Int(value) => model.set_option(option.as_str(), *value),
                SolverOptionValue::Float(value) => model.set_option(option.as_str(), *value),
                SolverOptionValue::Str(value) => {
                    model.set_option(option.as_str(), value.as_str());
                }
            }
        }

        let solved = solve_optimal(model)?;
        let solution = solved.get_solution();

        Ok(Solution {
            values: solution.columns().to_vec(),
            duals: solution.dual_rows().to_vec(),
            objective_value: solved.objective_value() + self.objective.constant_value(),
        })
    }

    /// Iterate over the values of a variable family in the solution
    pub fn variable_values<'a>(
        &'a self,
        name: &str,
        solution: &'a Solution,
    ) -> Result<impl Iterator<Item = (&'a ComponentIndex, f64)> + use<'a>> {
        Ok(self
            .variables(name)?
            .iter()
            .map(|(index, var)| (index, solution.value(*var))))
    }

    /// Iterate over the values of an expression family in the solution
    pub fn expression_values<'a>(
        &'a self,
        name: &str,
        solution: &'a Solution,
    ) -> Result<impl Iterator<Item = (&'a ComponentIndex, f64)> + use<'a>> {
        Ok(self
            .expressions(name)?
            .iter()
            .map(|(index, expr)| (index, solution.evaluate(expr))))
    }

    /// Evaluate a single expression in the solution
    pub fn expression_value(
        &self,
        name: &str,
        index: &ComponentIndex,
        solution: &Solution,
    ) -> Result<f64> {
        Ok(solution.evaluate(self.expr(name, index)?))
    }

    /// The dual of a single constraint, or `None` if it was not added because it had no variables
    pub fn dual(
        &self,
        name: &str,
        index: &ComponentIndex,
        solution: &Solution,
    ) -> Result<Option<f64>> {
        Ok(self
            .constraints(name)?
            .get(index)
            .map(|row| solution.duals[*row]))
    }

    /// Iterate over the duals of a constraint family in the solution
    pub fn duals<'a>(
        &'a self,
        name: &str,
        solution: &'a Solution,
    ) -> Result<impl Iterator<Item = (&'a ComponentIndex, f64)> + use<'a>> {
        Ok(self
            .constraints(name)?
            .iter()
            .map(|(index, row)| (index, solution.duals[*row])))
    }
}

/// The solution of a [`ModelInstance`]
#[derive(Clone, Debug)]
pub struct Solution {
    values: Vec<f64>,
    duals: Vec<f64>,
    /// The value of the objective function, including any constant terms
    pub objective_value: f64,
}

impl Solution {
    /// The value of a variable
    pub fn value(&self, var: Var) -> f64 {
        self.values[var.0]
    }

    /// Evaluate an expression
    pub fn evaluate(&self, expr: &LinExpr) -> f64 {
        expr.evaluate(&self.values)
    }
}

/// Defines the possible errors that can occur when running the solver
#[derive(Debug, Clone)]
pub enum ModelError {
    /// The model definition is incoherent.
    ///
    /// Users should not be able to trigger this error.
    Incoherent(HighsStatus),
    /// An optimal solution could not be found
    NonOptimal(HighsModelStatus),
    /// A solver option was not recognised or had an invalid value
    InvalidOption(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Incoherent(status) => write!(f, "Incoherent model: {status:?}"),
            ModelError::NonOptimal(status) => {
                write!(f, "Could not find optimal result: {status:?}")
            }
            ModelError::InvalidOption(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ModelError {}

/// Try to solve the model, returning an error if the model is incoherent or result is non-optimal
fn solve_optimal(model: highs::Model) -> Result<highs::SolvedModel, ModelError> {
    let solved = model.try_solve().map_err(ModelError::Incoherent)?;

    match solved.status() {
        HighsModelStatus::Optimal => Ok(solved),
        status => Err(ModelError::NonOptimal(status)),
    }
}
