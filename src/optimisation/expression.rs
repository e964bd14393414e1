//! Linear expressions over the decision variables of the model.
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A decision variable in the optimisation.
///
/// This only refers to a column of the problem; it does not hold the variable's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(pub(super) usize);

impl Var {
    /// The column number of this variable
    pub fn column(self) -> usize {
        self.0
    }
}

/// A linear expression: a weighted sum of variables plus a constant
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(Var, f64)>,
    constant: f64,
}

impl LinExpr {
    /// An expression equal to zero
    pub fn new() -> Self {
        Self::default()
    }

    /// An expression with no variables
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// The term `coeff * var`
    pub fn term(var: Var, coeff: f64) -> Self {
        Self {
            terms: vec![(var, coeff)],
            constant: 0.0,
        }
    }

    /// Add `coeff * var` to the expression
    pub fn add_term(&mut self, var: Var, coeff: f64) {
        self.terms.push((var, coeff));
    }

    /// Add a constant to the expression
    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// Add `scale * other` to the expression
    pub fn add_scaled(&mut self, other: &LinExpr, scale: f64) {
        self.terms
            .extend(other.terms.iter().map(|(var, coeff)| (*var, coeff * scale)));
        self.constant += other.constant * scale;
    }

    /// A copy of the expression multiplied by `scale`
    pub fn scaled(&self, scale: f64) -> LinExpr {
        let mut out = LinExpr::new();
        out.add_scaled(self, scale);
        out
    }

    /// The constant part of the expression
    pub fn constant_value(&self) -> f64 {
        self.constant
    }

    /// The variable terms, with duplicate variables merged and zero coefficients dropped
    pub fn merged_terms(&self) -> Vec<(Var, f64)> {
        let mut terms = self.terms.clone();
        terms.sort_by_key(|(var, _)| *var);

        let mut merged: Vec<(Var, f64)> = Vec::with_capacity(terms.len());
        for (var, coeff) in terms {
            match merged.last_mut() {
                Some((last, total)) if *last == var => *total += coeff,
                _ => merged.push((var, coeff)),
            }
        }
        merged.retain(|(_, coeff)| *coeff != 0.0);

        merged
    }

    /// Whether the expression contains no variables (once like terms are collected)
    pub fn is_constant(&self) -> bool {
        self.merged_terms().is_empty()
    }

    /// Evaluate the expression given a value for every column
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * values[var.0])
            .sum::<f64>()
            + self.constant
    }
}

impl From<Var> for LinExpr {
    fn from(var: Var) -> Self {
        LinExpr::term(var, 1.0)
    }
}

impl From<f64> for LinExpr {
    fn from(value: f64) -> Self {
        LinExpr::constant(value)
    }
}

impl AddAssign<&LinExpr> for LinExpr {
    fn add_assign(&mut self, rhs: &LinExpr) {
        self.add_scaled(rhs, 1.0);
    }
}

impl AddAssign<LinExpr> for LinExpr {
    fn add_assign(&mut self, rhs: LinExpr) {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl AddAssign<Var> for LinExpr {
    fn add_assign(&mut self, rhs: Var) {
        self.add_term(rhs, 1.0);
    }
}

impl AddAssign<f64> for LinExpr {
    fn add_assign(&mut self, rhs: f64) {
        self.constant += rhs;
    }
}

impl SubAssign<&LinExpr> for LinExpr {
    fn sub_assign(&mut self, rhs: &LinExpr) {
        self.add_scaled(rhs, -1.0);
    }
}

impl SubAssign<LinExpr> for LinExpr {
    fn sub_assign(&mut self, rhs: LinExpr) {
        self.add_scaled(&rhs, -1.0);
    }
}

impl SubAssign<Var> for LinExpr {
    fn sub_assign(&mut self, rhs: Var) {
        self.add_term(rhs, -1.0);
    }
}

impl SubAssign<f64> for LinExpr {
    fn sub_assign(&mut self, rhs: f64) {
        self.constant -= rhs;
    }
}

impl<T> Add<T> for LinExpr
where
    LinExpr: AddAssign<T>,
{
    type Output = LinExpr;

    fn add(mut self, rhs: T) -> LinExpr {
        self += rhs;
        self
    }
}

impl<T> Sub<T> for LinExpr
where
    LinExpr: SubAssign<T>,
{
    type Output = LinExpr;

    fn sub(mut self, rhs: T) -> LinExpr {
        self -= rhs;
        self
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;

    fn mul(mut self, rhs: f64) -> LinExpr {
        for (_, coeff) in &mut self.terms {
            *coeff *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl Mul<f64> for &LinExpr {
    type Output = LinExpr;

    fn mul(self, rhs: f64) -> LinExpr {
        self.scaled(rhs)
    }
}

impl Mul<f64> for Var {
    type Output = LinExpr;

    fn mul(self, rhs: f64) -> LinExpr {
        LinExpr::term(self, rhs)
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> LinExpr {
        self * -1.0
    }
}

impl Sum for LinExpr {
    fn sum<I: Iterator<Item = LinExpr>>(iter: I) -> LinExpr {
        iter.fold(LinExpr::new(), |acc, expr| acc + expr)
    }
}

impl<'a> Sum<&'a LinExpr> for LinExpr {
    fn sum<I: Iterator<Item = &'a LinExpr>>(iter: I) -> LinExpr {
        iter.fold(LinExpr::new(), |acc, expr| acc + expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_terms_collects_like_terms() {
        let x = Var(0);
        let y = Var(1);
        let expr = x * 2.0 + y * 1.0 + x * -2.0 + y * 3.0 + 5.0;
        assert_eq!(expr.merged_terms(), vec![(y, 4.0)]);
        assert_eq!(expr.constant_value(), 5.0);
    }

    #[test]
    fn constant_after_cancellation() {
        let x = Var(3);
        let expr = LinExpr::from(x) - x + 1.0;
        assert!(expr.is_constant());
    }

    #[test]
    fn evaluate_expression() {
        let expr = Var(0) * 2.0 + Var(1) * -1.0 + 4.0;
        assert_eq!(expr.evaluate(&[3.0, 1.0]), 9.0);
    }

    #[test]
    fn scaled_and_negated() {
        let expr = (Var(0) * 2.0 + 1.0).scaled(3.0);
        assert_eq!(expr.evaluate(&[1.0]), 9.0);
        assert_eq!((-expr).evaluate(&[1.0]), -9.0);
    }

    #[test]
    fn sum_of_expressions() {
        let exprs = [LinExpr::from(Var(0)), LinExpr::constant(2.0), Var(1) * 0.5];
        let total: LinExpr = exprs.iter().sum();
        assert_eq!(total.evaluate(&[1.0, 4.0]), 5.0);
    }
}
