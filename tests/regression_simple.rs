//! A regression test for the "simple" example.
use regression::run_regression_test;

#[test]
fn regression_simple() {
    // Operational costs of 170 MWh of nuclear at $6/MWh and 90 MWh of gas at $26/MWh, plus
    // $1000 of fixed costs
    run_regression_test("simple", &[("", 4360.0)]);
}
