//! A regression test for the "policy" example, which has two subproblems.
use regression::run_instances_solved_test;

#[test]
fn regression_policy() {
    run_instances_solved_test("policy", &["1", "2"]);
}
