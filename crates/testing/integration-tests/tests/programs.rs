//! Runs every fixture program end to end

use integration_tests::fixtures::{self, Project, TestResult};
use integration_tests::init_tracing;

fn check(project: &Project) {
    init_tracing();
    match project.run() {
        TestResult::Pass => {}
        TestResult::Fail { reason } => panic!("{reason}"),
    }
}

#[test]
fn test_all_projects() {
    let failures: Vec<String> = fixtures::all_projects()
        .iter()
        .filter_map(|project| match project.run() {
            TestResult::Pass => None,
            TestResult::Fail { reason } => Some(reason),
        })
        .collect();
    assert!(failures.is_empty(), "{failures:#?}");
}

#[test]
fn test_loop_sum() {
    check(&fixtures::loop_sum());
}

#[test]
fn test_assignment_in_expression() {
    check(&fixtures::assignment_in_expression());
}

#[test]
fn test_do_while_continue() {
    check(&fixtures::do_while_continue());
}

#[test]
fn test_goto_loop() {
    check(&fixtures::goto_loop());
}

#[test]
fn test_namespace_across_units() {
    check(&fixtures::namespace_across_units());
}

#[test]
fn test_mixed_literals() {
    check(&fixtures::mixed_literals());
}

#[test]
fn test_redeclaration() {
    check(&fixtures::redeclaration());
}

#[test]
fn test_index_out_of_range() {
    check(&fixtures::index_out_of_range());
}
