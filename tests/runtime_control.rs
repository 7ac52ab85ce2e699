mod common;

use calcscript::ast::BinaryOp;
use calcscript::{execute_script, ExecOptions, ScriptError};
use common::*;

/// i = 0; loop: i = i + 1; jumpif (i < limit) loop; return i
fn counting_loop(limit: f64) -> calcscript::ast::Script {
    script(vec![
        assign("i", num(0.0)),
        label("loop"),
        assign("i", bin(BinaryOp::Add, var("i"), num(1.0))),
        jump_if("loop", bin(BinaryOp::Lt, var("i"), num(limit))),
        ret(var("i")),
    ])
}

#[test]
fn label_loop_counts_to_five() {
    let result = execute_script(&counting_loop(5.0), None, None).unwrap();
    assert_number(&result, 5.0);
}

#[test]
fn quota_stops_a_runaway_loop() {
    let options = ExecOptions::new().with_max_statements(100);
    let err = execute_script(&counting_loop(10_000.0), None, Some(options)).unwrap_err();
    match err {
        ScriptError::Runtime(err) => {
            assert_eq!(err.message, "Exceeded maximum script statements (100)");
        }
        other => panic!("expected a runtime error, got {other}"),
    }
}

#[test]
fn quota_zero_disables_the_limit() {
    let options = ExecOptions::new().with_max_statements(0);
    let result = execute_script(&counting_loop(2_000.0), None, Some(options.clone())).unwrap();
    assert_number(&result, 2000.0);
    assert!(options.statement_count() > 2_000);
}

#[test]
fn completed_runs_stay_within_the_quota() {
    let options = ExecOptions::new().with_max_statements(50);
    execute_script(&counting_loop(3.0), None, Some(options.clone())).unwrap();
    assert!(options.statement_count() <= 50);
}

#[test]
fn unconditional_jump_skips_statements() {
    let script = script(vec![
        assign("x", num(1.0)),
        jump("end"),
        assign("x", num(2.0)),
        label("end"),
        ret(var("x")),
    ]);
    let result = execute_script(&script, None, None).unwrap();
    assert_number(&result, 1.0);
}

#[test]
fn falsy_jump_condition_falls_through() {
    let script = script(vec![
        jump_if("skip", num(0.0)),
        ret(num(1.0)),
        label("skip"),
        ret(num(2.0)),
    ]);
    let result = execute_script(&script, None, None).unwrap();
    assert_number(&result, 1.0);
}

#[test]
fn labels_are_inert_when_fallen_through() {
    let script = script(vec![
        label("a"),
        label("b"),
        ret(num(3.0)),
    ]);
    let result = execute_script(&script, None, None).unwrap();
    assert_number(&result, 3.0);
}

#[test]
fn unknown_jump_label_is_a_runtime_error() {
    let script = script(vec![jump("nowhere")]);
    let err = execute_script(&script, None, None).unwrap_err();
    assert_eq!(err.to_string(), "Unknown jump label \"nowhere\"");
}

#[test]
fn jumps_inside_functions_resolve_within_the_body() {
    // function countdown(n) { top: n = n - 1; jumpif (0 < n) top; return n }
    let script = script(vec![
        function(
            "countdown",
            &["n"],
            vec![
                label("top"),
                assign("n", bin(BinaryOp::Sub, var("n"), num(1.0))),
                jump_if("top", bin(BinaryOp::Lt, num(0.0), var("n"))),
                ret(var("n")),
            ],
        ),
        ret(call("countdown", vec![num(4.0)])),
    ]);
    let result = execute_script(&script, None, None).unwrap();
    assert_number(&result, 0.0);
}

#[test]
fn quota_spans_nested_function_calls() {
    // Each call burns statements from the same shared counter.
    let script = script(vec![
        function("noop", &[], vec![ret_null()]),
        expr_stmt(call("noop", vec![])),
        expr_stmt(call("noop", vec![])),
        ret(num(1.0)),
    ]);
    let options = ExecOptions::new().with_max_statements(1_000);
    execute_script(&script, None, Some(options.clone())).unwrap();
    // function def + 2 calls + 2 executed bodies + return
    assert_eq!(options.statement_count(), 6);
}
