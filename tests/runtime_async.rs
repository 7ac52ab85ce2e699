mod common;

use std::time::{Duration, Instant};

use calcscript::ast::BinaryOp;
use calcscript::{
    evaluate_expression, evaluate_expression_async, execute_script, execute_script_async, Scope,
    Value,
};
use common::*;
use futures::FutureExt;

fn install_slow(globals: &Scope) {
    globals.set(
        "slow",
        Value::native_async(|args, _options| {
            async move {
                let ms = args.first().map(|v| v.to_number()).unwrap_or(0.0);
                tokio::time::sleep(Duration::from_millis(ms as u64)).await;
                Ok(Value::Number(ms))
            }
            .boxed_local()
        }),
    );
}

fn install_add(globals: &Scope) {
    globals.set(
        "add",
        Value::native(|args, _options| {
            Ok(Value::Number(args.iter().map(Value::to_number).sum()))
        }),
    );
}

#[test]
fn short_circuit_skips_debug_log() {
    // return 0 && debugLog('x')
    let (options, lines) = capturing_options();
    let script = script(vec![ret(bin(
        BinaryOp::And,
        num(0.0),
        call("debugLog", vec![text("x")]),
    ))]);
    let result = execute_script(&script, None, Some(options)).unwrap();
    assert_number(&result, 0.0);
    assert_eq!(lines.borrow().iter().filter(|line| *line == "x").count(), 0);
}

#[tokio::test]
async fn short_circuit_holds_in_async_mode() {
    let (options, lines) = capturing_options();
    let script = script(vec![ret(bin(
        BinaryOp::And,
        num(0.0),
        call("debugLog", vec![text("x")]),
    ))]);
    let result = execute_script_async(&script, None, Some(options)).await.unwrap();
    assert_number(&result, 0.0);
    assert_eq!(lines.borrow().iter().filter(|line| *line == "x").count(), 0);
}

#[tokio::test]
async fn sync_and_async_evaluation_agree_on_sync_programs() {
    let exprs = [
        bin(
            BinaryOp::Add,
            num(2.0),
            bin(BinaryOp::Mul, num(3.0), num(4.0)),
        ),
        bin(BinaryOp::Or, num(0.0), text("fallback")),
        call("if", vec![num(1.0), text("yes"), text("no")]),
        bin(BinaryOp::Add, text("n="), num(3.0)),
    ];
    for expr in &exprs {
        let sync = evaluate_expression(expr, None, None, None, true).unwrap();
        let asynced = evaluate_expression_async(expr, None, None, None, true)
            .await
            .unwrap();
        assert!(
            sync.strict_eq(&asynced),
            "modes disagree on {expr:?}: {sync:?} vs {asynced:?}"
        );
    }
}

#[tokio::test]
async fn parallel_arguments_overlap_their_waits() {
    // return add(slow(50), slow(50)) completes in ~50ms, not ~100ms.
    let globals = Scope::new();
    install_slow(&globals);
    install_add(&globals);
    let script = script(vec![ret(call(
        "add",
        vec![
            call("slow", vec![num(50.0)]),
            call("slow", vec![num(50.0)]),
        ],
    ))]);
    let started = Instant::now();
    let result = execute_script_async(&script, Some(globals), None).await.unwrap();
    let elapsed = started.elapsed();
    assert_number(&result, 100.0);
    assert!(
        elapsed >= Duration::from_millis(45),
        "waits did not happen: {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_millis(95),
        "argument evaluation did not overlap: {elapsed:?}"
    );
}

#[tokio::test]
async fn short_circuit_stays_sequential_in_async_mode() {
    // false && slow(50) must not wait at all.
    let globals = Scope::new();
    install_slow(&globals);
    let script = script(vec![ret(bin(
        BinaryOp::And,
        num(0.0),
        call("slow", vec![num(50.0)]),
    ))]);
    let started = Instant::now();
    let result = execute_script_async(&script, Some(globals), None).await.unwrap();
    assert_number(&result, 0.0);
    assert!(started.elapsed() < Duration::from_millis(40));
}

#[tokio::test]
async fn conditional_selects_a_single_branch_in_async_mode() {
    // if(1, slow(10), slow(200)) waits only for the taken branch.
    let globals = Scope::new();
    install_slow(&globals);
    let script = script(vec![ret(call(
        "if",
        vec![
            num(1.0),
            call("slow", vec![num(10.0)]),
            call("slow", vec![num(200.0)]),
        ],
    ))]);
    let started = Instant::now();
    let result = execute_script_async(&script, Some(globals), None).await.unwrap();
    assert_number(&result, 10.0);
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test]
async fn async_user_functions_await_their_bodies() {
    // async function wait(ms) { return slow(ms) + 1; }
    let globals = Scope::new();
    install_slow(&globals);
    let script = script(vec![
        async_function(
            "wait",
            &["ms"],
            vec![ret(bin(
                BinaryOp::Add,
                call("slow", vec![var("ms")]),
                num(1.0),
            ))],
        ),
        ret(call("wait", vec![num(10.0)])),
    ]);
    let result = execute_script_async(&script, Some(globals), None).await.unwrap();
    assert_number(&result, 11.0);
}

#[test]
fn async_callables_fail_cleanly_on_the_sync_path() {
    let globals = Scope::new();
    install_slow(&globals);
    let script = script(vec![ret(call("slow", vec![num(1.0)]))]);
    let err = execute_script(&script, Some(globals), None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Function \"slow\" is async and must be awaited"
    );
}

#[tokio::test]
async fn globals_written_by_parallel_arguments_converge() {
    // Both arguments bump the same global; the joined result observes both
    // increments even though their ordering is unspecified.
    let globals = Scope::new();
    install_add(&globals);
    globals.set("n", Value::Number(0.0));
    let shared = globals.clone();
    globals.set(
        "bump",
        Value::native_async(move |_args, _options| {
            let shared = shared.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                let n = shared.get("n").map(|v| v.to_number()).unwrap_or(0.0);
                shared.set("n", Value::Number(n + 1.0));
                Ok(Value::Number(1.0))
            }
            .boxed_local()
        }),
    );
    let script = script(vec![ret(call(
        "add",
        vec![call("bump", vec![]), call("bump", vec![])],
    ))]);
    let result = execute_script_async(&script, Some(globals.clone()), None)
        .await
        .unwrap();
    assert_number(&result, 2.0);
    assert_number(&globals.get("n").unwrap(), 2.0);
}
