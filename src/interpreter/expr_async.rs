//! Asynchronous expression evaluator: a mirror of the synchronous one with
//! cooperative suspension at host-native async invocations and parallel
//! argument evaluation.

use async_recursion::async_recursion;
use futures::future::join_all;

use crate::ast::{BinaryOp, Expr};
use crate::env::Scope;
use crate::error::ScriptError;
use crate::options::ExecOptions;
use crate::value::{Callable, Value};

use super::asyncness::is_async;
use super::expr::{
    apply_binary, apply_unary, contain_native, contain_script, evaluate, get_global, not_callable,
    resolve_callee, set_global, undefined_function, Resolution,
};
use super::{call_script_function, call_script_function_async};

/// Recursively evaluate `expr`, delegating provably-synchronous subtrees to
/// the synchronous evaluator. Semantically equivalent to [`evaluate`] for
/// any expression free of async callables.
#[async_recursion(?Send)]
pub async fn evaluate_async(
    expr: &Expr,
    globals: &Scope,
    locals: Option<&Scope>,
    options: &ExecOptions,
    include_builtins: bool,
) -> Result<Value, ScriptError> {
    if !is_async(expr, globals, locals) {
        return evaluate(expr, globals, locals, options, include_builtins);
    }
    match expr {
        Expr::Unary { op, expr } => {
            let value = evaluate_async(expr, globals, locals, options, include_builtins).await?;
            Ok(apply_unary(*op, &value))
        }
        Expr::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => {
            let lhs = evaluate_async(left, globals, locals, options, include_builtins).await?;
            if !lhs.is_truthy() {
                Ok(lhs)
            } else {
                evaluate_async(right, globals, locals, options, include_builtins).await
            }
        }
        Expr::Binary {
            op: BinaryOp::Or,
            left,
            right,
        } => {
            let lhs = evaluate_async(left, globals, locals, options, include_builtins).await?;
            if lhs.is_truthy() {
                Ok(lhs)
            } else {
                evaluate_async(right, globals, locals, options, include_builtins).await
            }
        }
        Expr::Binary { op, left, right } => {
            let lhs = evaluate_async(left, globals, locals, options, include_builtins).await?;
            let rhs = evaluate_async(right, globals, locals, options, include_builtins).await?;
            Ok(apply_binary(*op, &lhs, &rhs))
        }
        Expr::Group { expr } => {
            evaluate_async(expr, globals, locals, options, include_builtins).await
        }
        Expr::Call { name, args } => {
            call_async(name, args, globals, locals, options, include_builtins).await
        }
        // Literals and variables never contain async work; the fast path
        // above has already handled them.
        Expr::Number { .. } | Expr::String { .. } | Expr::Variable { .. } => {
            evaluate(expr, globals, locals, options, include_builtins)
        }
    }
}

async fn call_async(
    name: &str,
    args: &[Expr],
    globals: &Scope,
    locals: Option<&Scope>,
    options: &ExecOptions,
    include_builtins: bool,
) -> Result<Value, ScriptError> {
    if name == "if" {
        return conditional_async(args, globals, locals, options, include_builtins).await;
    }
    // Arguments of a non-`if` call are evaluated in parallel and joined.
    let results = join_all(
        args.iter()
            .map(|arg| evaluate_async(arg, globals, locals, options, include_builtins)),
    )
    .await;
    let mut values = Vec::with_capacity(results.len());
    for result in results {
        values.push(result?);
    }
    invoke_async(name, values, globals, locals, options, include_builtins).await
}

/// `if` stays sequential and branch-selective even in async mode.
async fn conditional_async(
    args: &[Expr],
    globals: &Scope,
    locals: Option<&Scope>,
    options: &ExecOptions,
    include_builtins: bool,
) -> Result<Value, ScriptError> {
    let condition = match args.first() {
        Some(expr) => evaluate_async(expr, globals, locals, options, include_builtins).await?,
        None => Value::Null,
    };
    let branch = if condition.is_truthy() {
        args.get(1)
    } else {
        args.get(2)
    };
    match branch {
        Some(expr) => evaluate_async(expr, globals, locals, options, include_builtins).await,
        None => Ok(Value::Null),
    }
}

async fn invoke_async(
    name: &str,
    values: Vec<Value>,
    globals: &Scope,
    locals: Option<&Scope>,
    options: &ExecOptions,
    include_builtins: bool,
) -> Result<Value, ScriptError> {
    match resolve_callee(name, globals, locals, options, include_builtins) {
        Resolution::Callee(Value::Function(callable)) => match callable {
            Callable::Native(f) => contain_native(name, options, f(&values, options)),
            Callable::NativeAsync(f) => {
                contain_native(name, options, f(values, options.clone()).await)
            }
            Callable::Script(func) => {
                let result = if func.is_async {
                    call_script_function_async(&func, values, globals, options).await
                } else {
                    call_script_function(&func, values, globals, options)
                };
                contain_script(name, options, result)
            }
        },
        Resolution::Callee(_) => not_callable(name, options),
        Resolution::GetGlobal => Ok(get_global(&values, globals)),
        Resolution::SetGlobal => Ok(set_global(&values, globals)),
        Resolution::Undefined => Err(undefined_function(name)),
    }
}
