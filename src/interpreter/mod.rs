//! Statement execution and the public entry points.
//!
//! Statement sequences are executed by integer cursor: `jump`/`label` are
//! the primitive control flow, and there is no recursion over structured
//! blocks. The executor exists in two mirrored forms; the `async` flag on a
//! user function selects which one runs its body.

mod asyncness;
mod expr;
mod expr_async;

pub use asyncness::is_async;

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use async_recursion::async_recursion;
use tracing::debug;

use crate::ast::{Expr, Script, Stmt};
use crate::env::Scope;
use crate::error::{RuntimeError, ScriptError};
use crate::options::ExecOptions;
use crate::value::{Callable, ScriptFunction, Value};

/// Synchronous entry point: merge the script-function library into
/// `globals` (without overwriting), reset the statement counter, run the
/// top-level statements, and return the script result (the value of a
/// top-level `return`, else null).
///
/// This path never suspends. An `include` statement cannot drive the async
/// fetch hook from here and fails with the standard include fault; scripts
/// that include must run under [`execute_script_async`].
pub fn execute_script(
    script: &Script,
    globals: Option<Scope>,
    options: Option<ExecOptions>,
) -> Result<Value, ScriptError> {
    let globals = globals.unwrap_or_default();
    let options = options.unwrap_or_default();
    prepare(&globals, &options);
    debug!(statements = script.statements.len(), "executing script");
    let started = Instant::now();
    let result = execute(&script.statements, &globals, None, &options)?;
    log_duration(&options, started);
    Ok(result)
}

/// Async mirror of [`execute_script`]. Identical semantics for any script
/// whose functions are all synchronous; suspends only at host-native async
/// invocations, include fetches, and parallel argument joins.
pub async fn execute_script_async(
    script: &Script,
    globals: Option<Scope>,
    options: Option<ExecOptions>,
) -> Result<Value, ScriptError> {
    let globals = globals.unwrap_or_default();
    let options = options.unwrap_or_default();
    prepare(&globals, &options);
    debug!(statements = script.statements.len(), "executing script (async)");
    let started = Instant::now();
    let result = execute_async(&script.statements, &globals, None, &options).await?;
    log_duration(&options, started);
    Ok(result)
}

/// Synchronous expression evaluation against optional scopes and options.
pub fn evaluate_expression(
    expr: &Expr,
    globals: Option<&Scope>,
    locals: Option<&Scope>,
    options: Option<&ExecOptions>,
    include_builtins: bool,
) -> Result<Value, ScriptError> {
    let owned_globals;
    let globals = match globals {
        Some(scope) => scope,
        None => {
            owned_globals = Scope::new();
            &owned_globals
        }
    };
    let owned_options;
    let options = match options {
        Some(options) => options,
        None => {
            owned_options = ExecOptions::default();
            &owned_options
        }
    };
    expr::evaluate(expr, globals, locals, options, include_builtins)
}

/// Async mirror of [`evaluate_expression`].
pub async fn evaluate_expression_async(
    expr: &Expr,
    globals: Option<&Scope>,
    locals: Option<&Scope>,
    options: Option<&ExecOptions>,
    include_builtins: bool,
) -> Result<Value, ScriptError> {
    let owned_globals;
    let globals = match globals {
        Some(scope) => scope,
        None => {
            owned_globals = Scope::new();
            &owned_globals
        }
    };
    let owned_options;
    let options = match options {
        Some(options) => options,
        None => {
            owned_options = ExecOptions::default();
            &owned_options
        }
    };
    expr_async::evaluate_async(expr, globals, locals, options, include_builtins).await
}

fn prepare(globals: &Scope, options: &ExecOptions) {
    for (name, callable) in options.builtins().script_functions() {
        globals.set_if_absent(name, Value::Function(callable.clone()));
    }
    options.reset_statement_count();
}

fn log_duration(options: &ExecOptions, started: Instant) {
    if options.has_log_fn() {
        options.log(&format!(
            "Script executed in {}ms",
            started.elapsed().as_millis()
        ));
    }
}

/// Execute a statement sequence by cursor. Returns the value of a `return`
/// statement, or null when execution falls off the end.
pub(crate) fn execute(
    stmts: &[Stmt],
    globals: &Scope,
    locals: Option<&Scope>,
    options: &ExecOptions,
) -> Result<Value, ScriptError> {
    let mut labels: HashMap<String, usize> = HashMap::new();
    let mut index = 0;
    while let Some(stmt) = stmts.get(index) {
        options.charge_statement()?;
        match stmt {
            Stmt::Assign { name, expr } => {
                let value = expr::evaluate(expr, globals, locals, options, true)?;
                assign(name, value, globals, locals);
            }
            Stmt::Function {
                name,
                is_async,
                args,
                statements,
            } => define_function(name, *is_async, args, statements, globals),
            Stmt::Jump { label, expr } => {
                let taken = match expr {
                    None => true,
                    Some(expr) => {
                        expr::evaluate(expr, globals, locals, options, true)?.is_truthy()
                    }
                };
                if taken {
                    index = resolve_label(stmts, &mut labels, label)?;
                    continue;
                }
            }
            Stmt::Return { expr } => {
                return match expr {
                    Some(expr) => expr::evaluate(expr, globals, locals, options, true),
                    None => Ok(Value::Null),
                };
            }
            Stmt::Expr { expr } => {
                expr::evaluate(expr, globals, locals, options, true)?;
            }
            Stmt::Label { .. } => {}
            Stmt::Include { url } => {
                // The fetch hook is async; nothing to drive it with here.
                let effective = options.apply_url_fn(url);
                return Err(include_failure(&effective, None).into());
            }
        }
        index += 1;
    }
    Ok(Value::Null)
}

/// Async mirror of [`execute`].
#[async_recursion(?Send)]
pub(crate) async fn execute_async(
    stmts: &[Stmt],
    globals: &Scope,
    locals: Option<&Scope>,
    options: &ExecOptions,
) -> Result<Value, ScriptError> {
    let mut labels: HashMap<String, usize> = HashMap::new();
    let mut index = 0;
    while let Some(stmt) = stmts.get(index) {
        options.charge_statement()?;
        match stmt {
            Stmt::Assign { name, expr } => {
                let value =
                    expr_async::evaluate_async(expr, globals, locals, options, true).await?;
                assign(name, value, globals, locals);
            }
            Stmt::Function {
                name,
                is_async,
                args,
                statements,
            } => define_function(name, *is_async, args, statements, globals),
            Stmt::Jump { label, expr } => {
                let taken = match expr {
                    None => true,
                    Some(expr) => {
                        expr_async::evaluate_async(expr, globals, locals, options, true)
                            .await?
                            .is_truthy()
                    }
                };
                if taken {
                    index = resolve_label(stmts, &mut labels, label)?;
                    continue;
                }
            }
            Stmt::Return { expr } => {
                return match expr {
                    Some(expr) => {
                        expr_async::evaluate_async(expr, globals, locals, options, true).await
                    }
                    None => Ok(Value::Null),
                };
            }
            Stmt::Expr { expr } => {
                expr_async::evaluate_async(expr, globals, locals, options, true).await?;
            }
            Stmt::Label { .. } => {}
            Stmt::Include { url } => run_include(url, globals, options).await?,
        }
        index += 1;
    }
    Ok(Value::Null)
}

/// An assignment writes into locals when present, else globals.
fn assign(name: &str, value: Value, globals: &Scope, locals: Option<&Scope>) {
    match locals {
        Some(scope) => scope.set(name, value),
        None => globals.set(name, value),
    }
}

/// A `function` statement creates a callable binding in globals.
fn define_function(name: &str, is_async: bool, params: &[String], body: &[Stmt], globals: &Scope) {
    let func = ScriptFunction {
        name: name.to_string(),
        params: params.to_vec(),
        body: body.to_vec(),
        is_async,
    };
    globals.set(name, Value::Function(Callable::Script(Rc::new(func))));
}

/// Locate `label` in the sequence, memoizing resolved indices so repeated
/// jumps to the same label cost one scan total.
fn resolve_label(
    stmts: &[Stmt],
    cache: &mut HashMap<String, usize>,
    label: &str,
) -> Result<usize, RuntimeError> {
    if let Some(&index) = cache.get(label) {
        return Ok(index);
    }
    let found = stmts
        .iter()
        .position(|stmt| matches!(stmt, Stmt::Label { name } if name == label));
    match found {
        Some(index) => {
            cache.insert(label.to_string(), index);
            Ok(index)
        }
        None => Err(RuntimeError::new(format!("Unknown jump label \"{label}\""))),
    }
}

/// Invoke a user function synchronously: fresh locals, positional binding
/// (missing arguments become null, extras are ignored), the caller's
/// globals and options.
pub(crate) fn call_script_function(
    func: &ScriptFunction,
    args: Vec<Value>,
    globals: &Scope,
    options: &ExecOptions,
) -> Result<Value, ScriptError> {
    let locals = bind_params(func, args);
    execute(&func.body, globals, Some(&locals), options)
}

/// Async mirror of [`call_script_function`]; used for `async`-flagged
/// function bodies.
pub(crate) async fn call_script_function_async(
    func: &ScriptFunction,
    args: Vec<Value>,
    globals: &Scope,
    options: &ExecOptions,
) -> Result<Value, ScriptError> {
    let locals = bind_params(func, args);
    execute_async(&func.body, globals, Some(&locals), options).await
}

fn bind_params(func: &ScriptFunction, args: Vec<Value>) -> Scope {
    let locals = Scope::new();
    let mut args = args.into_iter();
    for param in &func.params {
        locals.set(param.clone(), args.next().unwrap_or(Value::Null));
    }
    locals
}

/// Fetch, parse, and execute an included script against the caller's
/// globals. Locals are absent inside the include; the options clone shares
/// the statement counter and rewrites relative URLs against the including
/// URL's base.
async fn run_include(url: &str, globals: &Scope, options: &ExecOptions) -> Result<(), ScriptError> {
    let effective = options.apply_url_fn(url);
    debug!(url = %effective, "including script");

    let fetch_fn = options
        .fetch_fn
        .as_ref()
        .ok_or_else(|| include_failure(&effective, None))?;
    let response = fetch_fn(effective.clone())
        .await
        .map_err(|err| include_failure(&effective, Some(&err.to_string())))?;
    if !response.ok {
        return Err(include_failure(&effective, Some(&response.status_text)).into());
    }
    let body = match response.text() {
        Ok(text) => text.to_string(),
        Err(message) => return Err(include_failure(&effective, Some(message)).into()),
    };

    let parse_fn = options
        .parse_fn
        .as_ref()
        .ok_or_else(|| include_failure(&effective, Some("no parser configured")))?;
    let script = parse_fn(&body)
        .map_err(|err| err.with_prefix(format!("Included from \"{effective}\"")))?;

    let child_options = options.for_include(&effective);
    execute_async(&script.statements, globals, None, &child_options).await?;
    Ok(())
}

fn include_failure(url: &str, error: Option<&str>) -> RuntimeError {
    match error {
        Some(message) if !message.is_empty() => RuntimeError::new(format!(
            "Include of \"{url}\" failed with error: {message}"
        )),
        _ => RuntimeError::new(format!("Include of \"{url}\" failed")),
    }
}
