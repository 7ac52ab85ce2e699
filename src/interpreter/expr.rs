//! Synchronous expression evaluator.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::env::Scope;
use crate::error::{CallError, RuntimeError, ScriptError};
use crate::options::ExecOptions;
use crate::value::{Callable, Value};

use super::call_script_function;

/// Recursively evaluate `expr`. Never suspends; an async callable reached
/// on this path is a runtime fault.
pub fn evaluate(
    expr: &Expr,
    globals: &Scope,
    locals: Option<&Scope>,
    options: &ExecOptions,
    include_builtins: bool,
) -> Result<Value, ScriptError> {
    match expr {
        Expr::Number { value } => Ok(Value::Number(*value)),
        Expr::String { value } => Ok(Value::String(value.clone())),
        Expr::Variable { name } => Ok(lookup_variable(name, globals, locals)),
        Expr::Unary { op, expr } => {
            let value = evaluate(expr, globals, locals, options, include_builtins)?;
            Ok(apply_unary(*op, &value))
        }
        Expr::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => {
            let lhs = evaluate(left, globals, locals, options, include_builtins)?;
            if !lhs.is_truthy() {
                Ok(lhs)
            } else {
                evaluate(right, globals, locals, options, include_builtins)
            }
        }
        Expr::Binary {
            op: BinaryOp::Or,
            left,
            right,
        } => {
            let lhs = evaluate(left, globals, locals, options, include_builtins)?;
            if lhs.is_truthy() {
                Ok(lhs)
            } else {
                evaluate(right, globals, locals, options, include_builtins)
            }
        }
        Expr::Binary { op, left, right } => {
            let lhs = evaluate(left, globals, locals, options, include_builtins)?;
            let rhs = evaluate(right, globals, locals, options, include_builtins)?;
            Ok(apply_binary(*op, &lhs, &rhs))
        }
        Expr::Group { expr } => evaluate(expr, globals, locals, options, include_builtins),
        Expr::Call { name, args } => call(name, args, globals, locals, options, include_builtins),
    }
}

/// Name resolution for variable references: the three reserved names first,
/// then locals (when present), then globals. Undefined names are null, not
/// errors.
fn lookup_variable(name: &str, globals: &Scope, locals: Option<&Scope>) -> Value {
    match name {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => locals
            .and_then(|scope| scope.get(name))
            .or_else(|| globals.get(name))
            .unwrap_or(Value::Null),
    }
}

pub(crate) fn apply_unary(op: UnaryOp, value: &Value) -> Value {
    match op {
        UnaryOp::Not => Value::Bool(!value.is_truthy()),
        UnaryOp::Neg => Value::Number(-value.to_number()),
    }
}

pub(crate) fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                Value::String(format!("{left}{right}"))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Mod => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Pow => Value::Number(left.to_number().powf(right.to_number())),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordered = match (left, right) {
                (Value::String(a), Value::String(b)) => compare(op, a.as_str(), b.as_str()),
                _ => compare(op, left.to_number(), right.to_number()),
            };
            Value::Bool(ordered)
        }
        BinaryOp::Eq => Value::Bool(left.strict_eq(right)),
        BinaryOp::Ne => Value::Bool(!left.strict_eq(right)),
        BinaryOp::And | BinaryOp::Or => {
            unreachable!("short-circuit operators are evaluated lazily")
        }
    }
}

fn compare<T: PartialOrd>(op: BinaryOp, a: T, b: T) -> bool {
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        _ => false,
    }
}

fn call(
    name: &str,
    args: &[Expr],
    globals: &Scope,
    locals: Option<&Scope>,
    options: &ExecOptions,
    include_builtins: bool,
) -> Result<Value, ScriptError> {
    // `if` defers argument evaluation; it is checked before any resolution
    // so it cannot be shadowed.
    if name == "if" {
        return conditional(args, globals, locals, options, include_builtins);
    }
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(evaluate(arg, globals, locals, options, include_builtins)?);
    }
    invoke(name, values, globals, locals, options, include_builtins)
}

/// `if(condition, then, else)`: evaluates the condition and exactly one
/// branch; a missing branch contributes null without being evaluated.
fn conditional(
    args: &[Expr],
    globals: &Scope,
    locals: Option<&Scope>,
    options: &ExecOptions,
    include_builtins: bool,
) -> Result<Value, ScriptError> {
    let condition = match args.first() {
        Some(expr) => evaluate(expr, globals, locals, options, include_builtins)?,
        None => Value::Null,
    };
    let branch = if condition.is_truthy() {
        args.get(1)
    } else {
        args.get(2)
    };
    match branch {
        Some(expr) => evaluate(expr, globals, locals, options, include_builtins),
        None => Ok(Value::Null),
    }
}

fn invoke(
    name: &str,
    values: Vec<Value>,
    globals: &Scope,
    locals: Option<&Scope>,
    options: &ExecOptions,
    include_builtins: bool,
) -> Result<Value, ScriptError> {
    match resolve_callee(name, globals, locals, options, include_builtins) {
        Resolution::Callee(Value::Function(Callable::Native(f))) => {
            contain_native(name, options, f(&values, options))
        }
        Resolution::Callee(Value::Function(Callable::Script(func))) if !func.is_async => {
            contain_script(
                name,
                options,
                call_script_function(&func, values, globals, options),
            )
        }
        Resolution::Callee(Value::Function(_)) => Err(RuntimeError::new(format!(
            "Function \"{name}\" is async and must be awaited"
        ))
        .into()),
        Resolution::Callee(_) => not_callable(name, options),
        Resolution::GetGlobal => Ok(get_global(&values, globals)),
        Resolution::SetGlobal => Ok(set_global(&values, globals)),
        Resolution::Undefined => Err(undefined_function(name)),
    }
}

/// Outcome of the three-tier callee lookup.
pub(crate) enum Resolution {
    Callee(Value),
    GetGlobal,
    SetGlobal,
    Undefined,
}

/// Locals, then globals, then built-in expression functions (only when
/// `include_builtins`), then the two globals accessors.
pub(crate) fn resolve_callee(
    name: &str,
    globals: &Scope,
    locals: Option<&Scope>,
    options: &ExecOptions,
    include_builtins: bool,
) -> Resolution {
    if let Some(value) = locals.and_then(|scope| scope.get(name)) {
        return Resolution::Callee(value);
    }
    if let Some(value) = globals.get(name) {
        return Resolution::Callee(value);
    }
    if include_builtins {
        if let Some(callable) = options.builtins().expression(name) {
            return Resolution::Callee(Value::Function(callable.clone()));
        }
    }
    match name {
        "getGlobal" => Resolution::GetGlobal,
        "setGlobal" => Resolution::SetGlobal,
        _ => Resolution::Undefined,
    }
}

pub(crate) fn get_global(values: &[Value], globals: &Scope) -> Value {
    let key = values.first().cloned().unwrap_or(Value::Null).to_string();
    globals.get(&key).unwrap_or(Value::Null)
}

pub(crate) fn set_global(values: &[Value], globals: &Scope) -> Value {
    let key = values.first().cloned().unwrap_or(Value::Null).to_string();
    let value = values.get(1).cloned().unwrap_or(Value::Null);
    globals.set(key, value);
    Value::Null
}

/// Fault policy for host-native callees: runtime errors propagate, anything
/// else is logged and replaced by a null result.
pub(crate) fn contain_native(
    name: &str,
    options: &ExecOptions,
    result: Result<Value, CallError>,
) -> Result<Value, ScriptError> {
    match result {
        Ok(value) => Ok(value),
        Err(CallError::Runtime(err)) => Err(err.into()),
        Err(CallError::Host(err)) => {
            options.log(&format!(
                "Error: Function \"{name}\" failed with error: {err}"
            ));
            Ok(Value::Null)
        }
    }
}

/// Same fault policy for user-defined callees.
pub(crate) fn contain_script(
    name: &str,
    options: &ExecOptions,
    result: Result<Value, ScriptError>,
) -> Result<Value, ScriptError> {
    match result {
        Ok(value) => Ok(value),
        Err(ScriptError::Runtime(err)) => Err(err.into()),
        Err(err) => {
            options.log(&format!(
                "Error: Function \"{name}\" failed with error: {err}"
            ));
            Ok(Value::Null)
        }
    }
}

pub(crate) fn not_callable(name: &str, options: &ExecOptions) -> Result<Value, ScriptError> {
    options.log(&format!(
        "Error: Function \"{name}\" failed with error: \"{name}\" is not a function"
    ));
    Ok(Value::Null)
}

pub(crate) fn undefined_function(name: &str) -> ScriptError {
    RuntimeError::new(format!("Undefined function \"{name}\"")).into()
}
