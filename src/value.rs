//! CalcScript runtime value types.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use indexmap::IndexMap;

use crate::ast::Stmt;
use crate::error::CallError;
use crate::options::ExecOptions;

/// Signature of a synchronous host-native function: evaluated argument
/// array plus the options record.
pub type NativeFn = dyn Fn(&[Value], &ExecOptions) -> Result<Value, CallError>;

/// Signature of an asynchronous host-native function. The returned future is
/// `!Send`; the runtime drives it cooperatively on the host's executor.
pub type NativeAsyncFn =
    dyn Fn(Vec<Value>, ExecOptions) -> LocalBoxFuture<'static, Result<Value, CallError>>;

/// A runtime value.
///
/// Arrays and objects are mutable in place and compare by identity; objects
/// preserve key insertion order. Numbers are IEEE-754 doubles with
/// host-native operator behavior.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<IndexMap<String, Value>>>),
    Date(DateTime<Utc>),
    Function(Callable),
}

/// A callable value: host-native (sync or async) or user-defined.
#[derive(Clone)]
pub enum Callable {
    Native(Rc<NativeFn>),
    NativeAsync(Rc<NativeAsyncFn>),
    Script(Rc<ScriptFunction>),
}

/// A user-defined function created by a `function` statement. The body runs
/// against a fresh locals scope and the globals of the executing script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub is_async: bool,
}

impl Callable {
    /// Wrap a synchronous host function.
    pub fn native<F>(f: F) -> Callable
    where
        F: Fn(&[Value], &ExecOptions) -> Result<Value, CallError> + 'static,
    {
        Callable::Native(Rc::new(f))
    }

    /// Wrap an asynchronous host function.
    pub fn native_async<F>(f: F) -> Callable
    where
        F: Fn(Vec<Value>, ExecOptions) -> LocalBoxFuture<'static, Result<Value, CallError>>
            + 'static,
    {
        Callable::NativeAsync(Rc::new(f))
    }

    /// True when invoking this callable may suspend.
    pub fn is_async(&self) -> bool {
        match self {
            Callable::Native(_) => false,
            Callable::NativeAsync(_) => true,
            Callable::Script(f) => f.is_async,
        }
    }

    fn identity_eq(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::NativeAsync(a), Callable::NativeAsync(b)) => Rc::ptr_eq(a, b),
            (Callable::Script(a), Callable::Script(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Wrap a synchronous host function.
    pub fn native<F>(f: F) -> Value
    where
        F: Fn(&[Value], &ExecOptions) -> Result<Value, CallError> + 'static,
    {
        Value::Function(Callable::native(f))
    }

    /// Wrap an asynchronous host function.
    pub fn native_async<F>(f: F) -> Value
    where
        F: Fn(Vec<Value>, ExecOptions) -> LocalBoxFuture<'static, Result<Value, CallError>>
            + 'static,
    {
        Value::Function(Callable::native_async(f))
    }

    /// A fresh array value.
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// A fresh object value.
    pub fn object(entries: IndexMap<String, Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(entries)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Date(_) => "date",
            Value::Function(_) => "function",
        }
    }

    /// Host truthiness: `false`, `null`, `0`, `NaN`, and the empty string
    /// are falsy; everything else, including empty arrays and objects, is
    /// truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Function(_) => true,
        }
    }

    /// Numeric coercion with host primitive semantics: null is 0, booleans
    /// are 0/1, blank strings are 0, numeric strings parse, dates convert
    /// to epoch milliseconds, everything else is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Value::Date(d) => d.timestamp_millis() as f64,
            Value::Array(_) | Value::Object(_) | Value::Function(_) => f64::NAN,
        }
    }

    /// Strict identity-style equality: primitives by value (`NaN != NaN`),
    /// arrays, objects, and functions by reference, dates by instant. Never
    /// coerces across types.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.identity_eq(b),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_infinite() {
        write!(f, "{}", if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write_number(f, *n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Value::Function(Callable::Script(func)) => write!(f, "<function {}>", func.name),
            Value::Function(_) => write!(f, "<native function>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Function(Callable::Script(func)) => write!(f, "<function {}>", func.name),
            Value::Function(_) => write!(f, "<native function>"),
            other => write!(f, "{}", other),
        }
    }
}
