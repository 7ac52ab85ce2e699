//! The two read-only built-in tables consulted after locals and globals:
//! expression-level functions (callable anywhere an expression can call)
//! and script-level functions (merged into globals by the entry points).

use std::collections::HashMap;

use futures::future::LocalBoxFuture;

use crate::error::CallError;
use crate::options::ExecOptions;
use crate::value::{Callable, Value};

/// Host-supplied built-in function tables.
#[derive(Clone, Default)]
pub struct BuiltinSet {
    expression: HashMap<String, Callable>,
    script: HashMap<String, Callable>,
}

impl BuiltinSet {
    /// An empty set: no expression builtins, nothing merged into globals.
    pub fn new() -> Self {
        Self::default()
    }

    /// The minimal library the runtime contract itself references:
    /// `debugLog`, which writes its arguments through the log sink.
    pub fn standard() -> Self {
        let mut set = Self::new();
        set.register_expression_fn("debugLog", debug_log);
        set
    }

    pub fn register_expression(&mut self, name: impl Into<String>, callable: Callable) {
        self.expression.insert(name.into(), callable);
    }

    pub fn register_script(&mut self, name: impl Into<String>, callable: Callable) {
        self.script.insert(name.into(), callable);
    }

    /// Register a plain sync function as an expression builtin.
    pub fn register_expression_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value], &ExecOptions) -> Result<Value, CallError> + 'static,
    {
        self.register_expression(name, Callable::native(f));
    }

    /// Register an async function as an expression builtin.
    pub fn register_expression_async_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Vec<Value>, ExecOptions) -> LocalBoxFuture<'static, Result<Value, CallError>>
            + 'static,
    {
        self.register_expression(name, Callable::native_async(f));
    }

    /// Register a plain sync function in the script-function library.
    pub fn register_script_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value], &ExecOptions) -> Result<Value, CallError> + 'static,
    {
        self.register_script(name, Callable::native(f));
    }

    pub fn expression(&self, name: &str) -> Option<&Callable> {
        self.expression.get(name)
    }

    /// The script-function library merged into globals by the entry points.
    pub fn script_functions(&self) -> impl Iterator<Item = (&str, &Callable)> {
        self.script.iter().map(|(name, callable)| (name.as_str(), callable))
    }
}

fn debug_log(args: &[Value], options: &ExecOptions) -> Result<Value, CallError> {
    let line = args
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    options.log(&line);
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn debug_log_writes_through_the_sink() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&lines);
        let options = ExecOptions::new().with_log_fn(move |line| sink.borrow_mut().push(line.to_string()));

        let set = BuiltinSet::standard();
        let callable = set.expression("debugLog").expect("standard set has debugLog");
        let Callable::Native(f) = callable else {
            panic!("debugLog is a sync native");
        };
        let result = f(&[Value::from("x"), Value::Number(2.0)], &options).unwrap();
        assert!(result.strict_eq(&Value::Null));
        assert_eq!(lines.borrow().as_slice(), ["x 2"]);
    }
}
