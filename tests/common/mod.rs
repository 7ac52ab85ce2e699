//! Shared builders for the integration suites. Scripts arrive pre-parsed in
//! production, so tests assemble the model directly.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use calcscript::ast::{BinaryOp, Expr, Script, Stmt, UnaryOp};
use calcscript::{ExecOptions, Value};

pub fn script(statements: Vec<Stmt>) -> Script {
    Script::new(statements)
}

pub fn assign(name: &str, expr: Expr) -> Stmt {
    Stmt::Assign {
        name: name.to_string(),
        expr,
    }
}

pub fn function(name: &str, args: &[&str], statements: Vec<Stmt>) -> Stmt {
    Stmt::Function {
        name: name.to_string(),
        is_async: false,
        args: args.iter().map(|a| a.to_string()).collect(),
        statements,
    }
}

pub fn async_function(name: &str, args: &[&str], statements: Vec<Stmt>) -> Stmt {
    Stmt::Function {
        name: name.to_string(),
        is_async: true,
        args: args.iter().map(|a| a.to_string()).collect(),
        statements,
    }
}

pub fn jump(label: &str) -> Stmt {
    Stmt::Jump {
        label: label.to_string(),
        expr: None,
    }
}

pub fn jump_if(label: &str, expr: Expr) -> Stmt {
    Stmt::Jump {
        label: label.to_string(),
        expr: Some(expr),
    }
}

pub fn ret(expr: Expr) -> Stmt {
    Stmt::Return { expr: Some(expr) }
}

pub fn ret_null() -> Stmt {
    Stmt::Return { expr: None }
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr { expr }
}

pub fn label(name: &str) -> Stmt {
    Stmt::Label {
        name: name.to_string(),
    }
}

pub fn include(url: &str) -> Stmt {
    Stmt::Include {
        url: url.to_string(),
    }
}

pub fn num(value: f64) -> Expr {
    Expr::number(value)
}

pub fn text(value: &str) -> Expr {
    Expr::string(value)
}

pub fn var(name: &str) -> Expr {
    Expr::variable(name)
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(name, args)
}

pub fn bin(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::binary(op, left, right)
}

pub fn not(expr: Expr) -> Expr {
    Expr::unary(UnaryOp::Not, expr)
}

/// Options whose log sink appends into the returned buffer.
pub fn capturing_options() -> (ExecOptions, Rc<RefCell<Vec<String>>>) {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&lines);
    let options = ExecOptions::new().with_log_fn(move |line| sink.borrow_mut().push(line.to_string()));
    (options, lines)
}

pub fn assert_number(value: &Value, expected: f64) {
    match value {
        Value::Number(n) => assert_eq!(*n, expected, "expected {expected}, got {n}"),
        other => panic!("expected number {expected}, got {other:?}"),
    }
}
