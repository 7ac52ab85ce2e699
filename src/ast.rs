//! The CalcScript script model: the pre-parsed tree produced by an external
//! parser and consumed by the runtime.
//!
//! The model is plain data. Every node derives serde with a tagged
//! representation so hosts can hand scripts to the runtime as JSON without
//! linking the parser into the same process.

use serde::{Deserialize, Serialize};

/// A parsed script: an ordered sequence of statements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub statements: Vec<Stmt>,
}

impl Script {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

/// A single statement. Control flow is unstructured: `Jump` and `Label` are
/// primitive, and statement sequences are executed by integer cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Stmt {
    /// `name = expr`; writes locals if present, else globals.
    Assign { name: String, expr: Expr },
    /// Defines a callable binding in globals.
    #[serde(rename_all = "camelCase")]
    Function {
        name: String,
        #[serde(default)]
        is_async: bool,
        #[serde(default)]
        args: Vec<String>,
        statements: Vec<Stmt>,
    },
    /// Transfer control to `label`, unconditionally or when `expr` is truthy.
    Jump {
        label: String,
        #[serde(default)]
        expr: Option<Expr>,
    },
    /// Exit the enclosing statement sequence with a value (null if absent).
    Return {
        #[serde(default)]
        expr: Option<Expr>,
    },
    /// Evaluate for side effects, discard the value.
    Expr { expr: Expr },
    /// Jump target marker; inert when fallen through.
    Label { name: String },
    /// Fetch, parse, and execute another script against the same globals.
    Include { url: String },
}

/// A single expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Expr {
    Number { value: f64 },
    String { value: String },
    Variable { name: String },
    /// A call by name; resolution is dynamic (locals, globals, builtins).
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, expr: Box<Expr> },
    Group { expr: Box<Expr> },
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Expr::Number { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String {
            value: value.into(),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable { name: name.into() }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, expr: Expr) -> Self {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn group(expr: Expr) -> Self {
        Expr::Group {
            expr: Box::new(expr),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "**")]
    Pow,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    Neg,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expr_builders_round_trip() {
        let expr = Expr::binary(
            BinaryOp::Add,
            Expr::number(2.0),
            Expr::binary(BinaryOp::Mul, Expr::number(3.0), Expr::number(4.0)),
        );
        match &expr {
            Expr::Binary { op, left, .. } => {
                assert_eq!(*op, BinaryOp::Add);
                assert_eq!(**left, Expr::number(2.0));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }
}
