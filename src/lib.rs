//! CalcScript runtime: a tree-walking interpreter for pre-parsed script
//! models, embeddable behind host-provided global bindings.
//!
//! The runtime evaluates a [`ast::Script`] against a shared globals
//! [`env::Scope`], in one of two mirrored modes: strict synchronous
//! ([`execute_script`]) and cooperative asynchronous
//! ([`execute_script_async`]). The async mode exists to await host I/O and
//! is semantically identical to the sync mode for any script whose
//! functions are all synchronous.
//!
//! Execution is bounded by a statement quota ([`options::ExecOptions`]),
//! and scripts compose through a sandboxed `include` facility whose
//! fetching, URL rewriting, and parsing are all host hooks.
//!
//! ```
//! use calcscript::ast::{BinaryOp, Expr, Script, Stmt};
//! use calcscript::execute_script;
//!
//! // a = 2 + 3 * 4; return a
//! let script = Script::new(vec![
//!     Stmt::Assign {
//!         name: "a".into(),
//!         expr: Expr::binary(
//!             BinaryOp::Add,
//!             Expr::number(2.0),
//!             Expr::binary(BinaryOp::Mul, Expr::number(3.0), Expr::number(4.0)),
//!         ),
//!     },
//!     Stmt::Return {
//!         expr: Some(Expr::variable("a")),
//!     },
//! ]);
//! let result = execute_script(&script, None, None).unwrap();
//! assert_eq!(result.to_string(), "14");
//! ```

pub mod ast;
pub mod builtins;
pub mod env;
pub mod error;
mod interpreter;
pub mod options;
pub mod url;
pub mod value;

pub use builtins::BuiltinSet;
pub use env::Scope;
pub use error::{CallError, ParserError, RuntimeError, ScriptError};
pub use interpreter::{
    evaluate_expression, evaluate_expression_async, execute_script, execute_script_async, is_async,
};
pub use options::{ExecOptions, FetchResponse, DEFAULT_MAX_STATEMENTS};
pub use url::{base_url, is_relative_url};
pub use value::{Callable, ScriptFunction, Value};
