//! Structural detection of asynchronous subtrees.

use crate::ast::Expr;
use crate::env::Scope;
use crate::value::Value;

/// True when evaluating `expr` may suspend: it calls an async callable
/// (resolved through locals then globals), directly or in any subtree.
///
/// The predicate is advisory but sound in one direction: a `false` result
/// proves the subtree synchronous, so the fast path may evaluate it without
/// suspension. Built-in expression functions are synchronous by
/// construction and never consulted here.
pub fn is_async(expr: &Expr, globals: &Scope, locals: Option<&Scope>) -> bool {
    match expr {
        Expr::Call { name, args } => {
            let resolved = locals
                .and_then(|scope| scope.get(name))
                .or_else(|| globals.get(name));
            if let Some(Value::Function(callable)) = resolved {
                if callable.is_async() {
                    return true;
                }
            }
            args.iter().any(|arg| is_async(arg, globals, locals))
        }
        Expr::Binary { left, right, .. } => {
            is_async(left, globals, locals) || is_async(right, globals, locals)
        }
        Expr::Unary { expr, .. } | Expr::Group { expr } => is_async(expr, globals, locals),
        Expr::Number { .. } | Expr::String { .. } | Expr::Variable { .. } => false,
    }
}
