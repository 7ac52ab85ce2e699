//! Execution options: the statement quota, the shared statement counter,
//! and the host hooks.

use std::cell::Cell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::ast::Script;
use crate::builtins::BuiltinSet;
use crate::error::{ParserError, RuntimeError};
use crate::url::{base_url, resolve_against};

/// Default statement quota when the host does not configure one.
pub const DEFAULT_MAX_STATEMENTS: i64 = 10_000_000;

/// Sink for duration reports, function-failure notices, and `debugLog`
/// output.
pub type LogFn = dyn Fn(&str);

/// URL-rewrite hook applied to include URLs before fetch.
pub type UrlFn = dyn Fn(&str) -> String;

/// Async URL fetcher supplied by the host.
pub type FetchFn = dyn Fn(String) -> LocalBoxFuture<'static, anyhow::Result<FetchResponse>>;

/// External-parser seam: turns a fetched script body into a script model.
pub type ParseFn = dyn Fn(&str) -> Result<Script, ParserError>;

/// The http-response-like value produced by [`FetchFn`].
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub ok: bool,
    pub status_text: String,
    body: Result<String, String>,
}

impl FetchResponse {
    /// A successful response carrying the script body.
    pub fn success(body: impl Into<String>) -> Self {
        Self {
            ok: true,
            status_text: String::new(),
            body: Ok(body.into()),
        }
    }

    /// A failed response; `status_text` becomes the include error message.
    pub fn failure(status_text: impl Into<String>) -> Self {
        Self {
            ok: false,
            status_text: status_text.into(),
            body: Err(String::new()),
        }
    }

    /// A nominally-ok response whose body cannot be read.
    pub fn broken_body(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            status_text: String::new(),
            body: Err(message.into()),
        }
    }

    /// The body text, or the read-failure message.
    pub fn text(&self) -> Result<&str, &str> {
        match &self.body {
            Ok(text) => Ok(text),
            Err(message) => Err(message),
        }
    }
}

/// Configuration record threaded through every evaluator call.
///
/// Cloning shares the statement counter: includes and nested function calls
/// all charge the same quota.
#[derive(Clone)]
pub struct ExecOptions {
    pub(crate) max_statements: i64,
    statement_count: Rc<Cell<i64>>,
    pub(crate) log_fn: Option<Rc<LogFn>>,
    pub(crate) fetch_fn: Option<Rc<FetchFn>>,
    pub(crate) url_fn: Option<Rc<UrlFn>>,
    pub(crate) parse_fn: Option<Rc<ParseFn>>,
    builtins: Rc<BuiltinSet>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            max_statements: DEFAULT_MAX_STATEMENTS,
            statement_count: Rc::new(Cell::new(0)),
            log_fn: None,
            fetch_fn: None,
            url_fn: None,
            parse_fn: None,
            builtins: Rc::new(BuiltinSet::standard()),
        }
    }
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the statement quota; zero or negative disables it.
    pub fn with_max_statements(mut self, max_statements: i64) -> Self {
        self.max_statements = max_statements;
        self
    }

    pub fn with_log_fn(mut self, log_fn: impl Fn(&str) + 'static) -> Self {
        self.log_fn = Some(Rc::new(log_fn));
        self
    }

    pub fn with_fetch_fn(
        mut self,
        fetch_fn: impl Fn(String) -> LocalBoxFuture<'static, anyhow::Result<FetchResponse>> + 'static,
    ) -> Self {
        self.fetch_fn = Some(Rc::new(fetch_fn));
        self
    }

    pub fn with_url_fn(mut self, url_fn: impl Fn(&str) -> String + 'static) -> Self {
        self.url_fn = Some(Rc::new(url_fn));
        self
    }

    pub fn with_parse_fn(
        mut self,
        parse_fn: impl Fn(&str) -> Result<Script, ParserError> + 'static,
    ) -> Self {
        self.parse_fn = Some(Rc::new(parse_fn));
        self
    }

    pub fn with_builtins(mut self, builtins: BuiltinSet) -> Self {
        self.builtins = Rc::new(builtins);
        self
    }

    pub fn builtins(&self) -> &BuiltinSet {
        &self.builtins
    }

    /// Statements executed so far under this counter.
    pub fn statement_count(&self) -> i64 {
        self.statement_count.get()
    }

    pub(crate) fn reset_statement_count(&self) {
        self.statement_count.set(0);
    }

    /// Per-statement preamble: bump the counter, then enforce the quota.
    pub(crate) fn charge_statement(&self) -> Result<(), RuntimeError> {
        let count = self.statement_count.get() + 1;
        self.statement_count.set(count);
        if self.max_statements > 0 && count > self.max_statements {
            return Err(RuntimeError::new(format!(
                "Exceeded maximum script statements ({})",
                self.max_statements
            )));
        }
        Ok(())
    }

    /// Write a line to the host log sink, if one is configured.
    pub fn log(&self, line: &str) {
        if let Some(log_fn) = &self.log_fn {
            log_fn(line);
        }
    }

    pub(crate) fn has_log_fn(&self) -> bool {
        self.log_fn.is_some()
    }

    /// The effective URL for an include: the raw URL passed through the
    /// configured rewrite hook.
    pub(crate) fn apply_url_fn(&self, url: &str) -> String {
        match &self.url_fn {
            Some(url_fn) => url_fn(url),
            None => url.to_string(),
        }
    }

    /// Options for an included script: same counter, same hooks, but the
    /// URL hook now resolves relative URLs against the including URL's base.
    pub(crate) fn for_include(&self, including_url: &str) -> ExecOptions {
        let base = base_url(including_url).to_string();
        let mut child = self.clone();
        child.url_fn = Some(Rc::new(move |url: &str| resolve_against(&base, url)));
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_shared_between_clones() {
        let options = ExecOptions::new().with_max_statements(2);
        let clone = options.clone();
        assert!(options.charge_statement().is_ok());
        assert!(clone.charge_statement().is_ok());
        let err = options.charge_statement().unwrap_err();
        assert_eq!(err.message, "Exceeded maximum script statements (2)");
    }

    #[test]
    fn zero_quota_disables_the_limit() {
        let options = ExecOptions::new().with_max_statements(0);
        for _ in 0..100 {
            options.charge_statement().expect("quota disabled");
        }
        assert_eq!(options.statement_count(), 100);
    }

    #[test]
    fn include_options_resolve_relative_urls() {
        let options = ExecOptions::new();
        let child = options.for_include("https://h/a/b.cs");
        assert_eq!(child.apply_url_fn("c.cs"), "https://h/a/c.cs");
        assert_eq!(child.apply_url_fn("https://x/y.cs"), "https://x/y.cs");
    }

    #[test]
    fn include_options_replace_the_url_hook() {
        let options = ExecOptions::new().with_url_fn(|url| format!("mirror/{url}"));
        assert_eq!(options.apply_url_fn("b.cs"), "mirror/b.cs");
        let child = options.for_include("https://h/a/b.cs");
        // The outer rewrite no longer applies inside the include.
        assert_eq!(child.apply_url_fn("c.cs"), "https://h/a/c.cs");
    }
}
