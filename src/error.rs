//! Diagnostics for every pass of the interpreter.
//!
//! [`LoxError`] is the one error type the crate trades in.  The scanner,
//! parser, resolver, and runtime each get a variant, and each variant's
//! `Display` output is part of the tool's observable contract:
//!
//! - `[line N] Error: <msg>` for lexical problems, which only know a line;
//! - `[line N] Error at '<lexeme>': <msg>` for parse and resolve problems,
//!   which are anchored to a token (`place_of` turns the EOF token into
//!   `at end` instead of quoting an empty lexeme);
//! - `<msg>` followed by `[line N]` on its own line for runtime failures.
//!
//! I/O and UTF-8 errors pass through as transparent variants so `?` keeps
//! working at the crate's edges.  Constructors funnel through `logged`, which
//! traces every diagnostic as it is raised.
//!
//! [`Reporter`] is the presentation sink: it prints each diagnostic to
//! stderr and keeps the static/runtime flags the driver consults to choose
//! an exit code and to skip later passes.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error, anchored to the offending token.
    #[error("[line {line}] Error{place}: {message}")]
    Parse {
        message: String,
        place: String,
        line: usize,
    },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[line {line}] Error{place}: {message}")]
    Resolve {
        message: String,
        place: String,
        line: usize,
    },

    /// Runtime evaluation error.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// `at 'lexeme'` for ordinary tokens, `at end` for EOF.
fn place_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Scanner diagnostic; only a line number is available while lexing.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        LoxError::Lex {
            message: msg.into(),
            line,
        }
        .logged()
    }

    /// Parser diagnostic anchored to the offending token.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        LoxError::Parse {
            message: msg.into(),
            place: place_of(token),
            line: token.line,
        }
        .logged()
    }

    /// Resolver diagnostic anchored to the offending token.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        LoxError::Resolve {
            message: msg.into(),
            place: place_of(token),
            line: token.line,
        }
        .logged()
    }

    /// Runtime diagnostic; the interpreter supplies the line of the token it
    /// was evaluating.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        LoxError::Runtime {
            message: msg.into(),
            line,
        }
        .logged()
    }

    fn logged(self) -> Self {
        info!("diagnostic raised: {}", self);
        self
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Error presentation sink shared by every pass.
///
/// Writes diagnostics to stderr and classifies them so the driver can pick an
/// exit code (65 for static errors, 70 for runtime errors) and skip later
/// passes once an earlier one has failed.
#[derive(Debug, Default)]
pub struct Reporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter::default()
    }

    pub fn report(&mut self, error: &LoxError) {
        eprintln!("{}", error);

        match error {
            LoxError::Runtime { .. } => self.had_runtime_error = true,

            _ => self.had_error = true,
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clears both flags; called between REPL lines.
    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }
}
