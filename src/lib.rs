pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use std::io::Write;

use crate::error::Reporter;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// Runs one unit of Lox source through the full pipeline against an existing
/// interpreter session.
///
/// Scan and parse errors are reported but do not stop the earlier passes from
/// finishing; once anything static has been reported the program is neither
/// resolved nor executed.  Runtime errors abort the statement list and leave
/// the session usable, which is what the REPL relies on.
pub fn run<W: Write>(source: &str, interpreter: &mut Interpreter<W>, reporter: &mut Reporter) {
    let mut tokens: Vec<Token> = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(error) => reporter.report(&error),
        }
    }

    let mut parser = Parser::new(tokens, reporter);
    let statements = parser.parse();

    if reporter.had_error() {
        return;
    }

    let mut resolver = Resolver::new(interpreter, reporter);
    resolver.resolve(&statements);

    if reporter.had_error() {
        return;
    }

    interpreter.interpret(&statements, reporter);
}
