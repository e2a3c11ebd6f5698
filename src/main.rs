use std::fs;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser as ClapParser;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use rox::error::Reporter;
use rox::interpreter::Interpreter;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for the Lox language", long_about = None)]
pub struct Cli {
    /// Script to execute; starts a REPL when omitted.
    script: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .env()
        .init()
        .ok();

    let args: Cli = Cli::parse();

    match args.script.as_slice() {
        [] => run_prompt()?,

        [script] => run_file(script)?,

        _ => {
            println!("Usage: rox [script]");
            process::exit(64);
        }
    }

    Ok(())
}

fn run_file(path: &PathBuf) -> anyhow::Result<()> {
    let source: String = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut reporter = Reporter::new();
    let mut interpreter = Interpreter::new(io::stdout(), false);

    rox::run(&source, &mut interpreter, &mut reporter);

    if reporter.had_error() {
        process::exit(65);
    }

    if reporter.had_runtime_error() {
        process::exit(70);
    }

    Ok(())
}

/// Line-oriented REPL.  Globals and resolved bindings persist across lines;
/// error flags do not.
fn run_prompt() -> anyhow::Result<()> {
    let stdin = io::stdin();

    let mut reporter = Reporter::new();
    let mut interpreter = Interpreter::new(io::stdout(), true);

    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let nbytes: usize = stdin.read_line(&mut line)?;
        if nbytes == 0 {
            break;
        }

        rox::run(&line, &mut interpreter, &mut reporter);
        reporter.reset();
    }

    Ok(())
}
