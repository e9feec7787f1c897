// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! monkey - command line front end for the Monkey engine
//!
//! Runs a file, evaluates inline code, or starts the interactive REPL.

mod repl;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use monkey_engine::{Backend, Engine};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "monkey",
    about = "Bytecode compiler and virtual machine for the Monkey language",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Monkey file to execute
    file: Option<PathBuf>,

    /// Evaluate code from the command line
    #[arg(short = 'e', long = "eval", value_name = "CODE")]
    eval: Option<String>,

    /// Execution backend
    #[arg(long, value_enum, default_value_t = EngineKind::Vm)]
    engine: EngineKind,

    /// Print the bytecode disassembly before running
    #[arg(long)]
    dump_bytecode: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    /// Bytecode virtual machine
    Vm,
    /// Tree-walking evaluator
    Eval,
}

impl From<EngineKind> for Backend {
    fn from(kind: EngineKind) -> Self {
        match kind {
            EngineKind::Vm => Backend::Vm,
            EngineKind::Eval => Backend::TreeWalker,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut engine = Engine::with_backend(cli.engine.into());

    if let Some(code) = &cli.eval {
        return Ok(run_source(&mut engine, code, cli.dump_bytecode, true));
    }

    if let Some(path) = &cli.file {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok(run_source(&mut engine, &source, cli.dump_bytecode, false));
    }

    let mut repl = repl::Repl::new(engine).context("failed to initialize REPL")?;
    repl.run()?;
    Ok(ExitCode::SUCCESS)
}

/// `RUST_LOG` wins over the defaults picked by `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "monkey=debug,monkey_engine=debug"
    } else {
        "monkey=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run_source(engine: &mut Engine, source: &str, dump_bytecode: bool, print_result: bool) -> ExitCode {
    if dump_bytecode {
        match engine.compile(source) {
            Ok(bytecode) => print!("{}", bytecode.disassemble()),
            Err(e) => {
                eprintln!("{}: {}", "Error".red().bold(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    match engine.eval(source) {
        Ok(value) => {
            if print_result && !value.is_null() {
                println!("{}", value);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
