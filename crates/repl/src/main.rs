//! fi - the Fi language interpreter
//!
//! Usage:
//!   fi                # interactive REPL
//!   fi script.fi      # run a source file
//!
//! In the REPL, expression statements echo their value; in file mode
//! they are silently discarded. Exit codes follow the sysexits
//! convention: 65 for compile errors, 70 for runtime errors, 74 when the
//! script cannot be read.

use clap::Parser;
use fi_runtime::{InterpretResult, Vm};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fi language interpreter", long_about = None)]
struct Cli {
    /// Fi source file to run (starts a REPL if not given)
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match cli.script {
        Some(path) => run_file(&path),
        None => repl(),
    }
}

/// Log filtering comes from FI_LOG (tracing's usual directive syntax);
/// user-facing diagnostics bypass the logger entirely.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("FI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_file(path: &Path) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Could not open file {}: {}", path.display(), error);
            return ExitCode::from(74);
        }
    };

    info!(path = %path.display(), bytes = source.len(), "running script");
    let mut vm = Vm::new(false);
    exit_code(vm.interpret(&source))
}

fn exit_code(result: InterpretResult) -> ExitCode {
    match result {
        InterpretResult::NoErrors => ExitCode::SUCCESS,
        InterpretResult::CompileError => ExitCode::from(65),
        InterpretResult::RuntimeError => ExitCode::from(70),
    }
}

fn history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("fi").join("history.txt"))
}

fn repl() -> ExitCode {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(error) => {
            eprintln!("Could not start line editor: {}", error);
            return ExitCode::FAILURE;
        }
    };

    let history = history_path();
    if let Some(path) = &history {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        // a missing history file on first launch is fine
        let _ = editor.load_history(path);
    }

    let mut vm = Vm::new(true);

    loop {
        match editor.readline("fi>> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&line);
                vm.interpret(&line);
            }
            Err(ReadlineError::Interrupted) => {
                println!("Caught Ctrl+C, terminated.");
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(error) => {
                eprintln!("Could not read line: {}", error);
                break;
            }
        }
    }

    if let Some(path) = &history {
        let _ = editor.save_history(path);
    }

    ExitCode::SUCCESS
}
