//! Cinder - CLI
//!
//! Runs a script file, or starts an interactive prompt when no file is given.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cinder_core::{InterpretResult, VirtualMachine, VmConfig};

/// Exit status for an unreadable script file
const EXIT_IO_ERROR: i32 = 74;

#[derive(Parser)]
#[command(name = "cinder")]
#[command(about = "Run Cinder scripts")]
#[command(version)]
struct Cli {
    /// Script to run; starts a prompt when omitted
    path: Option<PathBuf>,

    /// Log every executed instruction
    #[arg(long)]
    trace: bool,

    /// Log the disassembly of each compiled chunk
    #[arg(long)]
    print_code: bool,

    /// Maximum operand stack depth
    #[arg(long, default_value_t = VmConfig::default().max_stack_size)]
    stack_size: usize,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = VmConfig::new()
        .with_max_stack_size(cli.stack_size)
        .with_trace_execution(cli.trace)
        .with_print_code(cli.print_code);
    let mut vm = VirtualMachine::new(config);

    match cli.path {
        Some(path) => run_file(&mut vm, &path),
        None => repl(&mut vm),
    }
}

/// Filter used when `RUST_LOG` is unset
fn default_directive(cli: &Cli) -> &'static str {
    if cli.trace {
        "warn,cinder=debug,cinder_core=trace"
    } else if cli.print_code {
        "warn,cinder=debug,cinder_core=debug"
    } else {
        "warn"
    }
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(cli)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn run_file(vm: &mut VirtualMachine, path: &Path) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "script unreadable");
            eprintln!("Could not read file \"{}\": {}", path.display(), e);
            process::exit(EXIT_IO_ERROR);
        }
    };

    tracing::debug!(path = %path.display(), bytes = source.len(), "running script");
    let result = vm.interpret(&source);
    tracing::debug!(?result, "script finished");
    if result != InterpretResult::Ok {
        process::exit(result.exit_code());
    }
}

fn repl(vm: &mut VirtualMachine) {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return;
        }

        match lines.next() {
            Some(Ok(line)) => {
                // Errors are already reported; the session carries on
                let result = vm.interpret(&line);
                tracing::debug!(?result, "line finished");
            }
            Some(Err(e)) => {
                tracing::debug!(error = %e, "stdin failed");
                eprintln!("Could not read input: {}", e);
                process::exit(EXIT_IO_ERROR);
            }
            None => {
                println!();
                return;
            }
        }
    }
}
