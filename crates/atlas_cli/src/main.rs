//! CLI entry point for the Atlas bookmark manager.
//!
//! # Responsibility
//! - Parse arguments, bootstrap logging and the store handle, dispatch.
//! - Keep process exit codes stable: 0 on success, 1 on any error.

mod cli;

fn main() {
    if let Err(err) = cli::run_from_args() {
        eprintln!("atlas error: {err:#}");
        std::process::exit(1);
    }
}
