//! # Inspect CLI
//!
//! The binary is thin: the CLI lives in `src/cli/`, and this file only invokes
//! `cli::run()` and turns errors into exit codes.
//!
//! ## Workspace Structure
//!
//! - `crates/inspectapp/` holds the record model, storage, NCR lifecycle and export.
//! - `crates/inspect/` is this client. It depends on `inspectapp` and nothing in
//!   the library knows about terminals.
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/inspect/src/cli/)                        │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Kind dispatch + context wiring (commands.rs)             │
//! │  - Terminal rendering (render.rs)                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/inspectapp/src/api.rs)                   │
//! │  - One facade over every record collection                  │
//! │  - Returns structured `CmdResult` values                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (crates/inspectapp/src/commands/*)           │
//! │  - Business rules + data access                             │
//! │  - No knowledge of stdout/stderr or process exits           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Exit Codes
//!
//! - `0` on success
//! - `2` when a lifecycle rule refused the operation (closing an NCR without a
//!   signed scan, reopening a closed NCR)
//! - `1` for anything else: unknown ids, unreadable files, bad arguments

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(cli::exit_code(&e));
    }
}
