//! # CLI Behavior
//!
//! This is one client for `inspectapp`. It is the only place that knows about
//! terminal I/O, colors and exit codes.
//!
//! ## Naked Execution (`inspect`)
//!
//! Running `inspect` with no arguments prints the dashboard: record counts per
//! collection plus open and closed NCRs.
//!
//! ## Record Kinds
//!
//! Every record command takes a kind: `geodetic`, `civil`, `ncr`, `remark` or
//! `daily` (short forms `geo`, `remarks` are accepted). Field values are given
//! as repeated `-f KEY=VALUE`. The daily report tables (`equipment_data`,
//! `works_data`, `materials_data`, `quality_data`, `photos_data`) take JSON.
//!
//! ## NCRs
//!
//! `inspect new ncr` and `inspect ncr new` both allocate the next NCR number.
//! The `ncr` subcommands cover the rest of the lifecycle: attaching the signed
//! scan (`ncr edit --scan`), closing, photos, and the defaults used to pre-fill
//! the next report.
//!
//! ## Acting Inspector
//!
//! New records and NCR transitions are stamped with `--as NAME`, falling back
//! to `inspector_name` in `inspect.toml`.

mod commands;
mod render;
pub mod setup;

pub use commands::{exit_code, run};
