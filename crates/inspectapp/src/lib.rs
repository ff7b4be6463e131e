//! # Inspect Architecture
//!
//! Inspect keeps the inspection records of a construction site: geodetic and
//! civil inspections, nonconformance reports (NCRs), remarks and daily shift
//! reports. This crate is the UI-agnostic core; the `inspect` binary is one
//! client of it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (the `inspect` crate)                                  │
//! │  - Parses arguments, renders results, owns exit codes       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade, normalizes inputs                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Business logic: filters, NCR lifecycle, exports          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - RecordStore over a StorageBackend (fs or memory)         │
//! │  - AttachmentStore for uploaded photos                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! From `api.rs` inward nothing writes to stdout or stderr and nothing exits
//! the process. Diagnostics go through `tracing`; whether they are shown is
//! up to the client.
//!
//! ## Module Overview
//!
//! - [`api`]: the facade
//! - [`commands`]: business logic
//! - [`store`]: record and attachment storage
//! - [`model`]: the record kinds
//! - [`config`]: `inspect.toml` and `INSPECT_*` settings
//! - [`init`]: data directory resolution and context setup
//! - [`error`]: error types

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod init;
pub mod model;
pub mod store;
