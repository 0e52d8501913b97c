//! # Bulkops Architecture
//!
//! Bulkops searches a content store and applies one change to many documents
//! at once: set a field on every match, or seed new documents from a JSON
//! template. It is a library first; the CLI is one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, prints status text and tables          │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - BulkOps facade, applies config, fires callbacks          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs) + batch.rs                   │
//! │  - search / modify / create, batched partial-failure runs   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Client Layer (store/)                                      │
//! │  - ContentClient trait                                      │
//! │  - FileClient (CLI), InMemoryClient (testing)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Flow
//!
//! A search turns a type, some text, or a raw query into a list of
//! [`model::RecordRef`]s. That list plus a [`model::Mutation`] goes to the
//! [`batch::BatchProcessor`], which walks it in fixed-size chunks and returns an
//! [`model::OperationResult`]. Failures are per record: one bad document never
//! stops the rest.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code takes plain Rust arguments and returns
//! `Result<CmdResult>`. It never prints and never exits. Logging goes through
//! `tracing`; whoever embeds the library decides where it ends up.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade, entry point for all operations
//! - [`batch`]: Chunked, sequential, partial-failure processing
//! - [`commands`]: search, modify, create, config, init
//! - [`store`]: Content client trait and bundled clients
//! - [`model`]: Record references, patches, results
//! - [`config`]: Operation settings
//! - [`init`]: Dataset directory resolution
//! - [`error`]: Error types

pub mod api;
pub mod batch;
pub mod commands;
pub mod config;
pub mod error;
pub mod init;
pub mod model;
pub mod store;
