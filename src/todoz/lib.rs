//! # Todoz Architecture
//!
//! Todoz is a **UI-agnostic todo list core** with a command-line client on top.
//! Everything from [`api`] inward takes Rust values and returns Rust values; the
//! terminal lives only in the binary's `cli` module.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, prints results, owns exit codes        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Busy gating, completed lock, confirmations               │
//! │  - Returns CmdResult                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                 ┌────────────┴─────────────┐
//!                 ▼                          ▼
//! ┌───────────────────────────┐  ┌──────────────────────────────┐
//! │  Todo Store (store/)      │  │  Pure logic                  │
//! │  - One init, snapshots    │  │  - view.rs: filter/search/sort│
//! │  - Concurrent bulk ops    │  │  - commands/: import, export,│
//! │  - Tiered backends        │  │    share                     │
//! └───────────────────────────┘  └──────────────────────────────┘
//! ```
//!
//! ## Storage Tiers
//!
//! The [`store::StorageSelector`] tries an embedded SQLite database, then a JSON
//! key-value slot on disk, then process memory. The first tier that opens wins
//! for the lifetime of the store. See [`store`] for the backend contract.
//!
//! ## Testing Strategy
//!
//! 1. **Pure logic** (`view.rs`, `commands/*.rs`, `model.rs`): plain unit tests.
//! 2. **Store** (`store/*.rs`): `#[tokio::test]` against the memory backend, with
//!    failure injection, plus tempdir-backed tests for the disk tiers.
//! 3. **API** (`api.rs`): the presentation rules over an in-memory store.
//! 4. **Binary** (`tests/`): `assert_cmd` runs against a temporary data dir.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade every client goes through
//! - [`store`]: Backends, tier selection and the todo store
//! - [`view`]: The derived list and category helpers
//! - [`commands`]: Import, export and share
//! - [`model`]: `TodoItem`, `Priority` and the input types
//! - [`dates`]: Local-date parsing for due dates
//! - [`config`]: Configuration management
//! - [`clipboard`]: Clipboard delivery for share
//! - [`error`]: Error types

pub mod api;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod dates;
pub mod error;
pub mod model;
pub mod store;
pub mod view;
