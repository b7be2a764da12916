//! Triple Tray (workspace facade crate).
//!
//! Re-exports the implementation crates under `crates/` as
//! `triple_tray::{types, core, engine, adapter}` and hosts the binary's
//! argument parsing.

pub mod cli;

pub use triple_tray_adapter as adapter;
pub use triple_tray_core as core;
pub use triple_tray_engine as engine;
pub use triple_tray_types as types;
