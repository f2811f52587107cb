//! WalletScope: a terminal wallet session viewer for EVM networks.
//!
//! The library holds everything but the terminal event loop, so the
//! session controller can be driven from tests and from the `--json` mode.

pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod export;
pub mod infrastructure;
pub mod ui;
