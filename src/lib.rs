//! # buildrelay
//!
//! Runs the Go toolchain on behalf of remote editor sessions and relays what
//! it prints back to the editor over a per-session websocket.
//!
//! ## Usage
//!
//! ```bash
//! buildrelay serve [--bind ADDR] [--port N]
//! buildrelay build path/to/main.go [--user U]
//! go build ./... 2>&1 | buildrelay parse "$PWD"
//! ```
//!
//! ## Modules
//!
//! - `app` - Logging setup, configuration loading and fatal error reporting
//! - `build` - Write, prepare, compile sequence with live output and diagnostics
//! - `config` - Layered TOML and environment configuration
//! - `diagnostics` - Compiler error lines to structured diagnostics
//! - `error` - Unified error type with stable numeric codes
//! - `gotest` - Background `go test` runs delivered as one frame
//! - `playground` - One-shot builds in the shared playground directory
//! - `presentation` - HTML fragments and banner text for the output panel
//! - `request` - Validated request bodies
//! - `server` - axum router, handlers and the output websocket
//! - `session` - Session registry and single-writer delivery channels
//! - `subprocess` - Process runner abstraction with a mock for tests
//! - `workspace` - Path resolution, per-user environment and toolchain settings
pub mod app;
pub mod build;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod gotest;
pub mod playground;
pub mod presentation;
pub mod request;
pub mod server;
pub mod session;
pub mod subprocess;
pub mod workspace;
