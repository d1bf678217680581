// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Command-line interface: argument parsing, console output and the
//! `run_recording` entry point used by the binary.

/// CLI arguments.
pub mod args;

/// Console logging macros and verbosity.
pub mod logging;

/// Recording command.
pub mod record;
