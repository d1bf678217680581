// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Console output helpers.
//!
//! Progress and diagnostics go through the exported macros so that styling and
//! the verbosity switch live in one place. Warnings and errors go to stderr.

use std::fmt::Arguments;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;

/// Global verbosity flag.
static VERBOSE: AtomicBool = AtomicBool::new(true);

/// Set the global verbosity flag.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

/// Check if verbose output is enabled.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

#[doc(hidden)]
pub fn print_warning(args: Arguments<'_>) {
    eprintln!("{} {args}", "WARNING ⚠️".yellow().bold());
}

#[doc(hidden)]
pub fn print_error(args: Arguments<'_>) {
    eprintln!("{} {args}", "Error:".red().bold());
}

#[doc(hidden)]
pub fn print_success(args: Arguments<'_>) {
    println!("{} {args}", "✅".green());
}

#[doc(hidden)]
pub fn print_section(args: Arguments<'_>) {
    if is_verbose() {
        println!();
        println!("{}", args.to_string().cyan().bold());
    }
}

/// Plain informational line on stdout.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        println!($($arg)*)
    };
}

/// Yellow `WARNING ⚠️` line on stderr.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::cli::logging::print_warning(format_args!($($arg)*))
    };
}

/// Red `Error:` line on stderr.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::cli::logging::print_error(format_args!($($arg)*))
    };
}

/// Green check line on stdout.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::cli::logging::print_success(format_args!($($arg)*))
    };
}

/// Line on stdout, only when verbose.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::cli::logging::is_verbose() {
            println!($($arg)*);
        }
    };
}

/// Bold cyan header preceded by a blank line, only when verbose.
#[macro_export]
macro_rules! section {
    ($($arg:tt)*) => {
        $crate::cli::logging::print_section(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_toggle() {
        set_verbose(true);
        assert!(is_verbose());

        set_verbose(false);
        assert!(!is_verbose());

        set_verbose(true);
        assert!(is_verbose());
    }

    #[test]
    fn test_macros_expand_in_expression_position() {
        let outcome: Result<(), ()> = Err(());
        match outcome {
            Ok(()) => crate::success!("done"),
            Err(()) => crate::warn!("failed {}", 1),
        }
        let _ = || crate::error!("closure {}", "ok");
        crate::section!("Header");
    }
}
