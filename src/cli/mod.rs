//! CLI subcommand implementations for the `mdbx` binary.
//!
//! Argument parsing uses clap derive macros; the top-level
//! [`app::Cli`] struct and [`app::Commands`] enum live in [`app`] and
//! are shared between `main.rs` and `build.rs` (for man page
//! generation) via `include!()`.
//!
//! Each subcommand module follows the same pattern: an `Options`
//! struct holding the parsed arguments and a
//! `pub fn execute(opts, writer) -> Result<(), MdbError>` entry point.
//! The `writer: &mut dyn Write` parameter lets tests capture output
//! and lets the global `--output` flag redirect it to a file.
//!
//! | Command | Module | Purpose |
//! |---------|--------|---------|
//! | `mdbx tables` | [`tables`] | List catalog objects and the user-table flag |
//! | `mdbx export` | [`export`] | Stream one table out as CSV |
//! | `mdbx info` | [`info`] | Database header summary |
//! | `mdbx dump` | [`dump`] | Hex dump of a deobfuscated page |

pub mod app;
pub mod dump;
pub mod export;
pub mod info;
pub mod tables;

/// Write a line to the given writer, converting io::Error to MdbError.
macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::MdbError::Io(e.to_string()))
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::MdbError::Io(e.to_string()))
    };
}

pub(crate) use wprintln;

use indicatif::{ProgressBar, ProgressStyle};

/// Create a styled progress bar for the export row loop.
pub(crate) fn create_progress_bar(count: u64) -> ProgressBar {
    let pb = ProgressBar::new(count);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} rows ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}
