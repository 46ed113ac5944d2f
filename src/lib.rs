//! Jet/ACE database file reader.
//!
//! The `mdb-utils` crate (library name `mdb`) reads the on-disk format
//! of the Jet/ACE database family — `.mdb` files from Access 97
//! (Jet3) and Access 2000-2003 (Jet4), and `.accdb` files from Access
//! 2007 through 2019 — and exports table rows as delimited text. The
//! reader is strictly read-only: it never creates lock files and never
//! writes to the database.
//!
//! # CLI Reference
//!
//! The `mdbx` binary exposes the library from the command line.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `mdbx tables` | List the catalog: object names, types, root pages, flags |
//! | `mdbx export` | Stream a table out as CSV |
//! | `mdbx info` | Show header details (version, code page, obfuscation) |
//! | `mdbx dump` | Hex dump of a deobfuscated page |
//!
//! All subcommands accept `--output <file>`; `tables` and `info` also
//! take `--json`.
//!
//! # Library API
//!
//! ```no_run
//! use mdb::jet::database::Database;
//! use mdb::jet::export::{export_table, ExportOptions};
//!
//! let mut db = Database::open("northwind.mdb").unwrap();
//! for entry in db.list_tables() {
//!     println!("{} (user table: {})", entry.object_name, entry.is_user_table());
//! }
//!
//! let mut table = db.open_table("Customers").unwrap();
//! let mut out = Vec::new();
//! let rows = export_table(&mut table, &mut out, &ExportOptions::default(), |_| {}).unwrap();
//! println!("{} rows exported", rows);
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`jet::pagefile`] | File I/O, version detection, page-row lookup |
//! | [`jet::usage_map`] | Data-page enumeration via usage maps |
//! | [`jet::catalog`] | MSysObjects bootstrap and catalog entries |
//! | [`jet::table`] | Table definition and column parsing |
//! | [`jet::rows`] | Table scan cursor and row cracking |
//! | [`jet::value`] | Typed value rendering, memo resolution |
//! | [`jet::sarg`] | Optional row filter trees |
//! | [`jet::export`] | CSV emission |
//! | [`jet::codec`] | Byte readers, RC4, text and date decoding |
//! | [`jet::constants`] | Version-dependent structural offsets |

#[cfg(feature = "cli")]
pub mod cli;
pub mod jet;
pub mod util;

use thiserror::Error;

/// Errors returned by `mdb` operations.
#[derive(Error, Debug)]
pub enum MdbError {
    /// An I/O error occurred (file open, read, or seek failure).
    #[error("I/O error: {0}")]
    Io(String),

    /// A parse error occurred (malformed structures or unexpected values).
    #[error("Parse error: {0}")]
    Parse(String),

    /// An invalid argument was supplied (unknown table, bad option).
    #[error("Invalid argument: {0}")]
    Argument(String),
}
