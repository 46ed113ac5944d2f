//! CLI implementation for the `mdbx tables` subcommand.
//!
//! Lists the catalog read from MSysObjects: object name, kind, root
//! page, raw flags, and whether the entry is a plain user table.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::wprintln;
use crate::jet::catalog::CatalogEntry;
use crate::jet::database::Database;
use crate::MdbError;

/// Options for the `mdbx tables` subcommand.
pub struct TablesOptions {
    /// Path to the database file.
    pub file: String,
    /// Only list user tables.
    pub user_only: bool,
    /// Emit JSON instead of a text table.
    pub json: bool,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    root_page: u32,
    flags: u32,
    user_table: bool,
}

/// List catalog objects.
pub fn execute(opts: &TablesOptions, writer: &mut dyn Write) -> Result<(), MdbError> {
    let db = Database::open(&opts.file)?;

    let entries: Vec<&CatalogEntry> = db
        .list_tables()
        .iter()
        .filter(|e| !opts.user_only || e.is_user_table())
        .collect();

    if opts.json {
        let json: Vec<JsonEntry> = entries
            .iter()
            .map(|e| JsonEntry {
                name: &e.object_name,
                kind: e.kind().name(),
                root_page: e.table_pg,
                flags: e.flags,
                user_table: e.is_user_table(),
            })
            .collect();
        let rendered =
            serde_json::to_string_pretty(&json).map_err(|e| MdbError::Parse(e.to_string()))?;
        wprintln!(writer, "{}", rendered)?;
        return Ok(());
    }

    wprintln!(
        writer,
        "{:<32} {:<18} {:>10} {:>10}  {}",
        "NAME",
        "TYPE",
        "ROOT",
        "FLAGS",
        "USER"
    )?;
    for entry in &entries {
        let marker = if entry.is_user_table() {
            "yes".green().to_string()
        } else {
            "-".to_string()
        };
        wprintln!(
            writer,
            "{:<32} {:<18} {:>10} {:>10x}  {}",
            entry.object_name,
            entry.kind().name(),
            entry.table_pg,
            entry.flags,
            marker
        )?;
    }
    wprintln!(writer, "\n{} objects", entries.len())?;

    Ok(())
}
