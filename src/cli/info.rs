//! CLI implementation for the `mdbx info` subcommand.
//!
//! Summarizes the database header and catalog: format version, page
//! size, code page, language id, obfuscation, and object counts.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::wprintln;
use crate::jet::database::Database;
use crate::MdbError;

/// Options for the `mdbx info` subcommand.
pub struct InfoOptions {
    /// Path to the database file.
    pub file: String,
    /// Emit JSON instead of text.
    pub json: bool,
}

#[derive(Serialize)]
struct InfoReport<'a> {
    file: &'a str,
    version: &'static str,
    page_size: usize,
    page_count: u64,
    code_page: u16,
    lang_id: u16,
    obfuscated: bool,
    catalog_objects: usize,
    user_tables: usize,
}

/// Show header and catalog details.
pub fn execute(opts: &InfoOptions, writer: &mut dyn Write) -> Result<(), MdbError> {
    let db = Database::open(&opts.file)?;
    let file = db.file();

    let report = InfoReport {
        file: &opts.file,
        version: db.version().name(),
        page_size: file.page_size(),
        page_count: file.page_count(),
        code_page: file.code_page(),
        lang_id: file.lang_id(),
        obfuscated: file.db_key() != 0,
        catalog_objects: db.catalog().len(),
        user_tables: db.user_tables().count(),
    };

    if opts.json {
        let rendered =
            serde_json::to_string_pretty(&report).map_err(|e| MdbError::Parse(e.to_string()))?;
        wprintln!(writer, "{}", rendered)?;
        return Ok(());
    }

    wprintln!(writer, "{}", opts.file.bold())?;
    wprintln!(writer, "  Version:         {}", report.version)?;
    wprintln!(writer, "  Page size:       {} bytes", report.page_size)?;
    wprintln!(writer, "  Pages:           {}", report.page_count)?;
    wprintln!(writer, "  Code page:       {}", report.code_page)?;
    wprintln!(writer, "  Language id:     0x{:04x}", report.lang_id)?;
    wprintln!(
        writer,
        "  Obfuscated:      {}",
        if report.obfuscated {
            "yes".yellow().to_string()
        } else {
            "no".to_string()
        }
    )?;
    wprintln!(writer, "  Catalog objects: {}", report.catalog_objects)?;
    wprintln!(writer, "  User tables:     {}", report.user_tables)?;

    Ok(())
}
