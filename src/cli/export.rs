//! CLI implementation for the `mdbx export` subcommand.
//!
//! Streams one table out as delimited text, drawing a progress bar on
//! stderr sized from the table definition's declared row count.

use std::io::Write;

use crate::cli::create_progress_bar;
use crate::jet::database::Database;
use crate::jet::export::{export_table, ExportOptions};
use crate::jet::value::ValueFormat;
use crate::MdbError;

/// Options for the `mdbx export` subcommand.
pub struct ExportCmdOptions {
    /// Path to the database file.
    pub file: String,
    /// Table to export.
    pub table: String,
    /// Field delimiter.
    pub delimiter: String,
    /// Row delimiter.
    pub row_delimiter: String,
    /// Suppress the header row.
    pub no_header: bool,
    /// Text emitted for null values.
    pub null_text: String,
    /// Optional quote text wrapped around values.
    pub quote: Option<String>,
    /// Also export rows flagged as deleted.
    pub include_deleted: bool,
    /// Render booleans as TRUE/FALSE instead of 1/0.
    pub boolean_words: bool,
}

/// Export a table as CSV.
pub fn execute(opts: &ExportCmdOptions, writer: &mut dyn Write) -> Result<(), MdbError> {
    let mut db = Database::open(&opts.file)?;

    if opts.boolean_words {
        db.set_value_format(ValueFormat::default().with_boolean_words());
    }

    let mut table = db.open_table(&opts.table)?;
    table.noskip_deleted = opts.include_deleted;

    let export_opts = ExportOptions {
        delimiter: opts.delimiter.clone(),
        row_delimiter: opts.row_delimiter.clone(),
        header_row: !opts.no_header,
        null_text: opts.null_text.clone(),
        quote_text: opts.quote.clone(),
    };

    let pb = create_progress_bar(table.def().num_rows as u64);
    let rows = export_table(&mut table, writer, &export_opts, |n| pb.set_position(n))?;
    pb.finish_and_clear();

    eprintln!("{} rows exported from {}", rows, opts.table);
    Ok(())
}
