//! CSV emission.
//!
//! Streams a table scan into any `Write` sink as delimited text.
//! Defaults: `;` field delimiter, `\n` rows, a header row, empty text
//! for nulls, no quoting. Columns of binary kind (OLE, BINARY, REPID)
//! emit each byte as its decimal value followed by the literal letter
//! `X` — long-standing output behavior that downstream consumers
//! depend on, kept as is.

use std::io::Write;

use crate::jet::rows::Table;
use crate::jet::value::Value;
use crate::MdbError;

/// Output policy for [`export_table`].
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Field delimiter.
    pub delimiter: String,
    /// Row delimiter.
    pub row_delimiter: String,
    /// Whether to print a header row of column names.
    pub header_row: bool,
    /// Text emitted for null values.
    pub null_text: String,
    /// Text wrapped around every non-null value, when set.
    pub quote_text: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            delimiter: ";".to_string(),
            row_delimiter: "\n".to_string(),
            header_row: true,
            null_text: String::new(),
            quote_text: None,
        }
    }
}

/// Export every row of the table as delimited text.
///
/// The scan is rewound first. Returns the number of rows written.
/// `on_row` is invoked after each row for progress reporting.
pub fn export_table<F>(
    table: &mut Table<'_>,
    writer: &mut dyn Write,
    opts: &ExportOptions,
    mut on_row: F,
) -> Result<u64, MdbError>
where
    F: FnMut(u64),
{
    let io_err = |e: std::io::Error| MdbError::Io(format!("Write failed: {}", e));

    if opts.header_row {
        for (i, col) in table.def().columns.iter().enumerate() {
            if i > 0 {
                writer.write_all(opts.delimiter.as_bytes()).map_err(io_err)?;
            }
            writer.write_all(col.name.as_bytes()).map_err(io_err)?;
        }
        writer
            .write_all(opts.row_delimiter.as_bytes())
            .map_err(io_err)?;
    }

    table.rewind();

    let num_cols = table.def().columns.len();
    let mut rows_written = 0u64;

    while table.fetch_row()? {
        for i in 0..num_cols {
            if i > 0 {
                writer.write_all(opts.delimiter.as_bytes()).map_err(io_err)?;
            }

            match table.field_value(i) {
                Value::Null => {
                    writer.write_all(opts.null_text.as_bytes()).map_err(io_err)?;
                }
                Value::Text(text) => {
                    write_quoted(writer, opts, text.as_bytes()).map_err(io_err)?;
                }
                Value::Bytes(bytes) => {
                    // Binary emission: decimal byte value, then 'X'.
                    if let Some(quote) = &opts.quote_text {
                        writer.write_all(quote.as_bytes()).map_err(io_err)?;
                    }
                    for b in bytes {
                        write!(writer, "{}X", b).map_err(io_err)?;
                    }
                    if let Some(quote) = &opts.quote_text {
                        writer.write_all(quote.as_bytes()).map_err(io_err)?;
                    }
                }
            }
        }

        writer
            .write_all(opts.row_delimiter.as_bytes())
            .map_err(io_err)?;
        rows_written += 1;
        on_row(rows_written);
    }

    Ok(rows_written)
}

fn write_quoted(
    writer: &mut dyn Write,
    opts: &ExportOptions,
    value: &[u8],
) -> std::io::Result<()> {
    if let Some(quote) = &opts.quote_text {
        writer.write_all(quote.as_bytes())?;
        writer.write_all(value)?;
        writer.write_all(quote.as_bytes())
    } else {
        writer.write_all(value)
    }
}
