//! CLI implementation for the `mdbx dump` subcommand.
//!
//! Dumps the bytes of one page after deobfuscation, either as a
//! formatted hex dump or as raw binary.

use std::io::Write;

use crate::cli::wprintln;
use crate::jet::pagefile::PageFile;
use crate::util::hex::hex_dump;
use crate::MdbError;

/// Options for the `mdbx dump` subcommand.
pub struct DumpOptions {
    /// Path to the database file.
    pub file: String,
    /// Page number to dump.
    pub page: u32,
    /// Number of bytes to dump (whole page when absent).
    pub length: Option<usize>,
    /// Emit raw bytes instead of formatted output.
    pub raw: bool,
}

/// Dump one page.
pub fn execute(opts: &DumpOptions, writer: &mut dyn Write) -> Result<(), MdbError> {
    let mut file = PageFile::open(&opts.file)?;
    file.read_page(opts.page)?;

    let page_size = file.page_size();
    let page_type = file.buf()[0];
    let len = opts.length.unwrap_or(page_size).min(page_size);
    let data = &file.buf()[..len];

    if opts.raw {
        writer
            .write_all(data)
            .map_err(|e| MdbError::Io(e.to_string()))?;
        return Ok(());
    }

    let base = opts.page as u64 * page_size as u64;
    wprintln!(
        writer,
        "Page {} (type 0x{:02x}, {} of {} bytes)",
        opts.page,
        page_type,
        len,
        page_size
    )?;
    wprintln!(writer, "{}", hex_dump(data, base))?;

    Ok(())
}
