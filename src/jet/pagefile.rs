//! Jet database file I/O.
//!
//! Provides [`PageFile`], the entry point for opening a `.mdb`/`.accdb`
//! file. The format generation is detected from the header byte at
//! `0x14` and selects a [`JetFormat`] constant set; the header window is
//! deobfuscated with the fixed RC4 key to expose the language id, code
//! page, and per-file obfuscation key.
//!
//! One page buffer backs the sequential row scan (`read_page` /
//! `buf`). Nested lookups — page-row dereferences and usage-map bitmap
//! pages — always read into freshly allocated buffers so they can never
//! disturb the scan's view of the current page.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::jet::codec::{self, get_u16, get_u32, rc4_apply};
use crate::jet::constants::*;
use crate::MdbError;

/// On-disk format generation, from header byte `0x14`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JetVersion {
    /// Access 97 (2048-byte pages, byte-sized prefixes).
    Jet3,
    /// Access 2000-2003.
    Jet4,
    /// Access 2007 (.accdb).
    Accdb2007,
    /// Access 2010.
    Accdb2010,
    /// Access 2013.
    Accdb2013,
    /// Access 2016.
    Accdb2016,
    /// Access 2019.
    Accdb2019,
}

impl JetVersion {
    /// Map the raw header byte to a version, or `None` if unknown.
    pub fn from_u8(val: u8) -> Option<Self> {
        match val {
            0x00 => Some(JetVersion::Jet3),
            0x01 => Some(JetVersion::Jet4),
            0x02 => Some(JetVersion::Accdb2007),
            0x03 => Some(JetVersion::Accdb2010),
            0x04 => Some(JetVersion::Accdb2013),
            0x05 => Some(JetVersion::Accdb2016),
            0x06 => Some(JetVersion::Accdb2019),
            _ => None,
        }
    }

    /// Human-readable version name.
    pub fn name(&self) -> &'static str {
        match self {
            JetVersion::Jet3 => "Jet3 (Access 97)",
            JetVersion::Jet4 => "Jet4 (Access 2000-2003)",
            JetVersion::Accdb2007 => "ACE12 (Access 2007)",
            JetVersion::Accdb2010 => "ACE14 (Access 2010)",
            JetVersion::Accdb2013 => "ACE15 (Access 2013)",
            JetVersion::Accdb2016 => "ACE16 (Access 2016)",
            JetVersion::Accdb2019 => "ACE17 (Access 2019)",
        }
    }

    /// Whether this is the Jet3 generation; everything later shares the
    /// Jet4 structural constants.
    pub fn is_jet3(&self) -> bool {
        matches!(self, JetVersion::Jet3)
    }

    /// The structural constant set for this version.
    pub fn format(&self) -> &'static JetFormat {
        if self.is_jet3() {
            &JET3_FORMAT
        } else {
            &JET4_FORMAT
        }
    }
}

/// A located row within a page: the raw directory pointer (flags
/// included) and the row's byte length.
#[derive(Debug, Clone, Copy)]
pub struct RowLoc {
    /// Raw row pointer; mask with [`OFFSET_MASK`] for the offset, test
    /// [`ROW_DELETED_FLAG`] / [`ROW_LOOKUP_FLAG`] for state.
    pub start: u16,
    /// Row length in bytes.
    pub len: usize,
}

/// A dereferenced page-row handle: the owning page's bytes plus the
/// row's extent within them.
#[derive(Debug)]
pub struct PageRow {
    /// The full page the row lives on.
    pub data: Vec<u8>,
    /// Row start offset within `data` (flags already masked off).
    pub start: usize,
    /// Row length in bytes.
    pub len: usize,
}

impl PageRow {
    /// The row's bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data[self.start..self.start + self.len]
    }
}

/// Locate a row through the page's row directory.
///
/// The directory begins at the format's `row_count_offset` with a
/// 16-bit row count followed by one 16-bit pointer per row. A row's
/// extent ends at the previous pointer's offset (or at the page end for
/// row 0). Any extent that escapes the page rejects the row.
pub fn locate_row(buf: &[u8], fmt: &JetFormat, row: u16) -> Option<RowLoc> {
    if row > MAX_ROW_INDEX {
        return None;
    }

    let rco = fmt.row_count_offset;
    let entry = rco + 2 + row as usize * 2;
    if entry + 2 > buf.len() {
        return None;
    }

    let start = get_u16(buf, entry);
    let next = if row == 0 {
        fmt.page_size
    } else {
        (get_u16(buf, rco + row as usize * 2) & OFFSET_MASK) as usize
    };

    let offset = (start & OFFSET_MASK) as usize;
    if offset >= fmt.page_size || offset > next || next > fmt.page_size {
        return None;
    }

    Some(RowLoc {
        start,
        len: next - offset,
    })
}

/// An open Jet database file.
pub struct PageFile {
    file: File,
    file_size: u64,
    version: JetVersion,
    fmt: &'static JetFormat,
    db_key: u32,
    lang_id: u16,
    code_page: u16,
    pg_buf: Vec<u8>,
    cur_pg: u32,
}

impl PageFile {
    /// Open a database file and detect its format version.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MdbError> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|e| MdbError::Io(format!("Cannot open {}: {}", path.display(), e)))?;

        let file_size = file
            .metadata()
            .map_err(|e| MdbError::Io(format!("Cannot stat {}: {}", path.display(), e)))?
            .len();

        // The header fields all live in the first 2048 bytes, which is
        // also the smallest page size, so version detection can read a
        // fixed-size prefix before the real page size is known.
        let mut head = vec![0u8; JET3_FORMAT.page_size];
        file.read_exact(&mut head)
            .map_err(|e| MdbError::Io(format!("Cannot read page 0: {}", e)))?;

        if head[0] != PAGE_DB {
            return Err(MdbError::Parse(format!(
                "Not a Jet database: page 0 starts with 0x{:02x}, expected 0x00",
                head[0]
            )));
        }

        let raw_version = head[HDR_JET_VERSION_OFFSET];
        let version = JetVersion::from_u8(raw_version).ok_or_else(|| {
            MdbError::Parse(format!("Unknown Jet version: 0x{:02x}", raw_version))
        })?;
        let fmt = version.format();

        let mut pf = PageFile {
            file,
            file_size,
            version,
            fmt,
            db_key: 0,
            lang_id: 0,
            code_page: 0,
            pg_buf: Vec::new(),
            cur_pg: u32::MAX,
        };

        // db_key is still zero here, so this is a raw read.
        pf.read_page(0)?;

        let window = if version.is_jet3() {
            HDR_WINDOW_LEN_JET3
        } else {
            HDR_WINDOW_LEN_JET4
        };
        rc4_apply(
            &HDR_RC4_KEY,
            &mut pf.pg_buf[HDR_WINDOW_OFFSET..HDR_WINDOW_OFFSET + window],
        );

        let lang_offset = if version.is_jet3() {
            HDR_LANG_ID_OFFSET_JET3
        } else {
            HDR_LANG_ID_OFFSET_JET4
        };
        pf.lang_id = get_u16(&pf.pg_buf, lang_offset);
        pf.code_page = get_u16(&pf.pg_buf, HDR_CODE_PAGE_OFFSET);
        pf.db_key = get_u32(&pf.pg_buf, HDR_DB_KEY_OFFSET);

        Ok(pf)
    }

    /// Returns the detected format version.
    pub fn version(&self) -> JetVersion {
        self.version
    }

    /// Returns the structural constant set in effect.
    pub fn format(&self) -> &'static JetFormat {
        self.fmt
    }

    /// Returns the page size in bytes.
    pub fn page_size(&self) -> usize {
        self.fmt.page_size
    }

    /// Returns the number of whole pages in the file.
    pub fn page_count(&self) -> u64 {
        self.file_size / self.fmt.page_size as u64
    }

    /// Returns the obfuscation key (zero when the file is clear).
    pub fn db_key(&self) -> u32 {
        self.db_key
    }

    /// Returns the language id from the header.
    pub fn lang_id(&self) -> u16 {
        self.lang_id
    }

    /// Returns the code page from the header.
    pub fn code_page(&self) -> u16 {
        self.code_page
    }

    /// The current page buffer.
    pub fn buf(&self) -> &[u8] {
        &self.pg_buf
    }

    /// The page number currently in the buffer.
    pub fn current_page(&self) -> u32 {
        self.cur_pg
    }

    /// Read a page into a fresh buffer, deobfuscating if needed.
    ///
    /// Returns `None` when the page lies beyond the end of the file.
    /// Never touches the current page buffer.
    fn fetch_page(&mut self, pg: u32) -> Result<Option<Vec<u8>>, MdbError> {
        let ps = self.fmt.page_size;
        let offset = pg as u64 * ps as u64;
        if offset + ps as u64 > self.file_size {
            return Ok(None);
        }

        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| MdbError::Io(format!("Cannot seek to page {}: {}", pg, e)))?;

        let mut buf = vec![0u8; ps];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| MdbError::Io(format!("Cannot read page {}: {}", pg, e)))?;

        // Every non-header page of an obfuscated file is XORed through
        // RC4 with the key db_key ^ page_number.
        if pg != 0 && self.db_key != 0 {
            let key = (self.db_key ^ pg).to_le_bytes();
            rc4_apply(&key, &mut buf);
        }

        Ok(Some(buf))
    }

    /// Load a page into the current buffer, erroring past end of file.
    pub fn read_page(&mut self, pg: u32) -> Result<(), MdbError> {
        if !self.try_read_page(pg)? {
            return Err(MdbError::Io(format!(
                "Page {} is beyond the end of the file",
                pg
            )));
        }
        Ok(())
    }

    /// Load a page into the current buffer; `false` past end of file.
    ///
    /// Re-reading the page already in the buffer is a no-op (except for
    /// page 0, which is always re-fetched raw).
    pub fn try_read_page(&mut self, pg: u32) -> Result<bool, MdbError> {
        if pg != 0 && self.cur_pg == pg {
            return Ok(true);
        }
        match self.fetch_page(pg)? {
            Some(buf) => {
                self.pg_buf = buf;
                self.cur_pg = pg;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Read a page into an owned buffer without touching the current one.
    pub(crate) fn read_page_owned(&mut self, pg: u32) -> Result<Vec<u8>, MdbError> {
        self.fetch_page(pg)?.ok_or_else(|| {
            MdbError::Io(format!("Page {} is beyond the end of the file", pg))
        })
    }

    /// Locate a row on the current page.
    pub fn find_row(&self, row: u16) -> Option<RowLoc> {
        locate_row(&self.pg_buf, self.fmt, row)
    }

    /// Dereference a page-row handle (upper 24 bits page, low 8 row).
    ///
    /// This is the universal lookup primitive behind usage maps, table
    /// definition maps, and memo chains. The returned [`PageRow`] owns
    /// its page, so the current buffer's contents are stable across the
    /// call.
    pub fn find_pg_row(&mut self, pg_row: u32) -> Result<PageRow, MdbError> {
        let pg = pg_row >> 8;
        let row = (pg_row & 0xFF) as u16;

        let data = self.read_page_owned(pg)?;
        let loc = locate_row(&data, self.fmt, row).ok_or_else(|| {
            MdbError::Parse(format!("Cannot find row {} on page {}", row, pg))
        })?;

        Ok(PageRow {
            data,
            start: (loc.start & OFFSET_MASK) as usize,
            len: loc.len,
        })
    }

    /// Read `len` bytes of logically concatenated metadata.
    ///
    /// Table definitions larger than one page continue on successor
    /// pages: a 4-byte next-page pointer sits at offset 4, and payload
    /// resumes at offset 8. `pos` is the logical position within the
    /// page currently in the buffer; the advanced position (on whatever
    /// page ends up current) is returned with the bytes.
    pub fn read_meta(&mut self, mut pos: usize, mut len: usize) -> Result<(Vec<u8>, usize), MdbError> {
        let ps = self.fmt.page_size;
        let mut out = Vec::with_capacity(len);

        // Advance to the page containing the first byte.
        while pos >= ps {
            let next = get_u32(&self.pg_buf, 4);
            self.read_page(next)?;
            pos -= ps - 8;
        }

        // Copy whole page tails while the range crosses a boundary.
        while pos + len >= ps {
            let piece = ps - pos;
            out.extend_from_slice(&self.pg_buf[pos..pos + piece]);
            len -= piece;
            let next = get_u32(&self.pg_buf, 4);
            self.read_page(next)?;
            pos = 8;
        }

        if len > 0 {
            out.extend_from_slice(&self.pg_buf[pos..pos + len]);
            pos += len;
        }

        Ok((out, pos))
    }

    /// Read one byte from the metadata stream.
    pub fn read_meta_u8(&mut self, pos: usize) -> Result<(u8, usize), MdbError> {
        let (bytes, pos) = self.read_meta(pos, 1)?;
        Ok((bytes[0], pos))
    }

    /// Read a little-endian u16 from the metadata stream.
    pub fn read_meta_u16(&mut self, pos: usize) -> Result<(u16, usize), MdbError> {
        let (bytes, pos) = self.read_meta(pos, 2)?;
        Ok((get_u16(&bytes, 0), pos))
    }

    /// Read a little-endian u32 from the metadata stream.
    pub fn read_meta_u32(&mut self, pos: usize) -> Result<(u32, usize), MdbError> {
        let (bytes, pos) = self.read_meta(pos, 4)?;
        Ok((get_u32(&bytes, 0), pos))
    }

    /// Decode stored text bytes per the file's version rules.
    pub fn decode_text(&self, src: &[u8]) -> String {
        codec::decode_text(self.version.is_jet3(), src)
    }
}
