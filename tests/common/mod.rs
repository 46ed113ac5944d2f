//! Shared fixture builder: synthesizes Jet4 database files in temp
//! files, page by page, including the RC4'd header window and (for
//! obfuscated variants) whole-file per-page obfuscation.
#![allow(dead_code)]

use byteorder::{ByteOrder, LittleEndian};
use std::io::Write;
use tempfile::NamedTempFile;

use mdb::jet::codec::rc4_apply;
use mdb::jet::constants::*;

/// Jet4 page size.
pub const PS: usize = 4096;

/// Make a page-row handle from page and row numbers.
pub fn handle(pg: u32, row: u8) -> u32 {
    (pg << 8) | row as u32
}

/// Encode a string as UTF-16LE bytes.
pub fn utf16(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

/// A type-0 (inline bitmap) usage map.
pub fn inline_map(base_pg: u32, bitmap: &[u8]) -> Vec<u8> {
    let mut map = vec![0u8];
    map.extend_from_slice(&base_pg.to_le_bytes());
    map.extend_from_slice(bitmap);
    map
}

/// A 12-byte memo cell.
pub fn memo_cell(memo_len: u32, pg_row: u32) -> Vec<u8> {
    let mut cell = vec![0u8; 12];
    LittleEndian::write_u32(&mut cell[0..], memo_len);
    LittleEndian::write_u32(&mut cell[4..], pg_row);
    cell
}

/// Column description for [`Fixture::table_def`].
pub struct ColSpec {
    pub name: &'static str,
    pub type_code: u8,
    pub col_num: u8,
    pub var_col_num: u16,
    pub fixed_offset: u16,
    pub col_size: u16,
    pub is_fixed: bool,
}

/// A fixed-width column.
pub fn fixed_col(name: &'static str, col_num: u8, type_code: u8, fixed_offset: u16, col_size: u16) -> ColSpec {
    ColSpec {
        name,
        type_code,
        col_num,
        var_col_num: 0,
        fixed_offset,
        col_size,
        is_fixed: true,
    }
}

/// A variable-width column.
pub fn var_col(name: &'static str, col_num: u8, type_code: u8, var_col_num: u16) -> ColSpec {
    ColSpec {
        name,
        type_code,
        col_num,
        var_col_num,
        fixed_offset: 0,
        col_size: 0,
        is_fixed: false,
    }
}

/// Assemble a Jet4 row.
///
/// `var_payloads: None` builds a fixed-only row with no variable
/// trailer (the layout of tables that declare no variable columns).
pub fn jet4_row(
    row_cols: u16,
    fixed_area: &[u8],
    var_payloads: Option<&[&[u8]]>,
    nullmask: &[u8],
) -> Vec<u8> {
    let mut row = Vec::new();
    row.extend_from_slice(&row_cols.to_le_bytes());
    row.extend_from_slice(fixed_area);

    if let Some(payloads) = var_payloads {
        let mut offsets = Vec::with_capacity(payloads.len() + 1);
        for payload in payloads {
            offsets.push(row.len());
            row.extend_from_slice(payload);
        }
        offsets.push(row.len());

        // The offset table is stored backward: entry 0 at the highest
        // address, just above the 16-bit variable-column count.
        for &off in offsets.iter().rev() {
            row.extend_from_slice(&(off as u16).to_le_bytes());
        }
        row.extend_from_slice(&(payloads.len() as u16).to_le_bytes());
    }

    row.extend_from_slice(nullmask);
    row
}

/// An in-memory Jet4 database image.
pub struct Fixture {
    pub pages: Vec<Vec<u8>>,
    db_key: u32,
}

impl Fixture {
    /// A clear-text fixture with `num_pages` zeroed pages after the header.
    pub fn new(num_pages: usize) -> Self {
        Self::with_db_key(num_pages, 0)
    }

    /// An obfuscated fixture; every non-header page is RC4'd at write
    /// time with `db_key ^ page_number`.
    pub fn with_db_key(num_pages: usize, db_key: u32) -> Self {
        let mut pages = vec![vec![0u8; PS]; num_pages];
        pages[0] = header_page(db_key);
        Fixture { pages, db_key }
    }

    /// Fill a table definition page.
    pub fn table_def(
        &mut self,
        pg: u32,
        num_rows: u32,
        cols: &[ColSpec],
        usage_handle: u32,
        free_handle: u32,
    ) {
        let page = &mut self.pages[pg as usize];
        page[0] = PAGE_TABLE;

        let fmt = &JET4_FORMAT;
        let num_var_cols = cols.iter().filter(|c| !c.is_fixed).count() as u16;

        LittleEndian::write_u32(&mut page[fmt.tab_num_rows_offset..], num_rows);
        LittleEndian::write_u16(&mut page[fmt.tab_num_cols_offset - 2..], num_var_cols);
        LittleEndian::write_u16(&mut page[fmt.tab_num_cols_offset..], cols.len() as u16);
        LittleEndian::write_u32(&mut page[fmt.tab_num_idxs_offset..], 0);
        LittleEndian::write_u32(&mut page[fmt.tab_num_ridxs_offset..], 0);
        LittleEndian::write_u32(&mut page[fmt.tab_usage_map_offset..], usage_handle);
        LittleEndian::write_u32(&mut page[fmt.tab_free_map_offset..], free_handle);

        let mut pos = fmt.tab_cols_start_offset;
        for col in cols {
            let rec = &mut page[pos..pos + fmt.tab_col_entry_size];
            rec[0] = col.type_code;
            rec[fmt.col_num_offset] = col.col_num;
            LittleEndian::write_u16(&mut rec[fmt.tab_col_offset_var..], col.var_col_num);
            LittleEndian::write_u16(&mut rec[fmt.tab_row_col_num_offset..], col.col_num as u16);
            rec[fmt.col_flags_offset] = if col.is_fixed { 0x01 } else { 0x00 };
            LittleEndian::write_u16(&mut rec[fmt.tab_col_offset_fixed..], col.fixed_offset);
            LittleEndian::write_u16(&mut rec[fmt.col_size_offset..], col.col_size);
            pos += fmt.tab_col_entry_size;
        }

        for col in cols {
            let encoded = utf16(col.name);
            LittleEndian::write_u16(&mut page[pos..], encoded.len() as u16);
            pos += 2;
            page[pos..pos + encoded.len()].copy_from_slice(&encoded);
            pos += encoded.len();
        }
    }

    /// Fill a page with a row directory; rows pack downward from the
    /// page end. Each row carries optional pointer flags (deleted,
    /// lookup).
    pub fn row_page(&mut self, pg: u32, page_type: u8, parent: u32, rows: &[(Vec<u8>, u16)]) {
        let page = &mut self.pages[pg as usize];
        page[0] = page_type;
        LittleEndian::write_u32(&mut page[4..], parent);

        let rco = JET4_FORMAT.row_count_offset;
        LittleEndian::write_u16(&mut page[rco..], rows.len() as u16);

        let mut end = PS;
        for (i, (data, flags)) in rows.iter().enumerate() {
            let start = end - data.len();
            page[start..end].copy_from_slice(data);
            LittleEndian::write_u16(&mut page[rco + 2 + i * 2..], start as u16 | flags);
            end = start;
        }
    }

    /// Write the image out, obfuscating if a key was set.
    pub fn write(&self) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().expect("create temp file");
        for (pg, page) in self.pages.iter().enumerate() {
            let mut stored = page.clone();
            if self.db_key != 0 && pg != 0 {
                rc4_apply(&(self.db_key ^ pg as u32).to_le_bytes(), &mut stored);
            }
            tmp.write_all(&stored).expect("write page");
        }
        tmp.flush().expect("flush");
        tmp
    }
}

fn header_page(db_key: u32) -> Vec<u8> {
    let mut page = vec![0u8; PS];
    page[HDR_JET_VERSION_OFFSET] = 0x01; // Jet4
    LittleEndian::write_u16(&mut page[HDR_LANG_ID_OFFSET_JET4..], 0x0409);
    LittleEndian::write_u16(&mut page[HDR_CODE_PAGE_OFFSET..], 1252);
    LittleEndian::write_u32(&mut page[HDR_DB_KEY_OFFSET..], db_key);
    rc4_apply(
        &HDR_RC4_KEY,
        &mut page[HDR_WINDOW_OFFSET..HDR_WINDOW_OFFSET + HDR_WINDOW_LEN_JET4],
    );
    page
}

/// The MSysObjects column set the catalog bootstrap binds.
pub fn msys_columns() -> Vec<ColSpec> {
    vec![
        fixed_col("Id", 0, 0x04, 0, 4),     // LONGINT
        var_col("Name", 1, 0x0a, 0),        // TEXT
        fixed_col("Type", 2, 0x03, 4, 2),   // INT
        fixed_col("Flags", 3, 0x04, 6, 4),  // LONGINT
        var_col("LvProp", 4, 0x0b, 1),      // OLE
    ]
}

/// One MSysObjects row.
pub fn catalog_row(id: u32, name: &str, obj_type: u16, flags: u32) -> Vec<u8> {
    let mut fixed = vec![0u8; 10];
    LittleEndian::write_u32(&mut fixed[0..], id);
    LittleEndian::write_u16(&mut fixed[4..], obj_type);
    LittleEndian::write_u32(&mut fixed[6..], flags);

    let name_bytes = utf16(name);
    // LvProp present but empty; bits 0-3 set, bit 4 clear (null).
    jet4_row(5, &fixed, Some(&[&name_bytes, &[]]), &[0b0000_1111])
}

/// Build the standard catalog fixture: MSysObjects with three entries
/// (two system tables and the user table `Users` rooted at page 3,
/// holding INT rows 1, 2, 3).
///
/// Page layout: 0 header, 1 map holder, 2 MSysObjects def, 3 Users
/// def, 4 MSysObjects data, 5 Users data.
pub fn catalog_fixture(db_key: u32) -> Fixture {
    let mut fx = Fixture::with_db_key(6, db_key);

    fx.row_page(
        1,
        PAGE_MAP,
        0,
        &[
            (inline_map(0, &[0b0001_0000]), 0), // MSysObjects data: page 4
            (inline_map(0, &[]), 0),            // MSysObjects free map
            (inline_map(0, &[0b0010_0000]), 0), // Users data: page 5
            (inline_map(0, &[]), 0),            // Users free map
        ],
    );

    fx.table_def(2, 3, &msys_columns(), handle(1, 0), handle(1, 1));
    fx.table_def(
        3,
        3,
        &[fixed_col("id", 0, 0x03, 0, 2)],
        handle(1, 2),
        handle(1, 3),
    );

    fx.row_page(
        4,
        PAGE_DATA,
        2,
        &[
            (catalog_row(0x0200_0001, "MSysObjects", 3, 0x8000_0002), 0),
            (catalog_row(0x0200_0002, "MSysAccessObjects", 3, 0x8000_0002), 0),
            (catalog_row(0x0200_0003, "Users", 1, 0), 0),
        ],
    );

    fx.row_page(
        5,
        PAGE_DATA,
        3,
        &[
            (jet4_row(1, &1u16.to_le_bytes(), None, &[0b1]), 0),
            (jet4_row(1, &2u16.to_le_bytes(), None, &[0b1]), 0),
            (jet4_row(1, &3u16.to_le_bytes(), None, &[0b1]), 0),
        ],
    );

    fx
}
