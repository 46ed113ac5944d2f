//! Jet/ACE page and file structure constants.
//!
//! Jet3 and Jet4+ share the same logical layout but differ in every
//! structural offset (page size, row-directory location, column-record
//! size, length-prefix widths). The per-version values are bundled into
//! [`JetFormat`] so the page store can select one set at open time and
//! hand out a `&'static JetFormat` to every layer above it.

// ── Database header (page 0) ────────────────────────────────────────

/// Offset of the format version byte in the database header.
pub const HDR_JET_VERSION_OFFSET: usize = 0x14;
/// Start of the RC4-obfuscated header window.
pub const HDR_WINDOW_OFFSET: usize = 0x18;
/// Obfuscated header window length for Jet3.
pub const HDR_WINDOW_LEN_JET3: usize = 126;
/// Obfuscated header window length for Jet4 and later.
pub const HDR_WINDOW_LEN_JET4: usize = 128;
/// Fixed RC4 key for the header window.
pub const HDR_RC4_KEY: [u8; 4] = [0xC7, 0xDA, 0x39, 0x6B];
/// Offset of the language id (Jet3).
pub const HDR_LANG_ID_OFFSET_JET3: usize = 0x3a;
/// Offset of the language id (Jet4+).
pub const HDR_LANG_ID_OFFSET_JET4: usize = 0x6e;
/// Offset of the code page (all versions).
pub const HDR_CODE_PAGE_OFFSET: usize = 0x3c;
/// Offset of the 32-bit obfuscation key; non-zero means the file is
/// RC4-obfuscated page by page.
pub const HDR_DB_KEY_OFFSET: usize = 0x3e;

// ── Page types (first byte of every page) ───────────────────────────

/// Database header page.
pub const PAGE_DB: u8 = 0;
/// Data page holding table rows.
pub const PAGE_DATA: u8 = 1;
/// Table definition page.
pub const PAGE_TABLE: u8 = 2;
/// Index metadata page.
pub const PAGE_INDEX: u8 = 3;
/// Index leaf page.
pub const PAGE_LEAF: u8 = 4;
/// Usage bitmap page.
pub const PAGE_MAP: u8 = 5;

// ── Row directory ───────────────────────────────────────────────────

/// Low 13 bits of a row pointer are the row offset within the page.
pub const OFFSET_MASK: u16 = 0x1FFF;
/// Row pointer flag: lookup row.
pub const ROW_LOOKUP_FLAG: u16 = 0x8000;
/// Row pointer flag: deleted row.
pub const ROW_DELETED_FLAG: u16 = 0x4000;
/// Row indexes above this are rejected as corrupt directory entries.
pub const MAX_ROW_INDEX: u16 = 1000;

// ── Catalog ─────────────────────────────────────────────────────────

/// Root page of the system objects table (MSysObjects).
pub const CATALOG_ROOT_PAGE: u32 = 2;
/// A catalog entry with any of these flag bits set is a system or
/// linked object, not a user table.
pub const CATALOG_SYSTEM_FLAGS: u32 = 0x8000_0002;

// ── Memo cells ──────────────────────────────────────────────────────

/// Size of the fixed memo cell (length word + page-row handle + padding).
pub const MEMO_OVERHEAD: usize = 12;
/// Memo flag: payload is inline after the cell.
pub const MEMO_INLINE_FLAG: u32 = 0x8000_0000;
/// Memo flag: payload lives in a single external page-row.
pub const MEMO_SINGLE_FLAG: u32 = 0x4000_0000;
/// Mask over the memo flag byte; zero means a multi-page chain.
pub const MEMO_FLAG_MASK: u32 = 0xFF00_0000;

// ── Version-dependent structural offsets ────────────────────────────

/// The set of structural offsets for one on-disk format generation.
///
/// Offsets named `tab_*` are relative to the start of a table definition
/// page; offsets named `col_*` are relative to the start of one column
/// attribute record.
#[derive(Debug)]
pub struct JetFormat {
    /// Page size in bytes.
    pub page_size: usize,
    /// Offset of the 16-bit row count on data pages; the row pointer
    /// directory starts two bytes later.
    pub row_count_offset: usize,
    /// Offset of the table's total row count (u32).
    pub tab_num_rows_offset: usize,
    /// Offset of the declared column count (u16); the variable-column
    /// count sits two bytes before it.
    pub tab_num_cols_offset: usize,
    /// Offset of the logical index count (u32).
    pub tab_num_idxs_offset: usize,
    /// Offset of the real (physical) index count (u32).
    pub tab_num_ridxs_offset: usize,
    /// Offset of the usage-map page-row handle (u32).
    pub tab_usage_map_offset: usize,
    /// Offset of the first data page number (u16).
    pub tab_first_dpg_offset: usize,
    /// Offset of the free-space-map page-row handle (u32).
    pub tab_free_map_offset: usize,
    /// Offset where the column attribute block begins, before the
    /// per-real-index entries are skipped.
    pub tab_cols_start_offset: usize,
    /// Size of one real-index entry preceding the column block.
    pub tab_ridx_entry_size: usize,
    /// Size of one column attribute record.
    pub tab_col_entry_size: usize,
    /// Offset of the variable-column index (u16) within a column record.
    pub tab_col_offset_var: usize,
    /// Offset of the fixed-column data offset (u16) within a column record.
    pub tab_col_offset_fixed: usize,
    /// Offset of the row-column number (u16) within a column record.
    pub tab_row_col_num_offset: usize,
    /// Offset of the column number within a column record.
    pub col_num_offset: usize,
    /// Offset of the numeric scale within a column record.
    pub col_scale_offset: usize,
    /// Offset of the numeric precision within a column record.
    pub col_prec_offset: usize,
    /// Offset of the flags byte within a column record.
    pub col_flags_offset: usize,
    /// Offset of the column size (u16) within a column record.
    pub col_size_offset: usize,
}

/// Structural offsets for Jet3 (Access 97) files.
pub const JET3_FORMAT: JetFormat = JetFormat {
    page_size: 2048,
    row_count_offset: 0x08,
    tab_num_rows_offset: 12,
    tab_num_cols_offset: 25,
    tab_num_idxs_offset: 27,
    tab_num_ridxs_offset: 31,
    tab_usage_map_offset: 35,
    tab_first_dpg_offset: 36,
    tab_free_map_offset: 39,
    tab_cols_start_offset: 43,
    tab_ridx_entry_size: 8,
    tab_col_entry_size: 18,
    tab_col_offset_var: 3,
    tab_col_offset_fixed: 14,
    tab_row_col_num_offset: 5,
    col_num_offset: 1,
    col_scale_offset: 9,
    col_prec_offset: 10,
    col_flags_offset: 13,
    col_size_offset: 16,
};

/// Structural offsets for Jet4 and the ACCDB generations.
pub const JET4_FORMAT: JetFormat = JetFormat {
    page_size: 4096,
    row_count_offset: 0x0c,
    tab_num_rows_offset: 16,
    tab_num_cols_offset: 45,
    tab_num_idxs_offset: 47,
    tab_num_ridxs_offset: 51,
    tab_usage_map_offset: 55,
    tab_first_dpg_offset: 56,
    tab_free_map_offset: 59,
    tab_cols_start_offset: 63,
    tab_ridx_entry_size: 12,
    tab_col_entry_size: 25,
    tab_col_offset_var: 7,
    tab_col_offset_fixed: 21,
    tab_row_col_num_offset: 9,
    col_num_offset: 5,
    col_scale_offset: 11,
    col_prec_offset: 12,
    col_flags_offset: 15,
    col_size_offset: 23,
};
