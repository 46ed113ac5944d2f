//! Table definition parsing.
//!
//! A table's root page (type `0x02`) carries the row count, column
//! counts, index counts, page-row handles for the two usage maps, and
//! the column attribute block. Column records live in a contiguous
//! block read through the paged metadata stream, followed by the
//! length-prefixed column names. Attribute order need not match the
//! declared order, so columns are re-sorted by column number after
//! parsing.

use serde::Serialize;

use crate::jet::codec::{get_u16, get_u32, get_u8};
use crate::jet::constants::*;
use crate::jet::pagefile::PageFile;
use crate::MdbError;

/// Column data type, from the type byte of a column record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColType {
    /// Yes/no value carried by the row's nullmask bit.
    Bool,
    /// Unsigned 8-bit integer.
    Byte,
    /// 16-bit integer.
    Int,
    /// 32-bit integer.
    LongInt,
    /// Currency (not rendered).
    Money,
    /// IEEE 754 single.
    Float,
    /// IEEE 754 double.
    Double,
    /// Serial date stored as a double.
    DateTime,
    /// Fixed-length binary.
    Binary,
    /// Text, fixed or variable.
    Text,
    /// OLE object (not rendered).
    Ole,
    /// Long text or blob stored outside the row.
    Memo,
    /// Replication id (not rendered).
    RepId,
    /// Scaled decimal.
    Numeric,
    /// Complex/attachment column (32-bit key).
    Complex,
    /// Unrecognized type byte.
    Unknown(u8),
}

impl ColType {
    /// Map a raw type byte to a `ColType`.
    pub fn from_u8(val: u8) -> Self {
        match val {
            0x01 => ColType::Bool,
            0x02 => ColType::Byte,
            0x03 => ColType::Int,
            0x04 => ColType::LongInt,
            0x05 => ColType::Money,
            0x06 => ColType::Float,
            0x07 => ColType::Double,
            0x08 => ColType::DateTime,
            0x09 => ColType::Binary,
            0x0a => ColType::Text,
            0x0b => ColType::Ole,
            0x0c => ColType::Memo,
            0x0f => ColType::RepId,
            0x10 => ColType::Numeric,
            0x12 => ColType::Complex,
            other => ColType::Unknown(other),
        }
    }

    /// Short uppercase type name.
    pub fn name(&self) -> &'static str {
        match self {
            ColType::Bool => "BOOL",
            ColType::Byte => "BYTE",
            ColType::Int => "INT",
            ColType::LongInt => "LONGINT",
            ColType::Money => "MONEY",
            ColType::Float => "FLOAT",
            ColType::Double => "DOUBLE",
            ColType::DateTime => "DATETIME",
            ColType::Binary => "BINARY",
            ColType::Text => "TEXT",
            ColType::Ole => "OLE",
            ColType::Memo => "MEMO",
            ColType::RepId => "REPID",
            ColType::Numeric => "NUMERIC",
            ColType::Complex => "COMPLEX",
            ColType::Unknown(_) => "UNKNOWN",
        }
    }

    /// Whether CSV emission treats the value as raw bytes.
    pub fn is_binary_kind(&self) -> bool {
        matches!(self, ColType::Ole | ColType::Binary | ColType::RepId)
    }
}

/// One column of a table.
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Data type.
    pub col_type: ColType,
    /// Column number; also the column's bit in the row nullmask.
    pub col_num: u8,
    /// Index into the per-row variable-column offset table.
    pub var_col_num: u16,
    /// Column's position in the row layout.
    pub row_col_num: u16,
    /// Declared size in bytes (zero for BOOL).
    pub col_size: u16,
    /// Data offset within the row for fixed columns.
    pub fixed_offset: u16,
    /// Whether the column is stored at a fixed offset.
    pub is_fixed: bool,
    /// Autonumber (long) column.
    pub is_long_auto: bool,
    /// Autonumber (uuid) column.
    pub is_uuid_auto: bool,
    /// Decimal scale, for NUMERIC/MONEY/FLOAT/DOUBLE.
    pub col_scale: u8,
    /// Decimal precision, for NUMERIC/MONEY/FLOAT/DOUBLE.
    pub col_prec: u8,
    /// The column's "Format" property, when known (drives short-date
    /// rendering).
    pub format_prop: Option<String>,
}

/// A parsed table definition.
#[derive(Debug)]
pub struct TableDef {
    /// Table name (from the catalog entry).
    pub name: String,
    /// Root page of the definition.
    pub root_page: u32,
    /// Declared row count.
    pub num_rows: u32,
    /// Declared column count.
    pub num_cols: u16,
    /// Number of variable-width columns.
    pub num_var_cols: u16,
    /// Logical index count.
    pub num_idxs: u32,
    /// Real (physical) index count.
    pub num_real_idxs: u32,
    /// First data page hint.
    pub first_data_page: u16,
    /// Columns in declared (`col_num`) order.
    pub columns: Vec<Column>,
    /// The table's data-page usage map.
    pub usage_map: Vec<u8>,
    /// The table's free-space usage map.
    pub free_usage_map: Vec<u8>,
}

impl TableDef {
    /// Parse the table definition rooted at `root_page`.
    pub fn read(file: &mut PageFile, name: &str, root_page: u32) -> Result<TableDef, MdbError> {
        file.read_page(root_page)?;
        let fmt = file.format();

        let first = file.buf()[0];
        if first != PAGE_TABLE {
            return Err(MdbError::Parse(format!(
                "Page {} is not a table definition page (first byte 0x{:02x}, expected 0x02)",
                root_page, first
            )));
        }

        let buf = file.buf();
        let num_rows = get_u32(buf, fmt.tab_num_rows_offset);
        let num_var_cols = get_u16(buf, fmt.tab_num_cols_offset - 2);
        let num_cols = get_u16(buf, fmt.tab_num_cols_offset);
        let num_idxs = get_u32(buf, fmt.tab_num_idxs_offset);
        let num_real_idxs = get_u32(buf, fmt.tab_num_ridxs_offset);
        let usage_map_handle = get_u32(buf, fmt.tab_usage_map_offset);
        let free_map_handle = get_u32(buf, fmt.tab_free_map_offset);
        let first_data_page = get_u16(buf, fmt.tab_first_dpg_offset);

        let map_row = file.find_pg_row(usage_map_handle).map_err(|e| {
            MdbError::Parse(format!("Cannot read usage map of table {}: {}", name, e))
        })?;
        // The first byte of a usage map is its type and must be present.
        if map_row.len < 1 {
            return Err(MdbError::Parse(format!(
                "Invalid usage map size {} for table {}",
                map_row.len, name
            )));
        }
        let usage_map = map_row.bytes().to_vec();

        let free_row = file.find_pg_row(free_map_handle).map_err(|e| {
            MdbError::Parse(format!("Cannot read free map of table {}: {}", name, e))
        })?;
        let free_usage_map = free_row.bytes().to_vec();

        let mut def = TableDef {
            name: name.to_string(),
            root_page,
            num_rows,
            num_cols,
            num_var_cols,
            num_idxs,
            num_real_idxs,
            first_data_page,
            columns: Vec::with_capacity(num_cols as usize),
            usage_map,
            free_usage_map,
        };

        def.read_columns(file)?;
        Ok(def)
    }

    /// Read the column attribute block and names.
    ///
    /// Assumes the definition's root page is in the current buffer.
    fn read_columns(&mut self, file: &mut PageFile) -> Result<(), MdbError> {
        let fmt = file.format();
        let is_jet3 = file.version().is_jet3();

        let mut pos =
            fmt.tab_cols_start_offset + self.num_real_idxs as usize * fmt.tab_ridx_entry_size;

        for _ in 0..self.num_cols {
            let (rec, next) = file.read_meta(pos, fmt.tab_col_entry_size)?;
            pos = next;

            let col_type = ColType::from_u8(rec[0]);
            let flags = get_u8(&rec, fmt.col_flags_offset);

            let (col_scale, col_prec) = match col_type {
                ColType::Numeric | ColType::Money | ColType::Float | ColType::Double => (
                    get_u8(&rec, fmt.col_scale_offset),
                    get_u8(&rec, fmt.col_prec_offset),
                ),
                _ => (0, 0),
            };

            self.columns.push(Column {
                name: String::new(),
                col_type,
                col_num: get_u8(&rec, fmt.col_num_offset),
                var_col_num: get_u16(&rec, fmt.tab_col_offset_var),
                row_col_num: get_u16(&rec, fmt.tab_row_col_num_offset),
                // BOOL has no inline storage.
                col_size: if col_type == ColType::Bool {
                    0
                } else {
                    get_u16(&rec, fmt.col_size_offset)
                },
                fixed_offset: get_u16(&rec, fmt.tab_col_offset_fixed),
                is_fixed: flags & 0x01 != 0,
                is_long_auto: flags & 0x04 != 0,
                is_uuid_auto: flags & 0x40 != 0,
                col_scale,
                col_prec,
                format_prop: None,
            });
        }

        // Names follow the attribute block, in the same order.
        for i in 0..self.columns.len() {
            let (name_len, next) = if is_jet3 {
                let (n, next) = file.read_meta_u8(pos)?;
                (n as usize, next)
            } else {
                let (n, next) = file.read_meta_u16(pos)?;
                (n as usize, next)
            };
            let (raw, next) = file.read_meta(next, name_len)?;
            pos = next;
            self.columns[i].name = file.decode_text(&raw);
        }

        // Attribute order may differ from declared order.
        self.columns.sort_by_key(|c| c.col_num);
        Ok(())
    }

    /// Position of the named column in declared order, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, col_num: u8, col_type: ColType) -> Column {
        Column {
            name: name.to_string(),
            col_type,
            col_num,
            var_col_num: 0,
            row_col_num: col_num as u16,
            col_size: 4,
            fixed_offset: 0,
            is_fixed: true,
            is_long_auto: false,
            is_uuid_auto: false,
            col_scale: 0,
            col_prec: 0,
            format_prop: None,
        }
    }

    fn table_with_columns(columns: Vec<Column>) -> TableDef {
        TableDef {
            name: "T".to_string(),
            root_page: 2,
            num_rows: 0,
            num_cols: columns.len() as u16,
            num_var_cols: 0,
            num_idxs: 0,
            num_real_idxs: 0,
            first_data_page: 0,
            columns,
            usage_map: vec![0, 0, 0, 0, 0],
            free_usage_map: vec![0, 0, 0, 0, 0],
        }
    }

    #[test]
    fn test_col_type_mapping() {
        assert_eq!(ColType::from_u8(0x01), ColType::Bool);
        assert_eq!(ColType::from_u8(0x0a), ColType::Text);
        assert_eq!(ColType::from_u8(0x12), ColType::Complex);
        assert_eq!(ColType::from_u8(0x7e), ColType::Unknown(0x7e));
        assert_eq!(ColType::from_u8(0x0c).name(), "MEMO");
        assert!(ColType::Ole.is_binary_kind());
        assert!(!ColType::Memo.is_binary_kind());
    }

    #[test]
    fn test_column_index() {
        let def = table_with_columns(vec![
            column("Id", 0, ColType::LongInt),
            column("Name", 1, ColType::Text),
        ]);
        assert_eq!(def.column_index("Name"), Some(1));
        assert_eq!(def.column_index("Id"), Some(0));
        assert_eq!(def.column_index("Missing"), None);
    }
}
