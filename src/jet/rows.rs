//! Table scanning and row cracking.
//!
//! [`Table`] drives a forward-only scan over a table's data pages: the
//! usage map supplies candidate pages, each candidate is validated as a
//! data page belonging to this table, and every live row on it is
//! cracked into per-column [`Field`]s.
//!
//! The cracker reconstructs a packed row from its trailing structures:
//! a nullmask (inverted sense, one bit per column), the variable-column
//! offset table (byte-wide with a 256-byte jump table in Jet3, 16-bit
//! in Jet4), and the fixed-column offsets from the table definition.

use crate::jet::codec::{get_u16, get_u32};
use crate::jet::constants::*;
use crate::jet::pagefile::PageFile;
use crate::jet::sarg::SargNode;
use crate::jet::table::TableDef;
use crate::jet::usage_map::map_find_next;
use crate::jet::value::ValueFormat;
use crate::MdbError;

/// One cracked column of a row: an extent within the current page.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Index of the column in declared order.
    pub colnum: usize,
    /// Absolute start offset within the page (zero when absent).
    pub start: usize,
    /// Extent size in bytes.
    pub size: usize,
    /// Whether the value is null (nullmask bit clear or column absent).
    pub is_null: bool,
    /// Whether the column is fixed-width.
    pub is_fixed: bool,
}

#[derive(Debug, Default)]
struct Cursor {
    cur_pg_num: u32,
    cur_phys_pg: u32,
    cur_row: u16,
}

/// An open table: definition, scan cursor, and the last fetched row.
pub struct Table<'f> {
    file: &'f mut PageFile,
    def: TableDef,
    value_format: ValueFormat,
    cursor: Cursor,
    fields: Vec<Field>,
    /// When set, deleted rows are yielded instead of skipped.
    pub noskip_deleted: bool,
    filter: Option<SargNode>,
}

impl<'f> Table<'f> {
    pub(crate) fn new(file: &'f mut PageFile, def: TableDef, value_format: ValueFormat) -> Self {
        Table {
            file,
            def,
            value_format,
            cursor: Cursor::default(),
            fields: Vec::new(),
            noskip_deleted: false,
            filter: None,
        }
    }

    /// The table definition.
    pub fn def(&self) -> &TableDef {
        &self.def
    }

    /// The underlying page file.
    pub fn file(&self) -> &PageFile {
        self.file
    }

    /// The value rendering configuration in effect.
    pub fn value_format(&self) -> &ValueFormat {
        &self.value_format
    }

    /// The fields of the last row returned by [`fetch_row`](Self::fetch_row).
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Position of the named column in declared order, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.def.column_index(name)
    }

    /// Install a search-argument tree; rows it rejects are skipped.
    pub fn set_filter(&mut self, filter: SargNode) {
        self.filter = Some(filter);
    }

    /// Reset the scan to the first row.
    pub fn rewind(&mut self) {
        self.cursor = Cursor::default();
    }

    /// Advance to the next live row; `false` when the table is exhausted.
    pub fn fetch_row(&mut self) -> Result<bool, MdbError> {
        if self.cursor.cur_pg_num == 0 {
            self.cursor.cur_pg_num = 1;
            self.cursor.cur_row = 0;
            if self.read_next_data_page()? == 0 {
                return Ok(false);
            }
        }

        loop {
            let rows_on_page = get_u16(self.file.buf(), self.file.format().row_count_offset);
            if self.cursor.cur_row >= rows_on_page {
                self.cursor.cur_row = 0;
                if self.read_next_data_page()? == 0 {
                    return Ok(false);
                }
                continue;
            }

            let row = self.cursor.cur_row;
            self.cursor.cur_row += 1;
            if self.read_row(row)? {
                return Ok(true);
            }
        }
    }

    /// Decode the last fetched row's field for column `col_idx`.
    pub fn field_value(&mut self, col_idx: usize) -> crate::jet::value::Value {
        let col = &self.def.columns[col_idx];
        let field = &self.fields[col_idx];
        crate::jet::value::field_to_value(self.file, col, field, &self.value_format)
    }

    /// Advance the cursor to the next data page of this table.
    ///
    /// The fast path asks the usage map for the next page above the
    /// current physical page, then validates it (a data page carries
    /// byte 0 == 1 and this table's root page at bytes 4..8). When the
    /// map misbehaves, the scan degrades to a sequential sweep of the
    /// whole file. Returns 0 at exhaustion.
    fn read_next_data_page(&mut self) -> Result<u32, MdbError> {
        loop {
            let next_pg = match map_find_next(self.file, &self.def.usage_map, self.cursor.cur_phys_pg)
            {
                Ok(Some(pg)) => pg,
                Ok(None) => return Ok(0),
                Err(e) => {
                    eprintln!("Warning: {}", e);
                    break;
                }
            };

            // A map that hands back the page we are on would loop forever.
            if next_pg == self.cursor.cur_phys_pg {
                return Ok(0);
            }

            if !self.file.try_read_page(next_pg)? {
                eprintln!("Warning: reading page {} failed", next_pg);
                return Ok(0);
            }
            self.cursor.cur_phys_pg = next_pg;

            let buf = self.file.buf();
            if buf[0] == PAGE_DATA && get_u32(buf, 4) == self.def.root_page {
                return Ok(next_pg);
            }

            // Seen in the wild on very large files: the map occasionally
            // points at a foreign page.
            eprintln!(
                "Warning: page {} from usage map is not a data page of table {} (type 0x{:02x}, parent {})",
                next_pg,
                self.def.name,
                buf[0],
                get_u32(buf, 4)
            );
        }

        eprintln!(
            "Warning: falling back to sequential scan for table {}",
            self.def.name
        );
        loop {
            let pg = self.cursor.cur_phys_pg;
            self.cursor.cur_phys_pg += 1;
            if !self.file.try_read_page(pg)? {
                return Ok(0);
            }
            let buf = self.file.buf();
            if buf[0] == PAGE_DATA && get_u32(buf, 4) == self.def.root_page {
                return Ok(self.cursor.cur_phys_pg);
            }
        }
    }

    /// Read one row from the current page into `fields`.
    ///
    /// Returns `false` for deleted rows, unparseable rows, and rows the
    /// filter rejects.
    fn read_row(&mut self, row: u16) -> Result<bool, MdbError> {
        if self.def.columns.is_empty() {
            return Ok(false);
        }

        let loc = match self.file.find_row(row) {
            Some(loc) if loc.len > 0 => loc,
            _ => return Ok(false),
        };

        let deleted = loc.start & ROW_DELETED_FLAG != 0;
        if deleted && !self.noskip_deleted {
            return Ok(false);
        }
        let row_start = (loc.start & OFFSET_MASK) as usize;

        let is_jet3 = self.file.version().is_jet3();
        let fields = match crack_row(self.file.buf(), is_jet3, &self.def, row_start, loc.len) {
            Some(fields) => fields,
            None => {
                eprintln!(
                    "Warning: skipping unparseable row {} on page {} of table {}",
                    row,
                    self.cursor.cur_phys_pg,
                    self.def.name
                );
                return Ok(false);
            }
        };

        if let Some(filter) = &self.filter {
            if !filter.matches(self.file.buf(), is_jet3, &self.def.columns, &fields) {
                return Ok(false);
            }
        }

        self.fields = fields;
        Ok(true)
    }
}

/// Reconstruct the variable-column offset table of a Jet3 row.
///
/// Offsets are single bytes stored backward from `col_ptr`. Rows longer
/// than 256 bytes additionally carry a jump table below the nullmask:
/// each entry names the first offset index that lies past another
/// 256-byte boundary. A trailing jump whose implied region is empty is
/// a dummy and is dropped.
fn var_col_offsets3(
    buf: &[u8],
    row_start: usize,
    row_end: usize,
    bitmask_sz: usize,
    row_var_cols: usize,
) -> Option<Vec<usize>> {
    let row_len = row_end - row_start + 1;
    let mut num_jumps = (row_len - 1) / 256;
    let col_ptr = row_end.checked_sub(bitmask_sz + num_jumps + 1)?;

    if (col_ptr.checked_sub(row_start + row_var_cols)?) / 256 < num_jumps {
        num_jumps -= 1;
    }

    if col_ptr >= buf.len() || col_ptr.checked_sub(row_var_cols)? < row_start {
        return None;
    }

    let mut offsets = Vec::with_capacity(row_var_cols + 1);
    let mut jumps_used = 0usize;
    for i in 0..=row_var_cols {
        while jumps_used < num_jumps
            && i == buf[row_end - bitmask_sz - jumps_used - 1] as usize
        {
            jumps_used += 1;
        }
        offsets.push(buf[col_ptr - i] as usize + jumps_used * 256);
    }

    Some(offsets)
}

/// Reconstruct the variable-column offset table of a Jet4 row.
///
/// Offsets are 16-bit little-endian values stored backward starting
/// three bytes below the nullmask.
fn var_col_offsets4(
    buf: &[u8],
    row_start: usize,
    row_end: usize,
    bitmask_sz: usize,
    row_var_cols: usize,
) -> Option<Vec<usize>> {
    // The lowest entry must still sit inside the row.
    let lowest = row_end.checked_sub(bitmask_sz + 3 + row_var_cols * 2)?;
    if lowest < row_start {
        return None;
    }

    let mut offsets = Vec::with_capacity(row_var_cols + 1);
    for i in 0..=row_var_cols {
        offsets.push(get_u16(buf, row_end - bitmask_sz - 3 - i * 2) as usize);
    }

    Some(offsets)
}

/// Crack a packed row into per-column fields.
///
/// `None` means the row violates a structural invariant and must be
/// skipped: column counts out of range, trailing structures that
/// overrun the row, non-monotone variable offsets, or a field extent
/// escaping the row.
pub(crate) fn crack_row(
    buf: &[u8],
    is_jet3: bool,
    def: &TableDef,
    row_start: usize,
    row_size: usize,
) -> Option<Vec<Field>> {
    let row_end = row_start + row_size - 1;
    if row_end >= buf.len() {
        return None;
    }

    let (row_cols, col_count_size) = if is_jet3 {
        (buf[row_start] as usize, 1usize)
    } else {
        if row_size < 2 {
            return None;
        }
        (get_u16(buf, row_start) as usize, 2usize)
    };

    if row_cols > def.num_cols as usize || row_cols > 1000 {
        return None;
    }

    let bitmask_sz = (row_cols + 7) / 8;
    if bitmask_sz + col_count_size > row_size {
        return None;
    }
    let nullmask = &buf[row_end + 1 - bitmask_sz..row_end + 1];

    let mut row_var_cols = 0usize;
    let mut var_offsets: Vec<usize> = Vec::new();
    if def.num_var_cols > 0 {
        if is_jet3 {
            row_var_cols = buf[row_end.checked_sub(bitmask_sz)?] as usize;
            var_offsets = var_col_offsets3(buf, row_start, row_end, bitmask_sz, row_var_cols)?;
        } else {
            row_var_cols = get_u16(buf, row_end.checked_sub(bitmask_sz + 1)?) as usize;
            var_offsets = var_col_offsets4(buf, row_start, row_end, bitmask_sz, row_var_cols)?;
        }
    }

    if row_var_cols > row_cols {
        return None;
    }
    let row_fixed_cols = row_cols - row_var_cols;

    let mut fields = Vec::with_capacity(def.columns.len());
    let mut fixed_cols_found = 0usize;

    for (i, col) in def.columns.iter().enumerate() {
        let byte_num = col.col_num as usize / 8;
        let bit_num = col.col_num as usize % 8;
        // Null sense is inverted: a set bit means the value is present.
        let mut is_null = byte_num >= nullmask.len() || nullmask[byte_num] & (1 << bit_num) == 0;

        let (start, size) = if col.is_fixed && fixed_cols_found < row_fixed_cols {
            fixed_cols_found += 1;
            (
                row_start + col_count_size + col.fixed_offset as usize,
                col.col_size as usize,
            )
        } else if !col.is_fixed && (col.var_col_num as usize) < row_var_cols {
            // A deleted column keeps its slot in the offset table, so
            // index by var_col_num rather than by position.
            let v = col.var_col_num as usize;
            let (lo, hi) = (var_offsets[v], var_offsets[v + 1]);
            if hi < lo {
                return None;
            }
            (row_start + lo, hi - lo)
        } else {
            // The row predates this column.
            is_null = true;
            (0, 0)
        };

        if start + size > row_start + row_size {
            return None;
        }

        fields.push(Field {
            colnum: i,
            start,
            size,
            is_null,
            is_fixed: col.is_fixed,
        });
    }

    Some(fields)
}
