//! Typed field rendering.
//!
//! Turns a cracked [`Field`] extent into output text, dispatching on
//! the column type. Memo columns resolve their out-of-row payload here
//! (inline, single external page-row, or a multi-page chain). Binary
//! columns keep their raw bytes so the CSV layer can apply its own
//! emission policy.
//!
//! Two long-standing rendering behaviors are kept for output
//! compatibility: FLOAT/DOUBLE values are truncated to their integer
//! part by splitting the rendered string at the decimal point, and
//! OLE, MONEY, and replication-id values render as empty strings.

use chrono::NaiveDate;

use crate::jet::codec::{self, get_f32, get_f64, get_u16, get_u32, get_u8};
use crate::jet::constants::*;
use crate::jet::pagefile::PageFile;
use crate::jet::rows::Field;
use crate::jet::table::{ColType, Column};

/// Rendering configuration for value-to-text conversion.
#[derive(Debug, Clone)]
pub struct ValueFormat {
    /// strftime-style pattern for DATETIME values.
    pub date_fmt: String,
    /// Pattern used when a column's Format property is "Short Date".
    pub shortdate_fmt: String,
    /// Text for a true BOOL.
    pub bool_true: String,
    /// Text for a false BOOL.
    pub bool_false: String,
}

impl Default for ValueFormat {
    fn default() -> Self {
        ValueFormat {
            date_fmt: "%x %X".to_string(),
            shortdate_fmt: "%x".to_string(),
            bool_true: "1".to_string(),
            bool_false: "0".to_string(),
        }
    }
}

impl ValueFormat {
    /// Use the words TRUE/FALSE for BOOL values instead of 1/0.
    pub fn with_boolean_words(mut self) -> Self {
        self.bool_true = "TRUE".to_string();
        self.bool_false = "FALSE".to_string();
        self
    }
}

/// A rendered field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// SQL null.
    Null,
    /// Rendered text.
    Text(String),
    /// Raw bytes from a binary-typed column.
    Bytes(Vec<u8>),
}

impl Value {
    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Render one field of the current page's row.
pub fn field_to_value(
    file: &mut PageFile,
    col: &Column,
    field: &Field,
    fmt: &ValueFormat,
) -> Value {
    // BOOL stores its value in the nullmask bit itself.
    if col.col_type == ColType::Bool {
        let text = if field.is_null {
            fmt.bool_false.clone()
        } else {
            fmt.bool_true.clone()
        };
        return Value::Text(text);
    }

    if field.is_null || field.size == 0 {
        return Value::Null;
    }

    let (start, size) = (field.start, field.size);
    let buf = file.buf();

    match col.col_type {
        ColType::Bool => unreachable!(),
        ColType::Byte => Value::Text(get_u8(buf, start).to_string()),
        ColType::Int => Value::Text(get_u16(buf, start).to_string()),
        ColType::LongInt | ColType::Complex => Value::Text(get_u32(buf, start).to_string()),
        ColType::Float => Value::Text(truncate_fraction(get_f32(buf, start).to_string())),
        ColType::Double => Value::Text(truncate_fraction(get_f64(buf, start).to_string())),
        ColType::DateTime => Value::Text(date_to_string(file, col, fmt, start)),
        ColType::Text => {
            let raw = buf[start..start + size].to_vec();
            Value::Text(file.decode_text(&raw))
        }
        ColType::Binary => Value::Bytes(buf[start..start + size].to_vec()),
        ColType::Numeric => Value::Text(numeric_to_string(buf, start)),
        ColType::Memo => Value::Text(memo_to_string(file, start, size)),
        ColType::Ole | ColType::Money | ColType::RepId => Value::Text(String::new()),
        ColType::Unknown(t) => {
            eprintln!("Warning: cannot render unsupported column type 0x{:02x}", t);
            Value::Text(String::new())
        }
    }
}

/// Keep only the integer part of a rendered float.
fn truncate_fraction(rendered: String) -> String {
    match rendered.split_once('.') {
        Some((head, _)) => head.to_string(),
        None => rendered,
    }
}

/// Fold a NUMERIC cell into decimal text.
///
/// Sixteen bytes starting one past the cell's sign byte, folded
/// `acc * 16 + byte`; the result tops out below 2^68, so a `u128`
/// holds it. Scale and precision are not applied.
fn numeric_to_string(buf: &[u8], start: usize) -> String {
    if start + 17 > buf.len() {
        return String::new();
    }

    let mut acc: u128 = 0;
    for &b in &buf[start + 1..start + 17] {
        acc = acc * 16 + b as u128;
    }
    acc.to_string()
}

/// Render a DATETIME field with the configured pattern.
fn date_to_string(file: &PageFile, col: &Column, fmt: &ValueFormat, start: usize) -> String {
    let serial = get_f64(file.buf(), start);
    let pattern = if col
        .format_prop
        .as_deref()
        .is_some_and(|p| p == "Short Date")
    {
        &fmt.shortdate_fmt
    } else {
        &fmt.date_fmt
    };

    match format_serial_date(serial, pattern) {
        Some(text) => text,
        None => {
            eprintln!("Warning: date value {} out of range", serial);
            String::new()
        }
    }
}

/// Format a serial date value with a strftime-style pattern.
pub fn format_serial_date(serial: f64, pattern: &str) -> Option<String> {
    let tm = codec::serial_date_to_tm(serial)?;
    let dt = NaiveDate::from_ymd_opt(tm.year, tm.month, tm.day)?
        .and_hms_opt(tm.hour, tm.minute, tm.second)?;
    Some(dt.format(pattern).to_string())
}

/// Resolve a memo cell into text.
///
/// The 12-byte cell holds a length word (flags in the top byte) and a
/// page-row handle. Payload may be inline after the cell, in a single
/// external page-row, or spread over a chain of page-rows that each
/// start with the next handle.
fn memo_to_string(file: &mut PageFile, start: usize, size: usize) -> String {
    if size < MEMO_OVERHEAD {
        return String::new();
    }

    let buf = file.buf();
    let memo_len = get_u32(buf, start);
    let pg_row = get_u32(buf, start + 4);

    if memo_len & MEMO_INLINE_FLAG != 0 {
        let raw = buf[start + MEMO_OVERHEAD..start + size].to_vec();
        return file.decode_text(&raw);
    }

    if memo_len & MEMO_SINGLE_FLAG != 0 {
        return match file.find_pg_row(pg_row) {
            Ok(row) => file.decode_text(row.bytes()),
            Err(e) => {
                eprintln!("Warning: cannot resolve memo page-row: {}", e);
                String::new()
            }
        };
    }

    if memo_len & MEMO_FLAG_MASK != 0 {
        eprintln!("Warning: unhandled memo flags 0x{:02x}", memo_len >> 24);
        return String::new();
    }

    // Multi-page chain: each chunk starts with the next handle.
    let memo_len = memo_len as usize;
    let mut acc: Vec<u8> = Vec::with_capacity(memo_len);
    let mut pg_row = pg_row;

    loop {
        let row = match file.find_pg_row(pg_row) {
            Ok(row) => row,
            Err(e) => {
                eprintln!("Warning: broken memo chain: {}", e);
                break;
            }
        };

        // A chunk too small to carry the next handle ends the chain, as
        // does a chunk that would overrun the declared length.
        if row.len < 4 {
            break;
        }
        if acc.len() + row.len - 4 > memo_len {
            break;
        }

        acc.extend_from_slice(&row.data[row.start + 4..row.start + row.len]);
        pg_row = get_u32(&row.data, row.start);
        if pg_row == 0 {
            break;
        }
    }

    if acc.len() < memo_len {
        eprintln!(
            "Warning: memo shorter than declared ({} of {} bytes)",
            acc.len(),
            memo_len
        );
    }

    file.decode_text(&acc)
}
