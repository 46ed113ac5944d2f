//! Search-argument trees.
//!
//! A scan can carry an optional filter tree: leaves compare one column
//! against a literal, inner nodes combine results with AND/OR/NOT. The
//! evaluator works directly on the cracked row, decoding only the
//! columns the tree touches. Row filtering itself is optional; the
//! scan consults a tree only when one is installed.

use crate::jet::codec::{self, get_f32, get_f64, get_u16, get_u32};
use crate::jet::rows::Field;
use crate::jet::table::{ColType, Column};

/// Comparison and combination operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SargOp {
    Equal,
    Gt,
    Lt,
    GtEq,
    LtEq,
    NotEq,
    Like,
    ILike,
    IsNull,
    NotNull,
}

/// A literal comparison value.
#[derive(Debug, Clone)]
pub enum SargValue {
    Int(i64),
    Double(f64),
    Text(String),
}

impl SargValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            SargValue::Int(i) => Some(*i as f64),
            SargValue::Double(d) => Some(*d),
            SargValue::Text(_) => None,
        }
    }
}

/// A node of the filter tree.
#[derive(Debug, Clone)]
pub enum SargNode {
    /// Compare the column at `col` (declared order) against `value`.
    Compare {
        op: SargOp,
        col: usize,
        value: SargValue,
    },
    Not(Box<SargNode>),
    And(Box<SargNode>, Box<SargNode>),
    Or(Box<SargNode>, Box<SargNode>),
}

impl SargNode {
    /// Evaluate the tree against a cracked row.
    ///
    /// `buf` is the page holding the row; unknown operators or types
    /// warn and accept, so a bad filter never silently drops rows.
    pub fn matches(&self, buf: &[u8], is_jet3: bool, columns: &[Column], fields: &[Field]) -> bool {
        match self {
            SargNode::Not(inner) => !inner.matches(buf, is_jet3, columns, fields),
            SargNode::And(left, right) => {
                left.matches(buf, is_jet3, columns, fields)
                    && right.matches(buf, is_jet3, columns, fields)
            }
            SargNode::Or(left, right) => {
                left.matches(buf, is_jet3, columns, fields)
                    || right.matches(buf, is_jet3, columns, fields)
            }
            SargNode::Compare { op, col, value } => {
                let (Some(column), Some(field)) = (columns.get(*col), fields.get(*col)) else {
                    return true;
                };
                test_compare(*op, value, column, field, buf, is_jet3)
            }
        }
    }
}

fn test_compare(
    op: SargOp,
    value: &SargValue,
    column: &Column,
    field: &Field,
    buf: &[u8],
    is_jet3: bool,
) -> bool {
    match op {
        SargOp::IsNull => return field.is_null,
        SargOp::NotNull => return !field.is_null,
        _ => {}
    }

    // BOOL carries its value in the presence bit, so it never reads as
    // null the way other types do.
    if column.col_type == ColType::Bool {
        return test_int(op, value, u64::from(!field.is_null));
    }

    if field.is_null {
        return false;
    }

    match column.col_type {
        ColType::Bool => unreachable!(),
        ColType::Byte => test_int(op, value, buf[field.start] as u64),
        ColType::Int => test_int(op, value, get_u16(buf, field.start) as u64),
        ColType::LongInt | ColType::Complex => {
            test_int(op, value, get_u32(buf, field.start) as u64)
        }
        ColType::Float => test_double(op, value, get_f32(buf, field.start) as f64),
        ColType::Double => test_double(op, value, get_f64(buf, field.start)),
        ColType::DateTime => {
            // Compare at microsecond resolution.
            let rounded = |d: f64| (d * 1e6).round() / 1e6;
            match value.as_f64() {
                Some(v) => test_double_vals(op, rounded(v), rounded(get_f64(buf, field.start))),
                None => true,
            }
        }
        ColType::Text => {
            let text =
                codec::decode_text(is_jet3, &buf[field.start..field.start + field.size]);
            test_string(op, value, &text)
        }
        other => {
            eprintln!(
                "Warning: cannot filter on column type {}; row accepted",
                other.name()
            );
            true
        }
    }
}

fn test_int(op: SargOp, value: &SargValue, actual: u64) -> bool {
    match value.as_f64() {
        Some(v) => test_double_vals(op, v, actual as f64),
        None => true,
    }
}

fn test_double(op: SargOp, value: &SargValue, actual: f64) -> bool {
    match value.as_f64() {
        Some(v) => test_double_vals(op, v, actual),
        None => true,
    }
}

fn test_double_vals(op: SargOp, wanted: f64, actual: f64) -> bool {
    match op {
        SargOp::Equal => wanted == actual,
        SargOp::Gt => wanted < actual,
        SargOp::Lt => wanted > actual,
        SargOp::GtEq => wanted <= actual,
        SargOp::LtEq => wanted >= actual,
        SargOp::NotEq => wanted != actual,
        _ => {
            eprintln!("Warning: unsupported numeric filter operator {:?}", op);
            true
        }
    }
}

fn test_string(op: SargOp, value: &SargValue, actual: &str) -> bool {
    let SargValue::Text(wanted) = value else {
        return true;
    };
    match op {
        SargOp::Like => like_cmp(actual, wanted),
        SargOp::ILike => like_cmp(&actual.to_uppercase(), &wanted.to_uppercase()),
        SargOp::Equal => actual == wanted,
        SargOp::Gt => actual > wanted.as_str(),
        SargOp::Lt => actual < wanted.as_str(),
        SargOp::GtEq => actual >= wanted.as_str(),
        SargOp::LtEq => actual <= wanted.as_str(),
        SargOp::NotEq => actual != wanted.as_str(),
        _ => {
            eprintln!("Warning: unsupported string filter operator {:?}", op);
            true
        }
    }
}

/// SQL LIKE: `%` matches any run of characters, `_` any single one.
pub fn like_cmp(s: &str, pattern: &str) -> bool {
    let mut pat = pattern.chars();
    match pat.next() {
        None => s.is_empty(),
        Some('_') => {
            let mut chars = s.chars();
            chars.next().is_some() && like_cmp(chars.as_str(), pat.as_str())
        }
        Some('%') => {
            let rest = pat.as_str();
            if like_cmp(s, rest) {
                return true;
            }
            let mut chars = s.chars();
            while chars.next().is_some() {
                if like_cmp(chars.as_str(), rest) {
                    return true;
                }
            }
            false
        }
        Some(c) => {
            let mut chars = s.chars();
            chars.next() == Some(c) && like_cmp(chars.as_str(), pat.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LittleEndian};

    fn column(col_num: u8, col_type: ColType) -> Column {
        Column {
            name: format!("c{}", col_num),
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

    fn field(colnum: usize, start: usize, size: usize) -> Field {
        Field {
            colnum,
            start,
            size,
            is_null: false,
            is_fixed: true,
        }
    }

    #[test]
    fn test_like_cmp() {
        assert!(like_cmp("hello", "hello"));
        assert!(like_cmp("hello", "h%"));
        assert!(like_cmp("hello", "%llo"));
        assert!(like_cmp("hello", "h_llo"));
        assert!(like_cmp("hello", "%"));
        assert!(like_cmp("", "%"));
        assert!(!like_cmp("hello", "h_"));
        assert!(!like_cmp("hello", "world"));
        assert!(like_cmp("abcabc", "%abc"));
        assert!(!like_cmp("", "_"));
    }

    #[test]
    fn test_compare_longint() {
        let mut buf = vec![0u8; 16];
        LittleEndian::write_u32(&mut buf[4..], 42);
        let cols = vec![column(0, ColType::LongInt)];
        let fields = vec![field(0, 4, 4)];

        let eq = SargNode::Compare {
            op: SargOp::Equal,
            col: 0,
            value: SargValue::Int(42),
        };
        assert!(eq.matches(&buf, false, &cols, &fields));

        let gt = SargNode::Compare {
            op: SargOp::Gt,
            col: 0,
            value: SargValue::Int(41),
        };
        assert!(gt.matches(&buf, false, &cols, &fields));

        let lt = SargNode::Compare {
            op: SargOp::Lt,
            col: 0,
            value: SargValue::Int(41),
        };
        assert!(!lt.matches(&buf, false, &cols, &fields));
    }

    #[test]
    fn test_compare_text_and_boolean_logic() {
        // UTF-16LE "abc".
        let buf = vec![0x61, 0, 0x62, 0, 0x63, 0];
        let cols = vec![column(0, ColType::Text)];
        let fields = vec![field(0, 0, 6)];

        let like = SargNode::Compare {
            op: SargOp::Like,
            col: 0,
            value: SargValue::Text("a%".to_string()),
        };
        let neq = SargNode::Compare {
            op: SargOp::NotEq,
            col: 0,
            value: SargValue::Text("abc".to_string()),
        };
        assert!(like.matches(&buf, false, &cols, &fields));
        assert!(!neq.matches(&buf, false, &cols, &fields));

        let both = SargNode::And(Box::new(like.clone()), Box::new(neq.clone()));
        assert!(!both.matches(&buf, false, &cols, &fields));
        let either = SargNode::Or(Box::new(like.clone()), Box::new(neq.clone()));
        assert!(either.matches(&buf, false, &cols, &fields));
        let negated = SargNode::Not(Box::new(neq));
        assert!(negated.matches(&buf, false, &cols, &fields));
    }

    #[test]
    fn test_null_operators() {
        let buf = vec![0u8; 4];
        let cols = vec![column(0, ColType::LongInt)];
        let mut f = field(0, 0, 4);
        f.is_null = true;
        let fields = vec![f];

        let isnull = SargNode::Compare {
            op: SargOp::IsNull,
            col: 0,
            value: SargValue::Int(0),
        };
        let notnull = SargNode::Compare {
            op: SargOp::NotNull,
            col: 0,
            value: SargValue::Int(0),
        };
        assert!(isnull.matches(&buf, false, &cols, &fields));
        assert!(!notnull.matches(&buf, false, &cols, &fields));

        // A comparison against a null field fails rather than erroring.
        let eq = SargNode::Compare {
            op: SargOp::Equal,
            col: 0,
            value: SargValue::Int(0),
        };
        assert!(!eq.matches(&buf, false, &cols, &fields));
    }
}
