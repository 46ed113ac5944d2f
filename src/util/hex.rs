//! Hex dump formatting.

/// Format a page-row handle as `page:row`.
pub fn format_pg_row(pg_row: u32) -> String {
    format!("{}:{}", pg_row >> 8, pg_row & 0xFF)
}

/// Format bytes as a compact lowercase hex string.
pub fn format_bytes(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Render a classic hex dump: offset column, 16 hex bytes in two
/// groups of eight, and an ASCII sidebar.
pub fn hex_dump(data: &[u8], base_offset: u64) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for (line_no, chunk) in data.chunks(16).enumerate() {
        if line_no > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{:08x} ", base_offset + line_no as u64 * 16);

        for i in 0..16 {
            if i % 8 == 0 {
                out.push(' ');
            }
            match chunk.get(i) {
                Some(b) => {
                    let _ = write!(out, "{:02x} ", b);
                }
                None => out.push_str("   "),
            }
        }

        out.push_str(" |");
        for &b in chunk {
            out.push(if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            });
        }
        out.push('|');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pg_row() {
        assert_eq!(format_pg_row(0x0000_0501), "5:1");
        assert_eq!(format_pg_row(0x0102_03FF), "66051:255");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(&[0x4a, 0x2f, 0x00, 0xff]), "4a2f00ff");
        assert_eq!(format_bytes(&[]), "");
    }

    #[test]
    fn test_hex_dump_shape() {
        let data: Vec<u8> = (0..20).collect();
        let dump = hex_dump(&data, 0x1000);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00001000 "));
        assert!(lines[1].starts_with("00001010 "));
        assert!(lines[0].contains("00 01 02 03 04 05 06 07"));
        assert!(lines[0].ends_with('|'));
    }

    #[test]
    fn test_hex_dump_ascii_sidebar() {
        let dump = hex_dump(b"MSysObjects\x00\x01", 0);
        assert!(dump.contains("|MSysObjects..|"));
    }
}
