//! Usage-map traversal.
//!
//! Every table carries a usage map: a small length-prefixed byte array
//! whose first byte selects one of two encodings. Type 0 is an inline
//! bitmap relative to a base page; type 1 is an array of bitmap-page
//! numbers, each of which covers `(page_size - 4) * 8` consecutive
//! logical pages. The walker answers one question: given the last data
//! page visited, which page comes next?

use crate::jet::codec::get_u32;
use crate::jet::pagefile::PageFile;
use crate::MdbError;

/// Find the next allocated page after `start_pg`.
///
/// Returns `Ok(Some(pg))` for the next data page, `Ok(None)` when the
/// map is exhausted, and an error for an unrecognized map type or an
/// unreadable bitmap page (callers fall back to a sequential scan).
pub fn map_find_next(
    file: &mut PageFile,
    map: &[u8],
    start_pg: u32,
) -> Result<Option<u32>, MdbError> {
    match map.first().copied() {
        Some(0) => Ok(map_find_next_inline(map, start_pg)),
        Some(1) => map_find_next_indirect(file, map, start_pg),
        Some(other) => Err(MdbError::Parse(format!(
            "Unrecognized usage map type: 0x{:02x}",
            other
        ))),
        None => Err(MdbError::Parse("Empty usage map".to_string())),
    }
}

/// Type 0: bytes 1..5 hold the base page number, the rest is a bitmap
/// with one bit per page starting at the base.
pub(crate) fn map_find_next_inline(map: &[u8], start_pg: u32) -> Option<u32> {
    if map.len() < 5 {
        return None;
    }

    let base_pg = get_u32(map, 1);
    let bitmap = &map[5..];
    let bitlen = bitmap.len() * 8;

    let first = if start_pg >= base_pg {
        (start_pg - base_pg + 1) as usize
    } else {
        0
    };

    for i in first..bitlen {
        if bitmap[i / 8] & (1 << (i % 8)) != 0 {
            return Some(base_pg + i as u32);
        }
    }

    None
}

/// Type 1: bytes after the type are 4-byte bitmap-page numbers. Each
/// referenced page holds a 4-byte header and then a bitmap covering
/// `(page_size - 4) * 8` logical pages. Zero entries cover no pages.
fn map_find_next_indirect(
    file: &mut PageFile,
    map: &[u8],
    start_pg: u32,
) -> Result<Option<u32>, MdbError> {
    let page_size = file.page_size();
    let bitlen = (page_size - 4) * 8;
    let max_map_pgs = (map.len() - 1) / 4;

    let mut map_ind = (start_pg as usize + 1) / bitlen;
    let mut offset = (start_pg as usize + 1) % bitlen;

    while map_ind < max_map_pgs {
        let map_pg = get_u32(map, map_ind * 4 + 1);
        if map_pg != 0 {
            let bitmap_page = file.read_page_owned(map_pg).map_err(|_| {
                MdbError::Parse(format!("Short read of usage bitmap page {}", map_pg))
            })?;

            let bitmap = &bitmap_page[4..];
            for i in offset..bitlen {
                if bitmap[i / 8] & (1 << (i % 8)) != 0 {
                    return Ok(Some((map_ind * bitlen + i) as u32));
                }
            }
        }

        offset = 0;
        map_ind += 1;
    }

    Ok(None)
}
