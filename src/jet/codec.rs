//! Byte-level decoding primitives shared by every layer.
//!
//! Jet files store all multi-byte integers little-endian. On top of the
//! plain readers this module carries the three format-specific
//! transformations: the RC4 keystream used for whole-file obfuscation,
//! the compressed-UTF16 expansion used for text cells, and the serial
//! date conversion (days since 1899-12-30 with the fraction as time of
//! day).

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use rc4::{consts::U4, KeyInit, Rc4, StreamCipher};

/// Read a byte at `offset`.
#[inline]
pub fn get_u8(buf: &[u8], offset: usize) -> u8 {
    buf[offset]
}

/// Read a little-endian u16 at `offset`.
#[inline]
pub fn get_u16(buf: &[u8], offset: usize) -> u16 {
    LittleEndian::read_u16(&buf[offset..offset + 2])
}

/// Read a little-endian u32 at `offset`.
#[inline]
pub fn get_u32(buf: &[u8], offset: usize) -> u32 {
    LittleEndian::read_u32(&buf[offset..offset + 4])
}

/// Read a big-endian u32 at `offset`.
#[inline]
pub fn get_u32_be(buf: &[u8], offset: usize) -> u32 {
    BigEndian::read_u32(&buf[offset..offset + 4])
}

/// Read a little-endian IEEE 754 single at `offset`.
#[inline]
pub fn get_f32(buf: &[u8], offset: usize) -> f32 {
    LittleEndian::read_f32(&buf[offset..offset + 4])
}

/// Read a little-endian IEEE 754 double at `offset`.
#[inline]
pub fn get_f64(buf: &[u8], offset: usize) -> f64 {
    LittleEndian::read_f64(&buf[offset..offset + 8])
}

/// Apply the RC4 keystream for `key` to `buf` in place.
///
/// RC4 is its own inverse, so the same call both obfuscates and
/// deobfuscates. Jet uses 4-byte keys exclusively: the fixed header key
/// and the per-page `db_key ^ page_number` key.
pub fn rc4_apply(key: &[u8; 4], buf: &mut [u8]) {
    let mut cipher = Rc4::<U4>::new(key.into());
    cipher.apply_keystream(buf);
}

/// Expand compressed Jet4 text into UTF-16LE bytes.
///
/// The stream starts in compressed mode, where each input byte is a
/// UTF-16 code unit with a zero high byte. A zero byte toggles between
/// compressed and expanded mode; expanded mode copies literal 2-byte
/// code units. The caller strips the leading `FF FE` marker before
/// calling.
pub fn decompress_unicode(src: &[u8]) -> Vec<u8> {
    let mut dst = Vec::with_capacity(src.len() * 2);
    let mut compressed = true;
    let mut i = 0;

    while i < src.len() {
        if src[i] == 0 {
            compressed = !compressed;
            i += 1;
        } else if compressed {
            dst.push(src[i]);
            dst.push(0);
            i += 1;
        } else if src.len() - i >= 2 {
            dst.push(src[i]);
            dst.push(src[i + 1]);
            i += 2;
        } else {
            break;
        }
    }

    dst
}

/// Decode stored text bytes into a `String`.
///
/// Jet3 stores code-page text, decoded here as UTF-8 with lossy
/// fallback. Jet4+ stores UTF-16LE, optionally compressed: a leading
/// `FF FE` marker means the remainder must be run through
/// [`decompress_unicode`] first.
pub fn decode_text(is_jet3: bool, src: &[u8]) -> String {
    if is_jet3 {
        return String::from_utf8_lossy(src).into_owned();
    }

    let expanded;
    let utf16 = if src.len() >= 2 && src[0] == 0xFF && src[1] == 0xFE {
        expanded = decompress_unicode(&src[2..]);
        &expanded[..]
    } else {
        src
    };

    let units: Vec<u16> = utf16
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Broken-down calendar time produced by [`serial_date_to_tm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tm {
    /// Full calendar year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
    /// Hour, 0-23.
    pub hour: u32,
    /// Minute, 0-59.
    pub minute: u32,
    /// Second, 0-59.
    pub second: u32,
    /// Day of week, 0-6 with 0 = Sunday.
    pub weekday: u32,
}

const NOLEAP_CAL: [i64; 13] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365];
const LEAP_CAL: [i64; 13] = [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335, 366];

/// Convert a serial date value to calendar time.
///
/// The integer part counts days since 1899-12-30 and the fraction is
/// the time of day. Conversion walks the proleptic Gregorian calendar
/// in 400/100/4/1-year steps from year 1 (693593 days before the
/// epoch). Values outside `[0.0, 1e6]` return `None`.
pub fn serial_date_to_tm(value: f64) -> Option<Tm> {
    if !(0.0..=1e6).contains(&value) {
        return None;
    }

    let mut day = value as i64;
    let time = ((value - day as f64) * 86400.0 + 0.5) as i64;
    let hour = (time / 3600) as u32;
    let minute = ((time / 60) % 60) as u32;
    let second = (time % 60) as u32;

    // Days from 1/1/1 to 12/31/1899.
    day += 693593;
    let weekday = ((day + 1) % 7) as u32;

    let mut year: i64 = 1;

    // 146097 days in 400 years.
    let mut q = day / 146097;
    year += 400 * q;
    day -= q * 146097;

    // 36524 days in 100 years.
    q = (day / 36524).min(3);
    year += 100 * q;
    day -= q * 36524;

    // 1461 days in 4 years.
    q = day / 1461;
    year += 4 * q;
    day -= q * 1461;

    // 365 days in 1 year.
    q = (day / 365).min(3);
    year += q;
    day -= q * 365;

    let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
    let cal = if leap { &LEAP_CAL } else { &NOLEAP_CAL };

    let mut month = 0usize;
    while month < 11 && day >= cal[month + 1] {
        month += 1;
    }

    Some(Tm {
        year: year as i32,
        month: month as u32 + 1,
        day: (day - cal[month] + 1) as u32,
        hour,
        minute,
        second,
        weekday,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rc4_symmetry() {
        let key = [0x12, 0x34, 0x56, 0x78];
        let original: Vec<u8> = (0..=255).cycle().take(4096).collect();
        let mut buf = original.clone();
        rc4_apply(&key, &mut buf);
        assert_ne!(buf, original);
        rc4_apply(&key, &mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn test_rc4_header_key_deterministic() {
        let mut a = vec![0u8; 128];
        let mut b = vec![0u8; 128];
        rc4_apply(&crate::jet::constants::HDR_RC4_KEY, &mut a);
        rc4_apply(&crate::jet::constants::HDR_RC4_KEY, &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_decompress_unicode_plain_ascii() {
        // Compressed-mode bytes become UTF-16LE code units with a zero
        // high byte.
        assert_eq!(decompress_unicode(&[0x41, 0x42]), vec![0x41, 0, 0x42, 0]);
        assert_eq!(
            decompress_unicode(&[0x41, 0x42, 0x43]),
            vec![0x41, 0, 0x42, 0, 0x43, 0]
        );
    }

    #[test]
    fn test_decompress_unicode_mode_toggle() {
        // 'A', toggle, literal 0x2603 (snowman), toggle, 'B'.
        let src = [0x41, 0x00, 0x03, 0x26, 0x00, 0x42];
        assert_eq!(
            decompress_unicode(&src),
            vec![0x41, 0, 0x03, 0x26, 0x42, 0]
        );
    }

    #[test]
    fn test_decompress_unicode_truncated_pair() {
        // A lone trailing byte in expanded mode is dropped.
        let src = [0x41, 0x00, 0x03];
        assert_eq!(decompress_unicode(&src), vec![0x41, 0]);
    }

    #[test]
    fn test_decode_text_jet3_utf8() {
        assert_eq!(decode_text(true, b"Users"), "Users");
        assert_eq!(decode_text(true, &[0x41, 0xFF, 0x42]), "A\u{FFFD}B");
    }

    #[test]
    fn test_decode_text_jet4_plain_utf16() {
        let src = [0x49, 0x00, 0x64, 0x00]; // "Id"
        assert_eq!(decode_text(false, &src), "Id");
    }

    #[test]
    fn test_decode_text_jet4_compressed() {
        let src = [0xFF, 0xFE, 0x41, 0x42, 0x43];
        assert_eq!(decode_text(false, &src), "ABC");
    }

    #[test]
    fn test_serial_date_epoch() {
        let tm = serial_date_to_tm(0.0).unwrap();
        assert_eq!((tm.year, tm.month, tm.day), (1899, 12, 30));
        assert_eq!((tm.hour, tm.minute, tm.second), (0, 0, 0));

        let tm = serial_date_to_tm(1.0).unwrap();
        assert_eq!((tm.year, tm.month, tm.day), (1899, 12, 31));
    }

    #[test]
    fn test_serial_date_leap_anomaly() {
        // 1900 is not a Gregorian leap year, so day 60 lands on Feb 28.
        let tm = serial_date_to_tm(60.0).unwrap();
        assert_eq!((tm.year, tm.month, tm.day), (1900, 2, 28));
    }

    #[test]
    fn test_serial_date_time_of_day() {
        // 0.5 = noon; 0.75 = 18:00.
        let tm = serial_date_to_tm(2.5).unwrap();
        assert_eq!((tm.year, tm.month, tm.day), (1900, 1, 1));
        assert_eq!((tm.hour, tm.minute, tm.second), (12, 0, 0));

        let tm = serial_date_to_tm(2.75).unwrap();
        assert_eq!(tm.hour, 18);
    }

    #[test]
    fn test_serial_date_modern() {
        // 2024-04-15 is 45397 days after the epoch.
        let tm = serial_date_to_tm(45397.0).unwrap();
        assert_eq!((tm.year, tm.month, tm.day), (2024, 4, 15));
    }

    #[test]
    fn test_serial_date_out_of_range() {
        assert!(serial_date_to_tm(-1.0).is_none());
        assert!(serial_date_to_tm(2e6).is_none());
    }

    #[test]
    fn test_integer_readers() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(get_u8(&buf, 2), 0x03);
        assert_eq!(get_u16(&buf, 0), 0x0201);
        assert_eq!(get_u32(&buf, 0), 0x0403_0201);
        assert_eq!(get_u32_be(&buf, 0), 0x0102_0304);
    }

    #[test]
    fn test_float_readers() {
        let mut buf = [0u8; 8];
        byteorder::LittleEndian::write_f32(&mut buf[..4], 3.75);
        assert_eq!(get_f32(&buf, 0), 3.75);
        byteorder::LittleEndian::write_f64(&mut buf, -12.5);
        assert_eq!(get_f64(&buf, 0), -12.5);
    }
}
