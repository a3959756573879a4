//! Product serial extraction and normalization
//!
//! Pure pattern matching: raw text in, normalized serial out. The
//! pattern covers the PS2-style serial families (`SCES`, `SLUS`, `SCPS`
//! and friends) in the forms they appear in file names and boot
//! executable paths.

use regex::bytes::Regex;
use std::sync::LazyLock;

static SERIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(S[CL](?:ES|US|PS|CS)?[-_]?[0-9]{3,5}(?:\.[0-9]{2})?)")
        .expect("serial pattern compiles")
});

/// Find the first serial in `text` and normalize it.
pub fn parse_serial(text: &str) -> Option<String> {
    parse_serial_bytes(text.as_bytes())
}

/// Byte-oriented variant of [`parse_serial`], for scanning raw sector
/// data without a UTF-8 round trip.
pub fn parse_serial_bytes(data: &[u8]) -> Option<String> {
    let matched = SERIAL.find(data)?;
    // The pattern only matches ASCII.
    let raw = std::str::from_utf8(matched.as_bytes()).ok()?;
    Some(normalize(raw))
}

/// Canonical `LETTERS-DIGITS` form: uppercase, `_` to `-`, dots
/// removed, and a `-` inserted before the digit run when the match had
/// no separator at all.
fn normalize(raw: &str) -> String {
    let mut serial = raw.to_uppercase().replace('_', "-").replace('.', "");
    if let Some(pos) = serial.find(|c: char| c.is_ascii_digit())
        && pos > 0
        && serial[..pos].bytes().all(|b| b.is_ascii_uppercase())
    {
        serial.insert(pos, '-');
    }
    serial
}
