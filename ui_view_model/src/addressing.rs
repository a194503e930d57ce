//! A1-style labels for view coordinates.

/// Spreadsheet column letters for a zero-based column index (`0 -> A`, `26 -> AA`).
pub fn column_label(col: u32) -> String {
    let mut letters = Vec::new();
    let mut remaining = u64::from(col) + 1;
    while remaining > 0 {
        let rem = ((remaining - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Zero-based (row, col) to an A1 address.
pub fn cell_address(row: u32, col: u32) -> String {
    format!("{}{}", column_label(col), u64::from(row) + 1)
}

/// `A1` for a single cell, `A1:B2` for a span.
pub fn range_address(top: u32, left: u32, bottom: u32, right: u32) -> String {
    let start = cell_address(top, left);
    let end = cell_address(bottom, right);
    if start == end {
        start
    } else {
        format!("{start}:{end}")
    }
}

/// Parse an A1 address (case-insensitive, surrounding whitespace ignored) into
/// zero-based (row, col). Returns `None` for anything else, including `$` anchors.
pub fn parse_cell_address(a1: &str) -> Option<(u32, u32)> {
    let text = a1.trim();
    let split = text.find(|ch: char| !ch.is_ascii_alphabetic())?;
    let (letters, digits) = text.split_at(split);
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut col: u32 = 0;
    for byte in letters.bytes() {
        let value = u32::from(byte.to_ascii_uppercase() - b'A') + 1;
        col = col.checked_mul(26)?.checked_add(value)?;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}
