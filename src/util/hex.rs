//! Hex dump formatting.
//!
//! [`HexDump`] renders bytes in the classic offset / hex / ASCII layout,
//! optionally highlighting a set of byte ranges (used by `flf dump` to show
//! where each field of a record starts).

use std::fmt;
use std::ops::Range;

/// Format a byte offset as "decimal (0xhex)".
pub fn format_offset(offset: u64) -> String {
    format!("{} (0x{:x})", offset, offset)
}

/// A hex dump of a byte slice.
///
/// ```text
/// 00000000  61 62 63 00 00 00 00 00  01 00 00 00              |abc.........    |
/// ```
pub struct HexDump<'a> {
    data: &'a [u8],
    base_offset: u64,
    bytes_per_line: usize,
}

impl<'a> HexDump<'a> {
    pub fn new(data: &'a [u8], base_offset: u64) -> Self {
        HexDump {
            data,
            base_offset,
            bytes_per_line: 16,
        }
    }

    /// Change the line width. Widths of zero are treated as one.
    pub fn bytes_per_line(mut self, n: usize) -> Self {
        self.bytes_per_line = n.max(1);
        self
    }

    fn write_line(&self, f: &mut fmt::Formatter<'_>, index: usize, chunk: &[u8]) -> fmt::Result {
        let width = self.bytes_per_line;
        let half = width / 2;
        let offset = self.base_offset + (index * width) as u64;
        write!(f, "{:08x}  ", offset)?;

        for j in 0..width {
            if j == half && half > 0 {
                f.write_str(" ")?;
            }
            match chunk.get(j) {
                Some(b) => write!(f, "{:02x} ", b)?,
                None => f.write_str("   ")?,
            }
        }

        f.write_str(" |")?;
        for j in 0..width {
            let c = match chunk.get(j) {
                Some(&b) if b.is_ascii_graphic() || b == b' ' => b as char,
                Some(_) => '.',
                None => ' ',
            };
            write!(f, "{}", c)?;
        }
        f.write_str("|")
    }
}

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chunk) in self.data.chunks(self.bytes_per_line).enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            self.write_line(f, i, chunk)?;
        }
        Ok(())
    }
}

/// Produce a 16-bytes-per-line hex dump of `data` starting at `base_offset`.
pub fn hex_dump(data: &[u8], base_offset: u64) -> String {
    HexDump::new(data, base_offset).to_string()
}

/// Render one byte range of a record as `start..end (len bytes)`.
pub fn format_range(range: &Range<u64>) -> String {
    format!(
        "{}..{} ({} bytes)",
        range.start,
        range.end,
        range.end.saturating_sub(range.start)
    )
}
