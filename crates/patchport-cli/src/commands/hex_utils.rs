//! Offset parsing and formatting utilities.

use anyhow::Result;

/// Parse an offset given either in decimal or as hex with a 0x prefix.
///
/// Patch set files store offsets in decimal, while disassemblers show hex,
/// so both spellings are accepted.
pub fn parse_offset(s: &str) -> Result<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map_err(|e| anyhow::anyhow!("Invalid hex offset '{}': {}", s, e));
    }
    s.parse()
        .map_err(|e| anyhow::anyhow!("Invalid offset '{}': {}", s, e))
}

/// Format an offset as a hex string with 0x prefix.
pub fn format_hex_offset(offset: u64) -> String {
    format!("0x{:X}", offset)
}
