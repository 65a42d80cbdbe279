//! Locate command: relocate a single offset.

use std::path::Path;

use anyhow::Result;
use patchport::{ClampMode, MarginResolver, ModuleBuffer, Resolution};

use super::hex_utils::{format_hex_offset, parse_offset};

pub struct LocateRequest<'a> {
    pub old_module: &'a Path,
    pub new_module: &'a Path,
    pub offset: &'a str,
    pub length: usize,
    pub max_margin: usize,
    pub min_margin: usize,
    pub clamp: ClampMode,
}

/// Run the locate command
pub fn run(request: &LocateRequest<'_>) -> Result<()> {
    let offset = parse_offset(request.offset)?;
    let old = ModuleBuffer::load(request.old_module)?;
    let new = ModuleBuffer::load(request.new_module)?;

    let resolver = MarginResolver::new(&old, &new, request.max_margin).with_clamp(request.clamp);
    let resolution = resolver.resolve(offset, request.length, request.min_margin)?;

    println!(
        "Old: {} ({} bytes)",
        format_hex_offset(offset),
        request.length
    );
    match resolution {
        Resolution::Found {
            offset: found,
            margin,
            attempts,
        } => {
            println!("New: {} ({})", format_hex_offset(found), found);
            println!("Margin: {} after {} attempt(s)", margin, attempts);
            println!("Shift: {}", format_shift(offset, found));
        }
        Resolution::NotFound { attempts } => {
            println!(
                "Not found: no unique match for margins {}..={} ({} attempt(s))",
                request.min_margin, request.max_margin, attempts
            );
        }
    }

    Ok(())
}

fn format_shift(from: u64, to: u64) -> String {
    let diff = to.abs_diff(from);
    let sign = if to >= from { "+" } else { "-" };
    format!("{}{} ({}0x{:X})", sign, diff, sign, diff)
}
