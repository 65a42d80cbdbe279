//! Module fingerprint derived from the PE header.
//!
//! The fingerprint names the patch set file belonging to a module build:
//! `<CODE>-<TimeDateStamp hex>_<AddressOfEntryPoint hex>`.

use std::fmt;

use super::ModuleBuffer;
use crate::error::{Error, Result};

/// Offset of `e_lfanew` in the DOS header
const PE_POINTER_OFFSET: usize = 0x3C;
const PE_SIGNATURE: &[u8; 4] = b"PE\0\0";
/// TimeDateStamp, relative to the PE signature
const TIMESTAMP_OFFSET: usize = 8;
/// Start of the optional header, relative to the PE signature
const OPTIONAL_HEADER_OFFSET: usize = 24;
/// AddressOfEntryPoint, relative to the optional header
const ENTRY_POINT_OFFSET: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub code: String,
    pub timestamp: u32,
    pub entry_point: u32,
}

impl Fingerprint {
    /// Read the header fields of `module` and combine them with `code`
    pub fn from_module(code: &str, module: &ModuleBuffer) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidModule {
            path: module.path().to_path_buf(),
            message: message.to_string(),
        };

        let pe_offset = module
            .read_u32_le(PE_POINTER_OFFSET)
            .ok_or_else(|| invalid("file too small for a DOS header"))? as usize;

        match module.read(pe_offset, PE_SIGNATURE.len()) {
            Some(sig) if sig == PE_SIGNATURE => {}
            _ => return Err(invalid("missing PE signature")),
        }

        let timestamp = module
            .read_u32_le(pe_offset + TIMESTAMP_OFFSET)
            .ok_or_else(|| invalid("truncated file header"))?;
        let entry_point = module
            .read_u32_le(pe_offset + OPTIONAL_HEADER_OFFSET + ENTRY_POINT_OFFSET)
            .ok_or_else(|| invalid("truncated optional header"))?;

        Ok(Self {
            code: code.to_uppercase(),
            timestamp,
            entry_point,
        })
    }

    /// File name of the patch set for this module
    pub fn patch_file_name(&self) -> String {
        format!("{}.json", self)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:x}_{:x}", self.code, self.timestamp, self.entry_point)
    }
}

/// Build a minimal PE image with the given header fields (test helper).
#[cfg(test)]
pub(crate) fn fake_pe(timestamp: u32, entry_point: u32, body: &[u8]) -> Vec<u8> {
    let pe_offset: u32 = 0x80;
    let mut bytes = vec![0u8; 0x100];
    bytes[0] = b'M';
    bytes[1] = b'Z';
    bytes[PE_POINTER_OFFSET..PE_POINTER_OFFSET + 4].copy_from_slice(&pe_offset.to_le_bytes());
    let pe = pe_offset as usize;
    bytes[pe..pe + 4].copy_from_slice(PE_SIGNATURE);
    bytes[pe + TIMESTAMP_OFFSET..pe + TIMESTAMP_OFFSET + 4]
        .copy_from_slice(&timestamp.to_le_bytes());
    let ep = pe + OPTIONAL_HEADER_OFFSET + ENTRY_POINT_OFFSET;
    bytes[ep..ep + 4].copy_from_slice(&entry_point.to_le_bytes());
    bytes.extend_from_slice(body);
    bytes
}
