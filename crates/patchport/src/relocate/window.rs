use crate::config::ClampMode;
use crate::error::{Error, Result};
use crate::module::ModuleBuffer;

/// Bytes surrounding a payload in the old module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow<'a> {
    pub bytes: &'a [u8],
    /// Number of window bytes in front of the payload start
    pub lead: usize,
    pub margin: usize,
}

/// Cut `[offset - margin, offset + len + margin)` out of `module`.
///
/// The payload itself must lie inside the module. The tail is truncated at
/// end of buffer; the head is handled according to `clamp` when `offset` is
/// closer than `margin` to byte 0.
pub fn build_window(
    module: &ModuleBuffer,
    offset: usize,
    len: usize,
    margin: usize,
    clamp: ClampMode,
) -> Result<ContextWindow<'_>> {
    let out_of_bounds = || Error::OutOfBounds {
        offset: offset as u64,
        len,
        size: module.len(),
    };
    let payload_end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
    if payload_end > module.len() {
        return Err(out_of_bounds());
    }

    let start = offset.saturating_sub(margin);
    let (lead, total) = match clamp {
        ClampMode::Trim => {
            let lead = offset - start;
            (lead, lead.saturating_add(len).saturating_add(margin))
        }
        ClampMode::Legacy => (margin, margin.saturating_mul(2).saturating_add(len)),
    };

    let bytes = module.read(start, total).ok_or_else(out_of_bounds)?;
    Ok(ContextWindow {
        bytes,
        lead,
        margin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn old_module() -> ModuleBuffer {
        ModuleBuffer::from_bytes(
            "old.dll",
            vec![0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77],
        )
    }

    #[test]
    fn test_window_around_payload() {
        let module = old_module();
        let window = build_window(&module, 3, 1, 2, ClampMode::Trim).unwrap();
        assert_eq!(window.bytes, &[0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(window.lead, 2);
        assert_eq!(window.margin, 2);
    }

    #[test]
    fn test_zero_margin_is_payload_only() {
        let module = old_module();
        let window = build_window(&module, 5, 2, 0, ClampMode::Trim).unwrap();
        assert_eq!(window.bytes, &[0x55, 0x66]);
        assert_eq!(window.lead, 0);
    }

    #[test]
    fn test_trim_shortens_window_at_start() {
        let module = old_module();
        let window = build_window(&module, 1, 1, 3, ClampMode::Trim).unwrap();
        assert_eq!(window.bytes, &[0x00, 0x11, 0x22, 0x33, 0x44]);
        assert_eq!(window.lead, 1);
    }

    #[test]
    fn test_legacy_keeps_full_length_at_start() {
        let module = old_module();
        let window = build_window(&module, 1, 1, 3, ClampMode::Legacy).unwrap();
        assert_eq!(
            window.bytes,
            &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66]
        );
        assert_eq!(window.lead, 3);
    }

    #[test]
    fn test_tail_truncated_at_end() {
        let module = old_module();
        let window = build_window(&module, 6, 1, 3, ClampMode::Trim).unwrap();
        assert_eq!(window.bytes, &[0x33, 0x44, 0x55, 0x66, 0x77]);
        assert_eq!(window.lead, 3);
    }

    #[test]
    fn test_payload_outside_module() {
        let module = old_module();
        assert!(matches!(
            build_window(&module, 7, 2, 1, ClampMode::Trim),
            Err(Error::OutOfBounds { offset: 7, len: 2, size: 8 })
        ));
        assert!(build_window(&module, usize::MAX, 2, 1, ClampMode::Trim).is_err());
    }

    #[test]
    fn test_huge_margin_reads_whole_module() {
        let module = old_module();
        let window = build_window(&module, 1, 1, usize::MAX, ClampMode::Trim).unwrap();
        assert_eq!(window.bytes.len(), 8);
        assert_eq!(window.lead, 1);

        let window = build_window(&module, 1, 1, usize::MAX - 1, ClampMode::Legacy).unwrap();
        assert_eq!(window.bytes.len(), 8);
        assert_eq!(window.lead, usize::MAX - 1);
    }
}
