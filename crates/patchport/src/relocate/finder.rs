use super::ContextWindow;
use crate::module::ModuleBuffer;

/// Every position in `target` where the window's payload would start.
///
/// Matches may overlap, so a short repeating window yields one hit per
/// repetition. Offsets are returned in ascending order.
pub fn find_occurrences(target: &ModuleBuffer, window: &ContextWindow<'_>) -> Vec<usize> {
    target
        .find_all(window.bytes)
        .into_iter()
        .map(|pos| pos + window.lead)
        .collect()
}
