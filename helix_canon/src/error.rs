//! Dispatch-level errors.
//!
//! Most canonical failures are conveyed to the operator through
//! interpreter-list messages, not `Err` values; the error type here covers
//! the few contract rejections the caller can act on directly.

use thiserror::Error;

/// Rejections surfaced to the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonError {
    /// An I/O channel index is outside the configured channel count.
    #[error("{kind} index {index} out of range [0, {max})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_channel() {
        let err = CanonError::IndexOutOfRange {
            kind: "digital input",
            index: 99,
            max: 64,
        };
        assert_eq!(err.to_string(), "digital input index 99 out of range [0, 64)");
    }
}
