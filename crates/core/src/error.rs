// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Structured error types for the substrate.
//!
//! All errors implement `Display` and can be converted to/from `String` for
//! ergonomic propagation with `?`.

use thiserror::Error;

/// Main error type for substrate operations.
///
/// Matches the error taxonomy of the substrate: configuration errors are fatal
/// at startup, contract violations are fatal at runtime and always carry the
/// offending component's id, and transient conditions (not enough data yet to
/// slice at a given time) are never represented as an `Err` at all — the
/// aligner simply waits for more input.
#[derive(Debug, Error)]
pub enum CadenceError {
    /// Unknown option, missing required slot, type mismatch at slot wiring.
    ///
    /// Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A merge/slice precondition was violated, a feature row count mismatched,
    /// a channel's end-times went non-monotone, or an end-of-convo injection
    /// had no feasible slice point.
    ///
    /// Fatal at runtime; always carries the offending component's id and a
    /// `describe()` string of the message(s) involved.
    #[error("contract violation in '{component}': {detail}")]
    Contract {
        /// Id of the component (or substrate module) that detected the violation.
        component: String,
        /// Human-readable description of the offending message(s).
        detail: String,
    },

    /// Ambient runtime failure not covered by the two categories above
    /// (channel send/recv failure, a stats/state side-channel closing early).
    #[error("runtime error: {0}")]
    Runtime(String),

    /// I/O error, surfaced for completeness even though this crate has no
    /// sources/sinks of its own.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CadenceError {
    /// Builds a [`CadenceError::Contract`] naming the offending component.
    pub fn contract(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Contract {
            component: component.into(),
            detail: detail.into(),
        }
    }
}

/// Convenience type alias for `Result`s using [`CadenceError`].
pub type Result<T> = std::result::Result<T, CadenceError>;

impl From<CadenceError> for String {
    fn from(err: CadenceError) -> Self {
        err.to_string()
    }
}

impl From<String> for CadenceError {
    fn from(s: String) -> Self {
        Self::Runtime(s)
    }
}

impl From<&str> for CadenceError {
    fn from(s: &str) -> Self {
        Self::Runtime(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CadenceError::Configuration("missing num_outputs".to_string());
        assert_eq!(err.to_string(), "configuration error: missing num_outputs");

        let err = CadenceError::contract("router-0", "feature row mismatch");
        assert_eq!(
            err.to_string(),
            "contract violation in 'router-0': feature row mismatch"
        );
    }

    #[test]
    fn test_error_to_string_conversion() {
        let err = CadenceError::Runtime("channel closed".to_string());
        let s: String = err.into();
        assert_eq!(s, "runtime error: channel closed");
    }

    #[test]
    fn test_string_to_error_conversion() {
        let err: CadenceError = "something went wrong".into();
        assert_eq!(err.to_string(), "runtime error: something went wrong");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CadenceError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }
}
