// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Utility functions for component configuration.

use crate::error::CadenceError;

/// Helper functions for parsing component configuration from JSON values.
pub mod config_helpers {
    use super::CadenceError;
    use serde::Deserialize;

    /// Parses configuration from an optional JSON value, using defaults if not provided.
    /// This is the preferred approach for components with sensible defaults.
    ///
    /// # Errors
    ///
    /// This function always returns `Ok` in practice, as it uses `Default` when parsing fails.
    /// The `Result` return type is maintained for API consistency with the other config helpers.
    pub fn parse_config_optional<T>(params: Option<&serde_json::Value>) -> Result<T, CadenceError>
    where
        T: for<'de> Deserialize<'de> + Default,
    {
        Ok(serde_json::from_value(params.unwrap_or(&serde_json::Value::Null).clone()).unwrap_or_default())
    }

    /// Parses configuration with context-bearing error messages, erroring if
    /// `params` is absent. Use this for components that require explicit
    /// configuration (e.g. Router's `num_outputs` in `utterance_round_robin` mode).
    ///
    /// # Errors
    ///
    /// Returns `CadenceError::Configuration` if `params` is `None` or if deserialization fails.
    pub fn parse_config_required<T>(params: Option<&serde_json::Value>, context: &str) -> Result<T, CadenceError>
    where
        T: for<'de> Deserialize<'de>,
    {
        params.map_or_else(
            || Err(CadenceError::Configuration(format!("{context} configuration required"))),
            |p| {
                serde_json::from_value(p.clone())
                    .map_err(|e| CadenceError::Configuration(format!("failed to parse {context}: {e}")))
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::config_helpers::{parse_config_optional, parse_config_required};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default, PartialEq)]
    struct ExampleConfig {
        #[serde(default)]
        num_outputs: usize,
    }

    #[test]
    fn optional_falls_back_to_default() {
        let parsed: ExampleConfig = parse_config_optional(None).unwrap();
        assert_eq!(parsed, ExampleConfig { num_outputs: 0 });
    }

    #[test]
    fn required_errors_without_params() {
        let result: Result<ExampleConfig, _> = parse_config_required(None, "router");
        assert!(result.is_err());
    }

    #[test]
    fn required_parses_present_params() {
        let value = serde_json::json!({ "num_outputs": 3 });
        let parsed: ExampleConfig = parse_config_required(Some(&value), "router").unwrap();
        assert_eq!(parsed.num_outputs, 3);
    }
}
