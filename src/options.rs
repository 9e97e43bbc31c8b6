// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::{Error, ErrorCode, Result};

use serde::{Deserialize, Serialize};

/// How evaluation-time failures surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypingMode {
    /// Every failure is raised.
    #[default]
    Legacy,
    /// Demotable evaluation failures become `MISSING`.
    Permissive,
}

/// Whether type parameters such as `VARCHAR(3)` or `DECIMAL(5,2)` constrain casts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CastMode {
    #[default]
    Unconstrained,
    Honored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaseSensitivity {
    #[default]
    Insensitive,
    Sensitive,
}

impl CaseSensitivity {
    pub fn names_match(self, a: &str, b: &str) -> bool {
        match self {
            CaseSensitivity::Sensitive => a == b,
            CaseSensitivity::Insensitive => a
                .chars()
                .flat_map(char::to_lowercase)
                .eq(b.chars().flat_map(char::to_lowercase)),
        }
    }
}

/// Largest accepted magnitude of the default time zone offset, in minutes.
pub const MAX_OFFSET_MINUTES: i32 = 23 * 60 + 59;

/// Options governing evaluation.
///
/// Deserializes from camelCase JSON (or YAML with the `yaml` feature):
///
/// ```json
/// { "typingMode": "permissive", "castMode": "honored", "defaultTimezoneOffsetMinutes": -480 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct EvaluationOptions {
    pub typing_mode: TypingMode,
    pub cast_mode: CastMode,
    pub default_timezone_offset_minutes: i32,
    pub case_sensitivity: CaseSensitivity,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            typing_mode: TypingMode::Legacy,
            cast_mode: CastMode::Unconstrained,
            default_timezone_offset_minutes: 0,
            case_sensitivity: CaseSensitivity::Insensitive,
        }
    }
}

impl EvaluationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_typing_mode(mut self, typing_mode: TypingMode) -> Self {
        self.typing_mode = typing_mode;
        self
    }

    pub fn with_cast_mode(mut self, cast_mode: CastMode) -> Self {
        self.cast_mode = cast_mode;
        self
    }

    pub fn with_default_timezone_offset_minutes(mut self, minutes: i32) -> Self {
        self.default_timezone_offset_minutes = minutes;
        self
    }

    pub fn with_case_sensitivity(mut self, case_sensitivity: CaseSensitivity) -> Self {
        self.case_sensitivity = case_sensitivity;
        self
    }

    pub fn is_permissive(&self) -> bool {
        self.typing_mode == TypingMode::Permissive
    }

    pub fn honors_parameters(&self) -> bool {
        self.cast_mode == CastMode::Honored
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_timezone_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(Error::new(
                ErrorCode::SemanticInvalidOption,
                format!(
                    "defaultTimezoneOffsetMinutes {} is outside -{MAX_OFFSET_MINUTES}..={MAX_OFFSET_MINUTES}",
                    self.default_timezone_offset_minutes
                ),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| Error::new(ErrorCode::SemanticInvalidOption, e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let options: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::new(ErrorCode::SemanticInvalidOption, e.to_string()))?;
        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = EvaluationOptions::default();
        assert!(!o.is_permissive());
        assert!(!o.honors_parameters());
        assert_eq!(o.default_timezone_offset_minutes, 0);
        assert_eq!(o.case_sensitivity, CaseSensitivity::Insensitive);
    }

    #[test]
    fn json_options() {
        let o = EvaluationOptions::from_json_str(
            r#"{"typingMode":"permissive","castMode":"honored","defaultTimezoneOffsetMinutes":-480}"#,
        )
        .unwrap();
        assert!(o.is_permissive());
        assert!(o.honors_parameters());
        assert_eq!(o.default_timezone_offset_minutes, -480);

        let err = EvaluationOptions::from_json_str(r#"{"typing":"legacy"}"#).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SemanticInvalidOption);

        let err = EvaluationOptions::from_json_str(r#"{"defaultTimezoneOffsetMinutes":1440}"#)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SemanticInvalidOption);
    }

    #[test]
    fn case_insensitive_names() {
        assert!(CaseSensitivity::Insensitive.names_match("ÄBC", "äbc"));
        assert!(!CaseSensitivity::Sensitive.names_match("ABC", "abc"));
    }
}
