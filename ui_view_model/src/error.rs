//! Error types and their stable `UIVM_*` codes.

use thiserror::Error;

pub const PAYLOAD_INVALID: &str = "UIVM_PAYLOAD_001";
pub const OPTIONS_INVALID: &str = "UIVM_OPTIONS_001";
pub const OUTPUT_SERIALIZE: &str = "UIVM_OUTPUT_001";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("{field} must be greater than zero (got {value})")]
    NonPositiveLimit { field: &'static str, value: u64 },
}

/// Errors from the JSON entry points. Building a view model from parsed input
/// never fails.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ViewModelError {
    #[error("[UIVM_PAYLOAD_001] invalid diff payload: {0}. Suggestion: pass the JSON produced by the diff engine unchanged.")]
    Payload(#[source] serde_json::Error),

    #[error("[UIVM_OPTIONS_001] invalid view options: {0}")]
    Options(#[from] OptionsError),

    #[error("[UIVM_OPTIONS_001] invalid view options JSON: {0}")]
    OptionsJson(#[source] serde_json::Error),

    #[error("[UIVM_OUTPUT_001] failed to serialize view model: {0}")]
    Output(#[source] serde_json::Error),
}

impl ViewModelError {
    pub fn code(&self) -> &'static str {
        match self {
            ViewModelError::Payload(_) => PAYLOAD_INVALID,
            ViewModelError::Options(_) | ViewModelError::OptionsJson(_) => OPTIONS_INVALID,
            ViewModelError::Output(_) => OUTPUT_SERIALIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_their_code() {
        let err = ViewModelError::from(OptionsError::NonPositiveLimit {
            field: "previewRows",
            value: 0,
        });
        assert_eq!(err.code(), OPTIONS_INVALID);
        assert!(err.to_string().starts_with("[UIVM_OPTIONS_001]"));
        assert!(err.to_string().contains("previewRows must be greater than zero"));
    }
}
