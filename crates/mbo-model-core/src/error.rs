use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Validation error in {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Cash reconciliation failed in year {year}: opening + net cash flow differs from closing cash by {gap}")]
    Reconciliation { year: u32, gap: Decimal },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ModelError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Serialization(e.to_string())
    }
}
