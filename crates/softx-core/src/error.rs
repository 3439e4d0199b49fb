//! # Error Types
//!
//! Domain-specific error types for softx-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  softx-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  softx-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── AuthError        - Login failures                                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → forms layer             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough stock to cover the requested decrement.
    ///
    /// ## When This Occurs
    /// - Stock adjustment would take the quantity below zero
    /// - Finalizing a sale that sells more than is on hand
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Product is not part of the sale draft.
    #[error("Product {0} is not in the sale")]
    ItemNotInSale(i64),

    /// Sale draft has exceeded the maximum distinct products.
    #[error("A sale cannot have more than {max} items")]
    SaleTooLarge { max: usize },

    /// Finalizing a sale with no items.
    #[error("Cannot finalize a sale without items")]
    EmptySale,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed e-mail, CPF with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: 7,
            available: 3,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 7: available 3, requested 10"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "cpf".to_string(),
        };
        assert_eq!(err.to_string(), "cpf is required");

        let err = ValidationError::NotAllowed {
            field: "tipo".to_string(),
            allowed: vec!["admin".to_string(), "vendedor".to_string()],
        };
        assert_eq!(err.to_string(), r#"tipo must be one of: ["admin", "vendedor"]"#);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "senha".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
