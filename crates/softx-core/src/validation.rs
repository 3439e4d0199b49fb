//! # Validation Module
//!
//! Form input validators for SoftX ERP.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Forms                                                        │
//! │  └── THIS MODULE: empty fields, e-mail, CPF, CNPJ, phone, dates        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Domain types                                                 │
//! │  ├── UserRole / Permission parse (closed sets)                         │
//! │  └── SaleDraft quantity limits                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE cpf, cnpj, email                                           │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories do not call these validators. The forms run them before a
//! record is handed to the database layer.
//!
//! ## Usage
//! ```rust
//! use softx_core::validation::{validate_cpf, validate_email};
//!
//! validate_cpf("12345678901").unwrap();
//! validate_email("ana@loja.com").unwrap();
//! assert!(validate_cpf("123.456.789-01").is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Date format of birth date fields.
pub const BIRTH_DATE_FORMAT: &str = "%d/%m/%Y";

fn invalid(field: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn exact_digits(field: &str, value: &str, len: usize) -> ValidationResult<()> {
    if value.len() != len || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(field, &format!("must contain exactly {len} digits")));
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Rejects empty or whitespace-only input.
///
/// ## Example
/// ```rust
/// use softx_core::validation::validate_required;
///
/// assert!(validate_required("nome", "Ana").is_ok());
/// assert!(validate_required("nome", "   ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an e-mail address.
///
/// ## Rules
/// - Exactly the `local@domain.tld` shape: something, `@`, something
///   containing a `.` with text on both sides
/// - No second `@`
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    let shape_ok = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .rsplit_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    });

    if !shape_ok {
        return Err(invalid("email", "must look like name@domain.com"));
    }
    Ok(())
}

/// Validates a CPF: 11 digits, no punctuation.
pub fn validate_cpf(cpf: &str) -> ValidationResult<()> {
    exact_digits("cpf", cpf, 11)
}

/// Validates a CNPJ: 14 digits, no punctuation.
///
/// ## Example
/// ```rust
/// use softx_core::validation::validate_cnpj;
///
/// assert!(validate_cnpj("12345678000199").is_ok());
/// assert!(validate_cnpj("12.345.678/0001-99").is_err());
/// ```
pub fn validate_cnpj(cnpj: &str) -> ValidationResult<()> {
    exact_digits("cnpj", cnpj, 14)
}

/// Validates a phone number.
///
/// Digits, spaces, hyphens and parentheses only, e.g. `(11) 98765-4321`.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let allowed = |c: char| c.is_ascii_digit() || c.is_whitespace() || c == '-' || c == '(' || c == ')';
    if phone.is_empty() || !phone.chars().all(allowed) {
        return Err(invalid("telefone", "only digits, spaces, '-' and parentheses"));
    }
    Ok(())
}

/// Validates and parses a birth date typed as `DD/MM/YYYY`.
///
/// ## Returns
/// The parsed date, so callers can reject future dates if they need to.
pub fn validate_birth_date(text: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), BIRTH_DATE_FORMAT)
        .map_err(|_| invalid("data_nascimento", "use DD/MM/YYYY"))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Sale screen: Add Product                                               │
/// │                                                                         │
/// │  User enters quantity: 5                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → SaleDraft::add_item                                     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("nome", "Ana").is_ok());
        assert!(matches!(
            validate_required("nome", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_required("nome", " \t").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("admin@sistema.com").is_ok());
        assert!(validate_email("a.b@c.com.br").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("sem-arroba.com").is_err());
        assert!(validate_email("@sistema.com").is_err());
        assert!(validate_email("admin@sistema").is_err());
        assert!(validate_email("admin@.com").is_err());
        assert!(validate_email("admin@sistema.").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_validate_cpf_and_cnpj() {
        assert!(validate_cpf("99999999999").is_ok());
        assert!(validate_cpf("9999999999").is_err());
        assert!(validate_cpf("999999999999").is_err());
        assert!(validate_cpf("999.999.999-99").is_err());

        assert!(validate_cnpj("11222333000181").is_ok());
        assert!(validate_cnpj("1122233300018").is_err());
        assert!(validate_cnpj("1122233300018a").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("(11) 98765-4321").is_ok());
        assert!(validate_phone("11987654321").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("+55 11 98765-4321").is_err());
        assert!(validate_phone("ramal 12").is_err());
    }

    #[test]
    fn test_validate_birth_date() {
        let date = validate_birth_date("25/12/1990").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1990, 12, 25).unwrap());

        assert!(validate_birth_date("12/25/1990").is_err());
        assert!(validate_birth_date("1990-12-25").is_err());
        assert!(validate_birth_date("31/02/2000").is_err());
        assert!(validate_birth_date("").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }
}
