//! # softx-core: Pure Business Logic for SoftX ERP
//!
//! This crate holds the entity records and the arithmetic of the ERP as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SoftX ERP Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Desktop forms (not in workspace)             │   │
//! │  │   Clients ─ Users ─ Suppliers ─ Products ─ Sale screen          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ softx-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ checkout  │  │ validation│  │   │
//! │  │   │  Client   │  │   Money   │  │ SaleDraft │  │  cpf/cnpj │  │   │
//! │  │   │  User ... │  │  parse    │  │ SaleTotals│  │  email... │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    softx-db (Database Layer)                    │   │
//! │  │          SQLite repositories, migrations, transactions          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity records (User, Client, Supplier, Product, Sale, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`checkout`] - Sale draft and subtotal / discount / change calculation
//! - [`error`] - Domain error types
//! - [`validation`] - Form input validators
//!
//! ## Example Usage
//!
//! ```rust
//! use softx_core::checkout::SaleTotals;
//! use softx_core::money::Money;
//!
//! let totals = SaleTotals::compute(
//!     Money::from_cents(2550),
//!     Money::from_cents(300),
//!     Money::from_cents(3000),
//! );
//!
//! assert_eq!(totals.total.cents(), 2250);
//! assert_eq!(totals.change.cents(), 750);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{summarize, LineItem, SaleDraft, SaleTotals, TotalsDisplay};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products in a single sale draft.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single product in a sale draft.
///
/// ## Business Reason
/// Catches typing 1000 instead of 10 on the sale screen.
pub const MAX_ITEM_QUANTITY: i64 = 999;
