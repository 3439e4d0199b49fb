//! # Domain Types
//!
//! Entity records used throughout SoftX ERP.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Entities                                        │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐                │
//! │  │    User      │   │   Client     │   │  Supplier    │                │
//! │  │  (usuarios)  │   │  (clientes)  │   │(fornecedores)│                │
//! │  └──────┬───────┘   └──────┬───────┘   └──────┬───────┘                │
//! │         │                  │                  │                         │
//! │         │   ┌──────────────┴─┐         ┌──────┴───────┐   ┌─────────┐  │
//! │         └──►│     Sale       │         │   Product    │◄──│  Stock  │  │
//! │             │   (vendas)     │────────►│  (produtos)  │   │(estoque)│  │
//! │             └────────────────┘ items   └──────────────┘   └─────────┘  │
//! │                                                                         │
//! │  Purchase (compras) ─ Financial (financeiro)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every record carries the integer key SQLite assigns on insert. Records
//! built in memory for an insert leave `id` at `0`; the repository ignores
//! it and returns the assigned key.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Address
// =============================================================================

/// Postal address shared by users, clients and suppliers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Address {
    /// Street (`rua`).
    pub street: String,
    /// Postal code (`cep`).
    pub postal_code: String,
    /// Neighbourhood (`bairro`).
    pub district: String,
    /// City (`cidade`).
    pub city: String,
}

// =============================================================================
// User Role & Permission
// =============================================================================

/// Role of a system user. Stored as its lowercase name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Vendedor,
    Financeiro,
    Estoque,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Admin,
        UserRole::Vendedor,
        UserRole::Financeiro,
        UserRole::Estoque,
    ];

    /// Name as stored in the `tipo` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Vendedor => "vendedor",
            UserRole::Financeiro => "financeiro",
            UserRole::Estoque => "estoque",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the text picked in the role combo box.
///
/// ## Example
/// ```rust
/// use softx_core::UserRole;
///
/// assert_eq!("estoque".parse::<UserRole>().unwrap(), UserRole::Estoque);
/// assert!("gerente".parse::<UserRole>().is_err());
/// ```
impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "tipo".to_string(),
                allowed: UserRole::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            })
    }
}

/// Permission level of a system user. Stored as its lowercase name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    Padrao,
    Avancado,
}

impl Permission {
    pub const ALL: [Permission; 2] = [Permission::Padrao, Permission::Avancado];

    /// Name as stored in the `permissao` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Permission::Padrao => "padrao",
            Permission::Avancado => "avancado",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "permissao".to_string(),
                allowed: Permission::ALL.iter().map(|p| p.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// User
// =============================================================================

/// A person who logs into the system.
///
/// `password_hash` is only ever the salted hash read back from storage; it is
/// never serialized. Repositories ignore it on writes and take the plaintext
/// password as a separate argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    /// Login name (`nome_usuario`).
    pub username: String,
    pub cpf: String,
    pub email: String,
    pub phone: String,
    /// Free-form date text as typed on the form.
    pub birth_date: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub permission: Permission,
}

/// What an update does with the stored password hash.
///
/// ## Form Workflow
/// ```text
/// Edit user form
///      │
///      ├── password field left blank ──► PasswordChange::Keep
///      │                                 (stored hash untouched)
///      │
///      └── new password typed ─────────► PasswordChange::Replace(text)
///                                        (re-hashed and overwritten)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordChange {
    Keep,
    Replace(String),
}

impl PasswordChange {
    /// Maps the raw password field of an edit form: blank keeps the hash.
    pub fn from_form_field(text: &str) -> Self {
        if text.is_empty() {
            PasswordChange::Keep
        } else {
            PasswordChange::Replace(text.to_string())
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// A customer the business sells to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub phone: String,
    pub birth_date: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
}

// =============================================================================
// Supplier
// =============================================================================

/// A company the business buys from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub cnpj: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
}

// =============================================================================
// Product & Stock
// =============================================================================

/// A product in the catalogue.
///
/// `stock_quantity` is joined from `estoque` when reading and is `0` when the
/// product has no stock row. It is never written through the product itself;
/// use the stock operations of the product repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sale_price: Money,
    pub purchase_price: Money,
    pub supplier_id: Option<i64>,
    pub stock_quantity: i64,
}

/// Quantity on hand for one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Stock {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

// =============================================================================
// Sale
// =============================================================================

/// A finalized sale (`vendas`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    pub client_id: i64,
    pub user_id: i64,
    #[ts(as = "String")]
    pub sold_at: NaiveDateTime,
    /// Amount charged after discount.
    pub total: Money,
}

/// A product line of a finalized sale (`venda_itens`).
///
/// The unit price is frozen at the moment of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

impl SaleItem {
    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// A purchase from a supplier (`compras`). Part of the schema; no repository
/// writes it yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: i64,
    pub supplier_id: i64,
    pub user_id: i64,
    #[ts(as = "String")]
    pub purchased_at: NaiveDateTime,
    pub total: Money,
}

// =============================================================================
// Financial
// =============================================================================

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum FinancialKind {
    /// Money in.
    #[default]
    Entrada,
    /// Money out.
    Saida,
}

/// A cash-flow ledger entry (`financeiro`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Financial {
    pub id: i64,
    pub kind: FinancialKind,
    pub amount: Money,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub recorded_at: NaiveDateTime,
}

impl Financial {
    /// Amount with sign: positive for entradas, negative for saidas.
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            FinancialKind::Entrada => self.amount,
            FinancialKind::Saida => Money::zero() - self.amount,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
