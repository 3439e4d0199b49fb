//! # Repository Module
//!
//! One repository per record type. Each holds a clone of the pool and is
//! obtained from [`Database`](crate::Database).
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Form (client screen)                                                  │
//! │       │                                                                 │
//! │       │  db.clients().search("Silva")                                  │
//! │       ▼                                                                 │
//! │  ClientRepository                                                      │
//! │  ├── add(&self, client)          → assigned id                         │
//! │  ├── get_all(&self)              → ordered by name                     │
//! │  ├── get_by_id(&self, id)        → Option                              │
//! │  ├── update(&self, client)       → no-op when id is missing            │
//! │  ├── delete(&self, id)           → no-op when id is missing            │
//! │  └── search(&self, fragment)     → substring match on name             │
//! │       │                                                                 │
//! │       │  SQL (Portuguese columns aliased to field names)               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ClientRepository`](client::ClientRepository) - Customers
//! - [`SupplierRepository`](supplier::SupplierRepository) - Suppliers
//! - [`ProductRepository`](product::ProductRepository) - Products and stock
//! - [`UserRepository`](user::UserRepository) - Users, passwords, login
//! - [`SaleRepository`](sale::SaleRepository) - Sale finalization and history
//! - [`FinancialRepository`](financial::FinancialRepository) - Cash ledger

pub mod client;
pub mod financial;
pub mod product;
pub mod sale;
pub mod supplier;
pub mod user;

/// `LIKE` pattern matching `fragment` anywhere in the text.
///
/// `%`, `_` and `\` in the fragment match literally; queries pair this with
/// `ESCAPE '\'`. An empty fragment matches every row.
pub(crate) fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
