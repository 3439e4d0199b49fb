//! # softx-db: Database Layer for SoftX ERP
//!
//! Persistence for clients, suppliers, products with their stock, users,
//! sales and the cash ledger. Everything lives in one SQLite file accessed
//! through an async sqlx pool.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SoftX ERP Data Flow                             │
//! │                                                                         │
//! │  Form / screen (new client, finalize sale, login)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     softx-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ClientRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_initial_ │  │   │
//! │  │   │ Transactions  │    │ UserRepo      │    │ schema.sql   │  │   │
//! │  │   │               │    │ SaleRepo ...  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   $SOFTX_DB_PATH  or  <platform data dir>/softx.db              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and authentication error types
//! - [`repository`] - One repository per entity
//!
//! ## Usage
//!
//! ```rust,ignore
//! use softx_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let clients = db.clients().search("silva").await?;
//! let user = db.users().authenticate("Admin Principal", "admin").await?;
//! let sale = db.sales().finalize(clients[0].id, user.id, &draft, discount).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{AuthError, DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::financial::FinancialRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::user::{check_password, hash_password, UserRepository};
