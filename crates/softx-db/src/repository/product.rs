//! # Product Repository
//!
//! Database operations for products (`produtos`) and their stock (`estoque`).
//!
//! ## Stock Coupling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product + Stock                                      │
//! │                                                                         │
//! │  produtos                          estoque (0..1 row per product)      │
//! │  ┌────┬──────────┬───────┐         ┌────────────┬────────────┐         │
//! │  │ id │ nome     │ preco │ ◄────── │ produto_id │ quantidade │         │
//! │  ├────┼──────────┼───────┤         ├────────────┼────────────┤         │
//! │  │ 1  │ Café     │ 1250  │         │ 1          │ 40         │         │
//! │  │ 2  │ Açúcar   │  599  │         │ (no row)   │            │         │
//! │  └────┴──────────┴───────┘         └────────────┴────────────┘         │
//! │                                                                         │
//! │  Reads LEFT JOIN estoque: product 2 reports stock_quantity = 0         │
//! │                                                                         │
//! │  Multi-statement writes are one transaction:                           │
//! │    add        = INSERT produtos + INSERT estoque                        │
//! │    delete     = DELETE estoque  + DELETE produtos                       │
//! │    update_stock = read quantity + check + upsert                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Negative Stock
//! A decrement below zero fails with `DbError::InsufficientStock` and leaves
//! the stored quantity unchanged.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::contains_pattern;
use crate::error::{DbError, DbResult};
use softx_core::{Product, ValidationError};

const SELECT_PRODUCT: &str = r#"
    SELECT
        p.id_produto                AS id,
        p.nome                      AS name,
        p.descricao                 AS description,
        p.preco_venda               AS sale_price,
        p.preco_compra              AS purchase_price,
        p.fornecedor_id             AS supplier_id,
        COALESCE(e.quantidade, 0)   AS stock_quantity
    FROM produtos p
    LEFT JOIN estoque e ON e.produto_id = p.id_produto
"#;

/// Repository for product and stock database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let id = repo.add(&product, 12).await?;  // product + 12 in stock
/// repo.update_stock(id, -2).await?;          // now 10
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product, and its stock row when `initial_stock > 0`.
    ///
    /// Both rows are written in one transaction. `product.id` and
    /// `product.stock_quantity` are ignored.
    ///
    /// ## Returns
    /// * `Ok(id)` - Assigned product id
    /// * `Err(DbError::Validation)` - Negative initial stock
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown supplier
    pub async fn add(&self, product: &Product, initial_stock: i64) -> DbResult<i64> {
        debug!(name = %product.name, initial_stock, "Inserting product");

        if initial_stock < 0 {
            return Err(ValidationError::OutOfRange {
                field: "initial_stock".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO produtos (nome, descricao, preco_venda, preco_compra, fornecedor_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.sale_price)
        .bind(product.purchase_price)
        .bind(product.supplier_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        if initial_stock > 0 {
            sqlx::query("INSERT INTO estoque (produto_id, quantidade) VALUES (?1, ?2)")
                .bind(id)
                .bind(initial_stock)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(id, initial_stock, "Product created");
        Ok(id)
    }

    /// All products ordered by name, each with its stock quantity.
    pub async fn get_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("{SELECT_PRODUCT} ORDER BY p.nome ASC");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by id, with its stock quantity.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("{SELECT_PRODUCT} WHERE p.id_produto = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Products whose name contains `fragment`, ordered by name.
    ///
    /// Uses the same stock join as [`get_all`](Self::get_all).
    pub async fn search(&self, fragment: &str) -> DbResult<Vec<Product>> {
        debug!(fragment, "Searching products");

        let sql = format!(
            "{SELECT_PRODUCT} WHERE p.nome LIKE ?1 ESCAPE '\\' ORDER BY p.nome ASC"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(contains_pattern(fragment))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Overwrites name, description, prices and supplier.
    ///
    /// Stock is not touched; `product.stock_quantity` is ignored. A missing id
    /// is a no-op.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE produtos SET
                nome = ?2,
                descricao = ?3,
                preco_venda = ?4,
                preco_compra = ?5,
                fornecedor_id = ?6
            WHERE id_produto = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.sale_price)
        .bind(product.purchase_price)
        .bind(product.supplier_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(id = product.id, "Product not found, nothing updated");
        }

        Ok(())
    }

    /// Removes a product and its stock row together.
    ///
    /// If the product cannot be deleted (a sale still references it), the
    /// stock row is kept as well. A missing id is a no-op.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM estoque WHERE produto_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM produtos WHERE id_produto = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            debug!(id, "Product not found, nothing deleted");
        }

        Ok(())
    }

    /// Adds `delta` to the product's stock, creating the row when missing.
    ///
    /// ## Returns
    /// * `Ok(quantity)` - The new quantity
    /// * `Err(DbError::InsufficientStock)` - Result would be negative; nothing written
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown product
    pub async fn update_stock(&self, product_id: i64, delta: i64) -> DbResult<i64> {
        debug!(product_id, delta, "Updating stock");

        let mut tx = self.pool.begin().await?;
        let quantity = adjust_stock(&mut *tx, product_id, delta).await?;
        tx.commit().await?;

        Ok(quantity)
    }

    /// Quantity on hand, `0` when the product has no stock row.
    pub async fn get_stock(&self, product_id: i64) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        current_stock(&mut *conn, product_id).await
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM produtos")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Stock helpers shared with sale finalization
// =============================================================================

pub(crate) async fn current_stock(conn: &mut SqliteConnection, product_id: i64) -> DbResult<i64> {
    let quantity: Option<i64> =
        sqlx::query_scalar("SELECT quantidade FROM estoque WHERE produto_id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(quantity.unwrap_or(0))
}

/// Reads, checks and upserts one product's stock on the given connection.
///
/// Must run inside a transaction so the read and the write see the same row.
pub(crate) async fn adjust_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    delta: i64,
) -> DbResult<i64> {
    let available = current_stock(conn, product_id).await?;
    let quantity = available
        .checked_add(delta)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "quantidade".to_string(),
            min: 0,
            max: i64::MAX,
        })?;

    if quantity < 0 {
        return Err(DbError::InsufficientStock {
            product_id,
            available,
            requested: delta.saturating_neg(),
        });
    }

    sqlx::query(
        r#"
        INSERT INTO estoque (produto_id, quantidade) VALUES (?1, ?2)
        ON CONFLICT(produto_id) DO UPDATE SET quantidade = excluded.quantidade
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    debug!(product_id, available, quantity, "Stock adjusted");
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use softx_core::Money;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product(name: &str, price_cents: i64) -> Product {
        Product {
            id: 0,
            name: name.to_string(),
            description: Some(format!("{name} 1kg")),
            sale_price: Money::from_cents(price_cents),
            purchase_price: Money::from_cents(price_cents / 2),
            supplier_id: None,
            stock_quantity: 0,
        }
    }

    #[tokio::test]
    async fn test_add_with_initial_stock() {
        let db = test_db().await;
        let repo = db.products();

        let input = product("Café", 1250);
        let id = repo.add(&input, 5).await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(
            all,
            vec![Product {
                id,
                stock_quantity: 5,
                ..input
            }]
        );
    }

    #[tokio::test]
    async fn test_product_without_stock_row_reports_zero() {
        let db = test_db().await;
        let repo = db.products();

        let id = repo.add(&product("Açúcar", 599), 0).await.unwrap();

        let found = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.stock_quantity, 0);
        assert_eq!(repo.get_stock(id).await.unwrap(), 0);
        assert_eq!(repo.search("Açú").await.unwrap()[0].stock_quantity, 0);
    }

    #[tokio::test]
    async fn test_add_rejects_negative_initial_stock() {
        let db = test_db().await;
        let repo = db.products();

        let err = repo.add(&product("Sal", 300), -1).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_with_unknown_supplier_writes_nothing() {
        let db = test_db().await;
        let repo = db.products();

        let mut orphan = product("Óleo", 899);
        orphan.supplier_id = Some(42);
        let err = repo.add(&orphan, 3).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_stock_rejects_negative_result() {
        let db = test_db().await;
        let repo = db.products();

        let id = repo.add(&product("Arroz", 2490), 5).await.unwrap();

        assert_eq!(repo.update_stock(id, -2).await.unwrap(), 3);
        assert_eq!(repo.get_by_id(id).await.unwrap().unwrap().stock_quantity, 3);

        let err = repo.update_stock(id, -10).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::InsufficientStock {
                available: 3,
                requested: 10,
                ..
            }
        ));
        assert_eq!(repo.get_stock(id).await.unwrap(), 3);

        // Down to exactly zero is allowed
        assert_eq!(repo.update_stock(id, -3).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_stock_extreme_deltas() {
        let db = test_db().await;
        let repo = db.products();

        let id = repo.add(&product("Sal", 199), 5).await.unwrap();

        let err = repo.update_stock(id, i64::MAX).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let err = repo.update_stock(id, i64::MIN).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::InsufficientStock {
                available: 5,
                requested: i64::MAX,
                ..
            }
        ));

        assert_eq!(repo.get_stock(id).await.unwrap(), 5);
        assert_eq!(repo.update_stock(id, 1).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_update_stock_creates_missing_row() {
        let db = test_db().await;
        let repo = db.products();

        let id = repo.add(&product("Feijão", 899), 0).await.unwrap();
        assert_eq!(repo.update_stock(id, 4).await.unwrap(), 4);
        assert_eq!(repo.update_stock(id, 6).await.unwrap(), 10);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM estoque WHERE produto_id = ?1")
            .bind(id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_update_stock_unknown_product() {
        let db = test_db().await;
        let err = db.products().update_stock(77, 1).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_keeps_stock() {
        let db = test_db().await;
        let repo = db.products();

        let id = repo.add(&product("Leite", 499), 8).await.unwrap();
        let mut changed = product("Leite Integral", 549);
        changed.id = id;
        changed.stock_quantity = 999;
        repo.update(&changed).await.unwrap();

        let found = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.name, "Leite Integral");
        assert_eq!(found.sale_price.cents(), 549);
        assert_eq!(found.stock_quantity, 8);
    }

    #[tokio::test]
    async fn test_delete_removes_stock_too() {
        let db = test_db().await;
        let repo = db.products();

        let id = repo.add(&product("Farinha", 650), 2).await.unwrap();
        repo.delete(id).await.unwrap();

        assert_eq!(repo.get_by_id(id).await.unwrap(), None);
        assert_eq!(repo.get_stock(id).await.unwrap(), 0);

        repo.delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_search_matches_get_all_when_empty() {
        let db = test_db().await;
        let repo = db.products();

        repo.add(&product("Macarrão", 450), 1).await.unwrap();
        repo.add(&product("Molho", 350), 0).await.unwrap();

        assert_eq!(repo.search("").await.unwrap(), repo.get_all().await.unwrap());
        assert_eq!(repo.search("Mol").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let db = test_db().await;
        let repo = db.products();

        repo.add(&product("Desconto 50% Sabão", 990), 1).await.unwrap();
        repo.add(&product("Sabão 500g", 790), 1).await.unwrap();
        repo.add(&product("Pão_Forma", 690), 1).await.unwrap();

        let found = repo.search("50%").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Desconto 50% Sabão");

        assert_eq!(repo.search("o_F").await.unwrap().len(), 1);
        assert!(repo.search("o_5").await.unwrap().is_empty());
    }
}
