//! # Sale Repository
//!
//! Finalizes the sale composed on screen and reads sale history.
//!
//! ## Finalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    finalize(client, user, draft, discount)              │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    │                                                                    │
//! │    ├── for each line: product exists?      no ──► NotFound   ─┐        │
//! │    │                  stock >= quantity?   no ──► Insufficient┤        │
//! │    │                  estoque -= quantity                      │        │
//! │    │                                                       ROLLBACK    │
//! │    ├── INSERT vendas (total = max(0, subtotal − discount))     │        │
//! │    ├── INSERT venda_itens (one per line, price frozen)         │        │
//! │    ├── INSERT financeiro ('entrada', total)   any error ───────┘        │
//! │    │                                                                    │
//! │  COMMIT ──► Sale                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed finalization leaves stock, sales and the ledger exactly as they
//! were.

use sqlx::SqlitePool;
use tracing::{debug, info};

use super::financial::insert_entry;
use super::product::adjust_stock;
use crate::error::{DbError, DbResult};
use softx_core::{
    CoreError, FinancialKind, Money, Sale, SaleDraft, SaleItem, SaleTotals, ValidationError,
};

const SELECT_SALE: &str = r#"
    SELECT
        id_vendas  AS id,
        cliente_id AS client_id,
        usuario_id AS user_id,
        data_venda AS sold_at,
        total
    FROM vendas
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes the draft as a sale, all or nothing.
    ///
    /// ## Arguments
    /// * `client_id` - Buying client
    /// * `user_id` - Logged-in seller
    /// * `draft` - Lines on screen
    /// * `discount` - Discount off the subtotal; the stored total never goes below zero
    ///
    /// ## Returns
    /// * `Ok(Sale)` - The stored sale
    /// * `Err(DbError::Domain(CoreError::EmptySale))` - Draft has no lines
    /// * `Err(DbError::Validation)` - Negative discount, malformed line, or a
    ///   subtotal too large for `Money`
    /// * `Err(DbError::InsufficientStock)` - A line sells more than is on hand
    /// * `Err(DbError::NotFound)` - A line references a missing product
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown client or user
    pub async fn finalize(
        &self,
        client_id: i64,
        user_id: i64,
        draft: &SaleDraft,
        discount: Money,
    ) -> DbResult<Sale> {
        if draft.is_empty() {
            return Err(CoreError::EmptySale.into());
        }
        if discount.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "desconto".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let totals = SaleTotals::compute(draft.subtotal()?, discount, Money::zero());

        debug!(
            client_id,
            user_id,
            lines = draft.items().len(),
            total = %totals.total,
            "Finalizing sale"
        );

        let mut tx = self.pool.begin().await?;

        for item in draft.items() {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT id_produto FROM produtos WHERE id_produto = ?1")
                    .bind(item.product_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if exists.is_none() {
                return Err(DbError::not_found("Product", item.product_id));
            }

            adjust_stock(&mut *tx, item.product_id, -item.quantity).await?;
        }

        let sale_id =
            sqlx::query("INSERT INTO vendas (cliente_id, usuario_id, total) VALUES (?1, ?2, ?3)")
                .bind(client_id)
                .bind(user_id)
                .bind(totals.total)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();

        for item in draft.items() {
            sqlx::query(
                r#"
                INSERT INTO venda_itens (venda_id, produto_id, quantidade, preco_unitario)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(sale_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        let description = format!("Venda #{sale_id}");
        insert_entry(
            &mut *tx,
            FinancialKind::Entrada,
            totals.total,
            Some(description.as_str()),
        )
        .await?;

        let sql = format!("{SELECT_SALE} WHERE id_vendas = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(sale_id, total = %sale.total, "Sale finalized");
        Ok(sale)
    }

    /// Gets a sale by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let sql = format!("{SELECT_SALE} WHERE id_vendas = ?1");
        Ok(sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// All sales, newest first.
    pub async fn get_all(&self) -> DbResult<Vec<Sale>> {
        let sql = format!("{SELECT_SALE} ORDER BY data_venda DESC, id_vendas DESC");
        Ok(sqlx::query_as::<_, Sale>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Lines of a sale in the order they were entered.
    pub async fn get_items(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT
                id_item        AS id,
                venda_id       AS sale_id,
                produto_id     AS product_id,
                quantidade     AS quantity,
                preco_unitario AS unit_price
            FROM venda_itens
            WHERE venda_id = ?1
            ORDER BY id_item
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use softx_core::{Client, LineItem, Product, User};

    struct Fixture {
        db: Database,
        client_id: i64,
        user_id: i64,
        coffee: Product,
        sugar: Product,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let client_id = db
            .clients()
            .add(&Client {
                name: "Cliente Balcão".to_string(),
                cpf: "00000000000".to_string(),
                email: "balcao@loja.com".to_string(),
                ..Client::default()
            })
            .await
            .unwrap();
        let user_id = db
            .users()
            .add(
                &User {
                    username: "vendedor".to_string(),
                    cpf: "11111111111".to_string(),
                    email: "vendedor@loja.com".to_string(),
                    ..User::default()
                },
                "123456",
            )
            .await
            .unwrap();

        let mut coffee = Product {
            name: "Café".to_string(),
            sale_price: Money::from_cents(1000),
            purchase_price: Money::from_cents(600),
            ..Product::default()
        };
        coffee.id = db.products().add(&coffee, 5).await.unwrap();

        let mut sugar = Product {
            name: "Açúcar".to_string(),
            sale_price: Money::from_cents(550),
            purchase_price: Money::from_cents(300),
            ..Product::default()
        };
        sugar.id = db.products().add(&sugar, 1).await.unwrap();

        Fixture {
            db,
            client_id,
            user_id,
            coffee,
            sugar,
        }
    }

    #[tokio::test]
    async fn test_finalize_writes_everything() {
        let f = fixture().await;
        let mut draft = SaleDraft::new();
        draft.add_item(&f.coffee, 2).unwrap();
        draft.add_item(&f.sugar, 1).unwrap();

        let sale = f
            .db
            .sales()
            .finalize(f.client_id, f.user_id, &draft, Money::from_cents(300))
            .await
            .unwrap();

        assert_eq!(sale.total.cents(), 2250);
        assert_eq!(sale.client_id, f.client_id);
        assert_eq!(sale.user_id, f.user_id);

        let items = f.db.sales().get_items(sale.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product_id, f.coffee.id);
        assert_eq!(items[0].line_total().cents(), 2000);
        assert_eq!(items[1].unit_price.cents(), 550);

        assert_eq!(f.db.products().get_stock(f.coffee.id).await.unwrap(), 3);
        assert_eq!(f.db.products().get_stock(f.sugar.id).await.unwrap(), 0);

        assert_eq!(f.db.financial().balance().await.unwrap().cents(), 2250);
        assert_eq!(f.db.sales().get_by_id(sale.id).await.unwrap(), Some(sale.clone()));
        assert_eq!(f.db.sales().get_all().await.unwrap(), vec![sale]);
    }

    #[tokio::test]
    async fn test_oversell_rolls_back_everything() {
        let f = fixture().await;
        let mut draft = SaleDraft::new();
        draft.add_item(&f.coffee, 2).unwrap();
        draft.add_item(&f.sugar, 3).unwrap();

        let err = f
            .db
            .sales()
            .finalize(f.client_id, f.user_id, &draft, Money::zero())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::InsufficientStock {
                available: 1,
                requested: 3,
                ..
            }
        ));

        // Coffee was decremented before sugar failed; that is undone too
        assert_eq!(f.db.products().get_stock(f.coffee.id).await.unwrap(), 5);
        assert_eq!(f.db.products().get_stock(f.sugar.id).await.unwrap(), 1);
        assert!(f.db.sales().get_all().await.unwrap().is_empty());
        assert!(f.db.financial().get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_client_rolls_back_stock() {
        let f = fixture().await;
        let mut draft = SaleDraft::new();
        draft.add_item(&f.coffee, 1).unwrap();

        let err = f
            .db
            .sales()
            .finalize(9_999, f.user_id, &draft, Money::zero())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert_eq!(f.db.products().get_stock(f.coffee.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_empty_and_unknown_product_rejected() {
        let f = fixture().await;

        let err = f
            .db
            .sales()
            .finalize(f.client_id, f.user_id, &SaleDraft::new(), Money::zero())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptySale)));

        let mut draft = SaleDraft::new();
        let ghost = Product {
            id: 404,
            name: "Fantasma".to_string(),
            ..Product::default()
        };
        draft.add_item(&ghost, 1).unwrap();
        let err = f
            .db
            .sales()
            .finalize(f.client_id, f.user_id, &draft, Money::zero())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_lines_rejected_before_touching_stock() {
        let f = fixture().await;
        let line = |quantity, price| LineItem {
            product_id: f.coffee.id,
            name: f.coffee.name.clone(),
            quantity,
            unit_price: Money::from_cents(price),
        };

        for draft in [
            SaleDraft::from_iter([line(1, -1_000)]),
            SaleDraft::from_iter([line(0, 1_000)]),
            SaleDraft::from_iter([line(-2, 1_000)]),
            SaleDraft::from_iter([line(3, i64::MAX / 2)]),
        ] {
            let err = f
                .db
                .sales()
                .finalize(f.client_id, f.user_id, &draft, Money::zero())
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::Validation(_)), "{err:?}");
        }

        assert_eq!(f.db.products().get_stock(f.coffee.id).await.unwrap(), 5);
        assert!(f.db.sales().get_all().await.unwrap().is_empty());
        assert!(f.db.financial().get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_negative_discount_rejected() {
        let f = fixture().await;
        let mut draft = SaleDraft::new();
        draft.add_item(&f.coffee, 1).unwrap();

        let err = f
            .db
            .sales()
            .finalize(f.client_id, f.user_id, &draft, Money::from_cents(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_discount_above_subtotal_stores_zero_total() {
        let f = fixture().await;
        let mut draft = SaleDraft::new();
        draft.add_item(&f.sugar, 1).unwrap();

        let sale = f
            .db
            .sales()
            .finalize(f.client_id, f.user_id, &draft, Money::from_cents(10_000))
            .await
            .unwrap();
        assert_eq!(sale.total, Money::zero());
    }

    #[tokio::test]
    async fn test_sold_product_cannot_be_deleted_and_keeps_stock() {
        let f = fixture().await;
        let mut draft = SaleDraft::new();
        draft.add_item(&f.coffee, 1).unwrap();
        f.db.sales()
            .finalize(f.client_id, f.user_id, &draft, Money::zero())
            .await
            .unwrap();

        let err = f.db.products().delete(f.coffee.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        // The stock delete ran first and was rolled back with the product delete
        let product = f.db.products().get_by_id(f.coffee.id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 4);
    }
}
