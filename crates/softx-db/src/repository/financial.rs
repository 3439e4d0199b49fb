//! # Financial Repository
//!
//! Cash ledger (`financeiro`). Finalized sales write an `entrada` here in the
//! same transaction as the sale; other entries are recorded by hand.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use softx_core::{Financial, FinancialKind, Money, ValidationError};

const SELECT_FINANCIAL: &str = r#"
    SELECT
        id_financeiro AS id,
        tipo          AS kind,
        valor         AS amount,
        descricao     AS description,
        data          AS recorded_at
    FROM financeiro
"#;

/// Repository for ledger entries.
#[derive(Debug, Clone)]
pub struct FinancialRepository {
    pool: SqlitePool,
}

impl FinancialRepository {
    /// Creates a new FinancialRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FinancialRepository { pool }
    }

    /// Records an entry stamped with the current time and returns its id.
    ///
    /// The amount is unsigned; `kind` gives the direction.
    pub async fn add(
        &self,
        kind: FinancialKind,
        amount: Money,
        description: Option<&str>,
    ) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        insert_entry(&mut *conn, kind, amount, description).await
    }

    /// All entries, newest first.
    pub async fn get_all(&self) -> DbResult<Vec<Financial>> {
        let sql = format!("{SELECT_FINANCIAL} ORDER BY data DESC, id_financeiro DESC");
        Ok(sqlx::query_as::<_, Financial>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Entradas minus saidas.
    pub async fn balance(&self) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE tipo WHEN 'entrada' THEN valor ELSE -valor END), 0)
            FROM financeiro
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents))
    }
}

/// Inserts one ledger row on the given connection.
pub(crate) async fn insert_entry(
    conn: &mut SqliteConnection,
    kind: FinancialKind,
    amount: Money,
    description: Option<&str>,
) -> DbResult<i64> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "valor".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    let id = sqlx::query("INSERT INTO financeiro (tipo, valor, descricao) VALUES (?1, ?2, ?3)")
        .bind(kind)
        .bind(amount)
        .bind(description)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    debug!(id, ?kind, %amount, "Ledger entry recorded");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_balance() {
        let db = test_db().await;
        let repo = db.financial();

        assert_eq!(repo.balance().await.unwrap(), Money::zero());

        repo.add(FinancialKind::Entrada, Money::from_cents(10_000), Some("Aporte"))
            .await
            .unwrap();
        repo.add(FinancialKind::Saida, Money::from_cents(2_550), Some("Conta de luz"))
            .await
            .unwrap();

        assert_eq!(repo.balance().await.unwrap().cents(), 7_450);
    }

    #[tokio::test]
    async fn test_get_all_newest_first() {
        let db = test_db().await;
        let repo = db.financial();

        let first = repo.add(FinancialKind::Entrada, Money::from_cents(100), None).await.unwrap();
        let second = repo.add(FinancialKind::Saida, Money::from_cents(50), None).await.unwrap();

        let entries = repo.get_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, second);
        assert_eq!(entries[0].kind, FinancialKind::Saida);
        assert_eq!(entries[0].signed_amount().cents(), -50);
        assert_eq!(entries[1].id, first);
        assert_eq!(entries[1].description, None);
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() {
        let db = test_db().await;
        let err = db
            .financial()
            .add(FinancialKind::Entrada, Money::from_cents(-1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }
}
