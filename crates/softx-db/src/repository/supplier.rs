//! # Supplier Repository
//!
//! Database operations for suppliers (`fornecedores`). Phone and e-mail are
//! optional; several suppliers may have no e-mail, but two may not share one.

use sqlx::SqlitePool;
use tracing::debug;

use super::contains_pattern;
use crate::error::DbResult;
use softx_core::Supplier;

const SELECT_SUPPLIER: &str = r#"
    SELECT
        id_fornecedor AS id,
        nome          AS name,
        cnpj,
        telefone      AS phone,
        email,
        rua           AS street,
        cep           AS postal_code,
        bairro        AS district,
        cidade        AS city
    FROM fornecedores
"#;

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Inserts a supplier and returns the assigned id.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - CNPJ or e-mail already registered
    pub async fn add(&self, supplier: &Supplier) -> DbResult<i64> {
        debug!(name = %supplier.name, "Inserting supplier");

        let result = sqlx::query(
            r#"
            INSERT INTO fornecedores (nome, cnpj, telefone, email, rua, cep, bairro, cidade)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&supplier.name)
        .bind(&supplier.cnpj)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address.street)
        .bind(&supplier.address.postal_code)
        .bind(&supplier.address.district)
        .bind(&supplier.address.city)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// All suppliers ordered by name.
    pub async fn get_all(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("{SELECT_SUPPLIER} ORDER BY nome ASC");
        Ok(sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Gets a supplier by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Supplier>> {
        let sql = format!("{SELECT_SUPPLIER} WHERE id_fornecedor = ?1");
        Ok(sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Overwrites every field of the supplier with `supplier.id`.
    /// A missing id is a no-op.
    pub async fn update(&self, supplier: &Supplier) -> DbResult<()> {
        debug!(id = supplier.id, "Updating supplier");

        let result = sqlx::query(
            r#"
            UPDATE fornecedores SET
                nome = ?2,
                cnpj = ?3,
                telefone = ?4,
                email = ?5,
                rua = ?6,
                cep = ?7,
                bairro = ?8,
                cidade = ?9
            WHERE id_fornecedor = ?1
            "#,
        )
        .bind(supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.cnpj)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address.street)
        .bind(&supplier.address.postal_code)
        .bind(&supplier.address.district)
        .bind(&supplier.address.city)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(id = supplier.id, "Supplier not found, nothing updated");
        }

        Ok(())
    }

    /// Removes a supplier. A missing id is a no-op.
    ///
    /// Fails with `ForeignKeyViolation` while products still reference it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM fornecedores WHERE id_fornecedor = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            debug!(id, "Supplier not found, nothing deleted");
        }

        Ok(())
    }

    /// Suppliers whose name contains `fragment`, ordered by name.
    pub async fn search(&self, fragment: &str) -> DbResult<Vec<Supplier>> {
        debug!(fragment, "Searching suppliers");

        let sql = format!(
            "{SELECT_SUPPLIER} WHERE nome LIKE ?1 ESCAPE '\\' ORDER BY nome ASC"
        );
        Ok(sqlx::query_as::<_, Supplier>(&sql)
            .bind(contains_pattern(fragment))
            .fetch_all(&self.pool)
            .await?)
    }

    /// Counts suppliers (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fornecedores")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use softx_core::{Address, Product};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn supplier(name: &str, cnpj: &str, email: Option<&str>) -> Supplier {
        Supplier {
            id: 0,
            name: name.to_string(),
            cnpj: cnpj.to_string(),
            phone: None,
            email: email.map(str::to_string),
            address: Address {
                street: "Av. Industrial, 500".to_string(),
                postal_code: "09000000".to_string(),
                district: "Distrito Industrial".to_string(),
                city: "Santo André".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_add_then_get_all() {
        let db = test_db().await;
        let repo = db.suppliers();

        let mut input = supplier("Distribuidora Alfa", "11222333000181", Some("vendas@alfa.com"));
        input.phone = Some("(11) 4000-1000".to_string());
        let id = repo.add(&input).await.unwrap();

        assert_eq!(repo.get_all().await.unwrap(), vec![Supplier { id, ..input }]);
    }

    #[tokio::test]
    async fn test_optional_contact_fields() {
        let db = test_db().await;
        let repo = db.suppliers();

        let a = repo.add(&supplier("A", "1", None)).await.unwrap();
        repo.add(&supplier("B", "2", None)).await.unwrap();

        let found = repo.get_by_id(a).await.unwrap().unwrap();
        assert_eq!(found.email, None);
        assert_eq!(found.phone, None);

        let err = repo.add(&supplier("C", "1", None)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let repo = db.suppliers();

        let id = repo.add(&supplier("Beta", "2", Some("b@x.com"))).await.unwrap();
        let mut changed = supplier("Beta Atacado", "2", None);
        changed.id = id;
        repo.update(&changed).await.unwrap();
        assert_eq!(repo.get_by_id(id).await.unwrap(), Some(changed));

        repo.delete(id).await.unwrap();
        repo.delete(id).await.unwrap();
        assert_eq!(repo.get_by_id(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_referenced_supplier_fails() {
        let db = test_db().await;
        let id = db.suppliers().add(&supplier("Gama", "3", None)).await.unwrap();
        let product = Product {
            name: "Parafuso".to_string(),
            supplier_id: Some(id),
            ..Product::default()
        };
        db.products().add(&product, 0).await.unwrap();

        let err = db.suppliers().delete(id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(db.suppliers().get_by_id(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_search() {
        let db = test_db().await;
        let repo = db.suppliers();

        repo.add(&supplier("Alfa Bebidas", "1", None)).await.unwrap();
        repo.add(&supplier("Beta Limpeza", "2", None)).await.unwrap();

        let hits = repo.search("Bebidas").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Alfa Bebidas");
        assert_eq!(repo.search("").await.unwrap(), repo.get_all().await.unwrap());
    }
}
