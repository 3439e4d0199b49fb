//! # Client Repository
//!
//! Database operations for customers (`clientes`).

use sqlx::SqlitePool;
use tracing::debug;

use super::contains_pattern;
use crate::error::DbResult;
use softx_core::Client;

const SELECT_CLIENT: &str = r#"
    SELECT
        id_cliente       AS id,
        nome_cliente     AS name,
        cpf_cliente      AS cpf,
        email_cliente    AS email,
        telefone_cliente AS phone,
        data_nascimento  AS birth_date,
        rua              AS street,
        cep              AS postal_code,
        bairro           AS district,
        cidade           AS city
    FROM clientes
"#;

/// Repository for client database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.clients();
///
/// let id = repo.add(&client).await?;
/// let silvas = repo.search("Silva").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a client and returns the assigned id.
    ///
    /// `client.id` is ignored.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - CPF or e-mail already registered
    pub async fn add(&self, client: &Client) -> DbResult<i64> {
        debug!(name = %client.name, "Inserting client");

        let result = sqlx::query(
            r#"
            INSERT INTO clientes (
                nome_cliente, cpf_cliente, email_cliente, telefone_cliente,
                data_nascimento, rua, cep, bairro, cidade
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&client.name)
        .bind(&client.cpf)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.birth_date)
        .bind(&client.address.street)
        .bind(&client.address.postal_code)
        .bind(&client.address.district)
        .bind(&client.address.city)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// All clients ordered by name.
    pub async fn get_all(&self) -> DbResult<Vec<Client>> {
        let sql = format!("{SELECT_CLIENT} ORDER BY nome_cliente ASC");
        let clients = sqlx::query_as::<_, Client>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    /// Gets a client by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Client>> {
        let sql = format!("{SELECT_CLIENT} WHERE id_cliente = ?1");
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    /// Overwrites every field of the client with `client.id`.
    ///
    /// A missing id is not an error; nothing is written.
    pub async fn update(&self, client: &Client) -> DbResult<()> {
        debug!(id = client.id, "Updating client");

        let result = sqlx::query(
            r#"
            UPDATE clientes SET
                nome_cliente = ?2,
                cpf_cliente = ?3,
                email_cliente = ?4,
                telefone_cliente = ?5,
                data_nascimento = ?6,
                rua = ?7,
                cep = ?8,
                bairro = ?9,
                cidade = ?10
            WHERE id_cliente = ?1
            "#,
        )
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.cpf)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.birth_date)
        .bind(&client.address.street)
        .bind(&client.address.postal_code)
        .bind(&client.address.district)
        .bind(&client.address.city)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(id = client.id, "Client not found, nothing updated");
        }

        Ok(())
    }

    /// Removes a client. A missing id is not an error.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting client");

        let result = sqlx::query("DELETE FROM clientes WHERE id_cliente = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            debug!(id, "Client not found, nothing deleted");
        }

        Ok(())
    }

    /// Clients whose name contains `fragment`, ordered by name.
    ///
    /// An empty fragment returns every client.
    pub async fn search(&self, fragment: &str) -> DbResult<Vec<Client>> {
        debug!(fragment, "Searching clients");

        let sql = format!(
            "{SELECT_CLIENT} WHERE nome_cliente LIKE ?1 ESCAPE '\\' ORDER BY nome_cliente ASC"
        );
        let clients = sqlx::query_as::<_, Client>(&sql)
            .bind(contains_pattern(fragment))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = clients.len(), "Search returned clients");
        Ok(clients)
    }

    /// Counts clients (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clientes")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
