//! # User Repository
//!
//! Database operations for system users (`usuarios`), password hashing and
//! login.
//!
//! ## Password Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Password Lifecycle                                   │
//! │                                                                         │
//! │  add(user, "segredo")                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  hash_password ── Argon2id + random salt ──► senha = "$argon2id$..."   │
//! │                                                                         │
//! │  update(user, PasswordChange::Keep)        ► senha untouched           │
//! │  update(user, PasswordChange::Replace(p))  ► senha = hash_password(p)  │
//! │                                                                         │
//! │  authenticate(name, p)                                                 │
//! │       ├── no such user ──────────────► AuthError::InvalidCredentials   │
//! │       ├── check_password fails ──────► AuthError::InvalidCredentials   │
//! │       ├── database error ────────────► AuthError::Storage (warn log)   │
//! │       └── ok ────────────────────────► User                            │
//! │                                                                         │
//! │  The plaintext is never stored or logged.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::contains_pattern;
use crate::error::{AuthError, DbError, DbResult};
use softx_core::{PasswordChange, User, ValidationError};

const SELECT_USER: &str = r#"
    SELECT
        id_usuario       AS id,
        nome_usuario     AS username,
        cpf_usuario      AS cpf,
        email_usuario    AS email,
        telefone_usuario AS phone,
        data_nascimento  AS birth_date,
        rua              AS street,
        cep              AS postal_code,
        bairro           AS district,
        cidade           AS city,
        senha            AS password_hash,
        tipo             AS role,
        permissao        AS permission
    FROM usuarios
"#;

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password with Argon2 and a fresh random salt.
///
/// Two calls with the same input give different hashes.
pub fn hash_password(plain: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| DbError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored hash.
///
/// A hash that cannot be parsed never matches.
pub fn check_password(plain: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok()
}

/// [`hash_password`] on the blocking thread pool.
async fn hash_in_background(plain: &str) -> DbResult<String> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| DbError::Internal(format!("Password hashing task failed: {e}")))?
}

/// [`check_password`] on the blocking thread pool.
async fn check_in_background(plain: &str, hash: String) -> DbResult<bool> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || check_password(&plain, &hash))
        .await
        .map_err(|e| DbError::Internal(format!("Password check task failed: {e}")))
}

fn require_password(plain: &str) -> DbResult<()> {
    if plain.is_empty() {
        return Err(ValidationError::Required {
            field: "senha".to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.users();
///
/// let id = repo.add(&user, "segredo").await?;
/// match repo.authenticate("ana", "segredo").await {
///     Ok(user) => open_main_window(user),
///     Err(AuthError::InvalidCredentials) => show_warning("Usuário ou senha inválidos"),
///     Err(AuthError::Storage(e)) => show_error(e),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user, storing only the hash of `password`.
    ///
    /// `user.id` and `user.password_hash` are ignored.
    ///
    /// ## Returns
    /// * `Ok(id)` - Assigned user id
    /// * `Err(DbError::Validation)` - Empty password
    /// * `Err(DbError::UniqueViolation)` - CPF or e-mail already registered
    pub async fn add(&self, user: &User, password: &str) -> DbResult<i64> {
        debug!(username = %user.username, role = %user.role, "Inserting user");

        require_password(password)?;
        let hash = hash_in_background(password).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO usuarios (
                nome_usuario, cpf_usuario, email_usuario, telefone_usuario,
                data_nascimento, rua, cep, bairro, cidade,
                senha, tipo, permissao
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&user.username)
        .bind(&user.cpf)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.birth_date)
        .bind(&user.address.street)
        .bind(&user.address.postal_code)
        .bind(&user.address.district)
        .bind(&user.address.city)
        .bind(&hash)
        .bind(user.role)
        .bind(user.permission)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(id, role = %user.role, "User created");
        Ok(id)
    }

    /// All users ordered by username.
    pub async fn get_all(&self) -> DbResult<Vec<User>> {
        let sql = format!("{SELECT_USER} ORDER BY nome_usuario ASC");
        Ok(sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE id_usuario = ?1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Exact username lookup. Usernames are not unique; the oldest match wins.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE nome_usuario = ?1 ORDER BY id_usuario LIMIT 1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Overwrites every field of the user with `user.id`.
    ///
    /// The password column is rewritten only for `PasswordChange::Replace`.
    /// `user.password_hash` is always ignored. A missing id is a no-op.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - `Replace` with an empty password
    pub async fn update(&self, user: &User, password: PasswordChange) -> DbResult<()> {
        debug!(id = user.id, "Updating user");

        let new_hash = match &password {
            PasswordChange::Keep => None,
            PasswordChange::Replace(plain) => {
                require_password(plain)?;
                Some(hash_in_background(plain).await?)
            }
        };

        let sql = if new_hash.is_some() {
            r#"
            UPDATE usuarios SET
                nome_usuario = ?2, cpf_usuario = ?3, email_usuario = ?4,
                telefone_usuario = ?5, data_nascimento = ?6,
                rua = ?7, cep = ?8, bairro = ?9, cidade = ?10,
                tipo = ?11, permissao = ?12, senha = ?13
            WHERE id_usuario = ?1
            "#
        } else {
            r#"
            UPDATE usuarios SET
                nome_usuario = ?2, cpf_usuario = ?3, email_usuario = ?4,
                telefone_usuario = ?5, data_nascimento = ?6,
                rua = ?7, cep = ?8, bairro = ?9, cidade = ?10,
                tipo = ?11, permissao = ?12
            WHERE id_usuario = ?1
            "#
        };

        let mut query = sqlx::query(sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.cpf)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(&user.birth_date)
            .bind(&user.address.street)
            .bind(&user.address.postal_code)
            .bind(&user.address.district)
            .bind(&user.address.city)
            .bind(user.role)
            .bind(user.permission);
        if let Some(hash) = new_hash {
            query = query.bind(hash);
        }

        let result = query.execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            debug!(id = user.id, "User not found, nothing updated");
        }

        Ok(())
    }

    /// Removes a user. A missing id is a no-op.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting user");

        let result = sqlx::query("DELETE FROM usuarios WHERE id_usuario = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            debug!(id, "User not found, nothing deleted");
        }

        Ok(())
    }

    /// Users whose username contains `fragment`, ordered by username.
    pub async fn search(&self, fragment: &str) -> DbResult<Vec<User>> {
        debug!(fragment, "Searching users");

        let sql = format!(
            "{SELECT_USER} WHERE nome_usuario LIKE ?1 ESCAPE '\\' ORDER BY nome_usuario ASC"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(contains_pattern(fragment))
            .fetch_all(&self.pool)
            .await?)
    }

    /// Checks a login attempt.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = match self.get_by_username(username).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!(username, "Login failed: unknown user");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                warn!(username, error = %e, "Login failed: user lookup error");
                return Err(AuthError::Storage(e));
            }
        };

        let matches = match check_in_background(password, user.password_hash.clone()).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(username, error = %e, "Login failed: password check error");
                return Err(AuthError::Storage(e));
            }
        };
        if !matches {
            debug!(username, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(id = user.id, role = %user.role, "User logged in");
        Ok(user)
    }

    /// Counts users (for diagnostics and the seeder).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usuarios")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
