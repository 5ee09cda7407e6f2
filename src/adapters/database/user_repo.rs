use crate::adapters::database::records::UserRecord;
use crate::domain::user::User;
use crate::error::{AppError, Result};
use sqlx::PgConnection;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password_hash, is_active, created_at, last_login";

#[derive(Clone, Debug, Default)]
pub struct UserRepository {}

impl UserRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Inserts a new active user.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if the username or email is already taken, or `AppError::Database` if the
    /// insert fails for another reason.
    #[tracing::instrument(level = "debug", skip(self, conn, password_hash), err)]
    pub(crate) async fn create(
        &self,
        conn: &mut PgConnection,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => unique_violation_message(db.constraint()),
            e => AppError::Database(e),
        })?;

        Ok(record.into())
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn, email), err)]
    pub(crate) async fn find_by_email(&self, conn: &mut PgConnection, email: &str) -> Result<Option<User>> {
        let record =
            sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"))
                .bind(email)
                .fetch_optional(conn)
                .await?;

        Ok(record.map(Into::into))
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn username_exists(&self, conn: &mut PgConnection, username: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(conn)
            .await?;

        Ok(exists)
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn, email), err)]
    pub(crate) async fn email_exists(&self, conn: &mut PgConnection, email: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1))")
            .bind(email)
            .fetch_one(conn)
            .await?;

        Ok(exists)
    }

    /// Stamps `last_login` with the current time.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn record_login(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1").bind(user_id).execute(conn).await?;

        Ok(())
    }
}

fn unique_violation_message(constraint: Option<&str>) -> AppError {
    match constraint {
        Some("users_email_key") => {
            AppError::Conflict("This email is already registered. Please use a different one or log in.".into())
        }
        _ => AppError::Conflict("This username is already taken. Please choose a different one.".into()),
    }
}
