use crate::domain::errors::AppError;
use crate::domain::mode::OperatingMode;
use crate::domain::ports::UserRepository;
use crate::domain::user::{Role, TwoFactorState, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use std::str::FromStr;

fn mode_to_str(mode: OperatingMode) -> &'static str {
    match mode {
        OperatingMode::LearningOnly => "learning_only",
        OperatingMode::Assisted => "assisted",
        OperatingMode::Autopilot => "autopilot",
    }
}

fn mode_from_str(s: &str) -> OperatingMode {
    match s {
        "assisted" => OperatingMode::Assisted,
        "autopilot" => OperatingMode::Autopilot,
        _ => OperatingMode::LearningOnly,
    }
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: SqliteRow) -> Result<User, AppError> {
    let role_str: String = row.try_get("role").map_err(map_err)?;
    let role = if role_str == "admin" { Role::Admin } else { Role::User };
    let created_at: String = row.try_get("created_at").map_err(map_err)?;
    let mode_str: String = row.try_get("mode").map_err(map_err)?;
    Ok(User {
        id: row.try_get("id").map_err(map_err)?,
        email: row.try_get("email").map_err(map_err)?,
        username: row.try_get("username").map_err(map_err)?,
        password_hash: row.try_get("password_hash").map_err(map_err)?,
        role,
        two_factor: TwoFactorState {
            enabled: row.try_get("two_factor_enabled").map_err(map_err)?,
            totp_secret_base32: row.try_get("totp_secret_base32").map_err(map_err)?,
        },
        mode: mode_from_str(&mode_str),
        created_at: DateTime::<Utc>::from_str(&created_at)
            .map_err(|e| AppError::internal(format!("corrupt created_at timestamp: {e}")))?,
    })
}

fn map_err(e: sqlx::Error) -> AppError {
    AppError::internal(format!("persistence error: {e}"))
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let role = if user.is_admin() { "admin" } else { "user" };
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, password_hash, role, two_factor_enabled, totp_secret_base32, mode, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(role)
        .bind(user.two_factor.enabled)
        .bind(&user.two_factor.totp_secret_base32)
        .bind(mode_to_str(user.mode))
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(row_to_user).transpose()
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let role = if user.is_admin() { "admin" } else { "user" };
        sqlx::query(
            r#"
            UPDATE users SET
                email = ?, username = ?, password_hash = ?, role = ?,
                two_factor_enabled = ?, totp_secret_base32 = ?, mode = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(role)
        .bind(user.two_factor.enabled)
        .bind(&user.two_factor.totp_secret_base32)
        .bind(mode_to_str(user.mode))
        .bind(&user.id)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            r#"
            CREATE TABLE users (
                id TEXT PRIMARY KEY, email TEXT NOT NULL UNIQUE, username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL, role TEXT NOT NULL,
                two_factor_enabled BOOLEAN NOT NULL DEFAULT 0, totp_secret_base32 TEXT,
                mode TEXT NOT NULL DEFAULT 'learning_only',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    fn sample_user() -> User {
        User {
            id: "u1".into(),
            email: "a@b.com".into(),
            username: "alice".into(),
            password_hash: "hash".into(),
            role: Role::User,
            two_factor: TwoFactorState::default(),
            mode: OperatingMode::LearningOnly,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn inserts_and_finds_by_email() {
        let repo = SqliteUserRepository::new(pool().await);
        repo.insert(&sample_user()).await.unwrap();
        let found = repo.find_by_email("a@b.com").await.unwrap();
        assert_eq!(found.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn missing_user_returns_none() {
        let repo = SqliteUserRepository::new(pool().await);
        assert!(repo.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_persists_changes() {
        let repo = SqliteUserRepository::new(pool().await);
        let mut user = sample_user();
        repo.insert(&user).await.unwrap();
        user.username = "alice2".into();
        repo.update(&user).await.unwrap();
        let found = repo.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(found.username, "alice2");
    }
}
