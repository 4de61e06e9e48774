use async_trait::async_trait;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::debug;

use crate::users::{
    error::RepoError,
    repo_types::{NewUser, User, UserId},
};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage seam for users. Every read excludes soft-deleted rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list_all(&self) -> RepoResult<Vec<User>>;
    async fn get_by_id(&self, id: UserId) -> RepoResult<User>;
    async fn insert(&self, candidate: NewUser) -> RepoResult<User>;
    /// Overwrite name and email of a live row.
    async fn update(&self, id: UserId, name: &str, email: &str) -> RepoResult<User>;
    /// Persist a whole record: id 0 inserts, anything else updates name and email.
    async fn save(&self, user: User) -> RepoResult<User>;
    async fn soft_delete(&self, id: UserId) -> RepoResult<()>;
}

/// Parse an id taken from a request path. Anything that is not a positive
/// integer cannot name a row.
pub fn parse_user_id(raw: &str) -> RepoResult<UserId> {
    match raw.trim().parse::<UserId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(RepoError::NotFound),
    }
}

const SELECT_USER: &str = r#"
    SELECT id,
           COALESCE(name, '') AS name,
           COALESCE(email, '') AS email,
           COALESCE(password, '') AS password,
           created_at, updated_at, deleted_at
    FROM users
"#;

const RETURNING_USER: &str = r#"
    RETURNING id,
              COALESCE(name, '') AS name,
              COALESCE(email, '') AS email,
              COALESCE(password, '') AS password,
              created_at, updated_at, deleted_at
"#;

#[derive(Clone)]
pub struct SqliteUserRepository {
    db: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn list_all(&self) -> RepoResult<Vec<User>> {
        let sql = format!("{SELECT_USER} WHERE deleted_at IS NULL");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.db).await?;
        Ok(users)
    }

    async fn get_by_id(&self, id: UserId) -> RepoResult<User> {
        let sql = format!("{SELECT_USER} WHERE id = ? AND deleted_at IS NULL");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(RepoError::NotFound)?;
        Ok(user)
    }

    async fn insert(&self, candidate: NewUser) -> RepoResult<User> {
        let now = OffsetDateTime::now_utc();
        let sql = format!(
            "INSERT INTO users (created_at, updated_at, name, email, password) \
             VALUES (?, ?, ?, ?, ?) {RETURNING_USER}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(now)
            .bind(now)
            .bind(&candidate.name)
            .bind(&candidate.email)
            .bind(&candidate.password)
            .fetch_one(&self.db)
            .await?;
        debug!(user_id = user.id, "user row inserted");
        Ok(user)
    }

    async fn update(&self, id: UserId, name: &str, email: &str) -> RepoResult<User> {
        let sql = format!(
            "UPDATE users SET name = ?, email = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL {RETURNING_USER}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(name)
            .bind(email)
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(RepoError::NotFound)?;
        debug!(user_id = user.id, "user row updated");
        Ok(user)
    }

    async fn save(&self, user: User) -> RepoResult<User> {
        if user.id == 0 {
            return self
                .insert(NewUser {
                    name: user.name,
                    email: user.email,
                    password: user.password,
                })
                .await;
        }
        self.update(user.id, &user.name, &user.email).await
    }

    async fn soft_delete(&self, id: UserId) -> RepoResult<()> {
        let res = sqlx::query(
            "UPDATE users SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .execute(&self.db)
        .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        debug!(user_id = id, "user row soft-deleted");
        Ok(())
    }
}
