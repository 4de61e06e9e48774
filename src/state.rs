use crate::config::AppConfig;
use crate::db;
use crate::users::repo::{SqliteUserRepository, UserRepository};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::open(&config.database_path).await?;
        let users = Arc::new(SqliteUserRepository::new(pool)) as Arc<dyn UserRepository>;

        Ok(Self::from_parts(users, Arc::new(config)))
    }

    pub fn from_parts(users: Arc<dyn UserRepository>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    #[cfg(test)]
    pub async fn in_memory(config: AppConfig) -> Self {
        let pool = db::open_in_memory().await.expect("in-memory database");
        Self::from_parts(Arc::new(SqliteUserRepository::new(pool)), Arc::new(config))
    }

    /// State whose store fails every call, for exercising datastore-error paths.
    #[cfg(test)]
    pub fn failing(config: AppConfig) -> Self {
        use crate::users::{
            error::RepoError,
            repo::RepoResult,
            repo_types::{NewUser, User, UserId},
        };
        use async_trait::async_trait;

        struct FailingStore;
        #[async_trait]
        impl UserRepository for FailingStore {
            async fn list_all(&self) -> RepoResult<Vec<User>> {
                Err(RepoError::Database(sqlx::Error::PoolClosed))
            }
            async fn get_by_id(&self, _id: UserId) -> RepoResult<User> {
                Err(RepoError::Database(sqlx::Error::PoolClosed))
            }
            async fn insert(&self, _candidate: NewUser) -> RepoResult<User> {
                Err(RepoError::Database(sqlx::Error::PoolClosed))
            }
            async fn update(&self, _id: UserId, _name: &str, _email: &str) -> RepoResult<User> {
                Err(RepoError::Database(sqlx::Error::PoolClosed))
            }
            async fn save(&self, _user: User) -> RepoResult<User> {
                Err(RepoError::Database(sqlx::Error::PoolClosed))
            }
            async fn soft_delete(&self, _id: UserId) -> RepoResult<()> {
                Err(RepoError::Database(sqlx::Error::PoolClosed))
            }
        }

        Self::from_parts(Arc::new(FailingStore), Arc::new(config))
    }
}
