use sqlx::FromRow;
use time::OffsetDateTime;

pub type UserId = i64;

/// User record in the database. A default record (id 0, empty fields) stands
/// for "nothing loaded".
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: UserId,                          // 0 until persisted
    pub name: String,
    pub email: String,                       // unique across live rows
    pub password: String,                    // stored verbatim, never exposed
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    pub deleted_at: Option<OffsetDateTime>,  // set by soft delete
}

/// Insert candidate; the datastore assigns the id and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}
