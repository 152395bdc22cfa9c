//! Diesel row models for the identity tables.

use crate::store::postgres::schema::{auth_identities, user_portfolios, users};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// User row, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: uuid::Uuid,
    pub username: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChangeset {
    pub username: Option<String>,
    pub is_active: Option<bool>,
}

/// Authentication identity row as read back from the table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = auth_identities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuthIdentityRow {
    pub id: i64,
    pub user_id: uuid::Uuid,
    pub provider: String,
    pub subject: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub password_hash: Option<String>,
    pub password_hash_method: Option<String>,
    pub password_updated_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert model; the sequence assigns `id`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = auth_identities)]
pub struct NewAuthIdentityRow {
    pub user_id: uuid::Uuid,
    pub provider: String,
    pub subject: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub password_hash: Option<String>,
    pub password_hash_method: Option<String>,
    pub password_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changed identity columns. `email: Some(None)` clears the email.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = auth_identities)]
pub struct AuthIdentityChangeset {
    pub email: Option<Option<String>>,
    pub email_verified: Option<bool>,
    pub password_hash: Option<String>,
    pub password_hash_method: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_portfolios)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PortfolioRow {
    pub id: i64,
    pub user_id: uuid::Uuid,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_portfolios)]
pub struct NewPortfolioRow {
    pub user_id: uuid::Uuid,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
