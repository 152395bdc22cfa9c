//! Diesel row models for organizations, projects and batches.

use crate::store::postgres::schema::{batches, organizations, projects};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Organization row, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = organizations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrganizationRow {
    pub id: uuid::Uuid,
    pub name: String,
    pub kind: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changed organization columns; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = organizations)]
pub struct OrganizationChangeset {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub is_active: Option<bool>,
}

/// Project row, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    pub id: uuid::Uuid,
    pub organization_id: uuid::Uuid,
    pub name: String,
    pub status: String,
    pub kind: String,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changed project columns. `metadata: Some(None)` clears the column.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = projects)]
pub struct ProjectChangeset {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub metadata: Option<Option<Value>>,
}

/// Batch row, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = batches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BatchRow {
    pub id: uuid::Uuid,
    pub project_id: uuid::Uuid,
    pub name: String,
    pub status: String,
    pub settings: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changed batch columns.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = batches)]
pub struct BatchChangeset {
    pub name: Option<String>,
    pub status: Option<String>,
    pub settings: Option<Value>,
}
