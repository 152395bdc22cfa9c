//! `PostgreSQL` plumbing shared by the Diesel adapters.
//!
//! Diesel is synchronous, so every call is moved onto the blocking pool with
//! [`tokio::task::spawn_blocking`]. Driver errors are translated here and
//! never leave the adapters.

pub mod schema;

use crate::store::{ConflictReason, EntityKind, RepositoryError};
use diesel::Connection;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool shared by every adapter.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Runs `work` on a pooled connection without opening a transaction.
///
/// Suitable for single-statement reads and writes.
///
/// # Errors
///
/// Returns `Persistence` when no connection can be checked out or the
/// blocking task fails, otherwise whatever `work` returns.
pub async fn run_blocking<F, T, E>(pool: &PgPool, work: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<RepositoryError> + Send + 'static,
{
    let pool_handle = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = pool_handle
            .get()
            .map_err(|err| E::from(RepositoryError::persistence(err)))?;
        work(&mut connection)
    })
    .await
    .map_err(|err| E::from(RepositoryError::persistence(err)))?
}

/// Runs `work` inside one database transaction.
///
/// The transaction commits when `work` returns `Ok` and rolls back
/// otherwise. A failure to begin or commit is reported against `entity`;
/// a serialization failure at commit becomes
/// [`ConflictReason::Serialization`].
///
/// # Errors
///
/// Returns the error produced by `work`, or a translated store error.
pub async fn run_in_transaction<F, T, E>(pool: &PgPool, entity: EntityKind, work: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<RepositoryError> + Send + 'static,
{
    run_blocking(pool, move |connection| {
        connection
            .transaction::<T, TransactionAbort<E>, _>(|tx| work(tx).map_err(TransactionAbort::Work))
            .map_err(|abort| match abort {
                TransactionAbort::Work(err) => err,
                TransactionAbort::Driver(err) => E::from(translate_write_error(err, entity)),
            })
    })
    .await
}

/// Why a transaction closure stopped.
enum TransactionAbort<E> {
    Work(E),
    Driver(DieselError),
}

impl<E> From<DieselError> for TransactionAbort<E> {
    fn from(err: DieselError) -> Self {
        Self::Driver(err)
    }
}

/// Maps a foreign-key constraint to `(referencing, referenced)` entities.
fn foreign_key_entities(constraint: &str) -> Option<(EntityKind, EntityKind)> {
    let pair = match constraint {
        "projects_organization_id_fkey" => (EntityKind::Project, EntityKind::Organization),
        "batches_project_id_fkey" => (EntityKind::Batch, EntityKind::Project),
        "tasks_batch_id_fkey" => (EntityKind::Task, EntityKind::Batch),
        "tasks_current_owner_fkey" => (EntityKind::Task, EntityKind::User),
        "task_transitions_task_id_fkey" => (EntityKind::TaskTransition, EntityKind::Task),
        "task_transitions_actor_id_fkey" | "task_transitions_owner_fkey" => {
            (EntityKind::TaskTransition, EntityKind::User)
        }
        "auth_identities_user_id_fkey" => (EntityKind::AuthIdentity, EntityKind::User),
        "user_portfolios_user_id_fkey" => (EntityKind::Portfolio, EntityKind::User),
        _ => return None,
    };
    Some(pair)
}

fn duplicate_key(info: &dyn DatabaseErrorInformation) -> String {
    info.details()
        .or_else(|| info.constraint_name())
        .unwrap_or_else(|| info.message())
        .to_owned()
}

/// Translates an error raised by an insert or update on `entity`.
pub(crate) fn translate_write_error(err: DieselError, entity: EntityKind) -> RepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
            RepositoryError::duplicate(entity, duplicate_key(info.as_ref()))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info) => {
            let referenced = info
                .constraint_name()
                .and_then(foreign_key_entities)
                .map_or(entity, |(_, parent)| parent);
            RepositoryError::conflict(entity, ConflictReason::MissingReference(referenced))
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            RepositoryError::conflict(entity, ConflictReason::Serialization)
        }
        other => RepositoryError::persistence(other),
    }
}

/// Translates an error raised by a delete on `entity`.
pub(crate) fn translate_delete_error(err: DieselError, entity: EntityKind) -> RepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info) => {
            let dependent = info
                .constraint_name()
                .and_then(foreign_key_entities)
                .map_or(entity, |(child, _)| child);
            RepositoryError::conflict(entity, ConflictReason::HasDependents(dependent))
        }
        other => translate_write_error(other, entity),
    }
}

/// Wraps an error raised by a read.
pub(crate) fn read_error(err: DieselError) -> RepositoryError {
    RepositoryError::persistence(err)
}
