//! Embedded `PostgreSQL` cluster shared by the integration tests.
//!
//! `pg_embedded_setup_unpriv` bootstraps one cluster per test binary. When
//! the tests run as root the bootstrap delegates lifecycle calls to this
//! package's `pg_worker` binary, copied to the temporary directory behind a
//! wrapper that demotes to `nobody`.

use crate::test_helpers::EnvVarGuard;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::{Permissions, PermissionsExt};
use cap_std::fs_utf8::Dir;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster_handle;
use pg_embedded_setup_unpriv::{ClusterHandle, ExecutionPrivileges, detect_execution_privileges};
use rstest::fixture;
use std::ffi::OsString;
use std::io::Write;
use std::sync::OnceLock;

/// Boxed error used by the cluster helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared `PostgreSQL` cluster handle for integration tests.
pub type PostgresCluster = &'static ClusterHandle;

const WORKER_VAR: &str = "PG_EMBEDDED_WORKER";

static PREPARED_WORKER: OnceLock<Result<Option<Utf8PathBuf>, String>> = OnceLock::new();

/// Provides the shared cluster, starting it on first use.
///
/// # Panics
///
/// Panics when the worker cannot be prepared or the cluster cannot start,
/// which fails the calling test.
#[fixture]
pub fn postgres_cluster() -> PostgresCluster {
    let worker = PREPARED_WORKER
        .get_or_init(|| prepare_worker().map_err(|err| err.to_string()))
        .as_ref()
        .unwrap_or_else(|err| panic!("failed to prepare pg_worker: {err}"));
    let changes: Vec<_> = worker
        .iter()
        .map(|path| (OsString::from(WORKER_VAR), Some(OsString::from(path.as_str()))))
        .collect();
    let guard = EnvVarGuard::set_many(&changes);
    let cluster = shared_test_cluster_handle();
    drop(guard);
    cluster
}

/// Copies `pg_worker` somewhere `nobody` can execute it.
///
/// Returns `None` when the tests are unprivileged or a worker is already
/// configured.
fn prepare_worker() -> Result<Option<Utf8PathBuf>, BoxError> {
    if !matches!(detect_execution_privileges(), ExecutionPrivileges::Root)
        || std::env::var_os(WORKER_VAR).is_some()
    {
        return Ok(None);
    }

    let source = Utf8Path::new(env!("CARGO_BIN_EXE_pg_worker"));
    let source_name = source
        .file_name()
        .ok_or("pg_worker path has no file name")?;
    let source_dir = open_dir(source.parent().unwrap_or_else(|| Utf8Path::new(".")))?;

    let temp = Utf8PathBuf::try_from(std::env::temp_dir())?;
    let temp_dir = open_dir(&temp)?;
    let wrapper_name = format!("annotatex_pg_worker_{}", std::process::id());
    let binary_name = format!("{wrapper_name}.bin");
    source_dir.copy(source_name, &temp_dir, &binary_name)?;

    let mut wrapper = temp_dir.create(&wrapper_name)?;
    write!(
        wrapper,
        concat!(
            "#!/bin/sh\n",
            "if [ \"$(id -u)\" -eq 0 ]; then\n",
            "  exec /usr/sbin/runuser -u nobody -- {worker} \"$@\"\n",
            "fi\n",
            "exec {worker} \"$@\"\n",
        ),
        worker = temp.join(&binary_name),
    )?;
    drop(wrapper);

    for name in [&wrapper_name, &binary_name] {
        temp_dir.set_permissions(name, Permissions::from_mode(0o755))?;
    }
    Ok(Some(temp.join(wrapper_name)))
}

fn open_dir(path: &Utf8Path) -> Result<Dir, BoxError> {
    Dir::open_ambient_dir(path, ambient_authority()).map_err(|err| Box::new(err) as BoxError)
}
