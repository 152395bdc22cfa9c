//! Runs one embedded `PostgreSQL` lifecycle step on behalf of the test
//! harness.
//!
//! ```text
//! pg_worker <setup|start|stop> <payload.json>
//! ```
//!
//! `PostgreSQL` refuses to run as the superuser, so when the integration
//! tests execute as root the cluster bootstrap delegates to this binary.
//! The payload is a `pg_embedded_setup_unpriv` worker payload: cluster
//! settings plus environment overrides. A root caller is demoted to
//! `nobody` before the cluster is touched.

#[cfg(unix)]
mod worker {
    use camino::{Utf8Path, Utf8PathBuf};
    use nix::unistd::{Uid, User, initgroups, setgid, setuid};
    use pg_embedded_setup_unpriv::ambient_dir_and_path;
    use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
    use postgresql_embedded::{PostgreSQL, Status};
    use std::ffi::{CString, OsString};
    use std::io::Read;
    use std::mem::ManuallyDrop;
    use thiserror::Error;

    const UNPRIVILEGED_USER: &str = "nobody";

    /// Failures reported by the worker.
    #[derive(Debug, Error)]
    pub enum WorkerError {
        /// The command line is malformed.
        #[error("usage: pg_worker <setup|start|stop> <payload.json>: {0}")]
        Usage(String),

        /// The payload could not be read or decoded.
        #[error("invalid payload {path}: {message}")]
        Payload {
            /// Path given on the command line.
            path: Utf8PathBuf,
            /// Underlying failure.
            message: String,
        },

        /// Switching to the unprivileged user failed.
        #[error("failed to drop privileges: {0}")]
        PrivilegeDrop(String),

        /// The async runtime could not be built.
        #[error("failed to build runtime: {0}")]
        Runtime(#[source] std::io::Error),

        /// `PostgreSQL` rejected the lifecycle call.
        #[error("postgres {operation} failed: {message}")]
        Postgres {
            /// Lifecycle step that failed.
            operation: &'static str,
            /// Underlying failure.
            message: String,
        },
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Operation {
        Setup,
        Start,
        Stop,
    }

    impl Operation {
        fn parse(raw: &str) -> Result<Self, WorkerError> {
            match raw {
                "setup" => Ok(Self::Setup),
                "start" => Ok(Self::Start),
                "stop" => Ok(Self::Stop),
                other => Err(WorkerError::Usage(format!("unknown operation '{other}'"))),
            }
        }

        const fn label(self) -> &'static str {
            match self {
                Self::Setup => "setup",
                Self::Start => "start",
                Self::Stop => "stop",
            }
        }
    }

    /// Executes the lifecycle step named by `args` (program name excluded).
    pub fn run(args: impl IntoIterator<Item = OsString>) -> Result<(), WorkerError> {
        let (operation, payload_path) = parse_args(args)?;
        let payload = load_payload(&payload_path)?;
        drop_privileges()?;
        let settings =
            payload
                .settings
                .into_settings()
                .map_err(|err| WorkerError::Payload {
                    path: payload_path.clone(),
                    message: err.to_string(),
                })?;
        apply_environment(&payload.environment);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(WorkerError::Runtime)?;
        let mut postgres = PostgreSQL::new(settings);
        runtime.block_on(execute(operation, &mut postgres))?;
        if operation == Operation::Start {
            // The server has to outlive this process.
            let _running = ManuallyDrop::new(postgres);
        }
        Ok(())
    }

    fn parse_args(
        args: impl IntoIterator<Item = OsString>,
    ) -> Result<(Operation, Utf8PathBuf), WorkerError> {
        let mut values = args.into_iter().map(|arg| {
            arg.into_string()
                .map_err(|_| WorkerError::Usage("arguments must be valid UTF-8".to_owned()))
        });
        let operation = values
            .next()
            .ok_or_else(|| WorkerError::Usage("missing operation".to_owned()))??;
        let payload_path = values
            .next()
            .ok_or_else(|| WorkerError::Usage("missing payload path".to_owned()))??;
        if let Some(extra) = values.next() {
            let unexpected = extra?;
            return Err(WorkerError::Usage(format!(
                "unexpected argument '{unexpected}'"
            )));
        }
        Ok((
            Operation::parse(&operation)?,
            Utf8PathBuf::from(payload_path),
        ))
    }

    fn load_payload(path: &Utf8Path) -> Result<WorkerPayload, WorkerError> {
        let invalid = |message: String| WorkerError::Payload {
            path: path.to_path_buf(),
            message,
        };
        let (dir, relative) = ambient_dir_and_path(path).map_err(|err| invalid(err.to_string()))?;
        let mut bytes = Vec::new();
        dir.open(relative.as_std_path())
            .and_then(|mut file| file.read_to_end(&mut bytes))
            .map_err(|err| invalid(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| invalid(err.to_string()))
    }

    fn drop_privileges() -> Result<(), WorkerError> {
        if !Uid::effective().is_root() {
            return Ok(());
        }
        let user = User::from_name(UNPRIVILEGED_USER)
            .map_err(privilege_error)?
            .ok_or_else(|| {
                WorkerError::PrivilegeDrop(format!("user '{UNPRIVILEGED_USER}' not found"))
            })?;
        let user_name = CString::new(user.name.as_str())
            .map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?;
        initgroups(&user_name, user.gid).map_err(privilege_error)?;
        setgid(user.gid).map_err(privilege_error)?;
        setuid(user.uid).map_err(privilege_error)?;

        // SAFETY: called before the runtime starts, while the process is
        // single-threaded.
        unsafe {
            std::env::set_var("HOME", &user.dir);
            std::env::set_var("USER", &user.name);
            std::env::set_var("LOGNAME", &user.name);
        }
        Ok(())
    }

    fn privilege_error(err: nix::Error) -> WorkerError {
        WorkerError::PrivilegeDrop(err.to_string())
    }

    fn apply_environment(environment: &[(String, Option<PlainSecret>)]) {
        for (key, value) in environment {
            // SAFETY: called before the runtime starts, while the process is
            // single-threaded.
            unsafe {
                match value {
                    Some(secret) => std::env::set_var(key, secret.expose()),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

    async fn execute(operation: Operation, postgres: &mut PostgreSQL) -> Result<(), WorkerError> {
        let failed = |err: postgresql_embedded::Error| WorkerError::Postgres {
            operation: operation.label(),
            message: err.to_string(),
        };
        match operation {
            Operation::Setup => {
                postgres.setup().await.map_err(failed)?;
                ensure_started(postgres).await.map_err(failed)
            }
            Operation::Start => ensure_started(postgres).await.map_err(failed),
            Operation::Stop => postgres.stop().await.map_err(failed),
        }
    }

    async fn ensure_started(postgres: &mut PostgreSQL) -> Result<(), postgresql_embedded::Error> {
        if matches!(postgres.status(), Status::Started) {
            return Ok(());
        }
        postgres.start().await
    }
}

#[cfg(unix)]
fn main() -> Result<(), worker::WorkerError> {
    worker::run(std::env::args_os().skip(1))
}

#[cfg(not(unix))]
fn main() -> Result<(), String> {
    Err("pg_worker requires a Unix host".to_owned())
}
