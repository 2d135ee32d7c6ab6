//! PostgreSQL backend built on `pg_dump`

use super::DumpConverter;
use crate::dump::DumpJob;
use crate::error::DbdumpResult;
use crate::process::quote;
use crate::template;

/// Default dump executable
pub const PG_DUMP: &str = "/usr/bin/pg_dump";

/// Default connection URL pattern
pub const CONNECTION_STRING_PATTERN: &str =
    "postgresql://{{username}}:{{password}}@{{host}}:{{port}}/{{database}}";

const DEFAULT_PORT: &str = "5432";

/// Dumps PostgreSQL databases as tar archives
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresConverter;

impl PostgresConverter {
    /// The `--dbname` value for a job
    ///
    /// The `connection_string` option is used verbatim; otherwise the
    /// configured or default pattern is filled from the connection attributes.
    pub fn connection_string(&self, job: &DumpJob) -> DbdumpResult<String> {
        if let Some(conn) = job.options.connection_string.as_deref() {
            if !conn.is_empty() {
                return Ok(conn.to_string());
            }
        }

        let pattern = job
            .options
            .connection_string_pattern
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(CONNECTION_STRING_PATTERN);

        let port = if job.db.port.is_empty() {
            DEFAULT_PORT
        } else {
            job.db.port.as_str()
        };

        template::render(
            pattern,
            &[
                ("username", &job.db.user),
                ("password", &job.db.password),
                ("host", &job.db.host),
                ("port", port),
                ("database", &job.db.name),
            ],
        )
    }
}

impl DumpConverter for PostgresConverter {
    fn extension(&self) -> &'static str {
        ".tar"
    }

    fn build_command(&self, job: &DumpJob) -> DbdumpResult<String> {
        let cmd = job
            .options
            .command
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(PG_DUMP);
        let dbname = self.connection_string(job)?;
        let out_file = job.filepath.to_string_lossy();
        let extra = job.options.extra.as_deref().unwrap_or("");

        let command = format!(
            "{} -C -c -b --dbname={} -f {} --format=t {}",
            cmd,
            quote(&dbname),
            quote(&out_file),
            extra
        );

        Ok(command.trim_end().to_string())
    }

    fn create_sql(&self, job: &DumpJob) -> String {
        format!(
            "CREATE USER {user} WITH PASSWORD '{password}';\n\
             CREATE DATABASE {database} ENCODING '{encoding}' OWNER {user};\n\
             GRANT ALL PRIVILEGES ON DATABASE {database} TO {user};",
            user = job.db.user,
            password = job.db.password,
            database = job.db.name,
            encoding = "utf8",
        )
    }
}
