use anyhow::Result;
use tracing::{debug, warn};

use crate::config::ConnectionSettings;
use crate::db::client::{self, SqlClient};
use crate::db::connection::describe_target;
use crate::db::executor::{self, SERVER_INFO};
use crate::db::types::{DependencyRow, ServerInfo};
use crate::error::{AppError, ErrorKind};

/// Read-only access to the live catalog, as needed by the dependency resolver.
///
/// Every call is blocking. Implementations must not cache results across
/// calls; the resolver decides what to ask and when.
pub trait CatalogAccess {
    fn server_info(&mut self) -> Result<ServerInfo>;

    /// Runs one statement in `database` and returns its dependency pairs.
    fn run_query(&mut self, database: &str, statement: &str) -> Result<Vec<DependencyRow>>;

    /// Runs `statements` in order on one session in `database` and returns
    /// the dependency pairs produced by any of them.
    fn run_batched_query(
        &mut self,
        database: &str,
        statements: &[String],
    ) -> Result<Vec<DependencyRow>>;
}

/// Dropped after a failed batch so the session can run the next one.
const TEMP_TABLE_CLEANUP: &str =
    "IF OBJECT_ID('tempdb..#tempordering') IS NOT NULL DROP TABLE #tempordering";

/// Catalog backed by a tiberius connection, opened on first use.
pub struct SqlServerCatalog {
    settings: ConnectionSettings,
    runtime: tokio::runtime::Runtime,
    client: Option<SqlClient>,
}

impl SqlServerCatalog {
    pub fn new(settings: ConnectionSettings) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            settings,
            runtime,
            client: None,
        })
    }

    fn ensure_connected(&mut self) -> Result<()> {
        if self.client.is_none() {
            debug!(server = %describe_target(&self.settings), "connecting to catalog");
            let client = self.runtime.block_on(client::connect(&self.settings))?;
            self.client = Some(client);
        }
        Ok(())
    }

    fn execute(&mut self, database: &str, statements: &[&str]) -> Result<Vec<DependencyRow>> {
        self.ensure_connected()?;
        let Self {
            runtime, client, ..
        } = self;
        let client = client.as_mut().ok_or_else(not_connected)?;

        let outcome: Result<Vec<DependencyRow>> = runtime.block_on(async {
            executor::run_statement(client, &use_database(database)).await?;
            let mut rows = Vec::new();
            for statement in statements {
                rows.extend(executor::run_statement(client, statement).await?);
            }
            executor::rows_to_dependencies(rows)
        });

        if outcome.is_err() && statements.len() > 1 {
            let cleanup = runtime.block_on(executor::run_statement(client, TEMP_TABLE_CLEANUP));
            if let Err(err) = cleanup {
                warn!(error = %err, "failed to drop temporary ordering table");
            }
        }
        outcome
    }
}

impl CatalogAccess for SqlServerCatalog {
    fn server_info(&mut self) -> Result<ServerInfo> {
        self.ensure_connected()?;
        let Self {
            runtime, client, ..
        } = self;
        let client = client.as_mut().ok_or_else(not_connected)?;
        let rows = runtime.block_on(executor::run_statement(client, SERVER_INFO))?;
        let info = executor::rows_to_server_info(&rows)?;
        debug!(major = info.major_version, edition = ?info.edition, "server info");
        Ok(info)
    }

    fn run_query(&mut self, database: &str, statement: &str) -> Result<Vec<DependencyRow>> {
        self.execute(database, &[statement])
    }

    fn run_batched_query(
        &mut self,
        database: &str,
        statements: &[String],
    ) -> Result<Vec<DependencyRow>> {
        let statements: Vec<&str> = statements.iter().map(String::as_str).collect();
        self.execute(database, &statements)
    }
}

fn not_connected() -> AppError {
    AppError::new(ErrorKind::Connection, "Not connected")
}

fn use_database(database: &str) -> String {
    format!("USE [{}]", database.replace(']', "]]"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_database_names() {
        assert_eq!(use_database("sales"), "USE [sales]");
        assert_eq!(use_database("odd]name"), "USE [odd]]name]");
    }
}
