use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::config::ConnectionSettings;
use crate::db::connection::build_config;
use crate::error::{AppError, ErrorKind};

pub type SqlClient = tiberius::Client<Compat<TcpStream>>;

/// Connect to SQL Server using resolved settings.
///
/// # Errors
///
/// Returns a `Connection` error if DNS resolution, TCP connect, or login
/// fails, or if the configured timeout elapses during either step. Invalid
/// settings are reported as `Config` errors.
pub async fn connect(settings: &ConnectionSettings) -> Result<SqlClient> {
    let config =
        build_config(settings).map_err(|err| AppError::new(ErrorKind::Config, err.to_string()))?;
    let limit = (settings.timeout_ms > 0).then(|| Duration::from_millis(settings.timeout_ms));

    let tcp = bounded(limit, "Connection", settings.timeout_ms, TcpStream::connect(config.get_addr()))
        .await?;
    tcp.set_nodelay(true)?;
    let client = bounded(
        limit,
        "Login",
        settings.timeout_ms,
        tiberius::Client::connect(config, tcp.compat_write()),
    )
    .await?;
    Ok(client)
}

async fn bounded<T, E, F>(limit: Option<Duration>, step: &str, timeout_ms: u64, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let outcome = match limit {
        Some(duration) => timeout(duration, fut).await.map_err(|_| {
            AppError::new(
                ErrorKind::Connection,
                format!("{} timed out after {} ms", step, timeout_ms),
            )
        })?,
        None => fut.await,
    };
    outcome.map_err(|err| AppError::new(ErrorKind::Connection, err.to_string()).into())
}
