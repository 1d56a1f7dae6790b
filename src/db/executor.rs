use anyhow::Result;
use tracing::warn;

use crate::db::client::SqlClient;
use crate::db::types::{DependencyRow, EngineEdition, ServerInfo, Value};
use crate::error::{AppError, ErrorKind};

/// `@@MICROSOFTVERSION` carries the major version in its top byte and exists
/// on every supported server, unlike `SERVERPROPERTY('ProductMajorVersion')`.
pub const SERVER_INFO: &str = "SELECT CAST(@@MICROSOFTVERSION / 0x01000000 AS int) AS major_version, \
CAST(SERVERPROPERTY('EngineEdition') AS int) AS engine_edition";

/// Runs one statement and returns the rows of every result set it produced.
pub async fn run_statement(client: &mut SqlClient, sql: &str) -> Result<Vec<Vec<Value>>> {
    let stream = client
        .simple_query(sql)
        .await
        .map_err(|err| AppError::new(ErrorKind::Query, err.to_string()))?;
    let result_sets = stream
        .into_results()
        .await
        .map_err(|err| AppError::new(ErrorKind::Query, err.to_string()))?;

    let mut rows = Vec::new();
    for set in result_sets {
        for row in set {
            rows.push(row.cells().map(|(_, data)| map_column_data(data)).collect());
        }
    }
    Ok(rows)
}

fn map_column_data(data: &tiberius::ColumnData<'_>) -> Value {
    use tiberius::ColumnData::*;
    match data {
        U8(value) => value.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null),
        I16(value) => value.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null),
        I32(value) => value.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null),
        I64(value) => value.map(Value::Int).unwrap_or(Value::Null),
        String(value) => value
            .as_ref()
            .map(|v| Value::Text(v.to_string()))
            .unwrap_or(Value::Null),
        Numeric(value) => value
            .as_ref()
            .map(|v| Value::Text(v.to_string()))
            .unwrap_or(Value::Null),
        F32(_) => Value::Other("real"),
        F64(_) => Value::Other("float"),
        Bit(_) => Value::Other("bit"),
        Guid(_) => Value::Other("uniqueidentifier"),
        Binary(_) => Value::Other("binary"),
        Xml(_) => Value::Other("xml"),
        _ => Value::Other("temporal"),
    }
}

/// Reads `(referencer, referenced)` pairs from the first two columns.
///
/// Rows with a NULL endpoint (dangling `sysdepends` entries) carry no edge
/// and are skipped; any other shape is a query error.
pub fn rows_to_dependencies(rows: Vec<Vec<Value>>) -> Result<Vec<DependencyRow>> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() < 2 {
            return Err(AppError::new(
                ErrorKind::Query,
                format!("Dependency query returned {} column(s), expected 2", row.len()),
            )
            .into());
        }
        if row[0] == Value::Null || row[1] == Value::Null {
            warn!("skipping dependency row with a NULL id");
            continue;
        }
        match (row[0].as_i32(), row[1].as_i32()) {
            (Some(referencer), Some(referenced)) => {
                out.push(DependencyRow::new(referencer, referenced))
            }
            _ => {
                return Err(AppError::new(
                    ErrorKind::Query,
                    format!("Dependency query returned non-integer ids: {:?}", row),
                )
                .into());
            }
        }
    }
    Ok(out)
}

pub fn rows_to_server_info(rows: &[Vec<Value>]) -> Result<ServerInfo> {
    let row = rows.first().ok_or_else(|| {
        AppError::new(ErrorKind::Query, "Server info query returned no rows")
    })?;
    let major = row.first().and_then(Value::as_i32).ok_or_else(|| {
        AppError::new(ErrorKind::Query, "Server info query returned no major version")
    })?;
    let edition = row
        .get(1)
        .and_then(Value::as_i32)
        .map(EngineEdition::from_code)
        .unwrap_or(EngineEdition::Standalone);
    Ok(ServerInfo::new(major, edition))
}
