#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::OsStr;

use anyhow::Result;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use sqlorder::db::{CatalogAccess, DependencyRow, EngineEdition, ServerInfo};
use sqlorder::error::{AppError, ErrorKind};
use sqlorder::model::{EntityMetadata, Urn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Query { database: String, statement: String },
    Batch { database: String, statements: Vec<String> },
}

/// In-memory catalog: every query returns the same canned rows, and the
/// orderer drops whatever falls outside the set it asked about.
pub struct MockCatalog {
    pub info: ServerInfo,
    pub rows: Vec<DependencyRow>,
    pub calls: Vec<Call>,
    pub server_info_calls: usize,
    pub fail_queries: bool,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    pub fn with_rows(rows: Vec<DependencyRow>) -> Self {
        Self {
            info: ServerInfo::new(16, EngineEdition::Standalone),
            rows,
            calls: Vec::new(),
            server_info_calls: 0,
            fail_queries: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_queries: true,
            ..Self::new()
        }
    }

    pub fn batches(&self) -> Vec<&Vec<String>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Batch { statements, .. } => Some(statements),
                Call::Query { .. } => None,
            })
            .collect()
    }

    fn answer(&self) -> Result<Vec<DependencyRow>> {
        if self.fail_queries {
            return Err(AppError::new(ErrorKind::Query, "Invalid object name 'sys.tables'").into());
        }
        Ok(self.rows.clone())
    }
}

impl CatalogAccess for MockCatalog {
    fn server_info(&mut self) -> Result<ServerInfo> {
        self.server_info_calls += 1;
        Ok(self.info)
    }

    fn run_query(&mut self, database: &str, statement: &str) -> Result<Vec<DependencyRow>> {
        self.calls.push(Call::Query {
            database: database.to_string(),
            statement: statement.to_string(),
        });
        self.answer()
    }

    fn run_batched_query(
        &mut self,
        database: &str,
        statements: &[String],
    ) -> Result<Vec<DependencyRow>> {
        self.calls.push(Call::Batch {
            database: database.to_string(),
            statements: statements.to_vec(),
        });
        self.answer()
    }
}

pub fn database(name: &str) -> Urn {
    Urn::root("Server", "srv").child("Database", name)
}

pub fn table(name: &str) -> Urn {
    database("sales")
        .child("Table", name)
        .with_attribute("Schema", "dbo")
}

pub fn in_db(type_name: &str, name: &str) -> Urn {
    database("sales").child(type_name, name)
}

pub fn with_id(id: i32) -> EntityMetadata {
    EntityMetadata {
        id: Some(id),
        ..EntityMetadata::default()
    }
}

pub fn repository(entries: &[(&Urn, EntityMetadata)]) -> HashMap<Urn, EntityMetadata> {
    entries
        .iter()
        .map(|(urn, meta)| ((*urn).clone(), meta.clone()))
        .collect()
}

pub fn position(order: &[Urn], urn: &Urn) -> usize {
    order
        .iter()
        .position(|candidate| candidate == urn)
        .unwrap_or_else(|| panic!("{} missing from order", urn))
}

pub fn run_json<I, S>(args: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = cargo_bin_cmd!("sqlorder");
    cmd.args(args);
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("json")
}
