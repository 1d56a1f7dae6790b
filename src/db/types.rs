use serde::Serialize;

/// A scalar read back from a catalog query.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
    Other(&'static str),
}

impl Value {
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(value) => i32::try_from(*value).ok(),
            Value::Text(value) => value.trim().parse().ok(),
            _ => None,
        }
    }
}

/// One `(referencer, referenced)` pair: the referencer must be scripted after
/// the referenced object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRow {
    pub referencer_id: i32,
    pub referenced_id: i32,
}

impl DependencyRow {
    pub fn new(referencer_id: i32, referenced_id: i32) -> Self {
        Self {
            referencer_id,
            referenced_id,
        }
    }
}

/// `SERVERPROPERTY('EngineEdition')` values the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineEdition {
    Standalone,
    SqlDatabase,
    SqlDataWarehouse,
    ManagedInstance,
    SqlOnDemand,
}

impl EngineEdition {
    pub fn from_code(code: i32) -> Self {
        match code {
            5 => EngineEdition::SqlDatabase,
            6 => EngineEdition::SqlDataWarehouse,
            8 => EngineEdition::ManagedInstance,
            11 => EngineEdition::SqlOnDemand,
            _ => EngineEdition::Standalone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub major_version: i32,
    pub edition: EngineEdition,
}

impl ServerInfo {
    pub fn new(major_version: i32, edition: EngineEdition) -> Self {
        Self {
            major_version,
            edition,
        }
    }

    /// Azure Synapse dedicated and serverless pools.
    pub fn is_sql_dw(&self) -> bool {
        matches!(
            self.edition,
            EngineEdition::SqlDataWarehouse | EngineEdition::SqlOnDemand
        )
    }

    /// Table value constructors with many rows arrived in SQL Server 2008.
    pub fn supports_multi_row_insert(&self) -> bool {
        self.major_version > 9 && !self.is_sql_dw()
    }

    /// System-versioned tables: SQL Server 2016+ and Azure SQL.
    pub fn supports_temporal(&self) -> bool {
        match self.edition {
            EngineEdition::SqlDatabase | EngineEdition::ManagedInstance => true,
            EngineEdition::Standalone => self.major_version >= 13,
            EngineEdition::SqlDataWarehouse | EngineEdition::SqlOnDemand => false,
        }
    }
}
