use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::urn::Urn;

/// A foreign key owned by a table, as known to the entity repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForeignKeyRef {
    pub urn: Urn,
    /// Keys generated by a FileTable definition are scripted with the table.
    #[serde(default)]
    pub file_table_defined: bool,
}

/// Properties of one entity that influence its position in a script.
///
/// Sub-kind values stay as text here; the classifier parses them and turns
/// unknown values into configuration errors that name the entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntityMetadata {
    /// Catalog object id (or assembly id), scoped to the owning database.
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub index_type: Option<String>,
    #[serde(default)]
    pub index_key_type: Option<String>,
    #[serde(default)]
    pub memory_optimized: bool,
    #[serde(default)]
    pub login_type: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub function_type: Option<String>,
    #[serde(default)]
    pub schema_bound: bool,
    #[serde(default)]
    pub filestream: bool,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyRef>,
}

/// Lookup of entity metadata by identifier.
pub trait EntityRepository {
    fn resolve(&self, urn: &Urn) -> Option<&EntityMetadata>;
}

/// Identifiers that exist only in memory and have no catalog counterpart yet.
pub trait InCreationRegistry {
    fn contains(&self, urn: &Urn) -> bool;
}

impl EntityRepository for HashMap<Urn, EntityMetadata> {
    fn resolve(&self, urn: &Urn) -> Option<&EntityMetadata> {
        self.get(urn)
    }
}

impl InCreationRegistry for HashSet<Urn> {
    fn contains(&self, urn: &Urn) -> bool {
        HashSet::contains(self, urn)
    }
}

/// Registry for callers that never script in-memory entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct NothingInCreation;

impl InCreationRegistry for NothingInCreation {
    fn contains(&self, _urn: &Urn) -> bool {
        false
    }
}
