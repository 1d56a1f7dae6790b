use std::collections::HashMap;

use anyhow::Result;
use indexmap::IndexMap;
use tracing::{debug, warn};

use super::classify::object_id;
use super::query::{DependencyQuery, TempTableBatch, assembly_references, role_owners};
use super::topo::{self, Cycle};
use crate::db::{CatalogAccess, DependencyRow, ServerInfo};
use crate::error::{AppError, ErrorKind};
use crate::model::{EntityRepository, Urn};

/// Groups of entities whose relative order comes from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyFamily {
    /// Assemblies referencing other assemblies.
    Assemblies,
    /// Routines, views and tables, including temporal current/history pairs.
    SchemaBound,
    /// Tables ordered by foreign keys, for data-only scripts.
    TableData,
    /// Database roles owned by other database roles.
    RoleOwnership,
}

/// Orders persisted entities by querying the catalog.
///
/// Server capabilities are fetched at most once per resolver, and only when a
/// query actually needs them.
pub struct DependencyResolver<'c> {
    catalog: &'c mut dyn CatalogAccess,
    server: Option<ServerInfo>,
}

impl<'c> DependencyResolver<'c> {
    pub fn new(catalog: &'c mut dyn CatalogAccess) -> Self {
        Self {
            catalog,
            server: None,
        }
    }

    pub fn server_info(&mut self) -> Result<ServerInfo> {
        if let Some(info) = self.server {
            return Ok(info);
        }
        let info = self.catalog.server_info()?;
        self.server = Some(info);
        Ok(info)
    }

    /// Returns `urns` reordered so every entity follows what it depends on.
    ///
    /// Entities are grouped by database (groups keep first-seen order) and
    /// each group with more than one member is sorted on its own.
    pub fn resolve(
        &mut self,
        family: DependencyFamily,
        urns: &[Urn],
        repository: &dyn EntityRepository,
    ) -> Result<Vec<Urn>> {
        let mut groups: IndexMap<Urn, Vec<Urn>> = IndexMap::new();
        for urn in urns {
            let database = urn.ancestor("Database").ok_or_else(|| {
                AppError::config(format!("{} is not inside a database", urn))
            })?;
            groups.entry(database).or_default().push(urn.clone());
        }

        let mut ordered = Vec::with_capacity(urns.len());
        for (database, members) in groups {
            if members.len() < 2 {
                ordered.extend(members);
                continue;
            }
            ordered.extend(self.resolve_group(family, &database, &members, repository)?);
        }
        Ok(ordered)
    }

    fn resolve_group(
        &mut self,
        family: DependencyFamily,
        database: &Urn,
        members: &[Urn],
        repository: &dyn EntityRepository,
    ) -> Result<Vec<Urn>> {
        let name = database
            .name()
            .ok_or_else(|| AppError::config(format!("Database without a name: {}", database)))?;

        let mut ids = Vec::with_capacity(members.len());
        let mut by_id: HashMap<i32, Urn> = HashMap::with_capacity(members.len());
        for urn in members {
            let id = object_id(repository, urn)?;
            if let Some(previous) = by_id.insert(id, urn.clone()) {
                return Err(AppError::config(format!(
                    "Catalog id {} is shared by {} and {}",
                    id, previous, urn
                ))
                .into());
            }
            ids.push(id);
        }

        let rows = match family {
            DependencyFamily::Assemblies => {
                debug!(database = name, count = ids.len(), "querying assembly references");
                self.catalog.run_query(name, &assembly_references(&ids))?
            }
            DependencyFamily::RoleOwnership => {
                debug!(database = name, count = ids.len(), "querying role owners");
                self.catalog.run_query(name, &role_owners(&ids))?
            }
            DependencyFamily::SchemaBound | DependencyFamily::TableData => {
                let info = self.server_info()?;
                let query = if family == DependencyFamily::TableData {
                    DependencyQuery::table_data(&info)
                } else {
                    DependencyQuery::schema_bound(&info)
                };
                let batch = TempTableBatch::build(&ids, query, &info);
                debug!(
                    database = name,
                    count = ids.len(),
                    statements = batch.len(),
                    ?query,
                    "running dependency batch"
                );
                self.catalog.run_batched_query(name, &batch)?
            }
        };

        sort_rows(&ids, &by_id, &rows)
    }
}

/// Topologically sorts `ids` using catalog rows as edges and maps the result
/// back to Urns.
///
/// Self references and rows naming an id outside `ids` are dropped.
pub fn sort_rows(
    ids: &[i32],
    by_id: &HashMap<i32, Urn>,
    rows: &[DependencyRow],
) -> Result<Vec<Urn>> {
    let mut graph: IndexMap<i32, Vec<i32>> = ids.iter().map(|id| (*id, Vec::new())).collect();
    for row in rows {
        if row.referencer_id == row.referenced_id {
            debug!(id = row.referencer_id, "ignoring self reference");
            continue;
        }
        if !graph.contains_key(&row.referenced_id) {
            warn!(
                referencer = row.referencer_id,
                referenced = row.referenced_id,
                "ignoring dependency on an object outside the candidate set"
            );
            continue;
        }
        match graph.get_mut(&row.referencer_id) {
            Some(deps) => deps.push(row.referenced_id),
            None => warn!(
                referencer = row.referencer_id,
                referenced = row.referenced_id,
                "ignoring dependency from an object outside the candidate set"
            ),
        }
    }

    let order = topo::sort(&graph).map_err(|cycle| {
        let path = Cycle {
            path: cycle
                .path
                .iter()
                .filter_map(|id| by_id.get(id).cloned())
                .collect::<Vec<Urn>>(),
        };
        AppError::new(
            ErrorKind::Cycle,
            format!("Ordering cycle detected: {}", path),
        )
    })?;

    Ok(order
        .into_iter()
        .filter_map(|id| by_id.get(&id).cloned())
        .collect())
}
