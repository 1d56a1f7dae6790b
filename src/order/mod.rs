//! Dependency ordering of scriptable objects.
//!
//! Urns are registered into ranked buckets, refined by a fixed sequence of
//! passes (some of which ask the catalog for dependencies) and flattened into
//! one sequence that can be scripted front to back.

pub mod classify;
pub mod key;
mod phases;
pub mod query;
pub mod registry;
pub mod resolver;
pub mod topo;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

pub use key::{OrderKind, OrderingKey, RANK_TABLE_VERSION};

use crate::db::CatalogAccess;
use crate::model::{EntityRepository, InCreationRegistry, PhaseTag, ScriptingOptions, Urn};
use phases::Pass;
use registry::register;
use resolver::DependencyResolver;

/// Why an input Urn has no position of its own in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FoldReason {
    /// Primary or unique key scripted with its table.
    KeyIndex,
    /// Key index of a filestream table scripted with the table's data.
    FilestreamKeyIndex,
    /// Indexes of memory-optimized tables are part of the table definition.
    MemoryOptimized,
    /// Constraint embedded in a design-mode table script.
    EmbeddedConstraint,
}

impl FoldReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FoldReason::KeyIndex => "keyIndex",
            FoldReason::FilestreamKeyIndex => "filestreamKeyIndex",
            FoldReason::MemoryOptimized => "memoryOptimized",
            FoldReason::EmbeddedConstraint => "embeddedConstraint",
        }
    }
}

/// An input Urn scripted as part of `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folded {
    pub owner: Urn,
    pub member: Urn,
    pub reason: FoldReason,
}

/// Result of one ordering run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOrder {
    /// Script positions, front to back. May contain derived phase Urns.
    pub urns: Vec<Urn>,
    pub folded: Vec<Folded>,
}

/// Orders Urns for scripting against one catalog.
pub struct Orderer<'a> {
    catalog: &'a mut dyn CatalogAccess,
    repository: &'a dyn EntityRepository,
    creating: &'a dyn InCreationRegistry,
    options: ScriptingOptions,
}

impl<'a> Orderer<'a> {
    pub fn new(
        catalog: &'a mut dyn CatalogAccess,
        repository: &'a dyn EntityRepository,
        creating: &'a dyn InCreationRegistry,
        options: ScriptingOptions,
    ) -> Self {
        Self {
            catalog,
            repository,
            creating,
            options,
        }
    }

    pub fn order(&mut self, urns: &[Urn]) -> Result<ScriptOrder> {
        self.options.validate()?;

        let registration = register(urns, !self.options.include_ddl)?;
        debug!(
            input = urns.len(),
            registered = registration.count,
            behavior = self.options.behavior.label(),
            "registered urns"
        );
        if registration.count < 2 {
            let order = self.order_single(registration.last);
            info!(count = order.urns.len(), "ordered single object");
            return Ok(order);
        }

        let resolver = DependencyResolver::new(&mut *self.catalog);
        let mut pass = Pass::new(
            registration.buckets,
            &self.options,
            self.repository,
            self.creating,
            resolver,
        );
        if self.options.include_ddl {
            pass.resolve_assemblies()?;
            pass.resolve_ddl_triggers();
            pass.resolve_security_objects()?;
            pass.add_table_data();
            pass.resolve_indexes()?;
            if self.options.is_drop() {
                pass.add_foreign_keys();
            } else {
                pass.embed_constraints();
            }
            pass.resolve_schema_bound()?;
        } else {
            pass.resolve_table_data_only()?;
        }

        let (buckets, folded) = pass.finish();
        let urns = buckets.flatten();
        info!(count = urns.len(), folded = folded.len(), "ordering complete");
        Ok(ScriptOrder { urns, folded })
    }

    /// Zero or one registered Urn needs no catalog access.
    fn order_single(&self, last: Option<(OrderKind, Urn)>) -> ScriptOrder {
        let Some((kind, urn)) = last else {
            return ScriptOrder::default();
        };
        let ddl = self.options.include_ddl;
        let urns = match kind {
            OrderKind::Table => {
                let mut urns = Vec::with_capacity(2);
                if self.options.include_data && !self.creating.contains(&urn) {
                    urns.push(urn.with_phase(PhaseTag::Data));
                }
                if ddl {
                    urns.insert(0, urn);
                }
                urns
            }
            // A principal marked `creating` never exists on the server yet, so
            // it has no memberships to script.
            OrderKind::Login | OrderKind::RoleServer if ddl => {
                let associations =
                    (!self.creating.contains(&urn)).then(|| urn.with_phase(PhaseTag::Associations));
                std::iter::once(urn).chain(associations).collect()
            }
            OrderKind::Database if ddl => {
                let read_only = urn.with_phase(PhaseTag::DatabaseReadOnly);
                vec![urn, read_only]
            }
            _ if ddl => vec![urn],
            _ => Vec::new(),
        };
        ScriptOrder {
            urns,
            folded: Vec::new(),
        }
    }
}
