use std::collections::HashSet;

use anyhow::Result;
use tracing::debug;

use super::classify::{
    function_type, index_info, is_filestream_table, is_schema_bound, login_is_key_backed,
    user_is_key_backed,
};
use super::key::OrderKind;
use super::registry::Buckets;
use super::resolver::{DependencyFamily, DependencyResolver};
use super::{FoldReason, Folded};
use crate::error::AppError;
use crate::model::{
    EntityRepository, FunctionType, InCreationRegistry, IndexType, PhaseTag, ScriptBehavior,
    ScriptingOptions, Urn,
};

/// Kinds whose base entries become `Object` phases once any security phase
/// has been emitted.
const OBJECT_PHASE_KINDS: &[OrderKind] = &[
    OrderKind::Database,
    OrderKind::Login,
    OrderKind::MasterAssembly,
    OrderKind::MasterCertificate,
    OrderKind::MasterAsymmetricKey,
    OrderKind::CertificateKeyLogin,
    OrderKind::RoleServer,
    OrderKind::ApplicationRole,
    OrderKind::User,
    OrderKind::UserAssembly,
    OrderKind::UserCertificate,
    OrderKind::UserAsymmetricKey,
    OrderKind::CertificateKeyUser,
    OrderKind::RoleDatabase,
];

const MASTER_SECURABLES: &[OrderKind] = &[
    OrderKind::MasterAssembly,
    OrderKind::MasterCertificate,
    OrderKind::MasterAsymmetricKey,
];

const USER_SECURABLES: &[OrderKind] = &[
    OrderKind::UserAssembly,
    OrderKind::UserCertificate,
    OrderKind::UserAsymmetricKey,
];

/// One ordering run over registered buckets.
///
/// Each method is a pass that moves, splits or derives entries between
/// buckets. Passes run in a fixed sequence driven by the orderer.
pub(crate) struct Pass<'a, 'c> {
    buckets: Buckets,
    folded: Vec<Folded>,
    options: &'a ScriptingOptions,
    repository: &'a dyn EntityRepository,
    creating: &'a dyn InCreationRegistry,
    resolver: DependencyResolver<'c>,
}

impl<'a, 'c> Pass<'a, 'c> {
    pub fn new(
        buckets: Buckets,
        options: &'a ScriptingOptions,
        repository: &'a dyn EntityRepository,
        creating: &'a dyn InCreationRegistry,
        resolver: DependencyResolver<'c>,
    ) -> Self {
        Self {
            buckets,
            folded: Vec::new(),
            options,
            repository,
            creating,
            resolver,
        }
    }

    pub fn finish(self) -> (Buckets, Vec<Folded>) {
        (self.buckets, self.folded)
    }

    fn partition_creating(&self, urns: Vec<Urn>) -> (Vec<Urn>, Vec<Urn>) {
        urns.into_iter().partition(|urn| self.creating.contains(urn))
    }

    /// Rewrites every entry of `kind` to its `phase` form.
    fn mark(&mut self, kind: OrderKind, phase: PhaseTag) {
        let urns = self.buckets.take(kind);
        self.buckets
            .insert(kind, urns.iter().map(|urn| urn.with_phase(phase)).collect());
    }

    fn fold(&mut self, owner: Urn, member: Urn, reason: FoldReason) {
        debug!(%member, ?reason, "folded into owner");
        self.folded.push(Folded {
            owner,
            member,
            reason,
        });
    }

    /// Persisted assemblies follow the assemblies they reference; assemblies
    /// being created come after them.
    pub fn resolve_assemblies(&mut self) -> Result<()> {
        if self.buckets.len_of(OrderKind::SqlAssembly) < 2 {
            return Ok(());
        }
        let all = self.buckets.take(OrderKind::SqlAssembly);
        let (creating, persisted) = self.partition_creating(all);
        debug!(persisted = persisted.len(), creating = creating.len(), "ordering assemblies");
        let mut ordered =
            self.resolver
                .resolve(DependencyFamily::Assemblies, &persisted, self.repository)?;
        ordered.extend(creating);
        self.buckets.insert(OrderKind::SqlAssembly, ordered);
        Ok(())
    }

    pub fn resolve_ddl_triggers(&mut self) {
        let levels = [
            (
                OrderKind::DdlTriggerServer,
                OrderKind::DdlTriggerServerEnable,
                PhaseTag::ServerDdlTriggerEnable,
                OrderKind::DdlTriggerServerDisable,
                PhaseTag::ServerDdlTriggerDisable,
            ),
            (
                OrderKind::DdlTriggerDatabase,
                OrderKind::DdlTriggerDatabaseEnable,
                PhaseTag::DatabaseDdlTriggerEnable,
                OrderKind::DdlTriggerDatabaseDisable,
                PhaseTag::DatabaseDdlTriggerDisable,
            ),
        ];
        for (base, enable, enable_phase, disable, disable_phase) in levels {
            let triggers = match self.buckets.get(base) {
                Some(triggers) if triggers.len() > 1 => triggers.to_vec(),
                _ => continue,
            };
            debug!(kind = base.name(), count = triggers.len(), "splitting ddl triggers");
            if self.options.behavior.contains(ScriptBehavior::CREATE) {
                self.buckets.insert(
                    enable,
                    triggers.iter().map(|t| t.with_phase(enable_phase)).collect(),
                );
            }
            if self.options.behavior.contains(ScriptBehavior::DROP) {
                self.buckets.insert(
                    disable,
                    triggers.iter().map(|t| t.with_phase(disable_phase)).collect(),
                );
            }
            self.mark(base, PhaseTag::Object);
        }
    }

    pub fn resolve_security_objects(&mut self) -> Result<()> {
        self.resolve_role_owners()?;
        self.split_key_backed_logins()?;
        self.split_key_backed_users()?;

        if self.options.is_drop() {
            return Ok(());
        }

        let mut emitted = self.derive(
            OrderKind::ServerAssociation,
            &[
                OrderKind::Login,
                OrderKind::CertificateKeyLogin,
                OrderKind::RoleServer,
            ],
            PhaseTag::Associations,
        );
        emitted |= self.derive(
            OrderKind::DatabaseReadOnly,
            &[OrderKind::Database],
            PhaseTag::DatabaseReadOnly,
        );
        if self.options.include_associations {
            emitted |= self.derive(
                OrderKind::DatabaseAssociation,
                &[
                    OrderKind::User,
                    OrderKind::CertificateKeyUser,
                    OrderKind::RoleDatabase,
                ],
                PhaseTag::Associations,
            );
        }
        if self.options.include_owner {
            emitted |= self.derive(
                OrderKind::ServerOwnership,
                &[OrderKind::RoleServer, OrderKind::Database],
                PhaseTag::Ownership,
            );
            let database_level: Vec<OrderKind> = MASTER_SECURABLES
                .iter()
                .chain(USER_SECURABLES)
                .copied()
                .chain([OrderKind::RoleDatabase])
                .collect();
            emitted |= self.derive(
                OrderKind::DatabaseOwnership,
                &database_level,
                PhaseTag::Ownership,
            );
        }
        if self.options.include_permissions {
            emitted |= self.derive(
                OrderKind::ServerPermission,
                &[
                    OrderKind::Login,
                    OrderKind::CertificateKeyLogin,
                    OrderKind::RoleServer,
                ],
                PhaseTag::Permission,
            );
            let database_level: Vec<OrderKind> = [
                OrderKind::Database,
                OrderKind::User,
                OrderKind::CertificateKeyUser,
            ]
            .into_iter()
            .chain(MASTER_SECURABLES.iter().copied())
            .chain(USER_SECURABLES.iter().copied())
            .chain([OrderKind::RoleDatabase])
            .collect();
            emitted |= self.derive(
                OrderKind::DatabasePermission,
                &database_level,
                PhaseTag::Permission,
            );
        }

        if emitted {
            for kind in OBJECT_PHASE_KINDS {
                self.mark(*kind, PhaseTag::Object);
            }
        }
        self.mark(OrderKind::UnresolvedEntity, PhaseTag::UnresolvedEntity);
        Ok(())
    }

    /// Database roles follow the roles that own them.
    fn resolve_role_owners(&mut self) -> Result<()> {
        if self.buckets.len_of(OrderKind::RoleDatabase) < 2 {
            return Ok(());
        }
        let roles = self.buckets.take(OrderKind::RoleDatabase);
        let (creating, persisted) = self.partition_creating(roles);
        let mut ordered =
            self.resolver
                .resolve(DependencyFamily::RoleOwnership, &persisted, self.repository)?;
        ordered.extend(creating);
        self.buckets.insert(OrderKind::RoleDatabase, ordered);
        Ok(())
    }

    /// Appends `phase` entries for every member of `sources` to `target`.
    /// Returns whether anything was added.
    fn derive(&mut self, target: OrderKind, sources: &[OrderKind], phase: PhaseTag) -> bool {
        let derived: Vec<Urn> = sources
            .iter()
            .filter_map(|kind| self.buckets.get(*kind))
            .flatten()
            .map(|urn| urn.with_phase(phase))
            .collect();
        if derived.is_empty() {
            return false;
        }
        debug!(kind = target.name(), count = derived.len(), "derived security phase");
        self.buckets.append(target, derived);
        true
    }

    /// Key-backed logins get their own bucket; their master securables then
    /// have to exist before them.
    fn split_key_backed_logins(&mut self) -> Result<()> {
        let Some(logins) = self.buckets.get(OrderKind::Login) else {
            return Ok(());
        };
        let mut regular = Vec::new();
        let mut keyed = Vec::new();
        for login in logins {
            if login_is_key_backed(self.repository, login)? {
                keyed.push(login.clone());
            } else {
                regular.push(login.clone());
            }
        }
        if keyed.is_empty() {
            return Ok(());
        }
        self.buckets.insert(OrderKind::Login, regular);
        self.buckets.insert(OrderKind::CertificateKeyLogin, keyed);

        let moves = [
            (OrderKind::SqlAssembly, OrderKind::MasterAssembly),
            (OrderKind::Certificate, OrderKind::MasterCertificate),
            (OrderKind::AsymmetricKey, OrderKind::MasterAsymmetricKey),
        ];
        for (kind, master_kind) in moves {
            let (master, rest): (Vec<Urn>, Vec<Urn>) = self
                .buckets
                .take(kind)
                .into_iter()
                .partition(in_master_database);
            self.buckets.insert(kind, rest);
            self.buckets.append(master_kind, master);
        }
        Ok(())
    }

    /// Key-backed users get their own bucket; every assembly, certificate and
    /// asymmetric key left then moves ahead of them.
    fn split_key_backed_users(&mut self) -> Result<()> {
        let Some(users) = self.buckets.get(OrderKind::User) else {
            return Ok(());
        };
        let mut regular = Vec::new();
        let mut keyed = Vec::new();
        for user in users {
            if user_is_key_backed(self.repository, user)? {
                keyed.push(user.clone());
            } else {
                regular.push(user.clone());
            }
        }
        if keyed.is_empty() {
            return Ok(());
        }
        self.buckets.insert(OrderKind::User, regular);
        self.buckets.insert(OrderKind::CertificateKeyUser, keyed);

        let moves = [
            (OrderKind::SqlAssembly, OrderKind::UserAssembly),
            (OrderKind::Certificate, OrderKind::UserCertificate),
            (OrderKind::AsymmetricKey, OrderKind::UserAsymmetricKey),
        ];
        for (kind, user_kind) in moves {
            let urns = self.buckets.take(kind);
            self.buckets.append(user_kind, urns);
        }
        Ok(())
    }

    /// Adds a `Data` entry for every persisted table.
    pub fn add_table_data(&mut self) {
        if !self.options.include_data {
            return;
        }
        let Some(tables) = self.buckets.get(OrderKind::Table) else {
            return;
        };
        let data: Vec<Urn> = tables
            .iter()
            .filter(|table| !self.creating.contains(table))
            .map(|table| table.with_phase(PhaseTag::Data))
            .collect();
        self.buckets.append(OrderKind::Data, data);
    }

    pub fn resolve_indexes(&mut self) -> Result<()> {
        let indexes = self.buckets.take(OrderKind::Index);
        if indexes.is_empty() {
            return Ok(());
        }
        let tables: HashSet<Urn> = self
            .buckets
            .get(OrderKind::Table)
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default();
        let fold_filestream_keys = self.options.include_data && self.options.include_filestream;

        for index in indexes {
            let info = index_info(self.repository, &index)?;
            let table = index
                .parent()
                .ok_or_else(|| AppError::config(format!("Index without a table: {}", index)))?;
            let table_present = tables.contains(&table);

            if fold_filestream_keys
                && info.is_key
                && table_present
                && is_filestream_table(self.repository, &table)
            {
                self.fold(table, index, FoldReason::FilestreamKeyIndex);
                continue;
            }

            let kind = match info.index_type {
                IndexType::Clustered => {
                    if info.is_key && table_present {
                        self.fold(table, index, FoldReason::KeyIndex);
                        continue;
                    }
                    OrderKind::ClusteredIndex
                }
                IndexType::NonClustered => {
                    if info.memory_optimized {
                        self.fold(table, index, FoldReason::MemoryOptimized);
                        continue;
                    }
                    if info.is_key && !self.options.include_data && table_present {
                        self.fold(table, index, FoldReason::KeyIndex);
                        continue;
                    }
                    OrderKind::NonClusteredIndex
                }
                IndexType::PrimaryXml => OrderKind::PrimaryXmlIndex,
                IndexType::SecondaryXml => OrderKind::SecondaryXmlIndex,
                IndexType::SelectiveXml => OrderKind::SelectiveXmlIndex,
                IndexType::SecondarySelectiveXml => OrderKind::SecondarySelectiveXmlIndex,
                IndexType::Spatial => OrderKind::SpatialIndex,
                IndexType::NonClusteredColumnstore => OrderKind::ColumnstoreIndex,
                IndexType::ClusteredColumnstore => OrderKind::ClusteredColumnstoreIndex,
                IndexType::Vector => OrderKind::VectorIndex,
                IndexType::Json => OrderKind::JsonIndex,
                IndexType::NonClusteredHash | IndexType::Heap => continue,
            };
            self.buckets.push(kind, index);
        }
        Ok(())
    }

    /// Design mode scripts a lone table with its constraints inline.
    pub fn embed_constraints(&mut self) {
        if !self.options.design_mode {
            return;
        }
        let table = match self.buckets.get(OrderKind::Table) {
            Some([table]) => table.clone(),
            _ => return,
        };
        for kind in [OrderKind::ForeignKey, OrderKind::Check, OrderKind::DefaultColumn] {
            for member in self.buckets.take(kind) {
                self.fold(table.clone(), member, FoldReason::EmbeddedConstraint);
            }
        }
    }

    /// Dropping a table drops its foreign keys, so they are scripted
    /// separately ahead of it.
    pub fn add_foreign_keys(&mut self) {
        let Some(tables) = self.buckets.get(OrderKind::Table) else {
            return;
        };
        let mut present: HashSet<Urn> = self
            .buckets
            .get(OrderKind::ForeignKey)
            .map(|fks| fks.iter().cloned().collect())
            .unwrap_or_default();
        let mut added = Vec::new();
        for table in tables {
            let Some(meta) = self.repository.resolve(table) else {
                continue;
            };
            for fk in meta.foreign_keys.iter().filter(|fk| !fk.file_table_defined) {
                if present.insert(fk.urn.clone()) {
                    added.push(fk.urn.clone());
                }
            }
        }
        debug!(count = added.len(), "re-attached foreign keys");
        self.buckets.append(OrderKind::ForeignKey, added);
    }

    /// Orders functions, procedures, views and (when they take part) tables
    /// that can reference each other into the `tableviewudf` bucket.
    pub fn resolve_schema_bound(&mut self) -> Result<()> {
        let mut candidates = Vec::new();
        self.split_functions(&mut candidates)?;
        self.split_procedures(&mut candidates);
        self.split_views(&mut candidates);

        let persisted_tables = self.buckets.get(OrderKind::Table).map_or(0, |tables| {
            tables.iter().filter(|t| !self.creating.contains(t)).count()
        });
        if persisted_tables > 0
            && candidates.len() + persisted_tables > 1
            && self.resolver.server_info()?.supports_temporal()
        {
            self.pull_tables(&mut candidates);
        }

        if candidates.is_empty() {
            return Ok(());
        }
        debug!(count = candidates.len(), "ordering schema-bound objects");
        let ordered =
            self.resolver
                .resolve(DependencyFamily::SchemaBound, &candidates, self.repository)?;
        self.buckets.append(OrderKind::TableViewUdf, ordered);
        Ok(())
    }

    /// Moves tables out of their bucket: creating ones to `creatingtable`,
    /// persisted ones into `candidates`.
    fn pull_tables(&mut self, candidates: &mut Vec<Urn>) {
        let tables = self.buckets.take(OrderKind::Table);
        let (creating, persisted) = self.partition_creating(tables);
        self.buckets.append(OrderKind::CreatingTable, creating);
        candidates.extend(persisted);
    }

    fn split_functions(&mut self, candidates: &mut Vec<Urn>) -> Result<()> {
        let functions = self.buckets.take(OrderKind::UserDefinedFunction);
        if functions.is_empty() {
            return Ok(());
        }
        let mut creating = Vec::new();
        let mut unbound = Vec::new();
        let mut scalar_bound = false;
        for function in functions {
            if self.creating.contains(&function) {
                creating.push(function);
                continue;
            }
            let function_type = function_type(self.repository, &function)?;
            if !is_schema_bound(self.repository, &function) && function_type != FunctionType::Inline
            {
                unbound.push(function);
                continue;
            }
            scalar_bound |= function_type == FunctionType::Scalar;
            candidates.push(function);
        }
        self.buckets.append(OrderKind::CreatingUdf, creating);
        self.buckets.append(OrderKind::ScalarUdf, unbound);
        if scalar_bound {
            self.pull_tables(candidates);
        }
        Ok(())
    }

    fn split_procedures(&mut self, candidates: &mut Vec<Urn>) {
        let procedures = self.buckets.take(OrderKind::StoredProcedure);
        if procedures.is_empty() {
            return;
        }
        let mut creating = Vec::new();
        let mut unbound = Vec::new();
        let mut any_bound = false;
        for procedure in procedures {
            if self.creating.contains(&procedure) {
                creating.push(procedure);
            } else if is_schema_bound(self.repository, &procedure) {
                any_bound = true;
                candidates.push(procedure);
            } else {
                unbound.push(procedure);
            }
        }
        self.buckets.append(OrderKind::CreatingSproc, creating);
        self.buckets.append(OrderKind::NonSchemaBoundSproc, unbound);
        if any_bound {
            self.pull_tables(candidates);
        }
    }

    fn split_views(&mut self, candidates: &mut Vec<Urn>) {
        let views = self.buckets.take(OrderKind::View);
        let (creating, persisted) = self.partition_creating(views);
        self.buckets.append(OrderKind::CreatingView, creating);
        candidates.extend(persisted);
    }

    /// Data-only scripting: persisted tables in foreign-key order, emitted as
    /// `Data` entries only.
    pub fn resolve_table_data_only(&mut self) -> Result<()> {
        let tables = self.buckets.take(OrderKind::Table);
        let (_, persisted) = self.partition_creating(tables);
        let ordered = if persisted.len() > 1 {
            debug!(count = persisted.len(), "ordering tables by foreign keys");
            self.resolver
                .resolve(DependencyFamily::TableData, &persisted, self.repository)?
        } else {
            persisted
        };
        self.buckets.append(
            OrderKind::Data,
            ordered.iter().map(|table| table.with_phase(PhaseTag::Data)),
        );
        Ok(())
    }
}

fn in_master_database(urn: &Urn) -> bool {
    urn.ancestor("Database")
        .is_some_and(|db| db.name() == Some("master"))
}
