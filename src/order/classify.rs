use anyhow::Result;

use super::key::OrderKind;
use crate::error::AppError;
use crate::model::{
    EntityMetadata, EntityRepository, FunctionType, IndexKeyType, IndexType, LoginType,
    ObjectType, Urn, UserType,
};

/// Maps a Urn to the bucket it is registered under.
///
/// Only the Urn type and, for types that exist at both server and database
/// level, the parent type are consulted. Sub-kind refinement happens later in
/// the phase passes through the helpers below.
pub fn classify(urn: &Urn) -> Result<OrderKind> {
    let object_type = ObjectType::from_urn_type(urn.type_name()).ok_or_else(|| {
        AppError::config(format!(
            "Unknown object type '{}' in {}",
            urn.type_name(),
            urn
        ))
    })?;

    let kind = match object_type {
        ObjectType::UnresolvedEntity => OrderKind::UnresolvedEntity,
        ObjectType::Server => OrderKind::Server,
        ObjectType::Settings => OrderKind::Settings,
        ObjectType::OleDbProviderSetting => OrderKind::OleDbProviderSettings,
        ObjectType::UserOptions => OrderKind::UserOptions,
        ObjectType::FilestreamSettings => OrderKind::FilestreamSettings,
        ObjectType::FullTextService => OrderKind::FullTextService,
        ObjectType::CryptographicProvider => OrderKind::CryptographicProvider,
        ObjectType::Credential => OrderKind::Credential,
        ObjectType::Database => OrderKind::Database,
        ObjectType::DatabaseScopedCredential => OrderKind::DatabaseScopedCredential,
        ObjectType::Login => OrderKind::Login,
        ObjectType::Role => by_parent(urn, OrderKind::RoleServer, OrderKind::RoleDatabase)?,
        ObjectType::LinkedServer => OrderKind::LinkedServer,
        ObjectType::Audit => OrderKind::Audit,
        ObjectType::UserDefinedMessage => OrderKind::UserDefinedMessage,
        ObjectType::HttpEndpoint => OrderKind::HttpEndpoint,
        ObjectType::Endpoint => OrderKind::Endpoint,
        ObjectType::DatabaseEncryptionKey => OrderKind::DatabaseEncryptionKey,
        ObjectType::MasterKey => OrderKind::MasterKey,
        ObjectType::ApplicationRole => OrderKind::ApplicationRole,
        ObjectType::User => OrderKind::User,
        ObjectType::SqlAssembly => OrderKind::SqlAssembly,
        ObjectType::ExternalLanguage => OrderKind::ExternalLanguage,
        ObjectType::ExternalLibrary => OrderKind::ExternalLibrary,
        ObjectType::AsymmetricKey => OrderKind::AsymmetricKey,
        ObjectType::Certificate => OrderKind::Certificate,
        ObjectType::SymmetricKey => OrderKind::SymmetricKey,
        ObjectType::Schema => OrderKind::Schema,
        ObjectType::Default => default_kind(urn)?,
        ObjectType::FullTextCatalog => OrderKind::FullTextCatalog,
        ObjectType::FullTextStopList => OrderKind::FullTextStopList,
        ObjectType::SearchPropertyList => OrderKind::SearchPropertyList,
        ObjectType::SearchProperty => OrderKind::SearchProperty,
        ObjectType::PartitionFunction => OrderKind::PartitionFunction,
        ObjectType::PartitionScheme => OrderKind::PartitionScheme,
        ObjectType::Rule => OrderKind::Rule,
        ObjectType::XmlSchemaCollection => OrderKind::XmlSchemaCollection,
        ObjectType::UserDefinedDataType => OrderKind::UserDefinedDataType,
        ObjectType::UserDefinedType => OrderKind::UserDefinedType,
        ObjectType::Sequence => OrderKind::Sequence,
        ObjectType::UserDefinedTableType => OrderKind::UserDefinedTableType,
        ObjectType::UserDefinedAggregate => OrderKind::UserDefinedAggregate,
        ObjectType::StoredProcedure => OrderKind::StoredProcedure,
        ObjectType::ServiceBroker => OrderKind::ServiceBroker,
        ObjectType::MessageType => OrderKind::MessageType,
        ObjectType::ServiceContract => OrderKind::ServiceContract,
        ObjectType::ServiceQueue => OrderKind::ServiceQueue,
        ObjectType::BrokerService => OrderKind::BrokerService,
        ObjectType::ServiceRoute => OrderKind::ServiceRoute,
        ObjectType::RemoteServiceBinding => OrderKind::RemoteServiceBinding,
        ObjectType::BrokerPriority => OrderKind::BrokerPriority,
        ObjectType::Synonym => OrderKind::Synonym,
        ObjectType::UserDefinedFunction => OrderKind::UserDefinedFunction,
        ObjectType::ExternalDataSource => OrderKind::ExternalDataSource,
        ObjectType::ExternalFileFormat => OrderKind::ExternalFileFormat,
        ObjectType::ExternalStream => OrderKind::ExternalStream,
        ObjectType::ExternalStreamingJob => OrderKind::ExternalStreamingJob,
        ObjectType::ColumnMasterKey => OrderKind::ColumnMasterKey,
        ObjectType::ColumnEncryptionKey => OrderKind::ColumnEncryptionKey,
        ObjectType::ColumnEncryptionKeyValue => OrderKind::ColumnEncryptionKeyValue,
        ObjectType::Table => OrderKind::Table,
        ObjectType::View => OrderKind::View,
        ObjectType::SecurityPolicy => OrderKind::SecurityPolicy,
        ObjectType::SecurityPredicate => OrderKind::SecurityPredicate,
        ObjectType::Index => OrderKind::Index,
        ObjectType::FullTextIndex => OrderKind::FullTextIndex,
        ObjectType::ForeignKey => OrderKind::ForeignKey,
        ObjectType::Check => OrderKind::Check,
        ObjectType::Trigger => OrderKind::Trigger,
        ObjectType::Statistic => OrderKind::Statistic,
        ObjectType::PlanGuide => OrderKind::PlanGuide,
        ObjectType::DatabaseAuditSpecification => OrderKind::DatabaseAuditSpecification,
        ObjectType::DdlTrigger => by_parent(
            urn,
            OrderKind::DdlTriggerServer,
            OrderKind::DdlTriggerDatabase,
        )?,
        ObjectType::ExtendedProperty => OrderKind::ExtendedProperty,
        ObjectType::ResourcePool => OrderKind::ResourcePool,
        ObjectType::ExternalResourcePool => OrderKind::ExternalResourcePool,
        ObjectType::WorkloadGroup => OrderKind::WorkloadGroup,
        ObjectType::WorkloadManagementWorkloadClassifier => {
            OrderKind::WorkloadManagementWorkloadClassifier
        }
        ObjectType::WorkloadManagementWorkloadGroup => OrderKind::WorkloadManagementWorkloadGroup,
        ObjectType::ResourceGovernor => OrderKind::ResourceGovernor,
        ObjectType::Mail => OrderKind::Mail,
        ObjectType::MailProfile => OrderKind::MailProfile,
        ObjectType::MailAccount => OrderKind::MailAccount,
        ObjectType::MailServer => OrderKind::MailServer,
        ObjectType::ConfigurationValue => OrderKind::ConfigurationValue,
        ObjectType::Job => OrderKind::Job,
        ObjectType::Step => OrderKind::Step,
        ObjectType::Operator => OrderKind::Operator,
        ObjectType::OperatorCategory => OrderKind::OperatorCategory,
        ObjectType::JobCategory => OrderKind::JobCategory,
        ObjectType::AlertCategory => OrderKind::AlertCategory,
        ObjectType::Schedule => OrderKind::Schedule,
        ObjectType::TargetServerGroup => OrderKind::TargetServerGroup,
        ObjectType::Alert => OrderKind::Alert,
        ObjectType::BackupDevice => OrderKind::BackupDevice,
        ObjectType::ProxyAccount => OrderKind::ProxyAccount,
        ObjectType::JobServer => OrderKind::JobServer,
        ObjectType::AlertSystem => OrderKind::AlertSystem,
        ObjectType::ServerAuditSpecification => OrderKind::ServerAuditSpecification,
        ObjectType::AvailabilityGroup => OrderKind::AvailabilityGroup,
        ObjectType::AvailabilityReplica => OrderKind::AvailabilityReplica,
        ObjectType::AvailabilityDatabase => OrderKind::AvailabilityDatabase,
        ObjectType::AvailabilityGroupListener => OrderKind::AvailabilityGroupListener,
        ObjectType::AvailabilityGroupListenerIPAddress => {
            OrderKind::AvailabilityGroupListenerIpAddress
        }
        ObjectType::QueryStoreOptions => OrderKind::QueryStoreOptions,
        ObjectType::DatabaseScopedConfiguration => OrderKind::DatabaseScopedConfiguration,
        ObjectType::ResumableIndex => OrderKind::ResumableIndex,
        ObjectType::EdgeConstraint => OrderKind::EdgeConstraint,
    };
    Ok(kind)
}

fn parent_type(urn: &Urn) -> Option<ObjectType> {
    urn.parent_type().and_then(ObjectType::from_urn_type)
}

fn by_parent(urn: &Urn, server: OrderKind, database: OrderKind) -> Result<OrderKind> {
    match parent_type(urn) {
        Some(ObjectType::Server) => Ok(server),
        Some(ObjectType::Database) => Ok(database),
        _ => Err(unexpected_parent(urn)),
    }
}

fn default_kind(urn: &Urn) -> Result<OrderKind> {
    match parent_type(urn) {
        Some(ObjectType::Database) => Ok(OrderKind::DefaultDatabase),
        None if urn.parent_type().is_some_and(|t| t.eq_ignore_ascii_case("Column")) => {
            Ok(OrderKind::DefaultColumn)
        }
        _ => Err(unexpected_parent(urn)),
    }
}

fn unexpected_parent(urn: &Urn) -> anyhow::Error {
    AppError::config(format!(
        "Cannot classify {} under parent '{}' in {}",
        urn.type_name(),
        urn.parent_type().unwrap_or("<none>"),
        urn
    ))
    .into()
}

/// Metadata the caller must provide for `urn`.
pub fn metadata<'r>(repository: &'r dyn EntityRepository, urn: &Urn) -> Result<&'r EntityMetadata> {
    repository
        .resolve(urn)
        .ok_or_else(|| AppError::config(format!("No metadata known for {}", urn)).into())
}

pub fn object_id(repository: &dyn EntityRepository, urn: &Urn) -> Result<i32> {
    metadata(repository, urn)?
        .id
        .ok_or_else(|| AppError::config(format!("No catalog id known for {}", urn)).into())
}

fn parse_sub_kind<T>(
    value: &str,
    label: &str,
    urn: &Urn,
    parse: fn(&str) -> Option<T>,
) -> Result<T> {
    parse(value).ok_or_else(|| {
        AppError::config(format!("Unknown {} '{}' for {}", label, value, urn)).into()
    })
}

/// Index properties that decide where an index is scripted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexInfo {
    pub index_type: IndexType,
    pub is_key: bool,
    pub memory_optimized: bool,
}

pub fn index_info(repository: &dyn EntityRepository, urn: &Urn) -> Result<IndexInfo> {
    let meta = metadata(repository, urn)?;
    let raw_type = meta
        .index_type
        .as_deref()
        .ok_or_else(|| AppError::config(format!("No index type known for {}", urn)))?;
    let index_type = parse_sub_kind(raw_type, IndexType::LABEL, urn, IndexType::parse)?;
    let key_type = match meta.index_key_type.as_deref() {
        Some(raw) => parse_sub_kind(raw, IndexKeyType::LABEL, urn, IndexKeyType::parse)?,
        None => IndexKeyType::None,
    };
    Ok(IndexInfo {
        index_type,
        is_key: key_type != IndexKeyType::None,
        memory_optimized: meta.memory_optimized,
    })
}

/// Logins without metadata or without a login type are treated as regular.
pub fn login_is_key_backed(repository: &dyn EntityRepository, urn: &Urn) -> Result<bool> {
    match repository.resolve(urn).and_then(|m| m.login_type.as_deref()) {
        Some(raw) => Ok(parse_sub_kind(raw, LoginType::LABEL, urn, LoginType::parse)?.is_key_backed()),
        None => Ok(false),
    }
}

/// Users without metadata or without a user type are treated as regular.
pub fn user_is_key_backed(repository: &dyn EntityRepository, urn: &Urn) -> Result<bool> {
    match repository.resolve(urn).and_then(|m| m.user_type.as_deref()) {
        Some(raw) => Ok(parse_sub_kind(raw, UserType::LABEL, urn, UserType::parse)?.is_key_backed()),
        None => Ok(false),
    }
}

pub fn function_type(repository: &dyn EntityRepository, urn: &Urn) -> Result<FunctionType> {
    let raw = metadata(repository, urn)?
        .function_type
        .as_deref()
        .ok_or_else(|| AppError::config(format!("No function type known for {}", urn)))?;
    parse_sub_kind(raw, FunctionType::LABEL, urn, FunctionType::parse)
}

/// Routines without metadata are treated as not schema bound.
pub fn is_schema_bound(repository: &dyn EntityRepository, urn: &Urn) -> bool {
    repository.resolve(urn).is_some_and(|m| m.schema_bound)
}

pub fn is_filestream_table(repository: &dyn EntityRepository, urn: &Urn) -> bool {
    repository.resolve(urn).is_some_and(|m| m.filestream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, classify_error};
    use std::collections::HashMap;

    fn db() -> Urn {
        Urn::root("Server", "srv").child("Database", "db")
    }

    #[test]
    fn splits_roles_triggers_and_defaults_by_parent() {
        let server = Urn::root("Server", "srv");
        assert_eq!(classify(&server.child("Role", "sysadmin")).unwrap(), OrderKind::RoleServer);
        assert_eq!(classify(&db().child("Role", "readers")).unwrap(), OrderKind::RoleDatabase);
        assert_eq!(classify(&server.child("DdlTrigger", "t")).unwrap(), OrderKind::DdlTriggerServer);
        assert_eq!(classify(&db().child("DdlTrigger", "t")).unwrap(), OrderKind::DdlTriggerDatabase);
        assert_eq!(classify(&db().child("Default", "d")).unwrap(), OrderKind::DefaultDatabase);
        let column_default = db()
            .child("Table", "t")
            .with_attribute("Schema", "dbo")
            .child("Column", "c")
            .child("Default", "df_c");
        assert_eq!(classify(&column_default).unwrap(), OrderKind::DefaultColumn);
    }

    #[test]
    fn unknown_types_are_config_errors() {
        let err = classify(&db().child("Widget", "w")).unwrap_err();
        assert_eq!(classify_error(&err), ErrorKind::Config);
        assert!(err.to_string().contains("Widget"));

        let err = classify(&Urn::root("Role", "orphan")).unwrap_err();
        assert_eq!(classify_error(&err), ErrorKind::Config);
    }

    #[test]
    fn index_sub_kind_errors_name_value_and_urn() {
        let index = db().child("Table", "t").child("Index", "ix");
        let mut repo = HashMap::new();
        repo.insert(
            index.clone(),
            EntityMetadata {
                index_type: Some("bitmap".into()),
                ..EntityMetadata::default()
            },
        );
        let err = index_info(&repo, &index).unwrap_err();
        assert_eq!(classify_error(&err), ErrorKind::Config);
        assert!(err.to_string().contains("bitmap"));
        assert!(err.to_string().contains("Index[@Name='ix']"));

        repo.insert(index.clone(), EntityMetadata::default());
        let err = index_info(&repo, &index).unwrap_err();
        assert!(err.to_string().contains("No index type"));
    }

    #[test]
    fn index_info_reads_key_and_memory_flags() {
        let index = db().child("Table", "t").child("Index", "pk");
        let mut repo = HashMap::new();
        repo.insert(
            index.clone(),
            EntityMetadata {
                index_type: Some("NonClustered".into()),
                index_key_type: Some("primaryKey".into()),
                memory_optimized: true,
                ..EntityMetadata::default()
            },
        );
        let info = index_info(&repo, &index).unwrap();
        assert_eq!(info.index_type, IndexType::NonClustered);
        assert!(info.is_key);
        assert!(info.memory_optimized);
    }

    #[test]
    fn principals_without_type_are_regular() {
        let login = Urn::root("Server", "srv").child("Login", "l");
        let repo: HashMap<Urn, EntityMetadata> = HashMap::new();
        assert!(!login_is_key_backed(&repo, &login).unwrap());
    }
}
