use std::fmt;

macro_rules! object_types {
    ($($variant:ident => $name:literal,)+) => {
        /// Entity type named by the last segment of a Urn.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ObjectType {
            $($variant,)+
        }

        impl ObjectType {
            pub const ALL: &'static [ObjectType] = &[$(ObjectType::$variant,)+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(ObjectType::$variant => $name,)+
                }
            }
        }
    };
}

object_types! {
    UnresolvedEntity => "UnresolvedEntity",
    Server => "Server",
    Settings => "Settings",
    OleDbProviderSetting => "OleDbProviderSetting",
    UserOptions => "UserOptions",
    FilestreamSettings => "FilestreamSettings",
    FullTextService => "FullTextService",
    CryptographicProvider => "CryptographicProvider",
    Credential => "Credential",
    Database => "Database",
    DatabaseScopedCredential => "DatabaseScopedCredential",
    Login => "Login",
    Role => "Role",
    LinkedServer => "LinkedServer",
    Audit => "Audit",
    UserDefinedMessage => "UserDefinedMessage",
    HttpEndpoint => "HttpEndpoint",
    Endpoint => "Endpoint",
    DatabaseEncryptionKey => "DatabaseEncryptionKey",
    MasterKey => "MasterKey",
    ApplicationRole => "ApplicationRole",
    User => "User",
    SqlAssembly => "SqlAssembly",
    ExternalLanguage => "ExternalLanguage",
    ExternalLibrary => "ExternalLibrary",
    AsymmetricKey => "AsymmetricKey",
    Certificate => "Certificate",
    SymmetricKey => "SymmetricKey",
    Schema => "Schema",
    Default => "Default",
    FullTextCatalog => "FullTextCatalog",
    FullTextStopList => "FullTextStopList",
    SearchPropertyList => "SearchPropertyList",
    SearchProperty => "SearchProperty",
    PartitionFunction => "PartitionFunction",
    PartitionScheme => "PartitionScheme",
    Rule => "Rule",
    XmlSchemaCollection => "XmlSchemaCollection",
    UserDefinedDataType => "UserDefinedDataType",
    UserDefinedType => "UserDefinedType",
    Sequence => "Sequence",
    UserDefinedTableType => "UserDefinedTableType",
    UserDefinedAggregate => "UserDefinedAggregate",
    StoredProcedure => "StoredProcedure",
    ServiceBroker => "ServiceBroker",
    MessageType => "MessageType",
    ServiceContract => "ServiceContract",
    ServiceQueue => "ServiceQueue",
    BrokerService => "BrokerService",
    ServiceRoute => "ServiceRoute",
    RemoteServiceBinding => "RemoteServiceBinding",
    BrokerPriority => "BrokerPriority",
    Synonym => "Synonym",
    UserDefinedFunction => "UserDefinedFunction",
    ExternalDataSource => "ExternalDataSource",
    ExternalFileFormat => "ExternalFileFormat",
    ExternalStream => "ExternalStream",
    ExternalStreamingJob => "ExternalStreamingJob",
    ColumnMasterKey => "ColumnMasterKey",
    ColumnEncryptionKey => "ColumnEncryptionKey",
    ColumnEncryptionKeyValue => "ColumnEncryptionKeyValue",
    Table => "Table",
    View => "View",
    SecurityPolicy => "SecurityPolicy",
    SecurityPredicate => "SecurityPredicate",
    Index => "Index",
    FullTextIndex => "FullTextIndex",
    ForeignKey => "ForeignKey",
    Check => "Check",
    Trigger => "Trigger",
    Statistic => "Statistic",
    PlanGuide => "PlanGuide",
    DatabaseAuditSpecification => "DatabaseAuditSpecification",
    DdlTrigger => "DdlTrigger",
    ExtendedProperty => "ExtendedProperty",
    ResourcePool => "ResourcePool",
    ExternalResourcePool => "ExternalResourcePool",
    WorkloadGroup => "WorkloadGroup",
    WorkloadManagementWorkloadClassifier => "WorkloadManagementWorkloadClassifier",
    WorkloadManagementWorkloadGroup => "WorkloadManagementWorkloadGroup",
    ResourceGovernor => "ResourceGovernor",
    Mail => "Mail",
    MailProfile => "MailProfile",
    MailAccount => "MailAccount",
    MailServer => "MailServer",
    ConfigurationValue => "ConfigurationValue",
    Job => "Job",
    Step => "Step",
    Operator => "Operator",
    OperatorCategory => "OperatorCategory",
    JobCategory => "JobCategory",
    AlertCategory => "AlertCategory",
    Schedule => "Schedule",
    TargetServerGroup => "TargetServerGroup",
    Alert => "Alert",
    BackupDevice => "BackupDevice",
    ProxyAccount => "ProxyAccount",
    JobServer => "JobServer",
    AlertSystem => "AlertSystem",
    ServerAuditSpecification => "ServerAuditSpecification",
    AvailabilityGroup => "AvailabilityGroup",
    AvailabilityReplica => "AvailabilityReplica",
    AvailabilityDatabase => "AvailabilityDatabase",
    AvailabilityGroupListener => "AvailabilityGroupListener",
    AvailabilityGroupListenerIPAddress => "AvailabilityGroupListenerIPAddress",
    QueryStoreOptions => "QueryStoreOptions",
    DatabaseScopedConfiguration => "DatabaseScopedConfiguration",
    ResumableIndex => "ResumableIndex",
    EdgeConstraint => "EdgeConstraint",
}

impl ObjectType {
    pub fn from_urn_type(type_name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(type_name))
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

macro_rules! sub_kind {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $text:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const LABEL: &'static str = $label;

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Accepts any casing and ignores spaces, underscores and dashes,
            /// so `NonClustered`, `non_clustered` and `nonclustered` agree.
            pub fn parse(value: &str) -> Option<Self> {
                let wanted = normalize(value);
                [$($name::$variant,)+]
                    .into_iter()
                    .find(|candidate| normalize(candidate.as_str()) == wanted)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

sub_kind!(IndexType, "index type" {
    Clustered => "clustered",
    NonClustered => "nonClustered",
    PrimaryXml => "primaryXml",
    SecondaryXml => "secondaryXml",
    SelectiveXml => "selectiveXml",
    SecondarySelectiveXml => "secondarySelectiveXml",
    Spatial => "spatial",
    NonClusteredColumnstore => "nonClusteredColumnstore",
    ClusteredColumnstore => "clusteredColumnstore",
    NonClusteredHash => "nonClusteredHash",
    Heap => "heap",
    Vector => "vector",
    Json => "json",
});

sub_kind!(IndexKeyType, "index key type" {
    None => "none",
    PrimaryKey => "primaryKey",
    UniqueKey => "uniqueKey",
});

sub_kind!(LoginType, "login type" {
    WindowsUser => "windowsUser",
    WindowsGroup => "windowsGroup",
    SqlLogin => "sqlLogin",
    Certificate => "certificate",
    AsymmetricKey => "asymmetricKey",
    ExternalUser => "externalUser",
    ExternalGroup => "externalGroup",
});

sub_kind!(UserType, "user type" {
    SqlLogin => "sqlLogin",
    Certificate => "certificate",
    AsymmetricKey => "asymmetricKey",
    NoLogin => "noLogin",
    External => "external",
});

sub_kind!(FunctionType, "function type" {
    Scalar => "scalar",
    Inline => "inline",
    Table => "table",
});

impl LoginType {
    pub fn is_key_backed(self) -> bool {
        matches!(self, LoginType::Certificate | LoginType::AsymmetricKey)
    }
}

impl UserType {
    pub fn is_key_backed(self) -> bool {
        matches!(self, UserType::Certificate | UserType::AsymmetricKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urn_types_match_case_insensitively() {
        assert_eq!(ObjectType::from_urn_type("table"), Some(ObjectType::Table));
        assert_eq!(ObjectType::from_urn_type("SQLASSEMBLY"), Some(ObjectType::SqlAssembly));
        assert_eq!(ObjectType::from_urn_type("Column"), None);
        for kind in ObjectType::ALL {
            assert_eq!(ObjectType::from_urn_type(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn sub_kinds_ignore_case_and_separators() {
        assert_eq!(IndexType::parse("NonClustered"), Some(IndexType::NonClustered));
        assert_eq!(IndexType::parse("non_clustered"), Some(IndexType::NonClustered));
        assert_eq!(IndexType::parse("clustered columnstore"), Some(IndexType::ClusteredColumnstore));
        assert_eq!(IndexKeyType::parse("PrimaryKey"), Some(IndexKeyType::PrimaryKey));
        assert_eq!(FunctionType::parse("INLINE"), Some(FunctionType::Inline));
        assert_eq!(IndexType::parse("bitmap"), None);
    }

    #[test]
    fn key_backed_principals() {
        assert!(LoginType::Certificate.is_key_backed());
        assert!(LoginType::AsymmetricKey.is_key_backed());
        assert!(!LoginType::SqlLogin.is_key_backed());
        assert!(UserType::AsymmetricKey.is_key_backed());
        assert!(!UserType::NoLogin.is_key_backed());
    }
}
