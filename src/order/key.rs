use std::cmp::Ordering;
use std::fmt;

/// Bumped whenever a rank below changes, so stored orderings can be told apart.
pub const RANK_TABLE_VERSION: u32 = 1;

macro_rules! order_kinds {
    ($($variant:ident => $name:literal @ $rank:literal,)+) => {
        /// A bucket in the canonical creation order.
        ///
        /// Most buckets correspond to one Urn type; the rest are refinements
        /// (index sub-kinds, key-backed principals, routines being created)
        /// and derived phases (table data, security passes, trigger toggles).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum OrderKind {
            $($variant,)+
        }

        impl OrderKind {
            pub const ALL: &'static [OrderKind] = &[$(OrderKind::$variant,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(OrderKind::$variant => $name,)+
                }
            }

            pub fn rank(self) -> u16 {
                match self {
                    $(OrderKind::$variant => $rank,)+
                }
            }
        }
    };
}

order_kinds! {
    UnresolvedEntity => "unresolvedentity" @ 0,
    Server => "server" @ 1,
    Settings => "settings" @ 2,
    OleDbProviderSettings => "oledbprovidersettings" @ 3,
    UserOptions => "useroptions" @ 4,
    FilestreamSettings => "filestreamsettings" @ 5,
    FullTextService => "fulltextservice" @ 6,
    CryptographicProvider => "cryptographicprovider" @ 11,
    Credential => "credential" @ 12,
    Database => "database" @ 13,
    DatabaseScopedCredential => "databasescopedcredential" @ 14,
    Login => "login" @ 15,
    MasterAssembly => "masterassembly" @ 16,
    MasterCertificate => "mastercertificate" @ 17,
    MasterAsymmetricKey => "masterasymmetrickey" @ 18,
    CertificateKeyLogin => "certificatekeylogin" @ 19,
    RoleServer => "roleserver" @ 20,
    ServerAssociation => "serverassociation" @ 21,
    ServerOwnership => "serverownership" @ 22,
    ServerPermission => "serverpermission" @ 23,
    LinkedServer => "linkedserver" @ 24,
    Audit => "audit" @ 31,
    UserDefinedMessage => "userdefinedmessage" @ 32,
    HttpEndpoint => "httpendpoint" @ 33,
    Endpoint => "endpoint" @ 34,
    DatabaseEncryptionKey => "databaseencryptionkey" @ 41,
    MasterKey => "masterkey" @ 42,
    ApplicationRole => "applicationrole" @ 43,
    User => "user" @ 44,
    UserAssembly => "userassembly" @ 45,
    UserCertificate => "usercertificate" @ 46,
    UserAsymmetricKey => "userasymmetrickey" @ 47,
    CertificateKeyUser => "certificatekeyuser" @ 48,
    RoleDatabase => "roledatabase" @ 49,
    DatabaseAssociation => "databaseassociation" @ 50,
    DatabaseOwnership => "databaseownership" @ 51,
    DatabasePermission => "databasepermission" @ 52,
    SqlAssembly => "sqlassembly" @ 61,
    ExternalLanguage => "externallanguage" @ 62,
    ExternalLibrary => "externallibrary" @ 63,
    AsymmetricKey => "asymmetrickey" @ 64,
    Certificate => "certificate" @ 65,
    SymmetricKey => "symmetrickeys" @ 66,
    Schema => "schema" @ 67,
    DefaultDatabase => "defaultdatabase" @ 68,
    FullTextCatalog => "fulltextcatalog" @ 69,
    FullTextStopList => "fulltextstoplist" @ 70,
    SearchPropertyList => "searchpropertylist" @ 71,
    SearchProperty => "searchproperty" @ 72,
    PartitionFunction => "partitionfunction" @ 73,
    PartitionScheme => "partitionscheme" @ 74,
    Rule => "rule" @ 75,
    XmlSchemaCollection => "xmlschemacollection" @ 76,
    UserDefinedDataType => "userdefineddatatype" @ 77,
    UserDefinedType => "userdefinedtype" @ 78,
    Sequence => "sequence" @ 79,
    UserDefinedTableType => "userdefinedtabletype" @ 80,
    UserDefinedAggregate => "userdefinedaggregate" @ 81,
    StoredProcedure => "storedprocedure" @ 82,
    ServiceBroker => "servicebroker" @ 83,
    MessageType => "messagetype" @ 84,
    ServiceContract => "servicecontract" @ 85,
    ServiceQueue => "servicequeue" @ 86,
    BrokerService => "brokerservice" @ 87,
    ServiceRoute => "serviceroute" @ 88,
    RemoteServiceBinding => "remoteservicebinding" @ 89,
    BrokerPriority => "brokerpriority" @ 90,
    Synonym => "synonym" @ 91,
    ScalarUdf => "scalarudf" @ 101,
    RegularTable => "regulartable" @ 102,
    UserDefinedFunction => "userdefinedfunction" @ 103,
    ExternalDataSource => "externaldatasource" @ 104,
    ExternalFileFormat => "externalfileformat" @ 105,
    ExternalStream => "externalstream" @ 106,
    ExternalStreamingJob => "externalstreamingjob" @ 107,
    ColumnMasterKey => "columnmasterkey" @ 108,
    ColumnEncryptionKey => "columnencryptionkey" @ 109,
    ColumnEncryptionKeyValue => "columnencryptionkeyvalue" @ 110,
    Table => "table" @ 111,
    View => "view" @ 112,
    TableViewUdf => "tableviewudf" @ 113,
    CreatingUdf => "creatingudf" @ 114,
    CreatingTable => "creatingtable" @ 115,
    CreatingView => "creatingview" @ 116,
    SecurityPolicy => "securitypolicy" @ 117,
    SecurityPredicate => "securitypredicate" @ 118,
    ClusteredIndex => "clusteredindex" @ 120,
    Data => "data" @ 121,
    NonClusteredIndex => "nonclusteredindex" @ 122,
    ColumnstoreIndex => "columnstoreindex" @ 123,
    ClusteredColumnstoreIndex => "clusteredcolumnstoreindex" @ 124,
    PrimaryXmlIndex => "primaryxmlindex" @ 125,
    SecondaryXmlIndex => "secondaryxmlindex" @ 126,
    SelectiveXmlIndex => "selectivexmlindex" @ 127,
    SecondarySelectiveXmlIndex => "secondaryselectivexmlindex" @ 128,
    Index => "index" @ 129,
    FullTextIndex => "fulltextindex" @ 130,
    DefaultColumn => "defaultcolumn" @ 131,
    ForeignKey => "foreignkey" @ 132,
    Check => "check" @ 133,
    CreatingSproc => "creatingsproc" @ 134,
    NonSchemaBoundSproc => "nonschemaboundsproc" @ 135,
    Trigger => "trigger" @ 136,
    Statistic => "statistic" @ 137,
    PlanGuide => "planguide" @ 140,
    DatabaseAuditSpecification => "databaseauditspecification" @ 141,
    DdlTriggerDatabase => "ddltriggerdatabase" @ 142,
    DdlTriggerDatabaseEnable => "ddltriggerdatabaseenable" @ 143,
    DdlTriggerDatabaseDisable => "ddltriggerdatabasedisable" @ 144,
    ExtendedProperty => "extendedproperty" @ 145,
    ResourcePool => "resourcepool" @ 160,
    ExternalResourcePool => "externalresourcepool" @ 161,
    WorkloadGroup => "workloadgroup" @ 162,
    WorkloadManagementWorkloadClassifier => "workloadmanagementworkloadclassifier" @ 163,
    WorkloadManagementWorkloadGroup => "workloadmanagementworkloadgroup" @ 164,
    ResourceGovernor => "resourcegovernor" @ 165,
    Mail => "mail" @ 170,
    MailProfile => "mailprofile" @ 171,
    MailAccount => "mailaccount" @ 172,
    MailServer => "mailserver" @ 173,
    ConfigurationValue => "configurationvalue" @ 180,
    Job => "job" @ 181,
    Step => "step" @ 182,
    Operator => "operator" @ 183,
    OperatorCategory => "operatorcategory" @ 184,
    JobCategory => "jobcategory" @ 185,
    AlertCategory => "alertcategory" @ 186,
    Schedule => "schedule" @ 187,
    TargetServerGroup => "targetservergroup" @ 188,
    Alert => "alert" @ 189,
    BackupDevice => "backupdevice" @ 190,
    ProxyAccount => "proxyaccount" @ 191,
    JobServer => "jobserver" @ 192,
    AlertSystem => "alertsystem" @ 193,
    ServerAuditSpecification => "serverauditspecification" @ 250,
    DdlTriggerServer => "ddltriggerserver" @ 251,
    DdlTriggerServerEnable => "ddltriggerserverenable" @ 252,
    DdlTriggerServerDisable => "ddltriggerserverdisable" @ 253,
    AvailabilityGroup => "availabilitygroup" @ 260,
    AvailabilityReplica => "availabilityreplica" @ 261,
    AvailabilityDatabase => "availabilitydatabase" @ 262,
    AvailabilityGroupListener => "availabilitygrouplistener" @ 263,
    AvailabilityGroupListenerIpAddress => "availabilitygrouplisteneripaddress" @ 264,
    QueryStoreOptions => "querystoreoptions" @ 265,
    DatabaseScopedConfiguration => "databasescopedconfiguration" @ 266,
    ResumableIndex => "resumableindex" @ 267,
    EdgeConstraint => "edgeconstraint" @ 268,
    SpatialIndex => "spatialindex" @ 269,
    DatabaseReadOnly => "databasereadonly" @ 270,
    VectorIndex => "vectorindex" @ 271,
    JsonIndex => "jsonindex" @ 272,
}

impl OrderKind {
    pub fn key(self) -> OrderingKey {
        OrderingKey::new(self)
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sort key of a bucket: rank first, kind name second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderingKey {
    kind: OrderKind,
    rank: u16,
}

impl OrderingKey {
    pub fn new(kind: OrderKind) -> Self {
        Self {
            kind,
            rank: kind.rank(),
        }
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn rank(&self) -> u16 {
        self.rank
    }
}

impl Ord for OrderingKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.kind.name().cmp(other.kind.name()))
    }
}

impl PartialOrd for OrderingKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<OrderKind> for OrderingKey {
    fn from(kind: OrderKind) -> Self {
        OrderingKey::new(kind)
    }
}
