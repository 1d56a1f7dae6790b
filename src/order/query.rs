use crate::db::ServerInfo;

/// Largest row count SQL Server accepts in one `VALUES` list.
pub const MAX_INSERT_ROWS: usize = 1000;

/// Temp-table catalog queries that return `(referencer, referenced)` id pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyQuery {
    /// `sys.sql_expression_dependencies` (2008+), optionally with the
    /// system-versioned current/history pairs.
    ExpressionDependencies { temporal: bool },
    /// `sys.sql_dependencies` (2005).
    SqlDependencies,
    /// `dbo.sysdepends` (2000).
    SysDepends,
    /// `sys.foreign_key_columns` (2005+).
    ForeignKeyColumns,
    /// `dbo.sysreferences` (2000).
    SysReferences,
}

impl DependencyQuery {
    /// Dependencies between routines, views and tables.
    pub fn schema_bound(info: &ServerInfo) -> Self {
        if info.supports_temporal() {
            DependencyQuery::ExpressionDependencies { temporal: true }
        } else if info.major_version > 9 {
            DependencyQuery::ExpressionDependencies { temporal: false }
        } else if info.major_version > 8 {
            DependencyQuery::SqlDependencies
        } else {
            DependencyQuery::SysDepends
        }
    }

    /// Foreign-key dependencies between tables, for data-only scripts.
    pub fn table_data(info: &ServerInfo) -> Self {
        if info.major_version > 8 {
            DependencyQuery::ForeignKeyColumns
        } else {
            DependencyQuery::SysReferences
        }
    }

    /// Query text; reads candidates from `#tempordering`.
    pub fn temp_table_text(self) -> &'static str {
        match self {
            DependencyQuery::ExpressionDependencies { temporal: true } => {
                "select dep.referencing_id, dep.referenced_id from sys.sql_expression_dependencies as dep \
join #tempordering as t1 on dep.referenced_id = t1.ID \
join #tempordering as t2 on dep.referencing_id = t2.ID \
where dep.referenced_id != dep.referencing_id \
UNION select tbl.[object_id], tbl.[history_table_id] from sys.tables as tbl \
join #tempordering as t1 on tbl.[history_table_id] = t1.ID \
join #tempordering as t2 on tbl.[object_id] = t2.ID \
where tbl.[temporal_type] = 2"
            }
            DependencyQuery::ExpressionDependencies { temporal: false } => {
                "select dep.referencing_id, dep.referenced_id from sys.sql_expression_dependencies as dep \
join #tempordering as t1 on dep.referenced_id = t1.ID \
join #tempordering as t2 on dep.referencing_id = t2.ID \
where dep.referenced_id != dep.referencing_id"
            }
            DependencyQuery::SqlDependencies => {
                "select dep.object_id, dep.referenced_major_id from sys.sql_dependencies as dep \
join #tempordering as t1 on dep.referenced_major_id = t1.ID \
join #tempordering as t2 on dep.object_id = t2.ID \
where dep.referenced_major_id != dep.object_id"
            }
            DependencyQuery::SysDepends => {
                "select dep.id, dep.depid from dbo.sysdepends as dep \
join #tempordering as t1 on dep.depid = t1.ID \
join #tempordering as t2 on dep.id = t2.ID \
where dep.depid != dep.id"
            }
            DependencyQuery::ForeignKeyColumns => {
                "select fk.parent_object_id, fk.referenced_object_id from sys.foreign_key_columns as fk \
join #tempordering as t1 on fk.referenced_object_id = t1.ID \
join #tempordering as t2 on fk.parent_object_id = t2.ID \
where fk.referenced_object_id != fk.parent_object_id"
            }
            DependencyQuery::SysReferences => {
                "select fk.fkeyid, fk.rkeyid from dbo.sysreferences as fk \
join #tempordering as t1 on fk.rkeyid = t1.ID \
join #tempordering as t2 on fk.fkeyid = t2.ID \
where fk.rkeyid != fk.fkeyid"
            }
        }
    }
}

/// Single statement for assembly ordering; ids are inlined.
pub fn assembly_references(ids: &[i32]) -> String {
    let list = id_list(ids);
    format!(
        "select assembly_id, referenced_assembly_id from sys.assembly_references \
where assembly_id in ({list}) and referenced_assembly_id in ({list})"
    )
}

/// Single statement ordering database roles by owning role; ids are inlined.
pub fn role_owners(ids: &[i32]) -> String {
    let list = id_list(ids);
    format!(
        "select principal_id, owning_principal_id from sys.database_principals \
where principal_id in ({list}) and owning_principal_id in ({list})"
    )
}

fn id_list(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// The statement sequence that loads candidate ids into a temp table, runs a
/// dependency query against it and drops it again.
pub struct TempTableBatch;

impl TempTableBatch {
    pub fn build(ids: &[i32], query: DependencyQuery, info: &ServerInfo) -> Vec<String> {
        let chunk = if info.supports_multi_row_insert() {
            MAX_INSERT_ROWS
        } else {
            1
        };
        let mut statements = Vec::with_capacity(ids.len() / chunk + 4);
        if info.is_sql_dw() {
            statements.push("create table #tempordering(ID int)".to_string());
        } else {
            statements.push("create table #tempordering(ID int primary key)".to_string());
        }
        for group in ids.chunks(chunk) {
            let values = group
                .iter()
                .map(|id| format!("({})", id))
                .collect::<Vec<_>>()
                .join(",");
            statements.push(format!("insert into #tempordering(ID) values {}", values));
        }
        statements.push(query.temp_table_text().to_string());
        statements.push("drop table #tempordering".to_string());
        statements
    }
}
