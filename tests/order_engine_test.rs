mod common;

use std::collections::{HashMap, HashSet};

use common::{MockCatalog, database, in_db, position, repository, table, with_id};
use indexmap::IndexMap;
use sqlorder::db::DependencyRow;
use sqlorder::error::{ErrorKind, classify_error};
use sqlorder::model::{
    EntityMetadata, ForeignKeyRef, NothingInCreation, PhaseTag, ScriptBehavior,
    ScriptingOptions, Urn,
};
use sqlorder::order::{FoldReason, Orderer, ScriptOrder, topo};

fn order_with(
    catalog: &mut MockCatalog,
    repo: &HashMap<Urn, EntityMetadata>,
    options: ScriptingOptions,
    urns: &[Urn],
) -> anyhow::Result<ScriptOrder> {
    Orderer::new(catalog, repo, &NothingInCreation, options).order(urns)
}

fn data_only() -> ScriptingOptions {
    ScriptingOptions {
        include_ddl: false,
        include_data: true,
        ..ScriptingOptions::default()
    }
}

fn index(index_type: &str, key: Option<&str>) -> EntityMetadata {
    EntityMetadata {
        index_type: Some(index_type.to_string()),
        index_key_type: key.map(String::from),
        ..EntityMetadata::default()
    }
}

/// Linear congruential generator so graph shapes are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

#[test]
fn sorter_places_dependencies_first_on_random_dags() {
    let mut rng = Lcg(7);
    for _ in 0..50 {
        let size = (rng.next() % 30 + 1) as usize;
        // nodes in shuffled insertion order; edges only point to lower numbers
        let mut nodes: Vec<usize> = (0..size).collect();
        for i in (1..size).rev() {
            let j = (rng.next() as usize) % (i + 1);
            nodes.swap(i, j);
        }
        let mut graph: IndexMap<usize, Vec<usize>> = IndexMap::new();
        for node in &nodes {
            let deps = (0..*node).filter(|_| rng.next() % 4 == 0).collect();
            graph.insert(*node, deps);
        }

        let order = topo::sort(&graph).expect("acyclic graph sorts");
        assert_eq!(order.len(), size);
        let unique: HashSet<&usize> = order.iter().collect();
        assert_eq!(unique.len(), size);
        let at: HashMap<usize, usize> = order.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        for (node, deps) in &graph {
            for dep in deps {
                assert!(at[dep] < at[node], "{} should precede {}", dep, node);
            }
        }
    }
}

#[test]
fn lone_table_needs_no_catalog() {
    let t = table("orders");
    let mut catalog = MockCatalog::new();
    let options = ScriptingOptions {
        include_data: true,
        ..ScriptingOptions::default()
    };
    let order = order_with(&mut catalog, &HashMap::new(), options, &[t.clone()]).unwrap();

    assert_eq!(order.urns, vec![t.clone(), t.with_phase(PhaseTag::Data)]);
    assert!(catalog.calls.is_empty());
    assert_eq!(catalog.server_info_calls, 0);
}

#[test]
fn repeated_input_counts_once() {
    let t = table("orders");
    let mut catalog = MockCatalog::new();
    let order = order_with(
        &mut catalog,
        &HashMap::new(),
        ScriptingOptions::default(),
        &[t.clone(), t.clone()],
    )
    .unwrap();

    assert_eq!(order.urns, vec![t]);
    assert!(catalog.calls.is_empty());
}

#[test]
fn data_only_follows_foreign_keys() {
    let (a, b, c) = (table("a"), table("b"), table("c"));
    let repo = repository(&[(&a, with_id(1)), (&b, with_id(2)), (&c, with_id(3))]);
    // a references b, b references c
    let mut catalog =
        MockCatalog::with_rows(vec![DependencyRow::new(1, 2), DependencyRow::new(2, 3)]);

    let order = order_with(&mut catalog, &repo, data_only(), &[a.clone(), b.clone(), c.clone()])
        .unwrap();

    assert_eq!(
        order.urns,
        vec![
            c.with_phase(PhaseTag::Data),
            b.with_phase(PhaseTag::Data),
            a.with_phase(PhaseTag::Data),
        ]
    );
    assert_eq!(catalog.server_info_calls, 1);
    let batches = catalog.batches();
    assert_eq!(batches.len(), 1);
    let batch = batches[0];
    assert!(batch[0].starts_with("create table #tempordering"));
    assert!(batch.iter().any(|s| s.contains("sys.foreign_key_columns")));
    assert_eq!(batch.last().map(String::as_str), Some("drop table #tempordering"));
}

#[test]
fn data_only_ignores_everything_but_tables() {
    let v = in_db("View", "recent");
    let mut catalog = MockCatalog::new();
    let order = order_with(&mut catalog, &HashMap::new(), data_only(), &[v]).unwrap();
    assert!(order.urns.is_empty());
    assert!(catalog.calls.is_empty());
}

#[test]
fn foreign_key_cycle_is_an_error() {
    let (a, b) = (table("a"), table("b"));
    let repo = repository(&[(&a, with_id(1)), (&b, with_id(2))]);
    let mut catalog =
        MockCatalog::with_rows(vec![DependencyRow::new(1, 2), DependencyRow::new(2, 1)]);

    let err = order_with(&mut catalog, &repo, data_only(), &[a, b]).unwrap_err();
    assert_eq!(classify_error(&err), ErrorKind::Cycle);
    assert!(err.to_string().contains("@Name='a'"));
}

#[test]
fn ordering_is_repeatable() {
    let (a, b, c) = (table("a"), table("b"), table("c"));
    let v = in_db("View", "summary");
    let repo = repository(&[
        (&a, with_id(1)),
        (&b, with_id(2)),
        (&c, with_id(3)),
        (&v, with_id(4)),
    ]);
    let input = vec![v.clone(), c.clone(), a.clone(), b.clone()];
    let rows = vec![DependencyRow::new(4, 1), DependencyRow::new(1, 3)];
    let options = ScriptingOptions {
        include_data: true,
        ..ScriptingOptions::default()
    };

    let mut first = MockCatalog::with_rows(rows.clone());
    let mut second = MockCatalog::with_rows(rows);
    let one = order_with(&mut first, &repo, options.clone(), &input).unwrap();
    let two = order_with(&mut second, &repo, options, &input).unwrap();
    assert_eq!(one, two);
    assert!(position(&one.urns, &c) < position(&one.urns, &a));
    assert!(position(&one.urns, &a) < position(&one.urns, &v));
}

#[test]
fn create_places_data_before_foreign_keys() {
    let (a, b) = (table("a"), table("b"));
    let fk = a.child("ForeignKey", "fk_a_b");
    let repo = repository(&[(&a, with_id(1)), (&b, with_id(2))]);
    let mut catalog = MockCatalog::new();
    let options = ScriptingOptions {
        include_data: true,
        ..ScriptingOptions::default()
    };

    let order = order_with(&mut catalog, &repo, options, &[fk.clone(), a.clone(), b.clone()])
        .unwrap();

    assert_eq!(
        order.urns,
        vec![
            a.clone(),
            b.clone(),
            a.with_phase(PhaseTag::Data),
            b.with_phase(PhaseTag::Data),
            fk,
        ]
    );
}

#[test]
fn history_table_precedes_temporal_table() {
    let current = table("orders");
    let history = table("orders_history");
    let repo = repository(&[(&current, with_id(1)), (&history, with_id(2))]);
    let mut catalog = MockCatalog::with_rows(vec![DependencyRow::new(1, 2)]);

    let order = order_with(
        &mut catalog,
        &repo,
        ScriptingOptions::default(),
        &[current.clone(), history.clone()],
    )
    .unwrap();

    assert_eq!(order.urns, vec![history, current]);
    let batches = catalog.batches();
    assert_eq!(batches.len(), 1);
    assert!(batches[0].iter().any(|s| s.contains("history_table_id")));
}

#[test]
fn no_temporal_support_leaves_tables_alone() {
    let (a, b) = (table("a"), table("b"));
    let mut catalog = MockCatalog::new();
    catalog.info = sqlorder::db::ServerInfo::new(12, sqlorder::db::EngineEdition::Standalone);

    let order = order_with(
        &mut catalog,
        &HashMap::new(),
        ScriptingOptions::default(),
        &[a.clone(), b.clone()],
    )
    .unwrap();

    assert_eq!(order.urns, vec![a, b]);
    assert_eq!(catalog.server_info_calls, 1);
    assert!(catalog.calls.is_empty());
}

#[test]
fn views_follow_what_they_select_from() {
    let (v1, v2) = (in_db("View", "v1"), in_db("View", "v2"));
    let repo = repository(&[(&v1, with_id(10)), (&v2, with_id(11))]);
    let mut catalog = MockCatalog::with_rows(vec![DependencyRow::new(10, 11)]);

    let order = order_with(
        &mut catalog,
        &repo,
        ScriptingOptions::default(),
        &[v1.clone(), v2.clone()],
    )
    .unwrap();

    assert_eq!(order.urns, vec![v2, v1]);
    assert_eq!(catalog.server_info_calls, 1);
}

#[test]
fn drop_reattaches_table_foreign_keys_once() {
    let (a, b) = (table("a"), table("b"));
    let fk = a.child("ForeignKey", "fk_a_b");
    let file_fk = a.child("ForeignKey", "fk_file");
    let mut meta = with_id(1);
    meta.foreign_keys = vec![
        ForeignKeyRef {
            urn: fk.clone(),
            file_table_defined: false,
        },
        ForeignKeyRef {
            urn: file_fk.clone(),
            file_table_defined: true,
        },
    ];
    let repo = repository(&[(&a, meta), (&b, with_id(2))]);
    let mut catalog = MockCatalog::new();
    let options = ScriptingOptions {
        behavior: ScriptBehavior::DROP,
        ..ScriptingOptions::default()
    };

    let order = order_with(&mut catalog, &repo, options, &[a.clone(), fk.clone(), b.clone()])
        .unwrap();

    assert_eq!(order.urns.iter().filter(|u| **u == fk).count(), 1);
    assert!(!order.urns.contains(&file_fk));
    assert_eq!(order.urns.len(), 3);
}

#[test]
fn clustered_indexes_follow_their_table() {
    let (a, c) = (table("a"), table("c"));
    let cx_a = a.child("Index", "cx_a");
    let nx_a = a.child("Index", "nx_a");
    let pk_a = a.child("Index", "pk_a");
    let cx_gone = table("gone").child("Index", "cx_gone");
    let repo = repository(&[
        (&a, with_id(1)),
        (&c, with_id(3)),
        (&cx_a, index("clustered", None)),
        (&nx_a, index("nonClustered", None)),
        (&pk_a, index("clustered", Some("primaryKey"))),
        (&cx_gone, index("clustered", None)),
    ]);
    let mut catalog = MockCatalog::new();

    let order = order_with(
        &mut catalog,
        &repo,
        ScriptingOptions::default(),
        &[
            cx_gone.clone(),
            nx_a.clone(),
            a.clone(),
            cx_a.clone(),
            pk_a.clone(),
            c.clone(),
        ],
    )
    .unwrap();

    assert_eq!(order.urns, vec![a.clone(), cx_a, c, nx_a, cx_gone]);
    assert_eq!(order.folded.len(), 1);
    assert_eq!(order.folded[0].owner, a);
    assert_eq!(order.folded[0].member, pk_a);
    assert_eq!(order.folded[0].reason, FoldReason::KeyIndex);
}

#[test]
fn security_phases_run_object_associations_ownership_permissions() {
    let login = Urn::root("Server", "srv").child("Login", "app");
    let user = in_db("User", "app");
    let role = in_db("Role", "readers");
    let mut catalog = MockCatalog::new();
    let options = ScriptingOptions {
        include_associations: true,
        include_owner: true,
        include_permissions: true,
        ..ScriptingOptions::default()
    };

    let order = order_with(
        &mut catalog,
        &HashMap::new(),
        options,
        &[role.clone(), user.clone(), login.clone()],
    )
    .unwrap();

    assert_eq!(
        order.urns,
        vec![
            login.with_phase(PhaseTag::Object),
            login.with_phase(PhaseTag::Associations),
            login.with_phase(PhaseTag::Permission),
            user.with_phase(PhaseTag::Object),
            role.with_phase(PhaseTag::Object),
            user.with_phase(PhaseTag::Associations),
            role.with_phase(PhaseTag::Associations),
            role.with_phase(PhaseTag::Ownership),
            user.with_phase(PhaseTag::Permission),
            role.with_phase(PhaseTag::Permission),
        ]
    );
    assert!(catalog.calls.is_empty());
}

#[test]
fn database_roles_follow_their_owners() {
    let (r1, r2) = (in_db("Role", "r1"), in_db("Role", "r2"));
    let repo = repository(&[(&r1, with_id(5)), (&r2, with_id(6))]);
    // r1 is owned by r2
    let mut catalog = MockCatalog::with_rows(vec![DependencyRow::new(5, 6)]);

    let order = order_with(
        &mut catalog,
        &repo,
        ScriptingOptions::default(),
        &[r1.clone(), r2.clone()],
    )
    .unwrap();

    assert_eq!(order.urns, vec![r2, r1]);
    assert_eq!(catalog.calls.len(), 1);
    match &catalog.calls[0] {
        common::Call::Query { database, statement } => {
            assert_eq!(database, "sales");
            assert!(statement.contains("sys.database_principals"));
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[test]
fn cyclic_role_ownership_is_an_error() {
    let roles: Vec<Urn> = ["r1", "r2", "r3"].iter().map(|n| in_db("Role", n)).collect();
    let repo = repository(&[
        (&roles[0], with_id(1)),
        (&roles[1], with_id(2)),
        (&roles[2], with_id(3)),
    ]);
    let mut catalog = MockCatalog::with_rows(vec![
        DependencyRow::new(1, 2),
        DependencyRow::new(2, 3),
        DependencyRow::new(3, 1),
    ]);

    let err = order_with(&mut catalog, &repo, ScriptingOptions::default(), &roles).unwrap_err();
    assert_eq!(classify_error(&err), ErrorKind::Cycle);
}

#[test]
fn ddl_triggers_get_enable_and_disable_phases() {
    let t1 = in_db("DdlTrigger", "audit_ddl");
    let t2 = in_db("DdlTrigger", "block_drop");
    let mut catalog = MockCatalog::new();
    let options = ScriptingOptions {
        behavior: ScriptBehavior::CREATE | ScriptBehavior::DROP,
        ..ScriptingOptions::default()
    };

    let order = order_with(
        &mut catalog,
        &HashMap::new(),
        options,
        &[t1.clone(), t2.clone()],
    )
    .unwrap();

    assert_eq!(
        order.urns,
        vec![
            t1.with_phase(PhaseTag::Object),
            t2.with_phase(PhaseTag::Object),
            t1.with_phase(PhaseTag::DatabaseDdlTriggerEnable),
            t2.with_phase(PhaseTag::DatabaseDdlTriggerEnable),
            t1.with_phase(PhaseTag::DatabaseDdlTriggerDisable),
            t2.with_phase(PhaseTag::DatabaseDdlTriggerDisable),
        ]
    );
}

#[test]
fn lone_database_gets_read_only_phase() {
    let db = database("sales");
    let mut catalog = MockCatalog::new();
    let order = order_with(
        &mut catalog,
        &HashMap::new(),
        ScriptingOptions::default(),
        &[db.clone()],
    )
    .unwrap();
    assert_eq!(order.urns, vec![db.clone(), db.with_phase(PhaseTag::DatabaseReadOnly)]);
}

#[test]
fn catalog_failures_propagate() {
    let (a, b) = (table("a"), table("b"));
    let repo = repository(&[(&a, with_id(1)), (&b, with_id(2))]);
    let mut catalog = MockCatalog::failing();

    let err = order_with(&mut catalog, &repo, data_only(), &[a, b]).unwrap_err();
    assert_eq!(classify_error(&err), ErrorKind::Query);
}

#[test]
fn missing_catalog_id_is_a_config_error() {
    let (v1, v2) = (in_db("View", "v1"), in_db("View", "v2"));
    let repo = repository(&[(&v1, with_id(10))]);
    let mut catalog = MockCatalog::new();

    let err = order_with(&mut catalog, &repo, ScriptingOptions::default(), &[v1, v2])
        .unwrap_err();
    assert_eq!(classify_error(&err), ErrorKind::Config);
    assert!(err.to_string().contains("v2"));
}

#[test]
fn design_mode_embeds_lone_table_constraints() {
    let t = table("orders");
    let fk = t.child("ForeignKey", "fk_customer");
    let check = t.child("Check", "ck_total");
    let mut catalog = MockCatalog::new();
    let options = ScriptingOptions {
        design_mode: true,
        ..ScriptingOptions::default()
    };

    let order = order_with(
        &mut catalog,
        &repository(&[(&t, with_id(1))]),
        options,
        &[t.clone(), fk.clone(), check.clone()],
    )
    .unwrap();

    assert_eq!(order.urns, vec![t.clone()]);
    let members: Vec<&Urn> = order.folded.iter().map(|f| &f.member).collect();
    assert_eq!(members, vec![&fk, &check]);
    assert!(order
        .folded
        .iter()
        .all(|f| f.owner == t && f.reason == FoldReason::EmbeddedConstraint));
    assert!(catalog.calls.is_empty());
}

#[test]
fn assemblies_follow_the_assemblies_they_reference() {
    let base = in_db("SqlAssembly", "base");
    let ext = in_db("SqlAssembly", "ext");
    let repo = repository(&[(&base, with_id(65536)), (&ext, with_id(65537))]);
    let mut catalog = MockCatalog::with_rows(vec![DependencyRow::new(65537, 65536)]);

    let order = order_with(
        &mut catalog,
        &repo,
        ScriptingOptions::default(),
        &[ext.clone(), base.clone()],
    )
    .unwrap();

    assert_eq!(order.urns, vec![base, ext]);
    assert_eq!(catalog.server_info_calls, 0);
    assert!(matches!(
        &catalog.calls[..],
        [common::Call::Query { statement, .. }] if statement.contains("sys.assembly_references")
    ));
}

fn filestream_table(id: i32) -> EntityMetadata {
    EntityMetadata {
        filestream: true,
        ..with_id(id)
    }
}

fn with_filestream_data() -> ScriptingOptions {
    ScriptingOptions {
        include_data: true,
        include_filestream: true,
        ..ScriptingOptions::default()
    }
}

#[test]
fn filestream_key_index_folds_into_present_table() {
    let (fs, b) = (table("documents"), table("b"));
    let pk = fs.child("Index", "pk_documents");
    let repo = repository(&[
        (&fs, filestream_table(1)),
        (&b, with_id(2)),
        (&pk, index("clustered", Some("primaryKey"))),
    ]);
    let mut catalog = MockCatalog::new();

    let order = order_with(
        &mut catalog,
        &repo,
        with_filestream_data(),
        &[fs.clone(), b.clone(), pk.clone()],
    )
    .unwrap();

    assert!(!order.urns.contains(&pk));
    assert!(order.urns.contains(&fs));
    assert_eq!(order.folded.len(), 1);
    assert_eq!(order.folded[0].owner, fs);
    assert_eq!(order.folded[0].member, pk);
    assert_eq!(order.folded[0].reason, FoldReason::FilestreamKeyIndex);
}

#[test]
fn filestream_key_index_of_absent_table_keeps_its_position() {
    let (fs, b) = (table("documents"), table("b"));
    let pk = fs.child("Index", "pk_documents");
    let repo = repository(&[
        (&fs, filestream_table(1)),
        (&b, with_id(2)),
        (&pk, index("clustered", Some("primaryKey"))),
    ]);
    let mut catalog = MockCatalog::new();

    let order = order_with(&mut catalog, &repo, with_filestream_data(), &[b.clone(), pk.clone()])
        .unwrap();

    assert_eq!(order.urns, vec![b.clone(), b.with_phase(PhaseTag::Data), pk]);
    assert!(order.folded.is_empty());
    assert!(catalog.calls.is_empty());
}

#[test]
fn create_orders_referenced_table_first() {
    let (t1, t2) = (table("t1"), table("t2"));
    let repo = repository(&[(&t1, with_id(1)), (&t2, with_id(2))]);
    // t2 references t1
    let mut catalog = MockCatalog::with_rows(vec![DependencyRow::new(2, 1)]);

    let order = order_with(
        &mut catalog,
        &repo,
        ScriptingOptions::default(),
        &[t2.clone(), t1.clone()],
    )
    .unwrap();

    assert_eq!(order.urns, vec![t1, t2]);
    assert_eq!(catalog.batches().len(), 1);
}
