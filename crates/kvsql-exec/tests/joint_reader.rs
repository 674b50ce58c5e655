//! Joint row reader against a populated store: construction rules, lookup
//! semantics, resource release, and snapshot behaviour.

mod common;

use std::sync::Arc;

use common::{Shop, drain, int, text};
use kvsql_catalog::CatalogView;
use kvsql_error::KvSqlError;
use kvsql_exec::{
    ConditionalRowReader, DataSource, Engine, EngineOptions, Expr, JoinSpec, JoinStats, JoinType,
    JointRowReader, Params, RowReader, TableRef, ValuesSource,
};
use kvsql_types::{ColSelector, EncodingMode, SqlType, TypedValue, encode_value};

fn on(left: (&str, &str), right: (&str, &str)) -> Expr {
    Expr::cols_eq(
        ColSelector::qualified(left.0, left.1),
        ColSelector::qualified(right.0, right.1),
    )
}

fn customers_as_c() -> JoinSpec {
    JoinSpec::inner(
        TableRef::new("customers").aliased("c"),
        on(("o", "customer_id"), ("c", "id")),
    )
}

fn join_orders(shop: &Shop, joins: Vec<JoinSpec>) -> JointRowReader {
    let snapshot = shop.engine.snapshot();
    JointRowReader::builder(&shop.engine)
        .base(shop.scan("orders", "o", &snapshot))
        .snapshot(snapshot)
        .joins(joins)
        .build()
        .expect("build joint reader")
}

// ─── Lookup semantics ──────────────────────────────────────────────────

#[test]
fn dangling_foreign_keys_are_dropped() {
    let shop = Shop::new();
    shop.customer(1, "ann", None);
    shop.customer(3, "cy", None);
    shop.order(10, 1, 100);
    shop.order(11, 2, 200);
    shop.order(12, 3, 300);

    let mut reader = join_orders(&shop, vec![customers_as_c()]);
    let rows = drain(&mut reader);

    assert_eq!(rows.len(), 2);
    assert_eq!(int(&rows[0], "(shop.o.id)"), 10);
    assert_eq!(text(&rows[0], "(shop.c.name)"), "ann");
    assert_eq!(int(&rows[1], "(shop.o.id)"), 12);
    assert_eq!(int(&rows[1], "(shop.c.id)"), 3);
    assert_eq!(text(&rows[1], "(shop.c.name)"), "cy");
    assert_eq!(reader.stats().dangling_skipped, 1);
    reader.close().expect("close");
}

#[test]
fn chained_joins_reference_earlier_joins() {
    let shop = Shop::new();
    shop.country("PT", "Portugal");
    shop.customer(1, "ann", Some("PT"));
    shop.customer(2, "bo", Some("XX"));
    shop.customer(3, "cy", None);
    shop.order(10, 1, 100);
    shop.order(11, 2, 200);
    shop.order(12, 3, 300);

    let countries = JoinSpec::inner(
        TableRef::new("countries").aliased("k"),
        on(("c", "country"), ("k", "code")),
    );
    let mut reader = join_orders(&shop, vec![customers_as_c(), countries]);
    let rows = drain(&mut reader);

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(int(row, "(shop.o.id)"), 10);
    assert_eq!(text(row, "(shop.c.name)"), "ann");
    assert_eq!(text(row, "(shop.k.name)"), "Portugal");
    assert_eq!(row.len(), 4 + 3 + 2);

    // Order 11 misses at the second join, order 12 has a NULL country.
    assert_eq!(
        reader.stats(),
        JoinStats {
            base_rows: 3,
            lookups: 6,
            dangling_skipped: 2,
            rows_emitted: 1,
        }
    );
    reader.close().expect("close");
}

#[test]
fn later_join_wins_on_selector_collision() {
    let shop = Shop::new();
    shop.customer(1, "ann", None);
    shop.customer(2, "bo", None);
    shop.referred_order(10, 1, 2, 100);

    let referrer = JoinSpec::inner(
        TableRef::new("customers").aliased("c"),
        on(("o", "referrer_id"), ("c", "id")),
    );
    let mut reader = join_orders(&shop, vec![customers_as_c(), referrer]);
    let rows = drain(&mut reader);

    assert_eq!(rows.len(), 1);
    assert_eq!(int(&rows[0], "(shop.c.id)"), 2);
    assert_eq!(text(&rows[0], "(shop.c.name)"), "bo");
    reader.close().expect("close");
}

#[test]
fn self_join_under_distinct_aliases() {
    let shop = Shop::new();
    shop.employee(1, "boss", None);
    shop.employee(2, "ann", Some(1));
    shop.employee(3, "bob", Some(2));

    let snapshot = shop.engine.snapshot();
    let mut reader = JointRowReader::builder(&shop.engine)
        .base(shop.scan("employees", "e", &snapshot))
        .snapshot(snapshot)
        .join(JoinSpec::inner(
            TableRef::new("employees").aliased("m"),
            on(("e", "manager_id"), ("m", "id")),
        ))
        .build()
        .expect("build");

    let pairs: Vec<(String, String)> = drain(&mut reader)
        .iter()
        .map(|r| (text(r, "(shop.e.name)"), text(r, "(shop.m.name)")))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("ann".to_owned(), "boss".to_owned()),
            ("bob".to_owned(), "ann".to_owned()),
        ]
    );
    reader.close().expect("close");
}

#[test]
fn literal_rows_can_drive_a_join() {
    let shop = Shop::new();
    shop.customer(1, "ann", None);
    shop.customer(2, "bo", None);

    let values = ValuesSource::new(
        "v",
        vec![("cid".to_owned(), SqlType::Integer)],
        vec![
            vec![TypedValue::Integer(2)],
            vec![TypedValue::Integer(7)],
            vec![TypedValue::Integer(1)],
        ],
    );
    let snapshot = shop.engine.snapshot();
    let base = values
        .resolve(&shop.engine, &snapshot, &Params::new(), None)
        .expect("values reader");

    let mut reader = JointRowReader::builder(&shop.engine)
        .base(base)
        .snapshot(snapshot)
        .join(JoinSpec::inner(
            TableRef::new("customers").aliased("c"),
            on(("v", "cid"), ("c", "id")),
        ))
        .build()
        .expect("build");

    let names: Vec<String> = drain(&mut reader)
        .iter()
        .map(|r| text(r, "(shop.c.name)"))
        .collect();
    assert_eq!(names, vec!["bo".to_owned(), "ann".to_owned()]);
    reader.close().expect("close");
}

#[test]
fn filter_over_joined_columns_with_params() {
    let shop = Shop::new();
    shop.country("PT", "Portugal");
    shop.country("ES", "Spain");
    shop.customer(1, "ann", Some("PT"));
    shop.customer(2, "bo", Some("ES"));
    shop.order(10, 1, 100);
    shop.order(11, 2, 200);
    shop.order(12, 1, 300);

    let countries = JoinSpec::inner(
        TableRef::new("countries").aliased("k"),
        on(("c", "country"), ("k", "code")),
    );
    let joint = join_orders(&shop, vec![customers_as_c(), countries]);
    let cond = Expr::equal(
        Expr::col(ColSelector::qualified("k", "code")),
        Expr::param("country"),
    );
    let mut reader =
        ConditionalRowReader::new(joint, cond, Params::new().with("COUNTRY", "PT"));

    let ids: Vec<i64> = drain(&mut reader)
        .iter()
        .map(|r| int(r, "(shop.o.id)"))
        .collect();
    assert_eq!(ids, vec![10, 12]);
    reader.close().expect("close");
}

// ─── Construction rules ────────────────────────────────────────────────

#[test]
fn join_kind_is_checked_before_any_table_resolution() {
    let shop = Shop::new();
    let snapshot = shop.engine.snapshot();
    let base = shop.scan("orders", "o", &snapshot);
    let before = shop.catalog.resolutions();

    for kind in [JoinType::Left, JoinType::Right] {
        let mut outer = customers_as_c();
        outer.join_type = kind;
        let built = JointRowReader::builder(&shop.engine)
            .base(shop.scan("orders", "o", &snapshot))
            .snapshot(snapshot.clone())
            .join(customers_as_c())
            .join(outer)
            .build();
        assert!(matches!(built, Err(KvSqlError::UnsupportedJoinType)));
    }
    // Only the two base scans resolved anything.
    assert_eq!(shop.catalog.resolutions(), before + 2);

    // Missing tables are not even looked up when a kind is unsupported.
    let mut missing = JoinSpec::inner(TableRef::new("nope"), Expr::value(true));
    missing.join_type = JoinType::Left;
    let built = JointRowReader::builder(&shop.engine)
        .base(base)
        .snapshot(snapshot)
        .join(missing)
        .build();
    assert!(matches!(built, Err(KvSqlError::UnsupportedJoinType)));
}

#[test]
fn derived_sources_cannot_be_joined() {
    let shop = Shop::new();
    let snapshot = shop.engine.snapshot();
    let values = ValuesSource::new(
        "v",
        vec![("id".to_owned(), SqlType::Integer)],
        vec![vec![TypedValue::Integer(1)]],
    );
    let built = JointRowReader::builder(&shop.engine)
        .base(shop.scan("orders", "o", &snapshot))
        .snapshot(snapshot)
        .join(JoinSpec::inner(values, on(("o", "customer_id"), ("v", "id"))))
        .build();
    let err = built.expect_err("values source accepted as join");
    assert!(matches!(err, KvSqlError::LimitedJoins));
    assert!(err.is_join_error());
}

#[test]
fn non_key_condition_fails_on_first_read() {
    let shop = Shop::new();
    shop.customer(1, "ann", None);
    shop.order(10, 1, 100);

    let by_name = JoinSpec::inner(
        TableRef::new("customers").aliased("c"),
        on(("o", "customer_id"), ("c", "name")),
    );
    let mut reader = join_orders(&shop, vec![by_name]);
    assert!(matches!(reader.read(), Err(KvSqlError::InvalidJoinColumn)));
    reader.close().expect("close");

    let unknown_fk = JoinSpec::inner(
        TableRef::new("customers").aliased("c"),
        on(("o", "buyer_id"), ("c", "id")),
    );
    let mut reader = join_orders(&shop, vec![unknown_fk]);
    assert!(matches!(reader.read(), Err(KvSqlError::InvalidJoinColumn)));
    reader.close().expect("close");
}

#[test]
fn earlier_joins_cannot_reference_later_joins() {
    let shop = Shop::new();
    shop.country("PT", "Portugal");
    shop.customer(1, "ann", Some("PT"));
    shop.order(10, 1, 100);

    let countries = JoinSpec::inner(
        TableRef::new("countries").aliased("k"),
        on(("c", "country"), ("k", "code")),
    );
    let mut reader = join_orders(&shop, vec![countries, customers_as_c()]);
    assert!(matches!(reader.read(), Err(KvSqlError::InvalidJoinColumn)));
    reader.close().expect("close");

    let store = shop.engine.store().stats();
    assert_eq!(store.readers_opened, store.readers_closed);
}

#[test]
fn join_columns_match_case_exactly() {
    let shop = Shop::new();
    shop.customer(1, "ann", None);
    shop.order(10, 1, 100);

    let shouted = JoinSpec::inner(
        TableRef::new("customers").aliased("c"),
        on(("O", "customer_id"), ("C", "ID")),
    );
    let mut reader = join_orders(&shop, vec![shouted]);
    assert!(matches!(reader.read(), Err(KvSqlError::InvalidJoinColumn)));
    reader.close().expect("close");

    let mut reader = join_orders(&shop, vec![customers_as_c()]);
    assert_eq!(drain(&mut reader).len(), 1);
    reader.close().expect("close");
}

#[test]
fn join_table_resolution_errors_surface_verbatim() {
    let shop = Shop::new();
    let snapshot = shop.engine.snapshot();
    let built = JointRowReader::builder(&shop.engine)
        .base(shop.scan("orders", "o", &snapshot))
        .snapshot(snapshot)
        .join(JoinSpec::inner(
            TableRef::new("suppliers").aliased("s"),
            on(("o", "customer_id"), ("s", "id")),
        ))
        .build();
    match built {
        Err(KvSqlError::TableDoesNotExist(name)) => assert_eq!(name, "suppliers"),
        other => panic!("unexpected: {other:?}"),
    }

    let stats = shop.engine.store().stats();
    assert_eq!(stats.readers_opened, stats.readers_closed);
}

#[test]
fn columns_are_available_before_reading() {
    let shop = Shop::new();
    let mut reader = join_orders(&shop, vec![customers_as_c()]);
    let columns = reader.columns().expect("columns");

    let expected = [
        ("(shop.o.id)", SqlType::Integer),
        ("(shop.o.customer_id)", SqlType::Integer),
        ("(shop.o.referrer_id)", SqlType::Integer),
        ("(shop.o.amount)", SqlType::Integer),
        ("(shop.c.id)", SqlType::Integer),
        ("(shop.c.name)", SqlType::Varchar),
        ("(shop.c.country)", SqlType::Varchar),
    ];
    assert_eq!(columns.len(), expected.len());
    for (selector, ty) in expected {
        assert_eq!(columns.get(selector), Some(&ty), "{selector}");
    }
    assert_eq!(reader.implicit_db(), "shop");
    assert_eq!(reader.implicit_table(), "o");
    reader.close().expect("close");
}

// ─── Resources and scale ───────────────────────────────────────────────

#[test]
fn long_runs_of_dangling_keys_are_iterated() {
    const DANGLING: i64 = 100_000;

    let shop = Shop::new();
    shop.customer(1, "ann", None);
    let rows: Vec<Vec<(&str, TypedValue)>> = (0..DANGLING)
        .map(|id| {
            vec![
                ("id", TypedValue::Integer(id)),
                ("customer_id", TypedValue::Integer(-1)),
                ("amount", TypedValue::Integer(0)),
            ]
        })
        .collect();
    shop.engine.insert_rows(&shop.orders, &rows).expect("bulk insert");
    shop.order(DANGLING, 1, 42);

    let mut reader = join_orders(&shop, vec![customers_as_c()]);
    let row = reader.read().expect("read").expect("one match");
    assert_eq!(int(&row, "(shop.o.id)"), DANGLING);
    assert!(reader.read().expect("read").is_none());

    let stats = reader.stats();
    assert_eq!(stats.dangling_skipped, DANGLING as u64);
    assert_eq!(stats.rows_emitted, 1);
    reader.close().expect("close");
}

#[test]
fn sub_readers_are_closed_on_every_path() {
    let shop = Shop::new();
    shop.customer(1, "ann", None);
    shop.order(10, 1, 100);
    shop.order(11, 2, 200);
    shop.order(12, 3, 300);

    // Customer 3 is stored with an undecodable payload.
    let mut key = shop.engine.row_prefix(&shop.customers);
    key.extend(
        encode_value(&TypedValue::Integer(3), SqlType::Integer, EncodingMode::AsKey)
            .expect("encode"),
    );
    shop.engine
        .store()
        .commit(vec![(key, vec![0, 0, 0, 1, 0, 0])])
        .expect("commit");

    let mut reader = join_orders(&shop, vec![customers_as_c()]);
    assert!(reader.read().expect("hit").is_some());
    assert!(matches!(reader.read(), Err(KvSqlError::CorruptedData(_))));
    reader.close().expect("close");

    let stats = shop.engine.store().stats();
    // One base scan plus a lookup per order.
    assert_eq!(stats.readers_opened, 4);
    assert_eq!(stats.readers_closed, 4);
}

#[test]
fn closing_twice_is_rejected() {
    let shop = Shop::new();
    let mut reader = join_orders(&shop, vec![customers_as_c()]);
    assert!(reader.read().expect("read").is_none());
    reader.close().expect("close");
    assert!(matches!(reader.close(), Err(KvSqlError::AlreadyClosed)));
    assert!(matches!(reader.read(), Err(KvSqlError::AlreadyClosed)));
}

// ─── Snapshots and tenants ─────────────────────────────────────────────

#[test]
fn joins_see_only_their_snapshot() {
    let shop = Shop::new();
    shop.customer(1, "ann", None);
    shop.order(10, 1, 100);
    shop.order(11, 2, 200);
    let old = shop.engine.snapshot();

    shop.customer(2, "bo", None);

    let read_at = |snapshot: kvsql_store::Snapshot| {
        let mut reader = JointRowReader::builder(&shop.engine)
            .base(shop.scan("orders", "o", &snapshot))
            .snapshot(snapshot)
            .join(customers_as_c())
            .build()
            .expect("build");
        let ids: Vec<i64> = drain(&mut reader)
            .iter()
            .map(|r| int(r, "(shop.o.id)"))
            .collect();
        reader.close().expect("close");
        ids
    };

    assert_eq!(read_at(old), vec![10]);
    assert_eq!(read_at(shop.engine.snapshot()), vec![10, 11]);
}

#[test]
fn key_prefixes_isolate_engines_sharing_a_store() {
    let shop = Shop::with_options(EngineOptions::default().with_prefix(b"a/".to_vec()));
    let other = Engine::new(
        Arc::clone(shop.engine.store()),
        Arc::clone(&shop.catalog) as Arc<dyn CatalogView>,
        EngineOptions::default()
            .with_prefix(b"b/".to_vec())
            .with_default_database("shop"),
    )
    .expect("second engine");

    shop.customer(1, "ann", None);
    other
        .insert_row(
            &shop.orders,
            &[
                ("id", TypedValue::Integer(10)),
                ("customer_id", TypedValue::Integer(1)),
                ("amount", TypedValue::Integer(5)),
            ],
        )
        .expect("insert");

    let snapshot = other.snapshot();
    let base = TableRef::new("orders")
        .aliased("o")
        .resolve(&other, &snapshot, &Params::new(), None)
        .expect("scan");
    let mut reader = JointRowReader::builder(&other)
        .base(base)
        .snapshot(snapshot)
        .join(customers_as_c())
        .build()
        .expect("build");

    // The order lives under b/, its customer only under a/.
    assert!(reader.read().expect("read").is_none());
    assert_eq!(reader.stats().dangling_skipped, 1);
    reader.close().expect("close");
}
