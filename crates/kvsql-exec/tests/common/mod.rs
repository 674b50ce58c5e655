//! Shared fixtures for kvsql-exec integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kvsql_catalog::{Catalog, CatalogView, ColumnDef, Table};
use kvsql_error::Result;
use kvsql_exec::{DataSource, Engine, EngineOptions, Params, RowReader, TableRef};
use kvsql_store::{KvStore, Snapshot};
use kvsql_types::{Row, SqlType, TypedValue};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Catalog wrapper counting table resolutions.
#[derive(Debug, Default)]
pub struct CountingCatalog {
    pub inner: Catalog,
    resolutions: AtomicUsize,
}

impl CountingCatalog {
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

impl CatalogView for CountingCatalog {
    fn resolve_table(&self, db: &str, table: &str) -> Result<Arc<Table>> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_table(db, table)
    }
}

/// `shop` database with countries, customers, orders, and employees.
pub struct Shop {
    pub engine: Engine,
    pub catalog: Arc<CountingCatalog>,
    pub countries: Arc<Table>,
    pub customers: Arc<Table>,
    pub orders: Arc<Table>,
    pub employees: Arc<Table>,
}

impl Shop {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        init_tracing();
        let catalog = Arc::new(CountingCatalog::default());
        let store = KvStore::new();
        let engine = Engine::new(
            store,
            Arc::clone(&catalog) as Arc<dyn CatalogView>,
            options.with_default_database("shop"),
        )
        .expect("engine");
        Self::with_engine(engine, catalog)
    }

    /// Create the schema through `catalog` and use `engine` for rows.
    pub fn with_engine(engine: Engine, catalog: Arc<CountingCatalog>) -> Self {
        let cat = &catalog.inner;
        if !cat.database_exists("shop") {
            cat.create_database("shop").expect("create db");
        }
        let countries = cat
            .create_table(
                "shop",
                "countries",
                vec![
                    ColumnDef::new("code", SqlType::Varchar),
                    ColumnDef::new("name", SqlType::Varchar),
                ],
                "code",
            )
            .expect("countries");
        let customers = cat
            .create_table(
                "shop",
                "customers",
                vec![
                    ColumnDef::new("id", SqlType::Integer),
                    ColumnDef::new("name", SqlType::Varchar),
                    ColumnDef::new("country", SqlType::Varchar).nullable(),
                ],
                "id",
            )
            .expect("customers");
        let orders = cat
            .create_table(
                "shop",
                "orders",
                vec![
                    ColumnDef::new("id", SqlType::Integer),
                    ColumnDef::new("customer_id", SqlType::Integer).nullable(),
                    ColumnDef::new("referrer_id", SqlType::Integer).nullable(),
                    ColumnDef::new("amount", SqlType::Integer),
                ],
                "id",
            )
            .expect("orders");
        let employees = cat
            .create_table(
                "shop",
                "employees",
                vec![
                    ColumnDef::new("id", SqlType::Integer),
                    ColumnDef::new("name", SqlType::Varchar),
                    ColumnDef::new("manager_id", SqlType::Integer).nullable(),
                ],
                "id",
            )
            .expect("employees");

        Self {
            engine,
            catalog,
            countries,
            customers,
            orders,
            employees,
        }
    }

    pub fn country(&self, code: &str, name: &str) {
        self.engine
            .insert_row(&self.countries, &[("code", code.into()), ("name", name.into())])
            .expect("insert country");
    }

    pub fn customer(&self, id: i64, name: &str, country: Option<&str>) {
        let country = country.map_or(TypedValue::Null, TypedValue::from);
        self.engine
            .insert_row(
                &self.customers,
                &[
                    ("id", TypedValue::Integer(id)),
                    ("name", name.into()),
                    ("country", country),
                ],
            )
            .expect("insert customer");
    }

    pub fn order(&self, id: i64, customer_id: i64, amount: i64) {
        self.engine
            .insert_row(
                &self.orders,
                &[
                    ("id", TypedValue::Integer(id)),
                    ("customer_id", TypedValue::Integer(customer_id)),
                    ("amount", TypedValue::Integer(amount)),
                ],
            )
            .expect("insert order");
    }

    pub fn referred_order(&self, id: i64, customer_id: i64, referrer_id: i64, amount: i64) {
        self.engine
            .insert_row(
                &self.orders,
                &[
                    ("id", TypedValue::Integer(id)),
                    ("customer_id", TypedValue::Integer(customer_id)),
                    ("referrer_id", TypedValue::Integer(referrer_id)),
                    ("amount", TypedValue::Integer(amount)),
                ],
            )
            .expect("insert order");
    }

    pub fn employee(&self, id: i64, name: &str, manager_id: Option<i64>) {
        let manager = manager_id.map_or(TypedValue::Null, TypedValue::Integer);
        self.engine
            .insert_row(
                &self.employees,
                &[
                    ("id", TypedValue::Integer(id)),
                    ("name", name.into()),
                    ("manager_id", manager),
                ],
            )
            .expect("insert employee");
    }

    /// Full scan of `table` under `alias` at `snapshot`.
    pub fn scan(&self, table: &str, alias: &str, snapshot: &Snapshot) -> Box<dyn RowReader> {
        TableRef::new(table)
            .aliased(alias)
            .resolve(&self.engine, snapshot, &Params::new(), None)
            .expect("resolve table")
    }
}

/// Read every remaining row.
pub fn drain(reader: &mut dyn RowReader) -> Vec<Row> {
    let mut rows = Vec::new();
    while let Some(row) = reader.read().expect("read") {
        rows.push(row);
    }
    rows
}

/// Integer at `selector`, panicking on anything else.
pub fn int(row: &Row, selector: &str) -> i64 {
    match row.get(selector) {
        Some(TypedValue::Integer(v)) => *v,
        other => panic!("{selector}: expected integer, got {other:?}"),
    }
}

pub fn text(row: &Row, selector: &str) -> String {
    match row.get(selector) {
        Some(TypedValue::Varchar(v)) => v.clone(),
        other => panic!("{selector}: expected varchar, got {other:?}"),
    }
}
