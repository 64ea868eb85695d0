//! Shared helpers for service-level tests. Spins up an in-memory sqlite
//! database with the schema derived from the entity definitions, so the
//! capacity invariant and CRUD paths are exercised against a real store.

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema};
use tracing_subscriber::EnvFilter;

use crate::db::entities::{container, customer, distro, domain, server};

pub async fn setup_database() -> DatabaseConnection {
    // Honor RUST_LOG for debugging failing tests; ignore the error when a
    // subscriber is already installed by another test.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    // A single connection keeps every statement on the same in-memory
    // database; a wider pool would hand out fresh, empty databases.
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1);

    let db = Database::connect(opt)
        .await
        .expect("failed to open in-memory sqlite database");

    let schema = Schema::new(DbBackend::Sqlite);
    let statements = [
        schema.create_table_from_entity(customer::Entity),
        schema.create_table_from_entity(server::Entity),
        schema.create_table_from_entity(distro::Entity),
        schema.create_table_from_entity(container::Entity),
        schema.create_table_from_entity(domain::Entity),
    ];
    for statement in statements {
        db.execute(db.get_database_backend().build(&statement))
            .await
            .expect("failed to create table");
    }

    db
}
