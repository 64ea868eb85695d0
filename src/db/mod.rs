//! Database layer: entity definitions and the service API on top of them.

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::config::DatabaseConfig;

pub mod entities;
pub mod services;

#[cfg(test)]
pub mod test_utils;

/// Opens the connection pool described by the given configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections);

    let db = Database::connect(opt).await?;
    info!(max_connections = config.max_connections, "Database connection pool established");
    Ok(db)
}
