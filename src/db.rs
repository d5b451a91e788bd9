use crate::app_config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// Opens the connection pool described by `config`.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.to_owned());
    if config.max_connections > 0 {
        options.max_connections(config.max_connections);
    }
    options.connect_timeout(Duration::from_secs(8));

    let db = Database::connect(options).await?;
    log::info!("Database connection pool established");
    Ok(db)
}
