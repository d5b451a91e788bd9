use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use ethearts::app_config::AppConfig;
use ethearts::help::db::DbHelpRepository;
use ethearts::help::memory::MemoryHelpRepository;
use ethearts::help::{HelpRepository, HelpService};
use ethearts::middleware::ClientCtx;
use ethearts::session::{Authenticator, DbAuthenticator, MemoryAuthenticator};
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let (repo, auth): (Arc<dyn HelpRepository>, Arc<dyn Authenticator>) =
        if config.database.url.is_empty() {
            log::warn!(
                "database.url is empty; helps are kept in memory and only {} static token(s) are accepted",
                config.auth.static_tokens.len()
            );
            (
                Arc::new(MemoryHelpRepository::new()),
                Arc::new(MemoryAuthenticator::from_static_tokens(
                    &config.auth.static_tokens,
                )),
            )
        } else {
            let db = ethearts::db::connect(&config.database)
                .await
                .context("Failed to connect to the database")?;
            (
                Arc::new(DbHelpRepository::new(db.clone())),
                Arc::new(DbAuthenticator::new(
                    db,
                    Duration::from_secs(config.auth.token_cache_seconds),
                )),
            )
        };

    let store = ethearts::storage::from_config(&config.storage)
        .context("Failed to initialize storage backend")?;
    log::info!(
        "Storing resources with the '{}' backend in bucket '{}'",
        config.storage.backend,
        store.bucket_name()
    );

    let service = Data::new(HelpService::new(repo, store));
    let auth: Data<dyn Authenticator> = Data::from(auth);
    let config = Data::new(config);
    let bind = config.server.bind.to_owned();

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        let app = App::new()
            .app_data(service.clone())
            .app_data(auth.clone())
            .app_data(config.clone())
            .wrap(DefaultHeaders::new().add((header::X_CONTENT_TYPE_OPTIONS, "nosniff")))
            .wrap(ClientCtx::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .wrap(NormalizePath::trim())
            .wrap(Logger::new("%a %r %s %Dms"))
            .configure(ethearts::web::configure);

        // The local backend is served by the application itself.
        if config.storage.backend == "local" {
            app.service(
                actix_files::Files::new("/uploads", &config.storage.local_path)
                    .prefer_utf8(true),
            )
        } else {
            app
        }
    })
    .bind(&bind)
    .with_context(|| format!("Failed to bind {}", bind))?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env file is fine; the environment may already be set.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
