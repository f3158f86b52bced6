use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

mod api;
mod config;
mod db;
mod docs;
mod model;
mod routes;
#[cfg(test)]
mod test_support;
mod tracker;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::tracker::{AttendanceTracker, mysql::MySqlSessionStore};
use crate::utils::{employee_cache::EmployeeCache, key_lock::KeyLocks};
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

// Per-key locks are only needed while a scan is in flight
const KEY_LOCK_CAPACITY: u64 = 10_000;
const KEY_LOCK_IDLE: Duration = Duration::from_secs(120);

#[get("/")]
async fn index() -> impl Responder {
    "Site access is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        reentry = %config.reentry_policy,
        utc_offset = %config.site_utc_offset,
        "Server starting..."
    );

    let pool = init_db(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;

    let employees = EmployeeCache::new(config.employee_cache_capacity, config.employee_cache_ttl());

    let pool_for_cache_warmup = pool.clone();
    let cache_for_warmup = employees.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = cache_for_warmup.warmup(&pool_for_cache_warmup, 250).await {
            warn!(error = %e, "Failed to warmup employee cache");
        }
    });

    let tracker = Data::new(AttendanceTracker::new(
        Arc::new(MySqlSessionStore::new(pool)),
        employees,
        KeyLocks::new(KEY_LOCK_CAPACITY, KEY_LOCK_IDLE),
        config.tracker_settings(),
    ));

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(tracker.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
