use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use collector::{Collector, SystemClock};
use config::Config;
use document::{HttpSource, PageLayout};
use storage::{PgRateStore, RateStore};

mod api;
mod collector;
mod config;
mod document;
mod exchange_rate;
mod rate_table;
mod scheduler;
mod storage;
mod timestamp;

#[actix_web::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if dotenv.is_err() {
        log::warn!(".env file not found");
    }
    let config = Config::from_env()?;

    let pg = PgRateStore::connect(&config.database_url).await?;
    pg.ensure_schema().await?;
    log::info!("PostgreSQL database connection established");
    let store: Arc<dyn RateStore> = Arc::new(pg);

    let collector = Collector::new(
        Arc::new(HttpSource::new(config.source_url.clone())),
        store.clone(),
        Arc::new(SystemClock),
        PageLayout::new()?,
    );
    scheduler::start(collector);

    log::info!("Server running on port {}", config.port);
    let data = web::Data::from(store);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(api::configure))
        .bind(("0.0.0.0", config.port))
        .with_context(|| format!("Can't bind port {}", config.port))?
        .run()
        .await
        .context("Server failed")?;

    Ok(())
}
