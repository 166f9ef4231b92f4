// src/lib.rs

pub mod chart;
pub mod config;
pub mod flash;
pub mod handlers;
pub mod models;
pub mod presenter;
pub mod templates;
pub mod validation;
pub mod workflow;

use config::AppConfig;
use std::io;

/// Builds the configured quote client and serves until shutdown.
pub async fn run_server(config: AppConfig) -> io::Result<()> {
    use actix_web::{web, App, HttpServer};
    use quote_service::QuoteClient;

    let client = QuoteClient::new(
        config.quote_provider,
        config.quote_base_url.as_deref(),
        &config.alphavantage_api_key,
        config.quote_timeout,
    )
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    tracing::info!(
        bind = %config.bind_address,
        provider = ?config.quote_provider,
        "starting importfolio server"
    );

    let bind_address = config.bind_address.clone();
    let config = web::Data::new(config);
    let client = web::Data::new(client);
    HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .app_data(client.clone())
            .configure(handlers::configure::<QuoteClient>)
    })
    .bind(bind_address)?
    .run()
    .await
}
