// API server implementation using actix-web

use crate::api::handlers::{self, IngestSettings};
use crate::api::{middleware, routes};
use crate::config::AppConfig;
use crate::database_ops::db::Store;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub batch_size: usize,
}

impl ApiServer {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            batch_size: config.batch_size,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Start the HTTP server and serve until shutdown.
    pub async fn run(self, store: Store) -> Result<()> {
        let bind_addr = self.bind_addr();

        tracing::info!(
            host = %self.host,
            port = %self.port,
            batch_size = self.batch_size,
            "Starting award-intervals API server"
        );

        let store_data = web::Data::new(store);
        let settings = web::Data::new(IngestSettings {
            batch_size: self.batch_size,
        });

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();

            App::new()
                .app_data(store_data.clone())
                .app_data(settings.clone())
                .wrap(logger)
                .wrap(compress)
                .configure(routes::configure_routes)
                .default_service(web::to(handlers::not_found))
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
