use actix_web::{middleware::Logger, web, App, HttpServer};
use link_service::handlers;
use link_service::store::{LinkStore, MemoryPartitionWriter};
use link_service::Config;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting link-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let store = Arc::new(LinkStore::new(MemoryPartitionWriter::new()));
    let bind = (config.app.host.clone(), config.app.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(store.clone()))
            .route("/health", web::get().to(handlers::health))
            .route("/links", web::post().to(handlers::create_links))
            .route("/links/{owner_id}", web::get().to(handlers::get_links))
            .route(
                "/links/rearrange/{owner_id}",
                web::put().to(handlers::rearrange_links),
            )
    })
    .bind(bind)?
    .run()
    .await
}
