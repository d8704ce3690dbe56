use actix_web::{middleware::Logger, web, App, HttpServer};
use journal_service::handlers::{self, entries::EntryState};
use journal_service::repo::EntryRepo;
use journal_service::Config;
use std::io;
use std::sync::Arc;
use subject_events::SubjectEventPublisher;
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

    tracing::info!("Starting journal-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    // A missing bus only degrades cache freshness; the service still serves.
    let publisher = match SubjectEventPublisher::with_channel(
        &config.events.redis_url,
        "journal-service".to_string(),
        config.events.channel.clone(),
    )
    .await
    {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::warn!(error = %e, "subject event bus unavailable, changes will not broadcast");
            None
        }
    };

    let state = Arc::new(EntryState {
        repo: EntryRepo::new(),
        publisher,
    });
    let bind = (config.app.host.clone(), config.app.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .route("/health", web::get().to(handlers::health))
            .route("/entries", web::post().to(handlers::create_entry))
            .route("/entries/{id}", web::get().to(handlers::get_entry))
            .route("/entries/{id}", web::delete().to(handlers::delete_entry))
            .route(
                "/entries/by-owner/{owner_user_id}",
                web::get().to(handlers::list_entries_by_owner),
            )
    })
    .bind(bind)?
    .run()
    .await
}
