use actix_web::{middleware::Logger, web, App, HttpServer};
use journal_gateway::clients::{
    HttpEntryOwnerClient, HttpLinkClient, HttpTaskClient, HttpUserClient,
};
use journal_gateway::dashboard::{DashboardCache, DashboardService, TaggedResponseCache};
use journal_gateway::handlers;
use journal_gateway::invalidation::InvalidationConsumer;
use journal_gateway::prober::{spawn_prober, ProbeTarget};
use journal_gateway::saga::JournalCreationSaga;
use journal_gateway::Config;
use resilience::CancellationToken;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use subject_events::SubjectEventSubscriber;
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

    tracing::info!("Starting journal-gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let retry = config.retry.to_policy();
    let entries = Arc::new(HttpEntryOwnerClient::new(
        config.downstream.journal_url.clone(),
        retry.clone(),
    ));
    let links = Arc::new(HttpLinkClient::new(
        config.downstream.link_url.clone(),
        retry.clone(),
    ));
    let tasks = Arc::new(HttpTaskClient::new(
        config.downstream.task_url.clone(),
        retry.clone(),
    ));
    let users = Arc::new(HttpUserClient::new(
        config.downstream.user_url.clone(),
        retry,
    ));

    let saga = Arc::new(JournalCreationSaga::new(
        entries.clone(),
        links.clone(),
        tasks.clone(),
    ));

    let ttl = Duration::from_secs(config.cache.ttl_secs);
    let cache = Arc::new(DashboardCache::new(ttl));
    let responses = Arc::new(TaggedResponseCache::new(ttl));
    let dashboard = Arc::new(DashboardService::new(
        cache.clone(),
        entries,
        tasks,
        users,
    ));

    // Invalidation consumer: a missing bus degrades freshness, not reads.
    let consumer = Arc::new(InvalidationConsumer::new(cache, responses.clone()));
    match SubjectEventSubscriber::with_channel(
        &config.events.redis_url,
        config.events.channel.clone(),
    )
    .await
    {
        Ok(subscriber) => {
            if let Err(e) = consumer.clone().run(subscriber).await {
                tracing::warn!(error = %e, "invalidation subscription failed, caches rely on TTL");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "subject event bus unavailable, caches rely on TTL");
        }
    }

    let shutdown = CancellationToken::new();
    let probe_targets: Vec<ProbeTarget> = config
        .downstream
        .probe_targets()
        .into_iter()
        .map(|(name, url)| ProbeTarget::new(name, url))
        .collect();
    let prober = spawn_prober(
        probe_targets,
        Duration::from_secs(config.probe.interval_secs),
        shutdown.clone(),
    );

    let bind = (config.app.host.clone(), config.app.port);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(saga.clone()))
            .app_data(web::Data::new(dashboard.clone()))
            .app_data(web::Data::new(responses.clone()))
            .route("/health", web::get().to(handlers::health))
            .route("/journals", web::post().to(handlers::create_journal))
            .route("/journals/{id}", web::get().to(handlers::get_journal))
            .route("/dashboard/{subject_id}", web::get().to(handlers::get_dashboard))
            .route(
                "/dashboard/invalidate/{subject_id}",
                web::post().to(handlers::invalidate_dashboard),
            )
            .route("/dashboard-cache/stats", web::get().to(handlers::cache_stats))
    })
    .bind(bind)?
    .run()
    .await;

    shutdown.cancel();
    prober.abort();
    server
}
