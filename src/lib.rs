use actix_web::{
    middleware::{NormalizePath, TrailingSlash},
    web::Data,
    App, HttpServer,
};
use config::Config;
use tracing::level_filters::LevelFilter;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter, FmtSubscriber};

pub mod api;
pub mod channel;
pub mod config;
pub mod error;
pub mod message;
pub mod recipient;
pub mod service;
pub mod store;

/// Returns a builder for the main application.
///
/// Configuration is read from `FLOODCAST_*` environment variables unless one is given.
#[bon::builder(finish_fn = start)]
pub async fn run(config: Option<Config>) -> eyre::Result<()> {
    #[cfg(debug_assertions)]
    FmtSubscriber::builder()
        .pretty()
        .with_env_filter(
            EnvFilter::builder()
                .with_env_var("FLOODCAST_LOG")
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()?,
        )
        .finish()
        .try_init()?;

    #[cfg(not(debug_assertions))]
    FmtSubscriber::builder()
        .json()
        .with_env_filter(
            EnvFilter::builder()
                .with_env_var("FLOODCAST_LOG")
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()?,
        )
        .finish()
        .try_init()?;

    let config = match config {
        Some(config) => config,
        None => Config::load()?,
    };

    let bind = (config.host.clone(), config.port);

    let service = service::Service::connect_with(config).await?;

    let data = Data::new(service);

    tracing::info!(host = %bind.0, port = bind.1, "Starting floodcast");

    HttpServer::new(move || {
        App::new()
            .wrap(api::cors())
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .wrap(TracingLogger::default())
            .app_data(data.clone())
            .configure(api::configure)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
