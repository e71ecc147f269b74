//! # Moderation Console Binary
//!
//! The entry point that assembles the application based on configuration
//! and compile-time features.

use actix_web::{web, App, HttpServer};
use mc_api::handlers::AppState;
use mc_configs::{Settings, SourceKind};
use mc_core::store::AdStore;
use mc_core::traits::{AdSource, ModerationGateway};

type Ports = (Box<dyn AdSource>, Box<dyn ModerationGateway>);

#[cfg(feature = "source-fixture")]
fn fixture_ports() -> anyhow::Result<Ports> {
    Ok((
        Box::new(mc_source_fixture::FixtureAdSource::new()),
        Box::new(mc_core::store::LocalGateway),
    ))
}

#[cfg(not(feature = "source-fixture"))]
fn fixture_ports() -> anyhow::Result<Ports> {
    anyhow::bail!("built without the `source-fixture` feature")
}

#[cfg(feature = "source-http")]
fn http_ports(settings: &Settings) -> anyhow::Result<Ports> {
    let base_url = settings.source.base_url.as_deref().unwrap_or_default();
    let timeout = std::time::Duration::from_secs(settings.source.timeout_secs);
    let client = mc_source_http::HttpAdSource::new(base_url, timeout)?;
    Ok((Box::new(client.clone()), Box::new(client)))
}

#[cfg(not(feature = "source-http"))]
fn http_ports(_settings: &Settings) -> anyhow::Result<Ports> {
    anyhow::bail!("built without the `source-http` feature")
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(settings.log_level.as_str()));

    // 1. Pick the ad source
    let (source, gateway) = match settings.source.kind {
        SourceKind::Fixture => fixture_ports()?,
        SourceKind::Http => http_ports(&settings)?,
    };

    // 2. Initial load. A failing upstream leaves an empty collection that
    //    `POST /api/v1/ads/refresh` can fill later.
    let store = AdStore::new(source, gateway);
    if let Err(e) = store.refresh().await {
        log::warn!("initial ad load failed: {e}");
    }

    let state = web::Data::new(AppState::new(store));

    let addr = settings.addr();
    log::info!("Moderation console starting on http://{addr} ({:?} source)", settings.source.kind);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(mc_api::middleware::cors_policy())
            .wrap(mc_api::middleware::standard_middleware())
            .configure(mc_api::configure_routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
