use std::sync::Arc;

use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay::api;
use relay::config::Config;
use relay::platform::HttpPlatformFactory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "relay=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        port = config.port,
        platform = %config.platform_base_url,
        "relay starting"
    );

    let client = reqwest::Client::builder()
        .timeout(config.platform_request_timeout)
        .build()?;
    let platform = Arc::new(HttpPlatformFactory::new(
        client,
        config.platform_base_url.clone(),
    ));

    // The API is token-authenticated and stateless; no cookies, so a
    // permissive CORS policy is safe here.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let port = config.port;
    let state = api::ApiState {
        platform,
        config: Arc::new(config),
    };

    let app = api::router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("0.0.0.0:{port}");
    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
