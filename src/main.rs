// Flight Briefing API v0.1
use axum::routing::{delete, get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod models;
mod routes;
mod services;

use config::AppConfig;
use routes::AppState;
use services::briefing::BriefingSynthesizer;
use services::cache::ReportCache;
use services::providers::avwx::AvwxClient;
use services::providers::awc::AwcClient;
use services::providers::checkwx::CheckWxClient;
use services::providers::gateway::ProviderGateway;
use services::providers::{build_http_client, WeatherProvider};

/// Flight Briefing API: OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Flight Briefing API",
        version = "0.1.0",
        description = "Aviation weather briefing API. Fetches METAR, TAF and NOTAM data \
            from a chain of providers with synthetic fallback, decodes reports into \
            structured fields and plain language, classifies flight-safety severity, \
            and builds route briefings with enroute weather sampled along the great circle.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health and provider status"),
        (name = "Weather", description = "Report decoding and per-airport weather"),
        (name = "Airports", description = "Airport metadata and search"),
        (name = "Briefing", description = "Route briefings and enroute weather"),
        (name = "Cache", description = "Cache introspection (debugging)"),
    ),
    paths(
        routes::health::health_check,
        routes::weather::decode_report,
        routes::weather::get_metar,
        routes::weather::get_taf,
        routes::weather::get_notams,
        routes::airports::get_airport,
        routes::airports::search_airports,
        routes::briefing::create_briefing,
        routes::briefing::get_enroute,
        routes::cache::get_cache_stats,
        routes::cache::clear_cache,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            services::providers::gateway::ProviderStatus,
            routes::weather::DecodeRequest,
            routes::weather::DecodeResponse,
            routes::weather::WeatherResponse,
            routes::weather::NotamResponse,
            routes::airports::AirportSearchResponse,
            models::AirportRecord,
            models::RoutePlan,
            services::briefing::Briefing,
            services::briefing::EnrouteReport,
            services::cache::CacheStats,
            routes::cache::CacheClearResponse,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "flight_briefing_api=debug,tower_http=debug".into());
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = AppConfig::from_env();

    let timeout = Duration::from_secs(config.provider_timeout_secs);
    let http = build_http_client(&config.user_agent, timeout).expect("Failed to build HTTP client");

    // Provider chain, highest priority first
    let providers: Vec<Arc<dyn WeatherProvider>> = vec![
        Arc::new(CheckWxClient::new(
            http.clone(),
            config.checkwx_api_key.clone(),
            &config.checkwx_base_url,
        )),
        Arc::new(AvwxClient::new(
            http.clone(),
            config.avwx_api_key.clone(),
            &config.avwx_base_url,
        )),
        Arc::new(AwcClient::new(http, &config.awc_base_url, config.awc_enabled)),
    ];
    for provider in &providers {
        if provider.is_configured() {
            tracing::info!("Provider '{}' enabled", provider.name());
        } else {
            tracing::warn!("Provider '{}' not configured, skipping", provider.name());
        }
    }

    // Shared state: one cache per process, owned by the gateway
    let cache = Arc::new(ReportCache::new(config.cache_ttl_secs));
    let gateway = Arc::new(ProviderGateway::new(providers, cache, timeout));
    let app_state = AppState {
        synthesizer: Arc::new(BriefingSynthesizer::new(gateway.clone())),
        gateway: gateway.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers(Any);

    // Build router
    let weather_routes = Router::new()
        .route("/api/v1/decode", post(routes::weather::decode_report))
        .route("/api/v1/weather/:icao/metar", get(routes::weather::get_metar))
        .route("/api/v1/weather/:icao/taf", get(routes::weather::get_taf))
        .route(
            "/api/v1/weather/:icao/notams",
            get(routes::weather::get_notams),
        )
        .route(
            "/api/v1/airports/search",
            get(routes::airports::search_airports),
        )
        .route("/api/v1/airports/:icao", get(routes::airports::get_airport))
        .route("/api/v1/briefing", post(routes::briefing::create_briefing))
        .route("/api/v1/enroute", get(routes::briefing::get_enroute))
        .with_state(app_state);

    // Health reads breaker state straight from the gateway
    let health_routes = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .with_state(gateway.clone());

    let cache_routes = Router::new()
        .route("/api/v1/cache/stats", get(routes::cache::get_cache_stats))
        .route("/api/v1/cache", delete(routes::cache::clear_cache))
        .with_state(gateway.cache().clone());

    let app = Router::new()
        .merge(health_routes)
        .merge(weather_routes)
        .merge(cache_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
