// F1 Calendar API v0.1
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
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
use services::calendar::{CalendarState, SharedCalendarState};
use services::clock::{SharedClock, SystemClock};
use services::jobs::{JobQueue, LogNotifier};
use services::jolpica::JolpicaClient;

/// F1 Calendar API: OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "F1 Calendar API",
        version = "0.1.0",
        description = "Formula 1 season calendar, driver standings and session results \
            from the Jolpica F1 API. Computes the next race with a live countdown and \
            schedules a reminder 15 minutes before every upcoming session.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Calendar", description = "Season calendar and next race countdown"),
        (name = "Races", description = "Race weekend sessions and results"),
        (name = "Standings", description = "Driver championship standings"),
        (name = "Reminders", description = "Scheduled session reminders"),
    ),
    paths(
        routes::health::health_check,
        routes::calendar::list_calendar,
        routes::calendar::get_next_race,
        routes::calendar::stream_countdown,
        routes::races::get_race_sessions,
        routes::races::get_session_results,
        routes::standings::get_driver_standings,
        routes::reminders::get_reminders,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::calendar::RaceSummary,
            routes::calendar::CalendarResponse,
            routes::calendar::NextRaceResponse,
            routes::calendar::CountdownTick,
            routes::races::SessionResponse,
            routes::races::RaceSessionsResponse,
            routes::races::ResultRow,
            routes::races::ResultsResponse,
            routes::standings::StandingsResponse,
            routes::reminders::RemindersResponse,
            models::DriverStanding,
            models::Driver,
            models::Constructor,
            models::SessionType,
            models::DataState,
            services::sessions::SessionKind,
            services::timing::Countdown,
            services::jobs::PendingJobInfo,
            services::reminders::ReminderPass,
            services::reminders::ScheduledReminder,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "f1_calendar_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let client = JolpicaClient::new(&config.jolpica_base_url, &config.user_agent)
        .expect("Failed to create Jolpica client");
    let clock: SharedClock = Arc::new(SystemClock);
    let jobs = JobQueue::new(Arc::new(LogNotifier));
    let calendar: SharedCalendarState = Arc::new(RwLock::new(CalendarState::new()));

    // Spawn background calendar refresher (also drives reminder scheduling)
    tokio::spawn(services::refresher::run_refresher(
        client.clone(),
        clock.clone(),
        jobs.clone(),
        calendar.clone(),
        config.season,
        config.refresh_intervals(),
    ));

    let app_state = AppState {
        clock,
        calendar,
        client,
        jobs,
        season: config.season,
    };

    // CORS: read-only API, GET only
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    let calendar_routes = Router::new()
        .route("/api/v1/calendar", get(routes::calendar::list_calendar))
        .route("/api/v1/calendar/next", get(routes::calendar::get_next_race))
        .route(
            "/api/v1/calendar/next/countdown",
            get(routes::calendar::stream_countdown),
        );

    let race_routes = Router::new()
        .route(
            "/api/v1/races/:round/sessions",
            get(routes::races::get_race_sessions),
        )
        .route(
            "/api/v1/races/:round/results/:session_type",
            get(routes::races::get_session_results),
        );

    let app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route(
            "/api/v1/standings/drivers",
            get(routes::standings::get_driver_standings),
        )
        .route("/api/v1/reminders", get(routes::reminders::get_reminders))
        .merge(calendar_routes)
        .merge(race_routes)
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

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
