pub mod routes;
pub mod store;
pub mod telemetry;
pub mod time;

use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::time::Duration;

use crate::store::gateway::PersistenceGateway;
use crate::time::TimeSource;

/// Build the server, but not await it.
///
/// Returns the port that the server has bound to by modifying the config.
pub async fn build(
    config: &mut Config,
    time_source: TimeSource,
) -> std::io::Result<Server> {
    let pool = PgPoolOptions::new()
        .min_connections(config.pool_min_connections)
        .max_connections(config.pool_max_connections)
        .idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.pool_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .unwrap();
    let gateway = web::Data::new(PersistenceGateway::new(
        pool,
        config.transaction_retry_attempts,
    ));
    let time_source = web::Data::new(time_source);
    let idempotency_config = web::Data::new(IdempotencyConfig {
        retention: jiff::Span::new().hours(config.idempotency_retention_hours),
    });

    // OS assigns the port if binding to 0
    let listener = TcpListener::bind(format!("{}:{}", config.ip, config.port))?;
    config.port = listener.local_addr()?.port();
    let server = HttpServer::new(move || {
        App::new()
            .service(routes::api_services())
            .app_data(gateway.clone())
            .app_data(time_source.clone())
            .app_data(idempotency_config.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

/// How long a captured idempotent response stays eligible for replay.
#[derive(Clone, Copy)]
pub struct IdempotencyConfig {
    pub retention: jiff::Span,
}

/// Configuration loaded from environment variables at startup.
pub struct Config {
    pub database_url: String,
    /// set to "0.0.0.0" for public access, "127.0.0.1" for local dev
    pub ip: String,
    /// set to 0 to get an os-assigned port
    pub port: u16,
    pub pool_min_connections: u32,
    pub pool_max_connections: u32,
    pub pool_idle_timeout_secs: u64,
    pub pool_connect_timeout_secs: u64,
    pub idempotency_retention_hours: i64,
    pub transaction_retry_attempts: u32,
}

impl Config {
    pub fn from_env() -> Self {
        use std::env::var;

        Config {
            database_url: var("DATABASE_URL").unwrap(),
            ip: var("IP_ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(0),
            pool_min_connections: var("POOL_MIN_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            pool_max_connections: var("POOL_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            pool_idle_timeout_secs: var("POOL_IDLE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            pool_connect_timeout_secs: var("POOL_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            idempotency_retention_hours: var("IDEMPOTENCY_RETENTION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            transaction_retry_attempts: var("TRANSACTION_RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }
}
