use api::{
    Config, build,
    telemetry::{get_subscriber, init_subscriber},
    time::TimeSource,
};

/// Ledger API Server
///
/// Environment variables can be set directly or loaded from a .env file in
/// the project root.
///
/// Required:
/// - DATABASE_URL: PostgreSQL connection string
///
/// Optional (defaults shown):
/// - IP_ADDRESS (127.0.0.1)
/// - PORT (0, OS-assigned)
/// - POOL_MIN_CONNECTIONS (2)
/// - POOL_MAX_CONNECTIONS (20)
/// - POOL_IDLE_TIMEOUT_SECS (30)
/// - POOL_CONNECT_TIMEOUT_SECS (5)
/// - IDEMPOTENCY_RETENTION_HOURS (24)
/// - TRANSACTION_RETRY_ATTEMPTS (3)
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();

    let subscriber = get_subscriber("info".into());
    init_subscriber(subscriber);

    let mut config = Config::from_env();

    let pool = sqlx::PgPool::connect(&config.database_url).await.unwrap();
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    drop(pool);

    #[cfg(not(feature = "test-utils"))]
    let time_source = TimeSource::new();
    #[cfg(feature = "test-utils")]
    let time_source = TimeSource::new(jiff::Timestamp::now());

    let server = build(&mut config, time_source).await?;
    server.await
}
