use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turnstile_api::{app, state::AppState, worker};
use turnstile_booking::BookingManager;
use turnstile_core::notify::LogNotificationSink;
use turnstile_core::payment::MockPaymentAdapter;
use turnstile_store::{
    DbClient, PostgresAvailabilityRepository, PostgresBookingRepository, PostgresCatalogRepository,
    PostgresOfferRepository, PostgresPromoRepository,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turnstile_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = turnstile_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Turnstile API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let availability = Arc::new(PostgresAvailabilityRepository { pool: db.pool.clone() });
    let bookings = Arc::new(PostgresBookingRepository { pool: db.pool.clone() });
    let promos = Arc::new(PostgresPromoRepository { pool: db.pool.clone() });
    let offers = Arc::new(PostgresOfferRepository { pool: db.pool.clone() });
    let catalog = Arc::new(PostgresCatalogRepository { pool: db.pool.clone() });

    let manager = Arc::new(BookingManager::new(
        availability.clone(),
        bookings,
        promos.clone(),
        offers.clone(),
        catalog.clone(),
        Arc::new(LogNotificationSink),
        config.business_rules.booking_policy(),
    ));

    tokio::spawn(worker::start_expiry_worker(
        manager.clone(),
        config.sweep.interval_seconds,
    ));

    let app_state = AppState {
        manager,
        availability,
        catalog,
        promos,
        offers,
        payments: Arc::new(MockPaymentAdapter),
        currency: config.business_rules.currency.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
