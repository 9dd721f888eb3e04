use amenity_booking::{
    adapters::{
        clock::SystemClock,
        memory::{BlockedDateStore, BookingLedger, FacilityRegistry},
        mock::{
            IdentityDirectory as MockIdentityDirectory,
            NotificationService as MockNotificationService,
        },
        postgres::{PostgresBlockedDateStore, PostgresBookingLedger, PostgresFacilityRegistry},
    },
    api::{handlers::AppState, router::create_router},
    application::booking::{ServiceDependencies, SlotLocks},
    config::{AppConfig, StorageConfig},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "amenity_booking=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let identity_directory = Arc::new(MockIdentityDirectory::new());
    let notification_service = Arc::new(MockNotificationService::new());
    let clock = Arc::new(SystemClock::new(config.community_offset));

    // Initialize adapters
    let service_deps = match &config.storage {
        StorageConfig::Memory => {
            tracing::info!("Using in-memory storage");
            ServiceDependencies {
                facility_registry: Arc::new(FacilityRegistry::new()),
                blocked_date_store: Arc::new(BlockedDateStore::new()),
                booking_ledger: Arc::new(BookingLedger::new()),
                identity_directory,
                notification_service,
                clock,
                slot_locks: Arc::new(SlotLocks::new()),
            }
        }
        StorageConfig::Postgres(db) => {
            tracing::info!(max_connections = db.max_connections, "Using PostgreSQL storage");

            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(db.max_connections)
                .connect(&db.url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;

            ServiceDependencies {
                facility_registry: Arc::new(PostgresFacilityRegistry::new(pool.clone())),
                blocked_date_store: Arc::new(PostgresBlockedDateStore::new(pool.clone())),
                booking_ledger: Arc::new(PostgresBookingLedger::new(pool)),
                identity_directory,
                notification_service,
                clock,
                slot_locks: Arc::new(SlotLocks::new()),
            }
        }
    };

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app).await?;
    Ok(())
}
