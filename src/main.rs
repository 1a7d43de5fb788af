use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use playzo::auth::repository::InMemoryTokenBlacklist;
use playzo::auth::token::TokenConfig;
use playzo::clock::SystemClock;
use playzo::offers::repository::InMemoryOfferRepository;
use playzo::player::repository::InMemoryPlayerRepository;
use playzo::routes::api_router;
use playzo::shared::AppState;
use playzo::user::repository::InMemoryUserRepository;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playzo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Playzo platform API");

    // Create shared application state with dependency injection
    // Easy to switch between implementations:
    let user_repository = Arc::new(InMemoryUserRepository::new());
    let player_repository = Arc::new(InMemoryPlayerRepository::new());
    let offer_repository = Arc::new(InMemoryOfferRepository::new());
    let token_blacklist = Arc::new(InMemoryTokenBlacklist::new());

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let user_repository = Arc::new(playzo::user::PostgresUserRepository::new(pool.clone()));
    // let player_repository = Arc::new(playzo::player::repository::PostgresPlayerRepository::new(pool.clone()));
    // let offer_repository = Arc::new(playzo::offers::repository::PostgresOfferRepository::new(pool.clone()));
    // let token_blacklist = Arc::new(playzo::auth::repository::PostgresTokenBlacklist::new(pool));

    let app_state = AppState::new(
        user_repository,
        player_repository,
        offer_repository,
        token_blacklist,
        TokenConfig::new(),
        Arc::new(SystemClock),
    );

    let app = api_router(app_state);

    // run our app with hyper, listening globally on port 3000
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
