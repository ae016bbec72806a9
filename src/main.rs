use atlsfw::{config::Config, make_router, run_app, AppState};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

async fn start() -> atlsfw::Result<()> {
    let config = Config::load()?;
    let state = AppState::new(config).await?;
    run_app(make_router(), state).await
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("atlsfw=info")),
        )
        .init();

    if let Err(e) = start().await {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
