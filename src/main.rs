// Dashboard server entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config (copying defaults on first run)
// 3. Open database
// 4. Build the provider client
// 5. Bind and serve the HTTP API

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use draft_board::app::AppState;
use draft_board::config;
use draft_board::db::Database;
use draft_board::server;
use draft_board::sleeper::client::LeagueProvider;
use draft_board::sleeper::SleeperClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Draft board starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: port={}, database={}",
        config.server.port, config.database.path
    );

    // 3. Open database
    let db = Database::open(&config.database.path).context("failed to open database")?;
    info!("Database opened at {}", config.database.path);

    // 4. Build the provider client (owns the directory and value caches)
    let provider: Arc<dyn LeagueProvider> = Arc::new(SleeperClient::from_config(&config));

    // 5. Bind and serve
    let port = config.server.port;
    let state = Arc::new(AppState::new(config, db, provider));
    let router = server::router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind 127.0.0.1:{port}"))?;
    info!("HTTP API listening on 127.0.0.1:{port}");

    axum::serve(listener, router)
        .await
        .context("server error")?;

    Ok(())
}

/// Initialize tracing to stdout, honoring `RUST_LOG` when set.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("draft_board=info,warn")),
        )
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
