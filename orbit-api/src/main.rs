use orbit_api::config::ApiConfig;
use orbit_api::routes::{AppState, router};
use orbit_backend::config::ConfigArgs;
use orbit_backend::index::JsonFileIndex;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "orbit-api")]
#[command(about = "Sentinel-1 orbit file lookup server")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: ConfigArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = ApiConfig::load(&cli.common.config)?;

    let _logging_guard =
        orbit_backend::logging::init_logging(&config.core.log_dir, "orbit-api", &config.core.log_level)?;
    info!("Loaded configuration: {:?}", config);

    let table_path = config.core.index.table_path();
    let index = JsonFileIndex::open(&table_path)
        .await
        .with_context(|| format!("Failed to open index table {:?}", table_path))?;
    info!("Serving orbit records from: {}", index.path().display());

    let cors = if config.server.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let app = router(AppState::new(Arc::new(index))).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    let addr = config.server.bind_address();
    info!("Starting orbit lookup server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
