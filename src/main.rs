use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use kindred_core::config::{identifier_from_env_value, resolve_data_file};
use kindred_core::{
    CoreConfig, RecordStore, DEFAULT_FAMILY_SPACE, DEFAULT_PATIENT_SPACE, DEFAULT_WIKI,
};

/// Main entry point for the Kindred server
///
/// Loads the record fixture once, then serves the REST API (with Swagger UI at `/swagger-ui`).
///
/// # Environment Variables
/// - `KINDRED_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `KINDRED_DATA_FILE`: record fixture to load (default: "kindred.yaml" in the working directory)
/// - `KINDRED_WIKI`: wiki used to resolve partial document references (default: "xwiki")
/// - `KINDRED_PATIENT_SPACE`: space holding patient documents (default: "data")
/// - `KINDRED_FAMILY_SPACE`: space holding family documents (default: "Families")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration or the record fixture is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kindred_run=info".parse()?)
                .add_directive("kindred_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("KINDRED_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let data_file = resolve_data_file(std::env::var("KINDRED_DATA_FILE").ok().map(PathBuf::from))?;
    let wiki = identifier_from_env_value(
        "KINDRED_WIKI",
        std::env::var("KINDRED_WIKI").ok(),
        DEFAULT_WIKI,
    )?;
    let patient_space = identifier_from_env_value(
        "KINDRED_PATIENT_SPACE",
        std::env::var("KINDRED_PATIENT_SPACE").ok(),
        DEFAULT_PATIENT_SPACE,
    )?;
    let family_space = identifier_from_env_value(
        "KINDRED_FAMILY_SPACE",
        std::env::var("KINDRED_FAMILY_SPACE").ok(),
        DEFAULT_FAMILY_SPACE,
    )?;

    let cfg = Arc::new(CoreConfig::new(data_file, wiki, patient_space, family_space)?);
    let store = Arc::new(RecordStore::load(cfg.clone())?);

    tracing::info!("++ Loaded records from {}", cfg.data_file().display());
    tracing::info!("++ Starting Kindred REST on {}", rest_addr);

    let app = router(AppState::new(store));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
