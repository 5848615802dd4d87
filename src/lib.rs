pub mod analysis_store;
pub mod api;
pub mod config;
pub mod core_state;
pub mod db;
pub mod journal;
pub mod pipeline;
pub mod prescription;
pub mod remedies;
pub mod report;

#[cfg(test)]
mod test_support;

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{Config, ConfigError};
use crate::core_state::{CoreState, StartupError};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Load configuration, connect the backing services and serve until
/// Ctrl-C or SIGTERM. Missing required variables start the server in
/// error mode instead of exiting.
pub async fn run() -> Result<(), RunError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {e}");
        }
    }
    init_tracing();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let (app, port) = match Config::from_env() {
        Ok(config) => {
            let core = CoreState::connect(&config).await?;
            (api::api_router(Arc::new(core)), config.port)
        }
        Err(ConfigError::Missing(missing)) => {
            tracing::error!(
                missing = %missing.join(", "),
                "Missing required environment variables, serving in error mode"
            );
            let missing = missing.into_iter().map(str::to_string).collect();
            (api::misconfigured_router(missing), config::port_from_env())
        }
        Err(e) => return Err(e.into()),
    };

    let addr = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), port);
    let mut server = api::start_api_server_on(app, addr).await?;
    tracing::info!(
        addr = %server.session.server_addr,
        started_at = %server.session.started_at,
        "MedASK API ready"
    );

    api::shutdown_signal().await;
    server.shutdown();
    server.stopped().await;
    Ok(())
}
