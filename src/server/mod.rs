pub mod neterra;
pub mod playlist;
pub mod registry;
pub mod routes;
pub mod session;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Config;
use crate::error::LoginError;
use neterra::{Endpoints, NeterraService};
use registry::ChannelRegistry;
use routes::{build_router, ApiState};
use session::Session;

pub struct AppState {
    pub listen_addr: SocketAddr,
    pub api_state: ApiState,
}

impl AppState {
    pub fn new(config: &Config, registry: ChannelRegistry) -> Result<Self, LoginError> {
        let endpoints = Endpoints::new(&config.base_url);
        let session = Session::new(
            config.credentials.clone(),
            endpoints.login.clone(),
            config.session_ttl,
            config.upstream_timeout,
        )?;

        let neterra = NeterraService::new(
            session,
            endpoints,
            registry,
            config.host.clone(),
            config.port.clone(),
        )
        .with_strict_login(config.strict_login);

        Ok(Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], config.listen_port)),
            api_state: ApiState {
                neterra: Arc::new(neterra),
            },
        })
    }
}

pub async fn start_server(state: AppState) -> std::io::Result<()> {
    let router = build_router(state.api_state.clone());
    let addr = state.listen_addr;

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("failed to bind {addr}: {e}");
        e
    })?;

    info!("HTTP server listening on {addr}");
    axum::serve(listener, router).await
}
