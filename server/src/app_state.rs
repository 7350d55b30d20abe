//! Process-wide state handed to every route.
//!
//! One registry instance and one broadcast channel per process. The registry's
//! event sink publishes into the same channel the WebSocket handler
//! subscribes to, so both must come from the same `AppState`.

use std::sync::Arc;

use axum::extract::FromRef;
use oracle_registry::{AuthVerifier, Clock, RegistryError};

use crate::config::ServerConfig;
use crate::services::RegistryService;
use crate::websocket::WsState;

#[derive(Clone)]
pub struct AppState {
    pub registry_service: Arc<RegistryService>,
    pub ws_state: WsState,
}

impl AppState {
    /// Initialize the registry described by `config`, wired to a fresh
    /// broadcast channel of `event_channel_capacity` records.
    pub fn from_config(
        config: &ServerConfig,
        verifier: Box<dyn AuthVerifier>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, RegistryError> {
        let ws_state = WsState::new(config.event_channel_capacity);
        let registry_service = RegistryService::new(
            config.admin_public_key,
            config.registry.clone(),
            verifier,
            clock,
            ws_state.clone(),
        )?;
        Ok(Self {
            registry_service: Arc::new(registry_service),
            ws_state,
        })
    }
}

impl FromRef<AppState> for WsState {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ws_state.clone()
    }
}

impl FromRef<AppState> for Arc<RegistryService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry_service.clone()
    }
}
