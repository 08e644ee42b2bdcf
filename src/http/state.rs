use crate::gateway::GatewayHandle;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Entry point to the single provider worker
    pub gateway: GatewayHandle,
}

impl AppState {
    pub fn new(gateway: GatewayHandle) -> Self {
        Self { gateway }
    }
}
