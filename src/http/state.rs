use crate::session::SessionHandle;
use std::sync::Arc;

/// Static facts reported by the health endpoint
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub name: String,
    pub environment: String,
    pub synthesis_primary: bool,
    pub synthesis_fallback: bool,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one interactive session of this process
    pub session: SessionHandle,

    pub info: Arc<ServiceInfo>,
}

impl AppState {
    pub fn new(session: SessionHandle, info: ServiceInfo) -> Self {
        Self {
            session,
            info: Arc::new(info),
        }
    }
}
