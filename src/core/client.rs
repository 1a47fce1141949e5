//! Wiring of storage, session, gateway and services for one process.

use crate::core::auth::AuthService;
use crate::core::chat::ChatService;
use crate::core::config::Config;
use crate::core::gateway::{ApiError, RequestGateway};
use crate::core::session::{HistoryCache, PersistentSession, SessionStore, Storage};
use std::error::Error;
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs to talk to the backend as the current user.
#[derive(Clone)]
pub struct ResiliaClient {
    pub session: Arc<dyn SessionStore>,
    pub history: HistoryCache,
    pub auth: AuthService,
    pub chat: ChatService,
    gateway: RequestGateway,
}

impl ResiliaClient {
    pub fn new(base_url: &str, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let session: Arc<dyn SessionStore> = Arc::new(PersistentSession::new(storage.clone()));
        let gateway = RequestGateway::new(base_url, session.clone())?;
        Ok(Self::from_parts(gateway, session, storage))
    }

    /// Assemble from an already configured gateway; its interceptors are kept as-is.
    pub fn from_parts(
        gateway: RequestGateway,
        session: Arc<dyn SessionStore>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            history: HistoryCache::new(storage),
            auth: AuthService::new(gateway.clone(), session.clone()),
            chat: ChatService::new(gateway.clone()),
            session,
            gateway,
        }
    }

    pub fn from_config(
        config: &Config,
        base_url_override: Option<&str>,
    ) -> Result<Self, Box<dyn Error>> {
        let base_url = config.resolve_base_url(base_url_override);
        let storage = config.open_storage()?;
        debug!(%base_url, storage = %config.storage_kind(), "Initializing client");
        Ok(Self::new(&base_url, storage)?)
    }

    pub fn base_url(&self) -> &str {
        self.gateway.base_url()
    }
}
