//! Shared application state handed to every request handler.

use crate::config::AppSettings;
use crate::token_store::TokenStore;
use broker::BrokerClient;
use std::sync::Arc;

/// State shared across all workers of the actix `HttpServer` (spec C5/C6).
#[derive(Clone)]
pub struct State {
    pub settings: Arc<AppSettings>,
    pub broker: Arc<dyn BrokerClient>,
    pub tokens: Arc<TokenStore>,
}

impl State {
    pub fn new(settings: AppSettings, broker: Arc<dyn BrokerClient>) -> Self {
        let download_ttl = std::time::Duration::from_secs(settings.download_token_ttl_secs);
        State {
            settings: Arc::new(settings),
            broker,
            tokens: Arc::new(TokenStore::new(download_ttl)),
        }
    }
}
