use std::sync::Arc;

use crate::services::exchange::TokenExchangeService;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// The exchange service; immutable after construction
    pub exchange: Arc<TokenExchangeService>,
}

impl AppState {
    pub fn new(exchange: TokenExchangeService) -> Self {
        Self {
            exchange: Arc::new(exchange),
        }
    }
}
