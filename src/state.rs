//! Shared application state.

use std::sync::Arc;

use crate::auth::TokenSigner;
use crate::events::EventPublisher;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenSigner>,
    pub events: EventPublisher,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenSigner, events: EventPublisher) -> Self {
        Self { store, tokens: Arc::new(tokens), events }
    }
}
