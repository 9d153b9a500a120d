//! Shopper-side session state and HTTP client.
//!
//! [`SessionStore`] holds the cart and wishlist a storefront front end works
//! with. It is built explicitly with a [`Persistence`] backend, loads saved
//! state once and saves after every change. Quantity increases are checked
//! against the server through a [`StockChecker`] before they are applied.

mod api;
mod persistence;
mod session;

pub use api::ApiClient;
pub use persistence::{JsonFilePersistence, MemoryPersistence, Persistence};
pub use session::{CartState, LocalCartLine, SessionSnapshot, SessionStore, StockChecker, StockVerdict, WishlistState};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Saved session state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Not signed in")]
    NotSignedIn,
}
