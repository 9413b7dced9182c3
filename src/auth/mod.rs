// Authentication module
// Client-credentials token exchange and token lifecycle

mod credentials;
mod exchange;
mod manager;
mod types;

pub use credentials::Credentials;
pub use manager::TokenManager;
pub use types::{TokenResponse, TokenState, TOKEN_SAFETY_MARGIN_SECS};
