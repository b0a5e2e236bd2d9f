pub mod account;
pub mod auth;
pub mod request;

pub use account::{AccountClient, AccountError};
pub use auth::{Anonymous, AuthProvider, StaticValue};
pub use request::{ApiClient, ClientError, DEFAULT_BASE_URL};
