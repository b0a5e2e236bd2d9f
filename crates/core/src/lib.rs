pub mod datetime;
pub mod policy;
pub mod types;

pub use datetime::format_clip_timestamp;
pub use policy::{RegistrationError, RegistrationPolicy, MAX_PASSWORD_LEN, MAX_USERNAME_LEN};
pub use types::{AccountResponse, Credentials, StatusResponse};
