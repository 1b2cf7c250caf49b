pub mod auth;
pub mod payload;
pub mod response;

pub use auth::{authorize, ensure_owner, CurrentAccount};
pub use payload::JsonPayload;
pub use response::ApiResponse;
