pub mod auth_ctx;
pub mod drink_id;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use drink_id::DrinkId;
