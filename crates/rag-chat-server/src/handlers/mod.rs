pub mod chat;
pub mod context;
pub mod fallback;
pub mod health;
pub mod session;
pub mod upload;

pub use chat::chat_handler;
pub use context::clear_context_handler;
pub use fallback::not_found;
pub use health::health_check;
pub use session::SessionKey;
pub use upload::upload_handler;
