pub mod handlers;
pub mod models;
pub mod relay;
pub mod session;

pub use session::SessionManager;
