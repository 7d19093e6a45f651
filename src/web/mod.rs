pub mod forms;
pub mod handlers;
pub mod helpers;
pub mod security;
pub mod session;
pub mod state;
pub mod templates;

pub use handlers::configure;
pub use state::AppState;
