pub mod agents;
pub mod error;
pub mod handlers;
pub mod init;
pub mod models;
pub mod sources;

pub use crate::handlers::create_router;
pub use crate::init::{AppState, Config, app_init};
