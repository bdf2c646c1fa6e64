//! HTTP API handlers for vvv-bot

pub mod buildinfo;
pub mod health;
pub mod message;

pub use buildinfo::get_build_info;
pub use health::{health_routes, keep_alive};
pub use message::post_message;
