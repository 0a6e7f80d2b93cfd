//! Web layer: status and schedule endpoints, the event WebSocket, and the
//! static map assets.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
