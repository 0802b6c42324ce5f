//! HTTP Layer - JSON API
//!
//! 所有端点挂在 `/api` 下，错误统一为 `{error, type}`

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;


pub use error::ApiError;
pub use routes::create_routes;
pub use server::{build_router, cors_layer, HttpServer, ServerConfig};
pub use state::{AppPorts, AppSettings, AppState, ProviderFlags, ServiceInfo};
