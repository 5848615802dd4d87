//! HTTP API.
//!
//! Exposes prescription analysis, remedies, chat and the symptom journal
//! as JSON endpoints under `/api/`. `api_router()` returns a `Router`
//! that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::{api_router, misconfigured_router};
pub use server::{shutdown_signal, start_api_server_on, ApiServer, ServerError};
pub use types::ApiContext;
