pub mod backend;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;

pub use backend::{BackendClient, BackendRootResponse, CountLettersResponse};
pub use error::ApiError;
pub use router::AskRequest;
pub use server::{AppState, GatewayServer};
