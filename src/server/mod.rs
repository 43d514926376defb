//! Roompass HTTP server
//!
//! Thin axum layer over [`TokenIssuer`](crate::auth::TokenIssuer).

mod http;

pub use http::{create_router, run_server, AppState, ErrorResponse, TokenResponse};
