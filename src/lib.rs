//! Roompass - room-scoped access tokens for real-time communication
//!
//! Builds a least-privilege scope for one room of an application, stamps it
//! with a 15 minute validity window and signs it with the deployment's shared
//! secret. Relays holding the same secret verify tokens offline.

pub mod auth;
pub mod config;
pub mod rooms;
pub mod server;

pub use auth::{AuthScope, Claims, IssueError, ScopeBuilder, SignedToken, TokenIssuer, TokenVerifier};
pub use config::{ConfigurationError, IssuerConfig, SigningSecret};
pub use rooms::{Room, RoomPolicy};
pub use server::{create_router, AppState};
