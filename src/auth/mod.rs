//! Token scopes, issuance and verification
//!
//! Scope tree:
//! - `app`: application id, TURN flag, `read`
//! - `channels`: one room (or `*`), with member and SFU bot templates
//!
//! Actions:
//! - `read`: observe the resource
//! - `write`: join, publish or forward within the resource

mod actions;
mod scope;
mod tokens;

pub use actions::{Action, ActionSet};
pub use scope::{
    ActionGrant, AppGrant, AuthScope, ChannelGrant, MemberGrant, ScopeBuilder, SfuBotGrant,
};
pub use tokens::{
    sign, Claims, IssuanceError, IssueError, SignedToken, TokenIssuer, TokenVerifier,
    VerifyError, TOKEN_LIFETIME_SECS,
};
