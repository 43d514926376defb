//! Token issuance and verification
//!
//! Tokens are compact HS256 JWS strings:
//! `base64url(header).base64url(claims).base64url(HMAC-SHA256(secret, header.claims))`
//!
//! Any holder of the signing secret can check authenticity and expiry offline.

use crate::auth::scope::{AuthScope, ScopeBuilder};
use crate::config::{ConfigurationError, IssuerConfig, SigningSecret};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Fixed validity window of every token
pub const TOKEN_LIFETIME_SECS: u64 = 15 * 60;

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

type HmacSha256 = Hmac<Sha256>;

/// Failure while serializing or signing claims
#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("failed to serialize token claims: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

/// Everything that can stop an issuance request
#[derive(Debug, Error)]
pub enum IssueError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("token issuance failed: {0}")]
    Issuance(#[from] IssuanceError),
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid token format")]
    InvalidFormat,

    #[error("unsupported token algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token decode error: {0}")]
    DecodeError(String),

    #[error("token expired at {exp} (now {now})")]
    Expired { exp: u64, now: u64 },

    #[error("token expiry {exp} is not after issue time {iat}")]
    InvalidLifetime { iat: u64, exp: u64 },
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Signed payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Random per-token identifier, for replay and audit at the verifier
    pub jti: String,
    /// Issued at, epoch seconds
    pub iat: u64,
    /// Expiry, epoch seconds
    pub exp: u64,
    pub scope: AuthScope,
}

impl Claims {
    /// Fresh claims valid for [`TOKEN_LIFETIME_SECS`] from `iat`
    pub fn new(scope: AuthScope, iat: u64) -> Self {
        Self {
            jti: Uuid::new_v4().to_string(),
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
            scope,
        }
    }

    pub fn lifetime(&self) -> u64 {
        self.exp.saturating_sub(self.iat)
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.exp
    }
}

/// An encoded token together with the claims it carries
#[derive(Debug, Clone)]
pub struct SignedToken {
    token: String,
    claims: Claims,
}

impl SignedToken {
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn into_string(self) -> String {
        self.token
    }
}

impl fmt::Display for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token)
    }
}

/// Sign claims with the shared secret
pub fn sign(claims: Claims, secret: &SigningSecret) -> Result<SignedToken, IssuanceError> {
    let header = Header {
        alg: ALGORITHM.to_string(),
        typ: TOKEN_TYPE.to_string(),
    };
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
    let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| IssuanceError::InvalidKey(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(SignedToken {
        token: format!("{}.{}", signing_input, signature_b64),
        claims,
    })
}

/// Issues tokens for the configured application
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: IssuerConfig,
}

impl TokenIssuer {
    pub fn new(config: IssuerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Scope builder for the configured app id and room policy
    pub fn scope_builder(&self) -> Result<ScopeBuilder, ConfigurationError> {
        let credentials = self.config.credentials()?;
        Ok(ScopeBuilder::new(credentials.app_id)?.with_room_policy(self.config.room_policy))
    }

    /// Stamp `scope` with a fresh id and validity window, then sign it
    pub fn issue(&self, scope: AuthScope) -> Result<SignedToken, IssueError> {
        let credentials = self.config.credentials()?;
        let token = sign(Claims::new(scope, now_secs()), credentials.secret)?;

        debug!(
            jti = %token.claims.jti,
            exp = token.claims.exp,
            channels = token.claims.scope.app.channels.len(),
            "Issued token"
        );

        Ok(token)
    }

    /// Build the scope for `room` (wildcard when `None` or empty) and issue it
    pub fn issue_for_room(&self, room: Option<&str>) -> Result<SignedToken, IssueError> {
        let scope = self.scope_builder()?.build(room);
        self.issue(scope)
    }
}

/// Offline verifier holding the shared secret
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    secret: SigningSecret,
}

impl TokenVerifier {
    pub fn new(secret: SigningSecret) -> Self {
        Self { secret }
    }

    /// Verify signature and expiry against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        self.verify_at(token, now_secs())
    }

    pub fn verify_at(&self, token: &str, now: u64) -> Result<Claims, VerifyError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(VerifyError::InvalidFormat);
        }

        let (header_b64, claims_b64, signature_b64) = (parts[0], parts[1], parts[2]);

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| VerifyError::InvalidSignature)?;

        // Constant-time comparison via verify_slice
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| VerifyError::InvalidSignature)?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| VerifyError::InvalidSignature)?;

        let header: Header = decode_segment(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(VerifyError::UnsupportedAlgorithm(header.alg));
        }

        let claims: Claims = decode_segment(claims_b64)?;
        if claims.exp <= claims.iat {
            return Err(VerifyError::InvalidLifetime {
                iat: claims.iat,
                exp: claims.exp,
            });
        }
        if claims.is_expired_at(now) {
            return Err(VerifyError::Expired {
                exp: claims.exp,
                now,
            });
        }

        Ok(claims)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, VerifyError> {
    let json = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| VerifyError::DecodeError(e.to_string()))?;
    serde_json::from_slice(&json).map_err(|e| VerifyError::DecodeError(e.to_string()))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-signing";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(IssuerConfig::new(
            Some("app-123".to_string()),
            Some(TEST_SECRET.to_string()),
        ))
    }

    fn verifier(secret: &str) -> TokenVerifier {
        TokenVerifier::new(SigningSecret::new(secret))
    }

    #[test]
    fn test_issue_and_verify() {
        let token = issuer().issue_for_room(Some("lobby-42")).unwrap();
        assert_eq!(token.as_str().split('.').count(), 3);

        let claims = verifier(TEST_SECRET).verify(token.as_str()).unwrap();
        assert_eq!(&claims, token.claims());
        assert_eq!(claims.scope.app.id, "app-123");
        assert_eq!(claims.scope.app.channels[0].name, "lobby-42");
    }

    #[test]
    fn test_lifetime_is_fifteen_minutes() {
        let token = issuer().issue_for_room(None).unwrap();
        assert_eq!(token.claims().exp - token.claims().iat, 900);
        assert_eq!(token.claims().lifetime(), TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn test_jti_is_unique_scope_is_not() {
        let issuer = issuer();
        let a = issuer.issue_for_room(Some("lobby")).unwrap();
        let b = issuer.issue_for_room(Some("lobby")).unwrap();

        assert_ne!(a.claims().jti, b.claims().jti);
        assert_eq!(a.claims().scope, b.claims().scope);
        assert!(Uuid::parse_str(&a.claims().jti).is_ok());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issuer().issue_for_room(Some("lobby")).unwrap();
        let result = verifier("wrong-secret").verify(token.as_str());
        assert!(matches!(result, Err(VerifyError::InvalidSignature)));
    }

    #[test]
    fn test_missing_configuration() {
        let cases = [
            (None, Some("s"), ConfigurationError::MissingAppId),
            (Some("a"), None, ConfigurationError::MissingSecret),
            (None, None, ConfigurationError::MissingCredentials),
        ];

        for (app_id, secret, expected) in cases {
            let issuer = TokenIssuer::new(IssuerConfig::new(
                app_id.map(String::from),
                secret.map(String::from),
            ));
            match issuer.issue_for_room(Some("lobby")) {
                Err(IssueError::Configuration(e)) => assert_eq!(e, expected),
                other => panic!("expected configuration error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_issue_prebuilt_scope_still_checks_config() {
        let scope = ScopeBuilder::new("app-123").unwrap().build(Some("lobby"));
        let issuer = TokenIssuer::new(IssuerConfig::new(Some("app-123".into()), None));
        assert!(matches!(
            issuer.issue(scope),
            Err(IssueError::Configuration(ConfigurationError::MissingSecret))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = issuer().issue_for_room(None).unwrap();
        let exp = token.claims().exp;
        let v = verifier(TEST_SECRET);

        assert!(v.verify_at(token.as_str(), exp - 1).is_ok());
        assert!(matches!(
            v.verify_at(token.as_str(), exp),
            Err(VerifyError::Expired { .. })
        ));
    }

    #[test]
    fn test_tampered_claims_are_rejected() {
        let token = issuer().issue_for_room(Some("lobby")).unwrap();
        let parts: Vec<&str> = token.as_str().split('.').collect();

        let mut claims = token.claims().clone();
        claims.scope.app.channels[0].name = "*".to_string();
        let forged_claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);

        let result = verifier(TEST_SECRET).verify(&forged);
        assert!(matches!(result, Err(VerifyError::InvalidSignature)));
    }

    #[test]
    fn test_malformed_tokens() {
        let v = verifier(TEST_SECRET);
        assert!(matches!(v.verify("not-a-token"), Err(VerifyError::InvalidFormat)));
        assert!(matches!(v.verify("a.b.c.d"), Err(VerifyError::InvalidFormat)));
        assert!(matches!(v.verify("a.b.!!!"), Err(VerifyError::InvalidSignature)));
    }

    #[test]
    fn test_inverted_lifetime_is_rejected() {
        let scope = ScopeBuilder::new("app-123").unwrap().build(None);
        let mut claims = Claims::new(scope, 1_000);
        claims.exp = claims.iat;
        let token = sign(claims, &SigningSecret::new(TEST_SECRET)).unwrap();

        let result = verifier(TEST_SECRET).verify_at(token.as_str(), 500);
        assert!(matches!(result, Err(VerifyError::InvalidLifetime { .. })));
    }

    #[test]
    fn test_header_is_hs256_jwt() {
        let token = issuer().issue_for_room(None).unwrap();
        let header_b64 = token.as_str().split('.').next().unwrap();
        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header_b64).unwrap()).unwrap();
        assert_eq!(header, serde_json::json!({ "alg": "HS256", "typ": "JWT" }));
    }

    #[test]
    fn test_sanitize_policy_flows_through_issuer() {
        let config = IssuerConfig::new(Some("app".into()), Some(TEST_SECRET.into()))
            .with_room_policy(crate::rooms::RoomPolicy::Sanitize);
        let token = TokenIssuer::new(config).issue_for_room(Some("a b/c")).unwrap();
        assert_eq!(token.claims().scope.app.channels[0].name, "abc");
    }
}
