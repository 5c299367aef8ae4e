//! JWT token issuance and validation
//!
//! Access and refresh tokens carry the same identity payload but are signed
//! with separate secrets and expiries. Keys are derived once and shared.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// Who a token speaks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub name: String,
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token type: "access" or "refresh"
    pub token_type: String,
    /// Unique per token; two tokens issued in the same second still differ
    pub jti: String,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Token errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("expected {expected} token")]
    WrongType { expected: &'static str },

    #[error("failed to sign token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),

    #[error("token expiry of {0}s is out of range")]
    ExpiryOutOfRange(i64),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(err.to_string()),
        }
    }
}

/// Signing and verification keys for one token kind
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: Arc::new(EncodingKey::from_secret(bytes)),
            decoding: Arc::new(DecodingKey::from_secret(bytes)),
        }
    }
}

/// Issues and verifies access and refresh tokens
///
/// Stateless: nothing is recorded server-side here. Whether a refresh token
/// is still the current one is decided by the account service against the
/// stored user record.
#[derive(Clone)]
pub struct TokenIssuer {
    access: JwtKeys,
    refresh: JwtKeys,
    access_expiry_secs: i64,
    refresh_expiry_secs: i64,
    validation: Arc<Validation>,
}

impl TokenIssuer {
    /// Create an issuer with pre-computed keys. Call once at startup.
    pub fn new(
        access_secret: &SecretString,
        refresh_secret: &SecretString,
        access_expiry_secs: i64,
        refresh_expiry_secs: i64,
    ) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            access: JwtKeys::new(access_secret),
            refresh: JwtKeys::new(refresh_secret),
            access_expiry_secs,
            refresh_expiry_secs,
            validation: Arc::new(validation),
        }
    }

    pub fn from_config(config: &crate::config::JwtConfig) -> Self {
        Self::new(
            &config.access_secret,
            &config.refresh_secret,
            config.access_token_expiry_secs,
            config.refresh_token_expiry_secs,
        )
    }

    #[inline]
    pub fn issue_access(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue(identity, ACCESS, &self.access, self.access_expiry_secs)
    }

    #[inline]
    pub fn issue_refresh(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue(identity, REFRESH, &self.refresh, self.refresh_expiry_secs)
    }

    fn issue(
        &self,
        identity: &Identity,
        token_type: &str,
        keys: &JwtKeys,
        expiry_secs: i64,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = Duration::try_seconds(expiry_secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(TokenError::ExpiryOutOfRange(expiry_secs))?;
        let claims = Claims {
            name: identity.name.clone(),
            email: identity.email.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &keys.encoding).map_err(TokenError::Encoding)
    }

    /// Verify signature, expiry and type of an access token
    #[inline]
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, ACCESS, &self.access)
    }

    /// Verify signature, expiry and type of a refresh token
    #[inline]
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, REFRESH, &self.refresh)
    }

    fn verify(
        &self,
        token: &str,
        expected: &'static str,
        keys: &JwtKeys,
    ) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &keys.decoding, &self.validation)?.claims;
        if claims.token_type != expected {
            return Err(TokenError::WrongType { expected });
        }
        Ok(claims)
    }

    #[inline]
    pub fn access_expiry_secs(&self) -> i64 {
        self.access_expiry_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&secret("access-secret"), &secret("refresh-secret"), 900, 604800)
    }

    fn ann() -> Identity {
        Identity {
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
        }
    }

    #[test]
    fn test_access_token_carries_identity() {
        let issuer = issuer();
        let token = issuer.issue_access(&ann()).unwrap();
        let claims = issuer.verify_access(&token).unwrap();

        assert_eq!(claims.identity(), ann());
        assert_eq!(claims.token_type, "access");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        let issuer = issuer();
        let token = issuer.issue_refresh(&ann()).unwrap();
        let claims = issuer.verify_refresh(&token).unwrap();

        assert_eq!(claims.identity(), ann());
        assert_eq!(claims.exp - claims.iat, 604800);
    }

    #[test]
    fn test_tokens_are_unique() {
        let issuer = issuer();
        let first = issuer.issue_refresh(&ann()).unwrap();
        let second = issuer.issue_refresh(&ann()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let issuer = issuer();
        let token = issuer.issue_refresh(&ann()).unwrap();
        // Signed with the other secret, so the signature check fails first
        assert!(matches!(
            issuer.verify_access(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_type_is_checked_even_with_shared_secret() {
        let issuer = TokenIssuer::new(&secret("same"), &secret("same"), 900, 604800);
        let token = issuer.issue_refresh(&ann()).unwrap();
        assert!(matches!(
            issuer.verify_access(&token),
            Err(TokenError::WrongType { expected: "access" })
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new(&secret("a"), &secret("r"), -10, -10);
        let token = issuer.issue_access(&ann()).unwrap();
        assert!(matches!(issuer.verify_access(&token), Err(TokenError::Expired)));
    }

    #[rstest]
    #[case(i64::MAX)]
    #[case(i64::MAX / 2)]
    #[case(i64::MIN)]
    fn test_unrepresentable_expiry_is_an_error(#[case] expiry_secs: i64) {
        let issuer = TokenIssuer::new(&secret("a"), &secret("r"), 900, expiry_secs);

        assert!(matches!(
            issuer.issue_refresh(&ann()),
            Err(TokenError::ExpiryOutOfRange(secs)) if secs == expiry_secs
        ));
        // The other token kind is unaffected
        assert!(issuer.issue_access(&ann()).is_ok());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let other = TokenIssuer::new(&secret("other"), &secret("other-r"), 900, 604800);
        let token = other.issue_access(&ann()).unwrap();
        assert!(issuer().verify_access(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            issuer().verify_access("invalid.token.here"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_issuer_clone_shares_keys() {
        let issuer = issuer();
        let cloned = issuer.clone();
        let token = issuer.issue_access(&ann()).unwrap();
        assert!(cloned.verify_access(&token).is_ok());
    }
}
