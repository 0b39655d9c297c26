//! Session tokens.
//!
//! Short-lived access and longer-lived refresh JWTs, HS256-signed with the
//! configured secret. Refresh tokens are revocable: logout stores the token's
//! SHA-256 digest in the `revoked_tokens` table and every later use checks it.

pub mod password;
pub mod revocation;

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::domain::{User, UserRole};

/// Token error type
#[derive(Debug)]
pub enum TokenError {
    /// Malformed, tampered or otherwise undecodable token
    Invalid(String),
    /// Well-formed but past its expiry
    Expired,
    /// A refresh token presented where an access token is required, or vice versa
    WrongKind,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Invalid(s) => write!(f, "Invalid token: {s}"),
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::WrongKind => write!(f, "Wrong token kind"),
        }
    }
}

impl std::error::Error for TokenError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    pub role: UserRole,
    pub kind: TokenKind,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and verifies session tokens with one symmetric key.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_seconds: u64,
    refresh_ttl_seconds: u64,
}

impl TokenIssuer {
    pub fn new(cfg: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(cfg.secret.as_bytes()),
            access_ttl_seconds: cfg.access_ttl_seconds,
            refresh_ttl_seconds: cfg.refresh_ttl_seconds,
        }
    }

    fn mint(&self, user: &User, kind: TokenKind, ttl_seconds: u64) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            role: user.effective_role(),
            kind,
            jti: Uuid::new_v4().simple().to_string(),
            iat: now,
            exp: now + ttl_seconds as i64,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }

    /// Issue an access token for the user.
    pub fn issue_access(&self, user: &User) -> Result<String, TokenError> {
        self.mint(user, TokenKind::Access, self.access_ttl_seconds)
    }

    /// Issue a fresh access/refresh pair.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.mint(user, TokenKind::Access, self.access_ttl_seconds)?,
            refresh: self.mint(user, TokenKind::Refresh, self.refresh_ttl_seconds)?,
        })
    }

    /// Decode and validate a token, checking signature, expiry and kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default()).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            },
        )?;
        if data.claims.kind != expected {
            return Err(TokenError::WrongKind);
        }
        Ok(data.claims)
    }
}

/// Stable digest of a token for the revocation list.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&AuthConfig {
            secret: "unit-test-secret".to_string(),
            access_ttl_seconds: 900,
            refresh_ttl_seconds: 3600,
        })
    }

    fn test_user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "employee1".to_string(),
            email: "employee1@example.com".to_string(),
            password_hash: String::new(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            role,
            is_superuser: false,
            is_staff: false,
            is_active: true,
            phone: None,
            country: None,
            city: None,
            address: None,
            email_notifications: true,
            sms_notifications: false,
            timezone: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let issuer = issuer();
        let user = test_user(UserRole::Employee);
        let pair = issuer.issue_pair(&user).unwrap();

        let access = issuer.verify(&pair.access, TokenKind::Access).unwrap();
        assert_eq!(access.sub, user.id);
        assert_eq!(access.role, UserRole::Employee);

        let refresh = issuer.verify(&pair.refresh, TokenKind::Refresh).unwrap();
        assert_eq!(refresh.sub, user.id);
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let issuer = issuer();
        let pair = issuer.issue_pair(&test_user(UserRole::Admin)).unwrap();

        assert!(matches!(
            issuer.verify(&pair.refresh, TokenKind::Access),
            Err(TokenError::WrongKind)
        ));
        assert!(matches!(
            issuer.verify(&pair.access, TokenKind::Refresh),
            Err(TokenError::WrongKind)
        ));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let issuer = issuer();
        assert!(matches!(
            issuer.verify("not.a.token", TokenKind::Access),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let issuer = issuer();
        let other = TokenIssuer::new(&AuthConfig {
            secret: "some-other-secret".to_string(),
            access_ttl_seconds: 900,
            refresh_ttl_seconds: 3600,
        });
        let pair = other.issue_pair(&test_user(UserRole::Admin)).unwrap();
        assert!(issuer.verify(&pair.access, TokenKind::Access).is_err());
    }

    #[test]
    fn test_claims_carry_effective_role() {
        let issuer = issuer();
        let mut user = test_user(UserRole::Customer);
        user.is_superuser = true;
        let token = issuer.issue_access(&user).unwrap();
        let claims = issuer.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.role, UserRole::SuperAdmin);
    }

    #[test]
    fn test_token_digest_is_hex_sha256() {
        let d = token_digest("abc");
        assert_eq!(d.len(), 64);
        assert_eq!(
            d,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(token_digest("abd"), d);
    }
}
