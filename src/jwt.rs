//! JWT token issuance and verification.
//!
//! Access and refresh tokens share one claim shape and one signing key; they
//! differ only in lifetime and in how they travel (bearer header vs cookie).

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Access token lifetime: 1 minute
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(60);

/// Refresh token lifetime: 30 days
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id (user UUID)
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    /// Token lifetime in seconds
    pub duration: u64,
}

/// Signs and verifies tokens with a single HS256 key.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    /// Create a token service with the given secret. An empty secret is rejected.
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingKey);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    /// Issue a token for a user, valid for `ttl` from now.
    pub fn issue(&self, user_id: &str, ttl: Duration) -> Result<IssuedToken, TokenError> {
        self.issue_at(user_id, ttl, unix_now()?)
    }

    /// Issue a token as if the current time were `now` (Unix seconds).
    pub fn issue_at(
        &self,
        user_id: &str,
        ttl: Duration,
        now: u64,
    ) -> Result<IssuedToken, TokenError> {
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: now,
            exp: now + ttl.as_secs(),
        };

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )
        .map_err(TokenError::Encoding)?;

        Ok(IssuedToken {
            token,
            duration: ttl.as_secs(),
        })
    }

    /// Verify a token's signature and expiry against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, unix_now()?)
    }

    /// Verify a token as if the current time were `now` (Unix seconds).
    /// A token is expired from the instant `now` reaches `exp`.
    pub fn verify_at(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        // Expiry is checked below against `now` so the clock stays injectable.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::InvalidToken)?;

        if now >= token_data.claims.exp {
            return Err(TokenError::InvalidToken);
        }

        Ok(token_data.claims)
    }
}

fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::TimeError)
}

/// Errors that can occur during token operations.
#[derive(Debug)]
pub enum TokenError {
    /// No key material was supplied
    MissingKey,
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Bad signature, malformed, or expired
    InvalidToken,
    /// System time error
    TimeError,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::MissingKey => write!(f, "Token signing key is missing"),
            TokenError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            TokenError::InvalidToken => write!(f, "Invalid or expired token"),
            TokenError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for TokenError {}
