use crate::error::{ServerError, ServerErrorExt};
use crate::types::Tokens;
use accounts_domain::config::AccountsConfig;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

const SESSION_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    /// Session token the pair was issued for.
    pub(crate) sid: String,
    pub(crate) kind: TokenKind,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

/// Signs and verifies HS256 access/refresh token pairs.
pub(crate) struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub(crate) fn new(config: &AccountsConfig) -> Self {
        let secret = config.token_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: i64::try_from(config.access_token_ttl).unwrap_or(i64::MAX),
            refresh_ttl: i64::try_from(config.refresh_token_ttl).unwrap_or(i64::MAX),
        }
    }

    pub(crate) fn issue(&self, user_id: &str, session_token: &str) -> Result<Tokens, ServerError> {
        Ok(Tokens {
            access_token: self.sign(user_id, session_token, TokenKind::Access)?,
            refresh_token: self.sign(user_id, session_token, TokenKind::Refresh)?,
        })
    }

    /// Verifies the signature and kind. Expiry is only checked when `check_expiry` is set,
    /// so an expired access token can still be traded in alongside a live refresh token.
    pub(crate) fn verify(
        &self,
        token: &str,
        kind: TokenKind,
        check_expiry: bool,
    ) -> Result<Claims, ServerError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = check_expiry;

        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .context("Verifying token")?
            .claims;
        if claims.kind != kind {
            return Err(ServerError::invalid_session(format!("Expected a {kind:?} token")));
        }
        Ok(claims)
    }

    fn sign(&self, user_id: &str, session_token: &str, kind: TokenKind) -> Result<String, ServerError> {
        let now = Utc::now().timestamp();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id.to_owned(),
            sid: session_token.to_owned(),
            kind,
            iat: now,
            exp: now.saturating_add(ttl),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("Signing token")
    }
}

/// Random hex string identifying a session to its token pair.
pub(crate) fn generate_session_token() -> Result<String, ServerError> {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    getrandom::fill(&mut bytes).map_err(|e| ServerError::Internal {
        message: e.to_string().into(),
        context: Some("Generating session token".into()),
    })?;
    Ok(hex::encode(bytes))
}

/// Random secret used when no signing secret is configured.
pub fn generate_secret() -> Result<String, ServerError> {
    generate_session_token()
}
