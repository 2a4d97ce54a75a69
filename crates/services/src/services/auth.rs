//! Google sign-in and the session tokens issued afterwards.

use std::{sync::Arc, time::Duration as StdDuration};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use db::models::user::User;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, jwk::JwkSet};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_rs::TS;
use utils::jwt::{SessionClaims, SessionKeys, TokenError, TokenType};
use uuid::Uuid;

pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
const JWKS_TTL: StdDuration = StdDuration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid Google token: {0}")]
    InvalidGoogleToken(String),
    #[error("Google sign-in unavailable: {0}")]
    GoogleUnavailable(String),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("user no longer exists")]
    UserNotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleIdentity {
    pub google_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[async_trait]
pub trait GoogleTokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AuthError>;
}

#[derive(Debug, Clone, Deserialize)]
struct GoogleClaims {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

fn identity_from_claims(claims: GoogleClaims) -> Result<GoogleIdentity, AuthError> {
    let email = claims
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AuthError::InvalidGoogleToken("token carries no email".to_string()))?;
    if claims.sub.is_empty() {
        return Err(AuthError::InvalidGoogleToken(
            "token carries no subject".to_string(),
        ));
    }
    if !claims.email_verified {
        return Err(AuthError::InvalidGoogleToken(
            "email not verified with Google".to_string(),
        ));
    }
    Ok(GoogleIdentity {
        google_id: claims.sub,
        email,
        name: claims.name.unwrap_or_default(),
        picture: claims.picture,
    })
}

/// Verifies RS256 ID tokens against Google's published signing keys.
pub struct GoogleJwksVerifier {
    http: reqwest::Client,
    client_id: String,
    jwks_url: String,
    keys: Cache<String, DecodingKey>,
}

impl GoogleJwksVerifier {
    pub fn new(client_id: String) -> Self {
        Self::with_jwks_url(client_id, GOOGLE_JWKS_URL.to_string())
    }

    pub fn with_jwks_url(client_id: String, jwks_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            jwks_url,
            keys: Cache::builder().max_capacity(16).time_to_live(JWKS_TTL).build(),
        }
    }

    async fn refresh_keys(&self) -> Result<(), AuthError> {
        let set: JwkSet = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| AuthError::GoogleUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::GoogleUnavailable(e.to_string()))?;

        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => self.keys.insert(kid, key).await,
                Err(e) => warn!(%kid, error = %e, "Ignoring unusable Google signing key"),
            }
        }
        debug!(keys = set.keys.len(), "Refreshed Google signing keys");
        Ok(())
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(key) = self.keys.get(kid).await {
            return Ok(key);
        }
        self.refresh_keys().await?;
        self.keys.get(kid).await.ok_or_else(|| {
            AuthError::InvalidGoogleToken(format!("unknown signing key {kid}"))
        })
    }
}

#[async_trait]
impl GoogleTokenVerifier for GoogleJwksVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AuthError> {
        let header = jsonwebtoken::decode_header(id_token)
            .map_err(|e| AuthError::InvalidGoogleToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidGoogleToken("token has no key id".to_string()))?;
        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.client_id]);
        validation.set_issuer(&GOOGLE_ISSUERS);
        let data = jsonwebtoken::decode::<GoogleClaims>(id_token, &key, &validation)
            .map_err(|e| AuthError::InvalidGoogleToken(e.to_string()))?;

        identity_from_claims(data.claims)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    #[ts(type = "number")]
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    #[ts(type = "number")]
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    keys: SessionKeys,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    verifier: Arc<dyn GoogleTokenVerifier>,
}

impl AuthService {
    pub fn new(
        pool: SqlitePool,
        settings: &AuthSettings,
        verifier: Arc<dyn GoogleTokenVerifier>,
    ) -> Self {
        Self {
            pool,
            keys: SessionKeys::from_secret(settings.jwt_secret.as_bytes()),
            access_token_ttl: settings.access_token_ttl,
            refresh_token_ttl: settings.refresh_token_ttl,
            verifier,
        }
    }

    pub async fn verify_google_token(&self, id_token: &str) -> Result<GoogleIdentity, AuthError> {
        let identity = self.verifier.verify(id_token).await?;
        debug!(google_id = %identity.google_id, "Verified Google token");
        Ok(identity)
    }

    fn sign(&self, user: &User, token_type: TokenType, ttl: Duration) -> Result<String, AuthError> {
        let claims = SessionClaims::new(
            user.id,
            &user.google_id,
            &user.email,
            token_type,
            Utc::now(),
            ttl,
        );
        Ok(self.keys.sign(&claims)?)
    }

    pub fn issue_tokens(&self, user: &User) -> Result<TokenPair, AuthError> {
        let pair = TokenPair {
            access_token: self.sign(user, TokenType::Access, self.access_token_ttl)?,
            refresh_token: self.sign(user, TokenType::Refresh, self.refresh_token_ttl)?,
            token_type: "bearer".to_string(),
            expires_in: self.access_token_ttl.num_seconds(),
        };
        info!(user_id = %user.id, "Issued session tokens");
        Ok(pair)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<SessionClaims, AuthError> {
        Ok(self.keys.verify(token, TokenType::Access)?)
    }

    /// Resolve a bearer access token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.verify_access_token(token)?;
        self.load_user(claims.sub).await
    }

    /// New access token for a still-existing user.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<AccessToken, AuthError> {
        let claims = self.keys.verify(refresh_token, TokenType::Refresh)?;
        let user = self.load_user(claims.sub).await?;
        let access_token = self.sign(&user, TokenType::Access, self.access_token_ttl)?;
        info!(user_id = %user.id, "Refreshed access token");
        Ok(AccessToken {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.access_token_ttl.num_seconds(),
        })
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        User::find_by_id(&self.pool, user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
