//! Session token encoding (builder) and decoding (reader).
//!
//! Tokens are HS256 JWTs. The optional provider account is sealed with
//! AES-256-GCM before it enters the payload so the bearer cannot read it.

use std::collections::HashSet;

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::claims::{SessionClaims, TokenValidationError, build_claims, validate_claims};
use crate::{Identity, ProviderAccount};

pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;
pub const SESSION_AUDIENCE: &str = "dashgate.session";

const NONCE_SIZE: usize = 12;
const SEAL_KEY_CONTEXT: &[u8] = b"dashgate.provider-account.v1";

pub fn default_session_ttl() -> Duration {
    Duration::days(DEFAULT_SESSION_TTL_DAYS)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("signing secret is empty")]
    InvalidSecret,

    #[error("malformed token")]
    Malformed,

    #[error("token signature does not verify")]
    Signature,

    #[error(transparent)]
    Window(#[from] TokenValidationError),

    #[error("failed to encode token")]
    Encoding,

    #[error("provider account could not be sealed or unsealed")]
    ProviderAccount,
}

/// An encoded, signed session token.
///
/// Deliberately has no `Display`: tokens should not end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: SessionToken,
    pub claims: SessionClaims,
}

/// Read-side contract used by the request boundary.
pub trait SessionReader: Send + Sync {
    fn read(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError>;

    /// Resolve an optional inbound token to the current session.
    ///
    /// Any invalid token resolves to `None`.
    fn current_session(&self, token: Option<&str>, now: DateTime<Utc>) -> Option<SessionClaims> {
        let token = token?;
        match self.read(token, now) {
            Ok(claims) => Some(claims),
            Err(error) => {
                tracing::debug!(%error, "discarding invalid session token");
                None
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireClaims {
    #[serde(flatten)]
    session: SessionClaims,
    aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prv: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct SealedAccount {
    provider: String,
    access_token: String,
}

/// HS256 session token codec. One instance per process, built from the
/// configured signing secret.
#[derive(Clone)]
pub struct SessionTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    seal_key: [u8; 32],
}

impl SessionTokenCodec {
    pub fn new(secret: &SecretString) -> Result<Self, TokenError> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        let mut hasher = Sha256::new();
        hasher.update(SEAL_KEY_CONTEXT);
        hasher.update(bytes);

        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            seal_key: hasher.finalize().into(),
        })
    }

    /// Issue a session for `identity`, valid for `ttl` from `now`.
    pub fn issue(
        &self,
        identity: &Identity,
        provider: Option<&ProviderAccount>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, TokenError> {
        let claims = build_claims(identity, provider, now, ttl)?;
        let token = self.encode(&claims)?;
        Ok(IssuedSession { token, claims })
    }

    pub fn encode(&self, claims: &SessionClaims) -> Result<SessionToken, TokenError> {
        let prv = claims
            .provider
            .as_ref()
            .map(|account| self.seal(account))
            .transpose()?;

        let wire = WireClaims {
            session: claims.clone(),
            aud: SESSION_AUDIENCE.to_string(),
            prv,
        };

        encode(&Header::new(Algorithm::HS256), &wire, &self.encoding)
            .map(SessionToken)
            .map_err(|_| TokenError::Encoding)
    }

    fn decode(&self, token: &str) -> Result<SessionClaims, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Malformed);
        }

        // Expiry is checked against the caller's clock in `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_audience(&[SESSION_AUDIENCE]);
        validation.required_spec_claims =
            HashSet::from(["sub".to_string(), "exp".to_string(), "aud".to_string()]);

        let data = decode::<WireClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::Signature,
                _ => TokenError::Malformed,
            }
        })?;

        let WireClaims { mut session, prv, .. } = data.claims;
        session.provider = prv.as_deref().map(|blob| self.unseal(blob)).transpose()?;
        Ok(session)
    }

    fn seal(&self, account: &ProviderAccount) -> Result<String, TokenError> {
        let json = serde_json::to_vec(&SealedAccount {
            provider: account.provider.clone(),
            access_token: account.access_token.expose_secret().to_string(),
        })
        .map_err(|_| TokenError::ProviderAccount)?;

        let cipher = Aes256Gcm::new(&Key::<Aes256Gcm>::from(self.seal_key));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, json.as_slice())
            .map_err(|_| TokenError::ProviderAccount)?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(combined))
    }

    fn unseal(&self, blob: &str) -> Result<ProviderAccount, TokenError> {
        let decoded = URL_SAFE_NO_PAD
            .decode(blob)
            .map_err(|_| TokenError::ProviderAccount)?;
        if decoded.len() < NONCE_SIZE {
            return Err(TokenError::ProviderAccount);
        }

        let (nonce_bytes, ciphertext) = decoded.split_at(NONCE_SIZE);
        let nonce_bytes: [u8; NONCE_SIZE] = nonce_bytes
            .try_into()
            .map_err(|_| TokenError::ProviderAccount)?;

        let cipher = Aes256Gcm::new(&Key::<Aes256Gcm>::from(self.seal_key));
        let plaintext = cipher
            .decrypt(&Nonce::from(nonce_bytes), ciphertext)
            .map_err(|_| TokenError::ProviderAccount)?;

        let sealed: SealedAccount =
            serde_json::from_slice(&plaintext).map_err(|_| TokenError::ProviderAccount)?;
        Ok(ProviderAccount::new(sealed.provider, sealed.access_token))
    }
}

impl SessionReader for SessionTokenCodec {
    fn read(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let claims = self.decode(token)?;
        validate_claims(&claims, now)?;
        Ok(claims)
    }
}
