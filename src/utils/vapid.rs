//! VAPID key handling (RFC 8292).
//!
//! Credentials are built from [`AppConfig`] once per dispatch. Key pairs are
//! generated out-of-band with the `generate-vapid-keys` subcommand and supplied
//! through the environment.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL};
use p256::ecdsa::SigningKey;
use p256::elliptic_curve::rand_core::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{AppConfig, ConfigError};

#[derive(Debug, Error)]
pub enum VapidKeyError {
    #[error("Invalid base64url for VAPID {0} key")]
    Encoding(&'static str),

    #[error("VAPID public key must be a 65-byte uncompressed P-256 point")]
    PublicKeyShape,

    #[error("VAPID private key must be a 32-byte P-256 scalar, got {0} bytes")]
    PrivateKeyLength(usize),

    #[error("VAPID private key is not a valid P-256 scalar")]
    PrivateKeyScalar,
}

/// A P-256 key pair encoded the way browsers and the `web-push` crate expect.
///
/// The public key is the uncompressed SEC1 point (65 bytes), the private key the
/// raw 32-byte scalar, both base64url without padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidKeyPair {
    pub public_key: String,
    pub private_key: String,
}

impl VapidKeyPair {
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let public_point = signing_key.verifying_key().to_encoded_point(false);

        Self {
            public_key: BASE64URL.encode(public_point.as_bytes()),
            private_key: BASE64URL.encode(signing_key.to_bytes().as_slice()),
        }
    }

    /// Validates an existing pair.
    pub fn from_base64url(public_key: &str, private_key: &str) -> Result<Self, VapidKeyError> {
        let pub_bytes = BASE64URL.decode(public_key).map_err(|_| VapidKeyError::Encoding("public"))?;
        if pub_bytes.len() != 65 || pub_bytes.first() != Some(&0x04) {
            return Err(VapidKeyError::PublicKeyShape);
        }

        validate_private_key(private_key)?;

        Ok(Self {
            public_key: public_key.to_string(),
            private_key: private_key.to_string(),
        })
    }

    /// Lines suitable for an env file.
    pub fn to_env_lines(&self) -> String {
        format!("VAPID_PUBLIC_KEY={}\nVAPID_PRIVATE_KEY={}\n", self.public_key, self.private_key)
    }
}

/// Checks that a private key decodes to a usable P-256 scalar.
pub fn validate_private_key(private_key: &str) -> Result<(), VapidKeyError> {
    let priv_bytes = BASE64URL.decode(private_key).map_err(|_| VapidKeyError::Encoding("private"))?;
    if priv_bytes.len() != 32 {
        return Err(VapidKeyError::PrivateKeyLength(priv_bytes.len()));
    }
    SigningKey::from_bytes(priv_bytes.as_slice().into()).map_err(|_| VapidKeyError::PrivateKeyScalar)?;
    Ok(())
}

/// Everything needed to sign an outgoing push message.
#[derive(Clone)]
pub struct VapidCredentials {
    pub public_key: String,
    pub private_key: String,
    pub subject: String,
}

impl std::fmt::Debug for VapidCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidCredentials")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .field("subject", &self.subject)
            .finish()
    }
}

impl VapidCredentials {
    /// Fails when either key is absent or empty.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let public_key = non_empty(config.vapid_public_key.as_deref()).ok_or(ConfigError::MissingVapidKeys)?;
        let private_key = non_empty(config.vapid_private_key.as_deref()).ok_or(ConfigError::MissingVapidKeys)?;

        Ok(Self {
            public_key: public_key.to_string(),
            private_key: private_key.to_string(),
            subject: config.vapid_subject.clone(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
