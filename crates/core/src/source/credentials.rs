use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An encrypted textual encoding of credential material, safe to persist
///
/// The core never inspects the contents; only the encryption provider can
/// produce or consume them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecureString(String);

impl SecureString {
    pub fn new(value: impl Into<String>) -> Self {
        SecureString(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        SecureString(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        SecureString(value.to_string())
    }
}

/// Decrypted, structured credential material
///
/// `kind` names the datasource the credentials unlock (file, webdav, ...);
/// it becomes the source's type after a successful unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Credentials {
    pub kind: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl Credentials {
    pub fn new(kind: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            kind: kind.into(),
            password: password.into(),
            data: BTreeMap::new(),
        }
    }
}

/// One credential field of a source: encrypted at rest, decrypted only
/// while the source is unlocked
#[derive(Debug, Clone)]
pub enum CredentialState {
    Encrypted(SecureString),
    Decrypted(Credentials),
}

impl CredentialState {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, CredentialState::Encrypted(_))
    }

    pub fn secure(&self) -> Option<&SecureString> {
        match self {
            CredentialState::Encrypted(secure) => Some(secure),
            CredentialState::Decrypted(_) => None,
        }
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            CredentialState::Encrypted(_) => None,
            CredentialState::Decrypted(credentials) => Some(credentials),
        }
    }
}
