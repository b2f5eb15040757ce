use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::source::{Credentials, CredentialsProvider, SecureString};

use super::OpLog;

const SECURE_PREFIX: &str = "sec1:";

#[derive(Serialize, Deserialize)]
struct Sealed {
    password: String,
    credentials: Credentials,
}

/// Reversible, password-checked secure-string codec — NOT encryption
///
/// Secure strings are `sec1:` followed by base64 of the sealed payload.
/// Decryption fails when the presented password differs from the sealing
/// password, mimicking a real provider's wrong-password error. Decrypt and
/// encrypt yield to the scheduler so tests cross real suspension points.
#[derive(Default)]
pub struct PlainCredentialsProvider {
    log: OpLog,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl PlainCredentialsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: OpLog) -> Self {
        PlainCredentialsProvider {
            log,
            gate: Mutex::new(None),
        }
    }

    /// Synchronously produce a secure string (test setup helper)
    pub fn seal(&self, credentials: &Credentials, password: &str) -> SecureString {
        let sealed = Sealed {
            password: password.to_string(),
            credentials: credentials.clone(),
        };
        let json = serde_json::to_string(&sealed).expect("sealed credentials serialize");
        SecureString::new(format!("{SECURE_PREFIX}{}", BASE64.encode(json)))
    }

    /// Hold the next decryption open until the returned sender fires
    ///
    /// Lets a test observe a source mid-transition (status `Pending`).
    pub fn hold_next_decryption(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock() = Some(rx);
        tx
    }

    fn unseal(&self, secure: &SecureString) -> anyhow::Result<Sealed> {
        let payload = secure
            .as_str()
            .strip_prefix(SECURE_PREFIX)
            .ok_or_else(|| anyhow::anyhow!("value is not a secure string"))?;
        let bytes = BASE64
            .decode(payload)
            .map_err(|e| anyhow::anyhow!("corrupt secure string: {e}"))?;
        let sealed = serde_json::from_slice(&bytes)
            .map_err(|e| anyhow::anyhow!("corrupt secure string payload: {e}"))?;
        Ok(sealed)
    }

    async fn wait_gate(&self) {
        let gate = self.gate.lock().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
    }
}

#[async_trait]
impl CredentialsProvider for PlainCredentialsProvider {
    fn is_secure_string(&self, text: &str) -> bool {
        text.starts_with(SECURE_PREFIX)
    }

    async fn from_secure_string(
        &self,
        secure: &SecureString,
        password: &str,
    ) -> anyhow::Result<Credentials> {
        self.log.push("decrypt:start");
        self.wait_gate().await;
        tokio::task::yield_now().await;
        let result = self.unseal(secure).and_then(|sealed| {
            if sealed.password == password {
                Ok(sealed.credentials)
            } else {
                Err(anyhow::anyhow!("invalid password"))
            }
        });
        self.log.push("decrypt:end");
        result
    }

    async fn to_secure_string(
        &self,
        credentials: &Credentials,
        password: &str,
    ) -> anyhow::Result<SecureString> {
        self.log.push("encrypt:start");
        tokio::task::yield_now().await;
        let secure = self.seal(credentials, password);
        self.log.push("encrypt:end");
        Ok(secure)
    }

    fn from_password(&self, password: &str) -> Credentials {
        Credentials::new("password", password)
    }
}
