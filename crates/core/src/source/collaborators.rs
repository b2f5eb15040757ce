//! External collaborator interfaces
//!
//! The core delegates encryption, workspace construction and persistence to
//! injected collaborators. Only the interfaces live here; real
//! implementations (and the test doubles in [`crate::testkit`]) are
//! supplied by callers.

use std::sync::Arc;

use async_trait::async_trait;

use super::credentials::{Credentials, SecureString};

/// Symmetric encryption / key derivation provider
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Whether a string is in encrypted secure-string form
    fn is_secure_string(&self, text: &str) -> bool;

    /// Decrypt a secure string with a password
    async fn from_secure_string(
        &self,
        secure: &SecureString,
        password: &str,
    ) -> anyhow::Result<Credentials>;

    /// Encrypt credentials under a password
    async fn to_secure_string(
        &self,
        credentials: &Credentials,
        password: &str,
    ) -> anyhow::Result<SecureString>;

    /// Derive fresh credentials from a password alone
    fn from_password(&self, password: &str) -> Credentials;
}

/// The result of mapping decrypted credentials to a live workspace
pub struct SourceBinding {
    pub workspace: Arc<dyn Workspace>,
    pub source_credentials: Credentials,
    pub archive_credentials: Credentials,
}

/// Maps decrypted credentials to a live workspace + document model
#[async_trait]
pub trait SourceMapper: Send + Sync {
    async fn credentials_to_source(
        &self,
        source_credentials: Credentials,
        archive_credentials: Credentials,
        initialise_remote: bool,
    ) -> anyhow::Result<SourceBinding>;
}

/// The live, decrypted document model plus its sync/persistence binding
///
/// Exists only while a source is unlocked; discarded on lock.
#[async_trait]
pub trait Workspace: Send + Sync {
    /// Persist the workspace to its destination
    async fn save(&self) -> anyhow::Result<()>;

    /// Replace the workspace's primary credentials
    fn update_primary_credentials(&self, credentials: Credentials);
}
