use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::id::{IdProvider, UuidIds};

use super::collaborators::{CredentialsProvider, SourceMapper, Workspace};
use super::credentials::{CredentialState, Credentials, SecureString};
use super::events::{SourceEvent, SourceSubscriber, SubscriberSet};
use super::queue::{QueueError, SerialQueue};
use super::snapshot::{SourceSnapshot, DEFAULT_COLOUR, DEFAULT_ORDER};

/// Lifecycle status of a source
///
/// `Pending` is transient: the engine sets it at the start of a lock/unlock
/// transition and clears it on completion or failure. It is never externally
/// settable and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Locked,
    Unlocked,
    Pending,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Status::Locked => "locked",
            Status::Unlocked => "unlocked",
            Status::Pending => "pending",
        };
        write!(f, "{text}")
    }
}

/// The published snapshot external readers observe
///
/// Never exposes credential material or the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescription {
    pub id: String,
    pub name: String,
    pub status: Status,
    #[serde(rename = "type")]
    pub kind: String,
    pub colour: String,
    pub order: u64,
}

/// Errors raised by source operations
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("default error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("failed constructing archive source: {reason}")]
    Construct { reason: String },
    #[error("source in invalid state ({status}) for {operation}: {id}")]
    InvalidState {
        operation: &'static str,
        status: Status,
        id: String,
    },
    #[error("invalid colour format (expected hex): {0}")]
    InvalidColour(String),
    #[error("failed unlocking source: {id}")]
    Unlock {
        id: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed locking source: {id}")]
    Lock {
        id: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed dehydrating source: {id}")]
    Dehydrate {
        id: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed updating archive credentials: {id}")]
    UpdateCredentials {
        id: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

struct SourceInner {
    id: String,
    name: String,
    kind: String,
    colour: String,
    /// `None` means unset; the description falls back to [`DEFAULT_ORDER`]
    order: Option<u64>,
    status: Status,
    source_credentials: CredentialState,
    archive_credentials: CredentialState,
    workspace: Option<Arc<dyn Workspace>>,
}

/// One vault's identity, credential material and (while unlocked) its live
/// workspace
///
/// Cloning shares the same source. All state-changing operations go through
/// the source's serialized queue: they execute strictly in submission order
/// and a later operation never observes a half-applied earlier one. The
/// credential fields are mutated only from inside queued tasks; external
/// readers only ever see the [`SourceDescription`].
#[derive(Clone)]
pub struct ArchiveSource {
    inner: Arc<Mutex<SourceInner>>,
    queue: SerialQueue,
    subscribers: SubscriberSet,
    provider: Arc<dyn CredentialsProvider>,
    mapper: Arc<dyn SourceMapper>,
}

impl std::fmt::Debug for ArchiveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveSource").finish_non_exhaustive()
    }
}

impl ArchiveSource {
    /// Create a source from encrypted credentials with a generated id
    pub fn new(
        name: impl Into<String>,
        source_credentials: SecureString,
        archive_credentials: SecureString,
        provider: Arc<dyn CredentialsProvider>,
        mapper: Arc<dyn SourceMapper>,
    ) -> Result<Self, SourceError> {
        let id = UuidIds.next_id();
        Self::with_id(
            name,
            source_credentials,
            archive_credentials,
            provider,
            mapper,
            id,
        )
    }

    /// Create a source with an explicit id (rehydration, tests)
    pub fn with_id(
        name: impl Into<String>,
        source_credentials: SecureString,
        archive_credentials: SecureString,
        provider: Arc<dyn CredentialsProvider>,
        mapper: Arc<dyn SourceMapper>,
        id: impl Into<String>,
    ) -> Result<Self, SourceError> {
        if !provider.is_secure_string(source_credentials.as_str()) {
            return Err(SourceError::Construct {
                reason: "source credentials not in encrypted form".into(),
            });
        }
        if !provider.is_secure_string(archive_credentials.as_str()) {
            return Err(SourceError::Construct {
                reason: "archive credentials not in encrypted form".into(),
            });
        }
        let id = id.into();
        Ok(ArchiveSource {
            inner: Arc::new(Mutex::new(SourceInner {
                id: id.clone(),
                name: name.into(),
                kind: String::new(),
                colour: DEFAULT_COLOUR.to_string(),
                order: None,
                status: Status::Locked,
                source_credentials: CredentialState::Encrypted(source_credentials),
                archive_credentials: CredentialState::Encrypted(archive_credentials),
                workspace: None,
            })),
            queue: SerialQueue::new(format!("source:{id}")),
            subscribers: SubscriberSet::default(),
            provider,
            mapper,
        })
    }

    /// Reconstruct a source from a persisted snapshot
    ///
    /// The source always starts `Locked`, whatever the snapshot records:
    /// persisted credentials are always encrypted.
    pub fn rehydrate(
        snapshot: SourceSnapshot,
        provider: Arc<dyn CredentialsProvider>,
        mapper: Arc<dyn SourceMapper>,
    ) -> Result<Self, SourceError> {
        let SourceSnapshot {
            id,
            name,
            kind,
            colour,
            order,
            source_credentials,
            archive_credentials,
            status: _,
        } = snapshot;
        let source = Self::with_id(
            name,
            source_credentials,
            archive_credentials,
            provider,
            mapper,
            id,
        )?;
        {
            let mut inner = source.inner.lock();
            inner.kind = kind;
            if let Some(colour) = colour {
                inner.colour = colour;
            }
            inner.order = order;
        }
        Ok(source)
    }

    /// Reconstruct a source from dehydrated JSON text
    pub fn rehydrate_json(
        text: &str,
        provider: Arc<dyn CredentialsProvider>,
        mapper: Arc<dyn SourceMapper>,
    ) -> Result<Self, SourceError> {
        let snapshot = SourceSnapshot::from_json(text)
            .context("failed parsing dehydrated source")
            .map_err(SourceError::Default)?;
        Self::rehydrate(snapshot, provider, mapper)
    }

    pub fn id(&self) -> String {
        self.inner.lock().id.clone()
    }

    pub fn name(&self) -> String {
        self.inner.lock().name.clone()
    }

    pub fn status(&self) -> Status {
        self.inner.lock().status
    }

    pub fn colour(&self) -> String {
        self.inner.lock().colour.clone()
    }

    /// Effective order (default when unset)
    pub fn order(&self) -> u64 {
        self.inner.lock().order.unwrap_or(DEFAULT_ORDER)
    }

    pub fn set_order(&self, order: u64) {
        self.inner.lock().order = Some(order);
    }

    /// The live workspace; `None` unless unlocked
    pub fn workspace(&self) -> Option<Arc<dyn Workspace>> {
        self.inner.lock().workspace.clone()
    }

    pub fn description(&self) -> SourceDescription {
        describe_inner(&self.inner.lock())
    }

    pub fn subscribe(&self, subscriber: Arc<dyn SourceSubscriber>) {
        self.subscribers.subscribe(subscriber);
    }

    /// Set the source colour (`#RGB` or `#RRGGBB`) and notify subscribers
    pub async fn set_colour(&self, colour: &str) -> Result<(), SourceError> {
        if !is_valid_colour(colour) {
            return Err(SourceError::InvalidColour(colour.to_string()));
        }
        let description = {
            let mut inner = self.inner.lock();
            inner.colour = colour.to_string();
            describe_inner(&inner)
        };
        self.subscribers
            .emit(SourceEvent::ColourUpdated(description))
            .await?;
        Ok(())
    }

    /// Unlock the source with the master password
    ///
    /// Decrypts both credential fields, maps them to a live workspace and
    /// moves the source to `Unlocked`. On any failure the source is restored
    /// to `Locked` — never left `Pending` — and the error carries the
    /// original cause.
    pub async fn unlock(
        &self,
        master_password: &str,
        initialise_remote: bool,
    ) -> Result<(), SourceError> {
        let id = self.id();
        {
            let mut inner = self.inner.lock();
            if inner.status != Status::Locked {
                return Err(SourceError::InvalidState {
                    operation: "unlocking",
                    status: inner.status,
                    id,
                });
            }
            inner.status = Status::Pending;
        }
        tracing::debug!(source = %id, "unlocking source");
        let inner = Arc::clone(&self.inner);
        let provider = Arc::clone(&self.provider);
        let mapper = Arc::clone(&self.mapper);
        let subscribers = self.subscribers.clone();
        let password = master_password.to_string();
        let outcome = match self
            .queue
            .run(move || async move {
                let result: anyhow::Result<SourceDescription> = async {
                    let (source_secure, archive_secure) = {
                        let guard = inner.lock();
                        (
                            guard
                                .source_credentials
                                .secure()
                                .cloned()
                                .context("source credentials not in encrypted form")?,
                            guard
                                .archive_credentials
                                .secure()
                                .cloned()
                                .context("archive credentials not in encrypted form")?,
                        )
                    };
                    let source_credentials =
                        provider.from_secure_string(&source_secure, &password).await?;
                    let archive_credentials = provider
                        .from_secure_string(&archive_secure, &password)
                        .await?;
                    let binding = mapper
                        .credentials_to_source(
                            source_credentials,
                            archive_credentials,
                            initialise_remote,
                        )
                        .await
                        .context("failed mapping credentials to a source")?;
                    let description = {
                        let mut guard = inner.lock();
                        guard.kind = binding.source_credentials.kind.clone();
                        guard.source_credentials =
                            CredentialState::Decrypted(binding.source_credentials);
                        guard.archive_credentials =
                            CredentialState::Decrypted(binding.archive_credentials);
                        guard.workspace = Some(binding.workspace);
                        guard.status = Status::Unlocked;
                        describe_inner(&guard)
                    };
                    Ok(description)
                }
                .await;
                match result {
                    Ok(description) => {
                        subscribers.emit(SourceEvent::Unlocked(description)).await?;
                        Ok(())
                    }
                    Err(err) => {
                        // a failed unlock is never left pending
                        inner.lock().status = Status::Locked;
                        Err(err)
                    }
                }
            })
            .await
        {
            Ok(result) => result,
            Err(queue_err) => {
                self.inner.lock().status = Status::Locked;
                return Err(queue_err.into());
            }
        };
        outcome.map_err(|source| SourceError::Unlock { id, source })
    }

    /// Lock the source
    ///
    /// Re-encrypts both credential fields under the archive's own password,
    /// discards the workspace and returns the dehydrated snapshot.
    pub async fn lock(&self) -> Result<SourceSnapshot, SourceError> {
        let id = self.id();
        {
            let mut inner = self.inner.lock();
            if inner.status != Status::Unlocked {
                return Err(SourceError::InvalidState {
                    operation: "locking",
                    status: inner.status,
                    id,
                });
            }
            inner.status = Status::Pending;
        }
        tracing::debug!(source = %id, "locking source");
        let inner = Arc::clone(&self.inner);
        let provider = Arc::clone(&self.provider);
        let subscribers = self.subscribers.clone();
        let outcome = match self
            .queue
            .run(move || async move {
                let result: anyhow::Result<(SourceDescription, SourceSnapshot)> = async {
                    let (source_credentials, archive_credentials) = {
                        let guard = inner.lock();
                        (
                            guard
                                .source_credentials
                                .credentials()
                                .cloned()
                                .context("source credentials not decrypted")?,
                            guard
                                .archive_credentials
                                .credentials()
                                .cloned()
                                .context("archive credentials not decrypted")?,
                        )
                    };
                    let password = archive_credentials.password.clone();
                    let source_secure =
                        provider.to_secure_string(&source_credentials, &password).await?;
                    let archive_secure = provider
                        .to_secure_string(&archive_credentials, &password)
                        .await?;
                    let mut guard = inner.lock();
                    guard.source_credentials = CredentialState::Encrypted(source_secure);
                    guard.archive_credentials = CredentialState::Encrypted(archive_secure);
                    guard.workspace = None;
                    guard.status = Status::Locked;
                    let description = describe_inner(&guard);
                    let snapshot = snapshot_from_locked(&guard)?;
                    Ok((description, snapshot))
                }
                .await;
                match result {
                    Ok((description, snapshot)) => {
                        subscribers.emit(SourceEvent::Locked(description)).await?;
                        Ok(snapshot)
                    }
                    Err(err) => {
                        // a failed lock stays unlocked, never pending
                        inner.lock().status = Status::Unlocked;
                        Err(err)
                    }
                }
            })
            .await
        {
            Ok(result) => result,
            Err(queue_err) => {
                self.inner.lock().status = Status::Unlocked;
                return Err(queue_err.into());
            }
        };
        outcome.map_err(|source| SourceError::Lock { id, source })
    }

    /// Produce a locked-form snapshot without changing live state
    ///
    /// Legal while `Locked` (reuses the stored encrypted fields) or
    /// `Unlocked` (encrypts a fresh copy under the archive password).
    /// Rejected while `Pending`, before anything is enqueued.
    pub async fn dehydrate(&self) -> Result<SourceSnapshot, SourceError> {
        let id = self.id();
        {
            let inner = self.inner.lock();
            if inner.status == Status::Pending {
                return Err(SourceError::InvalidState {
                    operation: "dehydrating",
                    status: inner.status,
                    id,
                });
            }
        }
        let inner = Arc::clone(&self.inner);
        let provider = Arc::clone(&self.provider);
        let outcome = self
            .queue
            .run(move || async move {
                enum Material {
                    Locked(SecureString, SecureString),
                    Unlocked(Credentials, Credentials),
                }
                let (base, material) = {
                    let guard = inner.lock();
                    // key off the actual credential form: a dehydrate queued
                    // behind a lock/unlock executes while status is Pending
                    let material = match (&guard.source_credentials, &guard.archive_credentials) {
                        (
                            CredentialState::Encrypted(source),
                            CredentialState::Encrypted(archive),
                        ) => Material::Locked(source.clone(), archive.clone()),
                        _ => Material::Unlocked(
                            guard
                                .source_credentials
                                .credentials()
                                .cloned()
                                .context("source credentials not decrypted")?,
                            guard
                                .archive_credentials
                                .credentials()
                                .cloned()
                                .context("archive credentials not decrypted")?,
                        ),
                    };
                    (snapshot_base(&guard), material)
                };
                let (source_secure, archive_secure) = match material {
                    Material::Locked(source, archive) => (source, archive),
                    Material::Unlocked(source, archive) => {
                        let password = archive.password.clone();
                        (
                            provider.to_secure_string(&source, &password).await?,
                            provider.to_secure_string(&archive, &password).await?,
                        )
                    }
                };
                let (id, name, kind, colour, order) = base;
                Ok::<SourceSnapshot, anyhow::Error>(SourceSnapshot {
                    id,
                    name,
                    kind,
                    colour: Some(colour),
                    order,
                    source_credentials: source_secure,
                    archive_credentials: archive_secure,
                    status: Status::Locked,
                })
            })
            .await?;
        outcome.map_err(|source| SourceError::Dehydrate { id, source })
    }

    /// Replace the archive credentials with ones derived from a new password
    ///
    /// Updates the live workspace's primary credentials and saves it. The
    /// source status does not change.
    pub async fn update_archive_credentials(
        &self,
        master_password: &str,
    ) -> Result<(), SourceError> {
        let id = self.id();
        {
            let inner = self.inner.lock();
            if inner.status != Status::Unlocked {
                return Err(SourceError::InvalidState {
                    operation: "updating archive credentials",
                    status: inner.status,
                    id,
                });
            }
        }
        let inner = Arc::clone(&self.inner);
        let provider = Arc::clone(&self.provider);
        let password = master_password.to_string();
        let outcome = self
            .queue
            .run(move || async move {
                let credentials = provider.from_password(&password);
                let workspace = {
                    let mut guard = inner.lock();
                    guard.archive_credentials = CredentialState::Decrypted(credentials.clone());
                    guard
                        .workspace
                        .clone()
                        .context("workspace missing while unlocked")?
                };
                workspace.update_primary_credentials(credentials);
                workspace.save().await?;
                Ok::<(), anyhow::Error>(())
            })
            .await?;
        outcome.map_err(|source| SourceError::UpdateCredentials { id, source })
    }
}

fn describe_inner(inner: &SourceInner) -> SourceDescription {
    SourceDescription {
        id: inner.id.clone(),
        name: inner.name.clone(),
        status: inner.status,
        kind: inner.kind.clone(),
        colour: inner.colour.clone(),
        order: inner.order.unwrap_or(DEFAULT_ORDER),
    }
}

fn snapshot_base(inner: &SourceInner) -> (String, String, String, String, Option<u64>) {
    (
        inner.id.clone(),
        inner.name.clone(),
        inner.kind.clone(),
        inner.colour.clone(),
        inner.order,
    )
}

fn snapshot_from_locked(inner: &SourceInner) -> anyhow::Result<SourceSnapshot> {
    Ok(SourceSnapshot {
        id: inner.id.clone(),
        name: inner.name.clone(),
        kind: inner.kind.clone(),
        colour: Some(inner.colour.clone()),
        order: inner.order,
        source_credentials: inner
            .source_credentials
            .secure()
            .cloned()
            .context("source credentials not in encrypted form")?,
        archive_credentials: inner
            .archive_credentials
            .secure()
            .cloned()
            .context("archive credentials not in encrypted form")?,
        status: Status::Locked,
    })
}

fn is_valid_colour(colour: &str) -> bool {
    let Some(hex) = colour.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.bytes().all(|b| b.is_ascii_hexdigit())
}
