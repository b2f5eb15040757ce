use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::source::{Credentials, SourceBinding, SourceMapper, Workspace};

use super::OpLog;

/// Workspace double: records saves and credential updates
#[derive(Default)]
pub struct StubWorkspace {
    log: OpLog,
    saves: AtomicUsize,
    primary_credentials: Mutex<Option<Credentials>>,
    fail_save: AtomicBool,
}

impl StubWorkspace {
    pub fn with_log(log: OpLog) -> Self {
        StubWorkspace {
            log,
            ..StubWorkspace::default()
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn primary_credentials(&self) -> Option<Credentials> {
        self.primary_credentials.lock().clone()
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Workspace for StubWorkspace {
    async fn save(&self) -> anyhow::Result<()> {
        self.log.push("save:start");
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        if self.fail_save.load(Ordering::SeqCst) {
            self.log.push("save:end");
            anyhow::bail!("workspace save failed");
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.log.push("save:end");
        Ok(())
    }

    fn update_primary_credentials(&self, credentials: Credentials) {
        self.log.push("update-credentials");
        *self.primary_credentials.lock() = Some(credentials);
    }
}

/// Mapper double: hands out a shared [`StubWorkspace`]
#[derive(Default)]
pub struct StubMapper {
    log: OpLog,
    workspace: Arc<StubWorkspace>,
    fail_mapping: AtomicBool,
}

impl StubMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: OpLog) -> Self {
        StubMapper {
            workspace: Arc::new(StubWorkspace::with_log(log.clone())),
            log,
            fail_mapping: AtomicBool::new(false),
        }
    }

    /// The workspace every successful mapping hands out
    pub fn workspace(&self) -> Arc<StubWorkspace> {
        self.workspace.clone()
    }

    pub fn set_fail_mapping(&self, fail: bool) {
        self.fail_mapping.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SourceMapper for StubMapper {
    async fn credentials_to_source(
        &self,
        source_credentials: Credentials,
        archive_credentials: Credentials,
        _initialise_remote: bool,
    ) -> anyhow::Result<SourceBinding> {
        self.log.push("map");
        tokio::task::yield_now().await;
        if self.fail_mapping.load(Ordering::SeqCst) {
            anyhow::bail!("datasource rejected credentials");
        }
        Ok(SourceBinding {
            workspace: self.workspace.clone(),
            source_credentials,
            archive_credentials,
        })
    }
}
