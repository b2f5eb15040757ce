//! Shared test utilities for source lifecycle integration tests
#![allow(dead_code)]

use std::sync::Arc;

use strongroom::source::{ArchiveSource, Credentials};
use strongroom::testkit::{OpLog, PlainCredentialsProvider, StubMapper};

pub const MASTER_PASSWORD: &str = "s3cret";

/// Initialise RUST_LOG-driven test logging; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Set up a locked source backed by the collaborator doubles
pub fn setup_source() -> (
    ArchiveSource,
    Arc<PlainCredentialsProvider>,
    Arc<StubMapper>,
    OpLog,
) {
    init_tracing();
    let log = OpLog::default();
    let provider = Arc::new(PlainCredentialsProvider::with_log(log.clone()));
    let mapper = Arc::new(StubMapper::with_log(log.clone()));
    let source_credentials =
        provider.seal(&Credentials::new("file", MASTER_PASSWORD), MASTER_PASSWORD);
    let archive_credentials = provider.seal(
        &Credentials::new("password", MASTER_PASSWORD),
        MASTER_PASSWORD,
    );
    let source = ArchiveSource::new(
        "personal",
        source_credentials,
        archive_credentials,
        provider.clone(),
        mapper.clone(),
    )
    .unwrap();
    (source, provider, mapper, log)
}

/// Collect the full error chain as display strings
pub fn error_chain(err: &dyn std::error::Error) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut current = err.source();
    while let Some(cause) = current {
        chain.push(cause.to_string());
        current = cause.source();
    }
    chain
}
