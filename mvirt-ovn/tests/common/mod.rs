//! Shared test utilities for mvirt-ovn integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Once};

use mvirt_ovn::{ClientConfig, MemoryStore, OvnClient};

static TRACING: Once = Once::new();

/// Route tracing output through the test harness. Honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "mvirt_ovn=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A client wired to a fresh in-memory northbound store.
pub struct TestCluster {
    pub client: OvnClient,
    pub store: Arc<MemoryStore>,
}

impl TestCluster {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let client = OvnClient::new(store.clone(), config);
        Self { client, store }
    }

    /// Committed transactions so far.
    pub fn transactions(&self) -> u64 {
        self.store.transaction_count()
    }
}

/// Build a string map from literal pairs.
pub fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
