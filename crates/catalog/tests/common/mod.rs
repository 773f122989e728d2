#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for database-backed integration tests.
//!
//! Tests run against the PostgreSQL database named by `DATABASE_URL` and are
//! marked `#[ignore]`, so run them with `cargo test -- --ignored`. Each test
//! holds [`TestCatalog`] for its whole body, which serializes database access
//! within a test binary and starts every test from empty tables.

#![allow(dead_code)]

use std::sync::{Arc, LazyLock, Mutex};

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::MutexGuard;

use boutique_catalog::{CatalogService, CatalogSettings, Revalidator, db};

/// Serializes database tests within one test binary.
static DB_LOCK: LazyLock<tokio::sync::Mutex<()>> =
    LazyLock::new(|| tokio::sync::Mutex::new(()));

/// Revalidator that remembers every path it was asked to revalidate.
#[derive(Debug, Default)]
pub struct RecordingRevalidator {
    paths: Mutex<Vec<String>>,
}

impl RecordingRevalidator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl Revalidator for RecordingRevalidator {
    async fn revalidate_path(&self, path: &str) -> anyhow::Result<()> {
        self.paths.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

/// A migrated, emptied catalog database plus a service over it.
pub struct TestCatalog {
    pub pool: PgPool,
    pub service: CatalogService,
    pub revalidator: Arc<RecordingRevalidator>,
    _guard: MutexGuard<'static, ()>,
}

impl TestCatalog {
    /// Connect, migrate and empty the catalog.
    ///
    /// Panics when `DATABASE_URL` is unset.
    pub async fn new() -> Self {
        Self::with_settings(CatalogSettings::default()).await
    }

    /// Like [`TestCatalog::new`] with custom settings.
    pub async fn with_settings(settings: CatalogSettings) -> Self {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must point at a PostgreSQL database for these tests");

        let guard = DB_LOCK.lock().await;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("Failed to connect to test database");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        boutique_test_utils::reset_catalog(&pool)
            .await
            .expect("Failed to reset catalog");

        let revalidator = Arc::new(RecordingRevalidator::default());
        let service = CatalogService::new(pool.clone(), settings, revalidator.clone());

        Self {
            pool,
            service,
            revalidator,
            _guard: guard,
        }
    }
}
