//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

use crate::listing::MalformedFilterPolicy;

/// Default page size when a listing request omits one.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Default cap on page size.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Upper bound for a configured page size cap. Keeps LIMIT and OFFSET within
/// the range PostgreSQL accepts as BIGINT.
pub const PAGE_SIZE_LIMIT: u32 = 10_000;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Catalog behaviour knobs.
    pub catalog: CatalogSettings,
}

/// Settings consumed by [`crate::CatalogService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    /// Page size used when a listing request omits one (default: 12).
    pub page_size: u32,

    /// Requests above this are capped (default: 100).
    pub max_page_size: u32,

    /// What to do with a malformed discount range or sort spec (default: ignore).
    pub malformed_filters: MalformedFilterPolicy,

    /// Statement timeout for listing queries in milliseconds (default: 10000).
    pub statement_timeout_ms: u64,

    /// Path handed to the revalidator after a mutation (default: /products).
    pub listing_path: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            malformed_filters: MalformedFilterPolicy::Ignore,
            statement_timeout_ms: 10_000,
            listing_path: "/products".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        Ok(Self {
            database_url,
            database_max_connections,
            catalog: CatalogSettings::from_env()?,
        })
    }
}

impl CatalogSettings {
    /// Load catalog settings from `CATALOG_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load catalog settings through `lookup`, which maps a variable name to
    /// its value. Unset variables fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let page_size: u32 = match lookup("CATALOG_PAGE_SIZE") {
            Some(v) => v.parse().context("CATALOG_PAGE_SIZE must be a valid u32")?,
            None => defaults.page_size,
        };

        let max_page_size: u32 = match lookup("CATALOG_MAX_PAGE_SIZE") {
            Some(v) => v
                .parse()
                .context("CATALOG_MAX_PAGE_SIZE must be a valid u32")?,
            None => defaults.max_page_size,
        };

        if page_size == 0 || max_page_size == 0 {
            anyhow::bail!("CATALOG_PAGE_SIZE and CATALOG_MAX_PAGE_SIZE must be positive");
        }

        let max_page_size = if max_page_size > PAGE_SIZE_LIMIT {
            tracing::warn!(
                requested = max_page_size,
                capped = PAGE_SIZE_LIMIT,
                "CATALOG_MAX_PAGE_SIZE exceeds limit, capping"
            );
            PAGE_SIZE_LIMIT
        } else {
            max_page_size
        };

        let malformed_filters = match lookup("CATALOG_MALFORMED_FILTERS") {
            Some(v) => v
                .parse::<MalformedFilterPolicy>()
                .context("CATALOG_MALFORMED_FILTERS must be \"ignore\" or \"reject\"")?,
            None => defaults.malformed_filters,
        };

        let statement_timeout_ms = match lookup("CATALOG_STATEMENT_TIMEOUT_MS") {
            Some(v) => v
                .parse()
                .context("CATALOG_STATEMENT_TIMEOUT_MS must be a valid u64")?,
            None => defaults.statement_timeout_ms,
        };

        let listing_path = lookup("CATALOG_LISTING_PATH").unwrap_or(defaults.listing_path);

        Ok(Self {
            page_size: page_size.min(max_page_size),
            max_page_size,
            malformed_filters,
            statement_timeout_ms,
            listing_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = CatalogSettings::default();
        assert_eq!(settings.page_size, 12);
        assert_eq!(settings.max_page_size, 100);
        assert_eq!(settings.malformed_filters, MalformedFilterPolicy::Ignore);
        assert_eq!(settings.listing_path, "/products");
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn unset_variables_use_defaults() {
        let settings = CatalogSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, CatalogSettings::default());
    }

    #[test]
    fn reads_every_catalog_variable() {
        let settings = CatalogSettings::from_lookup(lookup(&[
            ("CATALOG_PAGE_SIZE", "24"),
            ("CATALOG_MAX_PAGE_SIZE", "48"),
            ("CATALOG_MALFORMED_FILTERS", "reject"),
            ("CATALOG_STATEMENT_TIMEOUT_MS", "2500"),
            ("CATALOG_LISTING_PATH", "/shop"),
        ]))
        .unwrap();

        assert_eq!(settings.page_size, 24);
        assert_eq!(settings.max_page_size, 48);
        assert_eq!(settings.malformed_filters, MalformedFilterPolicy::Reject);
        assert_eq!(settings.statement_timeout_ms, 2500);
        assert_eq!(settings.listing_path, "/shop");
    }

    #[test]
    fn unknown_policy_is_a_config_error() {
        let vars = [("CATALOG_MALFORMED_FILTERS", "strict")];
        let err = CatalogSettings::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("CATALOG_MALFORMED_FILTERS"), "{err}");
    }

    #[test]
    fn max_page_size_is_clamped() {
        let vars = [("CATALOG_MAX_PAGE_SIZE", "4294967295")];
        let settings = CatalogSettings::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(settings.max_page_size, PAGE_SIZE_LIMIT);
    }

    #[test]
    fn page_size_never_exceeds_cap() {
        let settings = CatalogSettings::from_lookup(lookup(&[
            ("CATALOG_PAGE_SIZE", "50"),
            ("CATALOG_MAX_PAGE_SIZE", "20"),
        ]))
        .unwrap();
        assert_eq!(settings.page_size, 20);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        for vars in [
            [("CATALOG_PAGE_SIZE", "0")],
            [("CATALOG_MAX_PAGE_SIZE", "0")],
        ] {
            assert!(CatalogSettings::from_lookup(lookup(&vars)).is_err());
        }
    }
}
