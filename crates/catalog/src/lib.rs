//! Boutique product catalog.
//!
//! Server-side catalog operations for a storefront: filtered and paginated
//! product listing, product and category lookups, and transactional product
//! mutations over PostgreSQL. [`CatalogService`] is the entry point.

pub mod config;
pub mod db;
pub mod error;
pub mod listing;
pub mod models;
pub mod revalidate;
pub mod schema;
pub mod service;

pub use config::{CatalogSettings, Config};
pub use error::{CatalogError, CatalogResult};
pub use listing::{ListingRequest, MalformedFilterPolicy, ProductFilters, ProductPage};
pub use revalidate::{LoggingRevalidator, Revalidator};
pub use service::CatalogService;
