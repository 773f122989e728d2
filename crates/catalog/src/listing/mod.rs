//! Filtered, paginated product listing.
//!
//! - Filter configuration and validation (`filter`)
//! - Count and page statement construction (`query_builder`)
//! - Pagination arithmetic and result shape (`page`)

pub mod filter;
pub mod page;
pub mod query_builder;

pub use filter::{
    DiscountRange, ListingCriteria, MalformedFilterPolicy, ProductFilters, SortColumn,
    SortDirection, SortSpec, UnknownPolicy,
};
pub use page::{Pagination, ProductPage};
pub use query_builder::ProductQueryBuilder;

use serde::{Deserialize, Serialize};

/// A listing request as received from the web layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingRequest {
    /// 1-indexed page, defaults to 1.
    pub page_no: Option<u32>,

    /// Rows per page, defaults to the configured page size.
    pub page_size: Option<u32>,

    /// Optional filters.
    pub filters: ProductFilters,
}
