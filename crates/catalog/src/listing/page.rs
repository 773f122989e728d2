//! Pagination arithmetic and the listing result.

use serde::{Deserialize, Serialize};

use crate::config::{CatalogSettings, PAGE_SIZE_LIMIT};
use crate::error::{CatalogError, CatalogResult};
use crate::models::Product;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-indexed page number.
    pub page_no: u32,
    /// Rows per page, always positive.
    pub page_size: u32,
}

impl Pagination {
    /// Apply defaults (page 1, the configured page size) and the size cap.
    pub fn resolve(
        page_no: Option<u32>,
        page_size: Option<u32>,
        settings: &CatalogSettings,
    ) -> CatalogResult<Self> {
        let page_no = page_no.unwrap_or(1);
        if page_no == 0 {
            return Err(CatalogError::Validation("pageNo must be positive".into()));
        }

        let requested = page_size.unwrap_or(settings.page_size);
        if requested == 0 {
            return Err(CatalogError::Validation("pageSize must be positive".into()));
        }

        let cap = settings.max_page_size.clamp(1, PAGE_SIZE_LIMIT);
        let page_size = if requested > cap {
            tracing::warn!(
                requested = requested,
                capped = cap,
                "page size exceeds maximum, capping"
            );
            cap
        } else {
            requested
        };

        Ok(Self { page_no, page_size })
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_no.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Number of the last page for `total` rows (0 when there are none).
    pub fn last_page(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.page_size))
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    /// Products on this page.
    pub products: Vec<Product>,

    /// Distinct products matching the filters, across all pages.
    pub count: u64,

    /// `ceil(count / page_size)`.
    pub last_page: u64,

    /// Length of `products`.
    pub num_of_results_on_cur_page: usize,
}

impl ProductPage {
    /// Assemble a page from fetched rows and the total count.
    pub fn new(products: Vec<Product>, count: u64, pagination: Pagination) -> Self {
        Self {
            num_of_results_on_cur_page: products.len(),
            last_page: pagination.last_page(count),
            products,
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn resolve_applies_defaults_and_cap() {
        let settings = CatalogSettings::default();

        let defaulted = Pagination::resolve(None, None, &settings).unwrap();
        assert_eq!(defaulted.page_no, 1);
        assert_eq!(defaulted.page_size, settings.page_size);

        let capped = Pagination::resolve(Some(2), Some(5_000), &settings).unwrap();
        assert_eq!(capped.page_no, 2);
        assert_eq!(capped.page_size, settings.max_page_size);
    }

    #[test]
    fn resolve_rejects_zero() {
        let settings = CatalogSettings::default();
        assert!(Pagination::resolve(Some(0), None, &settings).is_err());
        assert!(Pagination::resolve(None, Some(0), &settings).is_err());
    }

    #[test]
    fn oversized_cap_is_bounded() {
        let settings = CatalogSettings {
            max_page_size: u32::MAX,
            ..Default::default()
        };

        let pagination = Pagination::resolve(Some(u32::MAX), Some(u32::MAX), &settings).unwrap();
        assert_eq!(pagination.page_size, PAGE_SIZE_LIMIT);
        let end = pagination.offset() + u64::from(pagination.page_size);
        assert!(i64::try_from(end).is_ok());
    }

    #[test]
    fn offsets() {
        let first = Pagination {
            page_no: 1,
            page_size: 10,
        };
        assert_eq!(first.offset(), 0);

        let third = Pagination {
            page_no: 3,
            page_size: 10,
        };
        assert_eq!(third.offset(), 20);
    }

    #[test]
    fn twenty_five_rows_make_three_pages() {
        let page = ProductPage::new(
            Vec::new(),
            25,
            Pagination {
                page_no: 3,
                page_size: 10,
            },
        );
        assert_eq!(page.count, 25);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.num_of_results_on_cur_page, 0);
    }

    #[test]
    fn empty_listing_has_no_pages() {
        let pagination = Pagination {
            page_no: 1,
            page_size: 10,
        };
        assert_eq!(pagination.last_page(0), 0);
    }

    #[test]
    fn serializes_camel_case() {
        let page = ProductPage::new(
            Vec::new(),
            0,
            Pagination {
                page_no: 1,
                page_size: 5,
            },
        );
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("lastPage").is_some());
        assert!(json.get("numOfResultsOnCurPage").is_some());
    }

    proptest! {
        #[test]
        fn last_page_is_ceiling(total in 0u64..100_000, page_size in 1u32..500) {
            let pagination = Pagination { page_no: 1, page_size };
            let last = pagination.last_page(total);
            let size = u64::from(page_size);
            prop_assert!(last * size >= total);
            prop_assert!(last == 0 || (last - 1) * size < total);
        }

        #[test]
        fn pages_up_to_last_start_inside_result(total in 1u64..10_000, page_size in 1u32..200) {
            let last = Pagination { page_no: 1, page_size }.last_page(total);
            for page_no in 1..=last {
                let pagination = Pagination { page_no: page_no as u32, page_size };
                prop_assert!(pagination.offset() < total);
            }
            let beyond = Pagination { page_no: (last + 1) as u32, page_size };
            prop_assert!(beyond.offset() >= total);
        }
    }
}
