//! Listing filter configuration and its validated form.
//!
//! [`ProductFilters`] is the loose shape a web layer deserializes from a
//! request. [`ProductFilters::resolve`] turns it into [`ListingCriteria`],
//! where every filter is typed and every malformed value has been dealt with
//! according to the configured [`MalformedFilterPolicy`].

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{CatalogError, CatalogResult};

/// Optional listing criteria as submitted by a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductFilters {
    /// Match products carrying any of these brands.
    pub brand_ids: Vec<i64>,

    /// Match products linked to any of these categories.
    pub category_ids: Vec<i64>,

    /// Exact gender match.
    pub gender: Option<String>,

    /// Inclusive price ceiling.
    pub price_range_to: Option<Decimal>,

    /// Inclusive discount range encoded as `"min-max"`.
    pub discount: Option<String>,

    /// Match products tagged with any of these occasions.
    pub occasions: Vec<String>,

    /// Ordering encoded as `"column-direction"`, e.g. `"price-asc"`.
    pub sort_by: Option<String>,
}

/// How malformed discount ranges and sort specs are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedFilterPolicy {
    /// Drop the offending filter and carry on.
    #[default]
    Ignore,
    /// Fail the request with a validation error.
    Reject,
}

/// A policy name other than `ignore` or `reject`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown malformed filter policy: {0:?}")]
pub struct UnknownPolicy(pub String);

impl FromStr for MalformedFilterPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "reject" => Ok(Self::Reject),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// Inclusive discount bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountRange {
    pub min: f64,
    pub max: f64,
}

impl DiscountRange {
    /// Parse `"min-max"`. Both bounds must be finite numbers.
    pub fn parse(raw: &str) -> Option<Self> {
        let (min, max) = raw.trim().split_once('-')?;
        let min: f64 = min.trim().parse().ok()?;
        let max: f64 = max.trim().parse().ok()?;
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        Some(Self { min, max })
    }
}

/// Columns a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Price,
    CreatedAt,
    Rating,
}

impl SortColumn {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "price" => Some(Self::Price),
            "created_at" => Some(Self::CreatedAt),
            "rating" => Some(Self::Rating),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A validated sort specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Parse `"column-direction"`. The column must be one of `price`,
    /// `created_at` or `rating`; the direction is `asc` or `desc` in any case.
    pub fn parse(raw: &str) -> Option<Self> {
        let (column, direction) = raw.trim().rsplit_once('-')?;
        let column = SortColumn::from_name(column)?;
        let direction = match direction.to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return None,
        };
        Some(Self { column, direction })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = match self.column {
            SortColumn::Price => "price",
            SortColumn::CreatedAt => "created_at",
            SortColumn::Rating => "rating",
        };
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{column}-{direction}")
    }
}

/// Typed, validated listing criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingCriteria {
    pub brand_ids: Vec<i64>,
    pub category_ids: Vec<i64>,
    pub gender: Option<String>,
    pub price_to: Option<Decimal>,
    pub discount: Option<DiscountRange>,
    pub occasions: Vec<String>,
    pub sort: Option<SortSpec>,
}

impl ListingCriteria {
    /// Whether the category join is needed.
    pub fn joins_categories(&self) -> bool {
        !self.category_ids.is_empty()
    }
}

impl ProductFilters {
    /// Validate the filters, applying `policy` to malformed discount and
    /// sort values. Blank strings count as absent.
    pub fn resolve(&self, policy: MalformedFilterPolicy) -> CatalogResult<ListingCriteria> {
        let discount = match non_blank(self.discount.as_deref()) {
            None => None,
            Some(raw) => match DiscountRange::parse(raw) {
                Some(range) => Some(range),
                None => malformed(policy, "discount", raw)?,
            },
        };

        let sort = match non_blank(self.sort_by.as_deref()) {
            None => None,
            Some(raw) => match SortSpec::parse(raw) {
                Some(spec) => Some(spec),
                None => malformed(policy, "sortBy", raw)?,
            },
        };

        let occasions = self
            .occasions
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        Ok(ListingCriteria {
            brand_ids: dedup(&self.brand_ids),
            category_ids: dedup(&self.category_ids),
            gender: non_blank(self.gender.as_deref()).map(str::to_string),
            price_to: self.price_range_to,
            discount,
            occasions,
            sort,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn malformed<T>(policy: MalformedFilterPolicy, name: &str, raw: &str) -> CatalogResult<Option<T>> {
    match policy {
        MalformedFilterPolicy::Ignore => {
            tracing::warn!(filter = name, value = raw, "ignoring malformed listing filter");
            Ok(None)
        }
        MalformedFilterPolicy::Reject => {
            let message = format!("malformed {name} filter: {raw:?}");
            Err(CatalogError::Validation(message))
        }
    }
}

fn dedup(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}
