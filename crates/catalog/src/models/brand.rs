//! Brand model.
//!
//! Products reference brands only through their encoded id list, so nothing
//! here is enforced by foreign keys.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::CatalogResult;

/// A brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Brand {
    pub id: i64,
    pub name: String,
}

impl Brand {
    /// List all brands ordered by name.
    pub async fn list(pool: &PgPool) -> CatalogResult<Vec<Self>> {
        let brands = sqlx::query_as::<_, Self>("SELECT id, name FROM brands ORDER BY name, id")
            .fetch_all(pool)
            .await?;

        Ok(brands)
    }

    /// Map brand ids to names. Unknown ids are absent from the result.
    pub async fn names_by_id(pool: &PgPool, ids: &[i64]) -> CatalogResult<HashMap<i64, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let brands = sqlx::query_as::<_, Self>("SELECT id, name FROM brands WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;

        Ok(brands.into_iter().map(|b| (b.id, b.name)).collect())
    }
}
