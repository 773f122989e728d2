//! Category model and the product ↔ category association.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::error::CatalogResult;

/// A category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A product ↔ category link as read from the association table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ProductCategoryName {
    product_id: i64,
    name: String,
}

impl Category {
    /// List all categories ordered by name.
    pub async fn list(pool: &PgPool) -> CatalogResult<Vec<Self>> {
        let categories =
            sqlx::query_as::<_, Self>("SELECT id, name FROM categories ORDER BY name, id")
                .fetch_all(pool)
                .await?;

        Ok(categories)
    }

    /// Categories linked to one product.
    pub async fn for_product(pool: &PgPool, product_id: i64) -> CatalogResult<Vec<Self>> {
        let categories = sqlx::query_as::<_, Self>(
            r#"
            SELECT c.id, c.name
            FROM categories c
            INNER JOIN product_categories pc ON pc.category_id = c.id
            WHERE pc.product_id = $1
            ORDER BY c.name, c.id
            "#,
        )
        .bind(product_id)
        .fetch_all(pool)
        .await?;

        Ok(categories)
    }

    /// Category names for a batch of products, keyed by product id.
    ///
    /// Every requested id gets an entry, empty when it has no categories.
    pub async fn names_by_product(
        pool: &PgPool,
        product_ids: &[i64],
    ) -> CatalogResult<HashMap<i64, Vec<String>>> {
        let mut names: HashMap<i64, Vec<String>> =
            product_ids.iter().map(|id| (*id, Vec::new())).collect();
        if product_ids.is_empty() {
            return Ok(names);
        }

        let rows = sqlx::query_as::<_, ProductCategoryName>(
            r#"
            SELECT pc.product_id, c.name
            FROM product_categories pc
            INNER JOIN categories c ON c.id = pc.category_id
            WHERE pc.product_id = ANY($1)
            ORDER BY pc.product_id, c.name
            "#,
        )
        .bind(product_ids)
        .fetch_all(pool)
        .await?;

        for row in rows {
            names.entry(row.product_id).or_default().push(row.name);
        }

        Ok(names)
    }

    /// Replace every category link of a product.
    ///
    /// Deletes then re-inserts; callers run this inside a transaction.
    pub async fn replace_for_product(
        conn: &mut PgConnection,
        product_id: i64,
        category_ids: &[i64],
    ) -> CatalogResult<()> {
        sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *conn)
            .await?;

        Self::link(conn, product_id, category_ids).await
    }

    /// Link a product to categories, ignoring links that already exist.
    pub async fn link(
        conn: &mut PgConnection,
        product_id: i64,
        category_ids: &[i64],
    ) -> CatalogResult<()> {
        if category_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO product_categories (product_id, category_id)
            SELECT $1, category_id FROM UNNEST($2::BIGINT[]) AS category_id
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(product_id)
        .bind(category_ids)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
