//! Product model: catalog rows, creation input and sparse updates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_query::{Expr, PostgresQueryBuilder, Query, Value};
use sea_query_binder::SqlxBinder;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::error::{CatalogError, CatalogResult};
use crate::schema::Products;

const PRODUCT_COLUMNS: &str = "id, name, description, price, old_price, discount, rating, gender, image, brands, occasions, colors, created_at";

/// Product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub old_price: Option<Decimal>,

    /// Percentage, 0 to 100.
    pub discount: f64,
    pub rating: f64,
    pub gender: Option<String>,

    /// Image reference (path or URL).
    pub image: Option<String>,

    /// Brand ids, comma-separated or a JSON array.
    pub brands: String,

    /// Comma-separated occasion tags.
    pub occasions: String,

    /// Comma-separated colors.
    pub colors: String,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Decoded brand ids; unparseable entries are skipped.
    pub fn brand_ids(&self) -> Vec<i64> {
        decode_id_list(&self.brands)
    }

    /// Trimmed, non-empty occasion tags.
    pub fn occasion_tags(&self) -> Vec<String> {
        split_tags(&self.occasions)
    }

    /// Trimmed, non-empty colors.
    pub fn color_list(&self) -> Vec<String> {
        split_tags(&self.colors)
    }

    /// Find a product by ID.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> CatalogResult<Option<Self>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let product = sqlx::query_as::<_, Self>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(product)
    }

    /// Lock a product row for the rest of the transaction.
    ///
    /// Returns `false` when the product does not exist.
    pub async fn lock(conn: &mut PgConnection, id: i64) -> CatalogResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM products WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(found.is_some())
    }

    /// Insert a product and return its id. Category links are not touched.
    pub async fn insert(conn: &mut PgConnection, input: &NewProduct) -> CatalogResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products
                (name, description, price, old_price, discount, rating, gender, image, brands, occasions, colors)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.old_price)
        .bind(input.discount.unwrap_or(0.0))
        .bind(input.rating.unwrap_or(0.0))
        .bind(&input.gender)
        .bind(&input.image)
        .bind(encode_list(&input.brand_ids))
        .bind(encode_list(&input.occasions))
        .bind(encode_list(&input.colors))
        .fetch_one(&mut *conn)
        .await?;

        Ok(id)
    }

    /// Write the columns set in `patch`. Returns the number of rows updated.
    pub async fn apply_patch(
        conn: &mut PgConnection,
        id: i64,
        patch: &ProductPatch,
    ) -> CatalogResult<u64> {
        let assignments = patch.assignments();
        if assignments.is_empty() {
            return Ok(0);
        }

        let mut stmt = Query::update();
        stmt.table(Products::Table);
        for (column, value) in assignments {
            stmt.value(column, value);
        }
        stmt.and_where(Expr::col(Products::Id).eq(id));

        let (sql, values) = stmt.build_sqlx(PostgresQueryBuilder);
        tracing::debug!(sql = %sql, product_id = id, "product update");

        let result = sqlx::query_with(&sql, values).execute(&mut *conn).await?;

        Ok(result.rows_affected())
    }

    /// Delete a product and every row that references it.
    ///
    /// Children go first so foreign keys stay satisfied throughout; callers
    /// run this inside a transaction.
    pub async fn delete_cascade(conn: &mut PgConnection, id: i64) -> CatalogResult<bool> {
        for sql in [
            "DELETE FROM reviews WHERE product_id = $1",
            "DELETE FROM comments WHERE product_id = $1",
            "DELETE FROM product_categories WHERE product_id = $1",
        ] {
            sqlx::query(sql).bind(id).execute(&mut *conn).await?;
        }

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub old_price: Option<Decimal>,
    pub discount: Option<f64>,
    pub rating: Option<f64>,
    pub gender: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub brand_ids: Vec<i64>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub occasions: Vec<String>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

impl NewProduct {
    /// Reject inputs the schema would accept but the catalog should not.
    pub fn validate(&self) -> CatalogResult<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::Validation("name must not be empty".into()));
        }
        check_price("price", Some(self.price))?;
        check_price("oldPrice", self.old_price)?;
        check_discount(self.discount)?;
        check_rating(self.rating)?;
        Ok(())
    }
}

/// Sparse product update: `None` leaves a field untouched.
///
/// `category_ids`, when present, replaces every category link of the product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub old_price: Option<Decimal>,
    pub discount: Option<f64>,
    pub rating: Option<f64>,
    pub gender: Option<String>,
    pub image: Option<String>,
    pub brand_ids: Option<Vec<i64>>,
    pub colors: Option<Vec<String>>,
    pub occasions: Option<Vec<String>>,
    pub category_ids: Option<Vec<i64>>,
}

impl ProductPatch {
    /// Whether the patch changes nothing at all.
    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty() && self.category_ids.is_none()
    }

    /// Validate the fields that are present.
    pub fn validate(&self) -> CatalogResult<()> {
        if self.is_empty() {
            return Err(CatalogError::Validation("update has no fields".into()));
        }
        if matches!(self.name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(CatalogError::Validation("name must not be empty".into()));
        }
        check_price("price", self.price)?;
        check_price("oldPrice", self.old_price)?;
        check_discount(self.discount)?;
        check_rating(self.rating)?;
        Ok(())
    }

    /// Column assignments for the fields that are present.
    pub fn assignments(&self) -> Vec<(Products, Value)> {
        let mut set: Vec<(Products, Value)> = Vec::new();

        if let Some(ref name) = self.name {
            set.push((Products::Name, name.trim().into()));
        }
        if let Some(ref description) = self.description {
            set.push((Products::Description, description.clone().into()));
        }
        if let Some(price) = self.price {
            set.push((Products::Price, price.into()));
        }
        if let Some(old_price) = self.old_price {
            set.push((Products::OldPrice, old_price.into()));
        }
        if let Some(discount) = self.discount {
            set.push((Products::Discount, discount.into()));
        }
        if let Some(rating) = self.rating {
            set.push((Products::Rating, rating.into()));
        }
        if let Some(ref gender) = self.gender {
            set.push((Products::Gender, gender.clone().into()));
        }
        if let Some(ref image) = self.image {
            set.push((Products::Image, image.clone().into()));
        }
        if let Some(ref brand_ids) = self.brand_ids {
            set.push((Products::Brands, encode_list(brand_ids).into()));
        }
        if let Some(ref occasions) = self.occasions {
            set.push((Products::Occasions, encode_list(occasions).into()));
        }
        if let Some(ref colors) = self.colors {
            set.push((Products::Colors, encode_list(colors).into()));
        }

        set
    }
}

fn check_price(field: &str, price: Option<Decimal>) -> CatalogResult<()> {
    if price.is_some_and(|p| p < Decimal::ZERO) {
        let message = format!("{field} must not be negative");
        return Err(CatalogError::Validation(message));
    }
    Ok(())
}

fn check_discount(discount: Option<f64>) -> CatalogResult<()> {
    if discount.is_some_and(|d| !(0.0..=100.0).contains(&d)) {
        let message = "discount must be between 0 and 100";
        return Err(CatalogError::Validation(message.into()));
    }
    Ok(())
}

fn check_rating(rating: Option<f64>) -> CatalogResult<()> {
    if rating.is_some_and(|r| !r.is_finite() || r < 0.0) {
        let message = "rating must be a non-negative number";
        return Err(CatalogError::Validation(message.into()));
    }
    Ok(())
}

/// Comma-join list values the way the catalog stores them.
pub fn encode_list<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a brand list stored either as `3,7` or as a JSON array
/// (`[3,7]` or `["3","7"]`).
pub fn decode_id_list(raw: &str) -> Vec<i64> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(raw) else {
            return Vec::new();
        };
        return values
            .iter()
            .filter_map(|v| match v {
                serde_json::Value::Number(n) => n.as_i64(),
                serde_json::Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect();
    }

    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
