//! Boutique test utilities.
//!
//! Helpers for integration testing: product fixtures, direct seeding of
//! catalog tables, and assertion helpers for generated SQL.

use rust_decimal::Decimal;
use sqlx::PgPool;

/// Create a test product with default values.
pub fn test_product(name: &str) -> TestProduct {
    TestProduct {
        name: name.to_string(),
        price: Decimal::new(1000, 2),
        discount: 0.0,
        rating: 0.0,
        gender: None,
        brands: String::new(),
        occasions: String::new(),
    }
}

/// A test product builder for seeding the products table directly.
#[derive(Debug, Clone)]
pub struct TestProduct {
    pub name: String,
    pub price: Decimal,
    pub discount: f64,
    pub rating: f64,
    pub gender: Option<String>,
    /// Stored verbatim, so either brand encoding can be seeded.
    pub brands: String,
    pub occasions: String,
}

impl TestProduct {
    /// Set the price in cents.
    pub fn with_price_cents(mut self, cents: i64) -> Self {
        self.price = Decimal::new(cents, 2);
        self
    }

    /// Set the discount percentage.
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    /// Set the rating.
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    /// Set the gender.
    pub fn with_gender(mut self, gender: &str) -> Self {
        self.gender = Some(gender.to_string());
        self
    }

    /// Store brands comma-separated (`3,7`).
    pub fn with_brands(mut self, ids: &[i64]) -> Self {
        self.brands = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self
    }

    /// Store brands as a JSON array (`[3,7]`).
    pub fn with_json_brands(mut self, ids: &[i64]) -> Self {
        self.brands = serde_json::Value::from(ids.to_vec()).to_string();
        self
    }

    /// Store occasions comma-separated.
    pub fn with_occasions(mut self, tags: &[&str]) -> Self {
        self.occasions = tags.join(",");
        self
    }

    /// Insert the product and return its id.
    pub async fn insert(&self, pool: &PgPool) -> sqlx::Result<i64> {
        sqlx::query_scalar(
            r#"
            INSERT INTO products (name, price, discount, rating, gender, brands, occasions)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&self.name)
        .bind(self.price)
        .bind(self.discount)
        .bind(self.rating)
        .bind(&self.gender)
        .bind(&self.brands)
        .bind(&self.occasions)
        .fetch_one(pool)
        .await
    }
}

/// Empty every catalog table and reset id sequences.
pub async fn reset_catalog(pool: &PgPool) -> sqlx::Result<()> {
    sqlx::query(
        "TRUNCATE reviews, comments, product_categories, products, categories, brands RESTART IDENTITY CASCADE",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert a category and return its id.
pub async fn seed_category(pool: &PgPool, name: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
}

/// Insert a brand and return its id.
pub async fn seed_brand(pool: &PgPool, name: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar("INSERT INTO brands (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
}

/// Link a product to a category.
pub async fn link_category(pool: &PgPool, product_id: i64, category_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO product_categories (product_id, category_id) VALUES ($1, $2)")
        .bind(product_id)
        .bind(category_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Add a review to a product.
pub async fn seed_review(pool: &PgPool, product_id: i64, body: &str) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO reviews (product_id, rating, body) VALUES ($1, 5, $2)")
        .bind(product_id)
        .bind(body)
        .execute(pool)
        .await?;
    Ok(())
}

/// Add a comment to a product.
pub async fn seed_comment(pool: &PgPool, product_id: i64, body: &str) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO comments (product_id, body) VALUES ($1, $2)")
        .bind(product_id)
        .bind(body)
        .execute(pool)
        .await?;
    Ok(())
}

/// Row counts that reference one product, per dependent table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductFootprint {
    pub products: i64,
    pub reviews: i64,
    pub comments: i64,
    pub category_links: i64,
}

impl ProductFootprint {
    /// Whether no row anywhere references the product.
    pub fn is_gone(&self) -> bool {
        *self
            == ProductFootprint {
                products: 0,
                reviews: 0,
                comments: 0,
                category_links: 0,
            }
    }
}

/// Count the rows that reference `product_id`.
pub async fn product_footprint(pool: &PgPool, product_id: i64) -> sqlx::Result<ProductFootprint> {
    let (products, reviews, comments, category_links): (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM products WHERE id = $1),
            (SELECT COUNT(*) FROM reviews WHERE product_id = $1),
            (SELECT COUNT(*) FROM comments WHERE product_id = $1),
            (SELECT COUNT(*) FROM product_categories WHERE product_id = $1)
        "#,
    )
    .bind(product_id)
    .fetch_one(pool)
    .await?;

    Ok(ProductFootprint {
        products,
        reviews,
        comments,
        category_links,
    })
}

/// Assertion helpers for generated SQL and other strings.
pub mod assert {
    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a sequence never decreases.
    pub fn non_decreasing<T: PartialOrd + std::fmt::Debug>(values: &[T]) {
        for pair in values.windows(2) {
            assert!(
                pair[0] <= pair[1],
                "Expected non-decreasing values, found {:?} before {:?}",
                pair[0], pair[1]
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_builder() {
        let product = test_product("Scarf")
            .with_price_cents(2599)
            .with_gender("women")
            .with_brands(&[3, 7])
            .with_occasions(&["party", "wedding"]);

        assert_eq!(product.name, "Scarf");
        assert_eq!(product.price, Decimal::new(2599, 2));
        assert_eq!(product.gender.as_deref(), Some("women"));
        assert_eq!(product.brands, "3,7");
        assert_eq!(product.occasions, "party,wedding");
    }

    #[test]
    fn json_brand_encoding() {
        let product = test_product("Belt").with_json_brands(&[3, 7]);
        assert_eq!(product.brands, "[3,7]");
    }

    #[test]
    fn footprint_gone() {
        let gone = ProductFootprint {
            products: 0,
            reviews: 0,
            comments: 0,
            category_links: 0,
        };
        assert!(gone.is_gone());
        assert!(
            !ProductFootprint {
                reviews: 1,
                ..gone
            }
            .is_gone()
        );
    }

    #[test]
    fn test_assertions() {
        assert::contains("SELECT DISTINCT", "DISTINCT");
        assert::not_contains("SELECT", "DELETE");
        assert::non_decreasing(&[1, 2, 2, 5]);
    }
}
