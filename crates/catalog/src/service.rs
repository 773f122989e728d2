//! Catalog service: the operations the web layer calls.
//!
//! Provides:
//! - Filtered, paginated listing with a consistent total count
//! - Single product and category lookups
//! - Product create / update / delete, each in one transaction
//! - Listing revalidation after every committed mutation

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;

use crate::config::CatalogSettings;
use crate::db;
use crate::error::{CatalogError, CatalogResult};
use crate::listing::{ListingRequest, Pagination, ProductPage, ProductQueryBuilder};
use crate::models::{Brand, Category, NewProduct, Product, ProductPatch};
use crate::revalidate::Revalidator;

/// Service for catalog reads and writes.
#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
    settings: CatalogSettings,
    revalidator: Arc<dyn Revalidator>,
}

impl CatalogService {
    /// Create a new CatalogService.
    pub fn new(
        pool: PgPool,
        settings: CatalogSettings,
        revalidator: Arc<dyn Revalidator>,
    ) -> Self {
        Self {
            pool,
            settings,
            revalidator,
        }
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Active settings.
    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Whether the database answers.
    pub async fn health_check(&self) -> bool {
        db::check_health(&self.pool).await
    }

    /// One page of products matching the request's filters, plus the total
    /// number of distinct matches.
    pub async fn list_products(&self, request: &ListingRequest) -> CatalogResult<ProductPage> {
        let pagination = Pagination::resolve(request.page_no, request.page_size, &self.settings)?;
        let criteria = request.filters.resolve(self.settings.malformed_filters)?;
        let builder = ProductQueryBuilder::new(&criteria);

        // Count and page read the same snapshot.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        sqlx::query("SELECT set_config('statement_timeout', $1, true)")
            .bind(format!("{}ms", self.settings.statement_timeout_ms))
            .execute(&mut *tx)
            .await?;

        let (count_sql, count_values) = builder.build_count();
        tracing::debug!(sql = %count_sql, "listing count query");
        let count = sqlx::query_scalar_with::<_, i64, _>(&count_sql, count_values)
            .fetch_one(&mut *tx)
            .await?;

        let (page_sql, page_values) = builder.build_page(pagination);
        tracing::debug!(sql = %page_sql, "listing page query");
        let products = sqlx::query_as_with::<_, Product, _>(&page_sql, page_values)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let page = ProductPage::new(products, u64::try_from(count).unwrap_or(0), pagination);
        tracing::debug!(
            count = page.count,
            page = pagination.page_no,
            results = page.num_of_results_on_cur_page,
            "listing served"
        );

        Ok(page)
    }

    /// Fetch one product.
    pub async fn get_product(&self, id: i64) -> CatalogResult<Product> {
        Product::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| CatalogError::product_not_found(id))
    }

    /// Create a product with its category links. Returns the new id.
    pub async fn create_product(&self, input: NewProduct) -> CatalogResult<i64> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        let id = Product::insert(&mut tx, &input).await?;
        Category::link(&mut tx, id, &input.category_ids).await?;
        tx.commit().await?;

        tracing::info!(product_id = id, "product created");
        self.revalidate_listing().await;

        Ok(id)
    }

    /// Apply a sparse update. Category links are replaced when the patch
    /// carries `category_ids`.
    pub async fn update_product(&self, id: i64, patch: ProductPatch) -> CatalogResult<()> {
        patch.validate()?;

        let mut tx = self.pool.begin().await?;
        if !Product::lock(&mut tx, id).await? {
            return Err(CatalogError::product_not_found(id));
        }

        Product::apply_patch(&mut tx, id, &patch).await?;
        if let Some(ref category_ids) = patch.category_ids {
            Category::replace_for_product(&mut tx, id, category_ids).await?;
        }
        tx.commit().await?;

        tracing::info!(product_id = id, "product updated");
        self.revalidate_listing().await;

        Ok(())
    }

    /// Delete a product together with its reviews, comments and category
    /// links. Either everything goes or nothing does.
    pub async fn delete_product(&self, id: i64) -> CatalogResult<()> {
        let mut tx = self.pool.begin().await?;
        if !Product::lock(&mut tx, id).await? {
            return Err(CatalogError::product_not_found(id));
        }

        Product::delete_cascade(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(product_id = id, "product deleted");
        self.revalidate_listing().await;

        Ok(())
    }

    /// Map brand ids to brand names.
    pub async fn brand_names(&self, ids: &[i64]) -> CatalogResult<HashMap<i64, String>> {
        Brand::names_by_id(&self.pool, ids).await
    }

    /// Category names for each of `products`, keyed by product id.
    pub async fn categories_by_product(
        &self,
        products: &[Product],
    ) -> CatalogResult<HashMap<i64, Vec<String>>> {
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        Category::names_by_product(&self.pool, &ids).await
    }

    /// Categories linked to one product.
    pub async fn categories_for_product(&self, id: i64) -> CatalogResult<Vec<Category>> {
        Category::for_product(&self.pool, id).await
    }

    /// All categories.
    pub async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        Category::list(&self.pool).await
    }

    /// All brands.
    pub async fn list_brands(&self) -> CatalogResult<Vec<Brand>> {
        Brand::list(&self.pool).await
    }

    async fn revalidate_listing(&self) {
        let path = &self.settings.listing_path;
        if let Err(e) = self.revalidator.revalidate_path(path).await {
            tracing::error!(path = %path, error = %e, "listing revalidation failed");
        }
    }
}
