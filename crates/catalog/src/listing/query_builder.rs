//! Product listing query builder using SeaQuery.
//!
//! Produces a COUNT statement and a paginated SELECT statement from the same
//! [`ListingCriteria`], so the total and the page always agree on which
//! products match. Filter groups are ANDed; ids and tags within a group are
//! ORed. Every value is bound as a statement parameter.

use sea_query::{Cond, Expr, Order, PostgresQueryBuilder, Query, SelectStatement};
use sea_query_binder::{SqlxBinder, SqlxValues};

use super::filter::{ListingCriteria, SortColumn, SortDirection};
use super::page::Pagination;
use crate::schema::{ProductCategories, Products};

/// `products.brands` holds `3,7` or `[3,7]` / `["3","7"]`; stripping
/// brackets, quotes and spaces leaves a comma list for either encoding.
const BRAND_MEMBERSHIP: &str = r#"$1 = ANY(string_to_array(translate(COALESCE("products"."brands", ''), '[]" ', ''), ','))"#;

const OCCASION_MEMBERSHIP: &str = r#"EXISTS (SELECT 1 FROM unnest(string_to_array(COALESCE("products"."occasions", ''), ',')) AS occasion WHERE btrim(occasion) = $1)"#;

/// The category join can repeat a product once per matching category.
const COUNT_DISTINCT_PRODUCTS: &str = r#"COUNT(DISTINCT "products"."id")"#;

/// Query builder for product listings.
pub struct ProductQueryBuilder<'a> {
    criteria: &'a ListingCriteria,
}

impl<'a> ProductQueryBuilder<'a> {
    pub fn new(criteria: &'a ListingCriteria) -> Self {
        Self { criteria }
    }

    /// COUNT of distinct matching products.
    pub fn count_statement(&self) -> SelectStatement {
        let mut query = Query::select();
        query
            .expr(Expr::cust(COUNT_DISTINCT_PRODUCTS))
            .from(Products::Table);
        self.add_filters(&mut query);
        query
    }

    /// One page of distinct matching products.
    pub fn page_statement(&self, pagination: Pagination) -> SelectStatement {
        let mut query = Query::select();
        query.distinct();
        for column in Products::COLUMNS {
            query.column((Products::Table, column));
        }
        query.from(Products::Table);
        self.add_filters(&mut query);
        self.add_sort(&mut query);
        query
            .limit(u64::from(pagination.page_size))
            .offset(pagination.offset());
        query
    }

    /// Parameterized COUNT SQL and its bind values.
    pub fn build_count(&self) -> (String, SqlxValues) {
        self.count_statement().build_sqlx(PostgresQueryBuilder)
    }

    /// Parameterized page SQL and its bind values.
    pub fn build_page(&self, pagination: Pagination) -> (String, SqlxValues) {
        self.page_statement(pagination).build_sqlx(PostgresQueryBuilder)
    }

    /// Add JOIN and WHERE clauses shared by the count and page statements.
    fn add_filters(&self, query: &mut SelectStatement) {
        let criteria = self.criteria;

        if criteria.joins_categories() {
            query.inner_join(
                ProductCategories::Table,
                Expr::col((ProductCategories::Table, ProductCategories::ProductId))
                    .equals((Products::Table, Products::Id)),
            );
            query.and_where(
                Expr::col((ProductCategories::Table, ProductCategories::CategoryId))
                    .is_in(criteria.category_ids.iter().copied()),
            );
        }

        if !criteria.brand_ids.is_empty() {
            query.cond_where(any_of(
                criteria.brand_ids.iter().map(|id| id.to_string()),
                BRAND_MEMBERSHIP,
            ));
        }

        if let Some(ref gender) = criteria.gender {
            let column = Expr::col((Products::Table, Products::Gender));
            query.and_where(column.eq(gender.as_str()));
        }

        if let Some(price_to) = criteria.price_to {
            query.and_where(Expr::col((Products::Table, Products::Price)).lte(price_to));
        }

        if let Some(range) = criteria.discount {
            let column = Expr::col((Products::Table, Products::Discount));
            query.and_where(column.between(range.min, range.max));
        }

        if !criteria.occasions.is_empty() {
            query.cond_where(any_of(
                criteria.occasions.iter().cloned(),
                OCCASION_MEMBERSHIP,
            ));
        }
    }

    /// Add ORDER BY when a valid sort was requested, with the id as a
    /// tie-breaker so equal keys keep a stable page boundary.
    fn add_sort(&self, query: &mut SelectStatement) {
        let Some(sort) = self.criteria.sort else {
            return;
        };

        let column = match sort.column {
            SortColumn::Price => Products::Price,
            SortColumn::CreatedAt => Products::CreatedAt,
            SortColumn::Rating => Products::Rating,
        };
        let order = match sort.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };

        query.order_by((Products::Table, column), order);
        query.order_by((Products::Table, Products::Id), Order::Asc);
    }
}

/// OR together one membership test per value.
fn any_of(values: impl Iterator<Item = String>, template: &'static str) -> Cond {
    values.fold(Cond::any(), |cond, value| {
        cond.add(Expr::cust_with_values(template, [value]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::filter::{DiscountRange, SortSpec};
    use rust_decimal::Decimal;

    fn page(page_no: u32, page_size: u32) -> Pagination {
        Pagination { page_no, page_size }
    }

    fn render_page(criteria: &ListingCriteria, pagination: Pagination) -> String {
        ProductQueryBuilder::new(criteria)
            .page_statement(pagination)
            .to_string(PostgresQueryBuilder)
    }

    fn render_count(criteria: &ListingCriteria) -> String {
        ProductQueryBuilder::new(criteria)
            .count_statement()
            .to_string(PostgresQueryBuilder)
    }

    #[test]
    fn unfiltered_page() {
        let criteria = ListingCriteria::default();
        let sql = render_page(&criteria, page(3, 10));

        assert!(sql.starts_with("SELECT DISTINCT"), "{sql}");
        assert!(sql.contains("FROM \"products\""), "{sql}");
        assert!(sql.contains("LIMIT 10"), "{sql}");
        assert!(sql.contains("OFFSET 20"), "{sql}");
        assert!(!sql.contains("WHERE"), "{sql}");
        assert!(!sql.contains("ORDER BY"), "{sql}");
    }

    #[test]
    fn count_is_distinct_and_unpaginated() {
        let criteria = ListingCriteria::default();
        let sql = render_count(&criteria);

        assert!(sql.contains("COUNT(DISTINCT \"products\".\"id\")"), "{sql}");
        assert!(!sql.contains("LIMIT"), "{sql}");
        assert!(!sql.contains("OFFSET"), "{sql}");
    }

    #[test]
    fn category_filter_joins_association() {
        let criteria = ListingCriteria {
            category_ids: vec![1, 4],
            ..Default::default()
        };

        for sql in [render_count(&criteria), render_page(&criteria, page(1, 10))] {
            assert!(sql.contains("INNER JOIN \"product_categories\""), "{sql}");
            assert!(
                sql.contains("\"product_categories\".\"category_id\" IN (1, 4)"),
                "{sql}"
            );
        }
    }

    #[test]
    fn brand_filter_ors_membership_tests() {
        let criteria = ListingCriteria {
            brand_ids: vec![3, 7],
            ..Default::default()
        };
        let sql = render_page(&criteria, page(1, 10));

        assert!(sql.contains("'3' = ANY("), "{sql}");
        assert!(sql.contains("'7' = ANY("), "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
        assert!(sql.contains("translate("), "{sql}");
    }

    #[test]
    fn occasion_filter_ors_membership_tests() {
        let criteria = ListingCriteria {
            occasions: vec!["party".to_string(), "wedding".to_string()],
            ..Default::default()
        };
        let sql = render_count(&criteria);

        assert!(sql.contains("btrim(occasion) = 'party'"), "{sql}");
        assert!(sql.contains("btrim(occasion) = 'wedding'"), "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
    }

    #[test]
    fn scalar_filters() {
        let criteria = ListingCriteria {
            gender: Some("women".to_string()),
            price_to: Some(Decimal::new(9999, 2)),
            discount: Some(DiscountRange {
                min: 10.0,
                max: 30.0,
            }),
            ..Default::default()
        };
        let sql = render_page(&criteria, page(1, 10));

        assert!(sql.contains("\"products\".\"gender\" = 'women'"), "{sql}");
        assert!(sql.contains("\"products\".\"price\" <= 99.99"), "{sql}");
        assert!(
            sql.contains("\"products\".\"discount\" BETWEEN 10 AND 30"),
            "{sql}"
        );
    }

    #[test]
    fn count_and_page_share_predicate() {
        let criteria = ListingCriteria {
            brand_ids: vec![2],
            category_ids: vec![5],
            gender: Some("men".to_string()),
            occasions: vec!["office".to_string()],
            sort: SortSpec::parse("rating-desc"),
            ..Default::default()
        };

        let count_sql = render_count(&criteria);
        let page_sql = render_page(&criteria, page(2, 5));

        let where_of = |sql: &str| {
            let start = sql.find("WHERE").unwrap_or(sql.len());
            let end = sql.find("ORDER BY").or_else(|| sql.find("LIMIT")).unwrap_or(sql.len());
            sql[start..end].trim().to_string()
        };
        assert_eq!(where_of(&count_sql), where_of(&page_sql));
    }

    #[test]
    fn sort_orders_with_id_tie_breaker() {
        let criteria = ListingCriteria {
            sort: SortSpec::parse("price-asc"),
            ..Default::default()
        };
        let sql = render_page(&criteria, page(1, 10));

        assert!(
            sql.contains("ORDER BY \"products\".\"price\" ASC, \"products\".\"id\" ASC"),
            "{sql}"
        );
    }

    #[test]
    fn values_are_bound_not_inlined() {
        let criteria = ListingCriteria {
            gender: Some("x' OR 1=1 --".to_string()),
            occasions: vec!["'; DROP TABLE products; --".to_string()],
            ..Default::default()
        };
        let (sql, _values) = ProductQueryBuilder::new(&criteria).build_page(page(1, 10));

        assert!(!sql.contains("OR 1=1"), "{sql}");
        assert!(!sql.contains("DROP TABLE"), "{sql}");
        assert!(sql.contains("$1"), "{sql}");
        assert!(sql.contains("$2"), "{sql}");
    }
}
