//! Product repository for catalog database operations.
//!
//! List queries are assembled dynamically from the normalized
//! [`ProductQuery`]; full-text search uses the generated `search_vec`
//! column and `websearch_to_tsquery`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use cedarmarket_core::ProductId;

use super::RepositoryError;
use crate::models::{
    CategoryStat, NewProduct, Product, ProductPage, ProductPatch, ProductQuery, ProductSort,
    ProductStats,
};

const PRODUCT_COLUMNS: &str = "id, name, price, description, image, stock, category, brand, \
     rating, num_reviews, is_active, created_at, updated_at";

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    price: Decimal,
    description: String,
    image: String,
    stock: i32,
    category: String,
    brand: String,
    rating: f64,
    num_reviews: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            description: row.description,
            image: row.image,
            stock: row.stock,
            category: row.category,
            brand: row.brand,
            rating: row.rating,
            num_reviews: row.num_reviews,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for the per-category aggregate.
#[derive(Debug, sqlx::FromRow)]
struct CategoryStatRow {
    category: String,
    count: i64,
    avg_price: Option<Decimal>,
    total_stock: Option<i64>,
}

impl From<CategoryStatRow> for CategoryStat {
    fn from(row: CategoryStatRow) -> Self {
        Self {
            category: row.category,
            count: row.count,
            avg_price: row.avg_price.unwrap_or(Decimal::ZERO),
            total_stock: row.total_stock.unwrap_or(0),
        }
    }
}

/// Append the WHERE clause for a normalized list query.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    builder.push(" WHERE TRUE");

    if !query.includes_inactive() {
        builder.push(" AND is_active = TRUE");
    }

    if let Some(category) = &query.category {
        builder
            .push(" AND category ILIKE ")
            .push_bind(format!("%{category}%"));
    }

    if let Some(search) = &query.search {
        builder
            .push(" AND search_vec @@ websearch_to_tsquery('english', ")
            .push_bind(search.clone())
            .push(")");
    }

    if let Some(min_price) = query.min_price {
        builder.push(" AND price >= ").push_bind(min_price);
    }

    if let Some(max_price) = query.max_price {
        builder.push(" AND price <= ").push_bind(max_price);
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List one page of products matching a normalized query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, query: &ProductQuery) -> Result<ProductPage, RepositoryError> {
        let mut count_builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products"
        ));
        push_filters(&mut builder, query);

        match query.sort {
            ProductSort::PriceAsc => {
                builder.push(" ORDER BY price ASC");
            }
            ProductSort::PriceDesc => {
                builder.push(" ORDER BY price DESC");
            }
            ProductSort::Relevance => match &query.search {
                Some(search) => {
                    builder
                        .push(" ORDER BY ts_rank(search_vec, websearch_to_tsquery('english', ")
                        .push_bind(search.clone())
                        .push(")) DESC");
                }
                None => {
                    builder.push(" ORDER BY created_at DESC");
                }
            },
            ProductSort::Newest => {
                builder.push(" ORDER BY created_at DESC");
            }
        }

        builder.push(" LIMIT ").push_bind(i64::from(query.limit));
        builder.push(" OFFSET ").push_bind(query.offset());

        let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(self.pool).await?;

        Ok(ProductPage {
            products: rows.into_iter().map(Product::from).collect(),
            total_pages: (total + i64::from(query.limit) - 1) / i64::from(query.limit),
            current_page: query.page,
            total,
        })
    }

    /// Get a product by id, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products (id, name, price, description, image, stock, category, brand)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(ProductId::mint())
        .bind(new.name)
        .bind(new.price)
        .bind(new.description)
        .bind(new.image)
        .bind(new.stock)
        .bind(new.category)
        .bind(new.brand)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update to a product.
    ///
    /// Read-modify-write at the row level, like every catalog mutation:
    /// last write wins under concurrency.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let Some(mut product) = self.get(id).await? else {
            return Ok(None);
        };

        patch.apply(&mut product);

        let row: ProductRow = sqlx::query_as(&format!(
            "UPDATE products
             SET name = $2, price = $3, description = $4, image = $5, stock = $6,
                 category = $7, brand = $8, is_active = $9, updated_at = NOW()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(product.name)
        .bind(product.price)
        .bind(product.description)
        .bind(product.image)
        .bind(product.stock)
        .bind(product.category)
        .bind(product.brand)
        .bind(product.is_active)
        .fetch_one(self.pool)
        .await?;

        Ok(Some(row.into()))
    }

    /// Soft-delete a product by clearing its active flag.
    ///
    /// Returns `false` if no such product exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn soft_delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a product row.
    ///
    /// Returns `false` if no such product exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn hard_delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Distinct categories among active products, alphabetized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar(
            "SELECT DISTINCT category FROM products WHERE is_active = TRUE ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Aggregate catalog statistics: per-category breakdown plus
    /// active/inactive totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn stats(&self) -> Result<ProductStats, RepositoryError> {
        let rows: Vec<CategoryStatRow> = sqlx::query_as(
            "SELECT category,
                    COUNT(*) AS count,
                    AVG(price) AS avg_price,
                    SUM(stock)::BIGINT AS total_stock
             FROM products
             WHERE is_active = TRUE
             GROUP BY category
             ORDER BY count DESC",
        )
        .fetch_all(self.pool)
        .await?;

        let total_active: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = TRUE")
                .fetch_one(self.pool)
                .await?;
        let total_inactive: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = FALSE")
                .fetch_one(self.pool)
                .await?;

        Ok(ProductStats {
            by_category: rows.into_iter().map(CategoryStat::from).collect(),
            total_active,
            total_inactive,
            total: total_active + total_inactive,
        })
    }

    /// Total number of product rows, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
