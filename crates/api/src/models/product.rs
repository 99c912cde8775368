//! Catalog product model and list-query types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cedarmarket_core::ProductId;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub image: String,
    pub stock: i32,
    pub category: String,
    pub brand: String,
    pub rating: f64,
    pub num_reviews: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a product. Validation happens at the route boundary.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub image: String,
    pub stock: i32,
    pub category: String,
    pub brand: String,
}

/// Partial update for a product: `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductPatch {
    /// Apply this patch to a product in place.
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(brand) = self.brand {
            product.brand = brand;
        }
        if let Some(is_active) = self.is_active {
            product.is_active = is_active;
        }
    }
}

/// Sort modes for the product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Newest first. The fallback when no sort is requested and no search
    /// term is present.
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    /// Full-text relevance. Only meaningful when a search term is present.
    Relevance,
}

impl ProductSort {
    /// Parse the `sort` query parameter; unknown values fall back to the
    /// default ordering.
    #[must_use]
    pub fn from_param(param: Option<&str>, has_search: bool) -> Self {
        match param {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            _ if has_search => Self::Relevance,
            _ => Self::Newest,
        }
    }

    /// Stable token used in cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Relevance => "relevance",
        }
    }
}

/// A fully normalized product list query.
///
/// Every optional request parameter has been resolved to an explicit
/// default here, so two requests that differ only in how they spell a
/// default (e.g. `page=1` vs no `page`) produce identical values and
/// therefore identical cache keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
    pub show_all: bool,
    pub include_inactive: bool,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ProductSort,
}

impl ProductQuery {
    /// Default page when the parameter is omitted.
    pub const DEFAULT_PAGE: u32 = 1;
    /// Default page size when the parameter is omitted.
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Whether inactive products are included in the result set.
    #[must_use]
    pub const fn includes_inactive(&self) -> bool {
        self.show_all || self.include_inactive
    }

    /// Row offset for the requested page.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * (self.limit as i64)
    }
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
            show_all: false,
            include_inactive: false,
            min_price: None,
            max_price: None,
            sort: ProductSort::Newest,
        }
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total_pages: i64,
    pub current_page: u32,
    pub total: i64,
}

/// Per-category aggregate used by the stats endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category: String,
    pub count: i64,
    pub avg_price: Decimal,
    pub total_stock: i64,
}

/// Catalog-wide aggregate statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    pub by_category: Vec<CategoryStat>,
    pub total_active: i64,
    pub total_inactive: i64,
    pub total: i64,
}

/// Raw list-query parameters as they arrive on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub show_all: Option<bool>,
    pub include_inactive: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<String>,
}

impl From<ListProductsParams> for ProductQuery {
    fn from(params: ListProductsParams) -> Self {
        // Empty strings behave like omitted parameters so that `?search=`
        // and no `search` at all land on the same cache key.
        let category = params.category.filter(|c| !c.is_empty());
        let search = params.search.filter(|s| !s.is_empty());
        let sort = ProductSort::from_param(params.sort.as_deref(), search.is_some());

        Self {
            category,
            search,
            page: params.page.unwrap_or(Self::DEFAULT_PAGE).max(1),
            limit: params.limit.unwrap_or(Self::DEFAULT_LIMIT).max(1),
            show_all: params.show_all.unwrap_or(false),
            include_inactive: params.include_inactive.unwrap_or(false),
            min_price: params.min_price,
            max_price: params.max_price,
            sort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_fills_defaults() {
        let query = ProductQuery::from(ListProductsParams::default());
        assert_eq!(query, ProductQuery::default());
    }

    #[test]
    fn test_explicit_defaults_match_omitted() {
        let explicit = ProductQuery::from(ListProductsParams {
            page: Some(1),
            limit: Some(10),
            show_all: Some(false),
            include_inactive: Some(false),
            search: Some(String::new()),
            category: Some(String::new()),
            ..ListProductsParams::default()
        });
        let omitted = ProductQuery::from(ListProductsParams::default());
        assert_eq!(explicit, omitted);
    }

    #[test]
    fn test_sort_falls_back_to_relevance_with_search() {
        let query = ProductQuery::from(ListProductsParams {
            search: Some("cedar".to_owned()),
            ..ListProductsParams::default()
        });
        assert_eq!(query.sort, ProductSort::Relevance);

        let query = ProductQuery::from(ListProductsParams {
            search: Some("cedar".to_owned()),
            sort: Some("price_desc".to_owned()),
            ..ListProductsParams::default()
        });
        assert_eq!(query.sort, ProductSort::PriceDesc);
    }

    #[test]
    fn test_unknown_sort_is_newest() {
        let query = ProductQuery::from(ListProductsParams {
            sort: Some("alphabetical".to_owned()),
            ..ListProductsParams::default()
        });
        assert_eq!(query.sort, ProductSort::Newest);
    }

    #[test]
    fn test_offset() {
        let query = ProductQuery {
            page: 3,
            limit: 20,
            ..ProductQuery::default()
        };
        assert_eq!(query.offset(), 40);

        let first = ProductQuery::default();
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn test_page_and_limit_floor_at_one() {
        let query = ProductQuery::from(ListProductsParams {
            page: Some(0),
            limit: Some(0),
            ..ListProductsParams::default()
        });
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 1);
    }
}
