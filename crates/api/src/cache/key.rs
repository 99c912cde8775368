//! Cache key derivation for catalog reads.
//!
//! List keys are a pure function of the normalized [`ProductQuery`], so an
//! omitted parameter and its explicit default always produce the same key.
//! Field values are joined with named `|field=` separators rather than bare
//! underscores so that distinct query shapes cannot run together.

use cedarmarket_core::ProductId;

use crate::models::ProductQuery;

/// Namespace prefix for product list pages.
pub const PRODUCTS_LIST: &str = "products_list";
/// Namespace prefix for single-product reads.
pub const PRODUCT_DETAIL: &str = "product_detail";
/// Namespace prefix for catalog counts.
pub const PRODUCTS_COUNT: &str = "products_count";
/// Namespace prefix for the distinct-categories list.
pub const CATEGORIES_LIST: &str = "categories_list";
/// Namespace prefix for aggregate catalog statistics.
pub const PRODUCT_STATS: &str = "product_stats";

/// Every namespace removed by a coarse catalog invalidation.
pub const CATALOG_PREFIXES: [&str; 5] = [
    PRODUCTS_LIST,
    PRODUCT_DETAIL,
    PRODUCTS_COUNT,
    CATEGORIES_LIST,
    PRODUCT_STATS,
];

/// Key for a product list page.
#[must_use]
pub fn products_list(query: &ProductQuery) -> String {
    let min_price = query.min_price.map(|p| p.to_string()).unwrap_or_default();
    let max_price = query.max_price.map(|p| p.to_string()).unwrap_or_default();

    format!(
        "{PRODUCTS_LIST}|cat={}|q={}|page={}|limit={}|all={}|inactive={}|min={min_price}|max={max_price}|sort={}",
        query.category.as_deref().unwrap_or_default(),
        query.search.as_deref().unwrap_or_default(),
        query.page,
        query.limit,
        query.show_all,
        query.include_inactive,
        query.sort.as_str(),
    )
}

/// Key for a single product read.
#[must_use]
pub fn product_detail(id: ProductId) -> String {
    format!("{PRODUCT_DETAIL}|{id}")
}

/// Key for the catalog-wide product count.
#[must_use]
pub fn products_count() -> String {
    format!("{PRODUCTS_COUNT}|all")
}

/// Key for the distinct-categories list.
#[must_use]
pub fn categories_list() -> String {
    CATEGORIES_LIST.to_owned()
}

/// Key for aggregate catalog statistics.
#[must_use]
pub fn product_stats() -> String {
    PRODUCT_STATS.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::ListProductsParams;

    #[test]
    fn test_omitted_page_equals_explicit_default() {
        let omitted = ProductQuery::from(ListProductsParams::default());
        let explicit = ProductQuery::from(ListProductsParams {
            page: Some(1),
            ..ListProductsParams::default()
        });

        assert_eq!(products_list(&omitted), products_list(&explicit));
    }

    #[test]
    fn test_distinct_queries_get_distinct_keys() {
        let base = ProductQuery::default();
        let page_two = ProductQuery {
            page: 2,
            ..ProductQuery::default()
        };
        let searched = ProductQuery {
            search: Some("soap".to_owned()),
            ..ProductQuery::default()
        };
        let categorized = ProductQuery {
            category: Some("soap".to_owned()),
            ..ProductQuery::default()
        };

        let keys = [
            products_list(&base),
            products_list(&page_two),
            products_list(&searched),
            products_list(&categorized),
        ];

        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_every_key_sits_in_a_catalog_namespace() {
        let keys = [
            products_list(&ProductQuery::default()),
            product_detail(ProductId::mint()),
            products_count(),
            categories_list(),
            product_stats(),
        ];

        for key in keys {
            assert!(
                CATALOG_PREFIXES
                    .iter()
                    .any(|prefix| key.starts_with(prefix)),
                "key {key} outside catalog namespaces"
            );
        }
    }
}
