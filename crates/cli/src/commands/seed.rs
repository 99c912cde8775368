//! Catalog seeding command.
//!
//! Inserts a small demo catalog for local development. Running it twice
//! inserts duplicates; it is meant for a fresh database.

use rust_decimal::Decimal;
use tracing::info;

use cedarmarket_api::db::ProductRepository;
use cedarmarket_api::models::NewProduct;

use super::{CommandError, connect};

fn demo_products() -> Vec<NewProduct> {
    let entries: [(&str, i64, &str, &str, i32, &str, &str); 6] = [
        (
            "Cedar Soap Bar",
            450,
            "Hand-made olive oil soap with cedar essence.",
            "/uploads/cedar-soap.jpg",
            120,
            "soap",
            "Cedar Works",
        ),
        (
            "Olive Wood Candle",
            1200,
            "Slow-burning candle in a carved olive wood holder.",
            "/uploads/olive-candle.jpg",
            45,
            "candles",
            "Cedar Works",
        ),
        (
            "Za'atar Blend 250g",
            800,
            "Wild thyme, sumac and toasted sesame, stone-ground.",
            "/uploads/zaatar.jpg",
            200,
            "pantry",
            "Jabal Farms",
        ),
        (
            "Orange Blossom Water",
            650,
            "Distilled orange blossom water in a glass bottle.",
            "/uploads/blossom-water.jpg",
            80,
            "pantry",
            "Jabal Farms",
        ),
        (
            "Hand-Loomed Towel",
            2400,
            "Cotton towel woven on a traditional loom.",
            "/uploads/towel.jpg",
            30,
            "home",
            "",
        ),
        (
            "Ceramic Serving Bowl",
            3500,
            "Glazed stoneware bowl, dishwasher safe.",
            "/uploads/bowl.jpg",
            18,
            "home",
            "Atelier Nar",
        ),
    ];

    entries
        .into_iter()
        .map(
            |(name, cents, description, image, stock, category, brand)| NewProduct {
                name: name.to_owned(),
                price: Decimal::new(cents, 2),
                description: description.to_owned(),
                image: image.to_owned(),
                stock,
                category: category.to_owned(),
                brand: brand.to_owned(),
            },
        )
        .collect()
}

/// Insert the demo catalog.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    let products = demo_products();
    let total = products.len();

    for product in products {
        let inserted = repo.insert(product).await?;
        info!(id = %inserted.id, name = %inserted.name, "seeded product");
    }

    info!(total, "catalog seeded");
    Ok(())
}
