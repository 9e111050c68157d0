//! Seed the database with a small demo catalog.
//!
//! Intended for local development only; every insert is keyed on the unique
//! name columns, so re-running the command is harmless.

use rust_decimal::Decimal;
use sqlx::PgPool;

use super::CliError;

struct DemoVariant {
    label: &'static str,
    price: &'static str,
    original_price: Option<&'static str>,
    stock: i32,
}

struct DemoProduct {
    name: &'static str,
    description: &'static str,
    category: &'static str,
    sub_category: &'static str,
    variants: &'static [DemoVariant],
}

const CATEGORIES: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "Beverages",
        "Coffee, tea, and everything brewed",
        &[
            ("Coffee", "Whole bean and ground coffee"),
            ("Tea", "Loose leaf and bagged tea"),
        ],
    ),
    (
        "Pantry",
        "Staples and dry goods",
        &[
            ("Spices", "Whole and ground spices"),
            ("Grains", "Rice, oats, and other grains"),
        ],
    ),
];

const PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        name: "House Blend Coffee",
        description: "Medium roast, chocolate and caramel notes.",
        category: "Beverages",
        sub_category: "Coffee",
        variants: &[
            DemoVariant {
                label: "250g",
                price: "8.50",
                original_price: Some("10.00"),
                stock: 40,
            },
            DemoVariant {
                label: "1kg",
                price: "28.00",
                original_price: None,
                stock: 15,
            },
        ],
    },
    DemoProduct {
        name: "Earl Grey",
        description: "Black tea scented with bergamot.",
        category: "Beverages",
        sub_category: "Tea",
        variants: &[DemoVariant {
            label: "100g tin",
            price: "6.00",
            original_price: None,
            stock: 25,
        }],
    },
    DemoProduct {
        name: "Smoked Paprika",
        description: "Sweet, oak-smoked Spanish paprika.",
        category: "Pantry",
        sub_category: "Spices",
        variants: &[
            DemoVariant {
                label: "75g jar",
                price: "4.25",
                original_price: None,
                stock: 60,
            },
            DemoVariant {
                label: "250g refill",
                price: "11.00",
                original_price: Some("12.50"),
                stock: 20,
            },
        ],
    },
    DemoProduct {
        name: "Basmati Rice",
        description: "Aged long-grain basmati.",
        category: "Pantry",
        sub_category: "Grains",
        variants: &[DemoVariant {
            label: "2kg",
            price: "9.75",
            original_price: None,
            stock: 30,
        }],
    },
];

/// Insert the demo catalog.
///
/// # Errors
///
/// Returns an error if `CLOVE_DATABASE_URL` is not set or an insert fails.
pub async fn run() -> Result<(), CliError> {
    let pool = super::connect().await?;

    for (name, description, subs) in CATEGORIES {
        let main_id = upsert_category(&pool, name, description, None).await?;
        for (sub_name, sub_description) in *subs {
            upsert_category(&pool, sub_name, sub_description, Some(main_id)).await?;
        }
    }
    tracing::info!("Seeded {} categories", CATEGORIES.len());

    for product in PRODUCTS {
        let category_id = category_id_by_name(&pool, product.category).await?;
        let sub_category_id = category_id_by_name(&pool, product.sub_category).await?;

        let product_id: i32 = sqlx::query_scalar(
            "INSERT INTO products (name, description, category_id, sub_category_id)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (name) DO UPDATE SET updated_at = NOW()
             RETURNING id",
        )
        .bind(product.name)
        .bind(product.description)
        .bind(category_id)
        .bind(sub_category_id)
        .fetch_one(&pool)
        .await?;

        for variant in product.variants {
            let price: Decimal = variant
                .price
                .parse()
                .map_err(|_| CliError::SeedData(format!("price {}", variant.price)))?;
            let original_price: Option<Decimal> = variant
                .original_price
                .map(str::parse)
                .transpose()
                .map_err(|_| CliError::SeedData(format!("price {:?}", variant.original_price)))?;

            sqlx::query(
                "INSERT INTO product_variants (product_id, label, price, original_price, stock)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (product_id, label) DO NOTHING",
            )
            .bind(product_id)
            .bind(variant.label)
            .bind(price)
            .bind(original_price)
            .bind(variant.stock)
            .execute(&pool)
            .await?;
        }
    }
    tracing::info!("Seeded {} products", PRODUCTS.len());

    Ok(())
}

async fn upsert_category(
    pool: &PgPool,
    name: &str,
    description: &str,
    parent_id: Option<i32>,
) -> Result<i32, CliError> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO categories (name, description, parent_id)
         VALUES ($1, $2, $3)
         ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
         RETURNING id",
    )
    .bind(name)
    .bind(description)
    .bind(parent_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn category_id_by_name(pool: &PgPool, name: &str) -> Result<i32, CliError> {
    let id: i32 = sqlx::query_scalar("SELECT id FROM categories WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}
