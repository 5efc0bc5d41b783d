//! # Seed Data Generator
//!
//! Populates a database with one demo tenant for development.
//!
//! ## Usage
//! ```bash
//! # 200 products (default) into ./till_dev.db
//! cargo run -p till-db --bin seed
//!
//! # Custom amount, custom path, some sample sales
//! cargo run -p till-db --bin seed -- --count 1000 --db ./data/till.db --sales 50
//! ```
//!
//! ## Generated Data
//! - Tenant "Demo Shop" (GBP) with an owner, a cashier, business details
//!   and two suppliers
//! - One category per product group
//! - Products with SKU `{GROUP}-{NNNN}`, barcode, price, VAT rate
//!   (0%, 5% or 20%) and opening stock booked through the ledger
//! - Optional sample sales rung by the cashier

use std::env;

use anyhow::{bail, Context};
use till_core::{
    BusinessInfo, CartLine, NewCategory, NewProduct, NewSale, NewSupplier, PaymentMethod, Role,
};
use till_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// Product groups for realistic test data.
const GROUPS: &[(&str, &str, &[&str])] = &[
    (
        "BEV",
        "Drinks",
        &[
            "Cola", "Lemonade", "Sparkling Water", "Still Water", "Orange Juice",
            "Apple Juice", "Iced Tea", "Energy Drink", "Ginger Beer", "Cold Brew",
        ],
    ),
    (
        "BAK",
        "Bakery",
        &[
            "Sourdough", "White Loaf", "Wholemeal Loaf", "Croissant", "Pain au Chocolat",
            "Bagel", "Crumpets", "Scone", "Teacake", "Baguette",
        ],
    ),
    (
        "DRY",
        "Dairy",
        &[
            "Whole Milk", "Semi-Skimmed Milk", "Oat Drink", "Cheddar", "Butter",
            "Greek Yoghurt", "Double Cream", "Free Range Eggs", "Mozzarella", "Brie",
        ],
    ),
    (
        "GRO",
        "Grocery",
        &[
            "Spaghetti", "Penne", "Basmati Rice", "Baked Beans", "Chopped Tomatoes",
            "Porridge Oats", "Peanut Butter", "Strawberry Jam", "Honey", "Tea Bags",
        ],
    ),
];

/// Size variants and their price add-on in pence.
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Regular", 40),
    ("Large", 90),
    ("Multipack", 250),
    ("Family", 400),
];

/// VAT rates in basis points (zero, reduced, standard).
const VAT_RATES: &[u32] = &[0, 500, 2000];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,seed=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut sales: usize = 0;
    let mut db_path = String::from("./till_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().context("--count must be a number")?;
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().context("--sales must be a number")?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -s, --sales <N>    Number of sample sales to ring (default: 0)");
                println!("  -d, --db <PATH>    Database file path (default: ./till_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    let max = GROUPS.iter().map(|(_, _, names)| names.len()).sum::<usize>() * SIZES.len();
    if count > max {
        bail!("--count can be at most {max}");
    }

    println!("🌱 Till POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!("Sales:    {}", sales);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let tenant = db.tenants().create("Demo Shop", Some("GBP")).await?;
    let shop = db.tenant(&tenant.id);

    let owner = shop.users().create("owner@demo.shop", "Dana Owner", Role::Owner).await?;
    let cashier = shop.users().create("till@demo.shop", "Casey Cashier", Role::Cashier).await?;
    println!("✓ Tenant {} with owner {} and cashier {}", tenant.id, owner.id, cashier.id);

    shop.settings()
        .update_business_info(BusinessInfo {
            name: tenant.name.clone(),
            address: Some("1 Market Street".to_string()),
            phone: Some("0161 496 0000".to_string()),
            email: Some("hello@demo.shop".to_string()),
            vat_number: Some("GB000000000".to_string()),
            currency: tenant.currency.clone(),
        })
        .await?;
    for (name, email) in [
        ("Northern Dairies", "orders@northern-dairies.test"),
        ("Hillside Bakery Supplies", "trade@hillside.test"),
    ] {
        shop.suppliers().create(NewSupplier::new(name).with_email(email)).await?;
    }
    println!("✓ Business details and 2 suppliers");

    let start = std::time::Instant::now();
    let mut product_ids = Vec::with_capacity(count);

    'groups: for (group_idx, (code, category_name, names)) in GROUPS.iter().enumerate() {
        let category = shop
            .categories()
            .create(&NewCategory {
                name: category_name.to_string(),
                description: None,
            })
            .await?;

        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                if product_ids.len() >= count {
                    break 'groups;
                }

                let seed = group_idx * 1000 + name_idx * 10 + size_idx;
                let req = generate_product(code, name, size, *addon, seed).with_category(&category.id);

                match shop.products().create(req, Some(owner.id.as_str())).await {
                    Ok(product) => product_ids.push(product.id),
                    Err(e) => eprintln!("Failed to insert {} {}: {}", name, size, e),
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!("✓ Generated {} products in {:?}", product_ids.len(), elapsed);

    for n in 0..sales {
        if product_ids.is_empty() {
            break;
        }
        let first = &product_ids[n % product_ids.len()];
        let second = &product_ids[(n * 7 + 3) % product_ids.len()];
        let mut items = vec![CartLine::new(first, 1 + (n % 3) as i64)];
        if second != first {
            items.push(CartLine::new(second, 1));
        }

        let cart = if n % 2 == 0 {
            NewSale::new(items, PaymentMethod::Card)
        } else {
            NewSale::new(items, PaymentMethod::Cash)
        };

        let sale = shop.processor().create_sale(&cashier.id, &cart).await?;
        if n % 10 == 0 {
            println!("  {} total {}", sale.sale_number, sale.total());
        }
    }
    if sales > 0 {
        println!("✓ Rang {} sales", sales);
    }

    let faults = shop.stock().verify_consistency().await?;
    println!("✓ Stock ledger audit: {} discrepancies", faults.len());

    println!();
    println!("✓ Seed complete! Tenant id: {}", tenant.id);

    Ok(())
}

/// Builds one product request with deterministic pseudo-random data.
fn generate_product(group: &str, name: &str, size: &str, price_addon: i64, seed: usize) -> NewProduct {
    // £0.79 - £5.78 + size add-on
    let price_cents = 79 + ((seed * 17) % 500) as i64 + price_addon;

    // Cost at 55-74% of price
    let cost_pct = 55 + (seed % 20) as i64;

    NewProduct::new(format!("{} {}", name, size), price_cents)
        .with_sku(format!("{}-{:04}", group, seed))
        .with_barcode(format!("501{:010}", seed))
        .with_vat_rate_bps(VAT_RATES[seed % VAT_RATES.len()])
        .with_opening_stock((seed % 60) as i64 + 5)
        .with_min_stock_level(5)
        .with_cost_price(price_cents * cost_pct / 100)
}
