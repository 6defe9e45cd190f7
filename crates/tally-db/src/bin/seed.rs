//! # Seed Data Generator
//!
//! Populates the database with demo users and catalog items for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally_dev.db
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```

use rust_decimal::Decimal;
use std::env;
use tally_core::{ItemType, Money};
use tally_db::{Database, DbConfig};

/// Demo users: (name, email)
const USERS: &[(&str, &str)] = &[
    ("Dashboard Admin", "admin@tally.local"),
    ("Sales Clerk", "clerk@tally.local"),
];

/// Demo catalog: (name, price in cents, type)
const ITEMS: &[(&str, i64, ItemType)] = &[
    ("Espresso Beans 1kg", 2450, ItemType::ForSale),
    ("Filter Papers (100)", 399, ItemType::ForSale),
    ("Ceramic Mug", 1200, ItemType::ForSale),
    ("Milk Frother", 3499, ItemType::ForSale),
    ("Gift Card", 2500, ItemType::ForSale),
    ("Green Beans Sack", 18000, ItemType::ForPurchase),
    ("Packaging Rolls", 4500, ItemType::ForPurchase),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (name, email) in USERS {
        let id = db.users().insert(name, email).await?;
        println!("  user #{id}: {name} <{email}>");
    }

    for (name, cents, item_type) in ITEMS {
        let price = Money::new(Decimal::new(*cents, 2));
        let id = db.items().insert(name, price, *item_type).await?;
        println!("  item #{id}: {name} {price} ({item_type:?})");
    }

    println!();
    println!("✓ Seeded {} users and {} items", USERS.len(), ITEMS.len());

    db.close().await;
    Ok(())
}
