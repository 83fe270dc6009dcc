//! Database seeder for Cashbook development and testing.
//!
//! Seeds the category directory of a fixed development branch and prints
//! access tokens for a cashier and an administrator of that branch.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use uuid::Uuid;

use cashbook_db::CategoryRepository;
use cashbook_shared::types::{BranchId, UserId};
use cashbook_shared::{AppConfig, JwtConfig, JwtService};

/// Development branch (consistent for all seeds).
const DEV_BRANCH_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);
/// Development cashier.
const DEV_CASHIER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0002);
/// Development administrator.
const DEV_ADMIN_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0003);

const CATEGORIES: [&str; 6] = [
    "Sales",
    "Tips",
    "Supplies",
    "Cleaning",
    "Delivery",
    "Petty cash",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    let branch_id = BranchId::from_uuid(DEV_BRANCH_ID);

    println!("Connecting to database...");
    let db = cashbook_db::connect_with_config(&config.database)
        .await
        .context("failed to connect to database")?;

    println!("Seeding categories for branch {branch_id}...");
    let categories = CategoryRepository::new(db);
    let existing: Vec<String> = categories
        .list_by_branch(branch_id)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    for name in CATEGORIES {
        if existing.iter().any(|e| e == name) {
            println!("  {name} already exists, skipping...");
            continue;
        }
        let category = categories.create(branch_id, name).await?;
        println!("  {name} -> {}", category.id);
    }

    let jwt = JwtService::new(JwtConfig {
        secret: config.jwt.secret,
        access_token_expires_minutes: 24 * 60,
    });
    let cashier = jwt.generate_access_token(UserId::from_uuid(DEV_CASHIER_ID), branch_id, "cashier")?;
    let admin = jwt.generate_access_token(UserId::from_uuid(DEV_ADMIN_ID), branch_id, "admin")?;

    println!();
    println!("Branch:        {branch_id}");
    println!("Cashier token: {cashier}");
    println!("Admin token:   {admin}");
    println!("Seeding complete!");
    Ok(())
}
