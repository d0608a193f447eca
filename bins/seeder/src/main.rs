//! Database seeder for brokerage development and testing.
//!
//! Seeds roles with their permissions, the reference tables and a demo broker
//! in one transaction: a failure anywhere leaves the database as it was.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, Set,
};

use brokerage_db::entities::{permissions, roles};
use brokerage_db::repositories::reference::insert_step;
use brokerage_db::repositories::{
    BrokerRepository, CreateBrokerInput, NewReferenceItem, ReferenceKind,
};
use brokerage_db::UnitOfWork;

/// Roles as (slug, name, permissions).
const ROLES: &[(&str, &str, &[&str])] = &[
    (
        "super-admin",
        "Super Admin",
        &["users.manage", "brokers.manage", "customers.manage", "exports.run"],
    ),
    ("broker-admin", "Broker Admin", &["customers.manage", "exports.run"]),
    ("agent", "Agent", &["customers.view"]),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = brokerage_db::connect(&database_url).await?;

    if roles::Entity::find().count(&db).await? > 0 {
        println!("Database already seeded, skipping...");
        return Ok(());
    }

    let brokers = BrokerRepository::new(db.clone());
    let uow = UnitOfWork::new(db);

    let demo = uow
        .run(move |txn| {
            Box::pin(async move {
                println!("Seeding roles...");
                seed_roles(txn).await?;

                println!("Seeding reference data...");
                for kind in ReferenceKind::ALL {
                    for item in reference_data(kind) {
                        insert_step(kind, item)(txn).await?;
                    }
                }

                println!("Seeding demo broker...");
                let demo = brokers
                    .create_with_head_office_in(
                        Some(txn),
                        CreateBrokerInput {
                            name: "Demo Insurance Brokers".to_string(),
                            code: "DEMO".to_string(),
                            email: Some("office@demo-brokers.test".to_string()),
                            phone: None,
                            head_office_name: "Head Office".to_string(),
                        },
                    )
                    .await?;
                Ok::<_, anyhow::Error>(demo)
            })
        })
        .await?;

    println!(
        "Seeding complete! Demo broker {} with head office {}",
        demo.broker.id, demo.head_office.code
    );
    Ok(())
}

async fn seed_roles(txn: &DatabaseTransaction) -> Result<(), DbErr> {
    let now = Utc::now().into();
    for (slug, name, grants) in ROLES {
        let role = roles::ActiveModel {
            name: Set((*name).to_string()),
            slug: Set((*slug).to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        for grant in *grants {
            permissions::ActiveModel {
                role_id: Set(role.id),
                name: Set((*grant).to_string()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }
    }
    Ok(())
}

fn reference_data(kind: ReferenceKind) -> Vec<NewReferenceItem> {
    let entries: &[(&str, &str)] = match kind {
        ReferenceKind::FuelType => &[
            ("Petrol", "PETROL"),
            ("Diesel", "DIESEL"),
            ("Hybrid", "HYBRID"),
            ("Electric", "ELECTRIC"),
        ],
        ReferenceKind::PolicyType => &[
            ("Third Party", "TP"),
            ("Third Party, Fire and Theft", "TPFT"),
            ("Comprehensive", "COMP"),
        ],
        ReferenceKind::PremiumType => &[
            ("Annual", "ANNUAL"),
            ("Monthly", "MONTHLY"),
            ("Single", "SINGLE"),
        ],
    };
    entries
        .iter()
        .map(|(name, code)| NewReferenceItem::new(*name, *code))
        .collect()
}
