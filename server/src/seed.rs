//! Seeds an empty database with the admin account and a starter catalogue.
//! Safe to run repeatedly: existing rows are left alone.

use ayurweda_server::core::Config;
use ayurweda_server::dtos::{CategoryDTO, CreateCourseDTO, CreateMedicineDTO, CreateUserDTO};
use ayurweda_server::entities::{Role, User};
use ayurweda_server::repositories::{
    CategoryRepository, Create, CourseRepository, MedicineRepository, UserRepository,
};
use ayurweda_server::MIGRATOR;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn seed_categories() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Churna", "Herbal powders"),
        ("Taila", "Medicated oils"),
        ("Vati", "Tablets and pills"),
        ("Arishta", "Fermented decoctions"),
    ]
}

// (category, name, description, price in cents, stock)
fn seed_medicines() -> Vec<(&'static str, &'static str, &'static str, i64, i64)> {
    vec![
        ("Churna", "Triphala Churna", "Digestive and gentle cleanser", 45_000, 120),
        ("Churna", "Ashwagandha Churna", "Adaptogen for stress and sleep", 65_000, 80),
        ("Taila", "Mahanarayan Taila", "Massage oil for joints", 90_000, 40),
        ("Taila", "Ksheerabala Taila", "Nourishing nerve tonic oil", 85_000, 35),
        ("Vati", "Chandraprabha Vati", "Urinary tract support", 55_000, 60),
        ("Arishta", "Dashamoolarishta", "Post-natal restorative", 75_000, 25),
    ]
}

async fn seed_admin(users: &UserRepository, cost: u32) -> Result<(), Box<dyn std::error::Error>> {
    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@ayurweda.local".to_string());
    if users.find_by_email(&email).await?.is_some() {
        info!("Admin {} already exists", email);
        return Ok(());
    }

    let password = match env::var("ADMIN_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            warn!("ADMIN_PASSWORD not set, using the development default");
            "ChangeMe123!".to_string()
        }
    };
    let name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());

    let admin = users
        .create(&CreateUserDTO {
            name,
            email,
            password: User::hash_password(&password, cost)?,
            role: Role::Admin,
            phone: None,
        })
        .await?;
    info!("Admin account {} created", admin.user_id);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(
            SqliteConnectOptions::from_str(&config.database_url)?
                .create_if_missing(true)
                .foreign_keys(true),
        )
        .await?;
    MIGRATOR.run(&pool).await?;

    seed_admin(&UserRepository::new(pool.clone()), config.bcrypt_cost).await?;

    let categories = CategoryRepository::new(pool.clone());
    let mut existing = categories.find_all().await?;
    for (name, description) in seed_categories() {
        if existing.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
            continue;
        }
        let category = categories
            .create(&CategoryDTO {
                name: name.to_string(),
                description: Some(description.to_string()),
            })
            .await?;
        existing.push(category);
    }
    info!("{} categories available", existing.len());

    let medicine_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medicines")
        .fetch_one(&pool)
        .await?;
    if medicine_count == 0 {
        let medicines = MedicineRepository::new(pool.clone());
        for (category, name, description, price_cents, stock) in seed_medicines() {
            let category_id = existing
                .iter()
                .find(|c| c.name == category)
                .map(|c| c.category_id);
            medicines
                .create(&CreateMedicineDTO {
                    category_id,
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    price_cents,
                    stock,
                    image_url: None,
                })
                .await?;
        }
        info!("Medicines seeded");
    }

    let courses = CourseRepository::new(pool.clone());
    if courses.find_many(None).await?.is_empty() {
        for (title, instructor, weeks) in [
            ("Foundations of Ayurveda", "Dr. Lakshmi Nair", 12),
            ("Panchakarma Practitioner Training", "Dr. Suresh Iyer", 24),
        ] {
            courses
                .create(&CreateCourseDTO {
                    title: title.to_string(),
                    description: None,
                    instructor: Some(instructor.to_string()),
                    duration_weeks: weeks,
                    fee_cents: 0,
                    start_date: None,
                })
                .await?;
        }
        info!("Courses seeded");
    }

    pool.close().await;
    info!("Seeding complete");
    Ok(())
}
