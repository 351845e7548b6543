use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use canteen_api::{config::AppConfig, db::create_pool};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@canteen.example", "admin123", "admin").await?;
    let seller_id =
        ensure_user(&pool, "seller", "seller@canteen.example", "seller123", "seller").await?;
    let customer_id =
        ensure_user(&pool, "student", "student@canteen.example", "student123", "customer").await?;
    seed_menu(&pool).await?;

    println!("Seed completed. Admin: {admin_id}, Seller: {seller_id}, Customer: {customer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE username = $1")
                .bind(username)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {username} (role={role})");
    Ok(user_id)
}

async fn seed_menu(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let items: Vec<(&str, &str, &str, Decimal, i32)> = vec![
        (
            "Chicken Biryani",
            "Fragrant rice with spiced chicken",
            "Meals",
            Decimal::new(12000, 2),
            30,
        ),
        (
            "Beef Khichuri",
            "Comfort rice and lentils with beef",
            "Meals",
            Decimal::new(9000, 2),
            25,
        ),
        (
            "French Fries",
            "Crispy golden fries",
            "Snacks",
            Decimal::new(3000, 2),
            5,
        ),
        (
            "Samosa",
            "Vegetable samosa, served hot",
            "Snacks",
            Decimal::new(1500, 2),
            40,
        ),
        (
            "Coffee",
            "Hot filter coffee",
            "Beverages",
            Decimal::new(5000, 2),
            10,
        ),
    ];

    for (name, desc, category, price, stock) in items {
        sqlx::query(
            r#"
            INSERT INTO food_items (id, name, price, category, description, stock_quantity, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(price)
        .bind(category)
        .bind(desc)
        .bind(stock)
        .bind(stock > 0)
        .execute(pool)
        .await?;
    }

    println!("Seeded menu");
    Ok(())
}
