use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{auth::hash_password, config::Config, models::ROLE_ADMIN};

const SCHEMA: &str = include_str!("../migrations/001_schema.sql");

pub async fn connect_pg(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn apply_schema(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// Makes sure an administrator exists and, when enabled, that the doctor
/// directory is not empty.
pub async fn seed_defaults(pool: &PgPool, cfg: &Config) -> anyhow::Result<()> {
    let admin_exists: bool =
        sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM app_user WHERE username = $1)"#)
            .bind(&cfg.admin_username)
            .fetch_one(pool)
            .await?;

    if !admin_exists {
        let password_hash = hash_password(&cfg.admin_password)?;
        sqlx::query(
            r#"
            INSERT INTO app_user (username, full_name, password_hash, roles)
            VALUES ($1, 'Admin User', $2, $3)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(&cfg.admin_username)
        .bind(&password_hash)
        .bind(ROLE_ADMIN)
        .execute(pool)
        .await?;
        tracing::info!(username = %cfg.admin_username, "created admin user");
    }

    if cfg.seed_doctors {
        let doctors: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM doctor"#)
            .fetch_one(pool)
            .await?;
        if doctors == 0 {
            sqlx::query(
                r#"
                INSERT INTO doctor (name, specialization)
                VALUES ('Dr. Alice Smith', 'Cardiology'),
                       ('Dr. Bob Johnson', 'Dermatology')
                "#,
            )
            .execute(pool)
            .await?;
            tracing::info!("seeded doctor directory");
        }
    }

    Ok(())
}
