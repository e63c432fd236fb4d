use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateJobPost, JobPost};

/// Inserts the whole batch in one transaction. Nothing is committed if any row fails.
pub async fn insert_job_posts(
    pool: &PgPool,
    posts: &[CreateJobPost],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for post in posts {
        let result = sqlx::query(
            r#"
            INSERT INTO job_posts
                (id, job_name, job_type, price, expiry_date, description, deep_link, posted_at, ttl_hours, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#
        )
        .bind(Uuid::new_v4())
        .bind(&post.job_name)
        .bind(&post.job_type)
        .bind(&post.price)
        .bind(&post.expiry_date)
        .bind(&post.description)
        .bind(&post.deep_link)
        .bind(post.posted_at)
        .bind(post.ttl_hours)
        .bind(post.expires_at)
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM job_posts WHERE expires_at IS NOT NULL AND expires_at < NOW()"
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn list_active(pool: &PgPool, limit: i64) -> Result<Vec<JobPost>, sqlx::Error> {
    sqlx::query_as::<_, JobPost>(
        r#"
        SELECT id, job_name, job_type, price, expiry_date, description, deep_link,
               posted_at, ttl_hours, expires_at, created_at
        FROM job_posts
        WHERE expires_at IS NULL OR expires_at >= NOW()
        ORDER BY posted_at DESC NULLS LAST, created_at DESC
        LIMIT $1
        "#
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &PgPool, limit: i64) -> Result<Vec<JobPost>, sqlx::Error> {
    sqlx::query_as::<_, JobPost>(
        r#"
        SELECT id, job_name, job_type, price, expiry_date, description, deep_link,
               posted_at, ttl_hours, expires_at, created_at
        FROM job_posts
        ORDER BY posted_at DESC NULLS LAST, created_at DESC
        LIMIT $1
        "#
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    const SCHEMA: &str = include_str!("../../migrations/20240101000000_create_job_posts.sql");

    #[test]
    fn test_model_filled_columns_are_unbounded_text() {
        for column in ["job_name", "job_type", "price", "expiry_date", "description", "deep_link"] {
            let definition = SCHEMA
                .lines()
                .map(str::trim)
                .find(|line| line.starts_with(&format!("{} ", column)))
                .unwrap_or_else(|| panic!("column {} missing from schema", column));

            assert!(definition.contains(" TEXT"), "{} should be TEXT: {}", column, definition);
        }
    }
}
