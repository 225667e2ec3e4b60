use anyhow::Result;
use sqlx::MySqlPool;
use tracing::warn;

/// Best-effort notification sink. Delivery is someone else's problem;
/// this only enqueues the row.
pub async fn push(pool: &MySqlPool, user_id: u64, title: &str, message: &str, kind: &str) {
    if let Err(e) = try_push(pool, user_id, title, message, kind).await {
        warn!(error = %e, user_id, title, "failed to enqueue notification");
    }
}

async fn try_push(
    pool: &MySqlPool,
    user_id: u64,
    title: &str,
    message: &str,
    kind: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (user_id, title, message, notification_type)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(title)
    .bind(message)
    .bind(kind)
    .execute(pool)
    .await?;

    Ok(())
}
