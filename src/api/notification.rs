use actix_web::{Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::{created, ok, ok_message};
use crate::auth::auth::AuthUser;
use crate::error::HrmsError;
use crate::model::notification::Notification;
use crate::notify;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, notification_type, is_read, created_at";

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct NotificationQuery {
    /// Only unread notifications when true
    pub unread_only: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateNotification {
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "Policy update")]
    pub title: String,
    pub message: String,
    #[schema(example = "INFO")]
    pub notification_type: Option<String>,
}

/// The caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(NotificationQuery),
    responses((status = 200, body = [Notification])),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn list_notifications(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<NotificationQuery>,
) -> actix_web::Result<impl Responder> {
    let mut sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = ?");
    if query.unread_only.unwrap_or(false) {
        sql.push_str(" AND is_read = 0");
    }
    sql.push_str(" ORDER BY created_at DESC LIMIT 100");

    let notifications = sqlx::query_as::<_, Notification>(&sql)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    Ok(ok(notifications))
}

/// Unread count for the caller
#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    responses((status = 200, description = "Unread notification count")),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn unread_count(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
    )
    .bind(auth.user_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(HrmsError::Database)?;

    Ok(ok(json!({ "unread": count })))
}

/// Mark one of the caller's notifications read
#[utoipa::path(
    put,
    path = "/api/v1/notifications/{notification_id}/read",
    params(("notification_id" = u64, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked read"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_read(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
        .bind(path.into_inner())
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    if result.rows_affected() == 0 {
        return Err(HrmsError::NotFound { entity: "notification" }.into());
    }

    Ok(ok_message("Notification marked read"))
}

/// Mark all of the caller's notifications read
#[utoipa::path(
    put,
    path = "/api/v1/notifications/read-all",
    responses((status = 200, description = "All notifications marked read")),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_all_read(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    Ok(ok(json!({ "marked_read": result.rows_affected() })))
}

/// Send a notification to any user (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    request_body = CreateNotification,
    responses((status = 201, description = "Notification sent")),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn create_notification(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateNotification>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if payload.title.trim().is_empty() {
        return Err(HrmsError::Validation("title must not be empty".to_string()).into());
    }

    notify::push(
        pool.get_ref(),
        payload.user_id,
        payload.title.trim(),
        &payload.message,
        payload.notification_type.as_deref().unwrap_or("INFO"),
    )
    .await;

    Ok(created("Notification sent", json!({ "user_id": payload.user_id })))
}
