use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "Review submitted")]
    pub title: String,
    pub message: String,
    #[schema(example = "INFO")]
    pub notification_type: String,
    pub is_read: bool,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}
