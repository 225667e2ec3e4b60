use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Document metadata only; the file bytes live with an external store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Document {
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "Employment contract")]
    pub title: String,
    #[schema(example = "contract-2026.pdf")]
    pub file_name: String,
    #[schema(example = "contract")]
    pub category: String,
    pub uploaded_by: u64,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}
