use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// How `setting_value` is encoded on disk and decoded on read.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    ToSchema,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SettingType {
    String,
    Number,
    Boolean,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SystemSetting {
    pub id: u64,
    #[schema(example = "leave.auto_approve_threshold")]
    pub setting_key: String,
    #[schema(example = "2")]
    pub setting_value: String,
    #[schema(example = "NUMBER")]
    pub setting_type: String,
    #[schema(example = "leave")]
    pub category: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    pub is_editable: bool,
    #[schema(nullable = true)]
    pub updated_by: Option<u64>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub updated_at: Option<DateTime<Utc>>,
}
