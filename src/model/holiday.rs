use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Holiday {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "New Year's Day")]
    pub name: String,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub holiday_date: NaiveDate,
    #[schema(example = "PUBLIC")]
    pub holiday_type: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    pub is_active: bool,
}

/// Insert payload, also used by the default-template seeder.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewHoliday {
    #[schema(example = "New Year's Day")]
    pub name: String,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub holiday_date: NaiveDate,
    #[schema(example = "PUBLIC")]
    pub holiday_type: String,
    pub description: Option<String>,
}
