use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    pub is_active: bool,
}

/// One time-bounded employee -> manager edge. At most one active edge
/// per employee at any instant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ManagerEdge {
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1001)]
    pub manager_id: u64,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub effective_from: NaiveDate,
    #[schema(example = "2026-06-30", value_type = String, format = "date", nullable = true)]
    pub effective_to: Option<NaiveDate>,
    pub is_active: bool,
}

/// A single rung of a hierarchy walk. Level 1 is the closest manager
/// (or the direct reports) of the starting employee.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HierarchyNode {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = 1)]
    pub level: u32,
}
