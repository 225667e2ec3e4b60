use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Per-leave-type rule set. One active row per `leave_type`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeavePolicy {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = 20.0)]
    pub annual_limit: f64,
    pub carry_forward_allowed: bool,
    #[schema(example = 5.0)]
    pub carry_forward_limit: f64,
    #[schema(example = 3)]
    pub min_notice_days: i32,
    #[schema(example = 10.0, nullable = true)]
    pub max_consecutive_days: Option<f64>,
    pub requires_approval: bool,
    #[schema(example = 1)]
    pub approval_level: u8,
    pub is_active: bool,
}

/// Ledger row, unique per (employee, leave type, year).
/// `remaining_days` is maintained as allocated + carried - used.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EmployeeLeaveBalance {
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 20.0)]
    pub allocated_days: f64,
    #[schema(example = 3.5)]
    pub carried_forward_days: f64,
    #[schema(example = 2.0)]
    pub used_days: f64,
    #[schema(example = 21.5)]
    pub remaining_days: f64,
}
