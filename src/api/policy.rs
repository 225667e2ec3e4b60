use actix_web::{HttpRequest, Responder, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::{created, ok, ok_message};
use crate::audit::{self, AuditEntry};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::core::leave_policy;
use crate::error::HrmsError;
use crate::model::leave::LeavePolicy;

#[derive(Deserialize, ToSchema)]
pub struct CreatePolicy {
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = 20.0)]
    pub annual_limit: f64,
    #[serde(default)]
    pub carry_forward_allowed: bool,
    #[serde(default)]
    #[schema(example = 5.0)]
    pub carry_forward_limit: f64,
    #[serde(default)]
    #[schema(example = 3)]
    pub min_notice_days: i32,
    #[schema(example = 10.0, nullable = true)]
    pub max_consecutive_days: Option<f64>,
    #[serde(default = "default_true")]
    pub requires_approval: bool,
    #[serde(default = "default_level")]
    pub approval_level: u8,
}

fn default_true() -> bool {
    true
}

fn default_level() -> u8 {
    1
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePolicy {
    pub annual_limit: Option<f64>,
    pub carry_forward_allowed: Option<bool>,
    pub carry_forward_limit: Option<f64>,
    pub min_notice_days: Option<i32>,
    pub max_consecutive_days: Option<f64>,
    pub requires_approval: Option<bool>,
    pub approval_level: Option<u8>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PolicyQuery {
    /// Include soft-deleted policies (admin view)
    pub include_inactive: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct ValidateLeaveReq {
    /// Defaults to the caller's own employee record
    #[schema(example = 1000, nullable = true)]
    pub employee_id: Option<u64>,
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = "2026-09-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-09-05", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = 5.0)]
    pub requested_days: f64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    #[schema(example = 1000, nullable = true)]
    pub employee_id: Option<u64>,
    #[schema(example = "annual")]
    pub leave_type: String,
    /// Defaults to the current year
    #[schema(example = 2026, nullable = true)]
    pub year: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct AdjustBalanceReq {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = 2026)]
    pub year: i32,
    /// Positive consumes days, negative credits a cancellation
    #[schema(example = 2.0)]
    pub delta: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct InitYearReq {
    #[schema(example = 2027)]
    pub year: i32,
}

const POLICY_COLUMNS: &str = "id, leave_type, annual_limit, carry_forward_allowed, \
     carry_forward_limit, min_notice_days, max_consecutive_days, requires_approval, \
     approval_level, is_active";

/// Create a leave policy
#[utoipa::path(
    post,
    path = "/api/v1/policies",
    request_body = CreatePolicy,
    responses(
        (status = 201, description = "Policy created"),
        (status = 409, description = "Policy for this leave type already exists"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Policies"
)]
pub async fn create_policy(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePolicy>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if payload.annual_limit < 0.0 || payload.carry_forward_limit < 0.0 {
        return Err(HrmsError::Validation("day limits cannot be negative".to_string()).into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO leave_policies
            (leave_type, annual_limit, carry_forward_allowed, carry_forward_limit,
             min_notice_days, max_consecutive_days, requires_approval, approval_level)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.leave_type)
    .bind(payload.annual_limit)
    .bind(payload.carry_forward_allowed)
    .bind(payload.carry_forward_limit)
    .bind(payload.min_notice_days)
    .bind(payload.max_consecutive_days)
    .bind(payload.requires_approval)
    .bind(payload.approval_level)
    .execute(pool.get_ref())
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23000") => {
            HrmsError::Conflict(format!("policy for '{}' already exists", payload.leave_type))
        }
        _ => HrmsError::Database(e),
    })?;

    let policy_id = result.last_insert_id();

    audit::record(
        pool.get_ref(),
        AuditEntry::new("policy.create", auth.user_id, "leave_policy")
            .entity(policy_id)
            .new_values(json!({
                "leave_type": payload.leave_type,
                "annual_limit": payload.annual_limit,
            }))
            .from_request(&req),
    )
    .await;

    Ok(created("Leave policy created", json!({ "id": policy_id })))
}

/// List leave policies
#[utoipa::path(
    get,
    path = "/api/v1/policies",
    params(PolicyQuery),
    responses((status = 200, body = [LeavePolicy])),
    security(("bearer_auth" = [])),
    tag = "Policies"
)]
pub async fn list_policies(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PolicyQuery>,
) -> actix_web::Result<impl Responder> {
    let sql = if query.include_inactive.unwrap_or(false) {
        format!("SELECT {POLICY_COLUMNS} FROM leave_policies ORDER BY leave_type")
    } else {
        format!("SELECT {POLICY_COLUMNS} FROM leave_policies WHERE is_active = 1 ORDER BY leave_type")
    };

    let policies = sqlx::query_as::<_, LeavePolicy>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    Ok(ok(policies))
}

#[utoipa::path(
    get,
    path = "/api/v1/policies/{policy_id}",
    params(("policy_id" = u64, Path, description = "Policy ID")),
    responses(
        (status = 200, body = LeavePolicy),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Policies"
)]
pub async fn get_policy(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let policy_id = path.into_inner();
    let sql = format!("SELECT {POLICY_COLUMNS} FROM leave_policies WHERE id = ?");

    let policy = sqlx::query_as::<_, LeavePolicy>(&sql)
        .bind(policy_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?
        .ok_or(HrmsError::NotFound { entity: "leave policy" })?;

    Ok(ok(policy))
}

/// Update a leave policy (fetch-merge-update)
#[utoipa::path(
    put,
    path = "/api/v1/policies/{policy_id}",
    params(("policy_id" = u64, Path, description = "Policy ID")),
    request_body = UpdatePolicy,
    responses(
        (status = 200, description = "Policy updated"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Policies"
)]
pub async fn update_policy(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdatePolicy>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let policy_id = path.into_inner();
    let sql = format!("SELECT {POLICY_COLUMNS} FROM leave_policies WHERE id = ?");
    let current = sqlx::query_as::<_, LeavePolicy>(&sql)
        .bind(policy_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?
        .ok_or(HrmsError::NotFound { entity: "leave policy" })?;

    let annual_limit = body.annual_limit.unwrap_or(current.annual_limit);
    let carry_forward_allowed = body
        .carry_forward_allowed
        .unwrap_or(current.carry_forward_allowed);
    let carry_forward_limit = body.carry_forward_limit.unwrap_or(current.carry_forward_limit);
    let min_notice_days = body.min_notice_days.unwrap_or(current.min_notice_days);
    let max_consecutive_days = body.max_consecutive_days.or(current.max_consecutive_days);
    let requires_approval = body.requires_approval.unwrap_or(current.requires_approval);
    let approval_level = body.approval_level.unwrap_or(current.approval_level);

    sqlx::query(
        r#"
        UPDATE leave_policies
        SET annual_limit = ?, carry_forward_allowed = ?, carry_forward_limit = ?,
            min_notice_days = ?, max_consecutive_days = ?, requires_approval = ?,
            approval_level = ?
        WHERE id = ?
        "#,
    )
    .bind(annual_limit)
    .bind(carry_forward_allowed)
    .bind(carry_forward_limit)
    .bind(min_notice_days)
    .bind(max_consecutive_days)
    .bind(requires_approval)
    .bind(approval_level)
    .bind(policy_id)
    .execute(pool.get_ref())
    .await
    .map_err(HrmsError::Database)?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("policy.update", auth.user_id, "leave_policy")
            .entity(policy_id)
            .old(json!({ "annual_limit": current.annual_limit }))
            .new_values(json!({ "annual_limit": annual_limit }))
            .from_request(&req),
    )
    .await;

    Ok(ok_message("Leave policy updated"))
}

/// Soft-delete a policy
#[utoipa::path(
    delete,
    path = "/api/v1/policies/{policy_id}",
    params(("policy_id" = u64, Path, description = "Policy ID")),
    responses(
        (status = 200, description = "Policy deactivated"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Policies"
)]
pub async fn delete_policy(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let policy_id = path.into_inner();
    let result = sqlx::query("UPDATE leave_policies SET is_active = 0 WHERE id = ? AND is_active = 1")
        .bind(policy_id)
        .execute(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    if result.rows_affected() == 0 {
        return Err(HrmsError::NotFound { entity: "leave policy" }.into());
    }

    audit::record(
        pool.get_ref(),
        AuditEntry::new("policy.delete", auth.user_id, "leave_policy")
            .entity(policy_id)
            .from_request(&req),
    )
    .await;

    Ok(ok_message("Leave policy deactivated"))
}

/// Validate a prospective leave request against policy and balance.
/// All violations are reported together in `errors`.
#[utoipa::path(
    post,
    path = "/api/v1/policies/validate",
    request_body = ValidateLeaveReq,
    responses(
        (status = 200, description = "Validation result", body = Object, example = json!({
            "success": true,
            "data": { "is_valid": false, "errors": ["Leave requires at least 3 days notice (got 1)"] }
        })),
        (status = 404, description = "No policy for leave type")
    ),
    security(("bearer_auth" = [])),
    tag = "Policies"
)]
pub async fn validate_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<ValidateLeaveReq>,
) -> actix_web::Result<impl Responder> {
    let employee_id = match payload.employee_id {
        Some(id) => {
            auth.require_self_or_hr(id)?;
            id
        }
        None => auth
            .employee_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?,
    };

    let validation = leave_policy::validate_leave_request(
        pool.get_ref(),
        config.carry_forward_lookback_years,
        employee_id,
        &payload.leave_type,
        payload.start_date,
        payload.end_date,
        payload.requested_days,
    )
    .await?;

    Ok(ok(validation))
}

/// Current (lazily initialized) leave balance
#[utoipa::path(
    get,
    path = "/api/v1/policies/balances",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Ledger row for the requested year"),
        (status = 404, description = "No policy for leave type")
    ),
    security(("bearer_auth" = [])),
    tag = "Policies"
)]
pub async fn get_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = match query.employee_id {
        Some(id) => {
            auth.require_self_or_hr(id)?;
            id
        }
        None => auth
            .employee_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?,
    };

    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let balance = leave_policy::get_or_init_balance(
        pool.get_ref(),
        config.carry_forward_lookback_years,
        employee_id,
        &query.leave_type,
        year,
    )
    .await?;

    Ok(ok(balance))
}

/// Adjust used days (positive = consume, negative = cancellation credit)
#[utoipa::path(
    post,
    path = "/api/v1/policies/balances/adjust",
    request_body = AdjustBalanceReq,
    responses(
        (status = 200, description = "Updated ledger row"),
        (status = 400, description = "Adjustment exceeds remaining balance")
    ),
    security(("bearer_auth" = [])),
    tag = "Policies"
)]
pub async fn adjust_balance(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<AdjustBalanceReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let balance = leave_policy::apply_used_days(
        pool.get_ref(),
        config.carry_forward_lookback_years,
        payload.employee_id,
        &payload.leave_type,
        payload.year,
        payload.delta,
    )
    .await?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("balance.adjust", auth.user_id, "leave_balance")
            .entity(balance.id)
            .new_values(json!({
                "delta": payload.delta,
                "remaining_days": balance.remaining_days,
            }))
            .from_request(&req),
    )
    .await;

    Ok(ok(balance))
}

/// Seed balances for a year across all active employees and policies
#[utoipa::path(
    post,
    path = "/api/v1/policies/balances/initialize",
    request_body = InitYearReq,
    responses((status = 200, description = "Rows initialized")),
    security(("bearer_auth" = [])),
    tag = "Policies"
)]
pub async fn initialize_year(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<InitYearReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let initialized = leave_policy::initialize_year_for_all(
        pool.get_ref(),
        config.carry_forward_lookback_years,
        payload.year,
    )
    .await?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("balance.initialize_year", auth.user_id, "leave_balance")
            .new_values(json!({ "year": payload.year, "initialized": initialized }))
            .from_request(&req),
    )
    .await;

    Ok(ok(json!({ "year": payload.year, "initialized": initialized })))
}
