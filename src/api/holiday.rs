use actix_web::{HttpRequest, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::{created, ok, ok_message};
use crate::audit::{self, AuditEntry};
use crate::auth::auth::AuthUser;
use crate::core::holiday_calendar;
use crate::error::HrmsError;
use crate::model::holiday::{Holiday, NewHoliday};

const HOLIDAY_COLUMNS: &str = "id, name, holiday_date, holiday_type, description, is_active";

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HolidayQuery {
    #[schema(example = 2026)]
    pub year: Option<i32>,
    #[schema(example = "PUBLIC")]
    pub holiday_type: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct WorkingDaysQuery {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 8)]
    pub month: u32,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct WorkingDayCheck {
    #[schema(example = "2026-08-24", value_type = String, format = "date")]
    pub date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct SeedDefaultsReq {
    #[schema(example = 2026)]
    pub year: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateHoliday {
    pub name: Option<String>,
    #[schema(example = "2026-12-24", value_type = String, format = "date", nullable = true)]
    pub holiday_date: Option<NaiveDate>,
    pub holiday_type: Option<String>,
    pub description: Option<String>,
}

/// List holidays, optionally filtered by year and type
#[utoipa::path(
    get,
    path = "/api/v1/policies/holidays",
    params(HolidayQuery),
    responses((status = 200, body = [Holiday])),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HolidayQuery>,
) -> actix_web::Result<impl Responder> {
    let mut sql = format!("SELECT {HOLIDAY_COLUMNS} FROM holidays WHERE is_active = 1");
    if query.year.is_some() {
        sql.push_str(" AND YEAR(holiday_date) = ?");
    }
    if query.holiday_type.is_some() {
        sql.push_str(" AND holiday_type = ?");
    }
    sql.push_str(" ORDER BY holiday_date");

    let mut q = sqlx::query_as::<_, Holiday>(&sql);
    if let Some(year) = query.year {
        q = q.bind(year);
    }
    if let Some(kind) = &query.holiday_type {
        q = q.bind(kind);
    }

    let holidays = q.fetch_all(pool.get_ref()).await.map_err(HrmsError::Database)?;
    Ok(ok(holidays))
}

/// Create one holiday
#[utoipa::path(
    post,
    path = "/api/v1/policies/holidays",
    request_body = NewHoliday,
    responses(
        (status = 201, description = "Holiday created"),
        (status = 409, description = "Duplicate (date, name)")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn create_holiday(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let result = sqlx::query(
        "INSERT INTO holidays (name, holiday_date, holiday_type, description) VALUES (?, ?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(payload.holiday_date)
    .bind(&payload.holiday_type)
    .bind(payload.description.as_deref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23000") => {
            HrmsError::Conflict("holiday already exists for that date and name".to_string())
        }
        _ => HrmsError::Database(e),
    })?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("holiday.create", auth.user_id, "holiday")
            .entity(result.last_insert_id())
            .new_values(json!({ "name": payload.name, "date": payload.holiday_date }))
            .from_request(&req),
    )
    .await;

    Ok(created("Holiday created", json!({ "id": result.last_insert_id() })))
}

/// Bulk insert; duplicates are silently skipped (idempotent seeding)
#[utoipa::path(
    post,
    path = "/api/v1/policies/holidays/bulk",
    request_body = [NewHoliday],
    responses((status = 200, description = "Rows inserted (duplicates skipped)")),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn bulk_create_holidays(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<Vec<NewHoliday>>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let inserted = holiday_calendar::create_bulk_holidays(pool.get_ref(), &payload).await?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("holiday.bulk_create", auth.user_id, "holiday")
            .new_values(json!({ "requested": payload.len(), "inserted": inserted }))
            .from_request(&req),
    )
    .await;

    Ok(ok(json!({ "requested": payload.len(), "inserted": inserted })))
}

/// Seed the fixed default-holiday template for a year
#[utoipa::path(
    post,
    path = "/api/v1/policies/holidays/defaults",
    request_body = SeedDefaultsReq,
    responses((status = 200, description = "Template seeded")),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn seed_default_holidays(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SeedDefaultsReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let defaults = holiday_calendar::default_holidays(payload.year);
    let inserted = holiday_calendar::create_bulk_holidays(pool.get_ref(), &defaults).await?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("holiday.seed_defaults", auth.user_id, "holiday")
            .new_values(json!({ "year": payload.year, "inserted": inserted }))
            .from_request(&req),
    )
    .await;

    Ok(ok(json!({ "year": payload.year, "inserted": inserted })))
}

/// Working days in a month (weekends and active holidays excluded)
#[utoipa::path(
    get,
    path = "/api/v1/policies/holidays/working-days",
    params(WorkingDaysQuery),
    responses((status = 200, description = "Count of working days")),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn working_days_in_month(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<WorkingDaysQuery>,
) -> actix_web::Result<impl Responder> {
    let days =
        holiday_calendar::working_days_in_month(pool.get_ref(), query.year, query.month).await?;
    Ok(ok(json!({
        "year": query.year,
        "month": query.month,
        "working_days": days,
    })))
}

/// Is a single date a working day?
#[utoipa::path(
    get,
    path = "/api/v1/policies/holidays/working-day",
    params(WorkingDayCheck),
    responses((status = 200, description = "Working-day flag for the date")),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn is_working_day(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<WorkingDayCheck>,
) -> actix_web::Result<impl Responder> {
    let working = holiday_calendar::is_working_day(pool.get_ref(), query.date).await?;
    Ok(ok(json!({ "date": query.date, "is_working_day": working })))
}

/// Update a holiday (fetch-merge-update)
#[utoipa::path(
    put,
    path = "/api/v1/policies/holidays/{holiday_id}",
    params(("holiday_id" = u64, Path, description = "Holiday ID")),
    request_body = UpdateHoliday,
    responses(
        (status = 200, description = "Holiday updated"),
        (status = 404),
        (status = 409, description = "Duplicate (date, name)")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn update_holiday(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let holiday_id = path.into_inner();
    let current = sqlx::query_as::<_, Holiday>(&format!(
        "SELECT {HOLIDAY_COLUMNS} FROM holidays WHERE id = ?"
    ))
    .bind(holiday_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(HrmsError::Database)?
    .ok_or(HrmsError::NotFound { entity: "holiday" })?;

    let name = body.name.clone().unwrap_or(current.name);
    let holiday_date = body.holiday_date.unwrap_or(current.holiday_date);
    let holiday_type = body.holiday_type.clone().unwrap_or(current.holiday_type);
    let description = body.description.clone().or(current.description);

    sqlx::query(
        "UPDATE holidays SET name = ?, holiday_date = ?, holiday_type = ?, description = ? WHERE id = ?",
    )
    .bind(&name)
    .bind(holiday_date)
    .bind(&holiday_type)
    .bind(description.as_deref())
    .bind(holiday_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23000") => {
            HrmsError::Conflict("holiday already exists for that date and name".to_string())
        }
        _ => HrmsError::Database(e),
    })?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("holiday.update", auth.user_id, "holiday")
            .entity(holiday_id)
            .new_values(json!({ "name": name, "date": holiday_date }))
            .from_request(&req),
    )
    .await;

    Ok(ok_message("Holiday updated"))
}

/// Soft-delete a holiday
#[utoipa::path(
    delete,
    path = "/api/v1/policies/holidays/{holiday_id}",
    params(("holiday_id" = u64, Path, description = "Holiday ID")),
    responses(
        (status = 200, description = "Holiday deactivated"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let holiday_id = path.into_inner();
    let result = sqlx::query("UPDATE holidays SET is_active = 0 WHERE id = ? AND is_active = 1")
        .bind(holiday_id)
        .execute(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    if result.rows_affected() == 0 {
        return Err(HrmsError::NotFound { entity: "holiday" }.into());
    }

    audit::record(
        pool.get_ref(),
        AuditEntry::new("holiday.delete", auth.user_id, "holiday")
            .entity(holiday_id)
            .from_request(&req),
    )
    .await;

    Ok(ok_message("Holiday deactivated"))
}
