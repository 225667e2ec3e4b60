use actix_web::{HttpRequest, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::{created, ok, ok_message};
use crate::audit::{self, AuditEntry};
use crate::auth::auth::AuthUser;
use crate::core::review_workflow::{self, CycleOutcome, calculate_overall_score};
use crate::error::HrmsError;
use crate::model::performance::{PerformanceReview, ReviewAction, ReviewStatus};
use crate::notify;

#[derive(Deserialize, ToSchema)]
pub struct CreateReview {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1001)]
    pub reviewer_id: u64,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub review_period_start: NaiveDate,
    #[schema(example = "2026-12-31", value_type = String, format = "date")]
    pub review_period_end: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateReview {
    #[schema(example = 4.5, nullable = true)]
    pub goals_achievement: Option<f64>,
    #[schema(example = 4.0, nullable = true)]
    pub technical_skills: Option<f64>,
    #[schema(example = 3.5, nullable = true)]
    pub communication_skills: Option<f64>,
    #[schema(example = 3.0, nullable = true)]
    pub leadership_skills: Option<f64>,
    pub feedback: Option<String>,
    pub employee_comments: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReviewFilter {
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = "DRAFT")]
    pub status: Option<String>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateCycleReq {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 1001)]
    pub reviewer_id: u64,
}

#[derive(Serialize, ToSchema)]
pub struct ReviewListResponse {
    pub data: Vec<PerformanceReview>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

const REVIEW_COLUMNS: &str = "id, employee_id, reviewer_id, review_period_start, \
     review_period_end, goals_achievement, technical_skills, communication_skills, \
     leadership_skills, overall_rating, feedback, employee_comments, status, \
     submitted_at, reviewed_at, created_at";

fn rating_in_range(value: Option<f64>) -> bool {
    value.is_none_or(|v| (1.0..=5.0).contains(&v))
}

async fn notify_employee(pool: &MySqlPool, employee_id: u64, title: &str, message: &str) {
    // Reviews address employees; notifications address users.
    let user_id: Option<u64> = sqlx::query_scalar("SELECT id FROM users WHERE employee_id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await
        .ok()
        .flatten();

    if let Some(user_id) = user_id {
        notify::push(pool, user_id, title, message, "PERFORMANCE").await;
    }
}

/// Create a DRAFT review
#[utoipa::path(
    post,
    path = "/api/v1/performance",
    request_body = CreateReview,
    responses(
        (status = 201, description = "Review created"),
        (status = 409, description = "Review already exists for this period")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn create_review(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateReview>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if payload.review_period_end < payload.review_period_start {
        return Err(HrmsError::Validation(
            "review period end cannot precede its start".to_string(),
        )
        .into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO performance_reviews
            (employee_id, reviewer_id, review_period_start, review_period_end, status)
        VALUES (?, ?, ?, ?, 'DRAFT')
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.reviewer_id)
    .bind(payload.review_period_start)
    .bind(payload.review_period_end)
    .execute(pool.get_ref())
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23000") => {
            HrmsError::Conflict("a review already exists for this employee and period".to_string())
        }
        _ => HrmsError::Database(e),
    })?;

    let review_id = result.last_insert_id();

    audit::record(
        pool.get_ref(),
        AuditEntry::new("review.create", auth.user_id, "performance_review")
            .entity(review_id)
            .new_values(json!({
                "employee_id": payload.employee_id,
                "period_start": payload.review_period_start,
            }))
            .from_request(&req),
    )
    .await;

    notify_employee(
        pool.get_ref(),
        payload.employee_id,
        "Performance review created",
        "A new performance review has been opened for you.",
    )
    .await;

    Ok(created("Review created", json!({ "id": review_id })))
}

/// Paginated review list
#[utoipa::path(
    get,
    path = "/api/v1/performance",
    params(ReviewFilter),
    responses((status = 200, body = ReviewListResponse)),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn list_reviews(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReviewFilter>,
) -> actix_web::Result<impl Responder> {
    // Employees see their own reviews; HR/Admin see everything.
    if let Some(employee_id) = query.employee_id {
        auth.require_self_or_hr(employee_id)?;
    } else {
        auth.require_hr_or_admin()?;
    }

    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(employee_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(employee_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    let count_sql = format!("SELECT COUNT(*) FROM performance_reviews{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }
    let total = count_q
        .fetch_one(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    let data_sql = format!(
        "SELECT {REVIEW_COLUMNS} FROM performance_reviews{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        where_sql
    );
    let mut data_q = sqlx::query_as::<_, PerformanceReview>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let reviews = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    Ok(ok(ReviewListResponse {
        data: reviews,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/performance/{review_id}",
    params(("review_id" = u64, Path, description = "Review ID")),
    responses(
        (status = 200, body = PerformanceReview),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn get_review(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let review = review_workflow::fetch_review(pool.get_ref(), path.into_inner()).await?;
    auth.require_self_or_hr(review.employee_id)?;
    Ok(ok(review))
}

/// Update ratings/feedback; the overall score is recomputed whenever any
/// sub-rating changes. Approved reviews are frozen.
#[utoipa::path(
    put,
    path = "/api/v1/performance/{review_id}",
    params(("review_id" = u64, Path, description = "Review ID")),
    request_body = UpdateReview,
    responses(
        (status = 200, body = PerformanceReview),
        (status = 404),
        (status = 409, description = "Approved reviews cannot be edited")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn update_review(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateReview>,
) -> actix_web::Result<impl Responder> {
    let review_id = path.into_inner();
    let current = review_workflow::fetch_review(pool.get_ref(), review_id).await?;
    auth.require_self_or_hr(current.employee_id)?;

    // Employees touch only their own comments; ratings and feedback are
    // the reviewer's side of the form.
    let is_reviewer_side = auth.require_hr_or_admin().is_ok();
    if !is_reviewer_side
        && (body.goals_achievement.is_some()
            || body.technical_skills.is_some()
            || body.communication_skills.is_some()
            || body.leadership_skills.is_some()
            || body.feedback.is_some())
    {
        return Err(HrmsError::Forbidden(
            "employees may only update their own comments".to_string(),
        )
        .into());
    }

    if ReviewStatus::parse(&current.status)? == ReviewStatus::Approved {
        return Err(HrmsError::Conflict("approved reviews cannot be edited".to_string()).into());
    }

    for rating in [
        body.goals_achievement,
        body.technical_skills,
        body.communication_skills,
        body.leadership_skills,
    ] {
        if !rating_in_range(rating) {
            return Err(
                HrmsError::Validation("ratings must be between 1.0 and 5.0".to_string()).into(),
            );
        }
    }

    let goals = body.goals_achievement.or(current.goals_achievement);
    let technical = body.technical_skills.or(current.technical_skills);
    let communication = body.communication_skills.or(current.communication_skills);
    let leadership = body.leadership_skills.or(current.leadership_skills);
    let feedback = body.feedback.clone().or(current.feedback.clone());
    let employee_comments = body
        .employee_comments
        .clone()
        .or(current.employee_comments.clone());

    // Overall only exists once all four sub-ratings do.
    let overall = match (goals, technical, communication, leadership) {
        (Some(g), Some(t), Some(c), Some(l)) => Some(calculate_overall_score(g, t, c, l)),
        _ => None,
    };

    sqlx::query(
        r#"
        UPDATE performance_reviews
        SET goals_achievement = ?, technical_skills = ?, communication_skills = ?,
            leadership_skills = ?, overall_rating = ?, feedback = ?, employee_comments = ?
        WHERE id = ?
        "#,
    )
    .bind(goals)
    .bind(technical)
    .bind(communication)
    .bind(leadership)
    .bind(overall)
    .bind(feedback.as_deref())
    .bind(employee_comments.as_deref())
    .bind(review_id)
    .execute(pool.get_ref())
    .await
    .map_err(HrmsError::Database)?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("review.update", auth.user_id, "performance_review")
            .entity(review_id)
            .old(json!({ "overall_rating": current.overall_rating }))
            .new_values(json!({ "overall_rating": overall }))
            .from_request(&req),
    )
    .await;

    let updated = review_workflow::fetch_review(pool.get_ref(), review_id).await?;
    Ok(ok(updated))
}

/// Delete a review (any status, irreversible)
#[utoipa::path(
    delete,
    path = "/api/v1/performance/{review_id}",
    params(("review_id" = u64, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn delete_review(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let review_id = path.into_inner();
    let result = sqlx::query("DELETE FROM performance_reviews WHERE id = ?")
        .bind(review_id)
        .execute(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    if result.rows_affected() == 0 {
        return Err(HrmsError::NotFound { entity: "performance review" }.into());
    }

    audit::record(
        pool.get_ref(),
        AuditEntry::new("review.delete", auth.user_id, "performance_review")
            .entity(review_id)
            .from_request(&req),
    )
    .await;

    Ok(ok_message("Review deleted"))
}

async fn transition(
    auth: &AuthUser,
    req: &HttpRequest,
    pool: &MySqlPool,
    review_id: u64,
    action: ReviewAction,
    audit_action: &'static str,
) -> actix_web::Result<PerformanceReview> {
    let review = review_workflow::transition_review(pool, review_id, action).await?;

    audit::record(
        pool,
        AuditEntry::new(audit_action, auth.user_id, "performance_review")
            .entity(review_id)
            .new_values(json!({ "status": review.status }))
            .from_request(req),
    )
    .await;

    Ok(review)
}

/// DRAFT -> SUBMITTED
#[utoipa::path(
    put,
    path = "/api/v1/performance/{review_id}/submit",
    params(("review_id" = u64, Path, description = "Review ID")),
    responses(
        (status = 200, body = PerformanceReview),
        (status = 404),
        (status = 409, description = "Not in DRAFT")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn submit_review(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let review = transition(
        &auth,
        &req,
        pool.get_ref(),
        path.into_inner(),
        ReviewAction::Submit,
        "review.submit",
    )
    .await?;

    notify_employee(
        pool.get_ref(),
        review.employee_id,
        "Performance review submitted",
        "Your performance review has been submitted for evaluation.",
    )
    .await;

    Ok(ok(review))
}

/// SUBMITTED -> REVIEWED
#[utoipa::path(
    put,
    path = "/api/v1/performance/{review_id}/review",
    params(("review_id" = u64, Path, description = "Review ID")),
    responses(
        (status = 200, body = PerformanceReview),
        (status = 404),
        (status = 409, description = "Not in SUBMITTED")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn mark_reviewed(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let review = transition(
        &auth,
        &req,
        pool.get_ref(),
        path.into_inner(),
        ReviewAction::Review,
        "review.reviewed",
    )
    .await?;

    Ok(ok(review))
}

/// REVIEWED -> APPROVED
#[utoipa::path(
    put,
    path = "/api/v1/performance/{review_id}/approve",
    params(("review_id" = u64, Path, description = "Review ID")),
    responses(
        (status = 200, body = PerformanceReview),
        (status = 404),
        (status = 409, description = "Not in REVIEWED")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn approve_review(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let review = transition(
        &auth,
        &req,
        pool.get_ref(),
        path.into_inner(),
        ReviewAction::Approve,
        "review.approve",
    )
    .await?;

    notify_employee(
        pool.get_ref(),
        review.employee_id,
        "Performance review approved",
        "Your performance review has been approved.",
    )
    .await;

    Ok(ok(review))
}

/// Fan out one DRAFT review per active employee; per-employee outcomes
#[utoipa::path(
    post,
    path = "/api/v1/performance/cycle",
    request_body = CreateCycleReq,
    responses((status = 200, body = [CycleOutcome])),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn create_cycle(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCycleReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let outcomes = review_workflow::create_annual_review_cycle(
        pool.get_ref(),
        payload.year,
        payload.reviewer_id,
    )
    .await?;

    let created_count = outcomes.iter().filter(|o| o.created).count();
    audit::record(
        pool.get_ref(),
        AuditEntry::new("review.cycle", auth.user_id, "performance_review")
            .new_values(json!({
                "year": payload.year,
                "created": created_count,
                "skipped": outcomes.len() - created_count,
            }))
            .from_request(&req),
    )
    .await;

    Ok(ok(outcomes))
}
