//! Performance review state machine and scoring.

use chrono::NaiveDate;
use futures_util::TryStreamExt;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::error::{HrmsError, HrmsResult};
use crate::model::performance::{PerformanceReview, ReviewAction, ReviewStatus};

const REVIEW_COLUMNS: &str = "id, employee_id, reviewer_id, review_period_start, \
     review_period_end, goals_achievement, technical_skills, communication_skills, \
     leadership_skills, overall_rating, feedback, employee_comments, status, \
     submitted_at, reviewed_at, created_at";

const WEIGHT_GOALS: f64 = 0.4;
const WEIGHT_TECHNICAL: f64 = 0.3;
const WEIGHT_COMMUNICATION: f64 = 0.2;
const WEIGHT_LEADERSHIP: f64 = 0.1;

/// Weighted average of the four sub-ratings, rounded to 2 decimal places.
pub fn calculate_overall_score(
    goals: f64,
    technical: f64,
    communication: f64,
    leadership: f64,
) -> f64 {
    let weighted = goals * WEIGHT_GOALS
        + technical * WEIGHT_TECHNICAL
        + communication * WEIGHT_COMMUNICATION
        + leadership * WEIGHT_LEADERSHIP;
    (weighted * 100.0).round() / 100.0
}

pub async fn fetch_review(pool: &MySqlPool, id: u64) -> HrmsResult<PerformanceReview> {
    let sql = format!("SELECT {REVIEW_COLUMNS} FROM performance_reviews WHERE id = ?");
    sqlx::query_as::<_, PerformanceReview>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(HrmsError::NotFound { entity: "performance review" })
}

/// Applies one forward transition.
///
/// Missing review and illegal transition are distinct failures (404 vs 409).
/// The UPDATE still carries the expected pre-state as a guard; losing that
/// race to a concurrent writer surfaces as a Conflict rather than silently
/// restating the winner's work.
pub async fn transition_review(
    pool: &MySqlPool,
    id: u64,
    action: ReviewAction,
) -> HrmsResult<PerformanceReview> {
    let review = fetch_review(pool, id).await?;
    let current = ReviewStatus::parse(&review.status)?;
    let next = current.apply(action)?;

    let stamp = match action {
        ReviewAction::Submit => ", submitted_at = NOW()",
        ReviewAction::Review => ", reviewed_at = NOW()",
        ReviewAction::Approve => "",
    };
    let sql = format!(
        "UPDATE performance_reviews SET status = ?{stamp} WHERE id = ? AND status = ?"
    );

    let result = sqlx::query(&sql)
        .bind(next.to_string())
        .bind(id)
        .bind(current.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(HrmsError::Conflict(
            "review was modified concurrently; reload and retry".to_string(),
        ));
    }

    fetch_review(pool, id).await
}

/// Per-employee outcome of the annual fan-out.
#[derive(Debug, Serialize, ToSchema)]
pub struct CycleOutcome {
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub created: bool,
    #[schema(nullable = true)]
    pub error: Option<String>,
}

/// Creates one DRAFT review per active employee for the given year.
/// Best-effort: a failing insert is recorded in that employee's outcome and
/// the batch carries on.
pub async fn create_annual_review_cycle(
    pool: &MySqlPool,
    year: i32,
    reviewer_id: u64,
) -> HrmsResult<Vec<CycleOutcome>> {
    let period_start = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| HrmsError::Validation(format!("invalid year {year}")))?;
    let period_end = NaiveDate::from_ymd_opt(year, 12, 31)
        .ok_or_else(|| HrmsError::Validation(format!("invalid year {year}")))?;

    let mut employees =
        sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE status = 'active'")
            .fetch(pool);

    let mut outcomes = Vec::new();
    while let Some(employee_id) = employees.try_next().await? {
        let result = sqlx::query(
            r#"
            INSERT INTO performance_reviews
                (employee_id, reviewer_id, review_period_start, review_period_end, status)
            VALUES (?, ?, ?, ?, 'DRAFT')
            "#,
        )
        .bind(employee_id)
        .bind(reviewer_id)
        .bind(period_start)
        .bind(period_end)
        .execute(pool)
        .await;

        match result {
            Ok(_) => outcomes.push(CycleOutcome {
                employee_id,
                created: true,
                error: None,
            }),
            Err(e) => {
                let message = if is_duplicate(&e) {
                    format!("review already exists for {year}")
                } else {
                    tracing::warn!(error = %e, employee_id, year, "review cycle insert failed");
                    "insert failed".to_string()
                };
                outcomes.push(CycleOutcome {
                    employee_id,
                    created: false,
                    error: Some(message),
                });
            }
        }
    }

    Ok(outcomes)
}

fn is_duplicate(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23000"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_score_uses_the_documented_weights() {
        // 5*0.4 + 4*0.3 + 3*0.2 + 2*0.1 = 4.0
        assert_eq!(calculate_overall_score(5.0, 4.0, 3.0, 2.0), 4.0);
    }

    #[test]
    fn overall_score_rounds_to_two_decimals() {
        // 4.5*0.4 + 3.7*0.3 + 4.1*0.2 + 2.9*0.1 = 4.02
        assert_eq!(calculate_overall_score(4.5, 3.7, 4.1, 2.9), 4.02);
        // A third decimal gets rounded, not truncated.
        assert_eq!(calculate_overall_score(4.44, 4.44, 4.44, 4.44), 4.44);
        assert_eq!(calculate_overall_score(3.333, 3.333, 3.333, 3.333), 3.33);
    }

    #[test]
    fn perfect_and_minimum_scores() {
        assert_eq!(calculate_overall_score(5.0, 5.0, 5.0, 5.0), 5.0);
        assert_eq!(calculate_overall_score(1.0, 1.0, 1.0, 1.0), 1.0);
    }
}
