//! Leave policy validation and the per-employee-per-year balance ledger.
//!
//! Balances are created lazily on first access. Carry-forward chains year
//! to year: initializing a year rolls forward from the newest existing
//! balance inside the configured lookback window, so a long-absent
//! employee still gets a correctly chained ledger.

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::error::{HrmsError, HrmsResult};
use crate::model::leave::{EmployeeLeaveBalance, LeavePolicy};

const BALANCE_COLUMNS: &str = "id, employee_id, leave_type, year, allocated_days, \
     carried_forward_days, used_days, remaining_days";

const POLICY_COLUMNS: &str = "id, leave_type, annual_limit, carry_forward_allowed, \
     carry_forward_limit, min_notice_days, max_consecutive_days, requires_approval, \
     approval_level, is_active";

/// Outcome of [`validate_leave_request`]. All checks run; `errors` holds
/// every violation, not just the first.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveValidation {
    pub is_valid: bool,
    #[schema(example = json!(["Leave requires at least 3 days notice (got 1)"]))]
    pub errors: Vec<String>,
    pub policy: LeavePolicy,
    pub balance: EmployeeLeaveBalance,
}

/// Pure rule evaluation over an already-loaded policy and balance.
pub fn evaluate_request(
    policy: &LeavePolicy,
    balance: &EmployeeLeaveBalance,
    today: NaiveDate,
    start_date: NaiveDate,
    requested_days: f64,
) -> Vec<String> {
    let mut errors = Vec::new();

    let notice = (start_date - today).num_days();
    if notice < policy.min_notice_days as i64 {
        errors.push(format!(
            "Leave requires at least {} days notice (got {})",
            policy.min_notice_days, notice
        ));
    }

    if let Some(cap) = policy.max_consecutive_days {
        if requested_days > cap {
            errors.push(format!(
                "Requested {} days exceeds the maximum of {} consecutive days",
                requested_days, cap
            ));
        }
    }

    if requested_days > balance.remaining_days {
        errors.push(format!(
            "Insufficient balance: {} days requested, {} remaining",
            requested_days, balance.remaining_days
        ));
    }

    errors
}

/// Days credited into a new year from the prior year's remainder.
pub fn carry_forward_days(policy: &LeavePolicy, prev_remaining: f64) -> f64 {
    if !policy.carry_forward_allowed {
        return 0.0;
    }
    prev_remaining.clamp(0.0, policy.carry_forward_limit)
}

pub async fn get_policy(pool: &MySqlPool, leave_type: &str) -> HrmsResult<LeavePolicy> {
    let sql = format!("SELECT {POLICY_COLUMNS} FROM leave_policies WHERE leave_type = ? AND is_active = 1");
    sqlx::query_as::<_, LeavePolicy>(&sql)
        .bind(leave_type)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| HrmsError::PolicyNotFound(leave_type.to_string()))
}

/// Runs every policy check for a prospective leave request and reports all
/// violations together. The current-year balance is lazily initialized.
pub async fn validate_leave_request(
    pool: &MySqlPool,
    lookback_years: i32,
    employee_id: u64,
    leave_type: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    requested_days: f64,
) -> HrmsResult<LeaveValidation> {
    if end_date < start_date {
        return Err(HrmsError::Validation(
            "start_date cannot be after end_date".to_string(),
        ));
    }
    if requested_days <= 0.0 {
        return Err(HrmsError::Validation(
            "requested_days must be positive".to_string(),
        ));
    }

    let policy = get_policy(pool, leave_type).await?;
    let today = Utc::now().date_naive();
    let balance =
        get_or_init_balance(pool, lookback_years, employee_id, leave_type, start_date.year()).await?;

    let errors = evaluate_request(&policy, &balance, today, start_date, requested_days);

    Ok(LeaveValidation {
        is_valid: errors.is_empty(),
        errors,
        policy,
        balance,
    })
}

async fn fetch_balance(
    pool: &MySqlPool,
    employee_id: u64,
    leave_type: &str,
    year: i32,
) -> HrmsResult<Option<EmployeeLeaveBalance>> {
    let sql = format!(
        "SELECT {BALANCE_COLUMNS} FROM leave_balances \
         WHERE employee_id = ? AND leave_type = ? AND year = ?"
    );
    Ok(sqlx::query_as::<_, EmployeeLeaveBalance>(&sql)
        .bind(employee_id)
        .bind(leave_type)
        .bind(year)
        .fetch_optional(pool)
        .await?)
}

/// Returns the ledger row for (employee, leave type, year), initializing it
/// (and any missing prior years inside the lookback window) on first access.
pub async fn get_or_init_balance(
    pool: &MySqlPool,
    lookback_years: i32,
    employee_id: u64,
    leave_type: &str,
    year: i32,
) -> HrmsResult<EmployeeLeaveBalance> {
    if let Some(balance) = fetch_balance(pool, employee_id, leave_type, year).await? {
        return Ok(balance);
    }
    let policy = get_policy(pool, leave_type).await?;
    initialize_balance(pool, lookback_years, &policy, employee_id, year).await
}

/// Creates or refreshes the ledger row for `year`.
///
/// When carry-forward applies, the chain is rolled forward iteratively from
/// the newest existing balance inside the lookback window; every missing
/// intermediate year gets its own row so the next rollover starts warm.
/// Re-initializing an existing year overwrites allocated/carried-forward
/// but preserves `used_days` (upsert).
pub async fn initialize_balance(
    pool: &MySqlPool,
    lookback_years: i32,
    policy: &LeavePolicy,
    employee_id: u64,
    year: i32,
) -> HrmsResult<EmployeeLeaveBalance> {
    let mut start_year = year;
    let mut carried = 0.0;

    if policy.carry_forward_allowed && lookback_years > 0 {
        let floor = year - lookback_years;
        let mut prior: Option<(i32, f64)> = None;
        let mut y = year - 1;
        while y >= floor {
            if let Some(b) = fetch_balance(pool, employee_id, &policy.leave_type, y).await? {
                prior = Some((y, b.remaining_days));
                break;
            }
            y -= 1;
        }
        match prior {
            Some((found_year, remaining)) => {
                start_year = found_year + 1;
                carried = carry_forward_days(policy, remaining);
            }
            // Nothing inside the window: the whole window starts cold.
            None => start_year = floor.max(year),
        }
    }

    let mut latest = None;
    for y in start_year..=year {
        upsert_balance(pool, employee_id, &policy.leave_type, y, policy.annual_limit, carried)
            .await?;
        // Re-read so a preserved used_days figure feeds the next year.
        let row = fetch_balance(pool, employee_id, &policy.leave_type, y)
            .await?
            .ok_or(HrmsError::NotFound { entity: "leave balance" })?;
        carried = carry_forward_days(policy, row.remaining_days);
        latest = Some(row);
    }

    latest.ok_or(HrmsError::NotFound { entity: "leave balance" })
}

async fn upsert_balance(
    pool: &MySqlPool,
    employee_id: u64,
    leave_type: &str,
    year: i32,
    allocated: f64,
    carried: f64,
) -> HrmsResult<()> {
    sqlx::query(
        r#"
        INSERT INTO leave_balances
            (employee_id, leave_type, year, allocated_days, carried_forward_days, used_days, remaining_days)
        VALUES (?, ?, ?, ?, ?, 0, ? + ?)
        ON DUPLICATE KEY UPDATE
            allocated_days = VALUES(allocated_days),
            carried_forward_days = VALUES(carried_forward_days),
            remaining_days = VALUES(allocated_days) + VALUES(carried_forward_days) - used_days
        "#,
    )
    .bind(employee_id)
    .bind(leave_type)
    .bind(year)
    .bind(allocated)
    .bind(carried)
    .bind(allocated)
    .bind(carried)
    .execute(pool)
    .await?;

    Ok(())
}

/// Additive used-days adjustment; a negative delta credits a cancellation.
/// Rejects any delta that would push `remaining_days` below zero.
pub async fn apply_used_days(
    pool: &MySqlPool,
    lookback_years: i32,
    employee_id: u64,
    leave_type: &str,
    year: i32,
    delta: f64,
) -> HrmsResult<EmployeeLeaveBalance> {
    let balance = get_or_init_balance(pool, lookback_years, employee_id, leave_type, year).await?;

    if balance.remaining_days - delta < 0.0 {
        return Err(HrmsError::Validation(format!(
            "adjustment of {} days would exceed the remaining balance of {}",
            delta, balance.remaining_days
        )));
    }

    sqlx::query(
        r#"
        UPDATE leave_balances
        SET used_days = used_days + ?,
            remaining_days = allocated_days + carried_forward_days - used_days
        WHERE employee_id = ? AND leave_type = ? AND year = ?
        "#,
    )
    .bind(delta)
    .bind(employee_id)
    .bind(leave_type)
    .bind(year)
    .execute(pool)
    .await?;

    fetch_balance(pool, employee_id, leave_type, year)
        .await?
        .ok_or(HrmsError::NotFound { entity: "leave balance" })
}

/// Seeds the given year for every active employee against every active
/// policy. Best-effort: individual failures are logged and skipped.
pub async fn initialize_year_for_all(
    pool: &MySqlPool,
    lookback_years: i32,
    year: i32,
) -> HrmsResult<u64> {
    let employee_ids: Vec<u64> =
        sqlx::query_scalar("SELECT id FROM employees WHERE status = 'active'")
            .fetch_all(pool)
            .await?;

    let policies: Vec<String> =
        sqlx::query_scalar("SELECT leave_type FROM leave_policies WHERE is_active = 1")
            .fetch_all(pool)
            .await?;

    let mut initialized = 0u64;
    for employee_id in &employee_ids {
        for leave_type in &policies {
            match get_or_init_balance(pool, lookback_years, *employee_id, leave_type, year).await {
                Ok(_) => initialized += 1,
                Err(e) => {
                    tracing::warn!(error = %e, employee_id, leave_type, year, "balance init skipped");
                }
            }
        }
    }

    Ok(initialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(min_notice: i32, max_consecutive: Option<f64>) -> LeavePolicy {
        LeavePolicy {
            id: 1,
            leave_type: "annual".to_string(),
            annual_limit: 20.0,
            carry_forward_allowed: true,
            carry_forward_limit: 5.0,
            min_notice_days: min_notice,
            max_consecutive_days: max_consecutive,
            requires_approval: true,
            approval_level: 1,
            is_active: true,
        }
    }

    fn balance(remaining: f64) -> EmployeeLeaveBalance {
        EmployeeLeaveBalance {
            id: 1,
            employee_id: 1000,
            leave_type: "annual".to_string(),
            year: 2026,
            allocated_days: 20.0,
            carried_forward_days: 0.0,
            used_days: 20.0 - remaining,
            remaining_days: remaining,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn short_notice_always_reports_a_notice_error() {
        let p = policy(3, None);
        let b = balance(15.0);
        let errors = evaluate_request(&p, &b, date(2026, 6, 1), date(2026, 6, 2), 1.0);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at least 3 days notice"));
    }

    #[test]
    fn violations_accumulate_instead_of_short_circuiting() {
        let p = policy(5, Some(3.0));
        let b = balance(2.0);
        // Too little notice, too many consecutive days, and not enough balance.
        let errors = evaluate_request(&p, &b, date(2026, 6, 1), date(2026, 6, 2), 10.0);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn valid_request_produces_no_errors() {
        let p = policy(3, Some(10.0));
        let b = balance(15.0);
        let errors = evaluate_request(&p, &b, date(2026, 6, 1), date(2026, 6, 20), 5.0);
        assert!(errors.is_empty());
    }

    #[test]
    fn consecutive_cap_is_ignored_when_unset() {
        let p = policy(0, None);
        let b = balance(20.0);
        let errors = evaluate_request(&p, &b, date(2026, 6, 1), date(2026, 7, 1), 15.0);
        assert!(errors.is_empty());
    }

    #[test]
    fn carry_forward_is_capped_by_the_policy_limit() {
        let p = policy(0, None);
        assert_eq!(carry_forward_days(&p, 12.0), 5.0);
        assert_eq!(carry_forward_days(&p, 3.5), 3.5);
        assert_eq!(carry_forward_days(&p, 0.0), 0.0);
    }

    #[test]
    fn carry_forward_never_goes_negative() {
        let p = policy(0, None);
        assert_eq!(carry_forward_days(&p, -4.0), 0.0);
    }

    #[test]
    fn carry_forward_is_zero_when_disallowed() {
        let mut p = policy(0, None);
        p.carry_forward_allowed = false;
        assert_eq!(carry_forward_days(&p, 12.0), 0.0);
    }
}
