use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::HrmsError;

/// Review lifecycle. Transitions only move forward; see [`ReviewStatus::apply`].
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
pub enum ReviewStatus {
    Draft,
    Submitted,
    Reviewed,
    Approved,
}

/// The three forward transitions of the review workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Submit,
    Review,
    Approve,
}

impl ReviewAction {
    pub fn target(self) -> ReviewStatus {
        match self {
            ReviewAction::Submit => ReviewStatus::Submitted,
            ReviewAction::Review => ReviewStatus::Reviewed,
            ReviewAction::Approve => ReviewStatus::Approved,
        }
    }
}

impl ReviewStatus {
    /// Typed transition function. Anything but the single legal forward
    /// step for `action` is rejected; there is no backward path.
    pub fn apply(self, action: ReviewAction) -> Result<ReviewStatus, HrmsError> {
        match (self, action) {
            (ReviewStatus::Draft, ReviewAction::Submit) => Ok(ReviewStatus::Submitted),
            (ReviewStatus::Submitted, ReviewAction::Review) => Ok(ReviewStatus::Reviewed),
            (ReviewStatus::Reviewed, ReviewAction::Approve) => Ok(ReviewStatus::Approved),
            (from, action) => Err(HrmsError::InvalidTransition {
                from: from.to_string(),
                to: action.target().to_string(),
            }),
        }
    }

    /// Parse the persisted form. Rows are only ever written through this
    /// module, so a failure here means the table was edited out of band.
    pub fn parse(raw: &str) -> Result<ReviewStatus, HrmsError> {
        ReviewStatus::from_str(raw)
            .map_err(|_| HrmsError::Conflict(format!("unknown review status '{raw}'")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PerformanceReview {
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1001)]
    pub reviewer_id: u64,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub review_period_start: NaiveDate,
    #[schema(example = "2026-12-31", value_type = String, format = "date")]
    pub review_period_end: NaiveDate,
    #[schema(example = 4.5, nullable = true)]
    pub goals_achievement: Option<f64>,
    #[schema(example = 4.0, nullable = true)]
    pub technical_skills: Option<f64>,
    #[schema(example = 3.5, nullable = true)]
    pub communication_skills: Option<f64>,
    #[schema(example = 3.0, nullable = true)]
    pub leadership_skills: Option<f64>,
    #[schema(example = 4.03, nullable = true)]
    pub overall_rating: Option<f64>,
    pub feedback: Option<String>,
    pub employee_comments: Option<String>,
    #[schema(example = "DRAFT")]
    pub status: String,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub submitted_at: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub reviewed_at: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_path_is_accepted() {
        let s = ReviewStatus::Draft.apply(ReviewAction::Submit).unwrap();
        assert_eq!(s, ReviewStatus::Submitted);
        let s = s.apply(ReviewAction::Review).unwrap();
        assert_eq!(s, ReviewStatus::Reviewed);
        let s = s.apply(ReviewAction::Approve).unwrap();
        assert_eq!(s, ReviewStatus::Approved);
    }

    #[test]
    fn approve_on_draft_never_succeeds() {
        assert!(ReviewStatus::Draft.apply(ReviewAction::Approve).is_err());
    }

    #[test]
    fn submit_is_rejected_everywhere_but_draft() {
        for status in [
            ReviewStatus::Submitted,
            ReviewStatus::Reviewed,
            ReviewStatus::Approved,
        ] {
            assert!(status.apply(ReviewAction::Submit).is_err());
        }
    }

    #[test]
    fn approved_is_terminal() {
        for action in [
            ReviewAction::Submit,
            ReviewAction::Review,
            ReviewAction::Approve,
        ] {
            assert!(ReviewStatus::Approved.apply(action).is_err());
        }
    }

    #[test]
    fn status_round_trips_through_its_string_form() {
        assert_eq!(ReviewStatus::Draft.to_string(), "DRAFT");
        assert_eq!(ReviewStatus::parse("APPROVED").unwrap(), ReviewStatus::Approved);
        assert!(ReviewStatus::parse("pending").is_err());
    }
}
