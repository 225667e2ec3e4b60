use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type HrmsResult<T> = Result<T, HrmsError>;

/// Domain error taxonomy. Each variant maps to one HTTP status; the
/// response body is always the `{success: false, message}` envelope.
#[derive(Debug, Error)]
pub enum HrmsError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("no active leave policy for type '{0}'")]
    PolicyNotFound(String),

    #[error("cannot transition review from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("an employee cannot be their own manager")]
    SelfAssignment,

    #[error("management chain contains a cycle at employee {0}")]
    CycleDetected(u64),

    #[error("setting '{0}' is read-only")]
    ReadOnlySetting(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl ResponseError for HrmsError {
    fn status_code(&self) -> StatusCode {
        match self {
            HrmsError::Validation(_) => StatusCode::BAD_REQUEST,
            HrmsError::NotFound { .. } | HrmsError::PolicyNotFound(_) => StatusCode::NOT_FOUND,
            HrmsError::Forbidden(_) | HrmsError::ReadOnlySetting(_) => StatusCode::FORBIDDEN,
            HrmsError::Conflict(_)
            | HrmsError::InvalidTransition { .. }
            | HrmsError::SelfAssignment
            | HrmsError::CycleDetected(_) => StatusCode::CONFLICT,
            HrmsError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // The raw driver error stays in the logs, not in the response.
        let message = match self {
            HrmsError::Database(e) => {
                error!(error = %e, "database error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let e = HrmsError::Validation("start date is in the past".to_string());
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(
            HrmsError::NotFound { entity: "holiday" }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HrmsError::PolicyNotFound("SICK".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn state_conflicts_map_to_409() {
        let transition = HrmsError::InvalidTransition {
            from: "DRAFT".to_string(),
            to: "APPROVED".to_string(),
        };
        assert_eq!(transition.status_code(), StatusCode::CONFLICT);
        assert_eq!(HrmsError::SelfAssignment.status_code(), StatusCode::CONFLICT);
        assert_eq!(HrmsError::CycleDetected(7).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn read_only_setting_maps_to_403() {
        let e = HrmsError::ReadOnlySetting("company.name".to_string());
        assert_eq!(e.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(e.to_string(), "setting 'company.name' is read-only");
    }

    #[test]
    fn database_errors_map_to_500_without_leaking_detail() {
        let e = HrmsError::Database(sqlx::Error::RowNotFound);
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "database error");
    }

    #[test]
    fn transition_message_names_both_states() {
        let e = HrmsError::InvalidTransition {
            from: "SUBMITTED".to_string(),
            to: "SUBMITTED".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "cannot transition review from SUBMITTED to SUBMITTED"
        );
    }
}
