//! Caller-facing response envelope.
//!
//! # Responsibility
//! - Provide the stable `{success, data, error, message}` envelope consumed
//!   by transport layers.
//! - Map service errors to machine-readable kinds with HTTP status codes.
//!
//! # Invariants
//! - `success == true` implies `error == None`.
//! - Every failure carries a kind; free-text messages alone are not the
//!   contract.

use crate::repo::RepoError;
use crate::service::budget_service::BudgetServiceError;
use crate::service::leave_service::LeaveServiceError;
use crate::service::notification_service::NotificationServiceError;
use crate::service::participation_service::ParticipationError;
use serde::{Deserialize, Serialize};

/// Machine-readable failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Malformed or rule-violating input; nothing was written.
    Validation,
    /// Referenced record does not resolve.
    NotFound,
    /// Business-rule conflict with current stored state.
    Conflict,
    /// Unexpected persistence or internal failure.
    Internal,
}

impl ApiErrorKind {
    /// HTTP status transport layers should answer with for this class.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Validation | Self::Conflict => 400,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }
}

/// Typed failure payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}

/// Response envelope shared by all use-case entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn failure(error: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            message: None,
        }
    }

    /// Folds a service result into an envelope.
    pub fn from_result<E>(result: Result<T, E>) -> Self
    where
        E: Into<ApiError>,
    {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failure(err.into()),
        }
    }
}

fn repo_error_to_api(err: &RepoError) -> ApiError {
    match err {
        RepoError::Validation(inner) => ApiError::new(ApiErrorKind::Validation, inner.to_string()),
        RepoError::NotFound { .. } => ApiError::new(ApiErrorKind::NotFound, err.to_string()),
        RepoError::Conflict { .. } => ApiError::new(ApiErrorKind::Conflict, err.to_string()),
        _ => ApiError::new(ApiErrorKind::Internal, err.to_string()),
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        repo_error_to_api(&value)
    }
}

impl From<BudgetServiceError> for ApiError {
    fn from(value: BudgetServiceError) -> Self {
        match &value {
            BudgetServiceError::Allocation(_) | BudgetServiceError::InvalidPeriodEnd { .. } => {
                ApiError::new(ApiErrorKind::Validation, value.to_string())
            }
            BudgetServiceError::ProjectNotFound(_) | BudgetServiceError::PeriodNotFound(_) => {
                ApiError::new(ApiErrorKind::NotFound, value.to_string())
            }
            BudgetServiceError::Repo(inner) => repo_error_to_api(inner),
        }
    }
}

impl From<ParticipationError> for ApiError {
    fn from(value: ParticipationError) -> Self {
        match &value {
            ParticipationError::Repo(inner) => repo_error_to_api(inner),
        }
    }
}

impl From<LeaveServiceError> for ApiError {
    fn from(value: LeaveServiceError) -> Self {
        match &value {
            LeaveServiceError::InvalidDateRange { .. }
            | LeaveServiceError::SingleDayKindSpansRange { .. }
            | LeaveServiceError::NonWorkingDay(_)
            | LeaveServiceError::NoWorkingDays { .. } => {
                ApiError::new(ApiErrorKind::Validation, value.to_string())
            }
            LeaveServiceError::DuplicateRequest { .. }
            | LeaveServiceError::InsufficientBalance { .. }
            | LeaveServiceError::AlreadyCancelled(_) => {
                ApiError::new(ApiErrorKind::Conflict, value.to_string())
            }
            LeaveServiceError::BalanceNotFound { .. }
            | LeaveServiceError::RequestNotFound(_) => {
                ApiError::new(ApiErrorKind::NotFound, value.to_string())
            }
            LeaveServiceError::Repo(inner) => repo_error_to_api(inner),
        }
    }
}

impl From<NotificationServiceError> for ApiError {
    fn from(value: NotificationServiceError) -> Self {
        match &value {
            NotificationServiceError::Repo(inner) => repo_error_to_api(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, ApiErrorKind, ApiResponse};

    #[test]
    fn ok_envelope_omits_error_fields() {
        let response = ApiResponse::ok(vec![1, 2, 3]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert!(json.get("error").is_none());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn failure_envelope_carries_kind_and_status() {
        let response: ApiResponse<()> =
            ApiResponse::failure(ApiError::new(ApiErrorKind::Conflict, "leave overlaps"));
        assert!(!response.success);
        let error = response.error.unwrap();
        assert_eq!(error.http_status(), 400);
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["kind"], "conflict");
    }

    #[test]
    fn status_mapping_per_error_kind() {
        assert_eq!(ApiErrorKind::Validation.http_status(), 400);
        assert_eq!(ApiErrorKind::NotFound.http_status(), 404);
        assert_eq!(ApiErrorKind::Conflict.http_status(), 400);
        assert_eq!(ApiErrorKind::Internal.http_status(), 500);
    }
}
