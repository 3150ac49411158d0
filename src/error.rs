//! Error types for Libris server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Numeric error codes reported in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchItem = 5,
    ItemNotAvailable = 7,
    Duplicate = 8,
    MaxBorrowsReached = 11,
    BadValue = 18,
    NoSuchLoan = 22,
    AlreadyReturned = 23,
}

/// Loan lifecycle failures
///
/// Each variant keeps the status code the HTTP layer has always answered
/// with, including the two different codes for a missing book.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoanError {
    #[error("You can't borrow more than {limit} books at the same time.")]
    TooManyActiveLoans { limit: i64 },

    /// Requested book does not exist (borrow)
    #[error("Book not found.")]
    BookNotFound(i64),

    /// Loan points at a book that no longer exists (return, removal)
    #[error("Book not found.")]
    LoanedBookMissing { loan_id: i64, book_id: i64 },

    #[error("No available copies of the book.")]
    NoCopiesAvailable(i64),

    #[error("Loan not found.")]
    LoanNotFound(i64),

    /// Unknown loan, or a loan owned by someone else
    #[error("Loan not found or this loan does not belong to you.")]
    UserLoanNotFound(i64),

    #[error("You already returned this book")]
    AlreadyReturned(i64),
}

impl LoanError {
    pub fn status(&self) -> StatusCode {
        match self {
            LoanError::BookNotFound(_)
            | LoanError::LoanNotFound(_)
            | LoanError::UserLoanNotFound(_) => StatusCode::NOT_FOUND,
            LoanError::TooManyActiveLoans { .. }
            | LoanError::LoanedBookMissing { .. }
            | LoanError::NoCopiesAvailable(_)
            | LoanError::AlreadyReturned(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            LoanError::TooManyActiveLoans { .. } => ErrorCode::MaxBorrowsReached,
            LoanError::BookNotFound(_) | LoanError::LoanedBookMissing { .. } => ErrorCode::NoSuchItem,
            LoanError::NoCopiesAvailable(_) => ErrorCode::ItemNotAvailable,
            LoanError::LoanNotFound(_) | LoanError::UserLoanNotFound(_) => ErrorCode::NoSuchLoan,
            LoanError::AlreadyReturned(_) => ErrorCode::AlreadyReturned,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Loan(#[from] LoanError),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchItem, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone())
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::Loan(e) => (e.status(), e.code(), e.to_string()),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_loan_error_status_codes() {
        assert_eq!(status_of(LoanError::TooManyActiveLoans { limit: 5 }), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(LoanError::BookNotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(LoanError::LoanedBookMissing { loan_id: 1, book_id: 2 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(LoanError::NoCopiesAvailable(1)), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(LoanError::LoanNotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(LoanError::UserLoanNotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(LoanError::AlreadyReturned(1)), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_and_system_status_codes() {
        assert_eq!(
            status_of(AppError::Authentication("Invalid token".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Database(sqlx::Error::PoolTimedOut)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_loan_messages() {
        assert_eq!(
            LoanError::TooManyActiveLoans { limit: 5 }.to_string(),
            "You can't borrow more than 5 books at the same time."
        );
        assert_eq!(LoanError::LoanedBookMissing { loan_id: 3, book_id: 9 }.to_string(), "Book not found.");
        assert_eq!(LoanError::LoanNotFound(4).to_string(), "Loan not found.");
        assert_eq!(
            LoanError::UserLoanNotFound(4).to_string(),
            "Loan not found or this loan does not belong to you."
        );
    }
}
