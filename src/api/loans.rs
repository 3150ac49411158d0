//! Loan management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{loan::LoanResponse, Role},
    AppState,
};

use super::AuthenticatedUser;

/// Borrow one copy of a book
#[utoipa::path(
    post,
    path = "/loans/borrow/{book_id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Loan created", body = LoanResponse),
        (status = 400, description = "Loan limit reached or no copies left", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i64>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    claims.require_role(Role::MEMBERS)?;

    let loan = state.services.loans.borrow(claims.user_id, book_id).await?;
    Ok((StatusCode::CREATED, Json(loan.into())))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/return/{loan_id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("loan_id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = LoanResponse),
        (status = 400, description = "Already returned, or the book no longer exists", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Loan not found or not yours", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i64>,
) -> AppResult<Json<LoanResponse>> {
    claims.require_role(Role::MEMBERS)?;

    let loan = state
        .services
        .loans
        .return_loan(claims.user_id, loan_id)
        .await?;
    Ok(Json(loan.into()))
}

/// Loans of the current user, open and closed
#[utoipa::path(
    get,
    path = "/loans/my",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's loans", body = Vec<LoanResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No loans", body = crate::error::ErrorResponse)
    )
)]
pub async fn my_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanResponse>>> {
    claims.require_role(Role::MEMBERS)?;

    let loans = state.services.loans.list_user_loans(claims.user_id).await?;
    if loans.is_empty() {
        return Err(AppError::NotFound("You have no borrowed books.".to_string()));
    }

    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}

/// Delete any loan and credit its book with one copy (admin)
#[utoipa::path(
    delete,
    path = "/loans/remove/{loan_id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("loan_id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Removed loan", body = LoanResponse),
        (status = 400, description = "The loaned book no longer exists", body = crate::error::ErrorResponse),
        (status = 401, description = "Not an administrator"),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i64>,
) -> AppResult<Json<LoanResponse>> {
    claims.require_role(Role::ADMINS)?;

    let loan = state.services.loans.admin_remove_loan(loan_id).await?;
    Ok(Json(loan.into()))
}
