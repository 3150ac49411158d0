//! Book loan model and lifecycle rules

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::config::LoansConfig;

/// Loan state derived from the return date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanState {
    Open,
    Closed,
}

/// Loan row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BookLoan {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub issue_date: NaiveDate,
    pub estimated_return_date: NaiveDate,
    /// `None` while the book is still out
    pub actual_return_date: Option<NaiveDate>,
}

impl BookLoan {
    pub fn state(&self) -> LoanState {
        match self.actual_return_date {
            None => LoanState::Open,
            Some(_) => LoanState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == LoanState::Open
    }
}

/// Loan about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub user_id: i64,
    pub book_id: i64,
    pub issue_date: NaiveDate,
    pub estimated_return_date: NaiveDate,
}

/// Borrowing limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPolicy {
    /// Open loans a user may hold across all titles
    pub max_active_loans: i64,
    pub loan_duration: Duration,
}

impl LoanPolicy {
    /// Build the loan issued today for this user and book
    pub fn new_loan(&self, user_id: i64, book_id: i64, today: NaiveDate) -> NewLoan {
        NewLoan {
            user_id,
            book_id,
            issue_date: today,
            estimated_return_date: today + self.loan_duration,
        }
    }

    pub fn allows_another(&self, open_loans: i64) -> bool {
        open_loans < self.max_active_loans
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        LoanPolicy::from(&LoansConfig::default())
    }
}

impl From<&LoansConfig> for LoanPolicy {
    fn from(config: &LoansConfig) -> Self {
        Self {
            max_active_loans: config.max_active_loans,
            loan_duration: Duration::days(config.loan_duration_days),
        }
    }
}

/// Loan as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanResponse {
    pub loan_id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub issue_date: NaiveDate,
    pub estimated_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
}

impl From<BookLoan> for LoanResponse {
    fn from(loan: BookLoan) -> Self {
        Self {
            loan_id: loan.id,
            user_id: loan.user_id,
            book_id: loan.book_id,
            issue_date: loan.issue_date,
            estimated_return_date: loan.estimated_return_date,
            actual_return_date: loan.actual_return_date,
        }
    }
}
