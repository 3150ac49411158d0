//! Loan management service
//!
//! Every operation runs inside a single [`LoanTransaction`]: the shelf
//! counter of a book and the loan rows that account for it are written
//! together or not at all.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::{
    error::{AppResult, LoanError},
    models::loan::{BookLoan, LoanPolicy},
    repository::{LoanStore, LoanTransaction},
};

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn LoanStore>,
    policy: LoanPolicy,
}

impl LoansService {
    pub fn new(store: Arc<dyn LoanStore>, policy: LoanPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    /// Borrow one copy of a book
    pub async fn borrow(&self, user_id: i64, book_id: i64) -> AppResult<BookLoan> {
        self.borrow_on(user_id, book_id, today()).await
    }

    /// Return a loan owned by the caller
    pub async fn return_loan(&self, user_id: i64, loan_id: i64) -> AppResult<BookLoan> {
        self.return_on(user_id, loan_id, today()).await
    }

    /// All loans of the caller, open and closed
    pub async fn list_user_loans(&self, user_id: i64) -> AppResult<Vec<BookLoan>> {
        let mut tx = self.store.begin().await?;
        let loans = tx.list_loans_by_user(user_id).await?;
        tx.commit().await?;
        Ok(loans)
    }

    /// Delete a loan and put its copy back on the shelf
    ///
    /// Not guarded by the loan state: removing a loan that was already
    /// returned still credits the book with one copy.
    pub async fn admin_remove_loan(&self, loan_id: i64) -> AppResult<BookLoan> {
        let mut tx = self.store.begin().await?;

        let loan = tx
            .get_loan(loan_id)
            .await?
            .ok_or(LoanError::LoanNotFound(loan_id))?;

        if !tx.restore_copy(loan.book_id).await? {
            return Err(LoanError::LoanedBookMissing {
                loan_id,
                book_id: loan.book_id,
            }
            .into());
        }
        tx.delete_loan(loan_id).await?;
        tx.commit().await?;

        tracing::info!(
            loan_id,
            user_id = loan.user_id,
            book_id = loan.book_id,
            was_open = loan.is_open(),
            "Loan removed"
        );
        Ok(loan)
    }

    pub(crate) async fn borrow_on(
        &self,
        user_id: i64,
        book_id: i64,
        today: NaiveDate,
    ) -> AppResult<BookLoan> {
        let mut tx = self.store.begin().await?;
        tx.lock_user(user_id).await?;

        let open_loans = tx.count_open_loans(user_id).await?;
        if !self.policy.allows_another(open_loans) {
            tracing::debug!(user_id, open_loans, "Borrow refused: loan limit reached");
            return Err(LoanError::TooManyActiveLoans {
                limit: self.policy.max_active_loans,
            }
            .into());
        }

        if tx.book_copies(book_id).await?.is_none() {
            return Err(LoanError::BookNotFound(book_id).into());
        }

        // Conditional decrement: a concurrent borrower may have taken the last copy
        if !tx.take_copy(book_id).await? {
            tracing::debug!(user_id, book_id, "Borrow refused: no copies left");
            return Err(LoanError::NoCopiesAvailable(book_id).into());
        }

        let loan = tx
            .insert_loan(&self.policy.new_loan(user_id, book_id, today))
            .await?;
        tx.commit().await?;

        tracing::info!(
            loan_id = loan.id,
            user_id,
            book_id,
            due = %loan.estimated_return_date,
            "Book borrowed"
        );
        Ok(loan)
    }

    pub(crate) async fn return_on(
        &self,
        user_id: i64,
        loan_id: i64,
        today: NaiveDate,
    ) -> AppResult<BookLoan> {
        let mut tx = self.store.begin().await?;
        let loan = owned_loan(tx.as_mut(), user_id, loan_id).await?;

        if !loan.is_open() {
            return Err(LoanError::AlreadyReturned(loan_id).into());
        }

        // Copy first: a loan whose book is gone stays open
        if !tx.restore_copy(loan.book_id).await? {
            return Err(LoanError::LoanedBookMissing {
                loan_id,
                book_id: loan.book_id,
            }
            .into());
        }

        let closed = tx.close_loan(loan_id, today).await?;
        tx.commit().await?;

        tracing::info!(loan_id, user_id, book_id = closed.book_id, "Book returned");
        Ok(closed)
    }
}

/// Fetch a loan the user owns; someone else's loan looks exactly like a missing one
async fn owned_loan(
    tx: &mut dyn LoanTransaction,
    user_id: i64,
    loan_id: i64,
) -> AppResult<BookLoan> {
    match tx.get_loan(loan_id).await? {
        Some(loan) if loan.user_id == user_id => Ok(loan),
        _ => Err(LoanError::UserLoanNotFound(loan_id).into()),
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
