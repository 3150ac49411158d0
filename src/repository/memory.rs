//! In-memory loan store for tests
//!
//! A transaction holds the store lock for its whole lifetime and works on
//! a copy of the state, so transactions are serial and a dropped
//! transaction leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::loans::{LoanStore, LoanTransaction};
use crate::{
    error::{AppError, AppResult},
    models::loan::{BookLoan, NewLoan},
};

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryState {
    /// book id -> available copies
    pub books: BTreeMap<i64, i32>,
    pub loans: BTreeMap<i64, BookLoan>,
    pub next_loan_id: i64,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryLoanStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLoanStore {
    pub fn with_books(books: &[(i64, i32)]) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.try_lock().expect("fresh store is unlocked");
            state.books.extend(books.iter().copied());
        }
        store
    }

    pub async fn copies(&self, book_id: i64) -> Option<i32> {
        self.state.lock().await.books.get(&book_id).copied()
    }

    pub async fn loan(&self, loan_id: i64) -> Option<BookLoan> {
        self.state.lock().await.loans.get(&loan_id).cloned()
    }

    pub async fn loan_count(&self) -> usize {
        self.state.lock().await.loans.len()
    }

    pub async fn remove_book(&self, book_id: i64) {
        self.state.lock().await.books.remove(&book_id);
    }

    /// Insert a loan directly, bypassing the copy counter
    pub async fn seed_loan(&self, user_id: i64, book_id: i64, issue_date: NaiveDate) -> BookLoan {
        let mut state = self.state.lock().await;
        state.next_loan_id += 1;
        let loan = BookLoan {
            id: state.next_loan_id,
            user_id,
            book_id,
            issue_date,
            estimated_return_date: issue_date + chrono::Duration::days(14),
            actual_return_date: None,
        };
        state.loans.insert(loan.id, loan.clone());
        loan
    }
}

#[async_trait]
impl LoanStore for MemoryLoanStore {
    async fn begin(&self) -> AppResult<Box<dyn LoanTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let working = MemoryState::clone(&guard);
        Ok(Box::new(MemoryTransaction {
            guard: Some(guard),
            working,
        }))
    }
}

pub(crate) struct MemoryTransaction {
    guard: Option<OwnedMutexGuard<MemoryState>>,
    working: MemoryState,
}

#[async_trait]
impl LoanTransaction for MemoryTransaction {
    async fn lock_user(&mut self, _user_id: i64) -> AppResult<()> {
        Ok(())
    }

    async fn count_open_loans(&mut self, user_id: i64) -> AppResult<i64> {
        Ok(self
            .working
            .loans
            .values()
            .filter(|l| l.user_id == user_id && l.is_open())
            .count() as i64)
    }

    async fn book_copies(&mut self, book_id: i64) -> AppResult<Option<i32>> {
        Ok(self.working.books.get(&book_id).copied())
    }

    async fn take_copy(&mut self, book_id: i64) -> AppResult<bool> {
        match self.working.books.get_mut(&book_id) {
            Some(copies) if *copies > 0 => {
                *copies -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn restore_copy(&mut self, book_id: i64) -> AppResult<bool> {
        match self.working.books.get_mut(&book_id) {
            Some(copies) => {
                *copies += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<BookLoan> {
        self.working.next_loan_id += 1;
        let row = BookLoan {
            id: self.working.next_loan_id,
            user_id: loan.user_id,
            book_id: loan.book_id,
            issue_date: loan.issue_date,
            estimated_return_date: loan.estimated_return_date,
            actual_return_date: None,
        };
        self.working.loans.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_loan(&mut self, loan_id: i64) -> AppResult<Option<BookLoan>> {
        Ok(self.working.loans.get(&loan_id).cloned())
    }

    async fn close_loan(&mut self, loan_id: i64, returned_on: NaiveDate) -> AppResult<BookLoan> {
        match self.working.loans.get_mut(&loan_id) {
            Some(loan) if loan.is_open() => {
                loan.actual_return_date = Some(returned_on);
                Ok(loan.clone())
            }
            _ => Err(AppError::Internal(format!("Loan {} is not open", loan_id))),
        }
    }

    async fn delete_loan(&mut self, loan_id: i64) -> AppResult<()> {
        self.working.loans.remove(&loan_id);
        Ok(())
    }

    async fn list_loans_by_user(&mut self, user_id: i64) -> AppResult<Vec<BookLoan>> {
        Ok(self
            .working
            .loans
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn commit(&mut self) -> AppResult<()> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| AppError::Internal("Loan transaction already committed".to_string()))?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }
}
