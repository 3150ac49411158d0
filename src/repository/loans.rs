//! Loans repository for database operations
//!
//! The loan manager never touches the pool directly: it opens one
//! [`LoanTransaction`] per lifecycle operation and either commits it or
//! drops it, which rolls everything back.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgConnection, Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::loan::{BookLoan, NewLoan},
};

/// Source of loan transactions
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn LoanTransaction>>;
}

/// Persistence primitives available inside one loan transaction
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanTransaction: Send {
    /// Serialize concurrent borrows by the same user
    async fn lock_user(&mut self, user_id: i64) -> AppResult<()>;

    /// Loans of this user with no return date
    async fn count_open_loans(&mut self, user_id: i64) -> AppResult<i64>;

    /// Current shelf count, `None` when the book does not exist
    async fn book_copies(&mut self, book_id: i64) -> AppResult<Option<i32>>;

    /// Take one copy off the shelf if any is left
    async fn take_copy(&mut self, book_id: i64) -> AppResult<bool>;

    /// Put one copy back, `false` when the book does not exist
    async fn restore_copy(&mut self, book_id: i64) -> AppResult<bool>;

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<BookLoan>;

    /// Fetch a loan and hold it until the transaction ends
    async fn get_loan(&mut self, loan_id: i64) -> AppResult<Option<BookLoan>>;

    async fn close_loan(&mut self, loan_id: i64, returned_on: NaiveDate) -> AppResult<BookLoan>;

    async fn delete_loan(&mut self, loan_id: i64) -> AppResult<()>;

    async fn list_loans_by_user(&mut self, user_id: i64) -> AppResult<Vec<BookLoan>>;

    async fn commit(&mut self) -> AppResult<()>;
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStore for LoansRepository {
    async fn begin(&self) -> AppResult<Box<dyn LoanTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLoanTransaction { tx: Some(tx) }))
    }
}

/// Postgres transaction, rolled back on drop unless committed
pub struct PgLoanTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgLoanTransaction {
    fn conn(&mut self) -> AppResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("Loan transaction already committed".to_string()))
    }
}

#[async_trait]
impl LoanTransaction for PgLoanTransaction {
    async fn lock_user(&mut self, user_id: i64) -> AppResult<()> {
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(())
    }

    async fn count_open_loans(&mut self, user_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_loans WHERE user_id = $1 AND actual_return_date IS NULL",
        )
        .bind(user_id)
        .fetch_one(self.conn()?)
        .await?;
        Ok(count)
    }

    async fn book_copies(&mut self, book_id: i64) -> AppResult<Option<i32>> {
        let copies: Option<i32> =
            sqlx::query_scalar("SELECT available_copies FROM books WHERE id = $1")
                .bind(book_id)
                .fetch_optional(self.conn()?)
                .await?;
        Ok(copies)
    }

    async fn take_copy(&mut self, book_id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books SET available_copies = available_copies - 1
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(book_id)
        .execute(self.conn()?)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn restore_copy(&mut self, book_id: i64) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE books SET available_copies = available_copies + 1 WHERE id = $1")
                .bind(book_id)
                .execute(self.conn()?)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<BookLoan> {
        let row = sqlx::query_as::<_, BookLoan>(
            r#"
            INSERT INTO book_loans (user_id, book_id, issue_date, estimated_return_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(loan.user_id)
        .bind(loan.book_id)
        .bind(loan.issue_date)
        .bind(loan.estimated_return_date)
        .fetch_one(self.conn()?)
        .await?;
        Ok(row)
    }

    async fn get_loan(&mut self, loan_id: i64) -> AppResult<Option<BookLoan>> {
        let loan = sqlx::query_as::<_, BookLoan>("SELECT * FROM book_loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(loan)
    }

    async fn close_loan(&mut self, loan_id: i64, returned_on: NaiveDate) -> AppResult<BookLoan> {
        sqlx::query_as::<_, BookLoan>(
            r#"
            UPDATE book_loans SET actual_return_date = $2
            WHERE id = $1 AND actual_return_date IS NULL
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(returned_on)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Loan {} is not open", loan_id)))
    }

    async fn delete_loan(&mut self, loan_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM book_loans WHERE id = $1")
            .bind(loan_id)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn list_loans_by_user(&mut self, user_id: i64) -> AppResult<Vec<BookLoan>> {
        let loans = sqlx::query_as::<_, BookLoan>(
            "SELECT * FROM book_loans WHERE user_id = $1 ORDER BY issue_date, id",
        )
        .bind(user_id)
        .fetch_all(self.conn()?)
        .await?;
        Ok(loans)
    }

    async fn commit(&mut self) -> AppResult<()> {
        match self.tx.take() {
            Some(tx) => Ok(tx.commit().await?),
            None => Err(AppError::Internal("Loan transaction already committed".to_string())),
        }
    }
}
