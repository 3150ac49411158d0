//! Data models for Libris

pub mod author;
pub mod book;
pub mod genre;
pub mod loan;
pub mod user;

use serde::Deserialize;
use utoipa::IntoParams;

// Re-export commonly used types
pub use author::Author;
pub use book::Book;
pub use genre::Genre;
pub use loan::{BookLoan, LoanResponse};
pub use user::{Role, User, UserClaims};

/// Page selection shared by listing endpoints
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Page number (default: 1)
    pub page: Option<i64>,
    /// Items per page (default: 20, max: 100)
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        let query = PageQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 20);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_page_bounds() {
        let query = PageQuery { page: Some(3), per_page: Some(500) };
        assert_eq!(query.per_page(), 100);
        assert_eq!(query.offset(), 200);

        let query = PageQuery { page: Some(0), per_page: Some(0) };
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 1);

        let query = PageQuery { page: Some(i64::MAX), per_page: Some(100) };
        assert_eq!(query.offset(), i64::MAX);
        assert!(query.offset() >= 0);
    }
}
