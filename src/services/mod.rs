//! Business logic services

pub mod auth;
pub mod catalog;
pub mod loans;

use std::sync::Arc;

use crate::{config::AppConfig, models::loan::LoanPolicy, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(
                Arc::new(repository.loans.clone()),
                LoanPolicy::from(&config.loans),
            ),
            repository,
        }
    }

    /// Swap the loan backend, keeping the configured policy
    pub fn with_loan_store(mut self, store: Arc<dyn crate::repository::LoanStore>) -> Self {
        self.loans = loans::LoansService::new(store, *self.loans.policy());
        self
    }

    /// Database round-trip for readiness probes
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}
