//! Business logic services

pub mod borrowers;
pub mod catalog;
pub mod ledger;
pub mod reports;
pub mod seed;

use std::sync::Arc;

use crate::{clock::Clock, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub borrowers: borrowers::BorrowersService,
    pub ledger: ledger::LedgerService,
    pub reports: reports::ReportsService,
}

impl Services {
    /// Create all services over the given repository; `clock` stamps loans
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            borrowers: borrowers::BorrowersService::new(repository.clone()),
            ledger: ledger::LedgerService::new(repository.clone(), clock),
            reports: reports::ReportsService::new(repository),
        }
    }
}
