//! Business logic services

pub mod catalog;
pub mod fine;
pub mod lending;
pub mod users;

use crate::{config::LendingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub lending: lending::LendingService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository and lending policy
    pub fn new(repository: Repository, lending_config: LendingConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(
                repository.clone(),
                lending_config.lock_timeout_ms,
            ),
            lending: lending::LendingService::new(repository.clone(), lending_config),
            users: users::UsersService::new(repository),
        }
    }
}
