//! User directory service

use crate::{
    error::AppResult,
    models::user::{CreateUser, KycStatus, User, UserQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get user by ID
    pub async fn get_user(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search users with pagination
    pub async fn search_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.search(query).await
    }

    /// Register a user directory entry
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        self.repository.users.create(&user).await
    }

    /// Set a user's KYC status (staff operation)
    pub async fn set_kyc_status(&self, id: i32, status: KycStatus) -> AppResult<User> {
        self.repository.users.set_kyc_status(id, status).await
    }
}
