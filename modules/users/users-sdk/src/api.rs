//! Object-safe client boundary for the users backend.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::UsersError;
use crate::models::{
    CreateUserRequest, GeneratedPassword, SendNewPasswordRequest, UpdateUserRequest, User,
    UserIds, UserUpdate,
};

/// Users backend client (Version 1).
///
/// Every mutation invalidates [`CacheTag::Users`](crate::CacheTag::Users) on
/// success; failures leave the cache untouched.
#[async_trait]
pub trait UsersClientV1: Send + Sync {
    /// `POST /users`; returns the created representation.
    async fn create_user(&self, req: CreateUserRequest)
    -> Result<CreateUserRequest, UsersError>;

    /// `PATCH /users/{id}` with the patch fields only.
    async fn update_user(&self, req: UpdateUserRequest) -> Result<UserUpdate, UsersError>;

    /// `DELETE /users/{id}`; returns the deleted user.
    async fn delete_user(&self, id: &str) -> Result<User, UsersError>;

    /// `DELETE /users/deactivate/all`
    async fn delete_users(&self, ids: UserIds) -> Result<(), UsersError>;

    /// `PATCH /users/reactivate/all`
    async fn reactivate_users(&self, ids: UserIds) -> Result<(), UsersError>;

    /// `GET /users`, served from the cache while the entry is fresh.
    async fn get_users(&self) -> Result<Arc<Vec<User>>, UsersError>;

    /// `GET /users`, bypassing the cache.
    async fn refetch_users(&self) -> Result<Arc<Vec<User>>, UsersError>;

    /// `POST /users/generate-password` without a body.
    async fn generate_password(&self) -> Result<GeneratedPassword, UsersError>;

    /// `POST /users/send-new-password`; the backend echoes the request shape.
    async fn send_new_password(
        &self,
        req: SendNewPasswordRequest,
    ) -> Result<SendNewPasswordRequest, UsersError>;
}
