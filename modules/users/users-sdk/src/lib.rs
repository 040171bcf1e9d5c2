//! Users SDK
//!
//! Public contract of the users backend client:
//!
//! - [`UsersClientV1`] - object-safe client trait, consumed as `Arc<dyn UsersClientV1>`
//! - [`User`], [`CreateUserRequest`], [`UpdateUserRequest`], ... - wire models
//! - [`CacheTag`] - cache tags shared by the query cache and its subscribers
//! - [`UsersError`] - error taxonomy
//!
//! ```ignore
//! let users = client.get_users().await?;
//! client
//!     .update_user(UpdateUserRequest::new("u1", UserPatch::default().name("Bob")))
//!     .await?;
//! // the cached list is stale now; the next get_users() goes to the backend
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod tags;

pub use api::UsersClientV1;
pub use error::UsersError;
pub use models::{
    CreateUserRequest, GeneratedPassword, SendNewPasswordRequest, UpdateUserRequest, User,
    UserIds, UserPatch, UserUpdate,
};
pub use tags::CacheTag;
