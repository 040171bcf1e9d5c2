//! Users backend client
//!
//! [`UsersClient`] implements [`users_sdk::UsersClientV1`] over the
//! `backend-http` transport. Each operation is described by a static
//! [`endpoints::Endpoint`]; one execute routine sends it and applies its tag
//! effect to the [`cache::QueryCache`]:
//!
//! - `get_users` stores its result under [`CacheTag::Users`](users_sdk::CacheTag)
//! - every mutation marks that entry stale on success
//!
//! ```ignore
//! let config = UsersClientConfig::load(None)?;
//! let client: Arc<dyn UsersClientV1> = Arc::new(UsersClient::new(&config)?);
//! let users = client.get_users().await?;
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod subscription;

pub use cache::{CacheEntry, FetchTicket, QueryCache};
pub use client::UsersClient;
pub use config::{ConfigError, UsersClientConfig};
pub use endpoints::{RequestDescriptor, TagEffect};
pub use subscription::UsersSubscription;
