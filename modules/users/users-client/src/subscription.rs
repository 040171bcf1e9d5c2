use std::sync::Arc;
use tokio::sync::watch;
use users_sdk::{CacheTag, User, UsersClientV1, UsersError};

use crate::client::UsersClient;

/// Live view of the cached user list.
///
/// Created by [`UsersClient::subscribe_users`]. Dropping it unsubscribes.
pub struct UsersSubscription {
    client: UsersClient,
    changes: watch::Receiver<u64>,
}

impl UsersSubscription {
    pub(crate) fn new(client: UsersClient, changes: watch::Receiver<u64>) -> Self {
        tracing::debug!("users subscription opened");
        Self { client, changes }
    }

    /// Cached list, fresh or stale; `None` before the first successful fetch.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Vec<User>>> {
        self.client
            .cache()
            .get(CacheTag::Users)
            .map(|entry| Arc::clone(&entry.data))
    }

    /// Whether the cached list has been invalidated since it was stored.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.client
            .cache()
            .get(CacheTag::Users)
            .is_none_or(|entry| entry.stale)
    }

    /// Wait for the next invalidation or store of the user list.
    ///
    /// Changes made since the previous call resolve immediately, including
    /// the store done by this handle's own [`fetch`](Self::fetch).
    /// The handle keeps its client alive, so the channel never closes and this
    /// only returns `true`; the `bool` mirrors `watch::Receiver::changed`.
    pub async fn changed(&mut self) -> bool {
        self.changes.changed().await.is_ok()
    }

    /// Fresh user list, re-fetched only when the cache is stale or empty.
    ///
    /// # Errors
    /// Propagates the fetch error; the cached entry is left as it was.
    pub async fn fetch(&self) -> Result<Arc<Vec<User>>, UsersError> {
        self.client.get_users().await
    }
}

impl Drop for UsersSubscription {
    fn drop(&mut self) {
        tracing::debug!("users subscription closed");
    }
}
